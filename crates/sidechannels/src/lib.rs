//! Multiplexed side channels between a simulation environment and its trainer.
//!
//! Each simulation step the two processes exchange one buffer in each
//! direction. The buffer carries any number of frames, each addressed to a
//! logical channel by UUID, so independent features (environment parameters,
//! statistics, custom user channels) share one transport.
//!
//! # Crate Structure
//!
//! - [`frame`]: wire framing, channel identifiers and typed payload cursors
//! - [`manager`]: channel registry, orphan-frame cache and step dispatch
//! - [`params`]: the built-in environment parameter channel and samplers

/// Re-export frame types.
pub mod frame {
    pub use sidechannels_frame::*;
}

/// Re-export registry types.
pub mod manager {
    pub use sidechannels_manager::*;
}

/// Re-export environment parameter types.
pub mod params {
    pub use sidechannels_params::*;
}
