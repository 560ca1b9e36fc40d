//! Environment parameters delivered over the built-in side channel.
//!
//! The trainer sends named float parameters, either as plain values or as a
//! seeded sampler the environment draws one value from. The environment
//! reads them through an [`EnvironmentParameters`] handle and may register
//! a callback per name.

pub mod channel;
pub mod error;
pub mod parameters;
pub mod sampler;
pub mod update;

pub use channel::EnvironmentParametersChannel;
pub use error::{ParamsError, Result};
pub use parameters::{Callback, EnvironmentParameters};
pub use sampler::Sampler;
pub use update::ParameterUpdate;
