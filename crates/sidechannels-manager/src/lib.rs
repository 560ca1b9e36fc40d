//! Side-channel registry and dispatcher.
//!
//! A [`SideChannelManager`] owns every registered [`SideChannel`] plus a
//! cache of frames that arrived before their channel was registered. Each
//! step the host feeds it the combined incoming buffer and collects the
//! combined outgoing buffer.

pub mod channel;
pub mod config;
pub mod error;
pub mod manager;
pub mod queue;

pub use channel::{OutboundQueue, SideChannel};
pub use config::ManagerConfig;
pub use error::{ChannelError, ManagerError, QueueError, Result};
pub use manager::SideChannelManager;
pub use queue::GrowableQueue;
