use sidechannels_frame::{ChannelId, FrameError};

/// Errors returned by the side-channel registry.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// A channel with this identifier is already registered.
    #[error("side channel {0} is already registered")]
    DuplicateChannel(ChannelId),

    /// The incoming buffer could not be split into frames.
    #[error("side channel protocol error: {0}")]
    Protocol(#[from] FrameError),
}

impl ManagerError {
    /// True when the error means the peers disagree on the wire format.
    pub fn is_protocol_mismatch(&self) -> bool {
        match self {
            ManagerError::Protocol(err) => err.is_protocol_mismatch(),
            ManagerError::DuplicateChannel(_) => false,
        }
    }
}

/// Errors returned by [`GrowableQueue`](crate::GrowableQueue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("queue is empty")]
    Empty,
}

/// Errors a channel handler may report for one received message.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The payload did not have the shape the channel expects.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Any other handler failure.
    #[error("handler failed: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, ManagerError>;
