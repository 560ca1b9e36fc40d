/// Errors that can occur during side-channel frame encoding/decoding.
///
/// Every decode failure means the two processes disagree on the wire layout,
/// so the messages point at protocol compatibility rather than at the bytes.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The buffer ended inside a frame.
    #[error(
        "truncated side channel frame at offset {offset} ({needed} bytes needed, {available} available); \
         check that both peers speak a compatible side channel protocol version"
    )]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The declared payload length is negative.
    #[error(
        "negative payload length {length} at offset {offset}; \
         check that both peers speak a compatible side channel protocol version"
    )]
    NegativeLength { offset: usize, length: i32 },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A channel identifier could not be parsed from text.
    #[error("invalid channel id {input:?}: {source}")]
    InvalidChannelId {
        input: String,
        source: uuid::Error,
    },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream refused to accept more bytes.
    #[error("stream closed while writing a frame")]
    StreamClosed,
}

impl FrameError {
    /// True for errors that indicate a wire-format disagreement between peers.
    pub fn is_protocol_mismatch(&self) -> bool {
        matches!(
            self,
            FrameError::Truncated { .. }
                | FrameError::NegativeLength { .. }
                | FrameError::PayloadTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
