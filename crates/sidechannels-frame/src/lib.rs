//! UUID-addressed side-channel framing for environment/trainer exchanges.
//!
//! A step buffer is a concatenation of frames. Every frame is:
//! - A 16-byte channel ID (GUID byte layout)
//! - A 4-byte little-endian signed payload length
//! - The payload itself
//!
//! Payloads are read and written with [`IncomingMessage`] and
//! [`OutgoingMessage`], which share one primitive encoding.

pub mod channel;
pub mod codec;
pub mod error;
pub mod incoming;
pub mod outgoing;
pub mod reader;
pub mod writer;

pub use channel::{
    channel_name, is_builtin, unique_id, ChannelId, IdAllocator, ENVIRONMENT_PARAMETERS, ID_SIZE,
};
#[cfg(feature = "async")]
pub use codec::SideChannelCodec;
pub use codec::{
    decode_all, decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use incoming::IncomingMessage;
pub use outgoing::OutgoingMessage;
pub use reader::FrameReader;
pub use writer::FrameWriter;
