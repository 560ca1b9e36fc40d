use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::channel::{ChannelId, ID_SIZE};
use crate::error::{FrameError, Result};

/// Frame header: channel id (16) + length (4) = 20 bytes.
pub const HEADER_SIZE: usize = ID_SIZE + LENGTH_SIZE;

const LENGTH_SIZE: usize = 4;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// A side-channel message addressed to one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The channel this message belongs to.
    pub channel: ChannelId,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(channel: ChannelId, payload: impl Into<Bytes>) -> Self {
        Self {
            channel,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────────┬───────────┬─────────────────┐
/// │ Channel id (16B)     │ Length    │ Payload          │
/// │ GUID byte layout     │ (i32 LE)  │ (Length bytes)   │
/// └──────────────────────┴───────────┴─────────────────┘
/// ```
pub fn encode_frame(channel: ChannelId, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > i32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: i32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&channel.to_wire_bytes());
    dst.put_i32_le(payload.len() as i32);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer that may still be filling up.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    let Some((channel, payload_len)) = read_header(src, 0, max_payload)? else {
        return Ok(None); // Need more data
    };

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { channel, payload }))
}

/// Decode every frame of a complete step buffer.
///
/// Unlike [`decode_frame`], the buffer is final: a frame cut short anywhere
/// is an error, reported with the offset of the frame that failed.
pub fn decode_all(input: Bytes, max_payload: usize) -> Result<Vec<Frame>> {
    let total = input.len();
    let mut src = input;
    let mut frames = Vec::new();

    while !src.is_empty() {
        let offset = total - src.len();
        let Some((channel, payload_len)) = read_header(&src, offset, max_payload)? else {
            return Err(FrameError::Truncated {
                offset,
                needed: HEADER_SIZE,
                available: src.len(),
            });
        };

        if src.len() < HEADER_SIZE + payload_len {
            return Err(FrameError::Truncated {
                offset,
                needed: HEADER_SIZE + payload_len,
                available: src.len(),
            });
        }

        src.advance(HEADER_SIZE);
        let payload = src.split_to(payload_len);
        tracing::trace!(offset, channel = %channel, len = payload_len, "decoded frame");
        frames.push(Frame { channel, payload });
    }

    Ok(frames)
}

fn read_header(
    buf: &[u8],
    offset: usize,
    max_payload: usize,
) -> Result<Option<(ChannelId, usize)>> {
    if buf.len() < HEADER_SIZE {
        return Ok(None);
    }

    let mut id = [0u8; ID_SIZE];
    id.copy_from_slice(&buf[..ID_SIZE]);
    let mut length = [0u8; LENGTH_SIZE];
    length.copy_from_slice(&buf[ID_SIZE..HEADER_SIZE]);
    let length = i32::from_le_bytes(length);

    if length < 0 {
        return Err(FrameError::NegativeLength { offset, length });
    }

    let payload_len = length as usize;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    Ok(Some((ChannelId::from_wire_bytes(id), payload_len)))
}

/// Bytes needed to complete the frame at the start of `buf`, as far as the
/// header tells.
pub(crate) fn pending_frame_len(buf: &[u8]) -> usize {
    if buf.len() < HEADER_SIZE {
        return HEADER_SIZE;
    }
    let mut length = [0u8; LENGTH_SIZE];
    length.copy_from_slice(&buf[ID_SIZE..HEADER_SIZE]);
    HEADER_SIZE + i32::from_le_bytes(length).max(0) as usize
}

/// Configuration for the frame codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

#[cfg(feature = "async")]
pub use self::tokio_codec::SideChannelCodec;

#[cfg(feature = "async")]
mod tokio_codec {
    use bytes::BytesMut;
    use tokio_util::codec::{Decoder, Encoder};

    use super::{decode_frame, encode_frame, pending_frame_len, Frame, FrameConfig};
    use crate::error::{FrameError, Result};

    /// `tokio_util` codec for side-channel frames carried over an async stream.
    #[derive(Debug, Clone, Default)]
    pub struct SideChannelCodec {
        config: FrameConfig,
    }

    impl SideChannelCodec {
        /// Create a codec with explicit configuration.
        pub fn with_config(config: FrameConfig) -> Self {
            Self { config }
        }
    }

    impl Decoder for SideChannelCodec {
        type Item = Frame;
        type Error = FrameError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
            decode_frame(src, self.config.max_payload_size)
        }

        fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
            match self.decode(src)? {
                Some(frame) => Ok(Some(frame)),
                None if src.is_empty() => Ok(None),
                None => Err(FrameError::Truncated {
                    offset: 0,
                    needed: pending_frame_len(src),
                    available: src.len(),
                }),
            }
        }
    }

    impl Encoder<Frame> for SideChannelCodec {
        type Error = FrameError;

        fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
            if item.payload.len() > self.config.max_payload_size {
                return Err(FrameError::PayloadTooLarge {
                    size: item.payload.len(),
                    max: self.config.max_payload_size,
                });
            }
            encode_frame(item.channel, item.payload.as_ref(), dst)
        }
    }
}
