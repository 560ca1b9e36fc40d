use bytes::{BufMut, Bytes, BytesMut};

const INITIAL_CAPACITY: usize = 1024;

/// Sequential writer for the payload of one outgoing frame.
///
/// Mirrors [`IncomingMessage`](crate::IncomingMessage): every `write_*` here
/// has a `read_*` counterpart there. The buffer grows as needed and never
/// shrinks while the message lives.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    buf: BytesMut,
}

impl OutgoingMessage {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Create an empty message with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a boolean as one byte (0 or 1).
    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    /// Append a little-endian `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    /// Append a little-endian IEEE-754 `f32`.
    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }

    /// Append an `i32` length followed by the text as ASCII.
    ///
    /// Characters outside ASCII are written as `?`, one byte each.
    pub fn write_string(&mut self, value: &str) {
        let len = value.chars().count();
        self.write_i32(len as i32);
        self.buf.reserve(len);
        for ch in value.chars() {
            self.buf
                .put_u8(if ch.is_ascii() { ch as u8 } else { b'?' });
        }
    }

    /// Append an `i32` count followed by each value as `f32`.
    pub fn write_float_list(&mut self, values: &[f32]) {
        self.write_i32(values.len() as i32);
        self.buf.reserve(values.len() * 4);
        for &value in values {
            self.write_f32(value);
        }
    }

    /// Replace everything written so far with `data`.
    ///
    /// Later writes append after `data`.
    pub fn set_raw_bytes(&mut self, data: &[u8]) {
        self.buf.clear();
        self.buf.extend_from_slice(data);
    }

    /// Copy of the bytes written so far.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }

    /// Consume the message, keeping its bytes without copying.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for OutgoingMessage {
    fn default() -> Self {
        Self::new()
    }
}
