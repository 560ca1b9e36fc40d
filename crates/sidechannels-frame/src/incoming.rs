use bytes::Bytes;

const BOOL_SIZE: usize = 1;
const INT_SIZE: usize = 4;
const FLOAT_SIZE: usize = 4;

/// Sequential reader over the payload of one received frame.
///
/// Every read is total: when the payload runs out, the caller-supplied
/// default comes back and the cursor stays put. Peers on an older or newer
/// payload layout therefore degrade to defaults instead of failing.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    data: Bytes,
    position: usize,
}

impl IncomingMessage {
    /// Wrap a payload. The cursor starts at the first byte.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }

    /// Read a boolean. Any non-zero byte is `true`.
    pub fn read_bool(&mut self, default: bool) -> bool {
        match self.take::<BOOL_SIZE>() {
            Some([byte]) => byte != 0,
            None => default,
        }
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&mut self, default: i32) -> i32 {
        self.take::<INT_SIZE>()
            .map(i32::from_le_bytes)
            .unwrap_or(default)
    }

    /// Read a little-endian IEEE-754 `f32`.
    pub fn read_f32(&mut self, default: f32) -> f32 {
        self.take::<FLOAT_SIZE>()
            .map(f32::from_le_bytes)
            .unwrap_or(default)
    }

    /// Read an `i32` length followed by that many ASCII bytes.
    ///
    /// If the length is present but the text is not, the length stays
    /// consumed and `default` is returned. Bytes outside ASCII decode as `?`.
    pub fn read_string(&mut self, default: &str) -> String {
        let Some(len) = self.read_len() else {
            return default.to_string();
        };
        let Some(bytes) = self.take_slice(len) else {
            return default.to_string();
        };

        bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '?' })
            .collect()
    }

    /// Read an `i32` count followed by that many `f32` values.
    ///
    /// Truncation follows the same rule as [`read_string`](Self::read_string).
    pub fn read_float_list(&mut self, default: Vec<f32>) -> Vec<f32> {
        let Some(len) = self.read_len().and_then(|count| count.checked_mul(FLOAT_SIZE)) else {
            return default;
        };
        let Some(bytes) = self.take_slice(len) else {
            return default;
        };

        bytes
            .chunks_exact(FLOAT_SIZE)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    /// The whole payload, including the part already read.
    pub fn raw_bytes(&self) -> &Bytes {
        &self.data
    }

    /// Current cursor offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Whether `len` more bytes can be read.
    pub fn can_read_more(&self, len: usize) -> bool {
        self.remaining() >= len
    }

    /// Consumes the length field whenever it is present; `None` if it is
    /// missing or negative.
    fn read_len(&mut self) -> Option<usize> {
        let raw = self.take::<INT_SIZE>().map(i32::from_le_bytes)?;
        usize::try_from(raw).ok()
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let slice = self.take_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Some(out)
    }

    fn take_slice(&mut self, len: usize) -> Option<&[u8]> {
        if !self.can_read_more(len) {
            return None;
        }
        let start = self.position;
        self.position += len;
        Some(&self.data[start..self.position])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outgoing::OutgoingMessage;

    fn sample_message() -> OutgoingMessage {
        let mut msg = OutgoingMessage::new();
        msg.write_bool(true);
        msg.write_i32(-42);
        msg.write_f32(2.5);
        msg.write_string("gravity");
        msg.write_float_list(&[1.0, -2.0, 3.5]);
        msg
    }

    #[test]
    fn reads_back_every_field_type() {
        let mut msg = IncomingMessage::new(sample_message().to_bytes());

        assert!(msg.read_bool(false));
        assert_eq!(msg.read_i32(0), -42);
        assert_eq!(msg.read_f32(0.0), 2.5);
        assert_eq!(msg.read_string("default"), "gravity");
        assert_eq!(msg.read_float_list(Vec::new()), vec![1.0, -2.0, 3.5]);
        assert_eq!(msg.remaining(), 0);
    }

    #[test]
    fn empty_payload_yields_defaults() {
        let mut msg = IncomingMessage::new(Bytes::new());

        assert!(msg.read_bool(true));
        assert_eq!(msg.read_i32(7), 7);
        assert_eq!(msg.read_f32(1.5), 1.5);
        assert_eq!(msg.read_string("fallback"), "fallback");
        assert_eq!(msg.read_float_list(vec![9.0]), vec![9.0]);
        assert_eq!(msg.position(), 0);
    }

    #[test]
    fn every_truncation_point_is_safe() {
        let full = sample_message().to_bytes();

        for cut in 0..full.len() {
            let mut msg = IncomingMessage::new(full.slice(..cut));
            let _ = msg.read_bool(false);
            let _ = msg.read_i32(0);
            let _ = msg.read_f32(0.0);
            let _ = msg.read_string("");
            let list = msg.read_float_list(vec![-1.0]);
            assert_eq!(list, vec![-1.0], "cut at {cut} produced a partial list");
            assert!(msg.position() <= cut);
        }
    }

    #[test]
    fn truncated_int_does_not_advance() {
        let mut msg = IncomingMessage::new(vec![1u8, 2, 3]);
        assert_eq!(msg.read_i32(5), 5);
        assert_eq!(msg.position(), 0);
        assert!(msg.read_bool(false));
        assert_eq!(msg.position(), 1);
    }

    #[test]
    fn truncated_string_consumes_only_length() {
        let mut out = OutgoingMessage::new();
        out.write_i32(10);
        out.write_bool(true);
        let mut msg = IncomingMessage::new(out.to_bytes());

        assert_eq!(msg.read_string("none"), "none");
        assert_eq!(msg.position(), INT_SIZE);
        assert!(msg.read_bool(false));
    }

    #[test]
    fn negative_lengths_return_defaults() {
        let mut out = OutgoingMessage::new();
        out.write_i32(-3);
        out.write_i32(-1);
        let mut msg = IncomingMessage::new(out.to_bytes());

        assert_eq!(msg.read_string("neg"), "neg");
        assert_eq!(msg.read_float_list(vec![0.5]), vec![0.5]);
        assert_eq!(msg.remaining(), 0);
    }

    #[test]
    fn non_ascii_bytes_decode_as_question_marks() {
        let mut msg = IncomingMessage::new(vec![3u8, 0, 0, 0, b'a', 0xC3, b'b']);

        assert_eq!(msg.read_string(""), "a?b");
    }

    #[test]
    fn raw_bytes_covers_whole_payload() {
        let mut msg = IncomingMessage::new(vec![1u8, 0, 0, 0]);
        let _ = msg.read_i32(0);
        assert_eq!(msg.raw_bytes().as_ref(), &[1, 0, 0, 0]);
    }
}
