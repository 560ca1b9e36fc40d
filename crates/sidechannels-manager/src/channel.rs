use std::any::Any;

use bytes::Bytes;
use sidechannels_frame::{ChannelId, IncomingMessage, OutgoingMessage};

use crate::error::ChannelError;

/// A logical sub-stream multiplexed over the combined step buffer.
///
/// Implementors keep their pending messages in an [`OutboundQueue`] and hand
/// them over through [`drain_outbound`](SideChannel::drain_outbound) when the
/// manager collects the step's outgoing bytes.
pub trait SideChannel: Any + Send {
    /// Stable identifier this channel is addressed by.
    fn id(&self) -> ChannelId;

    /// Handle one received message addressed to this channel.
    fn on_message_received(&mut self, msg: &mut IncomingMessage) -> Result<(), ChannelError>;

    /// Number of messages waiting to be sent.
    fn outbound_len(&self) -> usize;

    /// Take every pending outgoing payload, oldest first.
    fn drain_outbound(&mut self) -> Vec<Bytes>;

    /// Whether anything is waiting to be sent.
    fn has_outgoing(&self) -> bool {
        self.outbound_len() > 0
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Pending outgoing payloads of one channel.
#[derive(Debug, Clone, Default)]
pub struct OutboundQueue {
    pending: Vec<Bytes>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the bytes written to `msg` so far.
    pub fn queue_message_to_send(&mut self, msg: &OutgoingMessage) {
        self.pending.push(msg.to_bytes());
    }

    /// Queue an already-encoded payload.
    pub fn queue_bytes(&mut self, payload: Bytes) {
        self.pending.push(payload);
    }

    /// Take every pending payload, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
