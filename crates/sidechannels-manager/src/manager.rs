use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use bytes::{Bytes, BytesMut};
use sidechannels_frame::{decode_all, encode_frame, ChannelId, IncomingMessage};

use crate::channel::SideChannel;
use crate::config::ManagerConfig;
use crate::error::{ManagerError, Result};
use crate::queue::GrowableQueue;

/// A frame that arrived before any channel with its identifier was registered.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CachedMessage {
    channel: ChannelId,
    payload: Bytes,
}

/// Routes step buffers between the host and its registered side channels.
///
/// Frames for identifiers nobody has registered yet are cached, in arrival
/// order, and replayed exactly once when a matching channel shows up.
pub struct SideChannelManager {
    channels: HashMap<ChannelId, Box<dyn SideChannel>>,
    cache: GrowableQueue<CachedMessage>,
    config: ManagerConfig,
}

impl SideChannelManager {
    /// Create an empty manager with default config.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Create an empty manager with explicit config.
    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            channels: HashMap::new(),
            cache: GrowableQueue::with_capacity(config.initial_cache_capacity),
            config,
        }
    }

    /// Register a channel and replay any cached frames addressed to it.
    ///
    /// A second channel with an already registered identifier is rejected
    /// and dropped; the registered one keeps its state and outbound queue.
    pub fn register(&mut self, mut channel: Box<dyn SideChannel>) -> Result<()> {
        let id = channel.id();
        if self.channels.contains_key(&id) {
            tracing::error!(
                channel = %id,
                "side channel already registered; keeping the existing instance"
            );
            return Err(ManagerError::DuplicateChannel(id));
        }

        let replayed = self.replay_cached(id, channel.as_mut());
        if replayed > 0 {
            tracing::debug!(channel = %id, frames = replayed, "replayed cached frames");
        }

        self.channels.insert(id, channel);
        tracing::debug!(channel = %id, "registered side channel");
        Ok(())
    }

    /// Box and register a concrete channel.
    pub fn register_channel<C: SideChannel>(&mut self, channel: C) -> Result<()> {
        self.register(Box::new(channel))
    }

    /// Remove a channel and hand it back.
    ///
    /// Messages still in its outbound queue are not sent.
    pub fn unregister(&mut self, id: ChannelId) -> Option<Box<dyn SideChannel>> {
        let channel = self.channels.remove(&id)?;
        let pending = channel.outbound_len();
        if pending > 0 {
            tracing::warn!(
                channel = %id,
                frames = pending,
                "unregistered side channel with unsent messages"
            );
        } else {
            tracing::debug!(channel = %id, "unregistered side channel");
        }
        Some(channel)
    }

    /// Drop every channel and every cached frame.
    pub fn unregister_all(&mut self) {
        tracing::debug!(
            channels = self.channels.len(),
            cached = self.cache.len(),
            "resetting side channel manager"
        );
        self.channels.clear();
        self.cache.clear();
    }

    /// Collect every channel's pending messages into one step buffer.
    ///
    /// Returns empty bytes without allocating when nothing is pending.
    /// Each channel's outbound queue is empty afterwards.
    pub fn get_outgoing_bytes(&mut self) -> Bytes {
        if !self.channels.values().any(|channel| channel.has_outgoing()) {
            return Bytes::new();
        }

        let mut out = BytesMut::new();
        for (id, channel) in &mut self.channels {
            for payload in channel.drain_outbound() {
                if let Err(err) = encode_frame(*id, &payload, &mut out) {
                    tracing::error!(channel = %id, error = %err, "dropping unencodable message");
                }
            }
        }
        out.freeze()
    }

    /// Dispatch one incoming step buffer.
    ///
    /// The cache is retried first, then every frame in `data` goes to its
    /// channel or into the cache. A buffer that cannot be split into frames
    /// is rejected as a whole before anything is dispatched.
    pub fn process_incoming(&mut self, data: &[u8]) -> Result<()> {
        self.process_incoming_bytes(Bytes::copy_from_slice(data))
    }

    /// Same as [`process_incoming`](Self::process_incoming), without copying.
    pub fn process_incoming_bytes(&mut self, data: Bytes) -> Result<()> {
        let frames = if data.is_empty() {
            Vec::new()
        } else {
            decode_all(data, self.config.frame.max_payload_size).map_err(|err| {
                tracing::error!(error = %err, "rejecting malformed side channel data");
                ManagerError::Protocol(err)
            })?
        };

        self.retry_cached();

        for frame in frames {
            match self.channels.get_mut(&frame.channel) {
                Some(channel) => deliver(channel.as_mut(), frame.payload),
                None => self.cache_frame(frame.channel, frame.payload),
            }
        }
        Ok(())
    }

    /// Borrow a registered channel as its concrete type.
    pub fn get<T: SideChannel>(&self, id: ChannelId) -> Option<&T> {
        self.channels.get(&id)?.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow a registered channel as its concrete type.
    pub fn get_mut<T: SideChannel>(&mut self, id: ChannelId) -> Option<&mut T> {
        self.channels.get_mut(&id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Check if a channel is registered under `id`.
    pub fn contains(&self, id: ChannelId) -> bool {
        self.channels.contains_key(&id)
    }

    /// Identifiers of registered channels, sorted.
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        let mut ids: Vec<ChannelId> = self.channels.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True if no channel is registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of frames waiting for their channel.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Identifiers of cached frames, in arrival order.
    pub fn cached_channels(&self) -> Vec<ChannelId> {
        self.cache.iter().map(|cached| cached.channel).collect()
    }

    /// Get manager configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// One pass over the cache: frames for `id` go to `channel`, the rest
    /// are re-queued in their original order.
    fn replay_cached(&mut self, id: ChannelId, channel: &mut dyn SideChannel) -> usize {
        let mut replayed = 0usize;
        for _ in 0..self.cache.len() {
            let Ok(cached) = self.cache.dequeue() else {
                break;
            };
            if cached.channel == id {
                deliver(channel, cached.payload);
                replayed += 1;
            } else {
                self.cache.enqueue(cached);
            }
        }
        replayed
    }

    fn retry_cached(&mut self) {
        for _ in 0..self.cache.len() {
            let Ok(cached) = self.cache.dequeue() else {
                break;
            };
            match self.channels.get_mut(&cached.channel) {
                Some(channel) => {
                    tracing::debug!(channel = %cached.channel, "delivering cached frame");
                    deliver(channel.as_mut(), cached.payload);
                }
                None => self.cache.enqueue(cached),
            }
        }
    }

    fn cache_frame(&mut self, channel: ChannelId, payload: Bytes) {
        tracing::debug!(
            channel = %channel,
            len = payload.len(),
            "caching frame for unregistered side channel"
        );
        self.cache.enqueue(CachedMessage { channel, payload });
        if self.cache.len() == self.config.cache_warn_threshold + 1 {
            tracing::warn!(
                cached = self.cache.len(),
                "side channel cache is growing; is a channel never registered?"
            );
        }
    }
}

impl Default for SideChannelManager {
    fn default() -> Self {
        Self::new()
    }
}

fn deliver(channel: &mut dyn SideChannel, payload: Bytes) {
    let id = channel.id();
    tracing::trace!(channel = %id, len = payload.len(), "dispatching frame");
    let mut msg = IncomingMessage::new(payload);
    match panic::catch_unwind(AssertUnwindSafe(|| channel.on_message_received(&mut msg))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::warn!(channel = %id, error = %err, "side channel handler failed");
        }
        Err(cause) => {
            tracing::warn!(
                channel = %id,
                panic = panic_message(cause.as_ref()),
                "side channel handler panicked"
            );
        }
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
    if let Some(message) = cause.downcast_ref::<&str>() {
        message
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
