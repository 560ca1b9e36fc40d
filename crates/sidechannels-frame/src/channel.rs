//! Channel identifiers.
//!
//! Every side channel is addressed by a 128-bit UUID. The text form is the
//! canonical hyphenated rendering; on the wire the identifier travels as 16
//! raw bytes in the mixed-endian GUID layout both peers use.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FrameError, Result};

/// Size of a channel identifier on the wire.
pub const ID_SIZE: usize = 16;

/// Identifier of a logical side channel. Serializes as the hyphenated text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(Uuid);

/// Built-in environment parameter channel.
pub const ENVIRONMENT_PARAMETERS: ChannelId =
    ChannelId::from_u128(0x534c891e_810f_11ea_a9d0_822485860400);

impl ChannelId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Build an identifier from its 128-bit value.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Generate a random (v4) identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the canonical text form.
    pub fn parse(input: &str) -> Result<Self> {
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|source| FrameError::InvalidChannelId {
                input: input.to_string(),
                source,
            })
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Encode as the 16 bytes written on the wire.
    pub fn to_wire_bytes(&self) -> [u8; ID_SIZE] {
        self.0.to_bytes_le()
    }

    /// Decode from the 16 bytes read off the wire.
    pub fn from_wire_bytes(bytes: [u8; ID_SIZE]) -> Self {
        Self(Uuid::from_bytes_le(bytes))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ChannelId {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Uuid> for ChannelId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Returns a human-readable name for a channel ID.
pub fn channel_name(id: ChannelId) -> &'static str {
    if id == ENVIRONMENT_PARAMETERS {
        "ENVIRONMENT_PARAMETERS"
    } else {
        "USER"
    }
}

/// Returns true if the channel ID belongs to a built-in channel.
pub fn is_builtin(id: ChannelId) -> bool {
    id == ENVIRONMENT_PARAMETERS
}

/// Draw identifiers from `generate` until one is absent from `used`, then
/// record and return it.
pub fn unique_id<F>(used: &mut HashSet<ChannelId>, mut generate: F) -> ChannelId
where
    F: FnMut() -> ChannelId,
{
    loop {
        let candidate = generate();
        if used.insert(candidate) {
            return candidate;
        }
    }
}

/// Hands out channel identifiers that are unique within one process.
///
/// Built-in identifiers are reserved from the start so generated ones never
/// shadow them.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    used: HashSet<ChannelId>,
}

impl IdAllocator {
    /// Create an allocator with only the built-in identifiers reserved.
    pub fn new() -> Self {
        Self::with_used(HashSet::new())
    }

    /// Create an allocator that treats `used` as already taken.
    pub fn with_used(mut used: HashSet<ChannelId>) -> Self {
        used.insert(ENVIRONMENT_PARAMETERS);
        Self { used }
    }

    /// Allocate a fresh random identifier.
    pub fn allocate(&mut self) -> ChannelId {
        unique_id(&mut self.used, ChannelId::new_random)
    }

    /// Reserve a fixed identifier. Returns false if it was already taken.
    pub fn claim(&mut self, id: ChannelId) -> bool {
        self.used.insert(id)
    }

    /// Whether `id` has been handed out or reserved.
    pub fn is_used(&self, id: ChannelId) -> bool {
        self.used.contains(&id)
    }

    /// Return an identifier to the pool.
    pub fn release(&mut self, id: ChannelId) -> bool {
        if is_builtin(id) {
            return false;
        }
        self.used.remove(&id)
    }

    /// Forget every allocation except the built-in reservations.
    pub fn reset(&mut self) {
        self.used.clear();
        self.used.insert(ENVIRONMENT_PARAMETERS);
    }

    /// Number of identifiers currently taken, built-ins included.
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// Always false: built-ins are permanently reserved.
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
