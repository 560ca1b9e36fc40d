use sidechannels_frame::FrameConfig;

use crate::queue::DEFAULT_CAPACITY;

/// Controls registry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Frame decoding limits applied to incoming buffers.
    pub frame: FrameConfig,
    /// Initial capacity of the orphan-frame cache.
    pub initial_cache_capacity: usize,
    /// Cache size past which a warning is logged. The cache is not bounded.
    pub cache_warn_threshold: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            initial_cache_capacity: DEFAULT_CAPACITY,
            cache_warn_threshold: 1024,
        }
    }
}
