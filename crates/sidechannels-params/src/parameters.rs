use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use sidechannels_manager::SideChannelManager;

use crate::channel::EnvironmentParametersChannel;
use crate::error::Result;

/// Called with the new value whenever its parameter is updated.
pub type Callback = Arc<dyn Fn(f32) + Send + Sync>;

#[derive(Default)]
pub(crate) struct ParameterStore {
    values: BTreeMap<String, f32>,
    callbacks: HashMap<String, Callback>,
}

pub(crate) type SharedStore = Arc<RwLock<ParameterStore>>;

pub(crate) fn read(store: &SharedStore) -> RwLockReadGuard<'_, ParameterStore> {
    store.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write(store: &SharedStore) -> RwLockWriteGuard<'_, ParameterStore> {
    store.write().unwrap_or_else(PoisonError::into_inner)
}

/// Store `value` under `name`, then run its callback with the lock released.
pub(crate) fn apply(store: &SharedStore, name: String, value: f32) {
    let callback = {
        let mut guard = write(store);
        let callback = guard.callbacks.get(&name).cloned();
        guard.values.insert(name, value);
        callback
    };
    if let Some(callback) = callback {
        callback(value);
    }
}

/// Read access to the parameters received from the trainer.
///
/// Cheap to clone; every clone sees the same values as the channel that
/// created it.
#[derive(Clone)]
pub struct EnvironmentParameters {
    store: SharedStore,
}

impl EnvironmentParameters {
    pub(crate) fn from_store(store: SharedStore) -> Self {
        Self { store }
    }

    /// Create the parameter channel, register it with `manager`, and return
    /// a handle to its values.
    pub fn install(manager: &mut SideChannelManager) -> Result<Self> {
        let channel = EnvironmentParametersChannel::new();
        let handle = channel.parameters();
        manager.register_channel(channel)?;
        Ok(handle)
    }

    /// Latest value for `name`, or `default` if none was received.
    pub fn get_with_default(&self, name: &str, default: f32) -> f32 {
        read(&self.store).values.get(name).copied().unwrap_or(default)
    }

    /// Run `callback` on every update of `name`, replacing any earlier one.
    pub fn register_callback<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(f32) + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(parameter = %name, "registered parameter callback");
        write(&self.store).callbacks.insert(name, Arc::new(callback));
    }

    /// Names that have received a value, sorted.
    pub fn list_known_parameter_names(&self) -> Vec<String> {
        read(&self.store).values.keys().cloned().collect()
    }

    /// Snapshot of every received value.
    pub fn values(&self) -> BTreeMap<String, f32> {
        read(&self.store).values.clone()
    }
}

impl std::fmt::Debug for EnvironmentParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentParameters")
            .field("values", &read(&self.store).values)
            .finish()
    }
}
