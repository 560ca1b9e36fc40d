use std::any::Any;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use sidechannels_frame::{ChannelId, IncomingMessage, ENVIRONMENT_PARAMETERS};
use sidechannels_manager::{ChannelError, SideChannel};

use crate::parameters::{self, EnvironmentParameters, ParameterStore, SharedStore};
use crate::update::ParameterUpdate;

/// Receives environment parameters from the trainer.
///
/// Values land in a store shared with every [`EnvironmentParameters`]
/// handle obtained from [`parameters`](Self::parameters). Nothing is ever
/// sent back on this channel.
pub struct EnvironmentParametersChannel {
    store: SharedStore,
}

impl EnvironmentParametersChannel {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(ParameterStore::default())),
        }
    }

    /// A handle reading this channel's values.
    pub fn parameters(&self) -> EnvironmentParameters {
        EnvironmentParameters::from_store(Arc::clone(&self.store))
    }
}

impl Default for EnvironmentParametersChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl SideChannel for EnvironmentParametersChannel {
    fn id(&self) -> ChannelId {
        ENVIRONMENT_PARAMETERS
    }

    fn on_message_received(&mut self, msg: &mut IncomingMessage) -> Result<(), ChannelError> {
        let (name, update) = ParameterUpdate::read_from(msg)
            .map_err(|err| ChannelError::Malformed(err.to_string()))?;

        let value = update.resolve().map_err(|err| {
            ChannelError::Malformed(format!("parameter {name:?}: {err}"))
        })?;

        tracing::trace!(parameter = %name, value, "environment parameter updated");
        parameters::apply(&self.store, name, value);
        Ok(())
    }

    fn outbound_len(&self) -> usize {
        0
    }

    fn drain_outbound(&mut self) -> Vec<Bytes> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
