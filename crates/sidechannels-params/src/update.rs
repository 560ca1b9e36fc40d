use serde::{Deserialize, Serialize};
use sidechannels_frame::{Frame, IncomingMessage, OutgoingMessage, ENVIRONMENT_PARAMETERS};

use crate::error::{ParamsError, Result};
use crate::sampler::Sampler;

/// Data type tag for a plain float value.
pub const SCALAR: i32 = 0;
/// Data type tag for a seeded sampler.
pub const SAMPLED: i32 = 1;

/// One value change for a named environment parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterUpdate {
    /// Set the parameter to this value.
    Scalar(f32),
    /// Draw the value from `sampler` seeded with `seed`.
    Sampled { seed: i32, sampler: Sampler },
}

impl ParameterUpdate {
    /// Append `name` and this update in the parameter channel payload layout.
    pub fn write_to(&self, name: &str, msg: &mut OutgoingMessage) {
        msg.write_string(name);
        match self {
            ParameterUpdate::Scalar(value) => {
                msg.write_i32(SCALAR);
                msg.write_f32(*value);
            }
            ParameterUpdate::Sampled { seed, sampler } => {
                msg.write_i32(SAMPLED);
                msg.write_i32(*seed);
                sampler.write_to(msg);
            }
        }
    }

    /// Encode as a complete parameter channel payload.
    pub fn to_message(&self, name: &str) -> OutgoingMessage {
        let mut msg = OutgoingMessage::new();
        self.write_to(name, &mut msg);
        msg
    }

    /// Encode as a frame addressed to the parameter channel.
    pub fn to_frame(&self, name: &str) -> Frame {
        Frame::new(ENVIRONMENT_PARAMETERS, self.to_message(name).into_bytes())
    }

    /// Read a parameter name and its update.
    ///
    /// Truncated fields fall back to an empty name and zero values, the way
    /// every cursor read does.
    pub fn read_from(msg: &mut IncomingMessage) -> Result<(String, Self)> {
        let name = msg.read_string("");
        let update = match msg.read_i32(-1) {
            SCALAR => ParameterUpdate::Scalar(msg.read_f32(0.0)),
            SAMPLED => {
                let seed = msg.read_i32(0);
                let sampler = Sampler::read_from(msg)?;
                ParameterUpdate::Sampled { seed, sampler }
            }
            other => return Err(ParamsError::UnknownDataType(other)),
        };
        Ok((name, update))
    }

    /// The value the environment ends up storing.
    pub fn resolve(&self) -> Result<f32> {
        match self {
            ParameterUpdate::Scalar(value) => Ok(*value),
            ParameterUpdate::Sampled { seed, sampler } => sampler.sample(*seed),
        }
    }
}
