use sidechannels_manager::ManagerError;

/// Errors that can occur while decoding or resolving environment parameters.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    /// The data type tag is neither scalar nor sampler.
    #[error("unknown environment parameter data type {0}")]
    UnknownDataType(i32),

    /// The sampler kind is not one this channel can draw from.
    #[error("unknown sampler kind {0}")]
    UnknownSampler(i32),

    /// The sampler parameters cannot produce a value.
    #[error("invalid sampler parameters: {0}")]
    InvalidSampler(String),

    /// The parameter channel could not be registered.
    #[error(transparent)]
    Manager(#[from] ManagerError),
}

pub type Result<T> = std::result::Result<T, ParamsError>;
