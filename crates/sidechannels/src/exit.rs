use std::fmt;
use std::io;

use sidechannels_frame::FrameError;
use sidechannels_manager::ManagerError;
use sidechannels_params::ParamsError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => FAILURE,
        io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    if err.is_protocol_mismatch() {
        return CliError::new(DATA_INVALID, format!("{context}: {err}"));
    }
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::InvalidChannelId { .. } => CliError::usage(format!("{context}: {err}")),
        FrameError::StreamClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn manager_error(context: &str, err: ManagerError) -> CliError {
    match err {
        ManagerError::Protocol(err) => frame_error(context, err),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn params_error(context: &str, err: ParamsError) -> CliError {
    match err {
        ParamsError::InvalidSampler(_) => CliError::usage(format!("{context}: {err}")),
        ParamsError::UnknownDataType(_) | ParamsError::UnknownSampler(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        ParamsError::Manager(err) => manager_error(context, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_mismatch_is_data_invalid() {
        let err = frame_error(
            "decode failed",
            FrameError::Truncated {
                offset: 0,
                needed: 20,
                available: 3,
            },
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("decode failed: truncated"));

        let err = manager_error(
            "replay failed",
            ManagerError::Protocol(FrameError::NegativeLength {
                offset: 4,
                length: -2,
            }),
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn io_kinds_map_to_codes() {
        let denied = io_error("open", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(denied.code, PERMISSION_DENIED);

        let missing = io_error("open", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(missing.code, FAILURE);

        let nested = frame_error(
            "read",
            FrameError::Io(io::Error::from(io::ErrorKind::PermissionDenied)),
        );
        assert_eq!(nested.code, PERMISSION_DENIED);
    }

    #[test]
    fn invalid_sampler_is_usage() {
        let err = params_error("--multi-range", ParamsError::InvalidSampler("odd".into()));
        assert_eq!(err.code, USAGE);
        assert_eq!(err.to_string(), "--multi-range: invalid sampler parameters: odd");
    }
}
