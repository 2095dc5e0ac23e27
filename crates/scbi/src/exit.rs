use std::fmt;
use std::io;

use scbi_frame::PayloadError;
use scbi_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
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
        io::ErrorKind::TimedOut => TIMEOUT,
        io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Open(source)
        | TransportError::Address { source, .. }
        | TransportError::Io(source)
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            PERMISSION_DENIED
        }
        TransportError::InterfaceNameTooLong { .. } => USAGE,
        TransportError::Shutdown => SUCCESS,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn payload_error(context: &str, err: PayloadError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}
