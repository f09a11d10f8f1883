use std::fmt;
use std::io;

use uawire_conn::{ConnectError, NoConnectionError, SendError};
use uawire_edf::EdfError;
use uawire_session::SessionError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PROTOCOL_ERROR: i32 = 3;
pub const AUTH_FAILED: i32 = 50;
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
        io::ErrorKind::PermissionDenied => AUTH_FAILED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn edf_error(context: &str, err: EdfError) -> CliError {
    match err {
        EdfError::Io(source) => io_error(context, source),
        EdfError::Lexical { .. } | EdfError::Syntax { .. } | EdfError::TypeMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        EdfError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn connect_error(context: &str, err: ConnectError) -> CliError {
    match err {
        ConnectError::Io(source) => io_error(context, source),
        ConnectError::Handshake(_) => CliError::new(PROTOCOL_ERROR, format!("{context}: {err}")),
        ConnectError::AlreadyConnected => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

pub fn send_error(context: &str, err: SendError) -> CliError {
    match err {
        SendError::NotConnected => CliError::new(FAILURE, format!("{context}: {err}")),
        SendError::Io(source) => edf_error(context, source),
    }
}

pub fn no_connection_error(context: &str, err: NoConnectionError) -> CliError {
    CliError::new(FAILURE, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Connect(err) => connect_error(context, err),
        SessionError::NoConnection(err) => no_connection_error(context, err),
        SessionError::Edf(err) => edf_error(context, err),
        SessionError::WrongEdf(_) => CliError::new(PROTOCOL_ERROR, format!("{context}: {err}")),
        SessionError::InvalidOperation(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SessionError::InvalidData(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        SessionError::NotLoggedIn => CliError::new(AUTH_FAILED, format!("{context}: {err}")),
    }
}
