use uawire_conn::{ConnectError, NoConnectionError};
use uawire_edf::EdfError;

/// Errors surfaced by session operations and domain object parsing.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server sent a well-formed tree whose shape does not match the
    /// object being built from it.
    #[error("unexpected EDF: {0}")]
    WrongEdf(String),

    /// Connecting the underlying transport failed.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The connection dropped out from under a request.
    #[error(transparent)]
    NoConnection(#[from] NoConnectionError),

    /// Encoding or decoding EDF failed.
    #[error(transparent)]
    Edf(#[from] EdfError),

    /// The operation is not valid for the object's current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The object is missing data the operation requires.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The operation requires a logged-in session.
    #[error("not logged in")]
    NotLoggedIn,
}

pub type Result<T> = std::result::Result<T, SessionError>;
