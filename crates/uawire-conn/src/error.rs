use std::fmt;

/// Why a connection is no longer usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    CouldNotConnect,
    ConnectionLost,
    LoggedOut,
    ForceDisconnect,
}

impl DisconnectReason {
    /// Human-readable explanation suitable for end users.
    pub fn message(&self) -> &'static str {
        match self {
            DisconnectReason::CouldNotConnect => "Could not connect to server",
            DisconnectReason::ConnectionLost => "Connection to server lost",
            DisconnectReason::LoggedOut => "You have logged out",
            DisconnectReason::ForceDisconnect => "You have been logged out",
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Failure to establish a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// TCP connect or socket setup failed.
    #[error("connect failed: {0}")]
    Io(#[from] std::io::Error),

    /// The greeting exchange did not complete.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// A `Connection` drives one TCP session; `connect` may be called once.
    #[error("connection already used")]
    AlreadyConnected,
}

/// Failure to write a tree to the connection.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The connection is not in the `Connected` state.
    #[error("not connected")]
    NotConnected,

    /// The write itself failed; the connection is marked failed but the
    /// transport is left to the decode loop to tear down.
    #[error("send failed: {0}")]
    Io(#[from] uawire_edf::EdfError),
}

/// The connection dropped out from under a request.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .reason.message())]
pub struct NoConnectionError {
    pub reason: DisconnectReason,
}

impl NoConnectionError {
    pub fn new(reason: DisconnectReason) -> Self {
        Self { reason }
    }
}
