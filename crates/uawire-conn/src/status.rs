use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    NotConnected,
    ConnectFailed,
    Connected,
    LostConnection,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConnectionStatus::NotConnected => "not connected",
            ConnectionStatus::ConnectFailed => "connect failed",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::LostConnection => "lost connection",
        };
        f.write_str(text)
    }
}

/// Tracks the connection state together with its explanatory message.
///
/// A transition applies only when the state actually changes, so the
/// message recorded when a state was first entered survives repeated
/// attempts to set the same state.
#[derive(Debug)]
pub struct StatusCell {
    inner: Mutex<StatusInner>,
}

#[derive(Debug)]
struct StatusInner {
    status: ConnectionStatus,
    message: String,
}

impl StatusCell {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StatusInner {
                status: ConnectionStatus::NotConnected,
                message: "Not connected".to_string(),
            }),
        }
    }

    /// Record a transition. Ignored when the state is unchanged.
    pub fn set(&self, status: ConnectionStatus, message: impl Into<String>) {
        let mut inner = self.lock();
        if inner.status != status {
            inner.status = status;
            inner.message = message.into();
        }
    }

    /// Current state and its message.
    pub fn get(&self) -> (ConnectionStatus, String) {
        let inner = self.lock();
        (inner.status, inner.message.clone())
    }

    pub fn status(&self) -> ConnectionStatus {
        self.lock().status
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    fn lock(&self) -> MutexGuard<'_, StatusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}
