//! Threaded client connection for EDF servers.
//!
//! A [`Connection`] owns one TCP session. After the greeting exchange a
//! background decode loop classifies each incoming tree by its root name:
//! replies rendezvous with the single in-flight request while
//! announcements fan out in stream order through a bounded queue to
//! subscribed handlers. Anything else is logged and skipped. Connection
//! state is observable at any time as a status plus the message recorded
//! when that status was first entered.

pub mod announce;
pub mod conn;
pub mod error;
mod handshake;
pub mod reply;
pub mod status;

pub use announce::{AnnounceHandler, AnnounceRouter};
pub use conn::{ConnConfig, Connection};
pub use error::{ConnectError, DisconnectReason, NoConnectionError, SendError};
pub use reply::ReplySlot;
pub use status::{ConnectionStatus, StatusCell};
