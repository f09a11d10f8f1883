//! User sessions and domain objects for UA servers.
//!
//! A [`Session`] drives the login lifecycle over a
//! [`Connection`](uawire_conn::Connection). The domain objects map the
//! server's reply trees onto typed values: [`Folder`] and [`User`] parse
//! `<folder=[id]>` and `<user=[id]>` trees with their required children
//! while [`FolderList`] and [`UserList`] cache name-keyed listings.
//! [`Message`] carries a post or page through composition and delivery.

pub mod error;
pub mod folder;
pub mod message;
pub mod session;
pub mod user;

#[cfg(test)]
mod testutil;

pub use error::{Result, SessionError};
pub use folder::{Folder, FolderList};
pub use message::{DeliveryOutcome, Message, MessageKind};
pub use session::{LoginOptions, Session, SessionStatus, DEFAULT_PROTOCOL};
pub use user::{User, UserList, ACCESS_NAMES};
