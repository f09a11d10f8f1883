//! EDF protocol client for UA servers.
//!
//! uawire speaks the UA BBS wire protocol: EDF trees over TCP, with a
//! greeting exchange, request/reply correlation, and server-pushed
//! announcements.
//!
//! # Crate Structure
//!
//! - [`edf`]: EDF tree data model and wire codec
//! - [`conn`]: threaded connection with reply rendezvous and
//!   announcement routing
//! - [`session`]: login sessions and domain objects (behind the
//!   default-on `session` feature)

/// Re-export EDF codec types.
pub mod edf {
    pub use uawire_edf::*;
}

/// Re-export connection types.
pub mod conn {
    pub use uawire_conn::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use uawire_session::*;
}
