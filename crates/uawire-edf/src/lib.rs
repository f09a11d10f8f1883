//! EDF tree data model and wire codec.
//!
//! EDF is a compact XML-like format for trees of named, optionally valued
//! elements:
//!
//! ```text
//! <request="user_login"><name="brian"/><protocol="2.6"/></>
//! ```
//!
//! An element carries a name (possibly empty), at most one string or
//! integer value, and any number of children. Close tags may repeat the
//! open tag's name but the decoder never checks it: a close tag ends
//! whatever element is open. No partial reads, no buffer management in
//! user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod tree;
pub mod writer;

pub use codec::{decode_tree, encode, encode_pretty, escape, unescape, MAX_NESTING_DEPTH};
pub use error::{EdfError, Result};
pub use reader::EdfReader;
pub use tree::{EdfData, Value, ValueKind};
pub use writer::EdfWriter;
