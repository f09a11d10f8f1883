use crate::tree::ValueKind;

/// Errors that can occur while encoding, decoding, or inspecting EDF trees.
#[derive(Debug, thiserror::Error)]
pub enum EdfError {
    /// The input contained bytes that do not form a valid token.
    #[error("lexical error at byte {offset}: {message}")]
    Lexical { message: String, offset: usize },

    /// The token stream did not match the element grammar.
    #[error("syntax error at byte {offset}: {message}")]
    Syntax { message: String, offset: usize },

    /// A typed value accessor was called on an element holding a different
    /// value kind.
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    /// An I/O error occurred while reading or writing trees.
    #[error("EDF I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed at an element boundary.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, EdfError>;
