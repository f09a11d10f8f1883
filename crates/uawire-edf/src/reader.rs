use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::decode_tree;
use crate::error::{EdfError, Result};
use crate::tree::EdfData;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete EDF trees from any `Read` stream.
///
/// Buffers partial reads internally so callers always get complete trees.
pub struct EdfReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> EdfReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Read the next complete tree (blocking).
    ///
    /// Returns `Err(EdfError::ConnectionClosed)` when the stream ends at a
    /// tree boundary. End of stream in the middle of a tree is a syntax
    /// error, not a clean close.
    pub fn read_tree(&mut self) -> Result<EdfData> {
        loop {
            if let Some(tree) = decode_tree(&mut self.buf)? {
                return Ok(tree);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(EdfError::Io(err)),
            };

            if read == 0 {
                if self.buf.iter().all(|byte| byte.is_ascii_whitespace()) {
                    return Err(EdfError::ConnectionClosed);
                }
                return Err(EdfError::Syntax {
                    message: "end of stream inside element".to_string(),
                    offset: self.buf.len(),
                });
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
