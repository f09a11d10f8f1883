use std::io::{ErrorKind, Write};

use crate::codec::encode;
use crate::error::{EdfError, Result};
use crate::tree::EdfData;

/// Writes EDF trees to any `Write` stream in compact wire form.
pub struct EdfWriter<T> {
    inner: T,
}

impl<T: Write> EdfWriter<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Encode and send one complete tree (blocking).
    pub fn write_tree(&mut self, tree: &EdfData) -> Result<()> {
        let wire = encode(tree);
        let bytes = wire.as_bytes();

        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(EdfError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(EdfError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(EdfError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::tree::EdfData;

    #[test]
    fn write_single_tree() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = EdfWriter::new(cursor);

        writer.write_tree(&EdfData::string("edf", "on")).unwrap();

        let written = writer.into_inner().into_inner();
        assert_eq!(written, b"<edf=\"on\"/>");
    }

    #[test]
    fn write_appends_trees() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = EdfWriter::new(cursor);

        writer.write_tree(&EdfData::integer("a", 1)).unwrap();
        writer.write_tree(&EdfData::integer("b", 2)).unwrap();

        let written = writer.into_inner().into_inner();
        assert_eq!(written, b"<a=1/><b=2/>");
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = EdfWriter::new(sink);

        writer.write_tree(&EdfData::integer("x", 1)).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = EdfWriter::new(writer_impl);
        writer.write_tree(&EdfData::integer("retry", 1)).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data, b"<retry=1/>");
    }

    #[test]
    fn handles_would_block_write_and_flush() {
        let writer_impl = WouldBlockWriteThenFlush {
            wrote_once: false,
            flush_would_block: false,
            data: Vec::new(),
        };

        let mut writer = EdfWriter::new(writer_impl);
        writer.write_tree(&EdfData::integer("retry", 2)).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data, b"<retry=2/>");
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = EdfWriter::new(ZeroWriter);
        let err = writer.write_tree(&EdfData::integer("x", 1)).unwrap_err();
        assert!(matches!(err, EdfError::ConnectionClosed));
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = EdfWriter::new(cursor);

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[test]
    fn written_bytes_decode() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = EdfWriter::new(cursor);

        let tree = EdfData::string("reply", "user_login").with_integer("userid", 3);
        writer.write_tree(&tree).unwrap();

        let wire = writer.into_inner().into_inner();
        let mut reader = crate::reader::EdfReader::new(Cursor::new(wire));
        let decoded = reader.read_tree().unwrap();
        assert_eq!(decoded, tree);
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct WouldBlockWriteThenFlush {
        wrote_once: bool,
        flush_would_block: bool,
        data: Vec<u8>,
    }

    impl Write for WouldBlockWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_would_block {
                self.flush_would_block = true;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
