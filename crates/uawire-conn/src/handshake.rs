use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use tracing::debug;
use uawire_edf::{EdfData, EdfError, EdfReader, EdfWriter};

use crate::error::ConnectError;

/// Exchange the protocol greeting on a freshly connected stream.
///
/// Sends `<edf="on"/>` and reads the server's single greeting tree, which
/// must be rooted at an element named `edf` (any case). The stream's read
/// timeout covers the exchange and is cleared before the reader (holding
/// any buffered overshoot) is handed to the decode loop.
pub(crate) fn exchange_greeting(
    stream: TcpStream,
    timeout: Duration,
) -> Result<(EdfReader<TcpStream>, EdfWriter<TcpStream>), ConnectError> {
    stream.set_read_timeout(Some(timeout))?;
    let write_half = stream.try_clone()?;

    let mut reader = EdfReader::new(stream);
    let mut writer = EdfWriter::new(write_half);

    writer
        .write_tree(&EdfData::string("edf", "on"))
        .map_err(greeting_error)?;
    let greeting = reader.read_tree().map_err(greeting_error)?;

    if !greeting.is_named("edf") {
        return Err(ConnectError::Handshake(format!(
            "unexpected greeting element '{}'",
            greeting.name()
        )));
    }
    debug!(greeting = %greeting, "server greeting accepted");

    reader.get_ref().set_read_timeout(None)?;
    Ok((reader, writer))
}

fn greeting_error(err: EdfError) -> ConnectError {
    match err {
        EdfError::Io(io)
            if io.kind() == ErrorKind::WouldBlock || io.kind() == ErrorKind::TimedOut =>
        {
            ConnectError::Handshake("timed out waiting for server greeting".to_string())
        }
        EdfError::ConnectionClosed => {
            ConnectError::Handshake("connection closed during greeting".to_string())
        }
        other => ConnectError::Handshake(other.to_string()),
    }
}
