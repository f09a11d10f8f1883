//! Scripted EDF servers for exercising session flows over real sockets.

use std::io::Write;
use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use uawire_conn::Connection;
use uawire_edf::{EdfData, EdfReader};

/// Serve one client: answer the greeting, then send one canned reply per
/// incoming request, forwarding each request tree to the returned channel.
/// After the last reply the server waits for the client to disconnect.
pub(crate) fn scripted_server(
    replies: Vec<&'static str>,
) -> (SocketAddr, Receiver<EdfData>, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = EdfReader::new(stream.try_clone().unwrap());

        let hello = reader.read_tree().unwrap();
        assert_eq!(hello.name(), "edf");
        assert_eq!(hello.string_value().unwrap(), "on");
        stream.write_all(b"<edf=\"on\"/>").unwrap();

        for reply in replies {
            let request = reader.read_tree().unwrap();
            let _ = tx.send(request);
            stream.write_all(reply.as_bytes()).unwrap();
        }
        let _ = reader.read_tree();
    });

    (addr, rx, handle)
}

/// A connection already past the greeting, pointed at a scripted server.
pub(crate) fn connected(addr: SocketAddr) -> Connection {
    let conn = Connection::new();
    conn.connect(addr).unwrap();
    conn
}
