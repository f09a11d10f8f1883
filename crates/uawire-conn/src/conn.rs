use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use uawire_edf::{EdfData, EdfError, EdfReader, EdfWriter};

use crate::announce::{AnnounceHandler, AnnounceRouter};
use crate::error::{ConnectError, DisconnectReason, NoConnectionError, SendError};
use crate::handshake::exchange_greeting;
use crate::reply::ReplySlot;
use crate::status::{ConnectionStatus, StatusCell};

/// Tunables for a [`Connection`].
#[derive(Debug, Clone)]
pub struct ConnConfig {
    /// Deadline for the greeting exchange after TCP connect.
    pub handshake_timeout: Duration,
    /// Overall deadline for a reply to a request.
    pub reply_timeout: Duration,
    /// How often a waiting requester re-checks connection state.
    pub reply_poll_interval: Duration,
    /// How long the decode loop holds a reply for a slow requester.
    pub reply_handoff_timeout: Duration,
    /// Announcements buffered between the decode loop and dispatch.
    pub announce_queue_depth: usize,
}

impl Default for ConnConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(5),
            reply_timeout: Duration::from_secs(30),
            reply_poll_interval: Duration::from_secs(1),
            reply_handoff_timeout: Duration::from_secs(5),
            announce_queue_depth: 64,
        }
    }
}

/// A client connection to an EDF server.
///
/// Clones are cheap and share one underlying session. After `connect`, a
/// decode loop reads the stream and routes each tree by its root name:
/// `reply` hands off to the requester blocked in [`send_and_receive`]
/// (one request is in flight at a time), `announce` goes to the handlers
/// registered with [`subscribe`], anything else is logged and skipped.
///
/// [`send_and_receive`]: Connection::send_and_receive
/// [`subscribe`]: Connection::subscribe
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

struct Inner {
    config: ConnConfig,
    status: StatusCell,
    reply: ReplySlot,
    router: AnnounceRouter,
    engaged: AtomicBool,
    request_lock: Mutex<()>,
    writer: Mutex<Option<EdfWriter<TcpStream>>>,
    stream: Mutex<Option<TcpStream>>,
}

impl Connection {
    pub fn new() -> Self {
        Self::with_config(ConnConfig::default())
    }

    pub fn with_config(config: ConnConfig) -> Self {
        let router = AnnounceRouter::new(config.announce_queue_depth);
        Self {
            inner: Arc::new(Inner {
                config,
                status: StatusCell::new(),
                reply: ReplySlot::new(),
                router,
                engaged: AtomicBool::new(false),
                request_lock: Mutex::new(()),
                writer: Mutex::new(None),
                stream: Mutex::new(None),
            }),
        }
    }

    /// Connect, exchange greetings, and start the decode loop.
    ///
    /// A `Connection` is single-use: a second `connect`, even after a
    /// failure or a `close`, returns `AlreadyConnected`.
    pub fn connect(&self, addr: impl ToSocketAddrs) -> Result<(), ConnectError> {
        if self.inner.engaged.swap(true, Ordering::SeqCst) {
            return Err(ConnectError::AlreadyConnected);
        }

        match self.connect_inner(addr) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.inner
                    .status
                    .set(ConnectionStatus::ConnectFailed, err.to_string());
                Err(err)
            }
        }
    }

    fn connect_inner(&self, addr: impl ToSocketAddrs) -> Result<(), ConnectError> {
        let stream = TcpStream::connect(addr)?;
        let (reader, writer) = exchange_greeting(stream, self.inner.config.handshake_timeout)?;

        let shutdown_handle = reader.get_ref().try_clone()?;
        *lock(&self.inner.writer) = Some(writer);
        *lock(&self.inner.stream) = Some(shutdown_handle);
        self.inner
            .status
            .set(ConnectionStatus::Connected, "Connected");

        let inner = Arc::clone(&self.inner);
        thread::spawn(move || decode_loop(&inner, reader));
        Ok(())
    }

    /// Write one tree without waiting for anything back.
    ///
    /// A write failure marks the connection `ConnectFailed` but leaves the
    /// transport to the decode loop; a reply already in flight can still
    /// be collected.
    pub fn send(&self, tree: &EdfData) -> Result<(), SendError> {
        if !self.inner.status.is_connected() {
            return Err(SendError::NotConnected);
        }

        let mut writer = lock(&self.inner.writer);
        let Some(writer) = writer.as_mut() else {
            return Err(SendError::NotConnected);
        };

        match writer.write_tree(tree) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.inner.status.set(
                    ConnectionStatus::ConnectFailed,
                    format!("Send failed: {err}"),
                );
                Err(SendError::Io(err))
            }
        }
    }

    /// Send a request and block for its reply.
    ///
    /// Requests are serialized on an internal lock. The wait re-checks
    /// connection state every poll interval, so a dropped connection is
    /// observed promptly rather than at the reply deadline. A reply that
    /// never arrives within the deadline tears the connection down.
    pub fn send_and_receive(&self, tree: &EdfData) -> Result<EdfData, NoConnectionError> {
        let _guard = lock(&self.inner.request_lock);

        if let Err(err) = self.send(tree) {
            debug!(error = %err, "request write failed");
            return Err(NoConnectionError::new(DisconnectReason::ConnectionLost));
        }

        let deadline = Instant::now() + self.inner.config.reply_timeout;
        loop {
            if !self.inner.status.is_connected() {
                return Err(NoConnectionError::new(DisconnectReason::ConnectionLost));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                self.inner
                    .status
                    .set(ConnectionStatus::NotConnected, "No reply");
                teardown(&self.inner);
                return Err(NoConnectionError::new(DisconnectReason::ConnectionLost));
            }

            let slice = remaining.min(self.inner.config.reply_poll_interval);
            if let Some(reply) = self.inner.reply.collect(slice) {
                return Ok(reply);
            }
            if self.inner.reply.is_closed() {
                return Err(NoConnectionError::new(DisconnectReason::ConnectionLost));
            }
        }
    }

    /// Register a handler for announcements whose value equals `kind`.
    pub fn subscribe(&self, kind: impl Into<String>, handler: Arc<dyn AnnounceHandler>) {
        self.inner.router.subscribe(kind, handler);
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.status.status()
    }

    /// Current state with its explanatory message.
    pub fn status_detail(&self) -> (ConnectionStatus, String) {
        self.inner.status.get()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.status.is_connected()
    }

    /// Disconnect. Safe to call at any time, from any clone.
    pub fn close(&self) {
        self.inner
            .status
            .set(ConnectionStatus::NotConnected, "Disconnected");
        teardown(&self.inner);
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_loop(inner: &Inner, mut reader: EdfReader<TcpStream>) {
    loop {
        if !inner.status.is_connected() {
            break;
        }

        let tree = match reader.read_tree() {
            Ok(tree) => tree,
            Err(err) => {
                // After a deliberate close the read failure is expected;
                // only a live connection turns it into a failure state.
                if inner.status.is_connected() {
                    let message = match err {
                        EdfError::ConnectionClosed => "Connection closed by server".to_string(),
                        other => format!("Read failed: {other}"),
                    };
                    warn!(%message, "decode loop stopping");
                    inner.status.set(ConnectionStatus::ConnectFailed, message);
                }
                break;
            }
        };

        if tree.is_named("announce") {
            inner.router.publish(tree);
        } else if tree.is_named("reply") {
            if !inner
                .reply
                .deposit(tree, inner.config.reply_handoff_timeout)
            {
                warn!("reply had no waiting requester; disconnecting");
                inner
                    .status
                    .set(ConnectionStatus::NotConnected, "Reply not collected");
                break;
            }
        } else {
            warn!(element = %tree.name(), "ignoring unexpected element");
        }
    }

    teardown(inner);
}

fn teardown(inner: &Inner) {
    inner.reply.close();
    if let Some(stream) = lock(&inner.stream).take() {
        // Unblocks a decode loop stuck in read.
        let _ = stream.shutdown(Shutdown::Both);
    }
    *lock(&inner.writer) = None;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
