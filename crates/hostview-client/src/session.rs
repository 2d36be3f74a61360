//! Connection lifecycle for one server endpoint.
//!
//! A [`Session`] owns the socket and the [`ConnectionState`]. Socket I/O runs
//! in a per-attempt task that reports back over an ordered channel; callers
//! observe everything through [`Session::next_event`]:
//!
//! ```text
//! connect() ──► Connecting ──► Connected ──► DataReceived* ──► Disconnected
//!                    │               │
//!                    └── Fault ──────┴──► Disconnected
//! ```
//!
//! Every attempt gets a generation number. Starting a new attempt or closing
//! the current one bumps it, and anything still queued from an older
//! generation is dropped, so a caller never sees events of a connection it
//! already abandoned.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use hostview_core::{ConfigError, Endpoint};

/// Default bound on a single connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Observable lifecycle transitions, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The stream is open; `send` now delivers.
    Connected,
    /// The stream is closed, by either side or after a fault.
    Disconnected,
    /// Raw bytes as read from the socket, unframed.
    DataReceived(Vec<u8>),
    /// Transport failure; a `Disconnected` follows.
    Fault(String),
}

/// What the I/O task reports.
#[derive(Debug)]
enum Signal {
    Connected,
    Data(Vec<u8>),
    Fault(String),
    Closed,
}

type Tagged = (u64, Signal);

/// One logical connection to one server endpoint.
///
/// Methods that start I/O must be called from within a tokio runtime.
pub struct Session {
    endpoint: Endpoint,
    connect_timeout: Duration,
    state: ConnectionState,
    generation: u64,
    signals_tx: mpsc::UnboundedSender<Tagged>,
    signals_rx: mpsc::UnboundedReceiver<Tagged>,
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    io_task: Option<JoinHandle<()>>,
    /// Events raised synchronously, delivered before any signal.
    pending: VecDeque<SessionEvent>,
}

impl Session {
    /// Creates a disconnected session for `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        Self {
            endpoint,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            state: ConnectionState::Disconnected,
            generation: 0,
            signals_tx,
            signals_rx,
            outbound: None,
            io_task: None,
            pending: VecDeque::new(),
        }
    }

    /// Builder: bound each connect attempt by `timeout`.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Starts a connection attempt.
    ///
    /// No-op while an attempt is in flight or the stream is open; a second
    /// call is never queued. The outcome arrives as `Connected`, or as
    /// `Fault` followed by `Disconnected`.
    pub fn connect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!(state = ?self.state, "connect ignored");
            return;
        }

        self.generation += 1;
        self.state = ConnectionState::Connecting;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        self.outbound = Some(outbound_tx);

        let attempt = Attempt {
            generation: self.generation,
            endpoint: self.endpoint.clone(),
            connect_timeout: self.connect_timeout,
            signals: self.signals_tx.clone(),
        };
        debug!(
            host = self.endpoint.host(),
            port = self.endpoint.port(),
            generation = self.generation,
            "connecting"
        );
        self.io_task = Some(tokio::spawn(attempt.run(outbound_rx)));
    }

    /// Closes the stream (or abandons a pending attempt).
    ///
    /// Always followed by a `Disconnected` event, even when nothing was open,
    /// unless a new `connect` supersedes it first.
    pub fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!(state = ?self.state, "disconnecting");
        }
        self.teardown();
        // The receiver lives in `self`, so this send cannot fail.
        let _ = self.signals_tx.send((self.generation, Signal::Closed));
    }

    /// Changes the endpoint.
    ///
    /// An invalid port or empty host is rejected and the current endpoint
    /// kept. If connected, the session reconnects to the new endpoint.
    pub fn set_endpoint(&mut self, host: impl Into<String>, port: u32) -> Result<(), ConfigError> {
        let endpoint = Endpoint::new(host, port).inspect_err(|e| {
            warn!(error = %e, current = %self.endpoint, "endpoint rejected");
        })?;
        if endpoint == self.endpoint {
            return Ok(());
        }

        debug!(from = %self.endpoint, to = %endpoint, "endpoint changed");
        self.endpoint = endpoint;
        if self.state == ConnectionState::Connected {
            // The reconnect supersedes the close signal, so report it here.
            self.teardown();
            self.pending.push_back(SessionEvent::Disconnected);
            self.connect();
        }
        Ok(())
    }

    /// Queues `bytes` for writing.
    ///
    /// Returns `false`, and writes nothing, unless the session is connected.
    /// A write failure surfaces later as a `Fault` event.
    pub fn send(&mut self, bytes: &[u8]) -> bool {
        if self.state != ConnectionState::Connected {
            debug!(state = ?self.state, bytes = bytes.len(), "send ignored");
            return false;
        }
        self.outbound
            .as_ref()
            .is_some_and(|tx| tx.send(bytes.to_vec()).is_ok())
    }

    /// Waits for the next lifecycle event of the current connection.
    ///
    /// Cancel safe: dropping the future loses no event.
    pub async fn next_event(&mut self) -> SessionEvent {
        if let Some(event) = self.pending.pop_front() {
            return event;
        }
        loop {
            let Some((generation, signal)) = self.signals_rx.recv().await else {
                // Unreachable while `self` holds a sender.
                return SessionEvent::Disconnected;
            };
            if generation != self.generation {
                trace!(generation, current = self.generation, "dropping stale signal");
                continue;
            }

            return match signal {
                Signal::Connected => {
                    self.state = ConnectionState::Connected;
                    SessionEvent::Connected
                }
                Signal::Data(bytes) => SessionEvent::DataReceived(bytes),
                Signal::Fault(reason) => SessionEvent::Fault(reason),
                Signal::Closed => {
                    self.io_task = None;
                    self.outbound = None;
                    self.state = ConnectionState::Disconnected;
                    SessionEvent::Disconnected
                }
            };
        }
    }

    fn teardown(&mut self) {
        if let Some(task) = self.io_task.take() {
            task.abort();
        }
        self.outbound = None;
        self.pending.clear();
        self.generation += 1;
        self.state = ConnectionState::Disconnected;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.io_task.take() {
            task.abort();
        }
    }
}

/// Socket side of one connection attempt.
struct Attempt {
    generation: u64,
    endpoint: Endpoint,
    connect_timeout: Duration,
    signals: mpsc::UnboundedSender<Tagged>,
}

impl Attempt {
    async fn run(self, mut outbound: mpsc::UnboundedReceiver<Vec<u8>>) {
        let connecting = TcpStream::connect((self.endpoint.host(), self.endpoint.port()));
        let stream = match tokio::time::timeout(self.connect_timeout, connecting).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return self.fail(format!("failed to connect to {}: {}", self.endpoint, e));
            }
            Err(_) => {
                return self.fail(format!(
                    "connection to {} timed out after {}ms",
                    self.endpoint,
                    self.connect_timeout.as_millis()
                ));
            }
        };

        self.emit(Signal::Connected);
        let (mut reader, mut writer) = stream.into_split();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            tokio::select! {
                read = reader.read(&mut chunk) => match read {
                    Ok(0) => return self.emit(Signal::Closed),
                    Ok(n) => {
                        trace!(bytes = n, "read");
                        self.emit(Signal::Data(chunk[..n].to_vec()));
                    }
                    Err(e) => return self.fail(format!("read failed: {e}")),
                },
                Some(bytes) = outbound.recv() => {
                    if let Err(e) = writer.write_all(&bytes).await {
                        return self.fail(format!("write failed: {e}"));
                    }
                    trace!(bytes = bytes.len(), "wrote");
                }
            }
        }
    }

    fn emit(&self, signal: Signal) {
        // A closed channel means the session is gone; nobody is listening.
        let _ = self.signals.send((self.generation, signal));
    }

    fn fail(&self, reason: String) {
        debug!(generation = self.generation, reason = %reason, "connection fault");
        self.emit(Signal::Fault(reason));
        self.emit(Signal::Closed);
    }
}
