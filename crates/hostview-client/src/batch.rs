//! Single bounded fetch for scripts.

use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use hostview_core::Record;
use hostview_protocol::DecodeError;

use crate::driver::{DriverEvent, RequestDriver};
use crate::session::Session;
use crate::sink::OutputSink;

/// Bound on a batch fetch, unless configured.
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Result of one batch fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Vec<Record>),
    /// Nothing decoded before the deadline.
    Timeout,
    /// The connection failed or closed without a usable response.
    ConnectionError(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Process exit status: 0 on success, 1 otherwise.
    pub fn exit_status(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    /// Hands the outcome to `sink` and returns the exit status.
    pub fn report(&self, sink: &mut dyn OutputSink) -> u8 {
        match self {
            Self::Success(records) => sink.on_records(records),
            Self::Timeout => sink.on_fault("no response before the deadline"),
            Self::ConnectionError(reason) => sink.on_fault(reason),
        }
        self.exit_status()
    }
}

/// Runs one connect, request, decode cycle per call.
pub struct BatchRunner {
    driver: RequestDriver,
}

impl BatchRunner {
    pub fn new(session: Session) -> Self {
        Self {
            driver: RequestDriver::new(session),
        }
    }

    pub fn session(&self) -> &Session {
        self.driver.session()
    }

    pub fn disconnect(&mut self) {
        self.driver.disconnect();
    }

    /// Connects, requests and waits for the first decoded snapshot, all
    /// within `timeout`. Never retries.
    ///
    /// A timed out fetch leaves the session as it is; call
    /// [`disconnect`](Self::disconnect) to close it.
    pub async fn run_once(&mut self, timeout: Duration) -> Outcome {
        let deadline = Instant::now() + timeout;
        self.driver.connect();

        match timeout_at(deadline, self.await_outcome()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    endpoint = %self.driver.session().endpoint(),
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "batch fetch timed out"
                );
                Outcome::Timeout
            }
        }
    }

    async fn await_outcome(&mut self) -> Outcome {
        let mut last_decode_error: Option<DecodeError> = None;
        loop {
            match self.driver.next_event().await {
                DriverEvent::Connected => debug!("connected, waiting for response"),
                DriverEvent::Records(records) => return Outcome::Success(records),
                DriverEvent::DecodeFailed(e) => last_decode_error = Some(e),
                DriverEvent::Fault(reason) => return Outcome::ConnectionError(reason),
                DriverEvent::Disconnected => {
                    let reason = match last_decode_error {
                        Some(e) => format!("invalid response: {e}"),
                        None => "connection closed before a response was received".to_string(),
                    };
                    return Outcome::ConnectionError(reason);
                }
            }
        }
    }
}
