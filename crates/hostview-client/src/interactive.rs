//! Self-healing display loop.
//!
//! Connects, shows each snapshot, and after every disconnect schedules a
//! single reconnect attempt `reconnect_delay` later. The runner owns the
//! timer: a newer disconnect replaces a pending one and dropping the runner
//! cancels it.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Sleep;
use tracing::{debug, info, warn};

use hostview_core::ConfigError;

use crate::driver::{DriverEvent, RequestDriver};
use crate::session::{ConnectionState, Session};
use crate::sink::OutputSink;

/// Delay between a disconnect and the next attempt, unless configured.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

pub struct InteractiveRunner<S> {
    driver: RequestDriver,
    sink: S,
    reconnect_delay: Duration,
    reconnect: Option<Pin<Box<Sleep>>>,
}

impl<S: OutputSink> InteractiveRunner<S> {
    pub fn new(session: Session, sink: S, reconnect_delay: Duration) -> Self {
        Self {
            driver: RequestDriver::new(session),
            sink,
            reconnect_delay,
            reconnect: None,
        }
    }

    pub fn session(&self) -> &Session {
        self.driver.session()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Whether a reconnect attempt is scheduled.
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect.is_some()
    }

    /// Triggers the first connection attempt.
    pub fn start(&mut self) {
        let endpoint = self.driver.session().endpoint().to_string();
        self.sink.on_status(&format!("Connecting to {endpoint}"));
        self.driver.connect();
    }

    /// Points the runner at another server.
    ///
    /// A live connection is dropped and the new endpoint dialed at once;
    /// otherwise the next scheduled attempt uses it.
    pub fn set_endpoint(&mut self, host: impl Into<String>, port: u32) -> Result<(), ConfigError> {
        self.driver.set_endpoint(host, port)?;
        if self.driver.session().state() == ConnectionState::Connecting {
            let endpoint = self.driver.session().endpoint().to_string();
            self.sink.on_status(&format!("Connecting to {endpoint}"));
        }
        Ok(())
    }

    /// Runs forever: starts, then processes events and timer expiries.
    pub async fn run(&mut self) {
        self.start();
        loop {
            self.turn().await;
        }
    }

    /// Runs until `shutdown` completes, then closes the connection and
    /// cancels any pending reconnect.
    pub async fn run_until_shutdown<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            () = self.run() => {}
            () = shutdown => info!("shutdown requested"),
        }
        self.reconnect = None;
        self.driver.disconnect();
    }

    /// Handles exactly one driver event or one reconnect expiry.
    pub async fn turn(&mut self) {
        tokio::select! {
            () = reconnect_due(&mut self.reconnect) => {
                self.reconnect = None;
                debug!("reconnect timer fired");
                self.driver.connect();
            }
            event = self.driver.next_event() => self.handle(event),
        }
    }

    fn handle(&mut self, event: DriverEvent) {
        match event {
            DriverEvent::Connected => {
                self.sink.on_status("Connection status: connected");
            }
            DriverEvent::Records(records) => {
                info!(records = records.len(), "snapshot received");
                self.sink.on_records(&records);
            }
            DriverEvent::DecodeFailed(e) => {
                // Previous snapshot stays on screen.
                warn!(error = %e, "keeping previous snapshot");
            }
            DriverEvent::Fault(reason) => {
                warn!(reason = %reason, "connection fault");
                self.sink.on_fault(&reason);
            }
            DriverEvent::Disconnected
                if self.driver.session().state() != ConnectionState::Disconnected =>
            {
                // Already dialing a new endpoint.
                self.sink.on_status("Connection status: disconnected");
            }
            DriverEvent::Disconnected => {
                self.sink.on_status(&format!(
                    "Connection status: disconnected, retrying in {}ms",
                    self.reconnect_delay.as_millis()
                ));
                self.schedule_reconnect();
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect.is_some() {
            debug!("replacing pending reconnect");
        }
        self.reconnect = Some(Box::pin(tokio::time::sleep(self.reconnect_delay)));
    }
}

/// Completes when the timer fires; pends forever when none is scheduled.
async fn reconnect_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
