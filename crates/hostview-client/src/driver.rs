//! One request per connection, on top of a [`Session`].
//!
//! As soon as the session connects the driver sends the request token, then
//! accumulates response bytes until they form a complete JSON document. A
//! complete response ends the exchange: the driver closes the connection and
//! reports the decoded records.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use hostview_core::{ConfigError, Record};
use hostview_protocol::{DecodeError, Progress, REQUEST_TOKEN, ResponseBuffer};

use crate::session::{ConnectionState, Session, SessionEvent};

/// What a caller of [`RequestDriver::next_event`] observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// Connection opened and the request was sent.
    Connected,
    /// A complete response decoded into a snapshot.
    Records(Vec<Record>),
    /// A complete (or final) response failed to decode; it was discarded.
    DecodeFailed(DecodeError),
    /// Transport failure reported by the session.
    Fault(String),
    Disconnected,
}

/// Sends `GET_DATA` on connect and turns the reply into [`DriverEvent`]s.
pub struct RequestDriver {
    session: Session,
    buffer: ResponseBuffer,
    /// Request sent, response not complete yet.
    awaiting_response: bool,
    pending: VecDeque<DriverEvent>,
}

impl RequestDriver {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            buffer: ResponseBuffer::new(),
            awaiting_response: false,
            pending: VecDeque::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// See [`Session::set_endpoint`]. A redial abandons the current exchange
    /// without decoding what it received.
    pub fn set_endpoint(&mut self, host: impl Into<String>, port: u32) -> Result<(), ConfigError> {
        let was_connected = self.session.state() == ConnectionState::Connected;
        self.session.set_endpoint(host, port)?;
        if was_connected && self.session.state() == ConnectionState::Connecting {
            self.reset();
        }
        Ok(())
    }

    /// Starts a connection attempt unless one is already in flight.
    pub fn connect(&mut self) {
        if self.session.state() == ConnectionState::Disconnected {
            self.reset();
        }
        self.session.connect();
    }

    pub fn disconnect(&mut self) {
        self.session.disconnect();
    }

    /// Waits for the next driver event. Cancel safe.
    pub async fn next_event(&mut self) -> DriverEvent {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return event;
            }

            match self.session.next_event().await {
                SessionEvent::Connected => {
                    self.on_connected();
                    return DriverEvent::Connected;
                }
                SessionEvent::DataReceived(bytes) => {
                    if let Some(event) = self.on_data(&bytes) {
                        return event;
                    }
                }
                SessionEvent::Fault(reason) => return DriverEvent::Fault(reason),
                SessionEvent::Disconnected => self.on_disconnected(),
            }
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.awaiting_response = false;
    }

    fn on_connected(&mut self) {
        self.reset();
        self.awaiting_response = self.session.send(REQUEST_TOKEN);
        if self.awaiting_response {
            debug!(endpoint = %self.session.endpoint(), "request sent");
        } else {
            warn!(endpoint = %self.session.endpoint(), "request could not be queued");
        }
    }

    fn on_data(&mut self, bytes: &[u8]) -> Option<DriverEvent> {
        if bytes.is_empty() {
            debug!("empty payload");
            return None;
        }
        if !self.awaiting_response {
            trace!(bytes = bytes.len(), "ignoring data outside an exchange");
            return None;
        }

        match self.buffer.push(bytes) {
            Progress::Incomplete => {
                trace!(buffered = self.buffer.len(), "response incomplete");
                None
            }
            Progress::Complete(result) => {
                self.awaiting_response = false;
                self.session.disconnect();
                Some(Self::decoded(result))
            }
        }
    }

    fn on_disconnected(&mut self) {
        if self.awaiting_response {
            match self.buffer.finish() {
                Some(result) => self.pending.push_back(Self::decoded(result)),
                None => debug!("empty payload"),
            }
        }
        self.reset();
        self.pending.push_back(DriverEvent::Disconnected);
    }

    fn decoded(result: Result<Vec<Record>, DecodeError>) -> DriverEvent {
        match result {
            Ok(records) => {
                debug!(records = records.len(), "response decoded");
                DriverEvent::Records(records)
            }
            Err(e) => {
                warn!(error = %e, "response discarded");
                DriverEvent::DecodeFailed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;

    use hostview_core::Endpoint;

    async fn listener() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    fn driver_for(addr: SocketAddr) -> RequestDriver {
        let endpoint = Endpoint::new("127.0.0.1", u32::from(addr.port())).unwrap();
        RequestDriver::new(Session::new(endpoint))
    }

    async fn next(driver: &mut RequestDriver) -> DriverEvent {
        timeout(Duration::from_secs(5), driver.next_event())
            .await
            .expect("no driver event within 5s")
    }

    async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
        let mut request = vec![0u8; REQUEST_TOKEN.len()];
        stream.read_exact(&mut request).await.unwrap();
        request
    }

    #[tokio::test]
    async fn sends_request_and_decodes_reply() {
        let (listener, addr) = listener().await;
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            assert_eq!(read_request(&mut stream).await, REQUEST_TOKEN);
            stream
                .write_all(br#"[{"ip":"10.0.0.1","name":"gw","description":"router"}]"#)
                .await
                .unwrap();
            // Keep the socket open: the client closes after decoding.
            let mut rest = Vec::new();
            stream.read_to_end(&mut rest).await.unwrap();
            rest
        });

        let mut driver = driver_for(addr);
        driver.connect();

        assert_eq!(next(&mut driver).await, DriverEvent::Connected);
        assert_eq!(
            next(&mut driver).await,
            DriverEvent::Records(vec![Record::new("10.0.0.1", "gw", "router")])
        );
        assert_eq!(next(&mut driver).await, DriverEvent::Disconnected);
        assert!(server.await.unwrap().is_empty(), "client sent extra bytes");
    }

    #[tokio::test]
    async fn reply_split_across_writes() {
        let (listener, addr) = listener().await;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
            stream.write_all(br#"[{"ip":"10.0.0.1","#).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            stream.write_all(br#""name":"gw"}]"#).await.unwrap();
        });

        let mut driver = driver_for(addr);
        driver.connect();

        assert_eq!(next(&mut driver).await, DriverEvent::Connected);
        assert_eq!(
            next(&mut driver).await,
            DriverEvent::Records(vec![Record::new("10.0.0.1", "gw", "")])
        );
    }

    #[tokio::test]
    async fn non_array_reply_is_discarded() {
        let (listener, addr) = listener().await;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
            stream.write_all(br#"{"ip":"10.0.0.1"}"#).await.unwrap();
        });

        let mut driver = driver_for(addr);
        driver.connect();

        assert_eq!(next(&mut driver).await, DriverEvent::Connected);
        assert_eq!(
            next(&mut driver).await,
            DriverEvent::DecodeFailed(DecodeError::NotAnArray { found: "object" })
        );
        assert_eq!(next(&mut driver).await, DriverEvent::Disconnected);
    }

    #[tokio::test]
    async fn truncated_reply_fails_on_close() {
        let (listener, addr) = listener().await;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
            stream.write_all(br#"[{"ip":"#).await.unwrap();
        });

        let mut driver = driver_for(addr);
        driver.connect();

        assert_eq!(next(&mut driver).await, DriverEvent::Connected);
        assert!(matches!(
            next(&mut driver).await,
            DriverEvent::DecodeFailed(DecodeError::MalformedJson(_))
        ));
        assert_eq!(next(&mut driver).await, DriverEvent::Disconnected);
    }

    #[tokio::test]
    async fn close_without_reply_is_not_an_error() {
        let (listener, addr) = listener().await;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
        });

        let mut driver = driver_for(addr);
        driver.connect();

        assert_eq!(next(&mut driver).await, DriverEvent::Connected);
        assert_eq!(next(&mut driver).await, DriverEvent::Disconnected);
    }

    #[tokio::test]
    async fn single_request_in_flight() {
        let (listener, addr) = listener().await;
        let mut driver = driver_for(addr);

        driver.connect();
        driver.connect();
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(next(&mut driver).await, DriverEvent::Connected);
        driver.connect();

        assert_eq!(read_request(&mut stream).await, REQUEST_TOKEN);
        let mut extra = [0u8; 1];
        assert!(
            timeout(Duration::from_millis(200), stream.read(&mut extra))
                .await
                .is_err(),
            "a second request was written"
        );
        assert!(
            timeout(Duration::from_millis(50), listener.accept())
                .await
                .is_err(),
            "a second connection was opened"
        );
    }

    #[tokio::test]
    async fn refused_connection_reports_fault() {
        let (listener, addr) = listener().await;
        drop(listener);

        let mut driver = driver_for(addr);
        driver.connect();

        assert!(matches!(next(&mut driver).await, DriverEvent::Fault(_)));
        assert_eq!(next(&mut driver).await, DriverEvent::Disconnected);
    }

    #[tokio::test]
    async fn endpoint_switch_drops_partial_reply() {
        let (first, first_addr) = listener().await;
        let (second, second_addr) = listener().await;
        let _held = tokio::spawn(async move {
            let (mut stream, _) = first.accept().await.unwrap();
            read_request(&mut stream).await;
            stream.write_all(br#"[{"ip":"#).await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });
        tokio::spawn(async move {
            let (mut stream, _) = second.accept().await.unwrap();
            read_request(&mut stream).await;
            stream.write_all(b"[]").await.unwrap();
        });

        let mut driver = driver_for(first_addr);
        driver.connect();
        assert_eq!(next(&mut driver).await, DriverEvent::Connected);
        // Let the partial reply reach the buffer.
        assert!(
            timeout(Duration::from_millis(200), driver.next_event())
                .await
                .is_err()
        );

        driver
            .set_endpoint("127.0.0.1", u32::from(second_addr.port()))
            .unwrap();
        assert_eq!(next(&mut driver).await, DriverEvent::Disconnected);
        assert_eq!(next(&mut driver).await, DriverEvent::Connected);
        assert_eq!(next(&mut driver).await, DriverEvent::Records(vec![]));
        assert_eq!(next(&mut driver).await, DriverEvent::Disconnected);
    }
}
