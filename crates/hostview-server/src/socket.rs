//! TCP listener for inventory requests.
//!
//! Each accepted connection carries exactly one exchange: the client writes
//! the request token, the server writes a JSON array and closes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info};

use hostview_core::Record;
use hostview_protocol::{REQUEST_TOKEN, encode};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// TCP server handing connections to a handler.
pub struct SocketServer {
    /// Server configuration.
    config: ServerConfig,
    listener: TcpListener,
    /// Limits concurrent connections.
    connection_semaphore: Arc<Semaphore>,
}

impl SocketServer {
    /// Binds the listener described by `config`.
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        if config.max_connections == 0 {
            return Err(ServerError::config("max_connections must be at least 1"));
        }

        let address = config.listen_address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                ServerError::address_in_use(&address)
            } else {
                ServerError::Io(e)
            }
        })?;

        info!(addr = %listener.local_addr()?, "Inventory server listening");

        let connection_semaphore = Arc::new(Semaphore::new(config.max_connections));
        Ok(Self {
            config,
            listener,
            connection_semaphore,
        })
    }

    /// Returns the bound address (useful with port `0`).
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Stops accepting: pending and later `accept` calls fail with
    /// [`ServerError::Closed`]. Open connections are not affected.
    pub fn close(&self) {
        self.connection_semaphore.close();
    }

    /// Accepts a single connection.
    pub async fn accept(&self) -> ServerResult<Connection> {
        let permit = self
            .connection_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ServerError::Closed)?;

        let (stream, peer) = self.listener.accept().await?;
        debug!(peer = %peer, "Accepted new connection");

        Ok(Connection {
            stream,
            peer,
            timeout: self.config.connection_timeout,
            _permit: permit,
        })
    }

    /// Runs the accept loop, spawning the handler for each connection.
    pub async fn run<F, Fut>(&self, handler: F) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        loop {
            match self.accept().await {
                Ok(connection) => {
                    tokio::spawn(handler(connection));
                }
                Err(ServerError::Closed) => {
                    info!("Accept loop stopped");
                    return Ok(());
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    /// Runs the accept loop until `shutdown` completes.
    pub async fn run_until_shutdown<F, Fut, S>(&self, handler: F, shutdown: S) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
        S: std::future::Future<Output = ()> + Send,
    {
        tokio::select! {
            result = self.run(handler) => result,
            _ = shutdown => {
                info!("Shutdown signal received");
                self.close();
                Ok(())
            }
        }
    }
}

/// One accepted client connection.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    timeout: Duration,
    _permit: OwnedSemaphorePermit,
}

impl Connection {
    /// Address of the connected client.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Reads the client's request.
    ///
    /// Reads at most as many bytes as the request token has. Returns
    /// `Ok(None)` when the client closed before sending anything; a shorter
    /// read means the client closed mid-request.
    pub async fn read_request(&mut self) -> ServerResult<Option<Vec<u8>>> {
        let mut request = vec![0u8; REQUEST_TOKEN.len()];
        let mut filled = 0;

        while filled < request.len() {
            let read = tokio::time::timeout(self.timeout, self.stream.read(&mut request[filled..]))
                .await
                .map_err(|_| ServerError::timeout("read request"))??;
            if read == 0 {
                break;
            }
            filled += read;
        }

        if filled == 0 {
            return Ok(None);
        }
        request.truncate(filled);
        Ok(Some(request))
    }

    /// Writes `records` as the response payload and closes the write side.
    pub async fn write_records(&mut self, records: &[Record]) -> ServerResult<()> {
        let payload = encode(records)?;

        tokio::time::timeout(self.timeout, async {
            self.stream.write_all(&payload).await?;
            self.stream.shutdown().await?;
            Ok::<(), std::io::Error>(())
        })
        .await
        .map_err(|_| ServerError::timeout("write response"))??;

        debug!(
            peer = %self.peer,
            bytes = payload.len(),
            records = records.len(),
            "Response written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let server = SocketServer::bind(ServerConfig::loopback()).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn rejects_port_in_use() {
        let first = SocketServer::bind(ServerConfig::loopback()).await.unwrap();
        let port = first.local_addr().unwrap().port();

        let result = SocketServer::bind(ServerConfig::new("127.0.0.1", port)).await;
        assert!(matches!(result, Err(ServerError::AddressInUse { .. })));
    }

    #[tokio::test]
    async fn rejects_zero_connections() {
        let config = ServerConfig::loopback().with_max_connections(0);
        assert!(matches!(
            SocketServer::bind(config).await,
            Err(ServerError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn closed_server_stops_accepting() {
        let server = SocketServer::bind(ServerConfig::loopback()).await.unwrap();
        server.close();

        assert!(matches!(server.accept().await, Err(ServerError::Closed)));
        let result = tokio::time::timeout(
            Duration::from_secs(1),
            server.run(|_connection| async {}),
        )
        .await
        .expect("accept loop should end once closed");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn connection_roundtrip() {
        let server = SocketServer::bind(ServerConfig::loopback()).await.unwrap();
        let addr = server.local_addr().unwrap();

        let client_task = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(REQUEST_TOKEN).await.unwrap();

            let mut response = Vec::new();
            stream.read_to_end(&mut response).await.unwrap();
            response
        });

        let mut conn = server.accept().await.unwrap();
        let request = conn.read_request().await.unwrap();
        assert_eq!(request.as_deref(), Some(REQUEST_TOKEN));

        conn.write_records(&[Record::new("10.0.0.1", "n", "d")])
            .await
            .unwrap();

        let response = client_task.await.unwrap();
        assert_eq!(
            response,
            br#"[{"ip":"10.0.0.1","name":"n","description":"d"}]"#
        );
    }

    #[tokio::test]
    async fn request_split_across_writes() {
        let server = SocketServer::bind(ServerConfig::loopback()).await.unwrap();
        let addr = server.local_addr().unwrap();

        let client_task = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"GET_").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            stream.write_all(b"DATA").await.unwrap();
            stream
        });

        let mut conn = server.accept().await.unwrap();
        let request = conn.read_request().await.unwrap();
        assert_eq!(request.as_deref(), Some(REQUEST_TOKEN));
        drop(client_task.await.unwrap());
    }

    #[tokio::test]
    async fn client_disconnect_before_request() {
        let server = SocketServer::bind(ServerConfig::loopback()).await.unwrap();
        let addr = server.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let _stream = TcpStream::connect(addr).await.unwrap();
        });

        let mut conn = server.accept().await.unwrap();
        handle.await.unwrap();

        assert!(conn.read_request().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn silent_client_times_out() {
        let config = ServerConfig::loopback().with_connection_timeout(Duration::from_millis(50));
        let server = SocketServer::bind(config).await.unwrap();
        let addr = server.local_addr().unwrap();

        let _client = TcpStream::connect(addr).await.unwrap();
        let mut conn = server.accept().await.unwrap();

        assert!(matches!(
            conn.read_request().await,
            Err(ServerError::Timeout { .. })
        ));
    }
}
