//! Server configuration.

use std::time::Duration;

use hostview_core::DEFAULT_PORT;

/// Address the server listens on unless told otherwise.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface address to bind.
    pub bind_address: String,

    /// TCP port; `0` picks an ephemeral port.
    pub port: u16,

    /// Per-connection read/write timeout.
    pub connection_timeout: Duration,

    /// Maximum concurrent connections.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            connection_timeout: Duration::from_secs(10),
            max_connections: 100,
        }
    }
}

impl ServerConfig {
    /// Creates a configuration listening on `bind_address:port`.
    pub fn new(bind_address: impl Into<String>, port: u16) -> Self {
        Self {
            bind_address: bind_address.into(),
            port,
            ..Default::default()
        }
    }

    /// Loopback configuration on an ephemeral port.
    pub fn loopback() -> Self {
        Self::new("127.0.0.1", 0)
    }

    /// Builder: set connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Builder: set max connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Returns the `address:port` string handed to the listener.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_address(), "0.0.0.0:12345");
        assert_eq!(config.connection_timeout, Duration::from_secs(10));
        assert_eq!(config.max_connections, 100);
    }

    #[test]
    fn custom_config() {
        let config = ServerConfig::loopback()
            .with_connection_timeout(Duration::from_secs(1))
            .with_max_connections(4);

        assert_eq!(config.listen_address(), "127.0.0.1:0");
        assert_eq!(config.connection_timeout, Duration::from_secs(1));
        assert_eq!(config.max_connections, 4);
    }
}
