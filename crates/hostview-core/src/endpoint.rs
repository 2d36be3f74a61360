//! Server endpoint and its validation rules.

use std::fmt;

use thiserror::Error;

/// Default server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port.
pub const DEFAULT_PORT: u16 = 12345;

/// Errors raised when an endpoint value is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Port outside `1..=65535`.
    #[error("invalid port {0}: must be between 1 and 65535")]
    InvalidPort(u32),

    /// Empty or whitespace-only host.
    #[error("server address must not be empty")]
    EmptyHost,
}

/// Host and port of the inventory server.
///
/// An `Endpoint` can only be built through [`Endpoint::new`], so a value of
/// this type always carries a usable port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Validates and builds an endpoint.
    ///
    /// The port is taken as `u32` so that out-of-range values supplied by a
    /// caller reach this check instead of being truncated.
    pub fn new(host: impl Into<String>, port: u32) -> Result<Self, ConfigError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        let port = match u16::try_from(port) {
            Ok(p) if p > 0 => p,
            _ => return Err(ConfigError::InvalidPort(port)),
        };
        Ok(Self { host, port })
    }

    /// Returns the host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint() {
        let endpoint = Endpoint::default();
        assert_eq!(endpoint.host(), "localhost");
        assert_eq!(endpoint.port(), 12345);
        assert_eq!(endpoint.to_string(), "localhost:12345");
    }

    #[test]
    fn accepts_port_bounds() {
        assert_eq!(Endpoint::new("h", 1).unwrap().port(), 1);
        assert_eq!(Endpoint::new("h", 65535).unwrap().port(), 65535);
    }

    #[test]
    fn rejects_out_of_range_ports() {
        assert_eq!(Endpoint::new("h", 0), Err(ConfigError::InvalidPort(0)));
        assert_eq!(
            Endpoint::new("h", 65536),
            Err(ConfigError::InvalidPort(65536))
        );
    }

    #[test]
    fn rejects_empty_host() {
        assert_eq!(Endpoint::new("  ", 80), Err(ConfigError::EmptyHost));
    }
}
