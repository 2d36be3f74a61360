//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/hostview/config.toml` by default. Command-line flags override
//! file values, see [`ClientConfig::apply_cli`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use hostview_core::{DEFAULT_HOST, DEFAULT_PORT, Endpoint, SortKey};

use crate::batch::DEFAULT_BATCH_TIMEOUT;
use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};
use crate::interactive::DEFAULT_RECONNECT_DELAY;
use crate::session::DEFAULT_CONNECT_TIMEOUT;

/// How the client runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Keep the view up to date, reconnecting forever.
    #[default]
    Interactive,
    /// Fetch once, print, exit.
    Batch,
}

/// How records are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Configuration for the hostview client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub mode: RunMode,

    /// Server/connection settings.
    pub server: ServerSettings,

    pub interactive: InteractiveSettings,

    pub batch: BatchSettings,

    /// Presentation settings.
    pub output: OutputSettings,
}

/// Where the inventory server is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub address: String,

    /// Kept wide so out-of-range values reach endpoint validation.
    pub port: u32,

    /// Bound on a single connect attempt.
    pub connect_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_HOST.to_string(),
            port: u32::from(DEFAULT_PORT),
            connect_timeout_ms: millis(DEFAULT_CONNECT_TIMEOUT),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveSettings {
    /// Delay between a disconnect and the next attempt.
    pub reconnect_delay_ms: u64,
}

impl Default for InteractiveSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: millis(DEFAULT_RECONNECT_DELAY),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Bound on the whole fetch.
    pub timeout_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            timeout_ms: millis(DEFAULT_BATCH_TIMEOUT),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,

    /// Row order of the table; has no effect on JSON output.
    pub sort: SortKey,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if the file
    /// does not exist.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hostview")
    }

    /// Overrides file values with the flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(ref address) = cli.address {
            self.server.address = address.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
        if cli.console {
            self.mode = RunMode::Batch;
            self.output.format = OutputFormat::Table;
        }
        if cli.json {
            self.output.format = OutputFormat::Json;
        }
        if let Some(sort) = cli.sort {
            self.output.sort = sort;
        }
        if let Some(ms) = cli.timeout_ms {
            self.batch.timeout_ms = ms;
        }
        if let Some(ms) = cli.reconnect_delay_ms {
            self.interactive.reconnect_delay_ms = ms;
        }
    }

    /// Validates the server address and port.
    pub fn endpoint(&self) -> ClientResult<Endpoint> {
        Ok(Endpoint::new(&self.server.address, self.server.port)?)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.server.connect_timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.interactive.reconnect_delay_ms)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch.timeout_ms)
    }

    /// Checks every value that would otherwise only fail at run time.
    pub fn validate(&self) -> ClientResult<()> {
        self.endpoint()?;
        if self.server.connect_timeout_ms == 0 {
            return Err(ClientError::config("server.connect_timeout_ms must be positive"));
        }
        if self.batch.timeout_ms == 0 {
            return Err(ClientError::config("batch.timeout_ms must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use clap::Parser;
    use hostview_core::ConfigError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hostview").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.mode, RunMode::Interactive);
        assert_eq!(config.endpoint().unwrap().to_string(), "localhost:12345");
        assert_eq!(config.reconnect_delay(), Duration::from_millis(5000));
        assert_eq!(config.batch_timeout(), Duration::from_millis(30_000));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.output.format, OutputFormat::Table);
        assert_eq!(config.output.sort, SortKey::None);
    }

    #[test]
    fn parse_partial_file() {
        let config: ClientConfig = toml::from_str(
            r#"
mode = "batch"

[server]
address = "inventory.lan"

[output]
format = "json"
sort = "name"
"#,
        )
        .unwrap();

        assert_eq!(config.mode, RunMode::Batch);
        assert_eq!(config.server.address, "inventory.lan");
        assert_eq!(config.server.port, 12345);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.sort, SortKey::Name);
        assert_eq!(config.interactive.reconnect_delay_ms, 5000);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[batch]\ntimeout_ms = 1500").unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.batch_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        assert!(matches!(
            ClientConfig::load_from(file.path()),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ClientConfig::load_from(&dir.path().join("nope.toml")),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let config: ClientConfig = toml::from_str("[server]\nport = 70000").unwrap();
        assert!(matches!(
            config.endpoint(),
            Err(ClientError::Endpoint(ConfigError::InvalidPort(70000)))
        ));
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let mut config = ClientConfig::default();
        config.batch.timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        let mut config = ClientConfig::default();
        config.server.connect_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }

    #[test]
    fn flags_override_file() {
        let mut config = ClientConfig::default();
        config.apply_cli(&parse(&[
            "-a",
            "10.0.0.5",
            "-p",
            "4000",
            "--mode",
            "batch",
            "--timeout-ms",
            "250",
            "--json",
            "--sort",
            "ip",
        ]));

        assert_eq!(config.endpoint().unwrap().to_string(), "10.0.0.5:4000");
        assert_eq!(config.mode, RunMode::Batch);
        assert_eq!(config.batch.timeout_ms, 250);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.sort, SortKey::Ip);
    }

    #[test]
    fn console_flag_is_batch_table() {
        let mut config = ClientConfig::default();
        config.output.format = OutputFormat::Json;
        config.apply_cli(&parse(&["--console"]));

        assert_eq!(config.mode, RunMode::Batch);
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn dump_round_trips_through_toml() {
        let mut config = ClientConfig::default();
        config.server.port = 9000;
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.server.port, 9000);
    }
}
