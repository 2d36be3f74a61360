//! Core types: records, endpoints, table formatting, tracing

pub mod endpoint;
pub mod format;
pub mod record;
pub mod tracing;

pub use endpoint::{ConfigError, DEFAULT_HOST, DEFAULT_PORT, Endpoint};
pub use format::{SortKey, format_table};
pub use record::Record;
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
