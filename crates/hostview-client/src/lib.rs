//! Session lifecycle, request driver, interactive and batch runners, CLI
//!
//! This crate provides the `hostview` command-line interface.

pub mod batch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod interactive;
pub mod session;
pub mod sink;

pub use batch::{BatchRunner, Outcome};
pub use cli::Cli;
pub use driver::{DriverEvent, RequestDriver};
pub use error::{ClientError, ClientResult};
pub use interactive::InteractiveRunner;
pub use session::{ConnectionState, Session, SessionEvent};
pub use sink::{JsonSink, OutputSink, TableSink};
