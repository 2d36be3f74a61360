//! Inventory server for hostview clients.
//!
//! Listens on TCP, answers every `GET_DATA` request with the JSON array of
//! served records and closes the connection.
//!
//! # Example
//!
//! ```rust,no_run
//! use hostview_server::{Inventory, ServerConfig, SocketServer, make_connection_handler, new_shared_inventory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = SocketServer::bind(ServerConfig::default()).await?;
//!     let inventory = new_shared_inventory(Inventory::default());
//!     server.run(make_connection_handler(inventory)).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod handler;
mod socket;

pub use config::{DEFAULT_BIND_ADDRESS, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::{
    Inventory, RequestHandler, SharedInventory, make_connection_handler, new_shared_inventory,
};
pub use socket::{Connection, SocketServer};
