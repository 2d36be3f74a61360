//! Request dispatch and the served inventory.

use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use hostview_core::Record;
use hostview_protocol::{REQUEST_TOKEN, decode};

use crate::error::{ServerError, ServerResult};
use crate::socket::Connection;

/// Records served to every client, plus a request counter.
#[derive(Debug, Default)]
pub struct Inventory {
    records: Vec<Record>,
    requests_served: u64,
}

impl Inventory {
    /// Creates an inventory serving `records`.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            requests_served: 0,
        }
    }

    /// Loads an inventory from a JSON file in the wire format.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read(path)
            .map_err(|e| ServerError::inventory(path, format!("failed to read: {e}")))?;
        let records = decode(&content).map_err(|e| ServerError::inventory(path, e.to_string()))?;
        info!(path = %path.display(), records = records.len(), "Inventory loaded");
        Ok(Self::new(records))
    }

    /// Returns the served records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of answered requests.
    pub fn requests_served(&self) -> u64 {
        self.requests_served
    }
}

/// Inventory shared across all connections.
pub type SharedInventory = Arc<RwLock<Inventory>>;

/// Wraps an inventory for sharing.
pub fn new_shared_inventory(inventory: Inventory) -> SharedInventory {
    Arc::new(RwLock::new(inventory))
}

/// Answers requests from the shared inventory.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    inventory: SharedInventory,
}

impl RequestHandler {
    pub fn new(inventory: SharedInventory) -> Self {
        Self { inventory }
    }

    /// Returns the records to send for `request`, or `None` for an unknown
    /// request.
    pub async fn handle(&self, request: &[u8]) -> Option<Vec<Record>> {
        if request != REQUEST_TOKEN {
            return None;
        }
        let mut inventory = self.inventory.write().await;
        inventory.requests_served += 1;
        Some(inventory.records.clone())
    }

    /// Serves one connection: read the request, answer, close.
    pub async fn handle_connection(&self, mut conn: Connection) -> ServerResult<()> {
        let peer = conn.peer_addr();
        let Some(request) = conn.read_request().await? else {
            debug!(peer = %peer, "Client closed without a request");
            return Ok(());
        };

        match self.handle(&request).await {
            Some(records) => {
                conn.write_records(&records).await?;
                info!(peer = %peer, records = records.len(), "Served inventory");
            }
            None => {
                warn!(
                    peer = %peer,
                    request = %String::from_utf8_lossy(&request),
                    "Unknown request, closing connection"
                );
            }
        }
        Ok(())
    }
}

/// Creates a connection handler suitable for [`SocketServer::run`](crate::SocketServer::run).
pub fn make_connection_handler(
    inventory: SharedInventory,
) -> impl Fn(Connection) -> Pin<Box<dyn std::future::Future<Output = ()> + Send>>
+ Send
+ Sync
+ 'static {
    move |conn| {
        let handler = RequestHandler::new(inventory.clone());
        Box::pin(async move {
            if let Err(e) = handler.handle_connection(conn).await {
                warn!(error = %e, "Connection handler error");
            }
        })
    }
}
