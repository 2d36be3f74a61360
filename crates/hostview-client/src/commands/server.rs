//! Server command: serves an inventory in the foreground.

use std::path::Path;

use tracing::info;

use hostview_server::{
    Inventory, ServerConfig, SocketServer, make_connection_handler, new_shared_inventory,
};

use crate::error::ClientResult;

/// Serves `data` (or an empty inventory) on `bind:port` until Ctrl-C.
pub async fn run(bind: &str, port: u16, data: Option<&Path>) -> ClientResult<()> {
    let inventory = match data {
        Some(path) => Inventory::load(path)?,
        None => {
            info!("No --data file given, serving an empty inventory");
            Inventory::default()
        }
    };
    let inventory = new_shared_inventory(inventory);

    let server = SocketServer::bind(ServerConfig::new(bind, port)).await?;
    let handler = make_connection_handler(inventory.clone());

    server
        .run_until_shutdown(handler, super::shutdown_signal())
        .await?;

    info!(
        requests = inventory.read().await.requests_served(),
        "Server stopped"
    );
    Ok(())
}
