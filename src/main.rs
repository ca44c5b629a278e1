//! Merge Battle Server
//!
//! Real-time PvP coordinator for the tile-merge game. Clients connect
//! over WebSocket, join matches by id, and race to the rolled target
//! block; board simulation itself runs client-side through `game/`.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use merge_battle::network::{PvpServer, ServerConfig};
use merge_battle::{MAX_TARGET_LEVEL, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Merge Battle Server v{}", VERSION);
    info!("PvP target levels: 1-{}", MAX_TARGET_LEVEL);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);

    let config = ServerConfig {
        bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        ..Default::default()
    };

    let server = Arc::new(PvpServer::new(config));

    let shutdown_handle = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            shutdown_handle.shutdown();
        }
    });

    server.run().await?;
    Ok(())
}
