//! WebSocket PvP Server
//!
//! Async WebSocket front end for match coordination. Accepts
//! connections, parses client events, and routes them to the match
//! registry; broadcasts flow back through per-connection queues.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::network::coordinator::MatchRegistry;
use crate::network::protocol::{
    ClientMessage, MatchId, PlayerId, ServerMessage, WireError,
};
use crate::ErrorKind;

/// Identifier for one WebSocket connection, distinct from the player
/// id the client chooses for itself.
pub type ConnectionId = Uuid;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".parse().unwrap(),
            max_connections: 1000,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// PvP server errors.
#[derive(Debug, thiserror::Error)]
pub enum PvpServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Connected client state.
struct ConnectedClient {
    /// Peer address, for logs.
    addr: SocketAddr,
    /// Player id from the most recent join.
    player_id: Option<PlayerId>,
    /// Match from the most recent join; disconnect bookkeeping is
    /// routed there.
    match_id: Option<MatchId>,
    /// Connection time.
    connected_at: Instant,
}

/// The PvP server.
pub struct PvpServer {
    /// Server configuration.
    config: ServerConfig,
    /// Match registry.
    registry: Arc<MatchRegistry>,
    /// Connected clients.
    clients: Arc<RwLock<BTreeMap<ConnectionId, ConnectedClient>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl PvpServer {
    /// Create a new server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            registry: Arc::new(MatchRegistry::default()),
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Run the accept loop until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), PvpServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("PvP server listening on {}", self.config.bind_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let client_count = self.clients.read().await.len();
                            if client_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let registry = self.registry.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let conn_id = Uuid::new_v4();
            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            // Register client
            {
                let mut clients = clients.write().await;
                clients.insert(conn_id, ConnectedClient {
                    addr,
                    player_id: None,
                    match_id: None,
                    connected_at: Instant::now(),
                });
            }

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        let _ = msg_tx.send(ServerMessage::Error(WireError {
                                            code: ErrorKind::InvalidArgument,
                                            message: "Invalid message format".to_string(),
                                        })).await;
                                        continue;
                                    }
                                };

                                Self::handle_client_message(
                                    conn_id,
                                    client_msg,
                                    &clients,
                                    &registry,
                                    &msg_tx,
                                ).await;
                            }
                            Some(Ok(Message::Ping(_))) => {
                                // tungstenite queues the pong reply itself;
                                // it goes out with the next write.
                                debug!("Ping from {}", addr);
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup
            sender_task.abort();

            let removed = {
                let mut clients = clients.write().await;
                clients.remove(&conn_id)
            };

            if let Some(client) = removed {
                if let (Some(match_id), Some(player_id)) = (client.match_id, client.player_id) {
                    registry.disconnect(&match_id, player_id).await;
                }
                info!(
                    "Client {} cleaned up after {:?}",
                    client.addr,
                    client.connected_at.elapsed()
                );
            }
        });
    }

    /// Route a parsed client event.
    async fn handle_client_message(
        conn_id: ConnectionId,
        msg: ClientMessage,
        clients: &Arc<RwLock<BTreeMap<ConnectionId, ConnectedClient>>>,
        registry: &Arc<MatchRegistry>,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        match msg {
            ClientMessage::JoinMatch(join) => {
                // Record identity first so a disconnect right after the
                // join is still routed to the match.
                {
                    let mut clients = clients.write().await;
                    if let Some(client) = clients.get_mut(&conn_id) {
                        client.player_id = Some(join.user_id.clone());
                        client.match_id = Some(join.match_id.clone());
                    }
                }
                registry.join(join.match_id, join.user_id, sender.clone()).await;
            }
            ClientMessage::StartMatch(start) => {
                if let Err(err) = registry.start(&start.match_id).await {
                    debug!("Start rejected for {}: {}", start.match_id, err);
                    let _ = sender.send(ServerMessage::Error(WireError {
                        code: err.kind(),
                        message: err.to_string(),
                    })).await;
                }
            }
            ClientMessage::CreatedBlock(report) => {
                registry
                    .report_block(&report.match_id, report.user_id, report.block)
                    .await;
            }
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Get live match count.
    pub async fn match_count(&self) -> usize {
        self.registry.match_count().await
    }
}
