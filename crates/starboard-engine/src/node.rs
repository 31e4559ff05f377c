//! Starboard Node - the main application entry point.
//!
//! Architecture:
//! - Single daemon process with shared RocksDB storage
//! - HTTP API for the notification source and board readers
//! - Unix admin socket for blacklist and destination management
//!   (starboard-admin CLI)

use crate::admin_socket::AdminSocket;
use crate::api;
use crate::config::NodeConfig;
use crate::engine::Engine;
use crate::error::Result;
use crate::host::LogNotices;
use crate::storage::Storage;
use std::sync::Arc;
use std::time::Duration;

/// Shared state for the node - single storage instance shared by all components.
pub struct NodeState {
    pub storage: Arc<Storage>,
    pub engine: Arc<Engine>,
    pub config: NodeConfig,
}

impl NodeState {
    /// Wire an engine whose store, board surface, destinations and blacklist
    /// all live in `storage`.
    pub fn new(storage: Arc<Storage>, config: NodeConfig) -> Self {
        let engine = Engine::new(
            config.engine.clone(),
            storage.clone(),
            storage.clone(),
            storage.clone(),
        )
        .with_blacklist(storage.clone())
        .with_notices(Arc::new(LogNotices));

        Self {
            storage,
            engine: Arc::new(engine),
            config,
        }
    }
}

/// A starboard node instance.
pub struct StarboardNode {
    state: Arc<NodeState>,
}

impl StarboardNode {
    /// Create a new node.
    pub async fn new(config: NodeConfig) -> Result<Self> {
        // Ensure data directory exists
        std::fs::create_dir_all(&config.data_dir)?;

        let storage = Arc::new(Storage::open(&config.data_dir)?);
        let state = Arc::new(NodeState::new(storage, config));

        Ok(Self { state })
    }

    /// Get the shared state (for API handlers).
    pub fn state(&self) -> Arc<NodeState> {
        Arc::clone(&self.state)
    }

    /// Run the node (starts HTTP server, admin socket and notice sweeper).
    pub async fn run(self) -> Result<()> {
        let config = &self.state.config;
        tracing::info!("Starboard node starting");
        tracing::info!("  API: http://{}", config.api_addr);
        tracing::info!("  Admin: {:?}", config.admin_socket);
        tracing::info!("  Data: {:?}", config.data_dir);
        tracing::info!("  Endorsement: {}", config.engine.reaction);

        let admin_socket = AdminSocket::new(Arc::clone(&self.state.storage), &config.admin_socket);
        tokio::spawn(async move {
            if let Err(e) = admin_socket.run().await {
                tracing::error!("Admin socket error: {}", e);
            }
        });

        let engine = Arc::clone(&self.state.engine);
        let sweep_every = config.engine.notice_window.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_every);
            loop {
                ticker.tick().await;
                let pruned = engine.sweep_notices();
                if pruned > 0 {
                    tracing::debug!("Pruned {} expired notice keys", pruned);
                }
            }
        });

        let app = api::build_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", config.api_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
