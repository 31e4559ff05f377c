//! Starboard Node binary
//!
//! Hosts the endorsement engine behind an HTTP ingress, with RocksDB
//! persistence and a local admin socket.

use starboard_engine::{NodeConfig, StarboardNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "starboard_node=info,starboard_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Starboard Node");

    let config = NodeConfig::from_env();

    let node = StarboardNode::new(config).await?;
    node.run().await?;

    Ok(())
}
