//! Inventory Alerts Server
//!
//! Run with: cargo run
//!
//! See the `config` module for the environment variables read at startup.
//! RUST_LOG sets the log filter (default: inventory_alerts=info,tower_http=info).

use std::sync::Arc;

use inventory_alerts::api::{run_server, AppState};
use inventory_alerts::config::{AppConfig, BackendConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory_alerts=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!("Inventory alerts configuration:");
    tracing::info!("  Host: {}:{}", config.server.host, config.server.port);
    tracing::info!("  Backend: {}", config.backend.name());
    match &config.backend {
        BackendConfig::Firestore(firestore) => {
            tracing::info!("  Project: {}", firestore.project_id);
            tracing::info!("  Collection: {}", firestore.collection);
            tracing::info!("  Endpoint: {}", firestore.endpoint);
            tracing::info!("  Request timeout: {} seconds", firestore.timeout.as_secs());
            if firestore.access_token.is_none() {
                tracing::info!("  Credentials: metadata server");
            }
        }
        BackendConfig::Memory => {
            tracing::warn!("  INVENTORY_BACKEND=memory selected, alerts are lost on restart");
        }
    }

    let db = config.backend.build()?;
    let state = Arc::new(AppState::new(db));

    run_server(config.server, state).await
}
