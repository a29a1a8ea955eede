//! PHT HTTP Server Binary
//!
//! Main entry point for the proposal handling REST API. Loads configuration,
//! builds the repository and external clients, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! # Run with the local (in-memory) repository (default)
//! cargo run --bin pht-server
//!
//! # Run against the ODA
//! ODA_URL=http://oda/ska-db-oda/oda/api/v7 \
//!   cargo run --bin pht-server --features oda-repo
//! ```
//!
//! # Environment Variables
//!
//! - `PHT_CONFIG`: Path to a `pht.toml` (default: search `pht.toml`, `backend/pht.toml`, `../pht.toml`)
//! - `HOST`, `PORT`: Bind address (default: 0.0.0.0:8080)
//! - `REPOSITORY_TYPE`, `ODA_URL`: Proposal archive selection
//! - `OSD_API_URL`: OSD endpoint
//! - `AWS_PHT_BUCKET_NAME`, `AWS_REGION_NAME`, `AWS_SERVER_PUBLIC_KEY`,
//!   `AWS_SERVER_SECRET_KEY`: Attachment bucket
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use pht_services::config::{AppConfig, API_PREFIX};
use pht_services::http::router::create_router_with_body_limit;
use pht_services::http::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting PHT HTTP Server");

    let config_path = env::var("PHT_CONFIG").ok().map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    info!("Repository type: {:?}", config.repository_type()?);
    if config.s3.is_none() {
        warn!("No attachment bucket configured; signed URL endpoints will fail");
    }

    let state = AppState::from_config(&config).await?;
    let app = create_router_with_body_limit(state, config.server.body_limit_bytes);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on http://{}{}", addr, API_PREFIX);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
