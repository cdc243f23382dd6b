//! filedock server binary.
//!
//! ## Purpose
//! Runs the filedock REST API: base64 file upload, retrieval, download,
//! and deletion over HTTP, with Swagger UI at `/swagger-ui`.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filedock_store::{FileStore, DEFAULT_MAX_PAYLOAD_BYTES};

/// Main entry point for the filedock server
///
/// # Environment Variables
/// - `FILEDOCK_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `FILEDOCK_DATA_DIR`: Storage root directory (default: "static/uploads",
///   created if missing)
/// - `FILEDOCK_MAX_PAYLOAD_BYTES`: Decoded payload size ceiling
///   (default: 5 MiB)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the storage root cannot be created,
/// - `FILEDOCK_MAX_PAYLOAD_BYTES` is not a number,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("filedock=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("FILEDOCK_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("FILEDOCK_DATA_DIR").unwrap_or_else(|_| "static/uploads".into());
    let max_payload_bytes = match std::env::var("FILEDOCK_MAX_PAYLOAD_BYTES") {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("FILEDOCK_MAX_PAYLOAD_BYTES is not a number: {raw}"))?,
        Err(_) => DEFAULT_MAX_PAYLOAD_BYTES,
    };

    tracing::info!("-- Starting filedock on {}", addr);
    tracing::info!("-- Storage root: {}", data_dir);

    let store = FileStore::new(&data_dir)?.with_max_payload_bytes(max_payload_bytes);
    let app = filedock_api::router(Arc::new(store));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
