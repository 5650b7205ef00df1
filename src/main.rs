//! qogita2oblio server entrypoint
//!
//! 環境変数（`PORT`、`UPLOAD_DIR`、`RUST_LOG`）で設定し、axumで配信する。

use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use qogita2oblio::storage::FileStore;
use qogita2oblio::web::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("qogita2oblio=info,tower_http=info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3001);
    let upload_dir =
        std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());

    let store = FileStore::new(&upload_dir)?;
    let state = Arc::new(AppState { store });
    let app = web::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, %upload_dir, "server running");
    tracing::info!("open http://localhost:{} in your browser", port);
    axum::serve(listener, app).await?;

    Ok(())
}
