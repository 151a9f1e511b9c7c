use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use augur_agent::Pipeline;
use augur_core::config::GatewayConfig;

use crate::chat;
use crate::routes;
use crate::state::AppState;

/// Build the HTTP router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/chat", post(chat::chat))
        .route("/chat/", post(chat::chat))
        .route("/chat/stream", post(chat::chat_stream))
        .route("/tools", get(routes::list_tools))
        .route("/tools/{name}", post(routes::run_tool));

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .nest("/api/v1", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP + SSE gateway server built on axum.
pub struct GatewayServer {
    config: GatewayConfig,
    pipeline: Pipeline,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, pipeline: Pipeline) -> Self {
        Self { config, pipeline }
    }

    /// Run the gateway server until the cancellation token is triggered.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let state = Arc::new(AppState {
            config: self.config.clone(),
            pipeline: self.pipeline.clone(),
        });
        let app = router(state);

        let listener = TcpListener::bind(&self.config.bind).await?;
        info!(bind = %self.config.bind, "Gateway listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Gateway shut down");
        Ok(())
    }
}
