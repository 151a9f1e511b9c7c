use augur_agent::Pipeline;
use augur_core::config::GatewayConfig;

/// Shared application state for axum handlers.
pub struct AppState {
    pub config: GatewayConfig,
    pub pipeline: Pipeline,
}
