use axum::extract::Path;
use axum::Json;
use tracing::info;

use augur_core::types::ToolDefinition;

use crate::error::ApiError;
use crate::middleware::Authenticated;

// GET /
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to the Augur Chinese Classics API",
    }))
}

// GET /health (public)
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "augur",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// GET /api/v1/tools
pub async fn list_tools(Authenticated(_auth): Authenticated) -> Json<Vec<ToolDefinition>> {
    Json(augur_tools::definitions())
}

// POST /api/v1/tools/{name}
pub async fn run_tool(
    Authenticated(auth_result): Authenticated,
    Path(name): Path<String>,
    Json(input): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    info!(tool = %name, caller = %auth_result.name, "Tool invoked over HTTP");
    let output = augur_tools::run_tool(&name, input)?;
    Ok(Json(output))
}
