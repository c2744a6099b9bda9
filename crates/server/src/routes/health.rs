//! Liveness endpoint with a database ping.

use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct HealthStatus {
    pub status: String,
}

/// GET /api/health
pub async fn health(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<HealthStatus>>, ApiError> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db().pool)
        .await?;

    Ok(ResponseJson(ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
