//! Routes for collecting and listing submissions.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::form_submission::SubmissionResponse;
use serde::Deserialize;
use serde_json::{Map, Value};
use services::services::submissions::SubmissionService;
use utils::response::{ApiResponse, Paginated};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListSubmissionsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// GET /api/forms/{id}/submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
    Query(query): Query<ListSubmissionsQuery>,
) -> Result<ResponseJson<ApiResponse<Paginated<SubmissionResponse>>>, ApiError> {
    let page = SubmissionService::list(&state.db().pool, form_id, query.page, query.per_page).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

/// POST /api/forms/{id}/submissions
///
/// The body is a bare JSON object mapping field id to submitted value.
pub async fn create_submission(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
    axum::Json(payload): axum::Json<Map<String, Value>>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<SubmissionResponse>>), ApiError> {
    let submission = SubmissionService::create(&state.db().pool, form_id, &payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(submission.into())),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/forms/{id}/submissions",
        get(list_submissions).post(create_submission),
    )
}
