//! Routes for managing a draft form's fields.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::form_field::{CreateFormField, FieldResponse, UpdateFormField};
use services::services::fields::FieldService;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// GET /api/forms/{id}/fields
pub async fn list_fields(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<FieldResponse>>>, ApiError> {
    let fields = FieldService::list(&state.db().pool, form_id).await?;
    Ok(ResponseJson(ApiResponse::success(fields)))
}

/// POST /api/forms/{id}/fields
pub async fn add_field(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
    axum::Json(payload): axum::Json<CreateFormField>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<FieldResponse>>), ApiError> {
    let field = FieldService::add(&state.db().pool, form_id, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(field))))
}

/// PUT /api/forms/{id}/fields/{field_id}
pub async fn update_field(
    State(state): State<AppState>,
    Path((form_id, field_id)): Path<(Uuid, Uuid)>,
    axum::Json(payload): axum::Json<UpdateFormField>,
) -> Result<ResponseJson<ApiResponse<FieldResponse>>, ApiError> {
    let field = FieldService::update(&state.db().pool, form_id, field_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(field)))
}

/// DELETE /api/forms/{id}/fields/{field_id}
pub async fn delete_field(
    State(state): State<AppState>,
    Path((form_id, field_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    FieldService::delete(&state.db().pool, form_id, field_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forms/{id}/fields", get(list_fields).post(add_field))
        .route(
            "/forms/{id}/fields/{field_id}",
            axum::routing::put(update_field).delete(delete_field),
        )
}
