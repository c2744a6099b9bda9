//! Routes for form CRUD, publication, copying, and the public share lookup.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::form::{CreateForm, FormStatus, FormSummary, FormWithFields, UpdateForm};
use serde::Deserialize;
use services::services::{forms::FormService, publication::PublicationService};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListFormsQuery {
    pub status: Option<FormStatus>,
}

/// GET /api/forms
pub async fn list_forms(
    State(state): State<AppState>,
    Query(query): Query<ListFormsQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<FormSummary>>>, ApiError> {
    let forms = FormService::list(&state.db().pool, query.status).await?;
    Ok(ResponseJson(ApiResponse::success(forms)))
}

/// POST /api/forms
pub async fn create_form(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<CreateForm>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<FormWithFields>>), ApiError> {
    let form = FormService::create(&state.db().pool, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(form))))
}

/// GET /api/forms/{id}
pub async fn get_form(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<FormWithFields>>, ApiError> {
    let form = FormService::get_with_fields(&state.db().pool, form_id).await?;
    Ok(ResponseJson(ApiResponse::success(form)))
}

/// PUT /api/forms/{id}
pub async fn update_form(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateForm>,
) -> Result<ResponseJson<ApiResponse<FormWithFields>>, ApiError> {
    let form = FormService::update(&state.db().pool, form_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(form)))
}

/// DELETE /api/forms/{id}
pub async fn delete_form(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    FormService::delete(&state.db().pool, form_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// POST /api/forms/{id}/publish
pub async fn publish_form(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<FormWithFields>>, ApiError> {
    PublicationService::publish(&state.db().pool, form_id).await?;
    let form = FormService::get_with_fields(&state.db().pool, form_id).await?;
    Ok(ResponseJson(ApiResponse::success(form)))
}

/// POST /api/forms/{id}/copy
pub async fn copy_form(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<FormWithFields>>), ApiError> {
    let form = FormService::copy(&state.db().pool, form_id).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(form))))
}

/// GET /api/forms/share/{slug}
pub async fn get_shared_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ResponseJson<ApiResponse<FormWithFields>>, ApiError> {
    let form = FormService::get_shared(&state.db().pool, &slug).await?;
    Ok(ResponseJson(ApiResponse::success(form)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forms", get(list_forms).post(create_form))
        .route("/forms/share/{slug}", get(get_shared_form))
        .route(
            "/forms/{id}",
            get(get_form).put(update_form).delete(delete_form),
        )
        .route("/forms/{id}/publish", post(publish_form))
        .route("/forms/{id}/copy", post(copy_form))
}
