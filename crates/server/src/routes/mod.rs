pub mod fields;
pub mod forms;
pub mod health;
pub mod submissions;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(forms::router())
        .merge(fields::router())
        .merge(submissions::router())
        .merge(health::router());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
