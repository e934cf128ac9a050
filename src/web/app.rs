use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, state::AppState};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthcheck))
        .route("/api/plan", get(handlers::get_plan))
        .route(
            "/api/get",
            get(handlers::get_record).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/set",
            post(handlers::set_day).fallback(handlers::method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
