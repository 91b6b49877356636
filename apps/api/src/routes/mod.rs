pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    response::Html,
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

const DASHBOARD_HTML: &str = include_str!("../../static/index.html");

/// GET /
async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health::health_handler))
        // Session API
        .route("/api/v1/tones", get(handlers::handle_list_tones))
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/analyze",
            post(handlers::handle_analyze),
        )
        .route(
            "/api/v1/sessions/:id/cover-letter",
            post(handlers::handle_generate_cover_letter)
                .get(handlers::handle_download_cover_letter),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
