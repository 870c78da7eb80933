use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/catalog", get(handlers::get_catalog))
        .route(
            "/api/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/api/sessions/:id",
            put(handlers::update_session).delete(handlers::delete_session),
        )
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::put_settings),
        )
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/months", get(handlers::get_months))
        .route("/api/pvi", get(handlers::get_pvi))
        .route("/api/export", get(handlers::export_data))
        .route("/api/import", post(handlers::import_data))
        .with_state(state)
}
