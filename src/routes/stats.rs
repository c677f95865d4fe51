use axum::{routing::get, Router};
use crate::state::AppState;
use crate::handlers::stats;
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats::get_stats))
        .route("/stats/weekly", get(stats::get_weekly_sales))
        .route_layer(axum::middleware::from_fn(require_auth))
}
