use axum::{routing::get, Router};
use crate::state::AppState;
use crate::handlers::report;
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(report::get_reports))
        .route("/reports/totals", get(report::get_report_totals))
        .route_layer(axum::middleware::from_fn(require_auth))
}
