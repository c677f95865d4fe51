use axum::{
    routing::{get, patch},
    Router,
};
use crate::state::AppState;
use crate::handlers::order;
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    // Customers track their order by code without logging in
    let open = Router::new()
        .route("/orders/track/{code}", get(order::track_order));

    let protected = Router::new()
        .route("/orders", get(order::list_orders).post(order::create_order))
        .route("/orders/{id}", get(order::get_order).delete(order::delete_order))
        .route("/orders/{id}/status", patch(order::update_order_status))
        .route_layer(axum::middleware::from_fn(require_auth));

    open.merge(protected)
}
