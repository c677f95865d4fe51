use axum::{routing::{get, post, put}, Router};
use crate::state::AppState;
use crate::handlers::menu;
use crate::middleware::auth::require_auth;

pub fn routes() -> Router<AppState> {
    // Anyone can browse the menu, only staff can change it
    Router::new()
        .route(
            "/menus",
            get(menu::list_menus)
                .merge(post(menu::create_menu).route_layer(axum::middleware::from_fn(require_auth))),
        )
        .route(
            "/menus/{id}",
            put(menu::update_menu)
                .delete(menu::delete_menu)
                .route_layer(axum::middleware::from_fn(require_auth)),
        )
}
