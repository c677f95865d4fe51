pub mod menus;
pub mod orders;
pub mod reports;
pub mod stats;
pub mod users;

use axum::Router;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(users::routes())
        .merge(menus::routes())
        .merge(orders::routes())
        .merge(reports::routes())
        .merge(stats::routes())
}
