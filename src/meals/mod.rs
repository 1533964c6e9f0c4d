pub mod dto;
pub mod handlers;
pub mod input;
pub mod ledger;
pub mod model;
pub mod progress;
pub mod store;
pub mod totals;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::ledger_routes())
        .merge(handlers::estimate_routes())
}
