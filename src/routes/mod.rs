pub mod preferences;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(preferences::preference_routes())
}
