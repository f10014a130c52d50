mod dto;
pub mod handlers;
pub mod repo_types;
pub mod services;
pub mod tracker;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
