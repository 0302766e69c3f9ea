pub mod client;
mod dto;
pub mod handlers;
pub mod personas;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
