use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod username;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
