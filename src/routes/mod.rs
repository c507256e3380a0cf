//! Router construction.

mod common;
mod entity;

pub use common::common_routes_with_ready;
pub use entity::entity_routes;

use crate::state::AppState;
use axum::Router;

/// Mount point of the entity routes.
pub const API_PREFIX: &str = "/api/v1";

/// Common routes plus entity routes under `/api/v1`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest(API_PREFIX, entity_routes(state))
}
