//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod customers;
pub mod exports;
pub mod health;
pub mod users;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(exports::routes())
        .merge(customers::routes())
        .merge(users::routes())
}
