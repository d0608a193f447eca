//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for exports, customers and users
//! - Request extractors
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use brokerage_core::export::{ExportDefaults, ExportPipeline};
use brokerage_core::user::UserGuard;
use brokerage_db::{CustomerRepository, EntityRegistry, UserRepository};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Export pipeline over every registered entity.
    pub exports: Arc<ExportPipeline>,
    /// Customer repository.
    pub customers: CustomerRepository,
    /// User repository with the protected-user guard.
    pub users: UserRepository,
}

impl AppState {
    /// Wires repositories and the export pipeline over one connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, defaults: ExportDefaults, guard: UserGuard) -> Self {
        let registry = Arc::new(EntityRegistry::with_defaults(db.clone()));
        Self {
            exports: Arc::new(ExportPipeline::new(registry).with_defaults(defaults)),
            customers: CustomerRepository::new(db.clone()),
            users: UserRepository::new(db.clone(), guard),
            db: Arc::new(db),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
