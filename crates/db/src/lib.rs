//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the back-office tables
//! - Export record sources over those entities
//! - The transactional unit of work and repositories built on it
//! - Database migrations

pub mod entities;
pub mod export_source;
pub mod migration;
pub mod repositories;
pub mod unit_of_work;

pub use export_source::{EntityQuery, EntityRegistry, Exportable};
pub use repositories::{BrokerRepository, CustomerRepository, ReferenceRepository, UserRepository};
pub use unit_of_work::UnitOfWork;

use brokerage_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized by configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
