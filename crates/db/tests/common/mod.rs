//! Shared setup for database integration tests.
//!
//! Each test gets its own in-memory SQLite database with the schema built
//! from the entity definitions.

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    EntityTrait, Schema, Set,
};

use brokerage_db::entities::{
    branches, brokers, customers, fuel_types, permissions, policy_types, premium_types, roles,
    users,
};

/// Fresh database with every table created.
pub async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // A second pooled connection would open a second, empty database.
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");

    create_table(&db, brokers::Entity).await;
    create_table(&db, branches::Entity).await;
    create_table(&db, customers::Entity).await;
    create_table(&db, roles::Entity).await;
    create_table(&db, permissions::Entity).await;
    create_table(&db, users::Entity).await;
    create_table(&db, fuel_types::Entity).await;
    create_table(&db, policy_types::Entity).await;
    create_table(&db, premium_types::Entity).await;

    db
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) {
    let backend = DbBackend::Sqlite;
    let stmt = Schema::new(backend).create_table_from_entity(entity);
    db.execute(backend.build(&stmt))
        .await
        .expect("Failed to create table");
}

/// Parses an RFC 3339 timestamp.
pub fn at(timestamp: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(timestamp).expect("Invalid timestamp")
}

pub async fn insert_broker(db: &DatabaseConnection, code: &str, name: &str) -> brokers::Model {
    let now = at("2026-01-01T00:00:00+00:00");
    brokers::ActiveModel {
        name: Set(name.to_string()),
        code: Set(code.to_string()),
        email: Set(None),
        phone: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert broker")
}

pub async fn insert_branch(
    db: &DatabaseConnection,
    broker_id: i32,
    code: &str,
    name: &str,
) -> branches::Model {
    let now = at("2026-01-01T00:00:00+00:00");
    branches::ActiveModel {
        broker_id: Set(broker_id),
        name: Set(name.to_string()),
        code: Set(code.to_string()),
        is_head_office: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert branch")
}

pub async fn insert_customer(
    db: &DatabaseConnection,
    broker_id: i32,
    branch_id: Option<i32>,
    name: &str,
    status: &str,
    created_at: &str,
) -> customers::Model {
    let created_at = at(created_at);
    customers::ActiveModel {
        broker_id: Set(broker_id),
        branch_id: Set(branch_id),
        name: Set(name.to_string()),
        email: Set(Some(format!("{}@example.com", name.to_lowercase()))),
        phone: Set(None),
        status: Set(status.to_string()),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert customer")
}

pub async fn insert_role(db: &DatabaseConnection, slug: &str, name: &str) -> roles::Model {
    let now = at("2026-01-01T00:00:00+00:00");
    roles::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert role")
}

pub async fn insert_user(
    db: &DatabaseConnection,
    role_id: Option<i32>,
    email: &str,
) -> users::Model {
    let now = at("2026-01-01T00:00:00+00:00");
    users::ActiveModel {
        role_id: Set(role_id),
        branch_id: Set(None),
        name: Set(email.split('@').next().unwrap_or(email).to_string()),
        email: Set(email.to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}
