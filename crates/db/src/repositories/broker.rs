//! Broker repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use brokerage_shared::AppError;

use crate::entities::{branches, brokers};
use crate::unit_of_work::UnitOfWork;

/// Error types for broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// Broker code already in use.
    #[error("Broker code '{0}' already exists")]
    DuplicateCode(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<BrokerError> for AppError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::DuplicateCode(_) => Self::Conflict(err.to_string()),
            BrokerError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a broker.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBrokerInput {
    /// Display name.
    pub name: String,
    /// Unique code; the head branch gets `{code}-HQ`.
    pub code: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Head office branch name.
    pub head_office_name: String,
}

/// A broker with its head office.
#[derive(Debug, Clone)]
pub struct BrokerWithHeadOffice {
    /// The broker.
    pub broker: brokers::Model,
    /// The head office branch.
    pub head_office: branches::Model,
}

/// Broker repository.
#[derive(Debug, Clone)]
pub struct BrokerRepository {
    db: DatabaseConnection,
    uow: UnitOfWork,
}

impl BrokerRepository {
    /// Creates a new broker repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            uow: UnitOfWork::new(db.clone()),
            db,
        }
    }

    /// Lists brokers by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<brokers::Model>, DbErr> {
        brokers::Entity::find()
            .order_by_asc(brokers::Column::Name)
            .all(&self.db)
            .await
    }

    /// Lists a broker's branches, head office first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn branches(&self, broker_id: i32) -> Result<Vec<branches::Model>, DbErr> {
        branches::Entity::find()
            .filter(branches::Column::BrokerId.eq(broker_id))
            .order_by_desc(branches::Column::IsHeadOffice)
            .order_by_asc(branches::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates a broker and its head office branch atomically.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if the code is taken, or a database error.
    pub async fn create_with_head_office(
        &self,
        input: CreateBrokerInput,
    ) -> Result<BrokerWithHeadOffice, BrokerError> {
        self.create_with_head_office_in(None, input).await
    }

    /// Same as [`Self::create_with_head_office`], joining `outer` when given.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if the code is taken, or a database error.
    pub async fn create_with_head_office_in(
        &self,
        outer: Option<&DatabaseTransaction>,
        input: CreateBrokerInput,
    ) -> Result<BrokerWithHeadOffice, BrokerError> {
        self.uow
            .run_in(outer, move |txn| {
                Box::pin(async move { insert_broker(txn, input).await })
            })
            .await
    }
}

async fn insert_broker(
    txn: &DatabaseTransaction,
    input: CreateBrokerInput,
) -> Result<BrokerWithHeadOffice, BrokerError> {
    let taken = brokers::Entity::find()
        .filter(brokers::Column::Code.eq(input.code.as_str()))
        .one(txn)
        .await?
        .is_some();
    if taken {
        return Err(BrokerError::DuplicateCode(input.code));
    }

    let now = Utc::now().into();
    let broker = brokers::ActiveModel {
        name: Set(input.name),
        code: Set(input.code.clone()),
        email: Set(input.email),
        phone: Set(input.phone),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let head_office = branches::ActiveModel {
        broker_id: Set(broker.id),
        name: Set(input.head_office_name),
        code: Set(format!("{}-HQ", input.code)),
        is_head_office: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(BrokerWithHeadOffice {
        broker,
        head_office,
    })
}
