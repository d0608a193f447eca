//! Reference data repository (fuel, policy and premium types).

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{fuel_types, policy_types, premium_types};
use crate::unit_of_work::{TxnStep, UnitOfWork, step};

/// The reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `fuel_types`
    FuelType,
    /// `policy_types`
    PolicyType,
    /// `premium_types`
    PremiumType,
}

impl ReferenceKind {
    /// Every kind.
    pub const ALL: [Self; 3] = [Self::FuelType, Self::PolicyType, Self::PremiumType];
}

/// A reference entry, independent of its table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceItem {
    /// Row ID.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Unique code.
    pub code: String,
}

/// Input for a new reference entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReferenceItem {
    /// Display name.
    pub name: String,
    /// Unique code.
    pub code: String,
}

impl NewReferenceItem {
    /// Creates an input.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

macro_rules! reference_item {
    ($model:expr) => {{
        let model = $model;
        ReferenceItem {
            id: model.id,
            name: model.name,
            code: model.code,
        }
    }};
}

/// Reference data repository.
#[derive(Debug, Clone)]
pub struct ReferenceRepository {
    db: DatabaseConnection,
    uow: UnitOfWork,
}

impl ReferenceRepository {
    /// Creates a new reference data repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            uow: UnitOfWork::new(db.clone()),
            db,
        }
    }

    /// Lists entries of one kind by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, kind: ReferenceKind) -> Result<Vec<ReferenceItem>, DbErr> {
        let items = match kind {
            ReferenceKind::FuelType => fuel_types::Entity::find()
                .order_by_asc(fuel_types::Column::Name)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|m| reference_item!(m))
                .collect(),
            ReferenceKind::PolicyType => policy_types::Entity::find()
                .order_by_asc(policy_types::Column::Name)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|m| reference_item!(m))
                .collect(),
            ReferenceKind::PremiumType => premium_types::Entity::find()
                .order_by_asc(premium_types::Column::Name)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|m| reference_item!(m))
                .collect(),
        };
        Ok(items)
    }

    /// Inserts all entries in one transaction; one failure inserts none.
    ///
    /// # Errors
    ///
    /// Returns the first failing insert's error.
    pub async fn create_many(
        &self,
        kind: ReferenceKind,
        items: Vec<NewReferenceItem>,
    ) -> Result<Vec<ReferenceItem>, DbErr> {
        let steps = items.into_iter().map(|item| insert_step(kind, item)).collect();
        self.uow.run_all(steps).await
    }
}

/// Builds the insert for one entry as a unit-of-work step.
pub fn insert_step(kind: ReferenceKind, item: NewReferenceItem) -> TxnStep<ReferenceItem, DbErr> {
    step(move |txn| {
        Box::pin(async move {
            let now = Utc::now().into();
            let inserted = match kind {
                ReferenceKind::FuelType => reference_item!(
                    fuel_types::ActiveModel {
                        name: Set(item.name),
                        code: Set(item.code),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?
                ),
                ReferenceKind::PolicyType => reference_item!(
                    policy_types::ActiveModel {
                        name: Set(item.name),
                        code: Set(item.code),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?
                ),
                ReferenceKind::PremiumType => reference_item!(
                    premium_types::ActiveModel {
                        name: Set(item.name),
                        code: Set(item.code),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?
                ),
            };
            Ok::<_, DbErr>(inserted)
        })
    })
}
