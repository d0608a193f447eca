//! User repository for database operations.
//!
//! Deleting and deactivating users goes through the protected-user rule
//! before any transaction is opened.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use tracing::info;

use brokerage_core::user::{GuardedUser, UserAction, UserError, UserGuard};
use brokerage_shared::AppError;

use crate::entities::{roles, users};
use crate::unit_of_work::UnitOfWork;

/// Error types for user management operations.
#[derive(Debug, thiserror::Error)]
pub enum UserManagementError {
    /// A user rule rejected the operation.
    #[error(transparent)]
    Rule(#[from] UserError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<UserManagementError> for AppError {
    fn from(err: UserManagementError) -> Self {
        match err {
            UserManagementError::Rule(e) => e.into(),
            UserManagementError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
    uow: UnitOfWork,
    guard: UserGuard,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, guard: UserGuard) -> Self {
        Self {
            uow: UnitOfWork::new(db.clone()),
            db,
            guard,
        }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user together with their role.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_with_role(
        &self,
        id: i32,
    ) -> Result<Option<(users::Model, Option<roles::Model>)>, DbErr> {
        users::Entity::find_by_id(id)
            .find_also_related(roles::Entity)
            .one(&self.db)
            .await
    }

    /// Deletes a user on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProtectedEntity` for protected users and `NotFound` for
    /// missing ones.
    pub async fn delete(&self, id: i32, actor_id: i32) -> Result<(), UserManagementError> {
        self.authorize(UserAction::Delete, id, actor_id).await?;

        self.uow
            .run(move |txn| {
                Box::pin(async move {
                    users::Entity::delete_by_id(id).exec(txn).await?;
                    Ok::<_, UserManagementError>(())
                })
            })
            .await?;

        info!(user_id = id, actor_id, "User deleted");
        Ok(())
    }

    /// Deactivates a user on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProtectedEntity` for protected users and `NotFound` for
    /// missing ones.
    pub async fn deactivate(
        &self,
        id: i32,
        actor_id: i32,
    ) -> Result<users::Model, UserManagementError> {
        let user = self.authorize(UserAction::Deactivate, id, actor_id).await?;

        let user = self
            .uow
            .run(move |txn| {
                Box::pin(async move {
                    let mut active: users::ActiveModel = user.into();
                    active.is_active = Set(false);
                    active.updated_at = Set(Utc::now().into());
                    Ok::<_, UserManagementError>(active.update(txn).await?)
                })
            })
            .await?;

        info!(user_id = id, actor_id, "User deactivated");
        Ok(user)
    }

    async fn authorize(
        &self,
        action: UserAction,
        id: i32,
        actor_id: i32,
    ) -> Result<users::Model, UserManagementError> {
        let (user, role) = self
            .find_with_role(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        self.guard.check(
            action,
            GuardedUser {
                id: user.id,
                role: role.as_ref().map(|r| r.slug.as_str()),
            },
            actor_id,
        )?;

        Ok(user)
    }
}
