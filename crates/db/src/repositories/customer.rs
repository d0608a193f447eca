//! Customer repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;

use brokerage_shared::AppError;
use brokerage_shared::types::{PageRequest, PageResponse};

use crate::entities::{branches, brokers, customers};
use crate::unit_of_work::UnitOfWork;

/// Error types for customer operations.
#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    /// Customer not found.
    #[error("Customer not found: {0}")]
    NotFound(i32),

    /// Broker not found.
    #[error("Broker not found: {0}")]
    BrokerNotFound(i32),

    /// Branch missing or owned by another broker.
    #[error("Branch {branch_id} does not belong to broker {broker_id}")]
    BranchMismatch {
        /// Requested branch.
        branch_id: i32,
        /// Customer's broker.
        broker_id: i32,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CustomerError> for AppError {
    fn from(err: CustomerError) -> Self {
        match err {
            CustomerError::NotFound(_) => Self::NotFound(err.to_string()),
            CustomerError::BrokerNotFound(_) | CustomerError::BranchMismatch { .. } => {
                Self::Validation(err.to_string())
            }
            CustomerError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Query-string filters for listing customers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerFilter {
    /// Only customers of this broker.
    pub broker_id: Option<i32>,
    /// Only customers of this branch.
    pub branch_id: Option<i32>,
    /// Exact status.
    pub status: Option<String>,
    /// Substring of name or email.
    pub search: Option<String>,
}

/// Input for creating a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomerInput {
    /// Owning broker.
    pub broker_id: i32,
    /// Servicing branch.
    pub branch_id: Option<i32>,
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Status, `active` when omitted.
    pub status: Option<String>,
}

/// Input for updating a customer. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCustomerInput {
    /// Full name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Status.
    pub status: Option<String>,
}

/// Customer repository.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: DatabaseConnection,
    uow: UnitOfWork,
}

impl CustomerRepository {
    /// Creates a new customer repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            uow: UnitOfWork::new(db.clone()),
            db,
        }
    }

    /// Finds a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<customers::Model>, DbErr> {
        customers::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists customers, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<PageResponse<customers::Model>, DbErr> {
        let page = page.normalized();
        let mut query = customers::Entity::find();

        if let Some(broker_id) = filter.broker_id {
            query = query.filter(customers::Column::BrokerId.eq(broker_id));
        }
        if let Some(branch_id) = filter.branch_id {
            query = query.filter(customers::Column::BranchId.eq(branch_id));
        }
        if let Some(status) = &filter.status {
            query = query.filter(customers::Column::Status.eq(status.as_str()));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            query = query.filter(
                customers::Column::Name
                    .like(pattern.as_str())
                    .or(customers::Column::Email.like(pattern.as_str())),
            );
        }

        let total = query.clone().count(&self.db).await?;
        let data = query
            .order_by_desc(customers::Column::CreatedAt)
            .order_by_desc(customers::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Creates a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the broker or branch is invalid, or the insert fails.
    pub async fn create(
        &self,
        input: CreateCustomerInput,
    ) -> Result<customers::Model, CustomerError> {
        self.uow
            .run(move |txn| {
                Box::pin(async move {
                    check_ownership(txn, input.broker_id, input.branch_id).await?;

                    let now = Utc::now().into();
                    let customer = customers::ActiveModel {
                        broker_id: Set(input.broker_id),
                        branch_id: Set(input.branch_id),
                        name: Set(input.name),
                        email: Set(input.email),
                        phone: Set(input.phone),
                        status: Set(input.status.unwrap_or_else(|| "active".to_string())),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    };
                    Ok::<_, CustomerError>(customer.insert(txn).await?)
                })
            })
            .await
    }

    /// Updates a customer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the customer does not exist.
    pub async fn update(
        &self,
        id: i32,
        input: UpdateCustomerInput,
    ) -> Result<customers::Model, CustomerError> {
        self.uow
            .run(move |txn| {
                Box::pin(async move {
                    let existing = customers::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or(CustomerError::NotFound(id))?;

                    let mut customer: customers::ActiveModel = existing.into();
                    if let Some(name) = input.name {
                        customer.name = Set(name);
                    }
                    if let Some(email) = input.email {
                        customer.email = Set(Some(email));
                    }
                    if let Some(phone) = input.phone {
                        customer.phone = Set(Some(phone));
                    }
                    if let Some(status) = input.status {
                        customer.status = Set(status);
                    }
                    customer.updated_at = Set(Utc::now().into());

                    Ok::<_, CustomerError>(customer.update(txn).await?)
                })
            })
            .await
    }

    /// Deletes a customer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the customer does not exist.
    pub async fn delete(&self, id: i32) -> Result<(), CustomerError> {
        self.uow
            .run(move |txn| {
                Box::pin(async move {
                    let result = customers::Entity::delete_by_id(id).exec(txn).await?;
                    if result.rows_affected == 0 {
                        return Err(CustomerError::NotFound(id));
                    }
                    Ok::<_, CustomerError>(())
                })
            })
            .await
    }
}

async fn check_ownership(
    txn: &DatabaseTransaction,
    broker_id: i32,
    branch_id: Option<i32>,
) -> Result<(), CustomerError> {
    brokers::Entity::find_by_id(broker_id)
        .one(txn)
        .await?
        .ok_or(CustomerError::BrokerNotFound(broker_id))?;

    if let Some(branch_id) = branch_id {
        let owned = branches::Entity::find_by_id(branch_id)
            .one(txn)
            .await?
            .is_some_and(|branch| branch.broker_id == broker_id);
        if !owned {
            return Err(CustomerError::BranchMismatch {
                branch_id,
                broker_id,
            });
        }
    }
    Ok(())
}
