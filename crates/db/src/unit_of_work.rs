//! Transactional unit of work.
//!
//! Every mutating repository runs its writes through [`UnitOfWork`], so a
//! failure at any point leaves the database untouched.
//!
//! # Usage
//!
//! ```ignore
//! let customer = uow
//!     .run(|txn| {
//!         Box::pin(async move {
//!             let customer = new_customer.insert(txn).await?;
//!             audit.insert(txn).await?;
//!             Ok::<_, CustomerError>(customer)
//!         })
//!     })
//!     .await?;
//! ```

use futures::future::BoxFuture;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tracing::{debug, warn};

/// One deferred step of a unit of work. The transaction is only borrowed for
/// the lifetime of the step's future.
pub type TxnStep<T, E> =
    Box<dyn for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, E>> + Send>;

/// Boxes a closure as a [`TxnStep`].
pub fn step<T, E, F>(f: F) -> TxnStep<T, E>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, E>> + Send + 'static,
{
    Box::new(f)
}

/// Runs callbacks atomically.
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    db: DatabaseConnection,
}

impl UnitOfWork {
    /// Creates a unit of work over a connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Runs `callback` inside a new transaction.
    ///
    /// Commits when the callback succeeds. Otherwise rolls back and returns
    /// the callback's error unchanged; a failed rollback is only logged.
    ///
    /// # Errors
    ///
    /// Returns the callback's error, or the begin/commit failure.
    pub async fn run<T, E, F>(&self, callback: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, E>> + Send,
        T: Send,
        E: From<DbErr> + Send,
    {
        let txn = self.db.begin().await?;

        match callback(&txn).await {
            Ok(value) => {
                txn.commit().await?;
                debug!("Unit of work committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed after unit of work error");
                } else {
                    debug!("Unit of work rolled back");
                }
                Err(err)
            }
        }
    }

    /// Runs every step in order inside one transaction.
    ///
    /// Results come back in input order. Any failure rolls back all steps.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    pub async fn run_all<T, E>(&self, steps: Vec<TxnStep<T, E>>) -> Result<Vec<T>, E>
    where
        T: Send + 'static,
        E: From<DbErr> + Send + 'static,
    {
        self.run(move |txn| {
            Box::pin(async move {
                let mut results = Vec::with_capacity(steps.len());
                for next in steps {
                    results.push(next(txn).await?);
                }
                Ok(results)
            })
        })
        .await
    }

    /// Runs `callback` in `outer` when given, else in a new transaction.
    ///
    /// Inside an outer transaction nothing is committed or rolled back here:
    /// the outermost boundary decides.
    ///
    /// # Errors
    ///
    /// Returns the callback's error, or the begin/commit failure.
    pub async fn run_in<T, E, F>(
        &self,
        outer: Option<&DatabaseTransaction>,
        callback: F,
    ) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, E>> + Send,
        T: Send,
        E: From<DbErr> + Send,
    {
        match outer {
            Some(txn) => callback(txn).await,
            None => self.run(callback).await,
        }
    }
}
