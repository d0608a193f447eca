//! User management error types.

use std::fmt;

use thiserror::Error;

use brokerage_shared::AppError;

/// Mutations guarded by the protected-user rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Permanent removal.
    Delete,
    /// Disabling the account.
    Deactivate,
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => f.write_str("delete"),
            Self::Deactivate => f.write_str("deactivate"),
        }
    }
}

/// Why a user is protected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protection {
    /// The user holds a protected role.
    Role(String),
    /// The acting user targeted their own account.
    SelfTarget,
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(role) => write!(f, "holds the protected role '{role}'"),
            Self::SelfTarget => f.write_str("is the acting user"),
        }
    }
}

/// User management errors.
#[derive(Debug, Error)]
pub enum UserError {
    /// Attempt to delete or deactivate a protected user.
    #[error("cannot {action} user {user_id}: user {protection}")]
    ProtectedEntity {
        /// Target user.
        user_id: i32,
        /// Rejected action.
        action: UserAction,
        /// What protects the user.
        protection: Protection,
    },

    /// User does not exist.
    #[error("user not found: {0}")]
    NotFound(i32),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::ProtectedEntity { .. } => Self::Forbidden(err.to_string()),
            UserError::NotFound(_) => Self::NotFound(err.to_string()),
        }
    }
}
