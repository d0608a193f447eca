//! User management rules.

pub mod error;
pub mod guard;

pub use error::{Protection, UserAction, UserError};
pub use guard::{GuardedUser, UserGuard};
