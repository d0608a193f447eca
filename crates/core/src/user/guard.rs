//! Protected-user rule.

use std::collections::BTreeSet;

use brokerage_shared::UserPolicyConfig;

use super::error::{Protection, UserAction, UserError};

/// The parts of a user the rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardedUser<'a> {
    /// User id.
    pub id: i32,
    /// Role slug, if the user has a role.
    pub role: Option<&'a str>,
}

/// Decides whether a user may be deleted or deactivated.
///
/// Checked before any transaction is opened.
#[derive(Debug, Clone, Default)]
pub struct UserGuard {
    protected_roles: BTreeSet<String>,
}

impl UserGuard {
    /// Guard protecting holders of `roles`.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protected_roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Guard built from the `users` configuration section.
    #[must_use]
    pub fn from_config(config: &UserPolicyConfig) -> Self {
        Self::new(config.protected_roles.iter().cloned())
    }

    /// Whether `role` is protected.
    #[must_use]
    pub fn is_protected_role(&self, role: &str) -> bool {
        self.protected_roles.contains(role)
    }

    /// Checks that `actor_id` may apply `action` to `target`.
    ///
    /// # Errors
    ///
    /// Returns `ProtectedEntity` if the target holds a protected role or is
    /// the acting user.
    pub fn check(
        &self,
        action: UserAction,
        target: GuardedUser<'_>,
        actor_id: i32,
    ) -> Result<(), UserError> {
        let protection = if target.id == actor_id {
            Some(Protection::SelfTarget)
        } else {
            target
                .role
                .filter(|role| self.is_protected_role(role))
                .map(|role| Protection::Role(role.to_string()))
        };

        match protection {
            Some(protection) => Err(UserError::ProtectedEntity {
                user_id: target.id,
                action,
                protection,
            }),
            None => Ok(()),
        }
    }
}
