//! User store trait and local identity resolution.
//!
//! The [`UserStore`] trait maps a login name within a tenant domain to the
//! internal [`UserId`] that device registrations are keyed by.
//! [`LocalIdentity`] carries the parsed form of a subject identifier such as
//! `alice@carbon.super`.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{error::UserStoreError, types::UserId};

/// Tenant domain assumed when a subject identifier carries none.
pub const DEFAULT_TENANT_DOMAIN: &str = "carbon.super";

/// A local user identity parsed from a subject identifier.
///
/// Subject identifiers are tenant-qualified login names of the form
/// `username@tenant.domain`. The split is on the *last* `@` so that
/// email-style usernames survive: `alice@example.com@carbon.super` parses to
/// username `alice@example.com` in tenant `carbon.super`.
///
/// # Example
///
/// ```
/// use finauth_common_registry::LocalIdentity;
///
/// let identity = LocalIdentity::from_subject_identifier("alice@carbon.super");
/// assert_eq!(identity.username, "alice");
/// assert_eq!(identity.tenant_domain, "carbon.super");
/// assert_eq!(identity.subject, "alice@carbon.super");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdentity {
    /// The full subject identifier as received.
    pub subject: String,
    /// Login name within the tenant.
    pub username: String,
    /// Tenant domain the user belongs to.
    pub tenant_domain: String,
}

impl LocalIdentity {
    /// Parses a subject identifier into a local identity.
    ///
    /// Identifiers without a tenant suffix fall back to
    /// [`DEFAULT_TENANT_DOMAIN`].
    #[must_use]
    pub fn from_subject_identifier(subject_identifier: &str) -> Self {
        match subject_identifier.rsplit_once('@') {
            Some((username, tenant)) if !username.is_empty() && !tenant.is_empty() => Self {
                subject: subject_identifier.to_owned(),
                username: username.to_owned(),
                tenant_domain: tenant.to_owned(),
            },
            _ => Self {
                subject: subject_identifier.to_owned(),
                username: subject_identifier.to_owned(),
                tenant_domain: DEFAULT_TENANT_DOMAIN.to_owned(),
            },
        }
    }
}

impl std::fmt::Display for LocalIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.subject)
    }
}

/// Resolution of login names to internal user identifiers.
///
/// Backed by the platform user store in production and by
/// [`MemoryUserStore`] in tests.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Resolves a login name within a tenant domain to the internal user id.
    ///
    /// # Errors
    ///
    /// Returns [`UserStoreError::UnknownUser`] if no such user exists,
    /// [`UserStoreError::Store`] on backend failure.
    async fn lookup_user_id(
        &self,
        username: &str,
        tenant_domain: &str,
    ) -> Result<UserId, UserStoreError>;
}

/// In-memory implementation of [`UserStore`] for testing.
///
/// # Examples
///
/// ```
/// use finauth_common_registry::{MemoryUserStore, UserId, UserStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryUserStore::new();
///     store.insert_user("alice", "carbon.super", UserId::from("user-001"));
///
///     let user_id = store.lookup_user_id("alice", "carbon.super").await?;
///     assert_eq!(user_id, UserId::from("user-001"));
///     Ok(())
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryUserStore {
    /// User ids indexed by (username, tenant_domain).
    users: Arc<RwLock<HashMap<(String, String), UserId>>>,
}

impl MemoryUserStore {
    /// Creates a new empty in-memory user store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user. Test-setup helper; not part of the trait.
    pub fn insert_user(&self, username: &str, tenant_domain: &str, user_id: UserId) {
        self.users.write().insert((username.to_owned(), tenant_domain.to_owned()), user_id);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    #[tracing::instrument(skip(self))]
    async fn lookup_user_id(
        &self,
        username: &str,
        tenant_domain: &str,
    ) -> Result<UserId, UserStoreError> {
        let users = self.users.read();
        users
            .get(&(username.to_owned(), tenant_domain.to_owned()))
            .cloned()
            .ok_or_else(|| UserStoreError::unknown_user(username))
    }
}
