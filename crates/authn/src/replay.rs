//! Token replay prevention via JTI (JWT ID) tracking.
//!
//! The replay cache maintains a set of recently-seen JTI values. Tokens
//! presented more than once within their validity window are rejected,
//! preventing replay attacks where a captured verification token is reused
//! by an attacker.
//!
//! # Usage
//!
//! ```no_run
//! use finauth_common_authn::replay::InMemoryReplayCache;
//!
//! // Create a replay cache bounded to 10_000 tracked JTIs
//! let cache = InMemoryReplayCache::new(10_000);
//! ```
//!
//! # Design
//!
//! - **Atomic check-and-record**: [`ReplayCache::check_and_record`] is a
//!   single operation, not a lookup followed by an insert. When two requests
//!   carrying the same JTI race, exactly one observes the identifier as
//!   fresh; all others are rejected.
//! - **Per-entry expiry**: Each JTI entry expires when the token itself
//!   expires, bounding memory usage automatically. Combined with the
//!   chain's maximum-token-lifetime bound, an entry always outlives every
//!   token that could still pass the timeliness checks.
//! - **Capacity-bounded**: The in-memory implementation uses LRU eviction as
//!   a safety net beyond per-entry TTL.
//! - **Write-once**: There is no delete operation; eviction is time-driven
//!   only.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::AuthError;

/// Trait for token replay detection.
///
/// Implementations track seen JTI values and reject duplicates. The cache is
/// responsible for automatically cleaning up expired entries.
#[async_trait]
pub trait ReplayCache: Send + Sync {
    /// Atomically check whether a JTI has been seen before and mark it as
    /// seen.
    ///
    /// For any given `jti`, at most one caller — across all concurrent
    /// callers — observes it as fresh and receives `Ok(())`.
    ///
    /// # Arguments
    ///
    /// * `jti` — The JWT ID claim value
    /// * `expires_in` — Duration until the token expires (used for entry
    ///   TTL)
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ReplayDetected`] if the JTI was already
    /// recorded.
    async fn check_and_record(&self, jti: &str, expires_in: Duration) -> Result<(), AuthError>;
}

/// Per-entry expiry policy that stores the remaining lifetime at insertion
/// time.
struct JtiExpiry;

impl moka::Expiry<String, Instant> for JtiExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Instant,
        created_at: Instant,
    ) -> Option<Duration> {
        // `value` holds the absolute expiration instant.
        // Return remaining duration, or zero if already past.
        Some(value.saturating_duration_since(created_at))
    }
}

/// In-memory replay cache backed by a [`moka::future::Cache`].
///
/// Each JTI is stored with a per-entry TTL matching the token's remaining
/// lifetime, ensuring automatic cleanup. The cache is also capacity-bounded
/// with LRU eviction as a safety net.
///
/// The check-and-record step uses the cache's atomic entry API: concurrent
/// callers presenting the same JTI serialize on the entry, and only the one
/// that actually inserts observes it as fresh. A separate
/// contains-then-insert sequence would leave a window where two requests
/// bearing the same stolen token both pass.
///
/// # Thread Safety
///
/// `InMemoryReplayCache` is `Send + Sync` and safe for concurrent use from
/// multiple async tasks.
pub struct InMemoryReplayCache {
    /// Cache mapping JTI → expiration instant.
    seen: moka::future::Cache<String, Instant>,
}

impl InMemoryReplayCache {
    /// Create a new replay cache with the given maximum capacity.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` — Maximum number of JTI entries tracked
    ///   simultaneously. When capacity is exceeded, the least-recently-used
    ///   entry is evicted.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let seen = moka::future::Cache::builder()
            .max_capacity(max_capacity)
            .eviction_policy(moka::policy::EvictionPolicy::lru())
            .expire_after(JtiExpiry)
            .build();
        Self { seen }
    }
}

#[async_trait]
impl ReplayCache for InMemoryReplayCache {
    async fn check_and_record(&self, jti: &str, expires_in: Duration) -> Result<(), AuthError> {
        let expiration = Instant::now() + expires_in;

        let entry = self.seen.entry(jti.to_owned()).or_insert(expiration).await;
        if entry.is_fresh() {
            Ok(())
        } else {
            Err(AuthError::replay_detected(jti))
        }
    }
}
