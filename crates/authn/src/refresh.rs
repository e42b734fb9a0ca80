//! Single-use refresh token tracking.
//!
//! Refresh rotation is single-use: exchanging a refresh token consumes its
//! JTI, and presenting the same token again is rejected. The [`RefreshLog`]
//! trait is the hook the host system implements to make consumption durable
//! (a database table, a cache with TTLs, ...); the revocation record itself
//! lives outside this crate.
//!
//! # Usage
//!
//! ```
//! use gravity_common_authn::refresh::InMemoryRefreshLog;
//!
//! // Track up to 10_000 outstanding refresh JTIs in-process
//! let log = InMemoryRefreshLog::new(10_000);
//! ```
//!
//! # Design
//!
//! - **Per-entry expiry**: each JTI entry expires when the token itself expires, bounding memory
//!   usage automatically.
//! - **Capacity-bounded**: the in-memory implementation uses LRU eviction as a safety net beyond
//!   per-entry TTL. An evicted entry means the corresponding token could be replayed; size the
//!   capacity above the expected number of outstanding refresh tokens, or use a durable
//!   implementation.

use std::time::{Duration, Instant};

use moka::{policy::EvictionPolicy, sync::Cache};

use crate::error::AuthError;

/// Hook for recording consumed refresh tokens.
///
/// Implementations track consumed JTI values and reject duplicates. The
/// log is responsible for cleaning up entries once the corresponding token
/// has expired (an expired token fails verification anyway).
pub trait RefreshLog: Send + Sync {
    /// Marks a JTI as consumed, rejecting it if already consumed.
    ///
    /// # Arguments
    ///
    /// * `jti` — The token's JTI claim value
    /// * `expires_in` — Duration until the token expires (used for entry TTL)
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RefreshReused`] if the JTI was already recorded.
    fn consume(&self, jti: &str, expires_in: Duration) -> Result<(), AuthError>;
}

/// Per-entry expiry policy that stores the remaining token lifetime at
/// insertion time.
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

/// In-memory refresh log backed by a [`moka::sync::Cache`].
///
/// Suitable for single-process deployments and tests. Multi-process
/// deployments need a [`RefreshLog`] backed by shared storage, since each
/// process would otherwise accept the first presentation it sees.
///
/// # Thread Safety
///
/// `InMemoryRefreshLog` is `Send + Sync` and safe for concurrent use from
/// multiple request-handling threads.
pub struct InMemoryRefreshLog {
    /// Cache mapping JTI → expiration instant.
    seen: Cache<String, Instant>,
}

impl InMemoryRefreshLog {
    /// Creates a new refresh log with the given maximum capacity.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` — Maximum number of JTI entries tracked simultaneously. When capacity is
    ///   exceeded, the least-recently-used entry is evicted.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let seen = Cache::builder()
            .max_capacity(max_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(JtiExpiry)
            .build();
        Self { seen }
    }
}

impl RefreshLog for InMemoryRefreshLog {
    fn consume(&self, jti: &str, expires_in: Duration) -> Result<(), AuthError> {
        let key = jti.to_owned();
        let expiration = Instant::now() + expires_in;

        if self.seen.contains_key(&key) {
            return Err(AuthError::refresh_reused(jti));
        }

        self.seen.insert(key, expiration);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_first_consumption_accepted() {
        let log = InMemoryRefreshLog::new(100);
        let result = log.consume("jti-001", Duration::from_secs(60));
        assert!(result.is_ok());
    }

    #[test]
    fn test_second_consumption_rejected() {
        let log = InMemoryRefreshLog::new(100);
        log.consume("jti-002", Duration::from_secs(60)).unwrap();

        let result = log.consume("jti-002", Duration::from_secs(60));
        assert!(
            matches!(&result, Err(AuthError::RefreshReused { jti }) if jti == "jti-002"),
            "expected RefreshReused, got: {result:?}"
        );
    }

    #[test]
    fn test_different_jtis_accepted() {
        let log = InMemoryRefreshLog::new(100);
        log.consume("jti-a", Duration::from_secs(60)).unwrap();
        let result = log.consume("jti-b", Duration::from_secs(60));
        assert!(result.is_ok());
    }

    #[test]
    fn test_jti_cleanup_after_expiration() {
        let log = InMemoryRefreshLog::new(100);
        log.consume("jti-expire", Duration::from_millis(50)).unwrap();

        std::thread::sleep(Duration::from_millis(100));
        log.seen.run_pending_tasks();

        // Accepted again once the original entry has expired
        let result = log.consume("jti-expire", Duration::from_secs(5));
        assert!(result.is_ok());
    }

    #[test]
    fn test_capacity_eviction() {
        let log = InMemoryRefreshLog::new(2);

        log.consume("jti-1", Duration::from_secs(300)).unwrap();
        log.consume("jti-2", Duration::from_secs(300)).unwrap();
        log.consume("jti-3", Duration::from_secs(300)).unwrap();

        log.seen.run_pending_tasks();

        // jti-1 was evicted (LRU), so it is accepted again
        let result = log.consume("jti-1", Duration::from_secs(300));
        assert!(result.is_ok());
    }

    #[test]
    fn test_zero_duration_entry() {
        let log = InMemoryRefreshLog::new(100);
        // A token with zero remaining lifetime — tracked briefly, no panic
        let result = log.consume("jti-zero", Duration::ZERO);
        assert!(result.is_ok());
    }
}
