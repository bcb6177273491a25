//! Lease lock serializing writers of the report artifact
//!
//! A lease is a named key holding an owner token with a TTL. Waiters poll
//! with exponential backoff and give up after `max_wait_ms`; a crashed holder
//! stops blocking others once its TTL runs out.

use ontoreport_core::{LockConfig, ReportError};
use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Coordination service holding named leases.
pub trait LeaseBackend: Send + Sync {
    /// Take `key` for `token` unless another live holder has it.
    fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, ReportError>;

    /// Drop `key` if `token` still holds it.
    fn release(&self, key: &str, token: &str) -> Result<(), ReportError>;
}

/// Held lease; released on drop.
pub struct LeaseGuard<'a> {
    backend: &'a dyn LeaseBackend,
    key: String,
    token: String,
}

impl LeaseGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Drop for LeaseGuard<'_> {
    fn drop(&mut self) {
        match self.backend.release(&self.key, &self.token) {
            Ok(()) => debug!(key = %self.key, "released report lease"),
            Err(err) => warn!(key = %self.key, error = %err, "failed to release report lease"),
        }
    }
}

/// Wait for the lease named by `config.key`.
pub fn acquire<'a>(
    backend: &'a dyn LeaseBackend,
    config: &LockConfig,
) -> Result<LeaseGuard<'a>, ReportError> {
    let token = Uuid::new_v4().to_string();
    let max_wait = config.max_wait();
    let started = Instant::now();
    let mut attempt = 0u32;

    loop {
        if backend.try_acquire(&config.key, &token, config.ttl())? {
            debug!(key = %config.key, attempts = attempt + 1, "acquired report lease");
            return Ok(LeaseGuard {
                backend,
                key: config.key.clone(),
                token,
            });
        }

        let waited = started.elapsed();
        if waited >= max_wait {
            return Err(ReportError::LockTimeout {
                key: config.key.clone(),
                waited_ms: waited.as_millis() as u64,
            });
        }

        let pause = config.delay_for_attempt(attempt).min(max_wait - waited);
        debug!(key = %config.key, pause_ms = pause.as_millis() as u64, "report lease busy");
        thread::sleep(pause);
        attempt = attempt.saturating_add(1);
    }
}

/// Process-local lease table, for single-host runs and tests.
#[derive(Default)]
pub struct InMemoryLease {
    leases: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryLease {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current live holder of `key`.
    pub fn holder(&self, key: &str) -> Option<String> {
        let leases = self.leases.lock().ok()?;
        leases
            .get(key)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(token, _)| token.clone())
    }
}

impl LeaseBackend for InMemoryLease {
    fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, ReportError> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|_| ReportError::LockUnavailable("lease table poisoned".to_string()))?;
        let now = Instant::now();
        if let Some((_, expires)) = leases.get(key) {
            if *expires > now {
                return Ok(false);
            }
        }
        leases.insert(key.to_string(), (token.to_string(), now + ttl));
        Ok(true)
    }

    fn release(&self, key: &str, token: &str) -> Result<(), ReportError> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|_| ReportError::LockUnavailable("lease table poisoned".to_string()))?;
        if leases.get(key).is_some_and(|(holder, _)| holder == token) {
            leases.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_lock(max_wait_ms: u64) -> LockConfig {
        LockConfig {
            key: "TEST_LOCK".to_string(),
            ttl_ms: 60_000,
            poll_interval_ms: 5,
            max_poll_interval_ms: 20,
            max_wait_ms,
        }
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let backend = InMemoryLease::new();
        let config = fast_lock(100);
        {
            let guard = acquire(&backend, &config).unwrap();
            assert_eq!(backend.holder("TEST_LOCK").as_deref(), Some(guard.token()));
        }
        assert_eq!(backend.holder("TEST_LOCK"), None);
    }

    #[test]
    fn test_wait_is_bounded() {
        let backend = InMemoryLease::new();
        assert!(backend
            .try_acquire("TEST_LOCK", "other", Duration::from_secs(60))
            .unwrap());

        let err = acquire(&backend, &fast_lock(50)).err().unwrap();
        assert!(matches!(err, ReportError::LockTimeout { .. }));
        assert_eq!(backend.holder("TEST_LOCK").as_deref(), Some("other"));
    }

    #[test]
    fn test_expired_lease_can_be_taken() {
        let backend = InMemoryLease::new();
        assert!(backend
            .try_acquire("TEST_LOCK", "crashed", Duration::from_millis(1))
            .unwrap());
        thread::sleep(Duration::from_millis(5));
        assert!(acquire(&backend, &fast_lock(100)).is_ok());
    }

    #[test]
    fn test_release_ignores_foreign_token() {
        let backend = InMemoryLease::new();
        backend
            .try_acquire("TEST_LOCK", "owner", Duration::from_secs(60))
            .unwrap();
        backend.release("TEST_LOCK", "intruder").unwrap();
        assert_eq!(backend.holder("TEST_LOCK").as_deref(), Some("owner"));
    }
}
