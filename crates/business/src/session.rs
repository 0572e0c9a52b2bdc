//! Session lifecycle - issue, validate, invalidate, limit, sweep
//!
//! The store is the only source of truth; the manager holds no session
//! state of its own. Expiry is boundary-inclusive (`now >= expires_at`) and
//! is discovered lazily by `validate` as well as by the bulk sweep.

use crate::config::SessionConfig;
use crate::error::{BusinessError, BusinessResult};
use chrono::{DateTime, SubsecRound, Utc};
use ledgerline_core::{check_token_shape, generate_session_token, Clock, Session, SystemClock};
use ledgerline_persistence::SessionStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

/// Result of [`SessionManager::login`]
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    /// Older sessions of the same owner removed by the limit
    pub evicted: u64,
}

/// Session Lifecycle Manager
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> BusinessResult<Self> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn SessionStore>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> BusinessResult<Self> {
        config.validate()?;
        Ok(Self { store, clock, config })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // Store precision is milliseconds.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(3)
    }

    /// Create a session with a fresh token. Does not enforce the limit.
    pub async fn issue(&self, owner_id: &str) -> BusinessResult<Session> {
        if owner_id.trim().is_empty() {
            return Err(BusinessError::Validation("owner id must not be empty".to_string()));
        }

        let token = generate_session_token();
        let session = Session::new(owner_id, token, self.now(), self.config.ttl())?;
        self.store.insert_session(&session).await?;

        tracing::debug!(
            owner_id,
            session_id = %session.id,
            expires_at = %session.expires_at,
            "Session issued"
        );
        Ok(session)
    }

    /// Look up a token.
    ///
    /// Returns `None` for unknown tokens and for expired ones; an expired
    /// record is deleted as a side effect.
    pub async fn validate(&self, token: &str) -> BusinessResult<Option<Session>> {
        check_token_shape(token)?;

        let Some(session) = self.store.find_session(token).await? else {
            return Ok(None);
        };

        let now = self.now();
        if session.is_expired_at(now) {
            // Idempotent: the sweep may already have removed it.
            let removed = self.store.delete_session_if_expired(token, now).await?;
            tracing::debug!(
                owner_id = %session.owner_id,
                session_id = %session.id,
                removed,
                "Expired session rejected"
            );
            return Ok(None);
        }

        if session.is_near_expiry_at(now, self.config.expiry_warning()) {
            tracing::warn!(
                owner_id = %session.owner_id,
                session_id = %session.id,
                remaining_secs = session.remaining_at(now).num_seconds(),
                "Session close to expiry"
            );
        }

        Ok(Some(session))
    }

    /// Logout. `false` when the token is unknown or already gone.
    pub async fn invalidate(&self, token: &str) -> BusinessResult<bool> {
        check_token_shape(token)?;
        let removed = self.store.delete_session(token).await?;
        tracing::debug!(removed, "Session invalidated");
        Ok(removed)
    }

    /// Sessions with `expires_at > now`, oldest first.
    pub async fn list_active(&self, owner_id: &str) -> BusinessResult<Vec<Session>> {
        Ok(self.store.active_sessions(owner_id, self.now()).await?)
    }

    /// Evict the owner's oldest sessions (never `keep_token`) down to the
    /// configured limit. Returns the number evicted.
    pub async fn enforce_limit(&self, owner_id: &str, keep_token: &str) -> BusinessResult<u64> {
        let evicted = self
            .store
            .evict_oldest_sessions(owner_id, keep_token, self.config.max_sessions_per_owner)
            .await?;

        if evicted > 0 {
            tracing::info!(
                owner_id,
                evicted,
                limit = self.config.max_sessions_per_owner,
                "Evicted sessions over limit"
            );
        }
        Ok(evicted)
    }

    /// Issue a session, then enforce the limit keeping the new one.
    ///
    /// These are two separate store units; a concurrent login for the same
    /// owner can briefly leave two sessions until the next enforcement.
    pub async fn login(&self, owner_id: &str) -> BusinessResult<LoginOutcome> {
        let session = self.issue(owner_id).await?;
        let evicted = self.enforce_limit(owner_id, &session.token).await?;
        Ok(LoginOutcome { session, evicted })
    }

    /// Bulk delete of every expired session.
    pub async fn cleanup_expired(&self) -> BusinessResult<u64> {
        let removed = self.store.delete_expired_sessions(self.now()).await?;
        if removed > 0 {
            tracing::info!(removed, "Expired sessions cleaned up");
        } else {
            tracing::debug!("No expired sessions to clean up");
        }
        Ok(removed)
    }

    /// Run `cleanup_expired` every `every` until `shutdown` resolves.
    ///
    /// Sweep failures are logged and the loop keeps going. Returns the total
    /// number of sessions removed.
    pub async fn run_sweeper<F>(&self, every: StdDuration, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut total = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(total, "Session sweeper stopped");
                    return total;
                }
                _ = ticker.tick() => {
                    match self.cleanup_expired().await {
                        Ok(removed) => total += removed,
                        Err(e) => tracing::error!(error = %e, "Session sweep failed"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ledgerline_persistence::{PersistenceError, PersistenceResult};

    /// Store không bao giờ được gọi tới
    struct UnreachableStore;

    #[async_trait]
    impl SessionStore for UnreachableStore {
        async fn insert_session(&self, _: &Session) -> PersistenceResult<()> {
            Err(PersistenceError::InvalidValue("unreachable".into()))
        }
        async fn find_session(&self, _: &str) -> PersistenceResult<Option<Session>> {
            Err(PersistenceError::InvalidValue("unreachable".into()))
        }
        async fn delete_session(&self, _: &str) -> PersistenceResult<bool> {
            Err(PersistenceError::InvalidValue("unreachable".into()))
        }
        async fn delete_session_if_expired(&self, _: &str, _: DateTime<Utc>) -> PersistenceResult<bool> {
            Err(PersistenceError::InvalidValue("unreachable".into()))
        }
        async fn active_sessions(&self, _: &str, _: DateTime<Utc>) -> PersistenceResult<Vec<Session>> {
            Err(PersistenceError::InvalidValue("unreachable".into()))
        }
        async fn evict_oldest_sessions(&self, _: &str, _: &str, _: usize) -> PersistenceResult<u64> {
            Err(PersistenceError::InvalidValue("unreachable".into()))
        }
        async fn delete_expired_sessions(&self, _: DateTime<Utc>) -> PersistenceResult<u64> {
            Err(PersistenceError::InvalidValue("unreachable".into()))
        }
    }

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(UnreachableStore), SessionConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_malformed_token_rejected_before_store() {
        let mgr = manager();
        let err = mgr.validate("not-a-token").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ValidationFailure);

        let err = mgr.invalidate("").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ValidationFailure);
    }

    #[tokio::test]
    async fn test_empty_owner_rejected() {
        let err = manager().issue("  ").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ValidationFailure);
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let err = manager().cleanup_expired().await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::StorageFailure);
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let config = SessionConfig {
            ttl_secs: 1_000_000_000_000_000,
            ..SessionConfig::default()
        };
        let err = SessionManager::new(Arc::new(UnreachableStore), config).err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::ValidationFailure);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SessionConfig {
            ttl_secs: 0,
            ..SessionConfig::default()
        };
        assert!(SessionManager::new(Arc::new(UnreachableStore), config).is_err());
    }
}
