//! Store contracts.
//!
//! The business layer only talks to storage through these traits. Every
//! method is a single atomic unit from the caller's point of view:
//! implementations must not expose partial writes to concurrent readers.

use crate::error::PersistenceResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledgerline_core::{Account, AccountType, Session, Transaction};

/// Durable keyed storage for session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> PersistenceResult<()>;

    /// Point lookup by the unique token.
    async fn find_session(&self, token: &str) -> PersistenceResult<Option<Session>>;

    /// Returns false when nothing matched.
    async fn delete_session(&self, token: &str) -> PersistenceResult<bool>;

    /// Deletes the session only if it is still expired at `now`.
    async fn delete_session_if_expired(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> PersistenceResult<bool>;

    /// Sessions with `expires_at > now`, oldest first.
    async fn active_sessions(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> PersistenceResult<Vec<Session>>;

    /// Evicts the owner's oldest sessions, never `keep_token`, until at most
    /// `limit` remain. Returns the number evicted.
    async fn evict_oldest_sessions(
        &self,
        owner_id: &str,
        keep_token: &str,
        limit: usize,
    ) -> PersistenceResult<u64>;

    /// Bulk delete of every session with `expires_at <= now`.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> PersistenceResult<u64>;
}

/// Cached balance next to the balance recomputed from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTotals {
    /// `accounts.balance`, minor units
    pub balance: i64,
    /// Signed sum over the account's transactions, minor units
    pub ledger_sum: i64,
}

/// Durable storage for accounts and the append-only transaction ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fails with a conflict error on a duplicate `(owner, type)` or account
    /// number.
    async fn insert_account(&self, account: &Account) -> PersistenceResult<()>;

    async fn find_account(&self, account_id: &str) -> PersistenceResult<Option<Account>>;

    async fn find_account_by_owner_and_type(
        &self,
        owner_id: &str,
        account_type: AccountType,
    ) -> PersistenceResult<Option<Account>>;

    async fn account_number_exists(&self, account_number: &str) -> PersistenceResult<bool>;

    async fn accounts_for_owner(&self, owner_id: &str) -> PersistenceResult<Vec<Account>>;

    /// Inserts `tx`, credits its amount to the account with a store-side
    /// increment and returns the account row as read inside the same unit.
    /// Either everything commits or nothing does.
    async fn record_deposit(&self, tx: &Transaction) -> PersistenceResult<Account>;

    /// Transactions of one account, newest first.
    async fn transactions_for_account(&self, account_id: &str) -> PersistenceResult<Vec<Transaction>>;

    /// `None` when the account does not exist.
    async fn ledger_totals(&self, account_id: &str) -> PersistenceResult<Option<LedgerTotals>>;
}
