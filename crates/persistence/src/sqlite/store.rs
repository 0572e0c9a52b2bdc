//! SQLite implementation của các store contract.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::repos::{AccountRepo, SessionRepo, TransactionRepo};
use crate::sqlite::schema::{to_millis, AccountRow, SessionRow, TransactionRow};
use crate::store::{LedgerStore, LedgerTotals, SessionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledgerline_core::{Account, AccountType, Session, Transaction, TransactionKind};
use sqlx::SqlitePool;

/// Store dùng chung một `SqlitePool`.
///
/// Cloning is cheap; every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn into_sessions(rows: Vec<SessionRow>) -> PersistenceResult<Vec<Session>> {
    rows.into_iter().map(Session::try_from).collect()
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn insert_session(&self, session: &Session) -> PersistenceResult<()> {
        SessionRepo::insert(&self.pool, &SessionRow::from(session)).await
    }

    async fn find_session(&self, token: &str) -> PersistenceResult<Option<Session>> {
        SessionRepo::get_by_token(&self.pool, token)
            .await?
            .map(Session::try_from)
            .transpose()
    }

    async fn delete_session(&self, token: &str) -> PersistenceResult<bool> {
        SessionRepo::delete_by_token(&self.pool, token).await
    }

    async fn delete_session_if_expired(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> PersistenceResult<bool> {
        SessionRepo::delete_if_expired(&self.pool, token, to_millis(now)).await
    }

    async fn active_sessions(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> PersistenceResult<Vec<Session>> {
        let rows = SessionRepo::get_active_by_owner(&self.pool, owner_id, to_millis(now)).await?;
        into_sessions(rows)
    }

    async fn evict_oldest_sessions(
        &self,
        owner_id: &str,
        keep_token: &str,
        limit: usize,
    ) -> PersistenceResult<u64> {
        let limit = i64::try_from(limit)
            .map_err(|_| PersistenceError::InvalidValue(format!("session limit {}", limit)))?;
        SessionRepo::delete_oldest_over_limit(&self.pool, owner_id, keep_token, limit).await
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> PersistenceResult<u64> {
        SessionRepo::delete_expired(&self.pool, to_millis(now)).await
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn insert_account(&self, account: &Account) -> PersistenceResult<()> {
        let row = AccountRow::try_from(account)?;
        match AccountRepo::insert(&self.pool, &row).await {
            Err(PersistenceError::UniqueViolation(msg)) if msg.contains("account_type") => Err(
                PersistenceError::already_exists(
                    "Account",
                    &format!("{}/{}", account.owner_id, account.account_type),
                ),
            ),
            other => other,
        }
    }

    async fn find_account(&self, account_id: &str) -> PersistenceResult<Option<Account>> {
        AccountRepo::get_by_id(&self.pool, account_id)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_account_by_owner_and_type(
        &self,
        owner_id: &str,
        account_type: AccountType,
    ) -> PersistenceResult<Option<Account>> {
        AccountRepo::get_by_owner_and_type(&self.pool, owner_id, account_type.as_str())
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn account_number_exists(&self, account_number: &str) -> PersistenceResult<bool> {
        AccountRepo::number_exists(&self.pool, account_number).await
    }

    async fn accounts_for_owner(&self, owner_id: &str) -> PersistenceResult<Vec<Account>> {
        AccountRepo::get_by_owner(&self.pool, owner_id)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    async fn record_deposit(&self, tx: &Transaction) -> PersistenceResult<Account> {
        if tx.kind != TransactionKind::Deposit {
            return Err(PersistenceError::PreconditionFailed(format!(
                "expected a deposit, got {}",
                tx.kind
            )));
        }

        // Dropping `unit` without commit rolls everything back.
        let mut unit = self.pool.begin().await?;

        TransactionRepo::insert(&mut *unit, &TransactionRow::from(tx)).await?;

        let credited =
            AccountRepo::credit_active(&mut *unit, &tx.account_id, tx.amount.minor_units()).await?;
        if !credited {
            return Err(PersistenceError::PreconditionFailed(format!(
                "account {} is missing or not active",
                tx.account_id
            )));
        }

        let row = AccountRepo::get_by_id(&mut *unit, &tx.account_id)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Account", &tx.account_id))?;
        let account = Account::try_from(row)?;

        unit.commit().await?;
        Ok(account)
    }

    async fn transactions_for_account(&self, account_id: &str) -> PersistenceResult<Vec<Transaction>> {
        TransactionRepo::get_by_account(&self.pool, account_id)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    async fn ledger_totals(&self, account_id: &str) -> PersistenceResult<Option<LedgerTotals>> {
        let totals = AccountRepo::balance_and_ledger_sum(&self.pool, account_id)
            .await?
            .map(|(balance, ledger_sum)| LedgerTotals { balance, ledger_sum });
        Ok(totals)
    }
}
