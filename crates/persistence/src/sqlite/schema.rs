//! Database schema definitions
//!
//! Row types cho sqlx mapping từ SQLite tables.
//! Schema được định nghĩa trong migrations/20261018000000_init.sql
//!
//! Thời gian lưu dưới dạng epoch milliseconds (INTEGER), tiền lưu dưới dạng
//! minor units (INTEGER).

use crate::error::{PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use ledgerline_core::{
    from_minor_units, to_minor_units, Account, AccountStatus, AccountType, Amount, Session,
    Transaction, TransactionKind, TransactionStatus,
};
use serde::{Deserialize, Serialize};

/// Row type cho bảng `sessions`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: String,
    pub owner_id: String,
    pub token: String,
    pub created_at: i64,
    pub expires_at: i64,
}

/// Row type cho bảng `accounts`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AccountRow {
    pub id: String,
    pub owner_id: String,
    pub account_number: String,
    pub account_type: String,
    pub balance: i64, // minor units
    pub status: String,
    pub created_at: i64,
}

/// Row type cho bảng `transactions`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub account_id: String,
    pub kind: String,
    pub amount: i64, // minor units
    pub description: String,
    pub status: String,
    pub created_at: i64,
    pub processed_at: Option<i64>,
}

// === Time conversion ===

pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub fn from_millis(ms: i64) -> PersistenceResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or(PersistenceError::InvalidTimestamp(ms))
}

// === Conversion implementations ===

impl From<&Session> for SessionRow {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            owner_id: session.owner_id.clone(),
            token: session.token.clone(),
            created_at: to_millis(session.created_at),
            expires_at: to_millis(session.expires_at),
        }
    }
}

impl TryFrom<SessionRow> for Session {
    type Error = PersistenceError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            id: row.id,
            owner_id: row.owner_id,
            token: row.token,
            created_at: from_millis(row.created_at)?,
            expires_at: from_millis(row.expires_at)?,
        })
    }
}

impl TryFrom<&Account> for AccountRow {
    type Error = PersistenceError;

    fn try_from(account: &Account) -> Result<Self, Self::Error> {
        let balance = to_minor_units(account.balance)
            .map_err(|e| PersistenceError::InvalidValue(e.to_string()))?;
        Ok(Self {
            id: account.id.clone(),
            owner_id: account.owner_id.clone(),
            account_number: account.account_number.clone(),
            account_type: account.account_type.as_str().to_string(),
            balance,
            status: account.status.as_str().to_string(),
            created_at: to_millis(account.created_at),
        })
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = PersistenceError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let account_type = AccountType::from_str(&row.account_type)
            .ok_or_else(|| PersistenceError::invalid_enum("account_type", &row.account_type))?;
        let status = AccountStatus::from_str(&row.status)
            .ok_or_else(|| PersistenceError::invalid_enum("status", &row.status))?;
        if row.balance < 0 {
            return Err(PersistenceError::InvalidValue(format!(
                "negative balance {} on account {}",
                row.balance, row.id
            )));
        }

        Ok(Account {
            id: row.id,
            owner_id: row.owner_id,
            account_number: row.account_number,
            account_type,
            balance: from_minor_units(row.balance),
            status,
            created_at: from_millis(row.created_at)?,
        })
    }
}

impl From<&Transaction> for TransactionRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            account_id: tx.account_id.clone(),
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount.minor_units(),
            description: tx.description.clone(),
            status: tx.status.as_str().to_string(),
            created_at: to_millis(tx.created_at),
            processed_at: tx.processed_at.map(to_millis),
        }
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = PersistenceError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let kind = TransactionKind::from_str(&row.kind)
            .ok_or_else(|| PersistenceError::invalid_enum("kind", &row.kind))?;
        let status = TransactionStatus::from_str(&row.status)
            .ok_or_else(|| PersistenceError::invalid_enum("status", &row.status))?;
        let amount = Amount::from_minor_units(row.amount)
            .map_err(|e| PersistenceError::InvalidValue(e.to_string()))?;

        Ok(Transaction {
            id: row.id,
            account_id: row.account_id,
            kind,
            amount,
            description: row.description,
            status,
            created_at: from_millis(row.created_at)?,
            processed_at: row.processed_at.map(from_millis).transpose()?,
        })
    }
}
