//! Repository implementations cho SQLite
//!
//! Query cho từng table. Các hàm nhận `Executor` để dùng được cả với
//! `&SqlitePool` lẫn connection bên trong một transaction.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Session Repository
// ============================================================================

/// Repository cho sessions table
pub struct SessionRepo;

impl SessionRepo {
    /// Thêm session mới
    pub async fn insert<'e, E>(executor: E, row: &SessionRow) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            "INSERT INTO sessions (id, owner_id, token, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.owner_id)
        .bind(&row.token)
        .bind(row.created_at)
        .bind(row.expires_at)
        .execute(executor)
        .await
        .map_err(PersistenceError::from_write)?;
        Ok(())
    }

    /// Lấy session theo token
    pub async fn get_by_token<'e, E>(executor: E, token: &str) -> PersistenceResult<Option<SessionRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Xóa session theo token, trả về true nếu có row bị xóa
    pub async fn delete_by_token<'e, E>(executor: E, token: &str) -> PersistenceResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Xóa session theo token chỉ khi nó đã hết hạn tại `now_ms`
    pub async fn delete_if_expired<'e, E>(
        executor: E,
        token: &str,
        now_ms: i64,
    ) -> PersistenceResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ? AND expires_at <= ?")
            .bind(token)
            .bind(now_ms)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sessions còn hiệu lực của owner (expires_at > now), cũ nhất trước
    pub async fn get_active_by_owner<'e, E>(
        executor: E,
        owner_id: &str,
        now_ms: i64,
    ) -> PersistenceResult<Vec<SessionRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT * FROM sessions
            WHERE owner_id = ? AND expires_at > ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(owner_id)
        .bind(now_ms)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Xóa các session cũ nhất của owner (trừ `keep_token`) cho đến khi
    /// số session còn lại bằng `limit`.
    ///
    /// Count and delete run as one statement, so a concurrent insert can
    /// never be counted but not considered for deletion.
    pub async fn delete_oldest_over_limit<'e, E>(
        executor: E,
        owner_id: &str,
        keep_token: &str,
        limit: i64,
    ) -> PersistenceResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        // LIMIT âm trong SQLite nghĩa là không giới hạn, nên phải chặn ở 0
        let result = sqlx::query(
            r#"
            DELETE FROM sessions WHERE id IN (
                SELECT id FROM sessions
                WHERE owner_id = ?1 AND token <> ?2
                ORDER BY created_at ASC, rowid ASC
                LIMIT max((SELECT COUNT(*) FROM sessions WHERE owner_id = ?1) - ?3, 0)
            )
            "#,
        )
        .bind(owner_id)
        .bind(keep_token)
        .bind(limit)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Bulk delete mọi session có expires_at <= now
    pub async fn delete_expired<'e, E>(executor: E, now_ms: i64) -> PersistenceResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now_ms)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Đếm sessions
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Account Repository
// ============================================================================

/// Repository cho accounts table
pub struct AccountRepo;

impl AccountRepo {
    /// Lấy account theo ID
    pub async fn get_by_id<'e, E>(executor: E, id: &str) -> PersistenceResult<Option<AccountRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Lấy account theo owner và loại
    pub async fn get_by_owner_and_type<'e, E>(
        executor: E,
        owner_id: &str,
        account_type: &str,
    ) -> PersistenceResult<Option<AccountRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE owner_id = ? AND account_type = ?",
        )
        .bind(owner_id)
        .bind(account_type)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Lấy tất cả accounts của owner
    pub async fn get_by_owner<'e, E>(executor: E, owner_id: &str) -> PersistenceResult<Vec<AccountRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE owner_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(owner_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Kiểm tra account number đã tồn tại chưa
    pub async fn number_exists<'e, E>(executor: E, account_number: &str) -> PersistenceResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM accounts WHERE account_number = ?)")
                .bind(account_number)
                .fetch_one(executor)
                .await?;
        Ok(row.0 != 0)
    }

    /// Thêm account mới
    pub async fn insert<'e, E>(executor: E, row: &AccountRow) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, owner_id, account_number, account_type, balance, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.owner_id)
        .bind(&row.account_number)
        .bind(&row.account_type)
        .bind(row.balance)
        .bind(&row.status)
        .bind(row.created_at)
        .execute(executor)
        .await
        .map_err(PersistenceError::from_write)?;
        Ok(())
    }

    /// Cộng `amount` minor units vào balance bằng một UPDATE phía store.
    ///
    /// Only active accounts are credited; returns false when no row matched.
    pub async fn credit_active<'e, E>(executor: E, id: &str, amount: i64) -> PersistenceResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE accounts SET balance = balance + ? WHERE id = ? AND status = 'active'",
        )
        .bind(amount)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Cập nhật status
    pub async fn update_status<'e, E>(executor: E, id: &str, status: &str) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE accounts SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Account", id));
        }
        Ok(())
    }

    /// Balance đã cache và tổng có dấu của ledger, đọc trong cùng một statement
    pub async fn balance_and_ledger_sum<'e, E>(
        executor: E,
        id: &str,
    ) -> PersistenceResult<Option<(i64, i64)>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: Option<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT a.balance,
                   COALESCE(SUM(CASE t.kind WHEN 'withdrawal' THEN -t.amount ELSE t.amount END), 0)
            FROM accounts a
            LEFT JOIN transactions t ON t.account_id = a.id
            WHERE a.id = ?
            GROUP BY a.id
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Đếm accounts
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Transaction Repository
// ============================================================================

/// Repository cho transactions table
pub struct TransactionRepo;

impl TransactionRepo {
    /// Thêm transaction mới
    pub async fn insert<'e, E>(executor: E, tx: &TransactionRow) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, account_id, kind, amount, description, status, created_at, processed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.account_id)
        .bind(&tx.kind)
        .bind(tx.amount)
        .bind(&tx.description)
        .bind(&tx.status)
        .bind(tx.created_at)
        .bind(tx.processed_at)
        .execute(executor)
        .await
        .map_err(PersistenceError::from_write)?;
        Ok(())
    }

    /// Lấy transactions theo account, mới nhất trước.
    ///
    /// The account filter is applied before ordering; ties on `created_at`
    /// fall back to insertion order.
    pub async fn get_by_account<'e, E>(
        executor: E,
        account_id: &str,
    ) -> PersistenceResult<Vec<TransactionRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE account_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Đếm transactions
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Database initialization
// ============================================================================

/// Số connection mặc định của pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// Thời gian chờ khi database đang bị khóa bởi writer khác
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Khởi tạo database connection pool.
///
/// WAL lets readers proceed while one writer commits; the busy timeout makes
/// concurrent writers queue instead of failing with SQLITE_BUSY.
pub async fn create_pool(database_url: &str, max_connections: u32) -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Chạy migrations
pub async fn run_migrations(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}
