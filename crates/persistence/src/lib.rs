//! # Ledgerline Persistence
//!
//! Persistence layer cho Ledgerline - SQLite qua sqlx.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Database                             │
//! │  ┌─────────────┐    ┌──────────────────┐    ┌─────────────┐  │
//! │  │   SQLite    │    │   SqliteStore    │    │    Repos    │  │
//! │  │  (pool)     │    │ (store contracts)│    │  (queries)  │  │
//! │  └─────────────┘    └──────────────────┘    └─────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledgerline_persistence::Database;
//!
//! // Open + migrate
//! let db = Database::init("sqlite:data/ledgerline.db").await?;
//!
//! // Inject the store into components
//! let store = db.store();
//!
//! // Release connections explicitly
//! db.close().await;
//! ```

pub mod error;
pub mod sqlite;
pub mod store;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::{
    create_pool, run_migrations, AccountRepo, SessionRepo, SqliteStore,
    TransactionRepo, DEFAULT_MAX_CONNECTIONS,
};
pub use sqlite::schema::{AccountRow, SessionRow, TransactionRow};
pub use store::{LedgerStore, LedgerTotals, SessionStore};

use sqlx::SqlitePool;

/// Thống kê số lượng record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    pub sessions: i64,
    pub accounts: i64,
    pub transactions: i64,
}

/// Database facade - owns the connection pool.
///
/// Open it once, hand [`Database::store`] to each component and call
/// [`Database::close`] on shutdown.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open database connection (không chạy migrations)
    ///
    /// # Arguments
    /// * `db_url` - SQLite database URL (e.g., "sqlite:ledgerline.db")
    pub async fn open(db_url: &str) -> PersistenceResult<Self> {
        Self::open_with(db_url, DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn open_with(db_url: &str, max_connections: u32) -> PersistenceResult<Self> {
        let pool = sqlite::create_pool(db_url, max_connections).await?;
        tracing::debug!(url = db_url, max_connections, "Database opened");
        Ok(Self { pool })
    }

    /// Open database and apply migrations
    pub async fn init(db_url: &str) -> PersistenceResult<Self> {
        let db = Self::open(db_url).await?;
        if let Err(e) = run_migrations(&db.pool).await {
            db.close().await;
            return Err(e);
        }
        Ok(db)
    }

    /// Get SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store handle sharing this database's pool
    pub fn store(&self) -> SqliteStore {
        SqliteStore::new(self.pool.clone())
    }

    pub async fn stats(&self) -> PersistenceResult<DatabaseStats> {
        Ok(DatabaseStats {
            sessions: SessionRepo::count(&self.pool).await?,
            accounts: AccountRepo::count(&self.pool).await?,
            transactions: TransactionRepo::count(&self.pool).await?,
        })
    }

    /// Close all connections. Outstanding store clones stop working.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::debug!("Database closed");
    }
}
