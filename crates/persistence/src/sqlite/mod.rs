//! SQLite persistence module
//!
//! Repository pattern cho SQLite database access.

pub mod repos;
pub mod schema;
pub mod store;

pub use repos::{
    create_pool, run_migrations, AccountRepo, SessionRepo, TransactionRepo,
    BUSY_TIMEOUT, DEFAULT_MAX_CONNECTIONS,
};
pub use schema::{AccountRow, SessionRow, TransactionRow};
pub use store::SqliteStore;
