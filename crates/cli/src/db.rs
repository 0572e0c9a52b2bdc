//! Database initialization and status

use anyhow::{Context, Result};
use ledgerline_persistence::Database;
use std::path::Path;

fn database_url(db_path: &Path) -> String {
    format!("sqlite:{}", db_path.display())
}

/// Initialize the database with schema
pub async fn init_database(db_path: &Path, force: bool) -> Result<()> {
    if force && db_path.exists() {
        remove_database_files(db_path)?;
        println!("🗑️  Removed existing database");
    }

    println!("📦 Applying migrations...");
    let db = Database::init(&database_url(db_path))
        .await
        .context("Failed to initialize database")?;
    db.close().await;
    Ok(())
}

/// Xóa file database cùng các file WAL đi kèm (`-wal`, `-shm`)
fn remove_database_files(db_path: &Path) -> Result<()> {
    std::fs::remove_file(db_path).context("Failed to remove existing database")?;

    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.as_os_str().to_owned();
        side.push(suffix);
        let side = Path::new(&side);
        if side.exists() {
            std::fs::remove_file(side)
                .with_context(|| format!("Failed to remove {}", side.display()))?;
        }
    }
    Ok(())
}

/// Show database status
pub async fn show_status(db: &Database) -> Result<()> {
    let stats = db.stats().await.context("Failed to read database stats")?;

    println!("📊 Database Status");
    println!();
    println!("   Sessions:     {}", stats.sessions);
    println!("   Accounts:     {}", stats.accounts);
    println!("   Transactions: {}", stats.transactions);
    Ok(())
}

/// Connect to an initialized database
pub async fn connect(db_path: &Path) -> Result<Database> {
    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {:?}. Run 'ledgerline init' first.",
            db_path
        );
    }
    Database::open(&database_url(db_path))
        .await
        .context("Failed to connect to database. Run 'ledgerline init' first.")
}
