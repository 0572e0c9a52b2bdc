//! Session commands

use anyhow::Result;
use ledgerline_business::{SessionConfig, SessionManager};
use ledgerline_persistence::Database;
use std::sync::Arc;
use std::time::Duration;

fn manager(db: &Database, config: SessionConfig) -> Result<SessionManager> {
    Ok(SessionManager::new(Arc::new(db.store()), config)?)
}

/// Issue a session and enforce the limit
pub async fn login(db: &Database, config: SessionConfig, owner: &str) -> Result<()> {
    let outcome = manager(db, config)?.login(owner).await?;

    println!("✅ Logged in {}", owner);
    println!("   Token:   {}", outcome.session.token);
    println!("   Expires: {}", outcome.session.expires_at.to_rfc3339());
    if outcome.evicted > 0 {
        println!("   Evicted: {} older session(s)", outcome.evicted);
    }
    Ok(())
}

pub async fn validate(db: &Database, config: SessionConfig, token: &str) -> Result<()> {
    match manager(db, config)?.validate(token).await? {
        Some(session) => {
            println!("✅ Valid session");
            println!("   Owner:   {}", session.owner_id);
            println!("   Expires: {}", session.expires_at.to_rfc3339());
        }
        None => println!("❌ Invalid or expired token"),
    }
    Ok(())
}

pub async fn logout(db: &Database, config: SessionConfig, token: &str) -> Result<()> {
    if manager(db, config)?.invalidate(token).await? {
        println!("👋 Session invalidated");
    } else {
        println!("Session was already gone");
    }
    Ok(())
}

pub async fn list(db: &Database, config: SessionConfig, owner: &str) -> Result<()> {
    let sessions = manager(db, config)?.list_active(owner).await?;
    if sessions.is_empty() {
        println!("No active sessions for {}", owner);
        return Ok(());
    }

    println!("{:<38} {:<26} {:<26}", "SESSION", "CREATED", "EXPIRES");
    println!("{}", "-".repeat(90));
    for s in sessions {
        println!(
            "{:<38} {:<26} {:<26}",
            s.id,
            s.created_at.to_rfc3339(),
            s.expires_at.to_rfc3339()
        );
    }
    Ok(())
}

/// One sweep, or a periodic sweep until Ctrl-C
pub async fn sweep(db: &Database, config: SessionConfig, every: Option<u64>) -> Result<()> {
    let sessions = manager(db, config)?;

    match every {
        None => {
            let removed = sessions.cleanup_expired().await?;
            println!("🧹 Removed {} expired session(s)", removed);
        }
        Some(secs) => {
            println!("🧹 Sweeping every {}s, Ctrl-C to stop", secs);
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                }
            };
            let removed = sessions
                .run_sweeper(Duration::from_secs(secs.max(1)), shutdown)
                .await;
            println!("🧹 Removed {} expired session(s) in total", removed);
        }
    }
    Ok(())
}
