//! CLI command handlers

pub mod account;
pub mod audit;
pub mod funding;
pub mod session;

use ledgerline_business::{FundingCoordinator, LedgerConfig};
use ledgerline_persistence::Database;
use std::sync::Arc;

/// Funding coordinator wired to the database store
pub(crate) fn coordinator(db: &Database) -> anyhow::Result<FundingCoordinator> {
    Ok(FundingCoordinator::new(Arc::new(db.store()), LedgerConfig::default())?)
}
