//! # Ledgerline Business
//!
//! Session lifecycle and funding coordination on top of the store contracts.

pub mod config;
pub mod error;
pub mod funding;
pub mod session;

pub use config::{LedgerConfig, SessionConfig, MAX_SESSION_TTL_SECS};
pub use error::{BusinessError, BusinessResult, ErrorKind};
pub use funding::{FundingCoordinator, FundingReceipt, Reconciliation};
pub use session::{LoginOutcome, SessionManager};
