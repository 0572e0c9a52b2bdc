//! # Ledgerline Core
//!
//! Domain types cho Ledgerline: Session, Account, Transaction, Amount.
//! Không phụ thuộc vào database hay runtime.

pub mod account;
pub mod clock;
pub mod error;
pub mod money;
pub mod session;
pub mod token;
pub mod transaction;

pub use account::{Account, AccountStatus, AccountType};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use money::{from_minor_units, to_minor_units, Amount, CURRENCY_SCALE};
pub use session::Session;
pub use token::{check_token_shape, generate_account_number, generate_session_token};
pub use transaction::{Transaction, TransactionKind, TransactionStatus};
