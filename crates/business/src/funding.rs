//! Funding coordinator - account creation, deposits, ledger reads
//!
//! `balance` on an account is a cache of the signed ledger sum. The only
//! write path is [`FundingCoordinator::fund`], which delegates the
//! transaction insert, the balance increment and the read-back to a single
//! store unit.

use crate::config::LedgerConfig;
use crate::error::{BusinessError, BusinessResult};
use chrono::{DateTime, SubsecRound, Utc};
use ledgerline_core::{
    from_minor_units, generate_account_number, Account, AccountType, Amount, Clock, SystemClock,
    Transaction,
};
use ledgerline_persistence::{LedgerStore, PersistenceError};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Result of a successful funding call
#[derive(Debug, Clone)]
pub struct FundingReceipt {
    pub transaction: Transaction,
    /// Balance as read inside the committing unit
    pub new_balance: Decimal,
}

/// Cached balance vs. ledger sum for one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub account_id: String,
    pub balance: Decimal,
    pub ledger_sum: Decimal,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.balance == self.ledger_sum
    }
}

/// Funding Coordinator - handles account creation and deposits
pub struct FundingCoordinator {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl FundingCoordinator {
    pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> BusinessResult<Self> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn LedgerStore>,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> BusinessResult<Self> {
        config.validate()?;
        Ok(Self { store, clock, config })
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(3)
    }

    /// Open an account of `account_type` for `owner_id`.
    ///
    /// One account per owner and type. The account number is drawn from the
    /// OS CSPRNG and re-drawn until the store reports it unused.
    pub async fn create_account(
        &self,
        owner_id: &str,
        account_type: AccountType,
    ) -> BusinessResult<Account> {
        if owner_id.trim().is_empty() {
            return Err(BusinessError::Validation("owner id must not be empty".to_string()));
        }

        if self
            .store
            .find_account_by_owner_and_type(owner_id, account_type)
            .await?
            .is_some()
        {
            return Err(duplicate_account(owner_id, account_type));
        }

        let mut created = None;
        for attempt in 1..=self.config.max_number_attempts {
            let number = generate_account_number(self.config.account_number_length)?;
            if self.store.account_number_exists(&number).await? {
                tracing::debug!(attempt, "Account number collision, drawing again");
                continue;
            }

            let account = Account::open(owner_id, account_type, number, self.now());
            match self.store.insert_account(&account).await {
                Ok(()) => {
                    created = Some(account);
                    break;
                }
                Err(PersistenceError::AlreadyExists { .. }) => {
                    return Err(duplicate_account(owner_id, account_type));
                }
                // Another writer took the number between the check and the insert.
                Err(PersistenceError::UniqueViolation(msg)) => {
                    tracing::debug!(attempt, %msg, "Account number taken concurrently");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let Some(account) = created else {
            return Err(BusinessError::Conflict(format!(
                "no unique account number after {} attempts",
                self.config.max_number_attempts
            )));
        };

        let stored = match self.store.find_account(&account.id).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                return Err(BusinessError::Internal(format!(
                    "account {} was inserted but could not be read back",
                    account.id
                )));
            }
            Err(e) => {
                return Err(BusinessError::Internal(format!(
                    "account {} was inserted but reading it back failed: {}",
                    account.id, e
                )));
            }
        };

        tracing::info!(
            owner_id,
            account_id = %stored.id,
            account_type = %stored.account_type,
            "Account created"
        );
        Ok(stored)
    }

    /// Deposit `amount` into an active account owned by `caller_owner_id`.
    pub async fn fund(
        &self,
        account_id: &str,
        amount: Decimal,
        source: &str,
        caller_owner_id: &str,
    ) -> BusinessResult<FundingReceipt> {
        let amount = Amount::new(amount)?;
        if source.trim().is_empty() {
            return Err(BusinessError::Validation("funding source must not be empty".to_string()));
        }

        let account = self.owned_account(account_id, caller_owner_id).await?;
        if !account.is_active() {
            return Err(BusinessError::account_not_active(account_id, account.status.as_str()));
        }

        let tx = Transaction::deposit(account_id, amount, source, self.now());
        let updated = match self.store.record_deposit(&tx).await {
            Ok(updated) => updated,
            // Status changed after the check above.
            Err(PersistenceError::PreconditionFailed(msg)) => {
                return Err(BusinessError::InvalidState(msg));
            }
            Err(e) => {
                tracing::error!(account_id, error = %e, "Funding unit rolled back");
                return Err(e.into());
            }
        };

        tracing::info!(
            account_id,
            transaction_id = %tx.id,
            amount = %amount,
            new_balance = %updated.balance,
            "Account funded"
        );

        Ok(FundingReceipt {
            transaction: tx,
            new_balance: updated.balance,
        })
    }

    /// Ledger of one account, newest first.
    pub async fn get_transactions(
        &self,
        account_id: &str,
        caller_owner_id: &str,
    ) -> BusinessResult<Vec<Transaction>> {
        self.owned_account(account_id, caller_owner_id).await?;
        Ok(self.store.transactions_for_account(account_id).await?)
    }

    pub async fn get_account(&self, account_id: &str, caller_owner_id: &str) -> BusinessResult<Account> {
        self.owned_account(account_id, caller_owner_id).await
    }

    pub async fn list_accounts(&self, owner_id: &str) -> BusinessResult<Vec<Account>> {
        Ok(self.store.accounts_for_owner(owner_id).await?)
    }

    /// Compare the cached balance with the ledger sum, read together.
    pub async fn reconcile(&self, account_id: &str) -> BusinessResult<Reconciliation> {
        let totals = self
            .store
            .ledger_totals(account_id)
            .await?
            .ok_or_else(|| BusinessError::not_found("Account", account_id))?;

        let reconciliation = Reconciliation {
            account_id: account_id.to_string(),
            balance: from_minor_units(totals.balance),
            ledger_sum: from_minor_units(totals.ledger_sum),
        };
        if !reconciliation.is_balanced() {
            tracing::error!(
                account_id,
                balance = %reconciliation.balance,
                ledger_sum = %reconciliation.ledger_sum,
                "Balance does not match ledger"
            );
        }
        Ok(reconciliation)
    }

    // Absent and not-owned are indistinguishable to the caller.
    async fn owned_account(&self, account_id: &str, caller_owner_id: &str) -> BusinessResult<Account> {
        match self.store.find_account(account_id).await? {
            Some(account) if account.is_owned_by(caller_owner_id) => Ok(account),
            _ => Err(BusinessError::not_found("Account", account_id)),
        }
    }
}

fn duplicate_account(owner_id: &str, account_type: AccountType) -> BusinessError {
    BusinessError::Conflict(format!(
        "owner {} already has a {} account",
        owner_id, account_type
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciliation_balanced() {
        let r = Reconciliation {
            account_id: "A".into(),
            balance: Decimal::new(10000, 2),
            ledger_sum: Decimal::new(100, 0),
        };
        assert!(r.is_balanced());

        let r = Reconciliation {
            ledger_sum: Decimal::new(9999, 2),
            ..r
        };
        assert!(!r.is_balanced());
    }
}
