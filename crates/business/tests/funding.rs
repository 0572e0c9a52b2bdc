//! Funding coordinator integration tests
//!
//! Kiểm tra invariant balance == Σ ledger dưới tải đồng thời.

use async_trait::async_trait;
use ledgerline_business::{ErrorKind, FundingCoordinator, LedgerConfig};
use ledgerline_core::{Account, AccountType, Transaction, TransactionKind, TransactionStatus};
use ledgerline_persistence::{
    AccountRepo, Database, LedgerStore, LedgerTotals, PersistenceResult, SqliteStore,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    db: Database,
    funding: Arc<FundingCoordinator>,
}

async fn open_db() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("ledger.db").display());
    let db = Database::init(&url).await.unwrap();
    (dir, db)
}

async fn harness() -> Harness {
    let (dir, db) = open_db().await;
    let funding = FundingCoordinator::new(Arc::new(db.store()), LedgerConfig::default()).unwrap();
    Harness {
        _dir: dir,
        db,
        funding: Arc::new(funding),
    }
}

// ============================================================================
// Account creation
// ============================================================================

#[tokio::test]
async fn test_create_account() {
    let h = harness().await;
    let account = h.funding.create_account("CUST_001", AccountType::Checking).await.unwrap();

    assert_eq!(account.owner_id, "CUST_001");
    assert_eq!(account.account_type, AccountType::Checking);
    assert_eq!(account.balance, Decimal::ZERO);
    assert!(account.is_active());
    assert_eq!(account.account_number.len(), 10);
    assert!(account.account_number.chars().all(|c| c.is_ascii_digit()));
    assert_ne!(account.account_number.chars().next(), Some('0'));
}

#[tokio::test]
async fn test_one_account_per_owner_and_type() {
    let h = harness().await;
    h.funding.create_account("CUST_001", AccountType::Checking).await.unwrap();

    let err = h
        .funding
        .create_account("CUST_001", AccountType::Checking)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    h.funding.create_account("CUST_001", AccountType::Savings).await.unwrap();
    h.funding.create_account("CUST_002", AccountType::Checking).await.unwrap();
    assert_eq!(h.funding.list_accounts("CUST_001").await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_yields_single_account() {
    let h = harness().await;
    let mut handles = Vec::new();
    for _ in 0..6 {
        let funding = h.funding.clone();
        handles.push(tokio::spawn(async move {
            funding.create_account("CUST_001", AccountType::Savings).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::Conflict),
        }
    }
    assert_eq!(created, 1);
}

/// Store ghi được nhưng không đọc lại được account vừa tạo
struct ForgetfulStore(SqliteStore);

#[async_trait]
impl LedgerStore for ForgetfulStore {
    async fn insert_account(&self, account: &Account) -> PersistenceResult<()> {
        self.0.insert_account(account).await
    }
    async fn find_account(&self, _account_id: &str) -> PersistenceResult<Option<Account>> {
        Ok(None)
    }
    async fn find_account_by_owner_and_type(
        &self,
        owner_id: &str,
        account_type: AccountType,
    ) -> PersistenceResult<Option<Account>> {
        self.0.find_account_by_owner_and_type(owner_id, account_type).await
    }
    async fn account_number_exists(&self, account_number: &str) -> PersistenceResult<bool> {
        self.0.account_number_exists(account_number).await
    }
    async fn accounts_for_owner(&self, owner_id: &str) -> PersistenceResult<Vec<Account>> {
        self.0.accounts_for_owner(owner_id).await
    }
    async fn record_deposit(&self, tx: &Transaction) -> PersistenceResult<Account> {
        self.0.record_deposit(tx).await
    }
    async fn transactions_for_account(&self, account_id: &str) -> PersistenceResult<Vec<Transaction>> {
        self.0.transactions_for_account(account_id).await
    }
    async fn ledger_totals(&self, account_id: &str) -> PersistenceResult<Option<LedgerTotals>> {
        self.0.ledger_totals(account_id).await
    }
}

#[tokio::test]
async fn test_failed_read_back_is_internal_error() {
    let (_dir, db) = open_db().await;
    let funding =
        FundingCoordinator::new(Arc::new(ForgetfulStore(db.store())), LedgerConfig::default())
            .unwrap();

    let err = funding
        .create_account("CUST_001", AccountType::Checking)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    // Account vẫn được ghi; không có giá trị giả nào được trả về
    assert_eq!(db.stats().await.unwrap().accounts, 1);
}

/// Store báo mọi account number đều đã tồn tại
struct ExhaustedNumbers(SqliteStore);

#[async_trait]
impl LedgerStore for ExhaustedNumbers {
    async fn insert_account(&self, account: &Account) -> PersistenceResult<()> {
        self.0.insert_account(account).await
    }
    async fn find_account(&self, account_id: &str) -> PersistenceResult<Option<Account>> {
        self.0.find_account(account_id).await
    }
    async fn find_account_by_owner_and_type(
        &self,
        owner_id: &str,
        account_type: AccountType,
    ) -> PersistenceResult<Option<Account>> {
        self.0.find_account_by_owner_and_type(owner_id, account_type).await
    }
    async fn account_number_exists(&self, _account_number: &str) -> PersistenceResult<bool> {
        Ok(true)
    }
    async fn accounts_for_owner(&self, owner_id: &str) -> PersistenceResult<Vec<Account>> {
        self.0.accounts_for_owner(owner_id).await
    }
    async fn record_deposit(&self, tx: &Transaction) -> PersistenceResult<Account> {
        self.0.record_deposit(tx).await
    }
    async fn transactions_for_account(&self, account_id: &str) -> PersistenceResult<Vec<Transaction>> {
        self.0.transactions_for_account(account_id).await
    }
    async fn ledger_totals(&self, account_id: &str) -> PersistenceResult<Option<LedgerTotals>> {
        self.0.ledger_totals(account_id).await
    }
}

#[tokio::test]
async fn test_number_exhaustion_is_conflict() {
    let (_dir, db) = open_db().await;
    let config = LedgerConfig {
        max_number_attempts: 3,
        ..LedgerConfig::default()
    };
    let funding = FundingCoordinator::new(Arc::new(ExhaustedNumbers(db.store())), config).unwrap();

    let err = funding
        .create_account("CUST_001", AccountType::Checking)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(db.stats().await.unwrap().accounts, 0);
}

// ============================================================================
// Funding
// ============================================================================

#[tokio::test]
async fn test_fund_returns_in_unit_balance() {
    let h = harness().await;
    let account = h.funding.create_account("CUST_001", AccountType::Checking).await.unwrap();

    let receipt = h.funding.fund(&account.id, dec!(50.00), "ach", "CUST_001").await.unwrap();
    assert_eq!(receipt.new_balance, dec!(50.00));
    assert_eq!(receipt.transaction.kind, TransactionKind::Deposit);
    assert_eq!(receipt.transaction.status, TransactionStatus::Completed);
    assert_eq!(receipt.transaction.amount.value(), dec!(50.00));

    let receipt = h.funding.fund(&account.id, dec!(12.34), "card", "CUST_001").await.unwrap();
    assert_eq!(receipt.new_balance, dec!(62.34));
}

#[tokio::test]
async fn test_fund_rejects_non_positive_amounts() {
    let h = harness().await;
    let account = h.funding.create_account("CUST_001", AccountType::Checking).await.unwrap();

    for amount in [dec!(0), dec!(-10), dec!(0.001)] {
        let err = h.funding.fund(&account.id, amount, "ach", "CUST_001").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    }
    assert!(h.funding.get_transactions(&account.id, "CUST_001").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fund_requires_ownership() {
    let h = harness().await;
    let account = h.funding.create_account("CUST_001", AccountType::Checking).await.unwrap();

    let err = h.funding.fund(&account.id, dec!(10), "ach", "CUST_002").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = h.funding.fund("missing", dec!(10), "ach", "CUST_001").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_fund_inactive_account_is_invalid_state() {
    let h = harness().await;
    let account = h.funding.create_account("CUST_001", AccountType::Checking).await.unwrap();
    AccountRepo::update_status(h.db.pool(), &account.id, "frozen").await.unwrap();

    let err = h.funding.fund(&account.id, dec!(10), "ach", "CUST_001").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

/// Scenario: A = 0.00, hai lệnh fund 50.00 đồng thời
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_concurrent_deposits() {
    let h = harness().await;
    let account = h.funding.create_account("CUST_001", AccountType::Checking).await.unwrap();

    let a = {
        let funding = h.funding.clone();
        let id = account.id.clone();
        tokio::spawn(async move { funding.fund(&id, dec!(50.00), "ach", "CUST_001").await })
    };
    let b = {
        let funding = h.funding.clone();
        let id = account.id.clone();
        tokio::spawn(async move { funding.fund(&id, dec!(50.00), "wire", "CUST_001").await })
    };
    let ra = a.await.unwrap().unwrap();
    let rb = b.await.unwrap().unwrap();

    // Mỗi receipt thấy balance của chính unit đó
    let mut seen = vec![ra.new_balance, rb.new_balance];
    seen.sort();
    assert_eq!(seen, vec![dec!(50.00), dec!(100.00)]);

    let account = h.funding.get_account(&account.id, "CUST_001").await.unwrap();
    assert_eq!(account.balance, dec!(100.00));

    let history = h.funding.get_transactions(&account.id, "CUST_001").await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|tx| tx.kind == TransactionKind::Deposit));
    assert!(history[0].created_at >= history[1].created_at);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_no_lost_updates_under_contention() {
    let h = harness().await;
    let account = h.funding.create_account("CUST_001", AccountType::Savings).await.unwrap();

    let amounts: Vec<Decimal> = (1..=40).map(|i| Decimal::new(i * 125, 2)).collect();
    let expected: Decimal = amounts.iter().sum();

    let mut handles = Vec::new();
    for amount in amounts.clone() {
        let funding = h.funding.clone();
        let id = account.id.clone();
        handles.push(tokio::spawn(async move {
            funding.fund(&id, amount, "batch", "CUST_001").await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let account = h.funding.get_account(&account.id, "CUST_001").await.unwrap();
    assert_eq!(account.balance, expected);

    let history = h.funding.get_transactions(&account.id, "CUST_001").await.unwrap();
    assert_eq!(history.len(), amounts.len());

    let reconciliation = h.funding.reconcile(&account.id).await.unwrap();
    assert!(reconciliation.is_balanced());
    assert_eq!(reconciliation.ledger_sum, expected);
}

#[tokio::test]
async fn test_forced_failure_leaves_ledger_untouched() {
    let h = harness().await;
    let account = h.funding.create_account("CUST_001", AccountType::Checking).await.unwrap();
    h.funding.fund(&account.id, dec!(20.00), "ach", "CUST_001").await.unwrap();

    sqlx::query(
        r#"
        CREATE TRIGGER fail_balance BEFORE UPDATE OF balance ON accounts
        BEGIN SELECT RAISE(ABORT, 'forced failure'); END;
        "#,
    )
    .execute(h.db.pool())
    .await
    .unwrap();

    let err = h.funding.fund(&account.id, dec!(30.00), "ach", "CUST_001").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageFailure);

    let account = h.funding.get_account(&account.id, "CUST_001").await.unwrap();
    assert_eq!(account.balance, dec!(20.00));
    let history = h.funding.get_transactions(&account.id, "CUST_001").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount.value(), dec!(20.00));
}

// ============================================================================
// Ledger reads
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_transactions_never_cross_accounts() {
    let h = harness().await;
    let mut accounts = Vec::new();
    for i in 0..4 {
        let owner = format!("CUST_{:03}", i);
        let account = h.funding.create_account(&owner, AccountType::Checking).await.unwrap();
        accounts.push((owner, account.id));
    }

    let mut handles = Vec::new();
    for round in 0..10 {
        for (owner, id) in accounts.clone() {
            let funding = h.funding.clone();
            handles.push(tokio::spawn(async move {
                funding.fund(&id, Decimal::new(100 + round, 2), "load", &owner).await?;
                funding.get_transactions(&id, &owner).await
            }));
        }
    }

    for handle in handles {
        let history = handle.await.unwrap().unwrap();
        let account_id = &history[0].account_id;
        assert!(history.iter().all(|tx| &tx.account_id == account_id));
        assert!(history.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    for (owner, id) in &accounts {
        let history = h.funding.get_transactions(id, owner).await.unwrap();
        assert_eq!(history.len(), 10);
        assert!(history.iter().all(|tx| &tx.account_id == id));
        assert!(h.funding.reconcile(id).await.unwrap().is_balanced());
    }
}

#[tokio::test]
async fn test_get_transactions_requires_ownership() {
    let h = harness().await;
    let account = h.funding.create_account("CUST_001", AccountType::Checking).await.unwrap();
    h.funding.fund(&account.id, dec!(1), "ach", "CUST_001").await.unwrap();

    let err = h.funding.get_transactions(&account.id, "CUST_002").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = h.funding.get_account(&account.id, "CUST_002").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_reconcile_missing_account() {
    let h = harness().await;
    let err = h.funding.reconcile("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
