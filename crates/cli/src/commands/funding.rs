//! Funding and ledger commands

use anyhow::Result;
use ledgerline_persistence::Database;
use rust_decimal::Decimal;

use super::coordinator;

/// Deposit into an account
pub async fn fund(
    db: &Database,
    account_id: &str,
    amount: Decimal,
    source: &str,
    owner: &str,
) -> Result<()> {
    let receipt = coordinator(db)?.fund(account_id, amount, source, owner).await?;

    println!("✅ Deposited {} into {}", receipt.transaction.amount, account_id);
    println!("   Transaction: {}", receipt.transaction.id);
    println!("   New balance: {}", receipt.new_balance);
    Ok(())
}

/// Print the ledger, newest first
pub async fn history(db: &Database, account_id: &str, owner: &str) -> Result<()> {
    let transactions = coordinator(db)?.get_transactions(account_id, owner).await?;

    if transactions.is_empty() {
        println!("No transactions for account '{}'", account_id);
        return Ok(());
    }

    println!("📜 Ledger for {}", account_id);
    println!(
        "{:<24} {:<10} {:>14} {:<10} {}",
        "TIME", "KIND", "AMOUNT", "STATUS", "DESCRIPTION"
    );
    println!("{}", "-".repeat(80));
    for tx in transactions {
        println!(
            "{:<24} {:<10} {:>14} {:<10} {}",
            tx.created_at.format("%Y-%m-%d %H:%M:%S%.3f"),
            tx.kind.as_str(),
            tx.amount.to_string(),
            tx.status.as_str(),
            tx.description
        );
    }
    Ok(())
}
