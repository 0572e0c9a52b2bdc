//! Ledger audit - cached balance vs. ledger sum

use anyhow::{bail, Result};
use ledgerline_persistence::Database;

use super::coordinator;

/// Reconcile one account, or every account of an owner
pub async fn run_audit(db: &Database, account_id: Option<&str>, owner: Option<&str>) -> Result<()> {
    let funding = coordinator(db)?;

    let account_ids: Vec<String> = match (account_id, owner) {
        (Some(id), _) => vec![id.to_string()],
        (None, Some(owner)) => funding
            .list_accounts(owner)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect(),
        (None, None) => bail!("Pass an account ID or --owner"),
    };

    println!("🔍 Auditing {} account(s)", account_ids.len());
    println!("{:<38} {:>14} {:>14} {:<6}", "ACCOUNT", "BALANCE", "LEDGER", "OK");
    println!("{}", "-".repeat(76));

    let mut mismatches = 0;
    for id in &account_ids {
        let r = funding.reconcile(id).await?;
        let ok = if r.is_balanced() { "✅" } else { "❌" };
        if !r.is_balanced() {
            mismatches += 1;
        }
        println!("{:<38} {:>14} {:>14} {:<6}", r.account_id,
            r.balance.to_string(),
            r.ledger_sum.to_string(),
            ok
        );
    }

    if mismatches > 0 {
        bail!("{} account(s) out of balance", mismatches);
    }
    Ok(())
}
