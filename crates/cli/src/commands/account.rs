//! Account management commands

use anyhow::Result;
use ledgerline_persistence::Database;

use super::coordinator;
use crate::AccountAction;

/// Handle account subcommands
pub async fn handle(db: &Database, action: &AccountAction) -> Result<()> {
    let funding = coordinator(db)?;

    match action {
        AccountAction::Create { owner, r#type } => {
            let account = funding.create_account(owner, r#type.to_core_type()).await?;
            println!("✅ Created {} account:", account.account_type);
            println!("   Account ID:     {}", account.id);
            println!("   Account number: {}", account.account_number);
            println!("   Owner:          {}", account.owner_id);
            println!("   Balance:        {}", account.balance);
        }
        AccountAction::List { owner } => {
            let accounts = funding.list_accounts(owner).await?;
            if accounts.is_empty() {
                println!("No accounts found.");
                return Ok(());
            }

            println!(
                "{:<38} {:<12} {:<10} {:<8} {:>14}",
                "ACCOUNT", "NUMBER", "TYPE", "STATUS", "BALANCE"
            );
            println!("{}", "-".repeat(86));
            for a in accounts {
                println!(
                    "{:<38} {:<12} {:<10} {:<8} {:>14}",
                    a.id,
                    a.account_number,
                    a.account_type.as_str(),
                    a.status.as_str(),
                    a.balance.to_string()
                );
            }
        }
        AccountAction::Show { account_id, owner } => {
            let account = funding.get_account(account_id, owner).await?;
            println!("📋 Account Details");
            println!("   Account ID: {}", account.id);
            println!("   Number:     {}", account.account_number);
            println!("   Type:       {}", account.account_type);
            println!("   Status:     {}", account.status);
            println!("   Balance:    {}", account.balance);
            println!("   Opened:     {}", account.created_at.to_rfc3339());
        }
    }

    Ok(())
}
