//! Wallet command - balance, top-up, withdrawal and history.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::{Style, style};

use campus_ride_client::{TransactionPage, Vnd, WithdrawRequest};

use super::Context;

/// Arguments for the wallet command.
#[derive(Args, Debug)]
pub struct WalletArgs {
    #[command(subcommand)]
    pub command: WalletCommand,
}

#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    /// Show the wallet balance
    Balance,

    /// Start a top-up through the payment gateway
    Topup {
        /// Amount in VND (10,000 to 50,000,000)
        amount: u64,

        /// Page the gateway returns to after payment
        #[arg(long)]
        return_url: Option<String>,
    },

    /// Withdraw to a bank account
    Withdraw {
        /// Amount in VND (at least 50,000)
        amount: u64,

        /// Bank code or short name (see 'campus-ride banks')
        #[arg(long)]
        bank: String,

        /// Account number
        #[arg(long)]
        account: String,

        /// Account holder name
        #[arg(long)]
        name: String,
    },

    /// Show transaction history
    History {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

/// Run the wallet command.
pub async fn run(args: WalletArgs, ctx: &Context) -> Result<()> {
    match args.command {
        WalletCommand::Balance => cmd_balance(ctx).await,
        WalletCommand::Topup { amount, return_url } => {
            cmd_topup(Vnd(amount), return_url.as_deref(), ctx).await
        }
        WalletCommand::Withdraw {
            amount,
            bank,
            account,
            name,
        } => cmd_withdraw(Vnd(amount), &bank, account, name, ctx).await,
        WalletCommand::History { page } => cmd_history(page, ctx).await,
    }
}

async fn cmd_balance(ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    let wallet = client.wallet().balance().await?;

    if ctx.json_output {
        return ctx.print_json(&wallet);
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Wallet").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!(
        "  {} {}",
        dim.apply_to("Balance:"),
        style(wallet.balance).green().bold()
    );
    if wallet.pending > Vnd::ZERO {
        println!("  {} {}", dim.apply_to("Pending:"), wallet.pending);
    }
    println!();
    Ok(())
}

async fn cmd_topup(amount: Vnd, return_url: Option<&str>, ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    let session = client.wallet().top_up(amount, return_url).await?;

    if ctx.json_output {
        return ctx.print_json(&session);
    }

    println!("Top-up of {} created.", style(amount).bold());
    println!();
    println!("Complete the payment here:");
    println!();
    println!("  {}", style(&session.checkout_url).cyan());
    println!();
    if let Some(order) = &session.order_code {
        println!("  {} {}", Style::new().dim().apply_to("Order:"), order);
    }
    Ok(())
}

async fn cmd_withdraw(
    amount: Vnd,
    bank: &str,
    account_number: String,
    account_name: String,
    ctx: &Context,
) -> Result<()> {
    let client = ctx.client().await?;

    let Some(bank) = client.banks().find(bank).await? else {
        bail!("Unknown bank '{}'. Run 'campus-ride banks' to list banks.", bank);
    };
    let balance = client.wallet().balance().await?.balance;

    let request = WithdrawRequest {
        amount,
        bank_code: bank.code.clone(),
        account_number,
        account_name,
    };
    let result = client.wallet().withdraw(&request, Some(balance)).await?;

    if ctx.json_output {
        return ctx.print_json(&result);
    }

    println!(
        "Withdrawal of {} to {} requested.",
        style(amount).bold(),
        bank.short_name.as_deref().unwrap_or(&bank.name)
    );
    if let Some(status) = result.get("status").and_then(|s| s.as_str()) {
        println!("  {} {}", Style::new().dim().apply_to("Status:"), status);
    }
    Ok(())
}

async fn cmd_history(page: u32, ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    let history = client.wallet().transactions(page).await?;

    if ctx.json_output {
        return ctx.print_json(&history);
    }
    print_history(&history, page);
    Ok(())
}

fn print_history(history: &TransactionPage, page: u32) {
    let dim = Style::new().dim();

    println!();
    println!("{} {}", style("Transactions").bold(), dim.apply_to(format!("(page {})", page)));
    println!("{}", dim.apply_to("─".repeat(60)));

    if history.items.is_empty() {
        println!("  {}", dim.apply_to("No transactions."));
        println!();
        return;
    }

    for tx in &history.items {
        let date = tx
            .created_at
            .map(|t| t.format("%d/%m/%Y %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "  {} {:<14} {:>16} {}",
            dim.apply_to(format!("{:<16}", date)),
            tx.kind,
            tx.amount.to_string(),
            dim.apply_to(tx.status.as_deref().unwrap_or(""))
        );
    }

    if let Some(total) = history.total {
        println!();
        println!("  {}", dim.apply_to(format!("{} total", total)));
    }
    println!();
}
