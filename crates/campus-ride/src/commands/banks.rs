//! Banks command - bank directory for withdrawals.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::Context;

/// Arguments for the banks command.
#[derive(Args, Debug)]
pub struct BanksArgs {
    /// Only show banks whose code or name contains this text
    #[arg(short, long)]
    pub search: Option<String>,
}

/// Run the banks command.
pub async fn run(args: BanksArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    let mut banks = client.banks().list().await?;

    if let Some(needle) = args.search.as_deref().map(str::to_lowercase) {
        banks.retain(|bank| {
            bank.code.to_lowercase().contains(&needle)
                || bank.name.to_lowercase().contains(&needle)
                || bank
                    .short_name
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
        });
    }

    if ctx.json_output {
        return ctx.print_json(&banks);
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Banks").bold());
    println!("{}", dim.apply_to("─".repeat(60)));
    if banks.is_empty() {
        println!("  {}", dim.apply_to("No matching banks."));
    }
    for bank in &banks {
        println!(
            "  {} {} {}",
            style(format!("{:<8}", bank.code)).cyan(),
            bank.short_name.as_deref().unwrap_or(&bank.name),
            dim.apply_to(bank.bin.as_deref().unwrap_or(""))
        );
    }
    println!();
    Ok(())
}
