//! Verify command - verification document upload and status.

use std::path::PathBuf;

use anyhow::{Context as _, Result, anyhow};
use clap::{Args, Subcommand};
use console::{Style, style};

use campus_ride_client::{DocumentKind, FilePart};

use super::Context;

/// Arguments for the verify command.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(subcommand)]
    pub command: VerifyCommand,
}

#[derive(Subcommand, Debug)]
pub enum VerifyCommand {
    /// Upload a document for review
    Upload {
        /// Document kind: student_card, national_id, driver_license, vehicle_registration
        kind: DocumentKind,

        /// Image or PDF file
        path: PathBuf,

        /// Extra form field as key=value (repeatable)
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Show review status of submitted documents
    Status,
}

/// Run the verify command.
pub async fn run(args: VerifyArgs, ctx: &Context) -> Result<()> {
    match args.command {
        VerifyCommand::Upload { kind, path, fields } => cmd_upload(kind, path, fields, ctx).await,
        VerifyCommand::Status => cmd_status(ctx).await,
    }
}

fn parse_field(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{}'", s))?;
    if key.trim().is_empty() {
        return Err(anyhow!("field name must not be empty"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

async fn cmd_upload(
    kind: DocumentKind,
    path: PathBuf,
    fields: Vec<(String, String)>,
    ctx: &Context,
) -> Result<()> {
    let file = FilePart::from_path(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let fields: Vec<(&str, &str)> = fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let client = ctx.client().await?;
    let status = client
        .verification()
        .upload_document(kind, file, &fields)
        .await?;

    if ctx.json_output {
        return ctx.print_json(&status);
    }
    println!(
        "Uploaded {} ({})",
        style(kind.as_str()).bold(),
        status_style(&status.status)
    );
    Ok(())
}

async fn cmd_status(ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    let status = client.verification().status().await?;

    if ctx.json_output {
        return ctx.print_json(&status);
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Verification").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    if let Some(overall) = &status.status {
        println!("  {} {}", dim.apply_to("Overall:"), status_style(overall));
    }
    if status.documents.is_empty() {
        println!("  {}", dim.apply_to("No documents submitted."));
    }
    for doc in &status.documents {
        println!(
            "  {} {}",
            style(format!("{:<22}", doc.kind)).cyan(),
            status_style(&doc.status)
        );
        if let Some(note) = &doc.note {
            println!("    {}", dim.apply_to(note));
        }
    }
    println!();
    Ok(())
}

fn status_style(status: &str) -> console::StyledObject<&str> {
    match status {
        "approved" | "verified" => style(status).green(),
        "rejected" => style(status).red(),
        _ => style(status).yellow(),
    }
}
