//! Profile command - profile details and rider/driver switching.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::{Style, style};

use campus_ride_client::{FilePart, Profile, ProfileMode};

use super::Context;

/// Arguments for the profile command.
#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Show the current profile
    Show {
        /// Fetch from the server instead of the local cache
        #[arg(long)]
        refresh: bool,
    },

    /// Switch the active mode (rider or driver)
    Switch {
        /// Mode to switch to
        mode: ProfileMode,
    },

    /// Upload a new avatar image
    Avatar {
        /// Image file (jpg, png, webp, heic)
        path: PathBuf,
    },
}

/// Run the profile command.
pub async fn run(args: ProfileArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ProfileCommand::Show { refresh } => cmd_show(refresh, ctx).await,
        ProfileCommand::Switch { mode } => cmd_switch(mode, ctx).await,
        ProfileCommand::Avatar { path } => cmd_avatar(path, ctx).await,
    }
}

async fn cmd_show(refresh: bool, ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    let profile = client.profile().me(refresh).await?;

    if ctx.json_output {
        return ctx.print_json(&profile);
    }
    print_profile(&profile);
    Ok(())
}

async fn cmd_switch(mode: ProfileMode, ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;

    if mode == ProfileMode::Driver
        && let Some(cached) = client.tokens().cached_profile().await
        && !cached.can_drive()
    {
        tracing::warn!("Driver documents are not approved yet; the server may refuse the switch");
    }

    let outcome = client.profile().switch_profile(mode).await?;

    if ctx.json_output {
        return ctx.print_json(&serde_json::json!({
            "mode": outcome.mode,
            "profile_refreshed": outcome.refreshed,
            "profile": outcome.profile,
        }));
    }

    match outcome.mode {
        Some(active) => println!("{} {}", style("Active mode:").green(), style(active).bold()),
        None => println!("Switch requested; the server did not report the active mode."),
    }
    if !outcome.refreshed {
        println!(
            "  {}",
            Style::new()
                .dim()
                .apply_to("Profile could not be refreshed; other details may be stale.")
        );
    }
    Ok(())
}

async fn cmd_avatar(path: PathBuf, ctx: &Context) -> Result<()> {
    let file = FilePart::from_path(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let client = ctx.client().await?;
    let profile = client.profile().upload_avatar(file).await?;

    if ctx.json_output {
        return ctx.print_json(&profile);
    }
    println!("Avatar updated.");
    if let Some(url) = &profile.avatar_url {
        println!("  {}", Style::new().dim().apply_to(url));
    }
    Ok(())
}

/// Print a profile in human-readable form.
pub fn print_profile(profile: &Profile) {
    let dim = Style::new().dim();
    let check = |ok: bool| {
        if ok {
            style("✓ yes").green()
        } else {
            style("✗ no").red()
        }
    };

    println!();
    println!(
        "{}",
        style(profile.full_name.as_deref().unwrap_or("Profile")).bold()
    );
    println!("{}", dim.apply_to("─".repeat(40)));
    println!("  {} {}", dim.apply_to("ID:        "), profile.id);
    if let Some(phone) = &profile.phone {
        println!("  {} {}", dim.apply_to("Phone:     "), phone);
    }
    if let Some(email) = &profile.email {
        println!("  {} {}", dim.apply_to("Email:     "), email);
    }
    if let Some(mode) = profile.active_profile {
        println!("  {} {}", dim.apply_to("Mode:      "), style(mode).cyan());
    }
    println!("  {} {}", dim.apply_to("Verified:  "), check(profile.is_verified));
    println!(
        "  {} {}",
        dim.apply_to("Student:   "),
        check(profile.is_student_verified)
    );
    println!(
        "  {} {}",
        dim.apply_to("Driver:    "),
        check(profile.is_driver_verified)
    );
    println!();
}
