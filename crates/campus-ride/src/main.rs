//! Campus Ride - command-line client for the Campus Ride API
//!
//! Main entry point for the `campus-ride` CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{auth, banks, config, profile, verify, wallet};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Campus Ride - student ride-hailing from the terminal
#[derive(Parser)]
#[command(name = "campus-ride")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// API base URL (overrides config)
    #[arg(long, global = true, env = "CAMPUS_RIDE_API_URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in, register and manage the local session
    Auth(auth::AuthArgs),

    /// Show the profile and switch between rider and driver mode
    Profile(profile::ProfileArgs),

    /// Wallet balance, top-up, withdrawal and history
    Wallet(wallet::WalletArgs),

    /// List banks available for withdrawals
    Banks(banks::BanksArgs),

    /// Upload verification documents and check review status
    Verify(verify::VerifyArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "campus_ride=debug,campus_ride_client=debug,campus_ride_config=debug,info"
    } else {
        "campus_ride=info,campus_ride_client=warn,warn"
    };

    let log_dir = campus_ride_config::user_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "campus-ride.log");
    let (non_blocking, log_guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "campus_ride=trace,campus_ride_client=trace,campus_ride_config=debug,info",
                )),
        )
        .init();

    let loaded = campus_ride_config::load_config(None)?;
    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let ctx = commands::Context {
        server_url: cli.server,
        json_output: cli.json,
        verbose: cli.verbose,
        config: loaded.config,
    };

    let result = match cli.command {
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Profile(args) => profile::run(args, &ctx).await,
        Commands::Wallet(args) => wallet::run(args, &ctx).await,
        Commands::Banks(args) => banks::run(args, &ctx).await,
        Commands::Verify(args) => verify::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    };

    if let Err(e) = &result
        && commands::requires_login(e)
    {
        tracing::debug!(error = %e, "Session expired, exiting");
        eprintln!("Your session has expired. Run 'campus-ride auth login' to sign in again.");
        // exit() skips destructors; flush the file log first.
        drop(log_guard);
        std::process::exit(2);
    }

    result
}
