//! Config command - configuration management.

use anyhow::{Result, anyhow, bail};
use clap::{Args, Subcommand};

use campus_ride_config::{ApiConfig, CampusRideConfig, SessionConfig, StorageConfig};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show resolved configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./campus-ride.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Set a value in the user config file
    Set {
        /// Key: api.base_url, api.timeout_secs, api.user_agent, storage.data_dir,
        /// session.consistency_delay_ms
        key: String,

        /// Value
        value: String,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx).await,
        ConfigCommand::Which => cmd_which().await,
        ConfigCommand::Init { local } => cmd_init(local).await,
        ConfigCommand::Set { key, value } => cmd_set(&key, &value).await,
        ConfigCommand::Path => cmd_path().await,
    }
}

async fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = campus_ride_config::load_config(None)?;
    let config = &ctx.config;

    if ctx.json_output {
        return ctx.print_json(&serde_json::json!({
            "base_url": ctx.base_url(),
            "timeout_secs": config.timeout().as_secs(),
            "user_agent": config.user_agent(),
            "data_dir": config.data_dir().display().to_string(),
            "consistency_delay_ms": config.consistency_delay().as_millis() as u64,
            "sources": loaded
                .loaded_from()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>(),
        }));
    }

    println!("# Campus Ride Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    println!("API:");
    println!("  base_url: {}", ctx.base_url());
    if ctx.server_url.is_some() {
        println!("            (from --server / CAMPUS_RIDE_API_URL)");
    }
    println!("  timeout: {}s", config.timeout().as_secs());
    if let Some(agent) = config.user_agent() {
        println!("  user_agent: {}", agent);
    }
    println!();

    println!("Storage:");
    println!("  data_dir: {}", config.data_dir().display());
    println!();

    println!("Session:");
    println!(
        "  consistency_delay: {}ms",
        config.consistency_delay().as_millis()
    );
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        if let Ok(toml_str) = config.to_toml() {
            println!("{}", toml_str);
        }
    }

    Ok(())
}

async fn cmd_which() -> Result<()> {
    let loaded = campus_ride_config::load_config(None)?;

    println!("Config file search order (later overrides earlier):\n");

    for source in &loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }

    println!();
    let loaded_count = loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'campus-ride config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

async fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        std::path::PathBuf::from("campus-ride.toml")
    } else {
        campus_ride_config::user_config_path()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        println!("Use 'campus-ride config set <key> <value>' to modify it.");
        return Ok(());
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, TEMPLATE)?;

    println!("Created config file: {}", path.display());
    Ok(())
}

async fn cmd_set(key: &str, value: &str) -> Result<()> {
    let path = campus_ride_config::user_config_path()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?;

    let mut config = if path.exists() {
        campus_ride_config::load_config_file(&path)?
    } else {
        CampusRideConfig::new()
    };

    apply_setting(&mut config, key, value)?;
    campus_ride_config::save_config(&config, &path)?;

    println!("✓ {} = {} ({})", key, value, path.display());
    Ok(())
}

async fn cmd_path() -> Result<()> {
    match campus_ride_config::user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("Could not determine config directory"),
    }
    Ok(())
}

/// Apply a dotted `section.key` assignment.
fn apply_setting(config: &mut CampusRideConfig, key: &str, value: &str) -> Result<()> {
    let parse_u64 = |value: &str| {
        value
            .parse::<u64>()
            .map_err(|_| anyhow!("'{}' expects a whole number, got '{}'", key, value))
    };

    match key {
        "api.base_url" => {
            url_like(value)?;
            config.api.get_or_insert_with(ApiConfig::default).base_url = Some(value.to_string());
        }
        "api.timeout_secs" => {
            config.api.get_or_insert_with(ApiConfig::default).timeout_secs =
                Some(parse_u64(value)?);
        }
        "api.user_agent" => {
            config.api.get_or_insert_with(ApiConfig::default).user_agent = Some(value.to_string());
        }
        "storage.data_dir" => {
            config
                .storage
                .get_or_insert_with(StorageConfig::default)
                .data_dir = Some(value.into());
        }
        "session.consistency_delay_ms" => {
            config
                .session
                .get_or_insert_with(SessionConfig::default)
                .consistency_delay_ms = Some(parse_u64(value)?);
        }
        other => bail!("Unknown config key '{}'", other),
    }
    Ok(())
}

fn url_like(value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        bail!("Base URL must start with http:// or https://")
    }
}

const TEMPLATE: &str = r#"# Campus Ride Configuration

[api]
base_url = "http://localhost:3000"
timeout_secs = 30
# user_agent = "campus-ride-cli"

# [storage]
# Where credentials and the cached profile are kept.
# data_dir = "~/.local/share/campus-ride"

# [session]
# Wait before re-reading the profile after login or a mode switch.
# Set to 0 when the backend reads its own writes.
# consistency_delay_ms = 500
"#;
