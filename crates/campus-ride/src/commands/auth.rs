//! Auth command - login, registration and session management.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::{Style, style};
use serde::Serialize;

use campus_ride_client::{LoginRequest, Profile, ProfileMode, ReconciledSession, RegisterRequest};

use super::Context;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Log in with a phone number or email
    Login {
        /// Phone number or email address
        identifier: String,

        /// Password (prompted when omitted)
        #[arg(long, env = "CAMPUS_RIDE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account; an OTP is sent to the phone number
    Register {
        /// Phone number
        phone: String,

        /// Full name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: Option<String>,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Confirm the OTP sent after registration
    VerifyOtp {
        /// Phone number
        phone: String,

        /// One-time code
        otp: String,
    },

    /// Send a new OTP
    ResendOtp {
        /// Phone number
        phone: String,
    },

    /// Show the signed-in user
    Whoami {
        /// Fetch from the server instead of the local cache
        #[arg(long)]
        refresh: bool,
    },

    /// Sign out and clear stored credentials
    Logout,
}

/// Session summary for JSON output.
#[derive(Debug, Serialize)]
struct SessionOutput {
    authenticated: bool,
    mode: Option<ProfileMode>,
    profile_refreshed: bool,
    profile: Option<Profile>,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login {
            identifier,
            password,
        } => cmd_login(&identifier, password, ctx).await,
        AuthCommand::Register {
            phone,
            name,
            email,
            password,
        } => cmd_register(phone, name, email, password, ctx).await,
        AuthCommand::VerifyOtp { phone, otp } => cmd_verify_otp(&phone, &otp, ctx).await,
        AuthCommand::ResendOtp { phone } => cmd_resend_otp(&phone, ctx).await,
        AuthCommand::Whoami { refresh } => cmd_whoami(refresh, ctx).await,
        AuthCommand::Logout => cmd_logout(ctx).await,
    }
}

async fn cmd_login(identifier: &str, password: Option<String>, ctx: &Context) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password("Password: ")?,
    };
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let client = ctx.client().await?;
    let session = client
        .auth()
        .login(&LoginRequest::identifier(identifier, password))
        .await?;

    print_session(&session, client.tokens().is_authenticated(), ctx)
}

async fn cmd_register(
    phone: String,
    full_name: String,
    email: Option<String>,
    password: Option<String>,
    ctx: &Context,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            let first = rpassword::prompt_password("Password: ")?;
            let again = rpassword::prompt_password("Confirm password: ")?;
            if first != again {
                bail!("Passwords do not match");
            }
            first
        }
    };

    let client = ctx.client().await?;
    let response = client
        .auth()
        .register(&RegisterRequest {
            full_name,
            phone: phone.clone(),
            email,
            password,
        })
        .await?;

    if ctx.json_output {
        return ctx.print_json(&serde_json::json!({
            "message": response.message,
            "user_id": response.user_id,
        }));
    }

    println!(
        "{}",
        response
            .message
            .as_deref()
            .unwrap_or("Account created. Check your phone for the OTP.")
    );
    println!();
    println!(
        "  {}",
        Style::new()
            .dim()
            .apply_to(format!("Confirm with: campus-ride auth verify-otp {} <code>", phone))
    );
    Ok(())
}

async fn cmd_verify_otp(phone: &str, otp: &str, ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    let session = client.auth().verify_otp(phone, otp).await?;
    let authenticated = client.tokens().is_authenticated();

    if !authenticated && !ctx.json_output {
        println!("{}", style("Phone number verified.").green());
        println!("Log in with: campus-ride auth login {}", phone);
        return Ok(());
    }
    print_session(&session, authenticated, ctx)
}

async fn cmd_resend_otp(phone: &str, ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    client.auth().resend_otp(phone).await?;

    if ctx.json_output {
        return ctx.print_json(&serde_json::json!({ "sent": true }));
    }
    println!("A new OTP has been sent to {}", phone);
    Ok(())
}

async fn cmd_whoami(refresh: bool, ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    if !client.tokens().is_authenticated() {
        if ctx.json_output {
            return ctx.print_json(&SessionOutput {
                authenticated: false,
                mode: None,
                profile_refreshed: false,
                profile: None,
            });
        }
        println!("Not logged in. Run 'campus-ride auth login <phone>'.");
        return Ok(());
    }

    let profile = client.profile().me(refresh).await?;
    if ctx.json_output {
        return ctx.print_json(&profile);
    }
    super::profile::print_profile(&profile);
    Ok(())
}

async fn cmd_logout(ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;
    let was_authenticated = client.tokens().is_authenticated();
    client.auth().logout().await?;

    if ctx.json_output {
        return ctx.print_json(&serde_json::json!({ "logged_out": was_authenticated }));
    }
    if was_authenticated {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

fn print_session(session: &ReconciledSession, authenticated: bool, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        return ctx.print_json(&SessionOutput {
            authenticated,
            mode: session.mode,
            profile_refreshed: session.refreshed,
            profile: session.profile.clone(),
        });
    }

    let dim = Style::new().dim();
    let name = session
        .profile
        .as_ref()
        .and_then(|p| p.full_name.as_deref())
        .unwrap_or("(unknown)");

    println!("{} {}", style("Logged in as").green(), style(name).bold());
    if let Some(mode) = session.mode {
        println!("  {} {}", dim.apply_to("Mode:"), mode);
    }
    if !session.refreshed {
        println!(
            "  {}",
            dim.apply_to("Profile could not be refreshed; showing last known details.")
        );
    }
    Ok(())
}
