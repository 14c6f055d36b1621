//! CLI command handlers.

pub mod auth;
pub mod banks;
pub mod config;
pub mod profile;
pub mod verify;
pub mod wallet;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use campus_ride_client::{CampusRideClient, FileStorage, SharedStorage};
use campus_ride_config::CampusRideConfig;
use serde::Serialize;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// API URL from the command line, overriding config.
    pub server_url: Option<String>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Merged configuration.
    pub config: CampusRideConfig,
}

impl Context {
    /// Effective API base URL.
    pub fn base_url(&self) -> &str {
        self.server_url
            .as_deref()
            .unwrap_or_else(|| self.config.base_url())
    }

    /// Build an API client with persisted credentials loaded.
    pub async fn client(&self) -> Result<CampusRideClient> {
        let data_dir = self.config.data_dir();
        let storage: SharedStorage = Arc::new(FileStorage::new(&data_dir));

        let mut builder = CampusRideClient::builder()
            .base_url(self.base_url())
            .timeout(self.config.timeout())
            .consistency_delay(self.config.consistency_delay())
            .shared_storage(storage);
        if let Some(agent) = self.config.user_agent() {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .with_context(|| format!("Invalid API URL '{}'", self.base_url()))?;
        client.tokens().load().await;

        tracing::debug!(
            base_url = %client.base_url(),
            data_dir = %data_dir.display(),
            authenticated = client.tokens().is_authenticated(),
            "Client ready"
        );
        Ok(client)
    }

    /// Print a value as pretty JSON.
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Whether a command failed because the session could not be refreshed.
pub fn requires_login(err: &anyhow::Error) -> bool {
    err.downcast_ref::<campus_ride_client::Error>()
        .is_some_and(campus_ride_client::Error::requires_login)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_ride_client::RefreshFailure;

    #[test]
    fn test_requires_login_through_context() {
        let err = anyhow::Error::new(campus_ride_client::Error::SessionExpired {
            reason: RefreshFailure::Cleared,
        })
        .context("Failed to load wallet");
        assert!(requires_login(&err));

        let other = anyhow::anyhow!("boom");
        assert!(!requires_login(&other));
    }

    #[test]
    fn test_server_flag_overrides_config() {
        let ctx = Context {
            server_url: Some("https://api.campusride.vn".to_string()),
            json_output: false,
            verbose: false,
            config: CampusRideConfig::default(),
        };
        assert_eq!(ctx.base_url(), "https://api.campusride.vn");

        let ctx = Context {
            server_url: None,
            ..ctx
        };
        assert_eq!(ctx.base_url(), "http://localhost:3000");
    }
}
