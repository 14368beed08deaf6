//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use card_gateway::StripeConfig;

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub stripe_secret_key: String,
    pub stripe_api_base: Option<String>,
    pub gateway_timeout: Duration,
    pub rate_limit_per_minute: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_url", &"<redacted>")
            .field("stripe_secret_key", &"<redacted>")
            .field("stripe_api_base", &self.stripe_api_base)
            .field("gateway_timeout", &self.gateway_timeout)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("PORT must be a port number: {}", e))?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let stripe_secret_key = lookup("STRIPE_SECRET_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow::anyhow!("STRIPE_SECRET_KEY environment variable is required"))?;

        let stripe_api_base = lookup("STRIPE_API_BASE").filter(|base| !base.is_empty());

        let timeout_secs: u64 = lookup("GATEWAY_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("GATEWAY_TIMEOUT_SECS must be a number: {}", e))?;

        let rate_limit_per_minute = lookup("RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|| "100".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("RATE_LIMIT_PER_MINUTE must be a number: {}", e))?;

        Ok(Self {
            port,
            database_url,
            stripe_secret_key,
            stripe_api_base,
            gateway_timeout: Duration::from_secs(timeout_secs),
            rate_limit_per_minute,
        })
    }

    /// Settings for the card processor adapter.
    pub fn stripe(&self) -> StripeConfig {
        let config =
            StripeConfig::new(self.stripe_secret_key.clone()).with_timeout(self.gateway_timeout);
        match &self.stripe_api_base {
            Some(base) => config.with_api_base(base.clone()),
            None => config,
        }
    }
}
