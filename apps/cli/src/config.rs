use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use brokersync_connect::{
    DEFAULT_ALPACA_BASE_URL, DEFAULT_GHOSTFOLIO_HOST, DEFAULT_SYMBOL_MAPPING_FILE,
    DEFAULT_TIMEOUT_SECS,
};
use brokersync_core::{OperationMode, RetryPolicy, SyncConfig};

/// Process configuration, read once from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub alpaca_api_key: String,
    pub alpaca_secret_key: String,
    pub alpaca_base_url: String,
    pub ghost_host: String,
    pub ghost_token: Option<String>,
    pub ghost_key: Option<String>,
    pub symbol_mapping_file: PathBuf,
    pub http_timeout: Duration,
    pub sync: SyncConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mode = match var("OPERATION") {
            Some(value) => OperationMode::from_str(&value).context("Invalid OPERATION")?,
            None => OperationMode::Sync,
        };

        let alpaca_api_key = var("ALPACA_API_KEY").unwrap_or_default();
        let alpaca_secret_key = var("ALPACA_SECRET_KEY").unwrap_or_default();
        if mode == OperationMode::Sync && (alpaca_api_key.is_empty() || alpaca_secret_key.is_empty())
        {
            bail!("ALPACA_API_KEY and ALPACA_SECRET_KEY are required for {}", mode);
        }

        let ghost_token = var("GHOST_TOKEN");
        let ghost_key = var("GHOST_KEY");
        if ghost_token.is_none() && ghost_key.is_none() {
            bail!("Either GHOST_TOKEN or GHOST_KEY must be set");
        }

        let defaults = SyncConfig::default();
        let mut retry = RetryPolicy::default();
        if let Some(attempts) = parse_var::<u32>(&var, "RETRY_MAX_ATTEMPTS")? {
            retry.max_attempts = attempts;
        }

        let sync = SyncConfig {
            mode,
            account_name: var("GHOST_ACCOUNT_NAME").unwrap_or(defaults.account_name),
            currency: var("GHOST_CURRENCY")
                .map(|c| c.to_uppercase())
                .unwrap_or(defaults.currency),
            chunk_size: parse_var(&var, "CHUNK_SIZE")?.unwrap_or(defaults.chunk_size),
            sync_days: parse_var(&var, "SYNC_DAYS")?,
            platform_id: var("GHOST_PLATFORM_ID"),
            confirm_delete_all: var("CONFIRM_DELETE_ALL")
                .map(|v| parse_flag(&v))
                .transpose()?
                .unwrap_or(false),
            retry,
        };

        Ok(Self {
            alpaca_api_key,
            alpaca_secret_key,
            alpaca_base_url: var("ALPACA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ALPACA_BASE_URL.to_string()),
            ghost_host: var("GHOST_HOST").unwrap_or_else(|| DEFAULT_GHOSTFOLIO_HOST.to_string()),
            ghost_token,
            ghost_key,
            symbol_mapping_file: var("SYMBOL_MAPPING_FILE")
                .unwrap_or_else(|| DEFAULT_SYMBOL_MAPPING_FILE.to_string())
                .into(),
            http_timeout: Duration::from_secs(
                parse_var(&var, "HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            sync,
        })
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("Invalid {}: '{}'", key, value))
        })
        .transpose()
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("Invalid CONFIRM_DELETE_ALL: '{}'", other),
    }
}
