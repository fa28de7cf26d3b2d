//! Run configuration consumed by the sync engine.

use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::retry::RetryPolicy;

/// Default number of transactions per import call.
pub const DEFAULT_CHUNK_SIZE: usize = 10;

pub const DEFAULT_ACCOUNT_NAME: &str = "Alpaca";

pub const DEFAULT_CURRENCY: &str = "USD";

/// What a run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OperationMode {
    /// Import new source activities and refresh the cash balance.
    #[default]
    Sync,
    /// Read-only listing of the destination account.
    List,
    /// Remove every activity from the destination account.
    DeleteAll,
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationMode::Sync => write!(f, "sync"),
            OperationMode::List => write!(f, "list"),
            OperationMode::DeleteAll => write!(f, "delete-all"),
        }
    }
}

impl FromStr for OperationMode {
    type Err = Error;

    /// Accepts the kebab-case names plus the legacy upper-case operation names.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" | "sync_alpaca" => Ok(OperationMode::Sync),
            "list" | "get_all_acts" => Ok(OperationMode::List),
            "delete-all" | "delete_all" | "delete_all_acts" => Ok(OperationMode::DeleteAll),
            other => Err(Error::Configuration(format!(
                "Unknown operation '{}'. Valid operations: sync, list, delete-all",
                other
            ))),
        }
    }
}

/// Configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub mode: OperationMode,
    /// Destination account, looked up by name.
    pub account_name: String,
    /// Currency of the destination account; fallback for activities without one.
    pub currency: String,
    /// Maximum transactions per import call.
    pub chunk_size: usize,
    /// Only fetch activities from the last N days.
    pub sync_days: Option<u32>,
    /// Platform to attach to a newly created account.
    pub platform_id: Option<String>,
    /// Required for delete-all.
    pub confirm_delete_all: bool,
    pub retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: OperationMode::Sync,
            account_name: DEFAULT_ACCOUNT_NAME.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            sync_days: None,
            platform_id: None,
            confirm_delete_all: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Checks the configuration before any remote call is made.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Configuration(
                "Chunk size must be greater than zero".to_string(),
            ));
        }
        if self.account_name.trim().is_empty() {
            return Err(Error::Configuration(
                "Destination account name must not be empty".to_string(),
            ));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::Configuration(format!(
                "Invalid currency code '{}'",
                self.currency
            )));
        }
        if self.mode == OperationMode::DeleteAll && !self.confirm_delete_all {
            return Err(Error::Configuration(
                "delete-all requires explicit confirmation (CONFIRM_DELETE_ALL=true)".to_string(),
            ));
        }
        Ok(())
    }

    /// Start of the look-back window relative to `today`.
    pub fn since(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.sync_days
            .and_then(|days| today.checked_sub_days(Days::new(u64::from(days))))
    }
}
