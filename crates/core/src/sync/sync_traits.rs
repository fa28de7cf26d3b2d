//! Capability traits for the remote systems a run talks to.
//!
//! The engine only sees these traits; concrete HTTP adapters live outside the
//! core crate.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::activities::{
    CanonicalTransaction, DestinationAccount, DestinationActivity, SourceActivity,
};
use crate::errors::Result;
use crate::symbols::SymbolMap;

/// Outcome for a single item of a batch call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    /// Source id for imports, destination id for deletions.
    pub id: String,
    /// Rejection reason. `None` means the item was applied.
    pub error: Option<String>,
}

impl BatchItemResult {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Brokerage side of a run.
#[async_trait]
pub trait SourceActivityProvider: Send + Sync {
    /// Fetch activities in the provider's chronological order.
    ///
    /// `since` limits the fetch to activities after that date.
    async fn fetch_activities(
        &self,
        account: &DestinationAccount,
        since: Option<NaiveDate>,
    ) -> Result<Vec<SourceActivity>>;

    /// Current cash balance of the brokerage account.
    async fn fetch_cash_balance(&self, account: &DestinationAccount) -> Result<Decimal>;
}

/// Portfolio tracker side of a run.
#[async_trait]
pub trait DestinationLedger: Send + Sync {
    async fn find_account(&self, name: &str) -> Result<Option<DestinationAccount>>;

    async fn create_account(
        &self,
        name: &str,
        currency: &str,
        platform_id: Option<&str>,
    ) -> Result<DestinationAccount>;

    async fn list_activities(&self, account: &DestinationAccount) -> Result<Vec<DestinationActivity>>;

    /// Import one chunk. Returns one result per submitted transaction.
    async fn import_batch(&self, transactions: &[CanonicalTransaction])
        -> Result<Vec<BatchItemResult>>;

    /// Delete the given destination ids. Returns one result per id.
    async fn delete_activities(&self, ids: &[String]) -> Result<Vec<BatchItemResult>>;

    async fn update_account_balance(
        &self,
        account: &DestinationAccount,
        balance: Decimal,
    ) -> Result<()>;
}

/// Loader for the per-run symbol map.
pub trait SymbolMapSource: Send + Sync {
    fn load(&self) -> Result<SymbolMap>;
}

/// Symbol source that always yields a fixed map.
#[derive(Debug, Clone, Default)]
pub struct StaticSymbolMap(pub SymbolMap);

impl SymbolMapSource for StaticSymbolMap {
    fn load(&self) -> Result<SymbolMap> {
        Ok(self.0.clone())
    }
}
