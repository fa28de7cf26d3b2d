//! Activity domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fingerprint::marker_comment;

/// Activity record as reported by the brokerage.
///
/// Numeric and timestamp fields keep the exact text the provider sent; they
/// are only parsed during normalization, where a bad value becomes a
/// `MalformedActivity` error tied to this record's id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceActivity {
    /// Provider id. Stable and never reused.
    pub id: String,
    /// Raw provider type code (FILL, DIV, INTNRA, CFEE, JNLC, ...)
    pub activity_type: String,
    /// Fill side (buy, sell, sell_short). Only present on fills.
    pub side: Option<String>,
    pub symbol: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
    /// Net cash amount for non-trade activities.
    pub amount: Option<String>,
    pub currency: Option<String>,
    /// RFC 3339 timestamp for fills, `YYYY-MM-DD` date for the rest.
    pub timestamp: String,
}

/// Canonical transaction type understood by the portfolio tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
    Interest,
    Fee,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "BUY"),
            TransactionType::Sell => write!(f, "SELL"),
            TransactionType::Dividend => write!(f, "DIVIDEND"),
            TransactionType::Interest => write!(f, "INTEREST"),
            TransactionType::Fee => write!(f, "FEE"),
        }
    }
}

/// Where the tracker should look up prices for the transaction's symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSource {
    /// Listed securities.
    Yahoo,
    /// Cash-only rows (interest, fees).
    Manual,
}

/// Destination-schema representation of one source activity.
///
/// Serializes to the tracker's import payload shape. The comment always
/// embeds `source_id=<id>`, which is how later runs recognise it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalTransaction {
    pub account_id: String,
    pub comment: String,
    pub currency: String,
    pub data_source: DataSource,
    pub date: DateTime<Utc>,
    pub fee: Decimal,
    pub quantity: Decimal,
    pub symbol: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub unit_price: Decimal,
    #[serde(skip)]
    source_id: String,
}

impl CanonicalTransaction {
    /// Build a transaction whose comment carries the source marker.
    ///
    /// `label` is appended after the marker (e.g. "Interest").
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_id: impl Into<String>,
        label: Option<&str>,
        account_id: impl Into<String>,
        transaction_type: TransactionType,
        symbol: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        fee: Decimal,
        currency: impl Into<String>,
        data_source: DataSource,
        date: DateTime<Utc>,
    ) -> Self {
        let source_id = source_id.into();
        Self {
            account_id: account_id.into(),
            comment: marker_comment(&source_id, label),
            currency: currency.into(),
            data_source,
            date,
            fee,
            quantity,
            symbol: symbol.into(),
            transaction_type,
            unit_price,
            source_id,
        }
    }

    /// The id of the source activity this transaction was derived from.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }
}

/// Activity already stored in the portfolio tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationActivity {
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    /// Free-text comment. Absent or foreign for manually entered records.
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, rename = "type")]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Tracker account a run reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationAccount {
    pub id: String,
    pub name: String,
    pub currency: String,
    #[serde(default)]
    pub platform_id: Option<String>,
}
