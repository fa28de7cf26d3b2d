//! Source activity → canonical transaction.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use rust_decimal::Decimal;

use super::activities_constants::*;
use super::activities_model::{
    CanonicalTransaction, DataSource, DestinationAccount, SourceActivity, TransactionType,
};
use crate::errors::{Error, Result};
use crate::symbols::SymbolMap;

/// Outcome of normalizing one source activity.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Transaction(CanonicalTransaction),
    /// Activity kind that is never imported; carries the raw type code.
    Skip(String),
}

/// Classifies a source activity by its raw type code and side.
///
/// Rules apply in priority order, so `DIVFEE` lands in the dividend family.
pub fn classify(activity_type: &str, side: Option<&str>) -> Option<TransactionType> {
    let code = activity_type.to_ascii_uppercase();

    if code == SOURCE_TYPE_FILL {
        let side = side.map(str::to_ascii_lowercase);
        return match side.as_deref() {
            Some(SIDE_BUY) => Some(TransactionType::Buy),
            Some(s) if SIDE_SELL.contains(&s) => Some(TransactionType::Sell),
            _ => None,
        };
    }
    if code.starts_with(SOURCE_DIVIDEND_PREFIX) {
        return Some(TransactionType::Dividend);
    }
    if code.starts_with(SOURCE_INTEREST_PREFIX) {
        return Some(TransactionType::Interest);
    }
    if is_fee_type(&code) {
        return Some(TransactionType::Fee);
    }
    None
}

/// Maps a source activity into the destination schema.
///
/// Unsupported kinds yield [`Normalized::Skip`]. A supported kind with a
/// missing or unparseable required field is a `MalformedActivity` error.
pub fn normalize(
    activity: &SourceActivity,
    symbols: &SymbolMap,
    account: &DestinationAccount,
) -> Result<Normalized> {
    let Some(transaction_type) = classify(&activity.activity_type, activity.side.as_deref())
    else {
        debug!(
            "Skipping unsupported activity {} ({})",
            activity.id, activity.activity_type
        );
        return Ok(Normalized::Skip(activity.activity_type.clone()));
    };

    validate_id(&activity.id)?;

    let date = parse_timestamp(&activity.id, &activity.timestamp)?;
    let currency = activity
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(&account.currency)
        .to_string();
    let id = activity.id.as_str();

    let transaction = match transaction_type {
        TransactionType::Buy | TransactionType::Sell => {
            let symbol = required_symbol(activity, symbols)?;
            let quantity = required_decimal(id, "qty", activity.quantity.as_deref())?.abs();
            let price = required_decimal(id, "price", activity.price.as_deref())?.abs();
            CanonicalTransaction::new(
                id,
                None,
                &account.id,
                transaction_type,
                symbol,
                quantity,
                price,
                Decimal::ZERO,
                currency,
                DataSource::Yahoo,
                date,
            )
        }
        TransactionType::Dividend => {
            let symbol = required_symbol(activity, symbols)?;
            let amount = required_decimal(id, "amount", activity.amount.as_deref())?;
            let qty = optional_decimal(id, "qty", activity.quantity.as_deref())?;
            let (quantity, unit_price) = match qty {
                Some(q) if q > Decimal::ZERO => {
                    let per_share = amount.checked_div(q).ok_or_else(|| {
                        Error::malformed(id, "dividend per-share amount overflows")
                    })?;
                    (q, per_share.abs())
                }
                _ => (Decimal::ONE, amount.abs()),
            };
            CanonicalTransaction::new(
                id,
                None,
                &account.id,
                transaction_type,
                symbol,
                quantity,
                unit_price,
                Decimal::ZERO,
                currency,
                DataSource::Yahoo,
                date,
            )
        }
        TransactionType::Interest => {
            let amount = required_decimal(id, "amount", activity.amount.as_deref())?;
            CanonicalTransaction::new(
                id,
                Some(INTEREST_COMMENT_LABEL),
                &account.id,
                transaction_type,
                currency.clone(),
                Decimal::ONE,
                amount.abs(),
                Decimal::ZERO,
                currency,
                DataSource::Manual,
                date,
            )
        }
        TransactionType::Fee => {
            let amount = required_decimal(id, "amount", activity.amount.as_deref())?;
            CanonicalTransaction::new(
                id,
                Some(FEE_COMMENT_LABEL),
                &account.id,
                transaction_type,
                currency.clone(),
                Decimal::ZERO,
                Decimal::ZERO,
                amount.abs(),
                currency,
                DataSource::Manual,
                date,
            )
        }
    };

    Ok(Normalized::Transaction(transaction))
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::malformed(id, "empty id"));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(Error::malformed(id, "id contains whitespace"));
    }
    Ok(())
}

fn required_symbol(activity: &SourceActivity, symbols: &SymbolMap) -> Result<String> {
    let raw = activity
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::malformed(&activity.id, "missing symbol"))?;
    Ok(symbols.resolve(raw).to_string())
}

/// Strict decimal parsing: plain notation first, then scientific.
fn parse_decimal(source_id: &str, field: &str, value: &str) -> Result<Decimal> {
    let value = value.trim();
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| Error::malformed(source_id, format!("invalid {} '{}'", field, value)))
}

fn required_decimal(source_id: &str, field: &str, value: Option<&str>) -> Result<Decimal> {
    match value {
        Some(v) if !v.trim().is_empty() => parse_decimal(source_id, field, v),
        _ => Err(Error::malformed(source_id, format!("missing {}", field))),
    }
}

fn optional_decimal(source_id: &str, field: &str, value: Option<&str>) -> Result<Option<Decimal>> {
    match value {
        Some(v) if !v.trim().is_empty() => parse_decimal(source_id, field, v).map(Some),
        _ => Ok(None),
    }
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(source_id: &str, value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| Error::malformed(source_id, format!("invalid timestamp '{}'", value)))
}
