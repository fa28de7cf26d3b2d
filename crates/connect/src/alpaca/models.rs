//! Alpaca API response types.

use serde::{Deserialize, Deserializer};

use brokersync_core::activities::SourceActivity;

/// Currency assumed when an activity does not carry one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Subset of `GET /v2/account`.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaAccount {
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub cash: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// One record of `GET /v2/account/activities`.
///
/// Trade activities (fills) carry `transaction_time`, `side`, `qty` and
/// `price`; non-trade activities carry `date` and `net_amount`.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaActivity {
    pub id: String,
    pub activity_type: String,
    #[serde(default)]
    pub transaction_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub qty: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub net_amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl From<AlpacaActivity> for SourceActivity {
    fn from(a: AlpacaActivity) -> Self {
        SourceActivity {
            id: a.id,
            activity_type: a.activity_type,
            side: a.side,
            symbol: a.symbol,
            quantity: a.qty,
            price: a.price,
            amount: a.net_amount,
            currency: Some(a.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
            timestamp: a.transaction_time.or(a.date).unwrap_or_default(),
        }
    }
}

/// Alpaca sends numbers as strings, but accept bare JSON numbers too.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fill_maps_to_source_activity() {
        let raw: AlpacaActivity = serde_json::from_value(json!({
            "id": "20240102150000000::abc",
            "activity_type": "FILL",
            "transaction_time": "2024-01-02T15:00:00.123Z",
            "type": "fill",
            "price": "187.15",
            "qty": "3",
            "side": "buy",
            "symbol": "AAPL",
            "leaves_qty": "0",
            "order_id": "9f1c"
        }))
        .unwrap();

        let activity = SourceActivity::from(raw);
        assert_eq!(activity.activity_type, "FILL");
        assert_eq!(activity.quantity.as_deref(), Some("3"));
        assert_eq!(activity.price.as_deref(), Some("187.15"));
        assert_eq!(activity.timestamp, "2024-01-02T15:00:00.123Z");
        assert_eq!(activity.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_non_trade_activity_uses_date_and_net_amount() {
        let raw: AlpacaActivity = serde_json::from_value(json!({
            "id": "20240105::div",
            "activity_type": "DIV",
            "date": "2024-01-05",
            "net_amount": 4.6,
            "symbol": "KO",
            "qty": null,
            "per_share_amount": "0.46",
            "status": "executed"
        }))
        .unwrap();

        let activity = SourceActivity::from(raw);
        assert_eq!(activity.timestamp, "2024-01-05");
        assert_eq!(activity.amount.as_deref(), Some("4.6"));
        assert_eq!(activity.quantity, None);
    }
}
