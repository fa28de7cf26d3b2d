//! Ghostfolio API request and response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokersync_core::activities::{CanonicalTransaction, DestinationAccount, DestinationActivity};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnonymousAuthRequest<'a> {
    pub access_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnonymousAuthResponse {
    pub auth_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountsResponse {
    #[serde(default)]
    pub accounts: Vec<DestinationAccount>,
}

/// Body for `POST /api/v1/account` and `PUT /api/v1/account/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub balance: Decimal,
    pub currency: &'a str,
    pub is_excluded: bool,
    pub name: &'a str,
    pub platform_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportRequest<'a> {
    pub activities: &'a [CanonicalTransaction],
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersResponse {
    #[serde(default)]
    pub activities: Vec<GhostfolioOrder>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SymbolProfile {
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Activity as returned by `GET /api/v1/order`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GhostfolioOrder {
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, rename = "type")]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, rename = "SymbolProfile")]
    pub symbol_profile: Option<SymbolProfile>,
}

impl From<GhostfolioOrder> for DestinationActivity {
    fn from(order: GhostfolioOrder) -> Self {
        DestinationActivity {
            id: order.id,
            account_id: order.account_id,
            comment: order.comment,
            activity_type: order.activity_type,
            date: order.date,
            symbol: order.symbol_profile.and_then(|p| p.symbol),
        }
    }
}
