//! HTTP client for the Alpaca trading API.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use brokersync_core::activities::{DestinationAccount, SourceActivity};
use brokersync_core::errors::{Error, Result};
use brokersync_core::sync::SourceActivityProvider;

use super::models::{AlpacaAccount, AlpacaActivity};
use crate::http::{build_client, parse_response, transport_error};

/// Paper-trading endpoint, used when no base URL is configured.
pub const DEFAULT_ALPACA_BASE_URL: &str = "https://paper-api.alpaca.markets";

/// Maximum page size accepted by the activities endpoint.
pub const DEFAULT_PAGE_SIZE: usize = 100;

const API_KEY_HEADER: &str = "apca-api-key-id";
const SECRET_KEY_HEADER: &str = "apca-api-secret-key";

/// HTTP client for the Alpaca API.
///
/// # Example
///
/// ```ignore
/// let client = AlpacaClient::new(DEFAULT_ALPACA_BASE_URL, "key", "secret", Duration::from_secs(30))?;
/// let cash = client.get_account().await?.cash;
/// ```
#[derive(Debug, Clone)]
pub struct AlpacaClient {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    page_size: usize,
}

impl AlpacaClient {
    /// Create a new Alpaca client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the keys cannot be sent as headers
    /// or the HTTP client cannot be initialized.
    pub fn new(base_url: &str, api_key: &str, secret_key: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in [(API_KEY_HEADER, api_key), (SECRET_KEY_HEADER, secret_key)] {
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Configuration(format!("Invalid {} value: {}", name, e)))?;
            headers.insert(HeaderName::from_static(name), value);
        }

        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override the page size (mostly useful for tests).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("[Alpaca] GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error("Alpaca request failed", e))?;

        parse_response(&format!("Alpaca GET {}", path), response).await
    }

    /// Fetch the trading account.
    pub async fn get_account(&self) -> Result<AlpacaAccount> {
        self.get("/v2/account", &[]).await
    }

    /// Fetch one page of account activities in ascending order.
    pub async fn get_activities_page(
        &self,
        after: Option<NaiveDate>,
        page_token: Option<&str>,
    ) -> Result<Vec<AlpacaActivity>> {
        let mut query = vec![
            ("direction", "asc".to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if let Some(after) = after {
            query.push(("after", after.format("%Y-%m-%d").to_string()));
        }
        if let Some(token) = page_token {
            query.push(("page_token", token.to_string()));
        }
        self.get("/v2/account/activities", &query).await
    }

    /// Fetch every activity, following `page_token` until a short page.
    pub async fn get_all_activities(&self, after: Option<NaiveDate>) -> Result<Vec<AlpacaActivity>> {
        let mut activities: Vec<AlpacaActivity> = Vec::new();
        let mut page_token: Option<String> = None;
        let mut page = 0;

        loop {
            let batch = self.get_activities_page(after, page_token.as_deref()).await?;
            let count = batch.len();
            debug!("[Alpaca] Page {}: {} activities", page, count);

            let last_id = batch.last().map(|a| a.id.clone());
            activities.extend(batch);

            if count < self.page_size {
                break;
            }
            // A token that does not advance would loop forever.
            if last_id.is_none() || last_id == page_token {
                break;
            }
            page_token = last_id;
            page += 1;
        }

        info!("[Alpaca] Fetched {} activities", activities.len());
        Ok(activities)
    }
}

#[async_trait]
impl SourceActivityProvider for AlpacaClient {
    async fn fetch_activities(
        &self,
        _account: &DestinationAccount,
        since: Option<NaiveDate>,
    ) -> Result<Vec<SourceActivity>> {
        let activities = self.get_all_activities(since).await?;
        Ok(activities.into_iter().map(SourceActivity::from).collect())
    }

    async fn fetch_cash_balance(&self, _account: &DestinationAccount) -> Result<Decimal> {
        let account = self.get_account().await?;
        let cash = account
            .cash
            .ok_or_else(|| Error::Unexpected("Alpaca account has no cash field".to_string()))?;
        Decimal::from_str(cash.trim())
            .or_else(|_| Decimal::from_scientific(cash.trim()))
            .map_err(|e| Error::Unexpected(format!("Invalid cash value '{}': {}", cash, e)))
    }
}
