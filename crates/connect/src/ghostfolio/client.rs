//! HTTP client for the Ghostfolio API.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use brokersync_core::activities::{CanonicalTransaction, DestinationAccount, DestinationActivity};
use brokersync_core::errors::{Error, Result};
use brokersync_core::sync::{BatchItemResult, DestinationLedger};

use super::models::{
    AccountPayload, AccountsResponse, AnonymousAuthRequest, AnonymousAuthResponse, ImportRequest,
    OrdersResponse,
};
use crate::http::{build_client, parse_response, read_body, transport_error};

/// Hosted Ghostfolio instance.
pub const DEFAULT_GHOSTFOLIO_HOST: &str = "https://ghostfol.io";

/// HTTP client for a Ghostfolio instance.
///
/// # Example
///
/// ```ignore
/// let client = GhostfolioClient::connect(DEFAULT_GHOSTFOLIO_HOST, None, Some("access-key"), timeout).await?;
/// let account = client.find_account("Alpaca").await?;
/// ```
#[derive(Debug, Clone)]
pub struct GhostfolioClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderValue,
}

impl GhostfolioClient {
    /// Create a client from a bearer token.
    pub fn new(host: &str, bearer_token: &str, timeout: Duration) -> Result<Self> {
        let auth_header = HeaderValue::from_str(&format!("Bearer {}", bearer_token))
            .map_err(|e| Error::Configuration(format!("Invalid access token format: {}", e)))?;

        Ok(Self {
            client: build_client(timeout)?,
            base_url: host.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    /// Create a client from either a bearer token or a user access key.
    ///
    /// The token wins when both are set. An access key is exchanged for a
    /// bearer token through the anonymous auth endpoint.
    pub async fn connect(
        host: &str,
        bearer_token: Option<&str>,
        access_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        if let Some(token) = non_empty(bearer_token) {
            return Self::new(host, token, timeout);
        }
        let Some(key) = non_empty(access_key) else {
            return Err(Error::Configuration(
                "Either a Ghostfolio token or access key is required".to_string(),
            ));
        };

        info!("No bearer token provided, exchanging access key");
        let client = build_client(timeout)?;
        let base_url = host.trim_end_matches('/');
        let response = client
            .post(format!("{}/api/v1/auth/anonymous", base_url))
            .header(CONTENT_TYPE, "application/json")
            .json(&AnonymousAuthRequest { access_token: key })
            .send()
            .await
            .map_err(|e| transport_error("Ghostfolio auth request failed", e))?;

        let auth: AnonymousAuthResponse =
            parse_response("Ghostfolio anonymous auth", response).await?;
        if auth.auth_token.is_empty() {
            return Err(Error::Authentication(
                "Ghostfolio returned an empty auth token".to_string(),
            ));
        }
        debug!("Obtained Ghostfolio bearer token");
        Self::new(host, &auth.auth_token, timeout)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, self.auth_header.clone());
        headers
    }

    fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("[Ghostfolio] {} {}", method, url);

        let mut builder = self
            .client
            .request(method, &url)
            .headers(self.headers())
            .query(query);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T> {
        let context = format!("Ghostfolio {} {}", method, path);
        let response = self
            .request(method, path, query, body)
            .send()
            .await
            .map_err(|e| transport_error(&context, e))?;
        parse_response(&context, response).await
    }

    async fn send_empty<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<()> {
        let context = format!("Ghostfolio {} {}", method, path);
        let response = self
            .request(method, path, &[], body)
            .send()
            .await
            .map_err(|e| transport_error(&context, e))?;
        read_body(&context, response).await.map(|_| ())
    }

    /// All accounts of the authenticated user.
    pub async fn get_accounts(&self) -> Result<Vec<DestinationAccount>> {
        let response: AccountsResponse = self
            .send_json(Method::GET, "/api/v1/account", &[], None::<&()>)
            .await?;
        Ok(response.accounts)
    }

    /// Delete a single activity.
    pub async fn delete_activity(&self, id: &str) -> Result<()> {
        let path = format!("/api/v1/order/{}", urlencoding::encode(id));
        self.send_empty(Method::DELETE, &path, None::<&()>).await
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[async_trait]
impl DestinationLedger for GhostfolioClient {
    async fn find_account(&self, name: &str) -> Result<Option<DestinationAccount>> {
        let accounts = self.get_accounts().await?;
        debug!("[Ghostfolio] {} accounts", accounts.len());
        Ok(accounts.into_iter().find(|a| a.name == name))
    }

    async fn create_account(
        &self,
        name: &str,
        currency: &str,
        platform_id: Option<&str>,
    ) -> Result<DestinationAccount> {
        let payload = AccountPayload {
            id: None,
            balance: Decimal::ZERO,
            currency,
            is_excluded: false,
            name,
            platform_id,
        };
        let account: DestinationAccount = self
            .send_json(Method::POST, "/api/v1/account", &[], Some(&payload))
            .await?;
        info!("Created account '{}' ({})", account.name, account.id);
        Ok(account)
    }

    async fn list_activities(&self, account: &DestinationAccount) -> Result<Vec<DestinationActivity>> {
        let response: OrdersResponse = self
            .send_json(
                Method::GET,
                "/api/v1/order",
                &[("accounts", account.id.as_str())],
                None::<&()>,
            )
            .await?;
        Ok(response
            .activities
            .into_iter()
            .map(DestinationActivity::from)
            // The endpoint may ignore the filter on older instances.
            .filter(|a| a.account_id.as_deref().map_or(true, |id| id == account.id))
            .collect())
    }

    /// The import endpoint is all-or-nothing: success applies every item,
    /// a rejected payload fails the whole chunk.
    async fn import_batch(
        &self,
        transactions: &[CanonicalTransaction],
    ) -> Result<Vec<BatchItemResult>> {
        let request = ImportRequest {
            activities: transactions,
        };
        self.send_empty(Method::POST, "/api/v1/import", Some(&request))
            .await?;
        Ok(transactions
            .iter()
            .map(|t| BatchItemResult::ok(t.source_id()))
            .collect())
    }

    async fn delete_activities(&self, ids: &[String]) -> Result<Vec<BatchItemResult>> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            match self.delete_activity(id).await {
                Ok(()) => results.push(BatchItemResult::ok(id)),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!("Failed to delete activity {}: {}", id, err);
                    results.push(BatchItemResult::failed(id, err.to_string()));
                }
            }
        }
        Ok(results)
    }

    async fn update_account_balance(
        &self,
        account: &DestinationAccount,
        balance: Decimal,
    ) -> Result<()> {
        let payload = AccountPayload {
            id: Some(&account.id),
            balance,
            currency: &account.currency,
            is_excluded: false,
            name: &account.name,
            platform_id: account.platform_id.as_deref(),
        };
        let path = format!("/api/v1/account/{}", urlencoding::encode(&account.id));
        self.send_empty(Method::PUT, &path, Some(&payload)).await
    }
}
