//! # HTTP Backend
//!
//! [`BackendApi`] over the clinic's REST API.
//!
//! ```text
//! GET  {base}/products-with-inventory   → Vec<ProductRow>  → Catalog
//! GET  {base}/clients                   → Vec<ClientRow>   → Vec<Client>
//! POST {base}/sales      SaleBody       → SaleResponse     → SaleReceipt
//! ```
//!
//! One request per call. The request timeout comes from configuration;
//! there is no retry.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client as HttpClient, Response};
use tracing::{debug, error, info, warn};

use vetpos_core::{Catalog, Client, SaleSubmission};

use crate::api::{BackendApi, SaleReceipt};
use crate::error::{BackendError, BackendResult};
use crate::wire::{into_catalog, ClientRow, ErrorBody, ProductRow, SaleBody, SaleResponse};

/// HTTP backend configuration.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Base URL, e.g. `http://localhost:3000/api`.
    pub base_url: String,

    /// Request timeout.
    pub timeout: Duration,
}

impl HttpBackendConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        HttpBackendConfig {
            base_url: base_url.into(),
            timeout,
        }
    }
}

/// REST client for the clinic backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: HttpClient,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client with the configured timeout.
    pub fn new(config: HttpBackendConfig) -> BackendResult<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(BackendError::InvalidConfig(
                "backend URL is not configured".to_string(),
            ));
        }

        let client = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::InvalidConfig(e.to_string()))?;

        Ok(HttpBackend { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turns a non-success response into a classified error.
    async fn rejection(response: Response) -> BackendError {
        let status = response.status().as_u16();
        let raw = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&raw).unwrap_or_default();

        BackendError::from_rejection(status, body.code.as_deref(), body.message_or(&raw))
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn fetch_catalog(&self) -> BackendResult<Catalog> {
        let url = self.url("products-with-inventory");
        debug!(url = %url, "Fetching catalog");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let err = Self::rejection(response).await;
            warn!(error = %err, "Catalog fetch failed");
            return Err(err);
        }

        let rows: Vec<ProductRow> = response.json().await?;
        let fetched = rows.len();
        let catalog = into_catalog(rows);

        info!(fetched, kept = catalog.len(), "Catalog fetched");
        Ok(catalog)
    }

    async fn fetch_clients(&self) -> BackendResult<Vec<Client>> {
        let url = self.url("clients");
        debug!(url = %url, "Fetching clients");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let rows: Vec<ClientRow> = response.json().await?;
        rows.into_iter().map(ClientRow::into_client).collect()
    }

    async fn submit_sale(&self, submission: &SaleSubmission) -> BackendResult<SaleReceipt> {
        let url = self.url("sales");
        debug!(
            client_id = %submission.client_id,
            lines = submission.lines.len(),
            total = %submission.total,
            "Submitting sale"
        );

        let body = SaleBody::from(submission);
        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let err = Self::rejection(response).await;
            if err.is_stock_rejection() {
                warn!(error = %err, "Sale rejected for stock");
            } else {
                error!(error = %err, "Sale submission failed");
            }
            return Err(err);
        }

        let parsed: SaleResponse = response.json().await?;
        let total = parsed
            .total
            .as_ref()
            .map(|t| t.to_money("total"))
            .transpose()?;

        let receipt = SaleReceipt {
            sale_id: parsed.id.to_string(),
            total,
            recorded_at: Utc::now(),
        };
        info!(sale_id = %receipt.sale_id, "Sale recorded");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_url() {
        let err = HttpBackend::new(HttpBackendConfig::new("  ", Duration::from_secs(5))).unwrap_err();
        assert!(matches!(err, BackendError::InvalidConfig(_)));
    }

    #[test]
    fn test_url_joining() {
        let backend =
            HttpBackend::new(HttpBackendConfig::new("http://localhost:3000/api/", Duration::from_secs(5)))
                .unwrap();
        assert_eq!(backend.base_url(), "http://localhost:3000/api");
        assert_eq!(
            backend.url("products-with-inventory"),
            "http://localhost:3000/api/products-with-inventory"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let backend =
            HttpBackend::new(HttpBackendConfig::new("http://127.0.0.1:9", Duration::from_secs(2)))
                .unwrap();
        let err = backend.fetch_catalog().await.unwrap_err();
        assert!(matches!(err, BackendError::Network(_)));
    }
}
