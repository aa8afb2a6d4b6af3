use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Url;
use uuid::Uuid;

use crate::catalog::{CatalogItem, CatalogListing};
use crate::models::{ErrorResponse, OrderCreatedResponse, OrderPayload};
use crate::submission::{is_plausible_order_id, ArtifactKind};

use super::{BackendError, OrderBackend};

// ============================================================================
// HTTP Backend
// ============================================================================
//
// GET  {base}/api/products
// POST {base}/api/orders
// GET  {base}/api/orders/{id}/pdf?pdf_type={kind}
//
// ============================================================================

const USER_AGENT_VALUE: &str = concat!("carebox-order/", env!("CARGO_PKG_VERSION"));

/// Header carrying the per-submission request token.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    artifact_timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, artifact_timeout: Duration) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let base_url = base_url.into();
        let parsed = Url::parse(&base_url).map_err(|e| BackendError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url));
        }

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: parsed,
            artifact_timeout,
        })
    }

    /// `{base}/api/{segments...}`, each segment percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Always writable: new() rejects cannot-be-a-base URLs
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    /// Turn a non-2xx response into `Rejected`, keeping the server's detail.
    async fn reject(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|error| error.detail_text());

        tracing::warn!(status, detail = ?detail, "Backend rejected request");
        BackendError::Rejected { status, detail }
    }
}

#[async_trait]
impl OrderBackend for HttpBackend {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, BackendError> {
        let url = self.endpoint(&["products"]);
        tracing::debug!("Fetching catalog from {}", url);

        let response = self.client.get(url).header(ACCEPT, "application/json").send().await?;
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let body = response.text().await?;
        let listing: CatalogListing = serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(listing.products)
    }

    async fn submit_order(&self, payload: &OrderPayload, request_token: Uuid) -> Result<String, BackendError> {
        let url = self.endpoint(&["orders"]);
        tracing::debug!(request_token = %request_token, "Posting order to {}", url);

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .header(IDEMPOTENCY_KEY_HEADER, request_token.to_string())
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let body = response.text().await?;
        let created: OrderCreatedResponse =
            serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))?;

        check_order_id(&created.id)?;
        Ok(created.id)
    }

    async fn fetch_artifact(&self, order_id: &str, kind: ArtifactKind) -> Result<Vec<u8>, BackendError> {
        let url = self.artifact_url(order_id, kind);
        tracing::debug!(kind = %kind, "Fetching artifact from {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, kind.media_type())
            .timeout(self.artifact_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(BackendError::EmptyPayload);
        }

        Ok(bytes.to_vec())
    }

    fn artifact_url(&self, order_id: &str, kind: ArtifactKind) -> String {
        let mut url = self.endpoint(&["orders", order_id, "pdf"]);
        url.query_pairs_mut().append_pair("pdf_type", kind.wire_name());
        url.into()
    }
}

// The id ends up in request paths and file names.
fn check_order_id(id: &str) -> Result<(), BackendError> {
    if id.trim().is_empty() {
        return Err(BackendError::Decode("order id is empty".to_string()));
    }
    if !is_plausible_order_id(id) {
        return Err(BackendError::Decode(format!("unexpected characters in order id {:?}", id)));
    }
    Ok(())
}
