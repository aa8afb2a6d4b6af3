use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::{Catalog, CatalogItem};
use crate::models::OrderPayload;
use crate::submission::ArtifactKind;

pub mod http;

pub use http::HttpBackend;

// ============================================================================
// Order Backend - the request/response boundary
// ============================================================================
//
// Three calls cross it: catalog load at startup, order creation, and
// artifact retrieval. Everything else in the crate is synchronous.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend rejected the request ({status})")]
    Rejected {
        status: u16,
        /// Server-provided explanation, when it sent one
        detail: Option<String>,
    },

    #[error("Backend returned an empty payload")]
    EmptyPayload,

    #[error("Failed to decode backend response: {0}")]
    Decode(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Server detail suitable for showing to the user, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            BackendError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, BackendError>;

    /// Create the order and return its opaque id. `request_token` is stable
    /// across retries of the same submission.
    async fn submit_order(&self, payload: &OrderPayload, request_token: Uuid) -> Result<String, BackendError>;

    async fn fetch_artifact(&self, order_id: &str, kind: ArtifactKind) -> Result<Vec<u8>, BackendError>;

    /// Address a person can open directly when the download fails.
    fn artifact_url(&self, order_id: &str, kind: ArtifactKind) -> String;
}

/// Load and validate the catalog. Any failure is fatal to the configurator;
/// there is no partial catalog.
pub async fn load_catalog<B: OrderBackend + ?Sized>(backend: &B) -> anyhow::Result<Catalog> {
    let items = backend
        .fetch_catalog()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load product catalog: {}", e))?;

    let catalog = Catalog::new(items)?;
    tracing::info!(products = catalog.len(), "Product catalog loaded");

    Ok(catalog)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    struct StaticBackend {
        items: Result<Vec<CatalogItem>, u16>,
    }

    #[async_trait]
    impl OrderBackend for StaticBackend {
        async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, BackendError> {
            self.items.clone().map_err(|status| BackendError::Rejected { status, detail: None })
        }

        async fn submit_order(&self, _payload: &OrderPayload, _token: Uuid) -> Result<String, BackendError> {
            Err(BackendError::EmptyPayload)
        }

        async fn fetch_artifact(&self, _order_id: &str, _kind: ArtifactKind) -> Result<Vec<u8>, BackendError> {
            Err(BackendError::EmptyPayload)
        }

        fn artifact_url(&self, order_id: &str, kind: ArtifactKind) -> String {
            format!("test://{}/{}", order_id, kind.wire_name())
        }
    }

    #[tokio::test]
    async fn test_load_catalog() {
        let backend = StaticBackend {
            items: Ok(vec![CatalogItem::new("pads", "Bettschutzeinlagen", "", Decimal::new(2440, 2))]),
        };

        let catalog = load_catalog(&backend).await.unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_load_catalog_fails_closed_on_transport() {
        let backend = StaticBackend { items: Err(503) };
        let err = load_catalog(&backend).await.unwrap_err();
        assert!(err.to_string().contains("Failed to load product catalog"));
    }

    #[tokio::test]
    async fn test_load_catalog_rejects_empty_and_invalid() {
        let empty = StaticBackend { items: Ok(vec![]) };
        assert!(load_catalog(&empty).await.is_err());

        let negative = StaticBackend {
            items: Ok(vec![CatalogItem::new("x", "X", "", Decimal::new(-100, 2))]),
        };
        assert!(load_catalog(&negative).await.is_err());
    }

    #[test]
    fn test_error_detail() {
        let err = BackendError::Rejected {
            status: 422,
            detail: Some("Ungültige PLZ".to_string()),
        };
        assert_eq!(err.detail(), Some("Ungültige PLZ"));
        assert!(BackendError::EmptyPayload.detail().is_none());
    }
}
