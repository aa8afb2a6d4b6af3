use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::domain::budget::DEFAULT_BUDGET_LIMIT;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Clone, Debug)]
pub struct Config {
    /// Backend base URL; `/api/...` is appended per call
    pub backend_url: String,
    /// Per-request limit for artifact downloads
    pub artifact_timeout: Duration,
    /// Where downloaded artifacts are written
    pub output_dir: PathBuf,
    pub budget_limit: Decimal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8001".to_string(),
            artifact_timeout: Duration::from_secs(30),
            output_dir: PathBuf::from("."),
            budget_limit: DEFAULT_BUDGET_LIMIT,
        }
    }
}

impl Config {
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_artifact_timeout(mut self, timeout: Duration) -> Self {
        self.artifact_timeout = timeout;
        self
    }

    /// Reject settings the configurator cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            anyhow::bail!("Backend URL must start with http:// or https://: {}", self.backend_url);
        }
        if self.artifact_timeout.is_zero() {
            anyhow::bail!("Artifact timeout must be greater than zero");
        }
        if self.budget_limit <= Decimal::ZERO {
            anyhow::bail!("Budget limit must be positive, got {}", self.budget_limit);
        }
        Ok(())
    }
}
