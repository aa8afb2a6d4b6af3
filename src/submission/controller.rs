use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::{BackendError, OrderBackend};
use crate::metrics::Metrics;
use crate::models::OrderPayload;

use super::artifacts::{artifact_file_name, ArtifactKind, ArtifactState};

// ============================================================================
// Submission Controller
// ============================================================================
//
// Lifecycle, independent of the wizard's current step:
// - Idle: nothing sent yet
// - Submitting: one request in flight, further submits are refused
// - Submitted: order id known, artifacts can be fetched per kind
// - SubmitFailed: last attempt failed, a retry is allowed
//
// Each artifact kind has its own Idle → Fetching → Ready | FetchFailed
// sub-state; different kinds may be fetched at the same time.
//
// ============================================================================

const SUBMIT_FAILED_MESSAGE: &str = "Fehler beim Erstellen der Bestellung";

/// Oldest notices are dropped beyond this many.
pub const MAX_NOTICES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    Submitted { order_id: String },
    SubmitFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created { order_id: String },
    /// Server detail when it sent one, otherwise a generic message
    Failed { message: String },
    /// Another submission is still awaiting the backend
    InFlight,
    AlreadySubmitted { order_id: String },
    /// The controller was reset while the request was in flight; the
    /// response (an order id, if one was created) was not recorded
    Discarded { order_id: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    Downloaded {
        file_name: String,
        media_type: &'static str,
        bytes: Vec<u8>,
    },
    /// The download failed; the same document is reachable at `url`
    Fallback { url: String },
    /// A fetch of this kind is already running
    Busy,
    NoOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// User-facing notification raised by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

struct ControllerState {
    phase: SubmissionPhase,
    /// Reused for every attempt until an order exists
    request_token: Option<Uuid>,
    artifacts: HashMap<ArtifactKind, ArtifactState>,
    notices: Vec<Notice>,
    /// Bumped by reset so late responses from before it are ignored
    generation: u64,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            phase: SubmissionPhase::Idle,
            request_token: None,
            artifacts: HashMap::new(),
            notices: Vec::new(),
            generation: 0,
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        if self.notices.len() >= MAX_NOTICES {
            self.notices.remove(0);
        }
        self.notices.push(Notice {
            level,
            message: message.into(),
            raised_at: Utc::now(),
        });
    }
}

pub struct SubmissionController<B> {
    backend: Arc<B>,
    state: Arc<Mutex<ControllerState>>,
    metrics: Option<Arc<Metrics>>,
}

impl<B> Clone for SubmissionController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            state: self.state.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<B: OrderBackend> SubmissionController<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(ControllerState::new())),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Send the order once. Refused while a submission is in flight or after
    /// an order has been created.
    pub async fn submit(&self, payload: &OrderPayload) -> SubmitOutcome {
        let (token, generation) = {
            let mut state = self.state.lock().await;

            match &state.phase {
                SubmissionPhase::Submitting => {
                    tracing::debug!("Submission already in flight");
                    return SubmitOutcome::InFlight;
                }
                SubmissionPhase::Submitted { order_id } => {
                    tracing::debug!(order_id = %order_id, "Order already submitted");
                    return SubmitOutcome::AlreadySubmitted {
                        order_id: order_id.clone(),
                    };
                }
                SubmissionPhase::Idle | SubmissionPhase::SubmitFailed { .. } => {}
            }

            state.phase = SubmissionPhase::Submitting;
            let token = *state.request_token.get_or_insert_with(Uuid::new_v4);
            (token, state.generation)
        };

        if let Some(metrics) = &self.metrics {
            metrics.submission_started();
        }
        tracing::info!(
            request_token = %token,
            lines = payload.products.len(),
            "Submitting order"
        );

        let result = self.backend.submit_order(payload, token).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            tracing::warn!(request_token = %token, "Submission finished after reset; result discarded");
            if let Some(metrics) = &self.metrics {
                metrics.record_submission("discarded");
            }
            return SubmitOutcome::Discarded {
                order_id: result.ok(),
            };
        }

        match result {
            Ok(order_id) => {
                tracing::info!(order_id = %order_id, "Order created");
                state.phase = SubmissionPhase::Submitted {
                    order_id: order_id.clone(),
                };
                state.notify(NoticeLevel::Success, "Bestellung erfolgreich erstellt!");
                if let Some(metrics) = &self.metrics {
                    metrics.record_submission("created");
                }
                SubmitOutcome::Created { order_id }
            }
            Err(err) => {
                tracing::error!(error = %err, "Order submission failed");
                let message = failure_message(&err);
                state.phase = SubmissionPhase::SubmitFailed {
                    message: message.clone(),
                };
                state.notify(NoticeLevel::Error, message.clone());
                if let Some(metrics) = &self.metrics {
                    metrics.record_submission("failed");
                }
                SubmitOutcome::Failed { message }
            }
        }
    }

    /// Download one artifact. On any failure the direct URL is handed back
    /// instead of an error.
    pub async fn fetch_artifact(&self, kind: ArtifactKind, last_name: &str) -> ArtifactOutcome {
        let (order_id, generation) = {
            let mut state = self.state.lock().await;

            let order_id = match &state.phase {
                SubmissionPhase::Submitted { order_id } => order_id.clone(),
                _ => {
                    state.notify(NoticeLevel::Error, "Keine Bestellung gefunden");
                    return ArtifactOutcome::NoOrder;
                }
            };

            if state.artifacts.get(&kind) == Some(&ArtifactState::Fetching) {
                return ArtifactOutcome::Busy;
            }
            state.artifacts.insert(kind, ArtifactState::Fetching);
            (order_id, state.generation)
        };

        let started = Instant::now();
        let result = match self.backend.fetch_artifact(&order_id, kind).await {
            Ok(bytes) if bytes.is_empty() => Err(BackendError::EmptyPayload),
            other => other,
        };
        let elapsed = started.elapsed().as_secs_f64();

        if let Some(metrics) = &self.metrics {
            metrics.record_artifact_fetch(kind.wire_name(), elapsed, result.is_ok());
        }

        let mut state = self.state.lock().await;
        let observed = state.generation == generation;

        match result {
            Ok(bytes) => {
                let file_name = artifact_file_name(kind, &order_id, last_name);
                tracing::info!(
                    order_id = %order_id,
                    kind = %kind,
                    size = bytes.len(),
                    "Artifact downloaded as {}",
                    file_name
                );
                if observed {
                    state.artifacts.insert(
                        kind,
                        ArtifactState::Ready {
                            file_name: file_name.clone(),
                            size: bytes.len(),
                        },
                    );
                    state.notify(NoticeLevel::Success, format!("Download: {}", file_name));
                }
                ArtifactOutcome::Downloaded {
                    file_name,
                    media_type: kind.media_type(),
                    bytes,
                }
            }
            Err(err) => {
                let url = self.backend.artifact_url(&order_id, kind);
                tracing::warn!(order_id = %order_id, kind = %kind, error = %err, "Artifact download failed, falling back to direct link");
                if observed {
                    state.artifacts.insert(
                        kind,
                        ArtifactState::FetchFailed {
                            fallback_url: url.clone(),
                        },
                    );
                    state.notify(NoticeLevel::Info, format!("Download direkt öffnen: {}", url));
                }
                ArtifactOutcome::Fallback { url }
            }
        }
    }

    /// Fetch several kinds at once; results come back in the order asked.
    pub async fn fetch_artifacts(&self, kinds: &[ArtifactKind], last_name: &str) -> Vec<(ArtifactKind, ArtifactOutcome)> {
        let fetches = kinds.iter().map(|&kind| async move { (kind, self.fetch_artifact(kind, last_name).await) });
        join_all(fetches).await
    }

    /// Back to `Idle`: forgets the order, the request token and all artifact
    /// sub-states. Requests still in flight finish unobserved.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        tracing::info!("Submission controller reset");
        let generation = state.generation + 1;
        *state = ControllerState::new();
        state.generation = generation;
    }

    pub async fn phase(&self) -> SubmissionPhase {
        self.state.lock().await.phase.clone()
    }

    pub async fn order_id(&self) -> Option<String> {
        match &self.state.lock().await.phase {
            SubmissionPhase::Submitted { order_id } => Some(order_id.clone()),
            _ => None,
        }
    }

    pub async fn artifact_state(&self, kind: ArtifactKind) -> ArtifactState {
        self.state.lock().await.artifacts.get(&kind).cloned().unwrap_or_default()
    }

    pub async fn notices(&self) -> Vec<Notice> {
        self.state.lock().await.notices.clone()
    }

    /// Hand over all pending notices and forget them.
    pub async fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.state.lock().await.notices)
    }

    pub async fn request_token(&self) -> Option<Uuid> {
        self.state.lock().await.request_token
    }
}

fn failure_message(err: &BackendError) -> String {
    err.detail()
        .map(str::to_string)
        .unwrap_or_else(|| SUBMIT_FAILED_MESSAGE.to_string())
}

// ============================================================================
// Unit Tests
// ============================================================================
