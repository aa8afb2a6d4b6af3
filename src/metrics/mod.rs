use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Wizard store transitions (by action kind)
// - Step gate refusals (by step)
// - Order submissions (by outcome)
// - Artifact downloads (by kind and outcome, with latency)
//
// All metrics are registered with one Prometheus registry owned here.
// ============================================================================

/// Central metrics registry for the configurator
pub struct Metrics {
    registry: Registry,

    // Wizard Metrics
    pub transitions_total: IntCounterVec,
    pub gate_refusals_total: IntCounterVec,

    // Submission Metrics
    pub submissions_total: IntCounterVec,
    pub submissions_in_flight: IntGauge,

    // Artifact Metrics
    pub artifact_fetches_total: IntCounterVec,
    pub artifact_fetch_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Wizard Metrics
        let transitions_total = IntCounterVec::new(
            Opts::new("wizard_transitions_total", "Store transitions applied"),
            &["action"],
        )?;
        registry.register(Box::new(transitions_total.clone()))?;

        let gate_refusals_total = IntCounterVec::new(
            Opts::new("wizard_gate_refusals_total", "Forward navigation refused by a step gate"),
            &["step"],
        )?;
        registry.register(Box::new(gate_refusals_total.clone()))?;

        // Submission Metrics
        let submissions_total = IntCounterVec::new(
            Opts::new("order_submissions_total", "Order submissions by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(submissions_total.clone()))?;

        let submissions_in_flight = IntGauge::new(
            "order_submissions_in_flight",
            "Order submissions currently awaiting the backend",
        )?;
        registry.register(Box::new(submissions_in_flight.clone()))?;

        // Artifact Metrics
        let artifact_fetches_total = IntCounterVec::new(
            Opts::new("artifact_fetches_total", "Artifact downloads by kind and outcome"),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(artifact_fetches_total.clone()))?;

        let artifact_fetch_duration = HistogramVec::new(
            HistogramOpts::new("artifact_fetch_duration_seconds", "Artifact download duration")
                .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["kind"],
        )?;
        registry.register(Box::new(artifact_fetch_duration.clone()))?;

        Ok(Self {
            registry,
            transitions_total,
            gate_refusals_total,
            submissions_total,
            submissions_in_flight,
            artifact_fetches_total,
            artifact_fetch_duration,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record an applied store transition
    pub fn record_transition(&self, action: &str) {
        self.transitions_total.with_label_values(&[action]).inc();
    }

    /// Helper to record a gate refusal
    pub fn record_gate_refusal(&self, step: &str) {
        self.gate_refusals_total.with_label_values(&[step]).inc();
    }

    /// Helper to mark a submission as started
    pub fn submission_started(&self) {
        self.submissions_in_flight.inc();
    }

    /// Helper to record how a submission ended
    pub fn record_submission(&self, outcome: &str) {
        self.submissions_in_flight.dec();
        self.submissions_total.with_label_values(&[outcome]).inc();
    }

    /// Helper to record an artifact download
    pub fn record_artifact_fetch(&self, kind: &str, duration_secs: f64, success: bool) {
        let outcome = if success { "downloaded" } else { "fallback" };
        self.artifact_fetches_total.with_label_values(&[kind, outcome]).inc();
        self.artifact_fetch_duration.with_label_values(&[kind]).observe(duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_transition() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transition("set_quantity");
        metrics.record_transition("set_quantity");
        metrics.record_transition("reset");

        assert_eq!(metrics.transitions_total.with_label_values(&["set_quantity"]).get(), 2);
        assert_eq!(metrics.transitions_total.with_label_values(&["reset"]).get(), 1);
    }

    #[test]
    fn test_submission_gauge_resets_on_outcome() {
        let metrics = Metrics::new().unwrap();
        metrics.submission_started();
        assert_eq!(metrics.submissions_in_flight.get(), 1);

        metrics.record_submission("created");
        assert_eq!(metrics.submissions_in_flight.get(), 0);
        assert_eq!(metrics.submissions_total.with_label_values(&["created"]).get(), 1);
    }

    #[test]
    fn test_record_artifact_fetch() {
        let metrics = Metrics::new().unwrap();
        metrics.record_artifact_fetch("all", 0.2, true);
        metrics.record_artifact_fetch("main", 0.1, false);

        assert_eq!(metrics.artifact_fetches_total.with_label_values(&["all", "downloaded"]).get(), 1);
        assert_eq!(metrics.artifact_fetches_total.with_label_values(&["main", "fallback"]).get(), 1);
        assert_eq!(metrics.artifact_fetch_duration.with_label_values(&["all"]).get_sample_count(), 1);
    }
}
