use std::time::Duration;

use ktask_core::{MetricsBackend, Outcome};
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, proto::MetricFamily,
};

/// Backend call metrics registered in a private [`Registry`].
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    calls: IntCounterVec,
    durations: HistogramVec,
    log_failures: IntCounter,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Register into an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let calls = IntCounterVec::new(
            Opts::new(
                "ktask_backend_calls_total",
                "Cluster backend calls by operation and outcome",
            ),
            &["operation", "outcome"],
        )?;
        let durations = HistogramVec::new(
            HistogramOpts::new(
                "ktask_backend_call_duration_seconds",
                "Cluster backend call latency",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["operation"],
        )?;
        let log_failures = IntCounter::new(
            "ktask_log_read_failures_total",
            "Pod log reads that failed and returned nothing",
        )?;

        registry.register(Box::new(calls.clone()))?;
        registry.register(Box::new(durations.clone()))?;
        registry.register(Box::new(log_failures.clone()))?;

        Ok(Self {
            registry,
            calls,
            durations,
            log_failures,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_call(&self, operation: &'static str, outcome: Outcome, elapsed: Duration) {
        self.calls
            .with_label_values(&[operation, outcome.as_str()])
            .inc();
        self.durations
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    fn record_log_read_failure(&self) {
        self.log_failures.inc();
    }
}
