use std::{sync::Arc, time::Duration};

use crate::error::ClusterError;

/// Result class of a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    NotFound,
    Error,
}

impl Outcome {
    pub fn of<T>(result: &Result<T, ClusterError>) -> Self {
        match result {
            Ok(_) => Outcome::Ok,
            Err(e) if e.is_not_found() => Outcome::NotFound,
            Err(_) => Outcome::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::NotFound => "not_found",
            Outcome::Error => "error",
        }
    }
}

/// Sink for backend call metrics.
pub trait MetricsBackend: Send + Sync + 'static {
    fn record_call(&self, operation: &'static str, outcome: Outcome, elapsed: Duration);

    /// A pod log read failed and was replaced by an empty result.
    fn record_log_read_failure(&self);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn record_call(&self, _operation: &'static str, _outcome: Outcome, _elapsed: Duration) {}

    fn record_log_read_failure(&self) {}
}

pub(crate) fn noop() -> Arc<dyn MetricsBackend> {
    Arc::new(NoopMetrics)
}
