//! Prometheus metrics backend for the task client.
//!
//! [`PrometheusMetrics`] implements [`ktask_core::MetricsBackend`] and records every
//! call the client makes to the cluster backend.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use ktask_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: Arc<dyn ktask_core::MetricsBackend> = Arc::new(metrics.clone());
//! // TaskClient::new(backend, labels)?.with_metrics(handle);
//!
//! let families = metrics.gather();
//! assert!(!families.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `ktask_backend_calls_total{operation, outcome}` - Counter
//! - `ktask_backend_call_duration_seconds{operation}` - Histogram
//! - `ktask_log_read_failures_total` - Counter
//!
//! This crate does NOT serve `/metrics`; encode [`PrometheusMetrics::gather`] with
//! [`TextEncoder`] from your own HTTP stack.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
