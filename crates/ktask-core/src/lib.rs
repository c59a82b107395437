//! Task orchestration over a Job/Pod cluster backend.
//!
//! A task is one task-master Job plus zero or more executor Jobs, tied together
//! only by labels (see [`LabelScheme`](ktask_model::LabelScheme)). [`TaskClient`]
//! translates task-level operations into label-selector queries against a
//! [`ClusterBackend`] and normalizes its failures into [`TaskError`].

pub mod backend;
pub use backend::ClusterBackend;

pub mod client;
pub use client::{ExecutorResources, TaskClient, TaskResources};

pub mod config;
pub use config::ClientConfig;

pub mod error;
pub use error::{ClusterError, ConfigError, TaskError};

pub mod metrics;
pub use metrics::{MetricsBackend, NoopMetrics, Outcome};

pub mod query;
pub use query::{Intent, Lookup, task_master_name, task_masters_query, translate};

pub use k8s_openapi::api::{batch::v1::Job, core::v1::Pod};
