mod task;
pub use task::{ExecutorResources, TaskResources};

use std::{future::Future, sync::Arc, time::Instant};

use k8s_openapi::api::{batch::v1::Job, core::v1::Pod};
use ktask_model::{JobKind, LabelScheme, ListQuery, Page, PageToken, TaskId};
use tracing::{debug, info, instrument, warn};

use crate::{
    backend::ClusterBackend,
    error::{ClusterError, ConfigError, TaskError},
    metrics::{self, MetricsBackend, Outcome},
    query::{Intent, Lookup, task_master_name, task_masters_query, translate},
};

/// Task-level facade over a [`ClusterBackend`].
///
/// Stateless apart from the immutable handles it is built with; share it behind an
/// `Arc` for concurrent use. No call is retried.
pub struct TaskClient<B> {
    backend: B,
    labels: LabelScheme,
    metrics: Arc<dyn MetricsBackend>,
}

impl<B> TaskClient<B>
where
    B: ClusterBackend,
{
    /// Fails when `labels` does not pass [`LabelScheme::validate`].
    pub fn new(backend: B, labels: LabelScheme) -> Result<Self, ConfigError> {
        labels.validate()?;
        Ok(Self {
            backend,
            labels,
            metrics: metrics::noop(),
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsBackend>) -> Self {
        self.metrics = metrics;
        self
    }

    #[inline]
    pub fn labels(&self) -> &LabelScheme {
        &self.labels
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        self.backend.namespace()
    }

    /// Create the task-master Job of `id`.
    ///
    /// The Job is renamed to `id` and stamped with the task-master kind and task-id labels.
    /// A duplicate id is rejected by the backend and surfaces as a backend failure.
    #[instrument(level = "debug", skip(self, job), fields(ns = %self.namespace()))]
    pub async fn create_task_master_job(&self, id: &TaskId, job: Job) -> Result<Job, TaskError> {
        let mut job = job;
        job.metadata.name = Some(id.to_string());
        self.create_job(id, JobKind::TaskMaster, job).await
    }

    /// Create an executor Job belonging to `id`. The Job keeps its own name.
    #[instrument(level = "debug", skip(self, job), fields(ns = %self.namespace()))]
    pub async fn create_executor_job(&self, id: &TaskId, job: Job) -> Result<Job, TaskError> {
        self.create_job(id, JobKind::Executor, job).await
    }

    async fn create_job(&self, id: &TaskId, kind: JobKind, mut job: Job) -> Result<Job, TaskError> {
        self.labels
            .stamp(job.metadata.labels.get_or_insert_default(), kind, id);
        debug!(name = ?job.metadata.name, %kind, "creating job");

        let created = self
            .observe("create_job", self.backend.create_job(&job))
            .await?;
        Ok(created)
    }

    /// Read the task-master Job of `id`.
    ///
    /// Fails with [`TaskError::NotFound`] when no Job is named `id`, or when the Job under
    /// that name is not labeled as a task-master.
    #[instrument(level = "debug", skip(self), fields(ns = %self.namespace()))]
    pub async fn read_task_master_job(&self, id: &TaskId) -> Result<Job, TaskError> {
        let name = task_master_name(id);

        let job = self
            .observe("get_job", self.backend.get_job(&name))
            .await
            .map_err(|e| TaskError::from_lookup(id, e))?;

        match JobKind::of(&self.labels, job.metadata.labels.as_ref()) {
            Some(JobKind::TaskMaster) => Ok(job),
            other => {
                debug!(kind = ?other, "job exists but is not a task-master");
                Err(TaskError::NotFound(id.clone()))
            }
        }
    }

    /// One page of Jobs matching `query`.
    pub async fn list_jobs(&self, query: &ListQuery) -> Result<Page<Job>, TaskError> {
        debug!(selector = %query.selector, limit = ?query.limit, "listing jobs");
        let page = self
            .observe("list_jobs", self.backend.list_jobs(query))
            .await?;
        Ok(page)
    }

    /// One page of task-master Jobs. Chain the returned token to continue.
    #[instrument(level = "debug", skip(self, token), fields(ns = %self.namespace()))]
    pub async fn list_task_master_jobs(
        &self,
        token: Option<PageToken>,
        limit: Option<u32>,
    ) -> Result<Page<Job>, TaskError> {
        self.list_jobs(&task_masters_query(&self.labels, token, limit))
            .await
    }

    /// Every executor Job of `id`. Never includes the task-master.
    #[instrument(level = "debug", skip(self), fields(ns = %self.namespace()))]
    pub async fn list_executor_jobs(&self, id: &TaskId) -> Result<Vec<Job>, TaskError> {
        self.drain_jobs(translate(&self.labels, Intent::ExecutorsOf(id)))
            .await
    }

    /// Every executor Job in the namespace.
    #[instrument(level = "debug", skip(self), fields(ns = %self.namespace()))]
    pub async fn list_all_executor_jobs(&self) -> Result<Vec<Job>, TaskError> {
        self.drain_jobs(translate(&self.labels, Intent::AllExecutors))
            .await
    }

    /// Pods selected by `job`'s own match labels.
    pub async fn list_job_pods(&self, job: &Job) -> Result<Vec<Pod>, TaskError> {
        let lookup = translate(&self.labels, Intent::PodsOfJob(job));
        if lookup == Lookup::Empty {
            warn!(job = ?job.metadata.name, "job has no pod selector; no pods listed");
        }
        self.drain_pods(lookup).await
    }

    /// Every pod spawned by any Job in the namespace.
    #[instrument(level = "debug", skip(self), fields(ns = %self.namespace()))]
    pub async fn list_all_job_pods(&self) -> Result<Vec<Pod>, TaskError> {
        self.drain_pods(translate(&self.labels, Intent::AllJobPods))
            .await
    }

    /// Best-effort log of a pod's primary container.
    ///
    /// Never fails: a backend error is logged and `None` is returned.
    #[instrument(level = "debug", skip(self), fields(ns = %self.namespace()))]
    pub async fn read_pod_log(&self, pod: &str) -> Option<String> {
        match self
            .observe("read_pod_log", self.backend.read_pod_log(pod))
            .await
        {
            Ok(log) => Some(log),
            Err(e) => {
                info!(pod, error = %e, "getting logs for pod failed");
                self.metrics.record_log_read_failure();
                None
            }
        }
    }

    /// Apply the cancellation label to the Job named `id`.
    ///
    /// Does not wait for the cluster to react. Re-applying the marker is harmless.
    #[instrument(level = "debug", skip(self), fields(ns = %self.namespace()))]
    pub async fn mark_job_cancelled(&self, id: &TaskId) -> Result<(), TaskError> {
        let labels = self.labels.cancelled_labels();
        self.observe(
            "patch_job_labels",
            self.backend.patch_job_labels(id.as_str(), &labels),
        )
        .await
        .map_err(|e| TaskError::from_lookup(id, e))?;
        Ok(())
    }

    /// Apply the cancellation label to a pod.
    #[instrument(level = "debug", skip(self), fields(ns = %self.namespace()))]
    pub async fn mark_pod_cancelled(&self, pod: &str) -> Result<(), TaskError> {
        let labels = self.labels.cancelled_labels();
        self.observe(
            "patch_pod_labels",
            self.backend.patch_pod_labels(pod, &labels),
        )
        .await?;
        Ok(())
    }

    async fn drain_jobs(&self, lookup: Lookup) -> Result<Vec<Job>, TaskError> {
        let Lookup::List(mut query) = lookup else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        loop {
            let page = self.list_jobs(&query).await?;
            out.extend(page.items);
            match page.next {
                Some(token) => {
                    query.continue_token = Some(advance("list_jobs", &query, token)?);
                }
                None => return Ok(out),
            }
        }
    }

    async fn drain_pods(&self, lookup: Lookup) -> Result<Vec<Pod>, TaskError> {
        let Lookup::List(mut query) = lookup else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        loop {
            debug!(selector = %query.selector, "listing pods");
            let page = self
                .observe("list_pods", self.backend.list_pods(&query))
                .await?;
            out.extend(page.items);
            match page.next {
                Some(token) => {
                    query.continue_token = Some(advance("list_pods", &query, token)?);
                }
                None => return Ok(out),
            }
        }
    }

    async fn observe<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, ClusterError>>,
    ) -> Result<T, ClusterError> {
        let started = Instant::now();
        let result = call.await;
        let outcome = Outcome::of(&result);
        self.metrics
            .record_call(operation, outcome, started.elapsed());
        if let Err(e) = &result
            && outcome == Outcome::Error
        {
            warn!(operation, error = %e, "backend call failed");
        }
        result
    }
}

/// Reject a continuation token equal to the one just sent.
fn advance(operation: &str, query: &ListQuery, next: PageToken) -> Result<PageToken, TaskError> {
    if query.continue_token.as_ref() == Some(&next) {
        warn!(operation, token = next.as_str(), "continuation token did not advance");
        return Err(TaskError::Backend(ClusterError::Transport(format!(
            "{operation}: continuation token did not advance"
        ))));
    }
    Ok(next)
}
