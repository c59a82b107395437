use k8s_openapi::api::{batch::v1::Job, core::v1::Pod};
use ktask_model::{LabelScheme, TaskId, is_cancelled};
use tracing::{debug, instrument};

use super::TaskClient;
use crate::{backend::ClusterBackend, error::TaskError};

/// Every cluster resource owned by one task.
#[derive(Debug, Clone)]
pub struct TaskResources {
    pub master: Job,
    pub master_pods: Vec<Pod>,
    pub executors: Vec<ExecutorResources>,
}

#[derive(Debug, Clone)]
pub struct ExecutorResources {
    pub job: Job,
    pub pods: Vec<Pod>,
}

impl TaskResources {
    /// Whether the task-master carries the cancellation marker.
    pub fn is_cancelled(&self, scheme: &LabelScheme) -> bool {
        is_cancelled(scheme, self.master.metadata.labels.as_ref())
    }

    /// All pods of the task, task-master pods first.
    pub fn pods(&self) -> impl Iterator<Item = &Pod> {
        self.master_pods
            .iter()
            .chain(self.executors.iter().flat_map(|e| e.pods.iter()))
    }

    /// Whether a pod named `name` belongs to this task.
    pub fn contains_pod(&self, name: &str) -> bool {
        self.pods()
            .any(|p| p.metadata.name.as_deref() == Some(name))
    }
}

impl<B> TaskClient<B>
where
    B: ClusterBackend,
{
    /// Collect the task-master, its executors and the pods of each.
    ///
    /// Interpretation of the collected state is left to the caller.
    #[instrument(level = "debug", skip(self), fields(ns = %self.namespace()))]
    pub async fn read_task(&self, id: &TaskId) -> Result<TaskResources, TaskError> {
        let master = self.read_task_master_job(id).await?;
        let master_pods = self.list_job_pods(&master).await?;

        let jobs = self.list_executor_jobs(id).await?;
        let mut executors = Vec::with_capacity(jobs.len());
        for job in jobs {
            let pods = self.list_job_pods(&job).await?;
            executors.push(ExecutorResources { job, pods });
        }

        Ok(TaskResources {
            master,
            master_pods,
            executors,
        })
    }

    /// Mark a task cancelled: the task-master Job first, then each of its pods.
    ///
    /// Acting on the marker is up to the task-master; this call returns once the labels
    /// are applied. Calling it again re-applies the same labels.
    #[instrument(level = "debug", skip(self), fields(ns = %self.namespace()))]
    pub async fn cancel_task(&self, id: &TaskId) -> Result<(), TaskError> {
        let master = self.read_task_master_job(id).await?;
        self.mark_job_cancelled(id).await?;

        for pod in self.list_job_pods(&master).await? {
            let Some(name) = pod.metadata.name.as_deref() else {
                continue;
            };
            self.mark_pod_cancelled(name).await?;
        }
        debug!("task marked cancelled");
        Ok(())
    }
}
