use async_trait::async_trait;
use k8s_openapi::api::{batch::v1::Job, core::v1::Pod};
use ktask_model::{Labels, ListQuery, Page};

use crate::error::ClusterError;

/// Namespaced access to the Job and Pod resource families of a cluster.
///
/// Implementations bind the namespace at construction. Reads, creates and lists go
/// through one connection; label patches may go through a separate one, since patch
/// payloads negotiate a different content type.
#[async_trait]
pub trait ClusterBackend: Send + Sync + 'static {
    /// Namespace every call is scoped to.
    fn namespace(&self) -> &str;

    async fn create_job(&self, job: &Job) -> Result<Job, ClusterError>;

    async fn get_job(&self, name: &str) -> Result<Job, ClusterError>;

    /// One page of Jobs. The returned token is `None` when the listing is exhausted.
    async fn list_jobs(&self, query: &ListQuery) -> Result<Page<Job>, ClusterError>;

    /// Merge `labels` into the Job's labels. Keys not mentioned are left alone.
    async fn patch_job_labels(&self, name: &str, labels: &Labels) -> Result<Job, ClusterError>;

    async fn list_pods(&self, query: &ListQuery) -> Result<Page<Pod>, ClusterError>;

    /// Log of the pod's primary container.
    async fn read_pod_log(&self, name: &str) -> Result<String, ClusterError>;

    /// Merge `labels` into the Pod's labels.
    async fn patch_pod_labels(&self, name: &str, labels: &Labels) -> Result<Pod, ClusterError>;
}
