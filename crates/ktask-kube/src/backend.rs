use async_trait::async_trait;
use k8s_openapi::api::{batch::v1::Job, core::v1::Pod};
use kube::{
    Api, Client,
    api::{ListParams, LogParams, ObjectList, Patch, PatchParams, PostParams},
};
use serde_json::json;
use tracing::{debug, info};

use ktask_core::{ClientConfig, ClusterBackend, ClusterError};
use ktask_model::{Labels, ListQuery, Page, PageToken};

use crate::error::{KubeError, cluster_error};

/// Jobs and Pods of one namespace.
///
/// Reads, creates and lists use one client; label patches use a second one, which may
/// carry different credentials. Both may be the same client.
#[derive(Clone)]
pub struct KubeBackend {
    namespace: String,
    jobs: Api<Job>,
    job_patches: Api<Job>,
    pods: Api<Pod>,
    pod_patches: Api<Pod>,
}

impl KubeBackend {
    pub fn new(client: Client, patch_client: Client, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            jobs: Api::namespaced(client.clone(), namespace),
            job_patches: Api::namespaced(patch_client.clone(), namespace),
            pods: Api::namespaced(client, namespace),
            pod_patches: Api::namespaced(patch_client, namespace),
        }
    }

    /// Use one client for reads and patches alike.
    pub fn with_client(client: Client, namespace: &str) -> Self {
        Self::new(client.clone(), client, namespace)
    }

    /// Build from the ambient kubeconfig or in-cluster service account.
    pub async fn try_default(cfg: &ClientConfig) -> Result<Self, KubeError> {
        cfg.validate()?;
        let client = Client::try_default().await?;
        info!(namespace = %cfg.namespace, "kubernetes client ready");
        Ok(Self::with_client(client, &cfg.namespace))
    }
}

fn list_params(query: &ListQuery) -> ListParams {
    let mut lp = ListParams::default();
    if !query.selector.is_empty() {
        lp = lp.labels(&query.selector.to_string());
    }
    if let Some(limit) = query.limit {
        lp = lp.limit(limit);
    }
    if let Some(token) = &query.continue_token {
        lp = lp.continue_token(token.as_str());
    }
    lp
}

fn into_page<T: Clone>(list: ObjectList<T>) -> Page<T> {
    Page::new(list.items, PageToken::from_backend(list.metadata.continue_))
}

fn label_patch(labels: &Labels) -> serde_json::Value {
    json!({ "metadata": { "labels": labels } })
}

#[async_trait]
impl ClusterBackend for KubeBackend {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn create_job(&self, job: &Job) -> Result<Job, ClusterError> {
        self.jobs
            .create(&PostParams::default(), job)
            .await
            .map_err(cluster_error)
    }

    async fn get_job(&self, name: &str) -> Result<Job, ClusterError> {
        self.jobs.get(name).await.map_err(cluster_error)
    }

    async fn list_jobs(&self, query: &ListQuery) -> Result<Page<Job>, ClusterError> {
        let list = self
            .jobs
            .list(&list_params(query))
            .await
            .map_err(cluster_error)?;
        debug!(items = list.items.len(), more = list.metadata.continue_.is_some(), "jobs listed");
        Ok(into_page(list))
    }

    async fn patch_job_labels(&self, name: &str, labels: &Labels) -> Result<Job, ClusterError> {
        let patch = label_patch(labels);
        self.job_patches
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(cluster_error)
    }

    async fn list_pods(&self, query: &ListQuery) -> Result<Page<Pod>, ClusterError> {
        let list = self
            .pods
            .list(&list_params(query))
            .await
            .map_err(cluster_error)?;
        Ok(into_page(list))
    }

    async fn read_pod_log(&self, name: &str) -> Result<String, ClusterError> {
        self.pods
            .logs(name, &LogParams::default())
            .await
            .map_err(cluster_error)
    }

    async fn patch_pod_labels(&self, name: &str, labels: &Labels) -> Result<Pod, ClusterError> {
        let patch = label_patch(labels);
        self.pod_patches
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(cluster_error)
    }
}
