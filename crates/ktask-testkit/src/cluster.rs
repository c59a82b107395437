use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use k8s_openapi::{
    api::{batch::v1::Job, core::v1::Pod},
    apimachinery::pkg::apis::meta::v1::{LabelSelector as K8sSelector, ObjectMeta},
};
use ktask_core::{ClusterBackend, ClusterError};
use ktask_model::{Labels, ListQuery, Page, PageToken};
use parking_lot::Mutex;

const TOKEN_PREFIX: &str = "mem1.";
const CONTROLLER_UID: &str = "controller-uid";
const JOB_NAME: &str = "job-name";

/// Backend call observed by a [`MemoryCluster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateJob(String),
    GetJob(String),
    ListJobs {
        selector: String,
        limit: Option<u32>,
        continued: bool,
    },
    PatchJob(String),
    ListPods {
        selector: String,
    },
    ReadPodLog(String),
    PatchPod(String),
}

/// Namespaced in-memory Job/Pod store behaving like the cluster API.
///
/// - creating an existing name fails with 409
/// - reading or patching a missing name fails with 404
/// - listings are name-ordered, selector-filtered and paginated with opaque tokens
/// - created Jobs get a `controller-uid` pod selector when they carry none
#[derive(Clone)]
pub struct MemoryCluster {
    namespace: String,
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    jobs: BTreeMap<String, Job>,
    pods: BTreeMap<String, Pod>,
    logs: HashMap<String, String>,
    next_uid: u64,
    failure: Option<ClusterError>,
    calls: Vec<Call>,
}

impl MemoryCluster {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Store a Job as-is, bypassing any labeling done by the client.
    pub fn insert_job(&self, job: Job) -> Job {
        let mut inner = self.inner.lock();
        let job = inner.admit(&self.namespace, job);
        let name = job.metadata.name.clone().unwrap_or_default();
        inner.jobs.insert(name, job.clone());
        job
    }

    /// Create a pod owned by `job_name`, labeled the way the Job controller does.
    ///
    /// Returns `None` when no such Job exists.
    pub fn spawn_pod(&self, job_name: &str, pod_name: &str) -> Option<Pod> {
        let mut inner = self.inner.lock();
        let job = inner.jobs.get(job_name)?;

        let mut labels = job
            .spec
            .as_ref()
            .and_then(|s| s.selector.as_ref())
            .and_then(|s| s.match_labels.clone())
            .unwrap_or_default();
        labels.insert(JOB_NAME.to_string(), job_name.to_string());

        let pod = Pod {
            metadata: ObjectMeta {
                name: Some(pod_name.to_string()),
                namespace: Some(self.namespace.clone()),
                labels: Some(labels),
                ..Default::default()
            },
            ..Default::default()
        };
        inner.pods.insert(pod_name.to_string(), pod.clone());
        Some(pod)
    }

    pub fn set_log(&self, pod_name: &str, log: impl Into<String>) {
        self.inner
            .lock()
            .logs
            .insert(pod_name.to_string(), log.into());
    }

    /// Make every subsequent call fail with `err`, or restore normal behavior with `None`.
    pub fn fail_with(&self, err: Option<ClusterError>) {
        self.inner.lock().failure = err;
    }

    pub fn job(&self, name: &str) -> Option<Job> {
        self.inner.lock().jobs.get(name).cloned()
    }

    pub fn pod(&self, name: &str) -> Option<Pod> {
        self.inner.lock().pods.get(name).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    fn enter(&self, call: Call) -> Result<parking_lot::MutexGuard<'_, Inner>, ClusterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(call);
        if let Some(err) = inner.failure.clone() {
            return Err(err);
        }
        Ok(inner)
    }
}

impl Inner {
    fn admit(&mut self, namespace: &str, mut job: Job) -> Job {
        self.next_uid += 1;
        let uid = format!("uid-{:04}", self.next_uid);

        job.metadata.namespace = Some(namespace.to_string());
        job.metadata.uid = Some(uid.clone());

        let spec = job.spec.get_or_insert_default();
        if spec.selector.is_none() {
            spec.selector = Some(K8sSelector {
                match_labels: Some(Labels::from([(CONTROLLER_UID.to_string(), uid)])),
                ..Default::default()
            });
        }
        job
    }
}

fn paginate<T: Clone>(
    items: &BTreeMap<String, T>,
    labels: impl Fn(&T) -> Option<&Labels>,
    query: &ListQuery,
) -> Result<Page<T>, ClusterError> {
    let after = match &query.continue_token {
        Some(token) => Some(token.as_str().strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
            ClusterError::status(400, "BadRequest", "continue key is not valid")
        })?),
        None => None,
    };

    let mut matching = items
        .iter()
        .filter(|(name, _)| after.is_none_or(|a| name.as_str() > a))
        .filter(|(_, item)| query.selector.matches(labels(*item)));

    let limit = query.limit.map_or(usize::MAX, |l| l as usize);
    let page: Vec<(&String, &T)> = matching.by_ref().take(limit).collect();
    let next = match (page.last(), matching.next()) {
        (Some((last, _)), Some(_)) => PageToken::from_backend(Some(format!("{TOKEN_PREFIX}{last}"))),
        _ => None,
    };

    Ok(Page::new(
        page.into_iter().map(|(_, item)| item.clone()).collect(),
        next,
    ))
}

#[async_trait]
impl ClusterBackend for MemoryCluster {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn create_job(&self, job: &Job) -> Result<Job, ClusterError> {
        let name = job.metadata.name.clone().unwrap_or_default();
        let mut inner = self.enter(Call::CreateJob(name.clone()))?;
        if name.is_empty() {
            return Err(ClusterError::status(422, "Invalid", "metadata.name: Required value"));
        }
        if inner.jobs.contains_key(&name) {
            return Err(ClusterError::status(
                409,
                "AlreadyExists",
                format!("jobs.batch \"{name}\" already exists"),
            ));
        }
        let job = inner.admit(&self.namespace, job.clone());
        inner.jobs.insert(name, job.clone());
        Ok(job)
    }

    async fn get_job(&self, name: &str) -> Result<Job, ClusterError> {
        let inner = self.enter(Call::GetJob(name.to_string()))?;
        inner
            .jobs
            .get(name)
            .cloned()
            .ok_or_else(|| ClusterError::not_found(name))
    }

    async fn list_jobs(&self, query: &ListQuery) -> Result<Page<Job>, ClusterError> {
        let inner = self.enter(Call::ListJobs {
            selector: query.selector.to_string(),
            limit: query.limit,
            continued: query.continue_token.is_some(),
        })?;
        paginate(&inner.jobs, |j: &Job| j.metadata.labels.as_ref(), query)
    }

    async fn patch_job_labels(&self, name: &str, labels: &Labels) -> Result<Job, ClusterError> {
        let mut inner = self.enter(Call::PatchJob(name.to_string()))?;
        let job = inner
            .jobs
            .get_mut(name)
            .ok_or_else(|| ClusterError::not_found(name))?;
        job.metadata
            .labels
            .get_or_insert_default()
            .extend(labels.clone());
        Ok(job.clone())
    }

    async fn list_pods(&self, query: &ListQuery) -> Result<Page<Pod>, ClusterError> {
        let inner = self.enter(Call::ListPods {
            selector: query.selector.to_string(),
        })?;
        paginate(&inner.pods, |p: &Pod| p.metadata.labels.as_ref(), query)
    }

    async fn read_pod_log(&self, name: &str) -> Result<String, ClusterError> {
        let inner = self.enter(Call::ReadPodLog(name.to_string()))?;
        if !inner.pods.contains_key(name) {
            return Err(ClusterError::not_found(name));
        }
        Ok(inner.logs.get(name).cloned().unwrap_or_default())
    }

    async fn patch_pod_labels(&self, name: &str, labels: &Labels) -> Result<Pod, ClusterError> {
        let mut inner = self.enter(Call::PatchPod(name.to_string()))?;
        let pod = inner
            .pods
            .get_mut(name)
            .ok_or_else(|| ClusterError::not_found(name))?;
        pod.metadata
            .labels
            .get_or_insert_default()
            .extend(labels.clone());
        Ok(pod.clone())
    }
}
