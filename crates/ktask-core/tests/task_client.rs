use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use ktask_core::{
    ClusterBackend, ClusterError, ConfigError, Job, MetricsBackend, Outcome, Pod, TaskClient,
    TaskError,
};
use ktask_model::{
    LabelScheme, Labels, ListQuery, ListTasksResponse, Page, PageToken, TaskId, is_cancelled,
};
use ktask_testkit::{Call, MemoryCluster, job};

fn setup() -> (MemoryCluster, TaskClient<MemoryCluster>) {
    let cluster = MemoryCluster::new("tasks");
    let client = TaskClient::new(cluster.clone(), LabelScheme::default()).unwrap();
    (cluster, client)
}

fn id(s: &str) -> TaskId {
    TaskId::new(s).unwrap()
}

fn label<'a>(job: &'a Job, key: &str) -> Option<&'a str> {
    job.metadata
        .labels
        .as_ref()
        .and_then(|l| l.get(key))
        .map(String::as_str)
}

#[tokio::test]
async fn read_missing_task_is_not_found() {
    let (_, client) = setup();
    let err = client.read_task_master_job(&id("nope")).await.unwrap_err();
    assert!(matches!(err, TaskError::NotFound(ref t) if t.as_str() == "nope"));
}

#[tokio::test]
async fn read_job_without_master_label_is_not_found() {
    let (cluster, client) = setup();
    cluster.insert_job(job("t-1", &[("app", "unrelated")]));
    cluster.insert_job(job("t-2", &[("job-kind", "executor"), ("task-id", "t-2")]));

    for name in ["t-1", "t-2"] {
        let err = client.read_task_master_job(&id(name)).await.unwrap_err();
        assert!(err.is_not_found(), "{name} must not resolve");
    }
}

#[tokio::test]
async fn read_after_create_returns_master() {
    let (_, client) = setup();
    let created = client
        .create_task_master_job(&id("t-42"), job("ignored-name", &[]))
        .await
        .unwrap();
    assert_eq!(created.metadata.name.as_deref(), Some("t-42"));

    let read = client.read_task_master_job(&id("t-42")).await.unwrap();
    assert_eq!(read.metadata.name.as_deref(), Some("t-42"));
    assert_eq!(label(&read, "job-kind"), Some("task-master"));
    assert_eq!(label(&read, "task-id"), Some("t-42"));
    assert_eq!(read.metadata.namespace.as_deref(), Some("tasks"));
}

#[tokio::test]
async fn duplicate_create_is_backend_failure() {
    let (_, client) = setup();
    client
        .create_task_master_job(&id("t-1"), job("x", &[]))
        .await
        .unwrap();
    let err = client
        .create_task_master_job(&id("t-1"), job("x", &[]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TaskError::Backend(ClusterError::Status { code: 409, .. })
    ));
}

#[tokio::test]
async fn backend_error_on_read_is_not_masked_as_not_found() {
    let (cluster, client) = setup();
    cluster.fail_with(Some(ClusterError::status(500, "InternalError", "etcd down")));
    let err = client.read_task_master_job(&id("t-1")).await.unwrap_err();
    assert!(matches!(err, TaskError::Backend(_)));

    cluster.fail_with(Some(ClusterError::Transport("connection refused".into())));
    let err = client.read_task_master_job(&id("t-1")).await.unwrap_err();
    assert!(matches!(err, TaskError::Backend(ClusterError::Transport(_))));
}

#[tokio::test]
async fn paginated_listing_enumerates_each_master_once() {
    let (cluster, client) = setup();
    for i in 0..11 {
        client
            .create_task_master_job(&id(&format!("task-{i:02}")), job("x", &[]))
            .await
            .unwrap();
        client
            .create_executor_job(&id(&format!("task-{i:02}")), job(&format!("exec-{i:02}"), &[]))
            .await
            .unwrap();
    }
    cluster.insert_job(job("stray", &[]));

    let mut seen = Vec::new();
    let mut token = None;
    let mut calls = 0;
    loop {
        let page = client.list_task_master_jobs(token, Some(4)).await.unwrap();
        calls += 1;
        assert!(page.items.len() <= 4);
        seen.extend(page.items.into_iter().filter_map(|j| j.metadata.name));
        token = page.next;
        if token.is_none() {
            break;
        }
    }

    assert_eq!(calls, 3);
    assert_eq!(seen.len(), 11);
    let unique: HashSet<_> = seen.iter().collect();
    assert_eq!(unique.len(), 11);
    assert!(seen.iter().all(|n| n.starts_with("task-")));
}

#[tokio::test]
async fn list_without_page_size_returns_everything() {
    let (_, client) = setup();
    for i in 0..5 {
        client
            .create_task_master_job(&id(&format!("t{i}")), job("x", &[]))
            .await
            .unwrap();
    }
    let page = client.list_task_master_jobs(None, None).await.unwrap();
    assert_eq!(page.items.len(), 5);
    assert!(page.is_last());

    let page = client.list_task_master_jobs(None, Some(0)).await.unwrap();
    assert_eq!(page.items.len(), 5);
}

#[tokio::test]
async fn page_token_is_passed_through_verbatim() {
    let (cluster, client) = setup();
    let token = PageToken::from_caller("not-a-real-cursor");
    let err = client.list_task_master_jobs(token, Some(2)).await.unwrap_err();
    assert!(matches!(err, TaskError::Backend(ClusterError::Status { code: 400, .. })));
    assert_eq!(
        cluster.calls(),
        vec![Call::ListJobs {
            selector: "job-kind=task-master".into(),
            limit: Some(2),
            continued: true,
        }]
    );
}

#[tokio::test]
async fn executors_of_task_exclude_master_and_other_tasks() {
    let (_, client) = setup();
    let t42 = id("t-42");
    client
        .create_task_master_job(&t42, job("x", &[]))
        .await
        .unwrap();

    assert!(client.list_executor_jobs(&t42).await.unwrap().is_empty());

    client
        .create_executor_job(&t42, job("t-42-ex-00", &[]))
        .await
        .unwrap();
    client
        .create_executor_job(&id("t-43"), job("t-43-ex-00", &[]))
        .await
        .unwrap();

    let executors = client.list_executor_jobs(&t42).await.unwrap();
    assert_eq!(executors.len(), 1);
    let exec = &executors[0];
    assert_eq!(exec.metadata.name.as_deref(), Some("t-42-ex-00"));
    assert_eq!(label(exec, "job-kind"), Some("executor"));
    assert_eq!(label(exec, "task-id"), Some("t-42"));

    let all = client.list_all_executor_jobs().await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn pods_are_found_through_job_selector() {
    let (cluster, client) = setup();
    let master = client
        .create_task_master_job(&id("t-1"), job("x", &[]))
        .await
        .unwrap();
    let exec = client
        .create_executor_job(&id("t-1"), job("t-1-ex-00", &[]))
        .await
        .unwrap();
    cluster.spawn_pod("t-1", "t-1-aaaaa").unwrap();
    cluster.spawn_pod("t-1", "t-1-bbbbb").unwrap();
    cluster.spawn_pod("t-1-ex-00", "t-1-ex-00-ccccc").unwrap();

    let pods = client.list_job_pods(&master).await.unwrap();
    let mut names: Vec<_> = pods.into_iter().filter_map(|p| p.metadata.name).collect();
    names.sort();
    assert_eq!(names, vec!["t-1-aaaaa", "t-1-bbbbb"]);

    let pods = client.list_job_pods(&exec).await.unwrap();
    assert_eq!(pods.len(), 1);

    assert_eq!(client.list_all_job_pods().await.unwrap().len(), 3);
}

#[tokio::test]
async fn job_without_selector_lists_no_pods_and_makes_no_call() {
    let (cluster, client) = setup();
    let bare = job("bare", &[]);
    let pods = client.list_job_pods(&bare).await.unwrap();
    assert!(pods.is_empty());
    assert!(cluster.calls().is_empty());
}

#[tokio::test]
async fn pod_log_is_fail_soft() {
    let (cluster, client) = setup();
    client
        .create_task_master_job(&id("t-1"), job("x", &[]))
        .await
        .unwrap();
    cluster.spawn_pod("t-1", "t-1-pod").unwrap();
    cluster.set_log("t-1-pod", "hello\n");

    assert_eq!(client.read_pod_log("t-1-pod").await.as_deref(), Some("hello\n"));
    assert_eq!(client.read_pod_log("no-such-pod").await, None);

    cluster.fail_with(Some(ClusterError::Transport("timeout".into())));
    assert_eq!(client.read_pod_log("t-1-pod").await, None);
}

#[tokio::test]
async fn cancelling_twice_keeps_marker() {
    let (cluster, client) = setup();
    let t = id("t-1");
    client
        .create_task_master_job(&t, job("x", &[("team", "genomics")]))
        .await
        .unwrap();

    client.mark_job_cancelled(&t).await.unwrap();
    client.mark_job_cancelled(&t).await.unwrap();

    let stored = cluster.job("t-1").unwrap();
    assert_eq!(label(&stored, "task-status"), Some("Cancelled"));
    assert_eq!(label(&stored, "job-kind"), Some("task-master"));
    assert_eq!(label(&stored, "team"), Some("genomics"));
}

#[tokio::test]
async fn cancelling_missing_job_is_not_found() {
    let (_, client) = setup();
    let err = client.mark_job_cancelled(&id("ghost")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn cancelling_missing_pod_is_backend_failure() {
    let (_, client) = setup();
    let err = client.mark_pod_cancelled("ghost").await.unwrap_err();
    assert!(matches!(err, TaskError::Backend(ref e) if e.is_not_found()));
}

#[tokio::test]
async fn cancel_task_marks_master_and_its_pods() {
    let (cluster, client) = setup();
    let t = id("t-7");
    client.create_task_master_job(&t, job("x", &[])).await.unwrap();
    cluster.spawn_pod("t-7", "t-7-pod").unwrap();

    client.cancel_task(&t).await.unwrap();
    client.cancel_task(&t).await.unwrap();

    let scheme = client.labels();
    assert!(is_cancelled(scheme, cluster.job("t-7").unwrap().metadata.labels.as_ref()));
    assert!(is_cancelled(scheme, cluster.pod("t-7-pod").unwrap().metadata.labels.as_ref()));

    let err = client.cancel_task(&id("absent")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn cancel_task_refuses_non_master() {
    let (cluster, client) = setup();
    cluster.insert_job(job("imposter", &[]));
    let err = client.cancel_task(&id("imposter")).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!is_cancelled(
        client.labels(),
        cluster.job("imposter").unwrap().metadata.labels.as_ref()
    ));
}

#[tokio::test]
async fn read_task_collects_everything() {
    let (cluster, client) = setup();
    let t = id("t-9");
    client.create_task_master_job(&t, job("x", &[])).await.unwrap();
    for step in 0..2 {
        let name = format!("t-9-ex-{step:02}");
        client.create_executor_job(&t, job(&name, &[])).await.unwrap();
        cluster.spawn_pod(&name, &format!("{name}-pod")).unwrap();
    }
    cluster.spawn_pod("t-9", "t-9-pod").unwrap();

    let task = client.read_task(&t).await.unwrap();
    assert_eq!(task.master.metadata.name.as_deref(), Some("t-9"));
    assert_eq!(task.master_pods.len(), 1);
    assert_eq!(task.executors.len(), 2);
    assert!(task.executors.iter().all(|e| e.pods.len() == 1));
    assert_eq!(task.pods().count(), 3);
    assert!(!task.is_cancelled(client.labels()));
}

#[tokio::test]
async fn custom_label_scheme_is_honored() {
    let cluster = MemoryCluster::new("tasks");
    let scheme = LabelScheme {
        status_key: "lifecycle".into(),
        cancelled_value: "CANCELED".into(),
        ..LabelScheme::default()
    };
    let client = TaskClient::new(cluster.clone(), scheme).unwrap();
    let t = id("t-1");
    client.create_task_master_job(&t, job("x", &[])).await.unwrap();
    client.mark_job_cancelled(&t).await.unwrap();

    let stored = cluster.job("t-1").unwrap();
    assert_eq!(label(&stored, "lifecycle"), Some("CANCELED"));
    assert_eq!(label(&stored, "task-status"), None);
}

#[tokio::test]
async fn list_response_shape() {
    let (_, client) = setup();
    for i in 0..3 {
        client
            .create_task_master_job(&id(&format!("t{i}")), job("x", &[]))
            .await
            .unwrap();
    }
    let page = client.list_task_master_jobs(None, Some(2)).await.unwrap();
    let resp = ListTasksResponse::from_page(page, |j| j.metadata.name.unwrap_or_default());
    assert_eq!(resp.tasks, vec!["t0", "t1"]);
    assert!(!resp.next_page_token.is_empty());

    let page = client
        .list_task_master_jobs(PageToken::from_caller(resp.next_page_token), Some(2))
        .await
        .unwrap();
    let resp = ListTasksResponse::from_page(page, |j| j.metadata.name.unwrap_or_default());
    assert_eq!(resp.tasks, vec!["t2"]);
    assert_eq!(resp.next_page_token, "");
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(&'static str, Outcome)>>,
    log_failures: Mutex<u32>,
}

impl MetricsBackend for Recorder {
    fn record_call(&self, operation: &'static str, outcome: Outcome, _elapsed: Duration) {
        self.calls.lock().unwrap().push((operation, outcome));
    }

    fn record_log_read_failure(&self) {
        *self.log_failures.lock().unwrap() += 1;
    }
}

#[tokio::test]
async fn metrics_see_every_backend_call_without_retries() {
    let cluster = MemoryCluster::new("tasks");
    let recorder = Arc::new(Recorder::default());
    let client = TaskClient::new(cluster.clone(), LabelScheme::default())
        .unwrap()
        .with_metrics(recorder.clone());

    let _ = client.read_task_master_job(&id("missing")).await;
    cluster.fail_with(Some(ClusterError::status(503, "ServiceUnavailable", "")));
    let _ = client.list_all_executor_jobs().await;
    let _ = client.read_pod_log("p").await;

    assert_eq!(
        *recorder.calls.lock().unwrap(),
        vec![
            ("get_job", Outcome::NotFound),
            ("list_jobs", Outcome::Error),
            ("read_pod_log", Outcome::Error),
        ]
    );
    assert_eq!(*recorder.log_failures.lock().unwrap(), 1);
}

#[test]
fn client_rejects_scheme_with_shared_keys() {
    let scheme = LabelScheme {
        status_key: "job-kind".into(),
        ..LabelScheme::default()
    };
    let err = TaskClient::new(MemoryCluster::new("tasks"), scheme).err();
    assert!(matches!(err, Some(ConfigError::Labels(_))));
}

#[tokio::test]
async fn task_pods_exclude_foreign_pods() {
    let (cluster, client) = setup();
    let t = id("t-5");
    client.create_task_master_job(&t, job("x", &[])).await.unwrap();
    client
        .create_executor_job(&t, job("t-5-exec", &[]))
        .await
        .unwrap();
    client
        .create_task_master_job(&id("t-6"), job("x", &[]))
        .await
        .unwrap();
    cluster.spawn_pod("t-5", "t-5-m").unwrap();
    cluster.spawn_pod("t-5-exec", "t-5-e").unwrap();
    cluster.spawn_pod("t-6", "t-6-m").unwrap();

    let task = client.read_task(&t).await.unwrap();
    assert!(task.contains_pod("t-5-m"));
    assert!(task.contains_pod("t-5-e"));
    assert!(!task.contains_pod("t-6-m"));
}

/// Pages forever by handing back the same continuation token.
struct StuckPager(MemoryCluster);

impl StuckPager {
    fn stuck<T>() -> Page<T> {
        Page::new(Vec::new(), PageToken::from_backend(Some("same".into())))
    }

    fn first_page(query: &ListQuery) -> ListQuery {
        let mut query = query.clone();
        query.continue_token = None;
        query
    }
}

#[async_trait]
impl ClusterBackend for StuckPager {
    fn namespace(&self) -> &str {
        self.0.namespace()
    }

    async fn create_job(&self, job: &Job) -> Result<Job, ClusterError> {
        self.0.create_job(job).await
    }

    async fn get_job(&self, name: &str) -> Result<Job, ClusterError> {
        self.0.get_job(name).await
    }

    async fn list_jobs(&self, query: &ListQuery) -> Result<Page<Job>, ClusterError> {
        self.0.list_jobs(&Self::first_page(query)).await?;
        Ok(Self::stuck())
    }

    async fn patch_job_labels(&self, name: &str, labels: &Labels) -> Result<Job, ClusterError> {
        self.0.patch_job_labels(name, labels).await
    }

    async fn list_pods(&self, query: &ListQuery) -> Result<Page<Pod>, ClusterError> {
        self.0.list_pods(&Self::first_page(query)).await?;
        Ok(Self::stuck())
    }

    async fn read_pod_log(&self, name: &str) -> Result<String, ClusterError> {
        self.0.read_pod_log(name).await
    }

    async fn patch_pod_labels(&self, name: &str, labels: &Labels) -> Result<Pod, ClusterError> {
        self.0.patch_pod_labels(name, labels).await
    }
}

#[tokio::test]
async fn repeated_continuation_token_stops_the_drain() {
    let cluster = MemoryCluster::new("tasks");
    let client = TaskClient::new(StuckPager(cluster.clone()), LabelScheme::default()).unwrap();

    let err = client.list_all_executor_jobs().await.unwrap_err();
    assert!(matches!(err, TaskError::Backend(ClusterError::Transport(_))));

    let err = client.list_all_job_pods().await.unwrap_err();
    assert!(matches!(err, TaskError::Backend(ClusterError::Transport(_))));
    assert_eq!(cluster.calls().len(), 4);
}
