use k8s_openapi::api::batch::v1::Job;
use ktask_model::{JobKind, LabelScheme, LabelSelector, ListQuery, PageToken, TaskId};

/// Domain-level question asked of the backend.
#[derive(Debug, Clone)]
pub enum Intent<'a> {
    /// The task-master Job of one task.
    TaskMaster(&'a TaskId),
    /// One page of all task-master Jobs.
    TaskMasters {
        token: Option<PageToken>,
        limit: Option<u32>,
    },
    /// Every executor Job of one task.
    ExecutorsOf(&'a TaskId),
    /// Every executor Job in the namespace.
    AllExecutors,
    /// Pods spawned by the given Job, found through the Job's own selector.
    PodsOfJob(&'a Job),
    /// Every pod spawned by any Job.
    AllJobPods,
}

/// How the backend should be asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Direct read of a resource by name.
    ByName(String),
    /// Label-filtered listing.
    List(ListQuery),
    /// The intent cannot match any resource; no call is needed.
    Empty,
}

/// Name of the task-master Job of `id`.
pub fn task_master_name(id: &TaskId) -> String {
    id.to_string()
}

/// One page of task-master Jobs.
pub fn task_masters_query(
    scheme: &LabelScheme,
    token: Option<PageToken>,
    limit: Option<u32>,
) -> ListQuery {
    ListQuery::new(scheme.kind_clause(JobKind::TaskMaster).into())
        .with_limit(limit)
        .with_continue(token)
}

/// Translate an intent into a backend lookup.
///
/// Tokens and page sizes are passed through untouched.
pub fn translate(scheme: &LabelScheme, intent: Intent<'_>) -> Lookup {
    match intent {
        Intent::TaskMaster(id) => Lookup::ByName(task_master_name(id)),
        Intent::TaskMasters { token, limit } => {
            Lookup::List(task_masters_query(scheme, token, limit))
        }
        Intent::ExecutorsOf(id) => Lookup::List(ListQuery::new(
            LabelSelector::new()
                .and(scheme.task_clause(id))
                .and(scheme.kind_clause(JobKind::Executor)),
        )),
        Intent::AllExecutors => {
            Lookup::List(ListQuery::new(scheme.kind_clause(JobKind::Executor).into()))
        }
        Intent::PodsOfJob(job) => {
            let selector = job
                .spec
                .as_ref()
                .and_then(|s| s.selector.as_ref())
                .and_then(|s| s.match_labels.as_ref())
                .map(LabelSelector::from_labels)
                .unwrap_or_default();
            if selector.is_empty() {
                Lookup::Empty
            } else {
                Lookup::List(ListQuery::new(selector))
            }
        }
        Intent::AllJobPods => Lookup::List(ListQuery::new(scheme.job_owned_clause().into())),
    }
}
