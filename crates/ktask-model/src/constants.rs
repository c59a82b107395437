/// Label key carrying the [`JobKind`](crate::JobKind) of every created Job.
pub const LABEL_JOB_KIND_KEY: &str = "job-kind";
/// Kind value for the single orchestrating Job of a task.
pub const LABEL_JOB_KIND_TASK_MASTER: &str = "task-master";
/// Kind value for a Job running one execution step.
pub const LABEL_JOB_KIND_EXECUTOR: &str = "executor";

/// Label key carrying the owning task identifier.
pub const LABEL_TASK_ID_KEY: &str = "task-id";

/// Label key used only as the cancellation marker.
pub const LABEL_TASK_STATUS_KEY: &str = "task-status";
/// Value of the cancellation marker.
pub const LABEL_TASK_STATUS_CANCELLED: &str = "Cancelled";

/// Label the cluster puts on every pod spawned by a Job.
pub const LABEL_JOB_OWNER_KEY: &str = "job-name";
