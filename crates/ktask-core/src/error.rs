use thiserror::Error;

use ktask_model::{ModelError, TaskId};

/// Raw failure reported by a cluster backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClusterError {
    /// The API answered with a non-success status.
    #[error("api status {code} ({reason}): {message}")]
    Status {
        code: u16,
        reason: String,
        message: String,
    },
    /// The API could not be reached or its answer could not be decoded.
    #[error("transport: {0}")]
    Transport(String),
}

impl ClusterError {
    pub fn status(code: u16, reason: impl Into<String>, message: impl Into<String>) -> Self {
        ClusterError::Status {
            code,
            reason: reason.into(),
            message: message.into(),
        }
    }

    pub fn not_found(name: &str) -> Self {
        Self::status(404, "NotFound", format!("{name} not found"))
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::Status { code: 404, .. })
    }
}

/// Domain failure surfaced to callers.
#[derive(Debug, Error)]
pub enum TaskError {
    /// No task-master Job exists under this id, or the resource under this name is not a task-master.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("backend failure: {0}")]
    Backend(#[from] ClusterError),
}

impl TaskError {
    /// Normalize a failure of a call addressed by task id.
    ///
    /// An absent resource becomes [`TaskError::NotFound`]; anything else is a backend failure.
    pub fn from_lookup(id: &TaskId, err: ClusterError) -> Self {
        if err.is_not_found() {
            TaskError::NotFound(id.clone())
        } else {
            TaskError::Backend(err)
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskError::NotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("invalid label scheme: {0}")]
    Labels(#[from] ModelError),
}
