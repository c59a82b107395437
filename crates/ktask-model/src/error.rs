use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("task id must not be empty")]
    EmptyTaskId,
    #[error("invalid task id {id:?}: {reason}")]
    InvalidTaskId { id: String, reason: &'static str },
    #[error("invalid label {field}: {reason}")]
    InvalidLabel { field: &'static str, reason: String },
}
