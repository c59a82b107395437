use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Opaque task identifier.
///
/// Used verbatim as the name of the task-master Job and as the value of the task-id label on every resource the task owns,
/// so it must be a valid label value: at most 63 characters of `[A-Za-z0-9._-]`, starting and ending alphanumeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelError::EmptyTaskId);
        }
        if let Some(reason) = label_value_violation(&id) {
            return Err(ModelError::InvalidTaskId { id, reason });
        }
        Ok(Self(id))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const MAX_LABEL_VALUE_LEN: usize = 63;

fn label_value_violation(id: &str) -> Option<&'static str> {
    if id.len() > MAX_LABEL_VALUE_LEN {
        return Some("longer than 63 characters");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Some("only alphanumerics, '-', '_' and '.' are allowed");
    }
    let edges = [id.chars().next(), id.chars().last()];
    if !edges.into_iter().flatten().all(|c| c.is_ascii_alphanumeric()) {
        return Some("must start and end with an alphanumeric character");
    }
    None
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for TaskId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskId::new(s)
    }
}

impl TryFrom<String> for TaskId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TaskId::new(value)
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}
