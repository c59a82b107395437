use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Clause, JobKind, KeyValue, LABEL_JOB_KIND_EXECUTOR, LABEL_JOB_KIND_KEY,
    LABEL_JOB_KIND_TASK_MASTER, LABEL_JOB_OWNER_KEY, LABEL_TASK_ID_KEY,
    LABEL_TASK_STATUS_CANCELLED, LABEL_TASK_STATUS_KEY, ModelError, TaskId,
};

/// Label set of a cluster resource.
pub type Labels = BTreeMap<String, String>;

/// Vocabulary of label keys and values stamped on task resources.
///
/// Every string is configurable so the scheme can match an existing deployment;
/// [`Default`] yields the built-in constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelScheme {
    pub job_kind_key: String,
    pub task_master_value: String,
    pub executor_value: String,
    pub task_id_key: String,
    pub status_key: String,
    pub cancelled_value: String,
    /// Key the cluster sets on pods spawned by any Job.
    pub job_owner_key: String,
}

impl Default for LabelScheme {
    fn default() -> Self {
        Self {
            job_kind_key: LABEL_JOB_KIND_KEY.to_string(),
            task_master_value: LABEL_JOB_KIND_TASK_MASTER.to_string(),
            executor_value: LABEL_JOB_KIND_EXECUTOR.to_string(),
            task_id_key: LABEL_TASK_ID_KEY.to_string(),
            status_key: LABEL_TASK_STATUS_KEY.to_string(),
            cancelled_value: LABEL_TASK_STATUS_CANCELLED.to_string(),
            job_owner_key: LABEL_JOB_OWNER_KEY.to_string(),
        }
    }
}

impl LabelScheme {
    /// Reject strings that would produce a malformed selector, and keys that
    /// would overwrite one another on the same resource.
    pub fn validate(&self) -> Result<(), ModelError> {
        let fields: [(&'static str, &str); 7] = [
            ("job_kind_key", &self.job_kind_key),
            ("task_master_value", &self.task_master_value),
            ("executor_value", &self.executor_value),
            ("task_id_key", &self.task_id_key),
            ("status_key", &self.status_key),
            ("cancelled_value", &self.cancelled_value),
            ("job_owner_key", &self.job_owner_key),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                return Err(ModelError::InvalidLabel {
                    field,
                    reason: "must not be empty".into(),
                });
            }
            if value.contains(['=', ',', '!']) || value.chars().any(char::is_whitespace) {
                return Err(ModelError::InvalidLabel {
                    field,
                    reason: format!("{value:?} contains a selector metacharacter"),
                });
            }
        }
        let keys: [(&'static str, &str); 4] = [
            ("job_kind_key", &self.job_kind_key),
            ("task_id_key", &self.task_id_key),
            ("status_key", &self.status_key),
            ("job_owner_key", &self.job_owner_key),
        ];
        for (i, (field, key)) in keys.iter().enumerate() {
            if let Some((other, _)) = keys[..i].iter().find(|(_, k)| k == key) {
                return Err(ModelError::InvalidLabel {
                    field: *field,
                    reason: format!("{key:?} is already used as {other}"),
                });
            }
        }
        if self.task_master_value == self.executor_value {
            return Err(ModelError::InvalidLabel {
                field: "executor_value",
                reason: "must differ from task_master_value".into(),
            });
        }
        Ok(())
    }

    /// `job-kind=<kind>` clause.
    pub fn kind_clause(&self, kind: JobKind) -> Clause {
        Clause::Equals(KeyValue::new(
            self.job_kind_key.as_str(),
            kind.label_value(self),
        ))
    }

    /// `task-id=<id>` clause.
    pub fn task_clause(&self, id: &TaskId) -> Clause {
        Clause::Equals(KeyValue::new(self.task_id_key.as_str(), id.as_str()))
    }

    /// Existence clause matching every pod spawned by a Job.
    pub fn job_owned_clause(&self) -> Clause {
        Clause::Exists(self.job_owner_key.clone())
    }

    /// Labels applied by the cancellation patch.
    pub fn cancelled_labels(&self) -> Labels {
        Labels::from([(self.status_key.clone(), self.cancelled_value.clone())])
    }

    /// Stamp the ownership labels of a task resource onto `labels`.
    ///
    /// Existing keys other than the kind and task-id keys are kept.
    pub fn stamp(&self, labels: &mut Labels, kind: JobKind, id: &TaskId) {
        labels.insert(self.job_kind_key.clone(), kind.label_value(self).to_string());
        labels.insert(self.task_id_key.clone(), id.to_string());
    }
}

/// Whether the cancellation marker is present in `labels`.
pub fn is_cancelled(scheme: &LabelScheme, labels: Option<&Labels>) -> bool {
    labels
        .and_then(|l| l.get(&scheme.status_key))
        .is_some_and(|v| *v == scheme.cancelled_value)
}
