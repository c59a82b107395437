use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::LabelScheme;

/// Role of a Job within a task.
///
/// Carried only as a label; never inferred from the Job name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// The single Job orchestrating a task. Its name equals the task id.
    TaskMaster,
    /// A Job running one execution step of a task.
    Executor,
}

impl JobKind {
    /// Label value for this kind under the given scheme.
    pub fn label_value<'a>(&self, scheme: &'a LabelScheme) -> &'a str {
        match self {
            JobKind::TaskMaster => &scheme.task_master_value,
            JobKind::Executor => &scheme.executor_value,
        }
    }

    /// Classify a resource by its labels.
    ///
    /// Returns `None` when the kind label is absent or carries an unknown value.
    pub fn of(scheme: &LabelScheme, labels: Option<&BTreeMap<String, String>>) -> Option<Self> {
        let value = labels?.get(&scheme.job_kind_key)?;
        if *value == scheme.task_master_value {
            Some(JobKind::TaskMaster)
        } else if *value == scheme.executor_value {
            Some(JobKind::Executor)
        } else {
            None
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobKind::TaskMaster => "task-master",
            JobKind::Executor => "executor",
        })
    }
}
