use k8s_openapi::{
    api::batch::v1::{Job, JobSpec},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use ktask_model::Labels;

/// Bare Job named `name` carrying `labels`.
pub fn job(name: &str, labels: &[(&str, &str)]) -> Job {
    Job {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: (!labels.is_empty()).then(|| self::labels(labels)),
            ..Default::default()
        },
        spec: Some(JobSpec::default()),
        ..Default::default()
    }
}

pub fn labels(pairs: &[(&str, &str)]) -> Labels {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
