use ktask_model::LabelScheme;

use crate::error::ConfigError;

pub const ENV_NAMESPACE: &str = "KTASK_NAMESPACE";
pub const ENV_STATUS_KEY: &str = "KTASK_LABEL_STATUS_KEY";
pub const ENV_CANCELLED_VALUE: &str = "KTASK_LABEL_CANCELLED_VALUE";

const DEFAULT_NAMESPACE: &str = "default";

/// Construction-time settings of a [`TaskClient`](crate::TaskClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Namespace every operation is scoped to.
    pub namespace: String,
    pub labels: LabelScheme,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            labels: LabelScheme::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_labels(mut self, labels: LabelScheme) -> Self {
        self.labels = labels;
        self
    }

    /// Defaults overridden by `KTASK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(ns) = get(ENV_NAMESPACE) {
            cfg.namespace = ns;
        }
        if let Some(key) = get(ENV_STATUS_KEY) {
            cfg.labels.status_key = key;
        }
        if let Some(value) = get(ENV_CANCELLED_VALUE) {
            cfg.labels.cancelled_value = value;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        self.labels.validate()?;
        Ok(())
    }
}
