use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?} (expected one of: text, json, journald)")]
    InvalidFormat(String),
    #[error("journald output needs linux and the `journald` feature")]
    JournaldNotSupported,
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
    #[error("cannot install tracing subscriber: {0}")]
    InitializationFailed(String),
    #[error("invalid log filter {directive:?}: {reason}")]
    InvalidLogLevel { directive: String, reason: String },
}
