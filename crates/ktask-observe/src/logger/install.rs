use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError};

pub(crate) fn filter(directive: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directive).map_err(|e| LoggerError::InvalidLogLevel {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn text(cfg: &LoggerConfig, filter: EnvFilter) -> Result<(), LoggerError> {
    let layer = fmt::layer()
        .with_ansi(cfg.use_color)
        .with_target(cfg.with_targets)
        .with_timer(local_timer());
    install(tracing_subscriber::registry().with(filter).with(layer))
}

pub(crate) fn json(cfg: &LoggerConfig, filter: EnvFilter) -> Result<(), LoggerError> {
    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_current_span(true)
        .with_timer(local_timer());
    install(tracing_subscriber::registry().with(filter).with(layer))
}

#[cfg(all(target_os = "linux", feature = "journald"))]
pub(crate) fn journald(filter: EnvFilter) -> Result<(), LoggerError> {
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?;
    install(tracing_subscriber::registry().with(filter).with(layer))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
pub(crate) fn journald(_filter: EnvFilter) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

/// RFC 3339 timestamps in the local offset, UTC when the offset is unknown.
fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn install<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(|e| {
        let msg = e.to_string();
        if msg.contains("already") {
            LoggerError::AlreadyInitialized
        } else {
            LoggerError::InitializationFailed(msg)
        }
    })
}
