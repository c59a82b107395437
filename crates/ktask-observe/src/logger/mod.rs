mod config;
mod error;
mod format;
mod install;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the global `tracing` subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadyInitialized`] when a subscriber is already set.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = install::filter(&cfg.level)?;
    match cfg.format {
        LoggerFormat::Text => install::text(cfg, filter),
        LoggerFormat::Json => install::json(cfg, filter),
        LoggerFormat::Journald => install::journald(filter),
    }
}
