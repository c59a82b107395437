use std::{fmt, str::FromStr};

use crate::logger::error::LoggerError;

/// Output encoding of log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggerFormat {
    /// Human-readable lines, colored on a terminal.
    #[default]
    Text,
    /// One JSON object per record, including the current span.
    Json,
    /// Native systemd journal fields.
    Journald,
}

impl LoggerFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoggerFormat::Text => "text",
            LoggerFormat::Json => "json",
            LoggerFormat::Journald => "journald",
        }
    }
}

impl fmt::Display for LoggerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(LoggerFormat::Text),
            "json" => Ok(LoggerFormat::Json),
            "journald" | "journal" if cfg!(all(target_os = "linux", feature = "journald")) => {
                Ok(LoggerFormat::Journald)
            }
            "journald" | "journal" => Err(LoggerError::JournaldNotSupported),
            _ => Err(LoggerError::InvalidFormat(s.to_string())),
        }
    }
}
