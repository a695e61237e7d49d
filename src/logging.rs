/// Structured logging for the electrification pipeline
///
/// Provides context-rich logging tagged with the pipeline stage and an
/// optional subject (series id, table, or chart file), with timestamps and
/// severity levels. Supports console output and an append-only log file.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::config::Config;
use crate::model::EiaError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parse a level name as written in the config file.
    pub fn parse(name: &str) -> Option<LogLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Eia,
    Store,
    Analysis,
    Plot,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Eia => write!(f, "EIA"),
            Stage::Store => write!(f, "DB"),
            Stage::Analysis => write!(f, "STATS"),
            Stage::Plot => write!(f, "PLOT"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Network trouble, rate limiting or a truncated body; worth retrying
    Transient,
    /// The request itself is wrong or the series does not exist
    Permanent,
    /// Series exists but is empty; SEDS leaves some state/series pairs blank
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Transient => write!(f, "TRANSIENT"),
            FailureType::Permanent => write!(f, "PERMANENT"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut guard) = LOGGER.lock() {
            *guard = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, stage: Stage, subject: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, stage, subject_part, message)
    }

    fn log(&self, level: LogLevel, stage: Stage, subject: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, stage, subject, message);
        let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, subject_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, subject_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}{}: {}", stage, subject_part, message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Initialize the global logger from the `log_level` and `log_file` settings
pub fn init_from_config(config: &Config) {
    let level = LogLevel::parse(&config.log_level).unwrap_or(LogLevel::Info);
    init_logger(level, config.log_file.as_deref(), false);
}

fn emit(level: LogLevel, stage: Stage, subject: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, stage, subject, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, subject: Option<&str>, message: &str) {
    emit(LogLevel::Info, stage, subject, message);
}

/// Log a warning message
pub fn warn(stage: Stage, subject: Option<&str>, message: &str) {
    emit(LogLevel::Warning, stage, subject, message);
}

/// Log an error message
pub fn error(stage: Stage, subject: Option<&str>, message: &str) {
    emit(LogLevel::Error, stage, subject, message);
}

/// Log a debug message
pub fn debug(stage: Stage, subject: Option<&str>, message: &str) {
    emit(LogLevel::Debug, stage, subject, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify an EIA fetch failure
pub fn classify_eia_failure(err: &EiaError) -> FailureType {
    if err.is_transient() {
        FailureType::Transient
    } else if matches!(err, EiaError::NoDataAvailable(_)) {
        FailureType::Unknown
    } else {
        FailureType::Permanent
    }
}

/// Log an EIA failure with automatic classification
pub fn log_eia_failure(series_id: &str, operation: &str, err: &EiaError) {
    let failure_type = classify_eia_failure(err);

    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Transient => warn(Stage::Eia, Some(series_id), &message),
        FailureType::Permanent => error(Stage::Eia, Some(series_id), &message),
        FailureType::Unknown => warn(Stage::Eia, Some(series_id), &message),
    }
}

// ---------------------------------------------------------------------------
// Ingestion Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of an ingestion run
pub fn log_ingest_summary(total: usize, successful: usize, failed: usize) {
    let message = format!(
        "Ingestion complete: {}/{} series loaded, {} failed",
        successful, total, failed
    );

    if failed == 0 {
        info(Stage::Eia, None, &message);
    } else if successful == 0 {
        error(Stage::Eia, None, &message);
    } else {
        warn(Stage::Eia, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("warn"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(
            classify_eia_failure(&EiaError::HttpError(503)),
            FailureType::Transient
        );
        assert_eq!(
            classify_eia_failure(&EiaError::HttpError(403)),
            FailureType::Permanent
        );
        assert_eq!(
            classify_eia_failure(&EiaError::NoDataAvailable("SEDS.ESACB.VT.A".into())),
            FailureType::Unknown
        );
        assert_eq!(
            classify_eia_failure(&EiaError::InvalidData("invalid year \"twenty\"".into())),
            FailureType::Permanent
        );
    }

    #[test]
    fn test_entry_format_includes_stage_and_subject() {
        let entry = Logger::format_entry(LogLevel::Warning, Stage::Eia, Some("SEDS.TETCB.OH.A"), "retrying");
        assert!(entry.contains("WARN EIA [SEDS.TETCB.OH.A]: retrying"), "got '{}'", entry);
    }
}
