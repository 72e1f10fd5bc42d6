//! Logging setup for threadline binaries and hosts.
//!
//! Built on the tracing ecosystem, with optional JSON file output and
//! privacy controls for message bodies.
//!
//! # Environment Variables
//!
//! - `THREADLINE_LOG`: Filter directive (like `RUST_LOG`), e.g., `threadline_transcript=debug`
//! - `THREADLINE_LOG_FORMAT`: Output format for stderr: `pretty`, `json`, `compact`
//! - `THREADLINE_LOG_DIR`: Directory for the rolling log file (default `~/.threadline/logs`)
//!
//! # Example
//!
//! ```no_run
//! use threadline_core::logging;
//!
//! logging::init_logging(None)?;
//! # Ok::<(), threadline_core::Error>(())
//! ```

use crate::Error;
use crate::config::{FileLoggingConfig, LoggingConfig as ConfigLoggingConfig};
use std::env;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Pretty, human-readable output with colors (default for TTY)
    #[default]
    Pretty,
    /// JSON output (one line per event)
    Json,
    /// Compact, single-line output
    Compact,
}

impl LogFormat {
    /// Parse a log format from a string.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }
}

/// How message bodies appear in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyLogging {
    /// Replace bodies with a placeholder.
    #[default]
    None,
    /// Keep up to `truncate_length` chars.
    Truncate,
    /// Log bodies as received.
    Full,
}

impl BodyLogging {
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(BodyLogging::None),
            "truncate" => Some(BodyLogging::Truncate),
            "full" => Some(BodyLogging::Full),
            _ => None,
        }
    }
}

impl FromStr for BodyLogging {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BodyLogging::parse_str(s).ok_or_else(|| format!("invalid body logging: {}", s))
    }
}

/// Privacy configuration for message content in logs.
#[derive(Debug, Clone, Default)]
pub struct PrivacyConfig {
    pub log_bodies: BodyLogging,
    /// Maximum length for truncated content.
    pub truncate_length: usize,
}

/// Resolved logging settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log level for stderr output.
    pub level: String,
    /// Output format for stderr.
    pub format: LogFormat,
    /// File logging configuration (optional).
    pub file: Option<FileLoggingConfig>,
    pub privacy: PrivacyConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: LogFormat::default(), file: None, privacy: PrivacyConfig::default() }
    }
}

impl From<ConfigLoggingConfig> for LoggingConfig {
    fn from(config: ConfigLoggingConfig) -> Self {
        let format = LogFormat::parse_str(&config.format).unwrap_or_default();
        let log_bodies = BodyLogging::parse_str(&config.privacy.log_bodies).unwrap_or_default();

        Self {
            level: config.level,
            format,
            file: if config.file.enabled { Some(config.file) } else { None },
            privacy: PrivacyConfig { log_bodies, truncate_length: config.privacy.truncate_length },
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// `THREADLINE_LOG`, then `RUST_LOG`, then the configured level.
    fn stderr_filter(&self) -> EnvFilter {
        let directive = env::var("THREADLINE_LOG")
            .ok()
            .or_else(|| env::var("RUST_LOG").ok())
            .unwrap_or_else(|| self.level.clone());

        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// `THREADLINE_LOG_FORMAT` wins; pretty output falls back to compact off a TTY.
    fn stderr_format(&self) -> LogFormat {
        if let Ok(raw) = env::var("THREADLINE_LOG_FORMAT")
            && let Some(format) = LogFormat::parse_str(&raw)
        {
            return format;
        }

        match self.format {
            LogFormat::Pretty if !atty::is(atty::Stream::Stderr) => LogFormat::Compact,
            other => other,
        }
    }

    fn stderr_layer(&self) -> BoxedLayer {
        let filter = self.stderr_filter();
        match self.stderr_format() {
            LogFormat::Pretty => fmt::layer().pretty().with_writer(io::stderr).with_filter(filter).boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(io::stderr).with_filter(filter).boxed(),
            LogFormat::Compact => fmt::layer().compact().with_writer(io::stderr).with_filter(filter).boxed(),
        }
    }

    fn log_dir() -> Result<PathBuf, Error> {
        if let Ok(dir) = env::var("THREADLINE_LOG_DIR") {
            return Ok(PathBuf::from(dir));
        }

        env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map(|home| PathBuf::from(home).join(".threadline").join("logs"))
            .map_err(|_| Error::Config("Could not determine home directory".to_string()))
    }
}

/// Install the global tracing subscriber.
///
/// Stderr output is filtered by `THREADLINE_LOG`/`RUST_LOG` or the configured
/// level. With file logging enabled, events at the file level also go to a
/// daily rolling JSON log; keep the returned guard alive so it flushes.
pub fn init_logging(config: Option<LoggingConfig>) -> Result<Option<WorkerGuard>, Error> {
    let config = config.unwrap_or_default();
    let mut layers = vec![config.stderr_layer()];

    let guard = match &config.file {
        Some(file) => {
            let dir = LoggingConfig::log_dir()?;
            std::fs::create_dir_all(&dir)
                .map_err(|e| Error::Config(format!("Failed to create log directory {}: {}", sanitize_path(&dir), e)))?;

            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "threadline.log"));
            let filter = EnvFilter::try_new(&file.level).unwrap_or_else(|_| EnvFilter::new("debug"));
            layers.push(fmt::layer().json().with_writer(writer).with_filter(filter).boxed());
            Some(guard)
        }
        None => None,
    };

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| Error::Other(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}

/// Redact a message body according to privacy settings.
pub fn redact_body(content: &str, privacy: &PrivacyConfig) -> String {
    match privacy.log_bodies {
        BodyLogging::Full => content.to_string(),
        BodyLogging::None => "[REDACTED]".to_string(),
        BodyLogging::Truncate => {
            let total = content.chars().count();
            if total <= privacy.truncate_length {
                return content.to_string();
            }
            let mut truncated = content.chars().take(privacy.truncate_length).collect::<String>();
            truncated.push_str("...");
            truncated.push_str(&format!(" ({} total chars)", total));
            truncated
        }
    }
}

/// Sanitize file paths for logging (replace the home directory with `~`).
pub fn sanitize_path(path: &std::path::Path) -> String {
    if let Ok(home) = env::var("HOME")
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }

    path.display().to_string()
}
