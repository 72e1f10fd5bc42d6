use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::logging::{BodyLogging, LogFormat};

/// How the transcript interprets wall-clock time when comparing calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UtcOffsetSetting {
    /// Local time zone of the machine, including daylight saving changes (default)
    #[default]
    Local,
    /// Plain UTC
    Utc,
    /// Fixed offset in seconds east of UTC
    Fixed(i32),
}

impl UtcOffsetSetting {
    /// The fixed offset this setting pins, or `None` for the local time zone
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        match self {
            UtcOffsetSetting::Local => None,
            UtcOffsetSetting::Utc => Some(Utc.fix()),
            UtcOffsetSetting::Fixed(secs) => Some(FixedOffset::east_opt(*secs).unwrap_or_else(|| Utc.fix())),
        }
    }
}

impl std::fmt::Display for UtcOffsetSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UtcOffsetSetting::Local => write!(f, "local"),
            UtcOffsetSetting::Utc => write!(f, "utc"),
            UtcOffsetSetting::Fixed(secs) => {
                let sign = if *secs < 0 { '-' } else { '+' };
                let abs = secs.unsigned_abs();
                write!(f, "{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
            }
        }
    }
}

impl std::str::FromStr for UtcOffsetSetting {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || crate::Error::Config(ConfigError::InvalidUtcOffset(s.to_string()).to_string());

        match s.trim().to_lowercase().as_str() {
            "local" => return Ok(UtcOffsetSetting::Local),
            "utc" | "z" => return Ok(UtcOffsetSetting::Utc),
            _ => {}
        }

        let s = s.trim();
        let (sign, rest) = match s.chars().next() {
            Some('+') => (1, &s[1..]),
            Some('-') => (-1, &s[1..]),
            _ => return Err(invalid()),
        };
        let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }

        Ok(UtcOffsetSetting::Fixed(sign * (hours * 3600 + minutes * 60)))
    }
}

/// Font and clock settings applied to the whole transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// CSS font family for the transcript body
    #[serde(default)]
    pub font_family: Option<String>,

    /// CSS font size for the transcript body
    #[serde(default)]
    pub font_size: Option<String>,

    /// "local", "utc" or "+HH:MM"
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

fn default_utc_offset() -> String {
    "local".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { font_family: None, font_size: None, utc_offset: default_utc_offset() }
    }
}

impl DisplayConfig {
    /// Parse the configured offset
    pub fn utc_offset(&self) -> Result<UtcOffsetSetting> {
        self.utc_offset.parse()
    }
}

/// File logging section (`[logging.file]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileLoggingConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_file_level")]
    pub level: String,
}

fn default_file_level() -> String {
    "debug".to_string()
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self { enabled: false, level: default_file_level() }
    }
}

/// Privacy section (`[logging.privacy]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrivacyLoggingConfig {
    /// "none", "truncate" or "full"
    #[serde(default = "default_log_bodies")]
    pub log_bodies: String,

    #[serde(default = "default_truncate_length")]
    pub truncate_length: usize,
}

fn default_log_bodies() -> String {
    "truncate".to_string()
}

fn default_truncate_length() -> usize {
    120
}

impl Default for PrivacyLoggingConfig {
    fn default() -> Self {
        Self { log_bodies: default_log_bodies(), truncate_length: default_truncate_length() }
    }
}

/// Logging section (`[logging]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub file: FileLoggingConfig,

    #[serde(default)]
    pub privacy: PrivacyLoggingConfig,
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            file: FileLoggingConfig::default(),
            privacy: PrivacyLoggingConfig::default(),
        }
    }
}

/// Root configuration structure for threadline.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Local account id, embedded in avatar addresses
    pub account: String,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Create a configuration for an account with default sections
    pub fn for_account(account: impl Into<String>) -> Self {
        Self { account: account.into(), display: DisplayConfig::default(), logging: LoggingConfig::default() }
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)
            .map_err(|e| crate::Error::Config(ConfigError::from(e).to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config from {}", crate::logging::sanitize_path(path));
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        use crate::Error;

        if self.account.trim().is_empty() {
            return Err(Error::Config(ConfigError::MissingAccount.to_string()));
        }
        self.display.utc_offset()?;

        if LogFormat::parse_str(&self.logging.format).is_none() {
            return Err(Error::Config(ConfigError::InvalidLogFormat(self.logging.format.clone()).to_string()));
        }
        self.logging.privacy.log_bodies.parse::<BodyLogging>().map_err(Error::Config)?;

        Ok(())
    }

    /// Get example configuration (as a string)
    pub fn example() -> &'static str {
        r#"# Threadline Configuration Example
# Copy this file to threadline.toml and customize as needed

# Local account id, used when addressing avatar images
account = "juliet@capulet.example"

[display]
# Font applied to the whole transcript (optional)
font_family = "sans-serif"
font_size = "12pt"
# Clock used for date comparisons: "local", "utc" or "+HH:MM"
utc_offset = "local"

[logging]
# Default level for stderr output
level = "warn"
# Output format: "pretty", "json" or "compact"
format = "pretty"

[logging.file]
# Daily rolling JSON log under ~/.threadline/logs
enabled = false
level = "debug"

[logging.privacy]
# Message bodies in logs: "none", "truncate" or "full"
log_bodies = "truncate"
truncate_length = 120
"#
    }
}

/// Configuration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No account id configured
    #[error("account must not be empty")]
    MissingAccount,

    /// Offset string did not parse
    #[error("invalid utc offset: {0}")]
    InvalidUtcOffset(String),

    /// Unknown `[logging] format`
    #[error("invalid log format: {0} (expected pretty, json or compact)")]
    InvalidLogFormat(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;

    #[test]
    fn test_example_parses() {
        let config = Config::from_toml_str(Config::example()).unwrap();
        assert_eq!(config.account, "juliet@capulet.example");
        assert_eq!(config.display.font_family.as_deref(), Some("sans-serif"));
        assert_eq!(config.display.font_size.as_deref(), Some("12pt"));
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.file.enabled);
        assert_eq!(config.logging.privacy.truncate_length, 120);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml_str("account = \"romeo@montague.example\"").unwrap();
        assert_eq!(config.display, DisplayConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.display.utc_offset().unwrap(), UtcOffsetSetting::Local);
    }

    #[test]
    fn test_empty_account_rejected() {
        let err = Config::from_toml_str("account = \"  \"").unwrap_err();
        assert_eq!(err.to_string(), "configuration error: account must not be empty");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_toml_str("account = \"a\"\ncolour = \"red\"").unwrap_err();
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_invalid_offset_rejected() {
        let err = Config::from_toml_str("account = \"a\"\n[display]\nutc_offset = \"noon\"").unwrap_err();
        assert_eq!(err.to_string(), "configuration error: invalid utc offset: noon");
    }

    #[test]
    fn test_invalid_logging_values_rejected() {
        let err = Config::from_toml_str("account = \"a\"\n[logging]\nformat = \"fancy\"").unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: invalid log format: fancy (expected pretty, json or compact)"
        );

        let err = Config::from_toml_str("account = \"a\"\n[logging.privacy]\nlog_bodies = \"loud\"").unwrap_err();
        assert_eq!(err.to_string(), "configuration error: invalid body logging: loud");
    }

    #[test]
    fn test_utc_offset_from_str() {
        assert_eq!(UtcOffsetSetting::from_str("LOCAL").unwrap(), UtcOffsetSetting::Local);
        assert_eq!(UtcOffsetSetting::from_str("utc").unwrap(), UtcOffsetSetting::Utc);
        assert_eq!(UtcOffsetSetting::from_str("+02:00").unwrap(), UtcOffsetSetting::Fixed(7200));
        assert_eq!(UtcOffsetSetting::from_str("-05:30").unwrap(), UtcOffsetSetting::Fixed(-19800));
        assert!(UtcOffsetSetting::from_str("+25:00").is_err());
        assert!(UtcOffsetSetting::from_str("0200").is_err());
    }

    #[test]
    fn test_utc_offset_display_round_trip() {
        for s in ["local", "utc", "+02:00", "-05:30"] {
            assert_eq!(UtcOffsetSetting::from_str(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_utc_offset_fixed_offset() {
        assert_eq!(UtcOffsetSetting::Local.fixed_offset(), None);
        assert_eq!(UtcOffsetSetting::Utc.fixed_offset().map(|o| o.local_minus_utc()), Some(0));
        assert_eq!(UtcOffsetSetting::Fixed(3600).fixed_offset().map(|o| o.local_minus_utc()), Some(3600));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "account = \"nurse@verona.example\"\n[display]\nutc_offset = \"utc\"\n").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.account, "nurse@verona.example");
        assert_eq!(config.display.utc_offset().unwrap(), UtcOffsetSetting::Utc);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
