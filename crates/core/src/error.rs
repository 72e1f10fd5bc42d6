use thiserror::Error;

/// Result type alias for threadline-core
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types shared by the threadline crates
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error for file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Inbound event could not be decoded
    #[error("event error: {0}")]
    Event(#[from] EventError),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Errors raised while decoding inbound events from the host bridge
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Line could not be parsed as an event
    #[error("invalid event at line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },

    /// Attachment record is missing data or has an unknown type
    #[error("unsupported attachment: {0}")]
    UnsupportedAttachment(String),
}

impl EventError {
    /// Create an error for an unparsable event line
    pub fn invalid_line(line: usize, reason: impl Into<String>) -> Self {
        Self::InvalidLine { line, reason: reason.into() }
    }

    /// Create an error for an attachment the transcript cannot show
    pub fn unsupported_attachment(detail: impl Into<String>) -> Self {
        Self::UnsupportedAttachment(detail.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let io_err: Error = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"));
        assert_eq!(io_err.to_string(), "I/O error: file not found");

        let config_err: Error = Error::Config("missing account".to_string());
        assert_eq!(config_err.to_string(), "configuration error: missing account");

        let other: Error = Error::Other("boom".to_string());
        assert_eq!(other.to_string(), "boom");
    }

    #[test]
    fn test_event_error_display() {
        let line = EventError::invalid_line(3, "expected value");
        assert_eq!(line.to_string(), "invalid event at line 3: expected value");

        let attachment = EventError::unsupported_attachment("type 'audio'");
        assert_eq!(attachment.to_string(), "unsupported attachment: type 'audio'");
    }

    #[test]
    fn test_error_from_event_error() {
        let error: Error = EventError::invalid_line(1, "eof").into();
        assert_eq!(error.to_string(), "event error: invalid event at line 1: eof");
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: Error = io_err.into();
        assert_eq!(error.to_string(), "I/O error: denied");
    }
}
