use thiserror::Error;
use threadline_core::EventError;

/// Failures inside the transcript engine.
///
/// None of these are fatal: the engine logs them and drops the affected
/// event or sub-part, leaving the rest of the transcript untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    /// A receipt names a message that is not in the transcript
    #[error("unknown message reference: {uid}")]
    UnknownReference { uid: String },

    /// Part of an event could not be used
    #[error("malformed event: {0}")]
    MalformedEvent(#[from] EventError),

    /// A tree operation was asked to do something its contract forbids
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The markup snapshot could not be rendered
    #[error("render error: {0}")]
    Render(String),
}

impl From<askama::Error> for TranscriptError {
    fn from(err: askama::Error) -> Self {
        TranscriptError::Render(err.to_string())
    }
}

impl TranscriptError {
    pub fn unknown_reference(uid: impl Into<String>) -> Self {
        Self::UnknownReference { uid: uid.into() }
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::InvariantViolation(detail.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TranscriptError::unknown_reference("m9").to_string(), "unknown message reference: m9");
        assert_eq!(
            TranscriptError::invariant("join across senders").to_string(),
            "invariant violation: join across senders"
        );

        let malformed: TranscriptError = EventError::unsupported_attachment("type 'audio'").into();
        assert_eq!(malformed.to_string(), "malformed event: unsupported attachment: type 'audio'");
    }
}
