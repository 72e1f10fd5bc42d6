use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Events delivered by the messaging client to the transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundEvent {
    /// A message was sent or received
    MessageReceived {
        /// When the message was sent
        timestamp: DateTime<Utc>,
        /// Address of the sender
        sender_id: String,
        /// Name shown in the block header
        display_name: String,
        /// Header text color
        color_strong: String,
        /// Block background color
        color_weak: String,
        /// Whether the local account sent this message
        #[serde(default)]
        from_self: bool,
        /// Globally unique message id, referenced by read markers
        uid: String,
        /// Pre-rendered body fragment
        body: String,
        /// Attached media, in display order
        #[serde(default)]
        attachments: Vec<RawAttachment>,
    },
    /// The avatar image of a peer changed
    AvatarChanged {
        /// Address of the peer
        peer_id: String,
    },
    /// A peer has read up to a message
    MarkerReceived {
        /// Address of the reader
        sender_id: String,
        /// Name shown on the marker
        display_name: String,
        /// Uid of the last message read
        marked_message_uid: String,
    },
    /// A peer joined the conversation
    PresenceJoin {
        sender_id: String,
        display_name: String,
        timestamp: DateTime<Utc>,
    },
    /// A peer left the conversation
    PresencePart {
        sender_id: String,
        display_name: String,
        timestamp: DateTime<Utc>,
    },
    /// Font settings changed
    DisplaySettingsChanged {
        #[serde(default)]
        font_family: Option<String>,
        #[serde(default)]
        font_size: Option<String>,
    },
}

impl InboundEvent {
    /// Short name of the event type, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::MessageReceived { .. } => "message-received",
            InboundEvent::AvatarChanged { .. } => "avatar-changed",
            InboundEvent::MarkerReceived { .. } => "marker-received",
            InboundEvent::PresenceJoin { .. } => "presence-join",
            InboundEvent::PresencePart { .. } => "presence-part",
            InboundEvent::DisplaySettingsChanged { .. } => "display-settings-changed",
        }
    }

    /// Parse a JSON-lines event log
    ///
    /// Blank lines and lines starting with `#` are skipped. Each remaining line
    /// yields either an event or the error for that line (1-based line numbers).
    pub fn parse_lines(input: &str) -> Vec<Result<InboundEvent, EventError>> {
        input
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !trimmed.starts_with('#')
            })
            .map(|(idx, line)| {
                serde_json::from_str(line.trim()).map_err(|e| EventError::invalid_line(idx + 1, e.to_string()))
            })
            .collect()
    }
}

/// Attachment record as delivered; validated by the transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawAttachment {
    /// "image" or "frame"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl RawAttachment {
    pub fn image(url: impl Into<String>) -> Self {
        Self { kind: "image".to_string(), url: Some(url.into()) }
    }

    pub fn frame(url: impl Into<String>) -> Self {
        Self { kind: "frame".to_string(), url: Some(url.into()) }
    }
}
