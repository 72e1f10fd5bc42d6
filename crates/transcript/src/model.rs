use chrono::{DateTime, Utc};
use serde::Serialize;
use threadline_core::{EventError, RawAttachment};

use crate::error::TranscriptError;
use crate::timestamp::TimestampLabel;

/// Media attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Attachment {
    Image { url: String },
    /// Embedded frame; sized after insertion at a 16:9 ratio
    Frame { url: String },
}

impl Attachment {
    pub fn url(&self) -> &str {
        match self {
            Attachment::Image { url } | Attachment::Frame { url } => url,
        }
    }

    /// Whether the view must size this attachment once it is laid out
    pub fn needs_sizing(&self) -> bool {
        matches!(self, Attachment::Frame { .. })
    }
}

impl TryFrom<&RawAttachment> for Attachment {
    type Error = TranscriptError;

    fn try_from(raw: &RawAttachment) -> Result<Self, Self::Error> {
        let url = match raw.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => {
                return Err(EventError::unsupported_attachment(format!("{} attachment without url", raw.kind)).into());
            }
        };

        match raw.kind.to_lowercase().as_str() {
            "image" => Ok(Attachment::Image { url }),
            "frame" => Ok(Attachment::Frame { url }),
            other => Err(EventError::unsupported_attachment(format!("type '{}'", other)).into()),
        }
    }
}

/// A chat message. Immutable once placed in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub sender_id: String,
    pub display_name: String,
    pub color_strong: String,
    pub color_weak: String,
    pub from_self: bool,
    /// Globally unique; read markers refer to messages by uid
    pub uid: String,
    /// Pre-rendered markup fragment
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Create a message with an empty body and no styling
    pub fn new(uid: impl Into<String>, sender_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let sender_id = sender_id.into();
        Self {
            timestamp,
            display_name: sender_id.clone(),
            sender_id,
            color_strong: String::new(),
            color_weak: String::new(),
            from_self: false,
            uid: uid.into(),
            body: String::new(),
            attachments: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_colors(mut self, strong: impl Into<String>, weak: impl Into<String>) -> Self {
        self.color_strong = strong.into();
        self.color_weak = weak.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn from_self(mut self, from_self: bool) -> Self {
        self.from_self = from_self;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// A message as stored in the tree, with its derived label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    pub message: Message,
    pub label: Option<TimestampLabel>,
}

impl MessageNode {
    pub fn new(message: Message) -> Self {
        Self { message, label: None }
    }
}

/// Header data shared by all messages of a sender-block, taken from its first message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub sender_id: String,
    pub display_name: String,
    pub from_self: bool,
    pub color_strong: String,
    pub color_weak: String,
    pub avatar: String,
}

impl BlockHeader {
    pub fn from_message(message: &Message, avatar: String) -> Self {
        Self {
            sender_id: message.sender_id.clone(),
            display_name: message.display_name.clone(),
            from_self: message.from_self,
            color_strong: message.color_strong.clone(),
            color_weak: message.color_weak.clone(),
            avatar,
        }
    }
}

/// Join or leave notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceItem {
    pub sender_id: String,
    pub display_name: String,
    pub timestamp: DateTime<Utc>,
    pub is_join: bool,
}

impl PresenceItem {
    pub fn join(sender_id: impl Into<String>, display_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { sender_id: sender_id.into(), display_name: display_name.into(), timestamp, is_join: true }
    }

    pub fn part(sender_id: impl Into<String>, display_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { sender_id: sender_id.into(), display_name: display_name.into(), timestamp, is_join: false }
    }
}

/// Per-sender "read up to here" indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadMarker {
    pub sender_id: String,
    pub display_name: String,
    pub avatar: String,
}

/// Font settings applied to the whole transcript
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplaySettings {
    pub font_family: Option<String>,
    pub font_size: Option<String>,
}

impl DisplaySettings {
    /// Take the fields that are given. Returns whether anything changed.
    pub fn merge(&mut self, font_family: Option<String>, font_size: Option<String>) -> bool {
        let mut changed = false;
        if let Some(family) = font_family
            && self.font_family.as_deref() != Some(family.as_str())
        {
            self.font_family = Some(family);
            changed = true;
        }
        if let Some(size) = font_size
            && self.font_size.as_deref() != Some(size.as_str())
        {
            self.font_size = Some(size);
            changed = true;
        }
        changed
    }
}
