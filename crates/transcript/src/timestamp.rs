use chrono::{DateTime, FixedOffset, Local, Offset, Timelike, Utc};
use serde::Serialize;
use threadline_core::UtcOffsetSetting;

const FULL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Label shown next to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TimestampLabel {
    /// Date and time
    Full { text: String },
    /// Time of day with a leading part that is only exposed to assistive tools
    Compact { hidden: String, shown: String },
}

impl TimestampLabel {
    pub fn shown(&self) -> &str {
        match self {
            TimestampLabel::Full { text } => text,
            TimestampLabel::Compact { shown, .. } => shown,
        }
    }

    pub fn hidden(&self) -> &str {
        match self {
            TimestampLabel::Full { .. } => "",
            TimestampLabel::Compact { hidden, .. } => hidden,
        }
    }
}

/// The chronologically previous message, as seen from the one being labelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predecessor {
    pub timestamp: DateTime<Utc>,
    pub same_block: bool,
}

/// Where calendar days are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayZone {
    /// The machine's time zone, with each timestamp taking the offset in force at that instant
    Local,
    Fixed(FixedOffset),
}

/// Computes the shortest label that still tells a message apart from its predecessor
#[derive(Debug, Clone, Copy)]
pub struct TimestampFormatter {
    zone: DayZone,
}

impl TimestampFormatter {
    /// Formatter comparing calendar days in the given offset
    pub fn new(offset: FixedOffset) -> Self {
        Self { zone: DayZone::Fixed(offset) }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn local() -> Self {
        Self { zone: DayZone::Local }
    }

    /// Formatter for a configured offset setting
    pub fn from_setting(setting: UtcOffsetSetting) -> Self {
        setting.fixed_offset().map_or_else(Self::local, Self::new)
    }

    pub fn zone(&self) -> DayZone {
        self.zone
    }

    fn localize(&self, timestamp: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self.zone {
            DayZone::Local => timestamp.with_timezone(&Local).fixed_offset(),
            DayZone::Fixed(offset) => timestamp.with_timezone(&offset),
        }
    }

    pub fn label(&self, timestamp: DateTime<Utc>, predecessor: Option<Predecessor>) -> TimestampLabel {
        let local = self.localize(timestamp);

        let Some(predecessor) = predecessor else {
            return TimestampLabel::Full { text: local.format(FULL_FORMAT).to_string() };
        };
        let prev = self.localize(predecessor.timestamp);
        if prev.date_naive() != local.date_naive() {
            return TimestampLabel::Full { text: local.format(FULL_FORMAT).to_string() };
        }

        let time = local.format(TIME_FORMAT).to_string();
        let same_hour = prev.hour() == local.hour();
        let same_minute = same_hour && prev.minute() == local.minute();

        if predecessor.same_block && same_minute {
            TimestampLabel::Compact { hidden: time[..5].to_string(), shown: time[5..].to_string() }
        } else if predecessor.same_block && same_hour {
            TimestampLabel::Compact { hidden: time[..2].to_string(), shown: time[3..].to_string() }
        } else {
            TimestampLabel::Compact { hidden: String::new(), shown: time }
        }
    }
}
