mod appearance;
mod deferred;
mod messages;
mod presence;
mod receipts;

use threadline_core::logging::{self, PrivacyConfig};
use threadline_core::{Config, InboundEvent};

use crate::avatar::AvatarAddressCache;
use crate::blocks::BlockManager;
use crate::error::TranscriptError;
use crate::markers::MarkerTracker;
use crate::model::{DisplaySettings, Message, PresenceItem};
use crate::sink::{Mutation, PostTaskQueue, ViewSink};
use crate::snapshot;
use crate::timeline::TimelineIndex;
use crate::timestamp::{Predecessor, TimestampFormatter};
use crate::tree::{NodeId, VisualTree};

/// Receives inbound events and keeps the visual tree in shape.
///
/// Supports:
/// - Placing messages in timestamp order, grouped into sender-blocks
/// - Compressing timestamp labels against the previous message
/// - Moving per-sender read markers, splitting and rejoining blocks
/// - Collecting join and leave notices in a trailing presence block
/// - Re-issuing avatar addresses when a peer's avatar changes
///
/// Every change is journaled and handed to the sink once the event is
/// fully applied; deferred work (scrolling, frame sizing) follows.
pub struct TranscriptEngine<S: ViewSink> {
    tree: VisualTree,
    timeline: TimelineIndex,
    markers: MarkerTracker,
    avatars: AvatarAddressCache,
    formatter: TimestampFormatter,
    deferred: PostTaskQueue,
    display: DisplaySettings,
    privacy: PrivacyConfig,
    sink: S,
}

impl<S: ViewSink> TranscriptEngine<S> {
    /// Create an engine for `account` with UTC labels and default settings
    pub fn new(account: impl Into<String>, sink: S) -> Self {
        Self {
            tree: VisualTree::new(),
            timeline: TimelineIndex::new(),
            markers: MarkerTracker::new(),
            avatars: AvatarAddressCache::new(account),
            formatter: TimestampFormatter::utc(),
            deferred: PostTaskQueue::new(),
            display: DisplaySettings::default(),
            privacy: PrivacyConfig::default(),
            sink,
        }
    }

    /// Create an engine from a loaded configuration
    pub fn from_config(config: &Config, sink: S) -> threadline_core::Result<Self> {
        let formatter = TimestampFormatter::from_setting(config.display.utc_offset()?);
        let privacy = logging::LoggingConfig::from(config.logging.clone()).privacy;

        let mut engine = Self::new(config.account.clone(), sink).with_formatter(formatter);
        engine.display = DisplaySettings {
            font_family: config.display.font_family.clone(),
            font_size: config.display.font_size.clone(),
        };
        engine.privacy = privacy;
        Ok(engine)
    }

    pub fn with_formatter(mut self, formatter: TimestampFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_privacy(mut self, privacy: PrivacyConfig) -> Self {
        self.privacy = privacy;
        self
    }

    /// Apply one inbound event, then flush mutations and deferred work to the sink
    pub fn handle(&mut self, event: InboundEvent) {
        tracing::debug!("Handling {} event", event.kind());

        match event {
            InboundEvent::MessageReceived {
                timestamp,
                sender_id,
                display_name,
                color_strong,
                color_weak,
                from_self,
                uid,
                body,
                attachments,
            } => {
                let message = Message {
                    timestamp,
                    sender_id,
                    display_name,
                    color_strong,
                    color_weak,
                    from_self,
                    uid,
                    body,
                    attachments: Vec::new(),
                };
                self.message_received(message, &attachments);
            }
            InboundEvent::AvatarChanged { peer_id } => self.avatar_changed(&peer_id),
            InboundEvent::MarkerReceived { sender_id, display_name, marked_message_uid } => {
                self.marker_received(&sender_id, &display_name, &marked_message_uid)
            }
            InboundEvent::PresenceJoin { sender_id, display_name, timestamp } => {
                self.presence_join(PresenceItem::join(sender_id, display_name, timestamp))
            }
            InboundEvent::PresencePart { sender_id, display_name, timestamp } => {
                self.presence_part(PresenceItem::part(sender_id, display_name, timestamp))
            }
            InboundEvent::DisplaySettingsChanged { font_family, font_size } => {
                self.display_settings_changed(font_family, font_size)
            }
        }

        self.flush();
    }

    pub fn tree(&self) -> &VisualTree {
        &self.tree
    }

    pub fn timeline(&self) -> &TimelineIndex {
        &self.timeline
    }

    pub fn markers(&self) -> &MarkerTracker {
        &self.markers
    }

    pub fn avatars(&self) -> &AvatarAddressCache {
        &self.avatars
    }

    pub fn display_settings(&self) -> &DisplaySettings {
        &self.display
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Markup of the transcript as currently rendered
    pub fn snapshot(&self) -> Result<String, TranscriptError> {
        snapshot::render_markup(&self.tree, &self.display)
    }

    /// One line per top-level node, see [`snapshot::render_outline`]
    pub fn outline(&self) -> String {
        snapshot::render_outline(&self.tree)
    }

    fn blocks(&mut self) -> BlockManager<'_> {
        BlockManager::new(&mut self.tree, &mut self.avatars)
    }

    /// Recompute the label of `message` against its chronological predecessor.
    ///
    /// Journals a `SetTimestamp` only when the label actually changed.
    fn relabel(&mut self, message: NodeId) {
        let Some(node) = self.tree.message(message) else {
            return;
        };
        let predecessor = self.timeline.predecessor(message).and_then(|prev| {
            let timestamp = self.tree.message(prev)?.message.timestamp;
            Some(Predecessor { timestamp, same_block: self.tree.parent(prev) == self.tree.parent(message) })
        });

        let label = self.formatter.label(node.message.timestamp, predecessor);
        if node.label.as_ref() == Some(&label) {
            return;
        }
        if let Some(node) = self.tree.message_mut(message) {
            node.label = Some(label.clone());
        }
        self.tree.record(Mutation::SetTimestamp { node: message, label });
    }
}
