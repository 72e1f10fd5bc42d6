use super::TranscriptEngine;
use crate::model::PresenceItem;
use crate::sink::{Deferred, ViewSink};

impl<S: ViewSink> TranscriptEngine<S> {
    pub(super) fn presence_join(&mut self, item: PresenceItem) {
        tracing::debug!("{} joined", item.sender_id);
        self.blocks().append_join(item);
        self.deferred.push(Deferred::ScrollToBottom);
    }

    pub(super) fn presence_part(&mut self, item: PresenceItem) {
        tracing::debug!("{} left", item.sender_id);
        self.blocks().append_part(item);
        self.deferred.push(Deferred::ScrollToBottom);
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::TranscriptEngine;
    use crate::sink::{Mutation, RecordingSink};
    use chrono::{TimeZone, Utc};
    use threadline_core::InboundEvent;

    fn join(sender: &str) -> InboundEvent {
        InboundEvent::PresenceJoin {
            sender_id: sender.to_string(),
            display_name: sender.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    fn part(sender: &str) -> InboundEvent {
        InboundEvent::PresencePart {
            sender_id: sender.to_string(),
            display_name: sender.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 1).unwrap(),
        }
    }

    #[test]
    fn test_join_then_part_leaves_nothing() {
        let mut engine = TranscriptEngine::new("me", RecordingSink::new());
        engine.handle(join("a"));
        assert_eq!(engine.outline(), "presence: +a");

        engine.handle(part("a"));
        assert_eq!(engine.outline(), "");
        assert!(matches!(engine.sink().mutations.last(), Some(Mutation::Remove { .. })));
        assert_eq!(engine.sink().scrolls, 2);
    }

    #[test]
    fn test_part_without_join_is_shown() {
        let mut engine = TranscriptEngine::new("me", RecordingSink::new());
        engine.handle(join("a"));
        engine.handle(part("b"));
        engine.handle(join("b"));

        assert_eq!(engine.outline(), "presence: +a -b +b");
    }
}
