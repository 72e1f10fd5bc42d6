use super::TranscriptEngine;
use crate::sink::{Deferred, ViewSink, frame_height};

impl<S: ViewSink> TranscriptEngine<S> {
    /// Hand journaled mutations to the sink, then run deferred work
    pub(super) fn flush(&mut self) {
        for mutation in self.tree.take_journal() {
            self.sink.apply(&mutation);
        }

        for task in self.deferred.drain() {
            match task {
                Deferred::ScrollToBottom => self.sink.scroll_to_bottom(),
                Deferred::SizeFrame { message, index } => {
                    if !self.tree.is_attached(message) {
                        continue;
                    }
                    match self.sink.frame_width(message, index) {
                        Some(width) => self.sink.resize_frame(message, index, frame_height(width)),
                        None => tracing::debug!("No width for frame {} of {}", index, message),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::TranscriptEngine;
    use crate::sink::{Mutation, ViewSink};
    use crate::tree::NodeId;
    use chrono::{TimeZone, Utc};
    use threadline_core::{InboundEvent, RawAttachment};

    /// Records the order in which the view is called
    #[derive(Default)]
    struct OrderSink {
        calls: Vec<String>,
    }

    impl ViewSink for OrderSink {
        fn apply(&mut self, mutation: &Mutation) {
            let op = serde_json::to_value(mutation).unwrap()["op"].as_str().unwrap().to_string();
            self.calls.push(op);
        }

        fn scroll_to_bottom(&mut self) {
            self.calls.push("scroll".to_string());
        }

        fn frame_width(&self, _message: NodeId, _index: usize) -> Option<u32> {
            Some(320)
        }

        fn resize_frame(&mut self, _message: NodeId, index: usize, height: u32) {
            self.calls.push(format!("resize {} {}", index, height));
        }
    }

    #[test]
    fn test_deferred_work_runs_after_mutations() {
        let mut engine = TranscriptEngine::new("me", OrderSink::default());
        engine.handle(InboundEvent::MessageReceived {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            sender_id: "a".to_string(),
            display_name: "A".to_string(),
            color_strong: String::new(),
            color_weak: String::new(),
            from_self: false,
            uid: "m1".to_string(),
            body: String::new(),
            attachments: vec![RawAttachment::frame("https://example.com/embed")],
        });

        assert_eq!(engine.sink().calls, vec!["insert", "insert", "set-timestamp", "resize 0 180", "scroll"]);
    }
}
