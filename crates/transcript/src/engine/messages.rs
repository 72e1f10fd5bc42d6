use threadline_core::RawAttachment;
use threadline_core::logging::redact_body;

use super::TranscriptEngine;
use crate::model::{Attachment, Message, MessageNode};
use crate::sink::{Deferred, ViewSink};
use crate::tree::NodeKind;

impl<S: ViewSink> TranscriptEngine<S> {
    /// Place a new message in the transcript.
    ///
    /// Attachments that cannot be shown are skipped; the rest of the message
    /// is still rendered. A uid that is already present is ignored.
    pub(super) fn message_received(&mut self, mut message: Message, attachments: &[RawAttachment]) {
        if self.timeline.resolve(&message.uid).is_some() {
            tracing::debug!("Ignoring duplicate message {}", message.uid);
            return;
        }

        for raw in attachments {
            match Attachment::try_from(raw) {
                Ok(attachment) => message.attachments.push(attachment),
                Err(err) => tracing::warn!("Skipping attachment of message {}: {}", message.uid, err),
            }
        }

        tracing::debug!(
            "Message {} from {} at {}: {}",
            message.uid,
            message.sender_id,
            message.timestamp,
            redact_body(&message.body, &self.privacy)
        );

        let timestamp = message.timestamp;
        let uid = message.uid.clone();
        let frames: Vec<usize> = message
            .attachments
            .iter()
            .enumerate()
            .filter(|(_, attachment)| attachment.needs_sizing())
            .map(|(index, _)| index)
            .collect();

        let node = self.tree.create(NodeKind::Message(MessageNode::new(message)));
        let (prev, next) = self.timeline.find_insertion_point(timestamp);
        if self.blocks().place_message(node, prev, next).is_none() {
            tracing::warn!("Could not place message {}", uid);
            self.tree.remove(node);
            return;
        }
        self.timeline.insert(node, timestamp, uid);

        self.relabel(node);
        if let Some(successor) = self.timeline.successor(node) {
            self.relabel(successor);
        }

        for index in frames {
            self.deferred.push(Deferred::SizeFrame { message: node, index });
        }
        self.deferred.push(Deferred::ScrollToBottom);
    }
}
