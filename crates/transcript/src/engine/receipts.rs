use super::TranscriptEngine;
use crate::blocks::BlockManager;
use crate::sink::{Deferred, ViewSink};

impl<S: ViewSink> TranscriptEngine<S> {
    /// Move the read marker of `sender_id` behind `marked_uid`.
    ///
    /// Receipts for messages that are not in the transcript are dropped.
    pub(super) fn marker_received(&mut self, sender_id: &str, display_name: &str, marked_uid: &str) {
        let result = {
            let mut blocks = BlockManager::new(&mut self.tree, &mut self.avatars);
            self.markers.set_marker(&mut blocks, &self.timeline, sender_id, display_name, marked_uid)
        };

        let placement = match result {
            Ok(placement) => placement,
            Err(err) => {
                tracing::warn!("Dropping receipt from {}: {}", sender_id, err);
                return;
            }
        };

        if let Some(joined) = placement.joined {
            self.relabel(joined);
        }
        if let Some(following) = placement.following {
            self.relabel(following);
        }
        if placement.moved && placement.at_end {
            self.deferred.push(Deferred::ScrollToBottom);
        }
    }
}
