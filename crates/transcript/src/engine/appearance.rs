use super::TranscriptEngine;
use crate::sink::{Mutation, ViewSink};

impl<S: ViewSink> TranscriptEngine<S> {
    /// Bump the avatar epoch of `peer_id` and point every rendered avatar of
    /// theirs at the new address
    pub(super) fn avatar_changed(&mut self, peer_id: &str) {
        if !self.avatars.invalidate(peer_id) {
            tracing::debug!("No avatars of {} in this transcript", peer_id);
            return;
        }

        let changed = self.blocks().refresh_avatars(peer_id);
        tracing::debug!("Re-issued {} avatar(s) of {}", changed.len(), peer_id);
    }

    pub(super) fn display_settings_changed(&mut self, font_family: Option<String>, font_size: Option<String>) {
        if !self.display.merge(font_family, font_size) {
            return;
        }

        tracing::debug!("Display settings now {:?}", self.display);
        self.tree.record(Mutation::DisplaySettings {
            font_family: self.display.font_family.clone(),
            font_size: self.display.font_size.clone(),
        });
    }
}
