//! Per-sender read markers.

use std::collections::HashMap;

use crate::blocks::BlockManager;
use crate::error::TranscriptError;
use crate::model::ReadMarker;
use crate::sink::Mutation;
use crate::timeline::TimelineIndex;
use crate::tree::{NodeId, NodeKind};

/// Outcome of [`MarkerTracker::set_marker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerPlacement {
    pub marker: NodeId,
    /// Whether the marker was inserted or moved
    pub moved: bool,
    /// The marker is now the last node of the transcript
    pub at_end: bool,
    /// First message of the sender-block right after the marker
    pub following: Option<NodeId>,
    /// First message of a fragment merged back after the marker left it
    pub joined: Option<NodeId>,
}

/// Owns at most one marker node per sender
#[derive(Debug, Clone, Default)]
pub struct MarkerTracker {
    markers: HashMap<String, NodeId>,
}

impl MarkerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker_for(&self, sender_id: &str) -> Option<NodeId> {
        self.markers.get(sender_id).copied()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Place the marker of `sender_id` right after the message `marked_uid`.
    ///
    /// The block holding the message is split so the marker sits between the
    /// read and unread parts. If the marker already existed, the blocks it
    /// used to separate are joined back together where possible.
    pub fn set_marker(
        &mut self,
        blocks: &mut BlockManager<'_>,
        timeline: &TimelineIndex,
        sender_id: &str,
        display_name: &str,
        marked_uid: &str,
    ) -> Result<MarkerPlacement, TranscriptError> {
        let target = timeline
            .resolve(marked_uid)
            .ok_or_else(|| TranscriptError::unknown_reference(marked_uid))?;

        let marker = self.obtain(blocks, sender_id, display_name);

        let head = blocks
            .split_block_after(target)
            .ok_or_else(|| TranscriptError::invariant(format!("message {} is not inside a sender-block", target)))?;

        let tree = blocks.tree();
        let old_next = if tree.is_attached(marker) { tree.next_sibling(marker) } else { None };

        let moved = tree.next_sibling(head) != Some(marker);
        if moved {
            blocks.tree_mut().insert_after(marker, head);
            tracing::debug!("Marker of {} placed after {}", sender_id, target);
        }

        let mut joined = None;
        if moved
            && let Some(old_next) = old_next
            && blocks.tree().is_sender_block(old_next)
        {
            let absorbed = blocks.tree().first_child(old_next);
            if blocks.try_join_with_previous(old_next).is_some() {
                joined = absorbed;
            }
        }

        let tree = blocks.tree();
        let following = tree
            .next_sibling(marker)
            .filter(|next| tree.is_sender_block(*next))
            .and_then(|block| tree.first_child(block));

        Ok(MarkerPlacement { marker, moved, at_end: tree.last() == Some(marker), following, joined })
    }

    /// The sender's marker node, created detached on first use
    fn obtain(&mut self, blocks: &mut BlockManager<'_>, sender_id: &str, display_name: &str) -> NodeId {
        let address = blocks.avatar_address(sender_id, display_name);

        if let Some(&existing) = self.markers.get(sender_id)
            && blocks.tree().contains(existing)
        {
            let attached = blocks.tree().is_attached(existing);
            if let Some(marker) = blocks.tree_mut().marker_mut(existing)
                && marker.display_name != display_name
            {
                marker.display_name = display_name.to_string();
                let changed = marker.avatar != address;
                marker.avatar.clone_from(&address);
                if attached && changed {
                    blocks.tree_mut().record(Mutation::SetAvatar { node: existing, address });
                }
            }
            return existing;
        }

        let marker = blocks.tree_mut().create(NodeKind::Marker(ReadMarker {
            sender_id: sender_id.to_string(),
            display_name: display_name.to_string(),
            avatar: address,
        }));
        self.markers.insert(sender_id.to_string(), marker);
        marker
    }
}
