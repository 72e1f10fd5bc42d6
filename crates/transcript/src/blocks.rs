//! Sender-block grouping and presence blocks.
//!
//! Consecutive messages from one sender share a block. Markers split blocks
//! and, once they move on, the fragments are joined again. Join and leave
//! notices collect in a presence block that trails the transcript.

use crate::avatar::AvatarAddressCache;
use crate::error::TranscriptError;
use crate::model::{BlockHeader, PresenceItem};
use crate::sink::Mutation;
use crate::tree::{NodeId, NodeKind, VisualTree};

pub struct BlockManager<'a> {
    tree: &'a mut VisualTree,
    avatars: &'a mut AvatarAddressCache,
}

impl<'a> BlockManager<'a> {
    pub fn new(tree: &'a mut VisualTree, avatars: &'a mut AvatarAddressCache) -> Self {
        Self { tree, avatars }
    }

    pub fn tree(&self) -> &VisualTree {
        &*self.tree
    }

    pub fn tree_mut(&mut self) -> &mut VisualTree {
        &mut *self.tree
    }

    pub fn avatar_address(&mut self, peer_id: &str, display_name: &str) -> String {
        self.avatars.get_address(peer_id, display_name)
    }

    /// Attach a detached message node between its chronological neighbours.
    ///
    /// Returns the block the message ended up in, or `None` if `message` is
    /// not a detached message node.
    pub fn place_message(&mut self, message: NodeId, prev: Option<NodeId>, next: Option<NodeId>) -> Option<NodeId> {
        if self.tree.is_attached(message) {
            return None;
        }
        let sender = self.tree.message(message)?.message.sender_id.clone();

        if let Some(prev) = prev
            && self.tree.sender_of(prev) == Some(sender.as_str())
            && let Some(block) = self.tree.parent(prev)
            && self.can_append_after(prev, block)
        {
            tracing::debug!("Appending {} after {} in block {}", message, prev, block);
            self.tree.insert_after(message, prev);
            return Some(block);
        }

        if let Some(next) = next
            && self.tree.sender_of(next) == Some(sender.as_str())
            && let Some(block) = self.tree.parent(next)
        {
            tracing::debug!("Prepending {} before {} in block {}", message, next, block);
            self.tree.insert(message, Some(block), Some(next));
            return Some(block);
        }

        if let (Some(prev), Some(next)) = (prev, next)
            && self.tree.parent(prev).is_some()
            && self.tree.parent(prev) == self.tree.parent(next)
        {
            self.split_block_after(prev);
        }

        let header = {
            let node = self.tree.message(message)?;
            let avatar = self.avatars.get_address(&node.message.sender_id, &node.message.display_name);
            BlockHeader::from_message(&node.message, avatar)
        };
        let block = self.tree.create(NodeKind::Block(header));
        let before = next.and_then(|n| self.tree.parent(n));
        self.tree.insert(block, None, before);
        self.tree.append(message, Some(block));
        tracing::debug!("Started block {} for {} with {}", block, sender, message);
        Some(block)
    }

    /// A message may join the block of `prev` unless `prev` closes its block
    /// and a marker or presence block follows
    fn can_append_after(&self, prev: NodeId, block: NodeId) -> bool {
        if self.tree.next_sibling(prev).is_some() {
            return true;
        }
        match self.tree.next_sibling(block) {
            None => true,
            Some(after) => self.tree.is_sender_block(after),
        }
    }

    /// Split the block of `message` so that it ends at `message`.
    ///
    /// The messages after `message` move into a new block with a copy of the
    /// header, placed right after the original. Returns the block now ending
    /// in `message`.
    pub fn split_block_after(&mut self, message: NodeId) -> Option<NodeId> {
        let block = self.tree.parent(message)?;
        let header = self.tree.block(block)?.clone();
        let Some(first_moved) = self.tree.next_sibling(message) else {
            return Some(block);
        };

        let tail = self.tree.create(NodeKind::Block(header));
        self.tree.insert_after(tail, block);

        let mut cursor = Some(first_moved);
        while let Some(current) = cursor {
            cursor = self.tree.next_sibling(current);
            self.tree.append(current, Some(tail));
        }

        tracing::debug!("Split block {} after {} into {}", block, message, tail);
        Some(block)
    }

    /// Merge `block` into the sender-block right before it.
    ///
    /// Returns the surviving block, or `None` when the previous sibling is not
    /// a sender-block of the same sender.
    pub fn try_join_with_previous(&mut self, block: NodeId) -> Option<NodeId> {
        let prev = self.tree.prev_sibling(block)?;
        if !self.tree.is_sender_block(block) || !self.tree.is_sender_block(prev) {
            return None;
        }
        if self.tree.sender_of(prev) != self.tree.sender_of(block) {
            let err = TranscriptError::invariant(format!("cannot join block {} into {}: senders differ", block, prev));
            tracing::debug!("{}", err);
            return None;
        }

        let mut cursor = self.tree.first_child(block);
        while let Some(current) = cursor {
            cursor = self.tree.next_sibling(current);
            self.tree.append(current, Some(prev));
        }
        self.tree.remove(block);

        tracing::debug!("Joined block {} into {}", block, prev);
        Some(prev)
    }

    /// The presence block at the very end of the transcript, if there is one
    pub fn trailing_presence_block(&self) -> Option<NodeId> {
        self.tree.last().filter(|last| self.tree.is_presence_block(*last))
    }

    fn ensure_trailing_presence_block(&mut self) -> NodeId {
        if let Some(block) = self.trailing_presence_block() {
            return block;
        }
        let block = self.tree.create(NodeKind::Presence);
        self.tree.append(block, None);
        block
    }

    /// The join item of `sender_id` in `block` that no leave has followed yet
    fn pending_join(&self, block: NodeId, sender_id: &str) -> Option<NodeId> {
        let latest = self
            .tree
            .children(Some(block))
            .filter(|item| self.tree.presence_item(*item).is_some_and(|p| p.sender_id == sender_id))
            .last()?;
        self.tree.presence_item(latest).filter(|p| p.is_join).map(|_| latest)
    }

    /// Record a join at the end of the transcript, replacing a pending join of
    /// the same sender
    pub fn append_join(&mut self, item: PresenceItem) -> NodeId {
        let block = self.ensure_trailing_presence_block();
        if let Some(pending) = self.pending_join(block, &item.sender_id) {
            tracing::debug!("Replacing pending join {} of {}", pending, item.sender_id);
            self.tree.remove(pending);
        }
        let node = self.tree.create(NodeKind::PresenceItem(item));
        self.tree.append(node, Some(block));
        node
    }

    /// Record a leave at the end of the transcript.
    ///
    /// A leave that follows a pending join in the trailing presence block
    /// cancels it instead; both vanish and `None` is returned.
    pub fn append_part(&mut self, item: PresenceItem) -> Option<NodeId> {
        if let Some(block) = self.trailing_presence_block()
            && let Some(pending) = self.pending_join(block, &item.sender_id)
        {
            tracing::debug!("Leave of {} cancels pending join {}", item.sender_id, pending);
            self.tree.remove(pending);
            if self.tree.first_child(block).is_none() {
                self.tree.remove(block);
            }
            return None;
        }

        let block = self.ensure_trailing_presence_block();
        let node = self.tree.create(NodeKind::PresenceItem(item));
        self.tree.append(node, Some(block));
        Some(node)
    }

    /// Point every block and marker of `peer_id` at its current avatar address.
    ///
    /// Returns the nodes whose address changed.
    pub fn refresh_avatars(&mut self, peer_id: &str) -> Vec<NodeId> {
        let targets: Vec<(NodeId, String)> = self
            .tree
            .top_level()
            .filter_map(|id| match self.tree.get(id)? {
                NodeKind::Block(header) if header.sender_id == peer_id => Some((id, header.display_name.clone())),
                NodeKind::Marker(marker) if marker.sender_id == peer_id => Some((id, marker.display_name.clone())),
                _ => None,
            })
            .collect();

        let mut changed = Vec::new();
        for (id, display_name) in targets {
            let address = self.avatars.get_address(peer_id, &display_name);
            let slot = match self.tree.get_mut(id) {
                Some(NodeKind::Block(header)) => &mut header.avatar,
                Some(NodeKind::Marker(marker)) => &mut marker.avatar,
                _ => continue,
            };
            if *slot == address {
                continue;
            }
            slot.clone_from(&address);
            self.tree.record(Mutation::SetAvatar { node: id, address });
            changed.push(id);
        }
        changed
    }
}
