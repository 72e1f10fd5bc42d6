//! Arena-backed visual tree.
//!
//! The transcript is a two-level document: top-level nodes (sender-blocks,
//! presence blocks and read markers) and their children (messages inside a
//! sender-block, join/leave items inside a presence block). Nodes are
//! addressed by [`NodeId`] handles that stay valid for the lifetime of the
//! node. Freed slots are reused under a new generation, so a stale handle
//! resolves to nothing.
//!
//! Every structural change is journaled as a [`Mutation`]; the engine drains
//! the journal into the view after each event.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::model::{BlockHeader, MessageNode, PresenceItem, ReadMarker};
use crate::sink::Mutation;

/// Stable handle to a node in the [`VisualTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Serialized as `"<index>.<generation>"`
impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{}.{}", self.index, self.generation))
    }
}

/// What a node renders as
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Block(BlockHeader),
    Message(MessageNode),
    Presence,
    PresenceItem(PresenceItem),
    Marker(ReadMarker),
}

#[derive(Debug, Clone)]
struct Slot {
    kind: NodeKind,
    attached: bool,
    parent: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
}

impl Slot {
    fn new(kind: NodeKind) -> Self {
        Self { kind, attached: false, parent: None, prev: None, next: None, first_child: None, last_child: None }
    }
}

#[derive(Debug, Clone, Default)]
struct Cell {
    generation: u32,
    slot: Option<Slot>,
}

#[derive(Debug, Clone, Default)]
pub struct VisualTree {
    cells: Vec<Cell>,
    vacant: Vec<usize>,
    first: Option<NodeId>,
    last: Option<NodeId>,
    journal: Vec<Mutation>,
}

impl VisualTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        if let Some(index) = self.vacant.pop()
            && let Some(cell) = self.cells.get_mut(index)
        {
            cell.slot = Some(Slot::new(kind));
            return NodeId { index, generation: cell.generation };
        }

        let index = self.cells.len();
        self.cells.push(Cell { generation: 0, slot: Some(Slot::new(kind)) });
        NodeId { index, generation: 0 }
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.cells.get(id.index).filter(|c| c.generation == id.generation).and_then(|c| c.slot.as_ref())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.cells.get_mut(id.index).filter(|c| c.generation == id.generation).and_then(|c| c.slot.as_mut())
    }

    /// Number of live nodes, attached or not
    pub fn len(&self) -> usize {
        self.cells.len() - self.vacant.len()
    }

    #[cfg(test)]
    pub(crate) fn allocated(&self) -> usize {
        self.cells.len()
    }

    /// Whether the handle refers to a live (possibly detached) node
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|s| s.attached)
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeKind> {
        self.slot(id).map(|s| &s.kind)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.slot_mut(id).map(|s| &mut s.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.parent)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.next)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.prev)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.first_child)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.last_child)
    }

    /// First top-level node
    pub fn first(&self) -> Option<NodeId> {
        self.first
    }

    /// Last top-level node
    pub fn last(&self) -> Option<NodeId> {
        self.last
    }

    /// Children of `parent`, or the top-level nodes when `parent` is `None`
    pub fn children(&self, parent: Option<NodeId>) -> Children<'_> {
        let next = match parent {
            Some(p) => self.first_child(p),
            None => self.first,
        };
        Children { tree: self, next }
    }

    pub fn top_level(&self) -> Children<'_> {
        self.children(None)
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(Some(id)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    pub fn block(&self, id: NodeId) -> Option<&BlockHeader> {
        match self.get(id)? {
            NodeKind::Block(header) => Some(header),
            _ => None,
        }
    }

    pub fn message(&self, id: NodeId) -> Option<&MessageNode> {
        match self.get(id)? {
            NodeKind::Message(node) => Some(node),
            _ => None,
        }
    }

    pub fn message_mut(&mut self, id: NodeId) -> Option<&mut MessageNode> {
        match self.get_mut(id)? {
            NodeKind::Message(node) => Some(node),
            _ => None,
        }
    }

    pub fn presence_item(&self, id: NodeId) -> Option<&PresenceItem> {
        match self.get(id)? {
            NodeKind::PresenceItem(item) => Some(item),
            _ => None,
        }
    }

    pub fn marker(&self, id: NodeId) -> Option<&ReadMarker> {
        match self.get(id)? {
            NodeKind::Marker(marker) => Some(marker),
            _ => None,
        }
    }

    pub fn marker_mut(&mut self, id: NodeId) -> Option<&mut ReadMarker> {
        match self.get_mut(id)? {
            NodeKind::Marker(marker) => Some(marker),
            _ => None,
        }
    }

    pub fn is_sender_block(&self, id: NodeId) -> bool {
        matches!(self.get(id), Some(NodeKind::Block(_)))
    }

    pub fn is_presence_block(&self, id: NodeId) -> bool {
        matches!(self.get(id), Some(NodeKind::Presence))
    }

    /// Sender of a message or sender-block
    pub fn sender_of(&self, id: NodeId) -> Option<&str> {
        match self.get(id)? {
            NodeKind::Block(header) => Some(&header.sender_id),
            NodeKind::Message(node) => Some(&node.message.sender_id),
            _ => None,
        }
    }

    /// All messages in visual order
    pub fn messages(&self) -> Vec<NodeId> {
        self.top_level()
            .filter(|id| self.is_sender_block(*id))
            .flat_map(|block| self.children(Some(block)))
            .collect()
    }

    /// Attach `node` under `parent` (top level when `None`), immediately before
    /// `before` (at the end when `None`). Moves the node if it is already attached.
    ///
    /// Returns false and leaves the tree untouched when `before` is not a child
    /// of `parent`, `parent` lies inside `node`, or a handle is stale.
    pub fn insert(&mut self, node: NodeId, parent: Option<NodeId>, before: Option<NodeId>) -> bool {
        if !self.contains(node) || parent.is_some_and(|p| !self.is_attached(p) || self.is_within(p, node)) {
            return false;
        }
        if let Some(b) = before
            && (!self.is_attached(b) || self.parent(b) != parent)
        {
            return false;
        }
        if before == Some(node) {
            return true;
        }

        let was_attached = self.is_attached(node);
        if was_attached {
            self.detach(node);
        }
        self.link(node, parent, before);

        self.journal.push(if was_attached {
            Mutation::Move { node, parent, before }
        } else {
            Mutation::Insert { node, parent, before }
        });
        true
    }

    /// Whether `id` is `ancestor` or one of its descendants
    fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Attach `node` immediately after the sibling `anchor`
    pub fn insert_after(&mut self, node: NodeId, anchor: NodeId) -> bool {
        if !self.is_attached(anchor) || anchor == node {
            return false;
        }
        let parent = self.parent(anchor);
        let before = self.next_sibling(anchor);
        self.insert(node, parent, before)
    }

    /// Attach `node` as the last child of `parent`
    pub fn append(&mut self, node: NodeId, parent: Option<NodeId>) -> bool {
        self.insert(node, parent, None)
    }

    /// Detach and free `node` together with its children
    pub fn remove(&mut self, node: NodeId) -> bool {
        if !self.contains(node) {
            return false;
        }
        if self.is_attached(node) {
            self.detach(node);
            self.journal.push(Mutation::Remove { node });
        }
        self.free(node);
        true
    }

    fn free(&mut self, node: NodeId) {
        let mut child = self.first_child(node);
        while let Some(c) = child {
            child = self.next_sibling(c);
            self.free(c);
        }
        if let Some(cell) = self.cells.get_mut(node.index)
            && cell.generation == node.generation
            && cell.slot.take().is_some()
        {
            cell.generation = cell.generation.wrapping_add(1);
            self.vacant.push(node.index);
        }
    }

    fn set_head(&mut self, parent: Option<NodeId>, value: Option<NodeId>) {
        match parent {
            Some(p) => {
                if let Some(slot) = self.slot_mut(p) {
                    slot.first_child = value;
                }
            }
            None => self.first = value,
        }
    }

    fn set_tail(&mut self, parent: Option<NodeId>, value: Option<NodeId>) {
        match parent {
            Some(p) => {
                if let Some(slot) = self.slot_mut(p) {
                    slot.last_child = value;
                }
            }
            None => self.last = value,
        }
    }

    fn detach(&mut self, node: NodeId) {
        let Some(slot) = self.slot_mut(node) else { return };
        let (parent, prev, next) = (slot.parent, slot.prev, slot.next);
        slot.parent = None;
        slot.prev = None;
        slot.next = None;
        slot.attached = false;

        match prev.and_then(|p| self.slot_mut(p)) {
            Some(prev_slot) => prev_slot.next = next,
            None => self.set_head(parent, next),
        }
        match next.and_then(|n| self.slot_mut(n)) {
            Some(next_slot) => next_slot.prev = prev,
            None => self.set_tail(parent, prev),
        }
    }

    fn link(&mut self, node: NodeId, parent: Option<NodeId>, before: Option<NodeId>) {
        let prev = match before {
            Some(b) => self.prev_sibling(b),
            None => match parent {
                Some(p) => self.last_child(p),
                None => self.last,
            },
        };

        if let Some(slot) = self.slot_mut(node) {
            slot.parent = parent;
            slot.prev = prev;
            slot.next = before;
            slot.attached = true;
        }

        match prev.and_then(|p| self.slot_mut(p)) {
            Some(prev_slot) => prev_slot.next = Some(node),
            None => self.set_head(parent, Some(node)),
        }
        match before.and_then(|b| self.slot_mut(b)) {
            Some(next_slot) => next_slot.prev = Some(node),
            None => self.set_tail(parent, Some(node)),
        }
    }

    /// Journal a content change made through `get_mut` and friends
    pub(crate) fn record(&mut self, mutation: Mutation) {
        self.journal.push(mutation);
    }

    /// Take all mutations recorded since the last call
    pub fn take_journal(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.journal)
    }
}

/// Iterator over siblings, see [`VisualTree::children`]
pub struct Children<'a> {
    tree: &'a VisualTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}
