use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use crate::tree::NodeId;

type Key = (DateTime<Utc>, u64);

/// Chronological index of every message in the transcript.
///
/// Keys are `(timestamp, arrival)` where `arrival` increases with every
/// insert, so messages with equal timestamps keep their arrival order and a
/// newcomer lands after all of them. Used only for lookups; the visual tree
/// is the render source.
#[derive(Debug, Clone, Default)]
pub struct TimelineIndex {
    order: BTreeMap<Key, NodeId>,
    keys: HashMap<NodeId, Key>,
    uids: HashMap<String, NodeId>,
    next_arrival: u64,
}

impl TimelineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The messages a new message with `timestamp` falls between
    pub fn find_insertion_point(&self, timestamp: DateTime<Utc>) -> (Option<NodeId>, Option<NodeId>) {
        let boundary = (timestamp, u64::MAX);
        let prev = self.order.range(..=boundary).next_back().map(|(_, id)| *id);
        let next = self
            .order
            .range((Bound::Excluded(boundary), Bound::Unbounded))
            .next()
            .map(|(_, id)| *id);
        (prev, next)
    }

    /// Index a placed message. Returns false if the node or uid is already indexed.
    pub fn insert(&mut self, node: NodeId, timestamp: DateTime<Utc>, uid: impl Into<String>) -> bool {
        let uid = uid.into();
        if self.keys.contains_key(&node) || self.uids.contains_key(&uid) {
            return false;
        }

        let key = (timestamp, self.next_arrival);
        self.next_arrival += 1;
        self.order.insert(key, node);
        self.keys.insert(node, key);
        self.uids.insert(uid, node);
        true
    }

    pub fn resolve(&self, uid: &str) -> Option<NodeId> {
        self.uids.get(uid).copied()
    }

    pub fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        let key = self.keys.get(&node)?;
        self.order.range(..*key).next_back().map(|(_, id)| *id)
    }

    pub fn successor(&self, node: NodeId) -> Option<NodeId> {
        let key = self.keys.get(&node)?;
        self.order
            .range((Bound::Excluded(*key), Bound::Unbounded))
            .next()
            .map(|(_, id)| *id)
    }

    /// All indexed messages, oldest first
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.values().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
