//! Structural invariants checked over long pseudo-random event streams.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use threadline_core::InboundEvent;
use threadline_transcript::{
    NodeId, NodeKind, Predecessor, RecordingSink, TimestampFormatter, TranscriptEngine, VisualTree,
};

/// Small deterministic generator so failures are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 23, 58, 0).unwrap()
}

fn message(uid: &str, sender: &str, timestamp: DateTime<Utc>) -> InboundEvent {
    InboundEvent::MessageReceived {
        timestamp,
        sender_id: sender.to_string(),
        display_name: sender.to_uppercase(),
        color_strong: "#123".to_string(),
        color_weak: "#abc".to_string(),
        from_self: sender == "me",
        uid: uid.to_string(),
        body: format!("<p>{}</p>", uid),
        attachments: Vec::new(),
    }
}

fn marker(reader: &str, uid: &str) -> InboundEvent {
    InboundEvent::MarkerReceived {
        sender_id: reader.to_string(),
        display_name: reader.to_uppercase(),
        marked_message_uid: uid.to_string(),
    }
}

fn uid_of(tree: &VisualTree, node: NodeId) -> String {
    tree.message(node).unwrap().message.uid.clone()
}

/// Blocks hold one sender, are never empty and only touch same-sender blocks
/// through a marker or presence block
fn assert_grouping(tree: &VisualTree) {
    let mut previous_sender: Option<String> = None;
    for id in tree.top_level() {
        match tree.get(id).unwrap() {
            NodeKind::Block(header) => {
                assert!(tree.first_child(id).is_some(), "empty block {}", id);
                for child in tree.children(Some(id)) {
                    assert_eq!(tree.message(child).unwrap().message.sender_id, header.sender_id);
                }
                assert_ne!(previous_sender.as_deref(), Some(header.sender_id.as_str()), "adjacent blocks of one sender");
                previous_sender = Some(header.sender_id.clone());
            }
            NodeKind::Presence => {
                assert!(tree.first_child(id).is_some(), "empty presence block {}", id);
                previous_sender = None;
            }
            NodeKind::Marker(_) => previous_sender = None,
            other => panic!("unexpected top-level node {:?}", other),
        }
    }
}

/// Every label matches what the formatter computes from the current neighbours
fn assert_labels(engine: &TranscriptEngine<RecordingSink>) {
    let tree = engine.tree();
    let formatter = TimestampFormatter::utc();
    for node in engine.timeline().iter() {
        let predecessor = engine.timeline().predecessor(node).map(|prev| Predecessor {
            timestamp: tree.message(prev).unwrap().message.timestamp,
            same_block: tree.parent(prev) == tree.parent(node),
        });
        let message = tree.message(node).unwrap();
        assert_eq!(
            message.label.as_ref(),
            Some(&formatter.label(message.message.timestamp, predecessor)),
            "stale label on {}",
            message.message.uid
        );
    }
}

/// Each reader's marker sits behind the block ending in the last message they read
fn assert_markers(tree: &VisualTree, last_read: &HashMap<String, String>) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for id in tree.top_level() {
        let Some(marker) = tree.marker(id) else { continue };
        *seen.entry(marker.sender_id.clone()).or_default() += 1;

        let mut anchor = tree.prev_sibling(id);
        while let Some(a) = anchor
            && tree.marker(a).is_some()
        {
            anchor = tree.prev_sibling(a);
        }
        let block = anchor.expect("marker without a block before it");
        let last = tree.last_child(block).expect("marker after a non-block");
        assert_eq!(Some(&uid_of(tree, last)), last_read.get(&marker.sender_id));
    }

    assert_eq!(seen.len(), last_read.len());
    assert!(seen.values().all(|count| *count == 1));
}

#[test]
fn order_matches_stable_timestamp_sort() {
    for seed in 1..=20u64 {
        let mut rng = Lcg(seed);
        let senders = ["a", "b", "me"];
        let mut engine = TranscriptEngine::new("me", RecordingSink::new());
        let mut expected: Vec<(DateTime<Utc>, usize, String)> = Vec::new();

        for arrival in 0..60 {
            let ts = base() + Duration::seconds(rng.below(240) as i64);
            let uid = format!("s{}m{}", seed, arrival);
            engine.handle(message(&uid, senders[rng.below(senders.len())], ts));
            expected.push((ts, arrival, uid));
        }

        expected.sort();
        let expected: Vec<String> = expected.into_iter().map(|(_, _, uid)| uid).collect();
        let tree = engine.tree();
        let rendered: Vec<String> = tree.messages().into_iter().map(|id| uid_of(tree, id)).collect();
        let indexed: Vec<String> = engine.timeline().iter().map(|id| uid_of(tree, id)).collect();

        assert_eq!(rendered, expected, "seed {}", seed);
        assert_eq!(indexed, expected, "seed {}", seed);
        assert_grouping(tree);
        assert_labels(&engine);
    }
}

#[test]
fn invariants_hold_under_mixed_events() {
    for seed in 1..=25u64 {
        let mut rng = Lcg(seed * 7919);
        let senders = ["a", "b", "c"];
        let readers = ["r1", "r2", "a"];
        let mut engine = TranscriptEngine::new("me", RecordingSink::new());
        let mut uids: Vec<String> = Vec::new();
        let mut last_read: HashMap<String, String> = HashMap::new();

        for step in 0..120 {
            match rng.below(10) {
                0..=5 => {
                    let ts = base() + Duration::seconds(rng.below(300) as i64);
                    let uid = format!("m{}", step);
                    engine.handle(message(&uid, senders[rng.below(senders.len())], ts));
                    uids.push(uid);
                }
                6 | 7 if !uids.is_empty() => {
                    let reader = readers[rng.below(readers.len())];
                    let uid = uids[rng.below(uids.len())].clone();
                    engine.handle(marker(reader, &uid));
                    last_read.insert(reader.to_string(), uid);
                }
                8 => {
                    let who = senders[rng.below(senders.len())].to_string();
                    engine.handle(InboundEvent::PresenceJoin {
                        sender_id: who.clone(),
                        display_name: who,
                        timestamp: base(),
                    });
                }
                _ => {
                    let who = senders[rng.below(senders.len())].to_string();
                    engine.handle(InboundEvent::PresencePart {
                        sender_id: who.clone(),
                        display_name: who,
                        timestamp: base(),
                    });
                }
            }

            let tree = engine.tree();
            let rendered: Vec<String> = tree.messages().into_iter().map(|id| uid_of(tree, id)).collect();
            let indexed: Vec<String> = engine.timeline().iter().map(|id| uid_of(tree, id)).collect();
            assert_eq!(rendered, indexed, "seed {} step {}", seed, step);
            assert_eq!(rendered.len(), uids.len());
            assert_grouping(tree);
            assert_markers(tree, &last_read);
            assert_labels(&engine);
        }

        assert_eq!(engine.markers().len(), last_read.len());
    }
}

#[test]
fn unknown_receipts_leave_markers_alone() {
    let mut engine = TranscriptEngine::new("me", RecordingSink::new());
    engine.handle(message("m1", "a", base()));
    engine.handle(message("m2", "a", base() + Duration::seconds(1)));
    engine.handle(marker("r", "m1"));
    let before = engine.outline();

    engine.handle(marker("r", "missing"));
    assert_eq!(engine.outline(), before);
    assert_eq!(engine.markers().len(), 1);
}
