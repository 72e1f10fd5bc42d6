//! Incrementally maintained chat transcript.
//!
//! [`TranscriptEngine`] consumes [`threadline_core::InboundEvent`]s and keeps
//! a two-level visual tree of sender-blocks, read markers and presence
//! blocks in chronological order. Changes leave the engine as [`Mutation`]s
//! through a [`ViewSink`]; the tree is never rebuilt.

pub mod avatar;
pub mod blocks;
pub mod engine;
pub mod error;
pub mod markers;
pub mod model;
pub mod sink;
pub mod snapshot;
pub mod timeline;
pub mod timestamp;
pub mod tree;

pub use avatar::AvatarAddressCache;
pub use blocks::BlockManager;
pub use engine::TranscriptEngine;
pub use error::TranscriptError;
pub use markers::{MarkerPlacement, MarkerTracker};
pub use model::{Attachment, BlockHeader, DisplaySettings, Message, MessageNode, PresenceItem, ReadMarker};
pub use sink::{Deferred, Mutation, PostTaskQueue, RecordingSink, ViewSink};
pub use timeline::TimelineIndex;
pub use timestamp::{DayZone, Predecessor, TimestampFormatter, TimestampLabel};
pub use tree::{NodeId, NodeKind, VisualTree};
