//! Outbound side of the engine: mutation commands and deferred view work.

use serde::Serialize;

use crate::timestamp::TimestampLabel;
use crate::tree::NodeId;

/// A single change to the rendered transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Mutation {
    /// A new node was attached under `parent` (top level when `None`), before `before`
    Insert { node: NodeId, parent: Option<NodeId>, before: Option<NodeId> },
    /// An attached node was moved
    Move { node: NodeId, parent: Option<NodeId>, before: Option<NodeId> },
    /// A node and its children were removed
    Remove { node: NodeId },
    SetTimestamp { node: NodeId, label: TimestampLabel },
    SetAvatar { node: NodeId, address: String },
    DisplaySettings { font_family: Option<String>, font_size: Option<String> },
}

/// The host view, as seen by the engine.
///
/// Mutations arrive in the order they were made. Deferred work (scrolling,
/// frame sizing) arrives only after every mutation of the current event.
pub trait ViewSink {
    fn apply(&mut self, mutation: &Mutation);

    fn scroll_to_bottom(&mut self);

    /// Rendered width of a frame attachment, if the view has laid it out
    fn frame_width(&self, _message: NodeId, _index: usize) -> Option<u32> {
        None
    }

    fn resize_frame(&mut self, _message: NodeId, _index: usize, _height: u32) {}
}

/// Sink that records everything it is told
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub mutations: Vec<Mutation>,
    pub scrolls: usize,
    /// Width reported for every frame attachment
    pub frame_width: Option<u32>,
    pub resized: Vec<(NodeId, usize, u32)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame_width(mut self, width: u32) -> Self {
        self.frame_width = Some(width);
        self
    }

    /// Take the recorded mutations, leaving the sink empty
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }
}

impl ViewSink for RecordingSink {
    fn apply(&mut self, mutation: &Mutation) {
        self.mutations.push(mutation.clone());
    }

    fn scroll_to_bottom(&mut self) {
        self.scrolls += 1;
    }

    fn frame_width(&self, _message: NodeId, _index: usize) -> Option<u32> {
        self.frame_width
    }

    fn resize_frame(&mut self, message: NodeId, index: usize, height: u32) {
        self.resized.push((message, index, height));
    }
}

impl<S: ViewSink + ?Sized> ViewSink for &mut S {
    fn apply(&mut self, mutation: &Mutation) {
        (**self).apply(mutation)
    }

    fn scroll_to_bottom(&mut self) {
        (**self).scroll_to_bottom()
    }

    fn frame_width(&self, message: NodeId, index: usize) -> Option<u32> {
        (**self).frame_width(message, index)
    }

    fn resize_frame(&mut self, message: NodeId, index: usize, height: u32) {
        (**self).resize_frame(message, index, height)
    }
}

/// Work that must wait until the view has laid out the current batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    ScrollToBottom,
    SizeFrame { message: NodeId, index: usize },
}

/// Actions run once the mutations of the current event are applied
#[derive(Debug, Clone, Default)]
pub struct PostTaskQueue {
    tasks: Vec<Deferred>,
}

impl PostTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task. A scroll replaces any scroll already queued, so it runs
    /// last and only once.
    pub fn push(&mut self, task: Deferred) {
        if task == Deferred::ScrollToBottom {
            self.tasks.retain(|t| *t != Deferred::ScrollToBottom);
        }
        self.tasks.push(task);
    }

    pub fn drain(&mut self) -> Vec<Deferred> {
        std::mem::take(&mut self.tasks)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Height of a 16:9 frame laid out at `width`
pub fn frame_height(width: u32) -> u32 {
    (u64::from(width) * 9 / 16) as u32
}
