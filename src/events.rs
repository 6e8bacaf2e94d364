//! Pointer events and listener bookkeeping types

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;
use crate::picker::PickRecord;
use crate::types::Point;

/// Kinds of pointer events the picker listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    MouseDown,
    MouseMove,
    MouseUp,
    MouseOver,
    MouseOut,
    Click,
}

/// Where a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerTarget {
    Document,
    Node(NodeId),
}

/// Handle returned by listener registration, needed to deregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) usize);

/// A pointer event dispatched at the innermost element under the pointer
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub kind: EventKind,
    pub target: NodeId,
    pub client: Point,
}

impl PointerEvent {
    pub fn new(kind: EventKind, target: NodeId, client: Point) -> Self {
        Self {
            kind,
            target,
            client,
        }
    }

    /// Event without meaningful coordinates (hover, synthetic clicks)
    pub fn at(kind: EventKind, target: NodeId) -> Self {
        Self::new(kind, target, Point::default())
    }
}

/// What the listeners did with an event
#[derive(Debug, Default)]
pub struct EventOutcome {
    /// The default action (e.g. following a link) must not run
    pub default_prevented: bool,
    /// Listeners further along the propagation path must not run
    pub propagation_stopped: bool,
    /// Selector copied as a result of this event
    pub pick: Option<PickRecord>,
    /// The picker closed itself while handling this event
    pub closed: bool,
}

impl EventOutcome {
    pub(crate) fn suppress(&mut self) {
        self.default_prevented = true;
        self.propagation_stopped = true;
    }
}
