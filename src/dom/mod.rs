//! Abstract element tree the picker operates on

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::events::{EventKind, ListenerId, ListenerTarget};
use crate::types::{BoundingBox, ViewportSize};

pub mod memory;
pub mod query;

pub use memory::{DomSnapshot, MemoryDocument, NodeSnapshot};
pub use query::{Selector, parse_selector, query_selector_all};

/// Non-owning handle to an element in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

/// Document shared between the picker, its host and detached timer tasks
pub type SharedDocument<D> = Arc<Mutex<D>>;

pub fn share<D: Document>(doc: D) -> SharedDocument<D> {
    Arc::new(Mutex::new(doc))
}

/// Lock a shared document. A panic in another holder does not leave the
/// tree in a half-written state worth refusing, so poisoning is ignored.
pub fn lock<D>(doc: &SharedDocument<D>) -> MutexGuard<'_, D> {
    doc.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The element interface: tag, classes, tree links and the handful of
/// mutations the picker needs (panel, highlight marker, toasts, copy buffer).
pub trait Document: Send + 'static {
    /// Tree root (the `html` element)
    fn root(&self) -> NodeId;
    /// Top-level content container (the `body` element)
    fn body(&self) -> NodeId;

    /// Lowercase tag name, `None` for a dangling handle
    fn tag_name(&self, node: NodeId) -> Option<&str>;
    fn class_list(&self, node: NodeId) -> &[String];
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> &[NodeId];
    /// Own text followed by every descendant's, in document order
    fn text_content(&self, node: NodeId) -> String;

    fn create_element(&mut self, tag: &str) -> NodeId;
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    /// Detach the node (and its subtree) from its parent
    fn remove(&mut self, node: NodeId);
    fn set_text(&mut self, node: NodeId, text: &str);
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);
    fn get_element_by_id(&self, id: &str) -> Option<NodeId>;

    fn viewport(&self) -> ViewportSize;
    fn bounding_rect(&self, node: NodeId) -> BoundingBox;
    fn set_rect(&mut self, node: NodeId, rect: BoundingBox);

    /// Select the `value` of a connected text buffer node and copy it
    /// synchronously. Returns false when the copy command is refused.
    fn exec_copy(&mut self, node: NodeId) -> bool;

    fn add_event_listener(&mut self, target: ListenerTarget, kind: EventKind) -> ListenerId;
    fn remove_event_listener(&mut self, id: ListenerId) -> bool;
    fn listener_count(&self) -> usize;

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.class_list(node).iter().any(|c| c == class)
    }

    /// Inclusive: a node contains itself
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Nearest inclusive ancestor with the given tag
    fn closest(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.tag_name(n) == Some(tag) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// Attached to the tree under the root
    fn is_connected(&self, node: NodeId) -> bool {
        self.tag_name(node).is_some() && self.contains(self.root(), node)
    }

    /// All elements under `node` (exclusive) in document order
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Elements carrying `class`, in document order
    fn elements_with_class(&self, class: &str) -> Vec<NodeId> {
        let root = self.root();
        std::iter::once(root)
            .chain(self.descendants(root))
            .filter(|n| self.has_class(*n, class))
            .collect()
    }
}
