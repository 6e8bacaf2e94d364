//! Arena-backed in-memory document, loadable from JSON snapshots

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Document, NodeId};
use crate::errors::PickerError;
use crate::events::{EventKind, ListenerId, ListenerTarget};
use crate::types::{BoundingBox, ViewportSize};

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: BoundingBox,
}

/// Serialized element tree, as produced by a page capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<ViewportSize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub head: Vec<NodeSnapshot>,
    pub body: NodeSnapshot,
}

/// One element of a [`DomSnapshot`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

/// In-memory document with `html > (head, body)` skeleton
#[derive(Debug)]
pub struct MemoryDocument {
    nodes: Vec<NodeData>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    viewport: ViewportSize,
    listeners: Vec<Option<(ListenerTarget, EventKind)>>,
    copy_log: Vec<String>,
    copy_enabled: bool,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new(ViewportSize::default())
    }
}

impl MemoryDocument {
    pub fn new(viewport: ViewportSize) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            viewport,
            listeners: Vec::new(),
            copy_log: Vec::new(),
            copy_enabled: true,
        };
        doc.root = doc.create_element("html");
        doc.head = doc.create_element("head");
        doc.body = doc.create_element("body");
        doc.append_child(doc.root, doc.head);
        doc.append_child(doc.root, doc.body);
        doc.nodes[doc.body.0].rect = BoundingBox {
            x: 0.0,
            y: 0.0,
            width: f64::from(viewport.width),
            height: f64::from(viewport.height),
        };
        doc
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    /// Create an element with classes and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str, classes: &[&str]) -> NodeId {
        let node = self.create_element(tag);
        for class in classes {
            self.add_class(node, class);
        }
        self.append_child(parent, node);
        node
    }

    pub fn from_snapshot(snapshot: &DomSnapshot) -> Result<Self, PickerError> {
        if !snapshot.body.tag.eq_ignore_ascii_case("body") {
            return Err(PickerError::Snapshot(format!(
                "top-level node must be <body>, found <{}>",
                snapshot.body.tag
            )));
        }

        let mut doc = Self::new(snapshot.viewport.unwrap_or_default());
        let (head, body) = (doc.head, doc.body);
        for node in &snapshot.head {
            doc.build_subtree(head, node)?;
        }
        doc.apply_snapshot(body, &snapshot.body);
        for child in &snapshot.body.children {
            doc.build_subtree(body, child)?;
        }
        debug!(
            "Loaded snapshot with {} elements",
            doc.descendants(doc.root).len() + 1
        );
        Ok(doc)
    }

    pub fn from_json(json: &str) -> Result<Self, PickerError> {
        let snapshot: DomSnapshot =
            serde_json::from_str(json).map_err(|e| PickerError::Snapshot(e.to_string()))?;
        Self::from_snapshot(&snapshot)
    }

    pub fn load(path: &Path) -> Result<Self, PickerError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Capture the connected tree back into a snapshot
    pub fn to_snapshot(&self) -> DomSnapshot {
        DomSnapshot {
            viewport: Some(self.viewport),
            head: self.nodes[self.head.0]
                .children
                .iter()
                .map(|c| self.snapshot_node(*c))
                .collect(),
            body: self.snapshot_node(self.body),
        }
    }

    /// Texts copied through [`Document::exec_copy`], oldest first
    pub fn copy_log(&self) -> &[String] {
        &self.copy_log
    }

    /// Make `exec_copy` refuse, as browsers do outside a user gesture
    pub fn set_copy_enabled(&mut self, enabled: bool) {
        self.copy_enabled = enabled;
    }

    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    /// Listeners currently registered on `target`
    pub fn listeners_on(&self, target: ListenerTarget) -> Vec<EventKind> {
        self.listeners
            .iter()
            .flatten()
            .filter(|(t, _)| *t == target)
            .map(|(_, kind)| *kind)
            .collect()
    }

    fn build_subtree(&mut self, parent: NodeId, snapshot: &NodeSnapshot) -> Result<(), PickerError> {
        if snapshot.tag.trim().is_empty() {
            return Err(PickerError::Snapshot("element with empty tag".to_string()));
        }
        let node = self.create_element(&snapshot.tag);
        self.apply_snapshot(node, snapshot);
        self.append_child(parent, node);
        for child in &snapshot.children {
            self.build_subtree(node, child)?;
        }
        Ok(())
    }

    fn apply_snapshot(&mut self, node: NodeId, snapshot: &NodeSnapshot) {
        for class in &snapshot.classes {
            self.add_class(node, class);
        }
        for (name, value) in &snapshot.attrs {
            self.set_attribute(node, name, value);
        }
        if let Some(id) = &snapshot.id {
            self.set_attribute(node, "id", id);
        }
        if let Some(text) = &snapshot.text {
            self.set_text(node, text);
        }
        if let Some(rect) = snapshot.rect {
            self.set_rect(node, rect);
        }
    }

    fn snapshot_node(&self, node: NodeId) -> NodeSnapshot {
        let data = &self.nodes[node.0];
        let mut attrs = data.attrs.clone();
        let id = attrs.remove("id");
        NodeSnapshot {
            tag: data.tag.clone(),
            classes: data.classes.clone(),
            id,
            attrs,
            text: (!data.text.is_empty()).then(|| data.text.clone()),
            rect: (data.rect != BoundingBox::default()).then_some(data.rect),
            children: data.children.iter().map(|c| self.snapshot_node(*c)).collect(),
        }
    }

    fn node(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0)
    }

    fn node_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0)
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        if let Some(data) = self.node(node) {
            out.push_str(&data.text);
            for child in &data.children {
                self.collect_text(*child, out);
            }
        }
    }
}

impl Document for MemoryDocument {
    fn root(&self) -> NodeId {
        self.root
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.tag.as_str())
    }

    fn class_list(&self, node: NodeId) -> &[String] {
        self.node(node).map(|n| n.classes.as_slice()).unwrap_or(&[])
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)
            .and_then(|n| n.attrs.get(name))
            .map(String::as_str)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(NodeData {
            tag: tag.trim().to_ascii_lowercase(),
            ..NodeData::default()
        });
        NodeId(self.nodes.len() - 1)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(parent).is_none() || self.node(child).is_none() || self.contains(child, parent)
        {
            return;
        }
        self.remove(child);
        if let Some(data) = self.node_mut(child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.node_mut(parent) {
            data.children.push(child);
        }
    }

    fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(data) = self.node_mut(parent) {
            data.children.retain(|c| *c != node);
        }
        if let Some(data) = self.node_mut(node) {
            data.parent = None;
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(data) = self.node_mut(node) {
            data.text = text.to_string();
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if name == "class" {
            for class in value.split_whitespace() {
                self.add_class(node, class);
            }
            return;
        }
        if let Some(data) = self.node_mut(node) {
            data.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        let class = class.trim();
        if class.is_empty() {
            return;
        }
        if let Some(data) = self.node_mut(node)
            && !data.classes.iter().any(|c| c == class)
        {
            data.classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(data) = self.node_mut(node) {
            data.classes.retain(|c| c != class);
        }
    }

    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|n| self.attribute(*n, "id") == Some(id))
    }

    fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    fn bounding_rect(&self, node: NodeId) -> BoundingBox {
        self.node(node).map(|n| n.rect).unwrap_or_default()
    }

    fn set_rect(&mut self, node: NodeId, rect: BoundingBox) {
        if let Some(data) = self.node_mut(node) {
            data.rect = rect;
        }
    }

    fn exec_copy(&mut self, node: NodeId) -> bool {
        if !self.copy_enabled || !self.is_connected(node) {
            return false;
        }
        let value = self.attribute(node, "value").unwrap_or_default().to_string();
        self.copy_log.push(value);
        true
    }

    fn add_event_listener(&mut self, target: ListenerTarget, kind: EventKind) -> ListenerId {
        let slot = self.listeners.iter().position(Option::is_none);
        match slot {
            Some(index) => {
                self.listeners[index] = Some((target, kind));
                ListenerId(index)
            }
            None => {
                self.listeners.push(Some((target, kind)));
                ListenerId(self.listeners.len() - 1)
            }
        }
    }

    fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners
            .get_mut(id.0)
            .and_then(Option::take)
            .is_some()
    }

    fn listener_count(&self) -> usize {
        self.listeners.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_skeleton() {
        let doc = MemoryDocument::default();
        assert_eq!(doc.tag_name(doc.root()), Some("html"));
        assert_eq!(doc.tag_name(doc.body()), Some("body"));
        assert_eq!(doc.parent(doc.body()), Some(doc.root()));
        assert_eq!(doc.children(doc.root()), &[doc.head(), doc.body()]);
    }

    #[test]
    fn test_text_content_includes_descendants() {
        let mut doc = MemoryDocument::default();
        let p = doc.append_element(doc.body(), "p", &[]);
        doc.set_text(p, "Hello ");
        let b = doc.append_element(p, "b", &[]);
        doc.set_text(b, "world");
        assert_eq!(doc.text_content(p), "Hello world");
        assert_eq!(doc.text_content(b), "world");
    }

    #[test]
    fn test_remove_detaches_subtree() {
        let mut doc = MemoryDocument::default();
        let div = doc.append_element(doc.body(), "div", &[]);
        let span = doc.append_element(div, "span", &[]);
        assert!(doc.is_connected(span));

        doc.remove(div);
        assert!(!doc.is_connected(div));
        assert!(!doc.is_connected(span));
        assert!(doc.children(doc.body()).is_empty());
        // removing twice is harmless
        doc.remove(div);
    }

    #[test]
    fn test_closest_and_contains() {
        let mut doc = MemoryDocument::default();
        let a = doc.append_element(doc.body(), "a", &[]);
        let span = doc.append_element(a, "span", &[]);
        assert_eq!(doc.closest(span, "a"), Some(a));
        assert_eq!(doc.closest(a, "a"), Some(a));
        assert_eq!(doc.closest(doc.body(), "a"), None);
        assert!(doc.contains(a, span));
        assert!(doc.contains(a, a));
        assert!(!doc.contains(span, a));
    }

    #[test]
    fn test_classes_are_unique_and_ordered() {
        let mut doc = MemoryDocument::default();
        let div = doc.append_element(doc.body(), "DIV", &["b", "a", "b"]);
        assert_eq!(doc.tag_name(div), Some("div"));
        assert_eq!(doc.class_list(div), &["b".to_string(), "a".to_string()]);
        doc.set_attribute(div, "class", "c  d");
        assert_eq!(doc.class_list(div).len(), 4);
        doc.remove_class(div, "a");
        assert!(!doc.has_class(div, "a"));
    }

    #[test]
    fn test_listener_slots_are_reused() {
        let mut doc = MemoryDocument::default();
        let a = doc.add_event_listener(ListenerTarget::Document, EventKind::Click);
        let b = doc.add_event_listener(ListenerTarget::Document, EventKind::MouseOver);
        assert_eq!(doc.listener_count(), 2);
        assert!(doc.remove_event_listener(a));
        assert!(!doc.remove_event_listener(a));
        let c = doc.add_event_listener(ListenerTarget::Document, EventKind::MouseOut);
        assert_eq!(c, a);
        assert_ne!(b, c);
        assert_eq!(doc.listener_count(), 2);
    }

    #[test]
    fn test_exec_copy_requires_connected_node() {
        let mut doc = MemoryDocument::default();
        let textarea = doc.create_element("textarea");
        doc.set_attribute(textarea, "value", "div.item");
        assert!(!doc.exec_copy(textarea));

        doc.append_child(doc.body(), textarea);
        assert!(doc.exec_copy(textarea));
        assert_eq!(doc.copy_log(), &["div.item".to_string()]);

        doc.set_copy_enabled(false);
        assert!(!doc.exec_copy(textarea));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let json = r#"{
            "viewport": {"width": 800, "height": 600},
            "body": {
                "tag": "body",
                "children": [
                    {"tag": "div", "classes": ["item"], "id": "first",
                     "children": [{"tag": "a", "attrs": {"href": "/x"}, "text": "Click"}]}
                ]
            }
        }"#;
        let doc = MemoryDocument::from_json(json).unwrap();
        assert_eq!(doc.viewport(), ViewportSize { width: 800, height: 600 });
        let div = doc.get_element_by_id("first").unwrap();
        assert_eq!(doc.class_list(div), &["item".to_string()]);
        let a = doc.children(div)[0];
        assert_eq!(doc.attribute(a, "href"), Some("/x"));

        let snapshot = doc.to_snapshot();
        assert_eq!(snapshot.body.children[0].id.as_deref(), Some("first"));
        assert_eq!(snapshot.body.children[0].children[0].text.as_deref(), Some("Click"));
    }

    #[test]
    fn test_snapshot_rejects_non_body_root() {
        let err = MemoryDocument::from_json(r#"{"body": {"tag": "div"}}"#).unwrap_err();
        assert!(matches!(err, PickerError::Snapshot(_)));
        let err = MemoryDocument::from_json("not json").unwrap_err();
        assert!(matches!(err, PickerError::Snapshot(_)));
    }
}
