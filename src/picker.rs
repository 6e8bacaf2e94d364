//! The element picker: panel, selection modes, highlighting and picking

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::clipboard::{Clipboard, CopyPath, copy_with_fallback};
use crate::config::{ACTIVE_CLASS, PickerConfig};
use crate::dom::{Document, NodeId, SharedDocument, lock};
use crate::errors::PickerError;
use crate::events::{EventKind, EventOutcome, ListenerId, ListenerTarget, PointerEvent};
use crate::notification::show_notification;
use crate::selector::generate_selector;
use crate::types::{BoundingBox, Mode, Point};

/// Snapshot of the controller state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickerState {
    pub is_active: bool,
    pub current_mode: Option<Mode>,
    pub highlighted: Option<NodeId>,
    pub is_dragging: bool,
    pub drag_offset: Point,
}

/// Lifecycle position of a picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Closed,
    Idle,
    Selecting(Mode),
}

/// A selector that was picked and copied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickRecord {
    pub selector: String,
    pub mode: Mode,
    pub target: NodeId,
    pub copy_path: CopyPath,
    pub copied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
enum PanelAction {
    Toggle(Mode),
    Close,
}

#[derive(Debug, Clone, Copy)]
struct Panel {
    root: NodeId,
    mode_buttons: [(Mode, NodeId); 3],
    close_button: NodeId,
}

impl Panel {
    fn buttons(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.mode_buttons
            .iter()
            .map(|(_, node)| *node)
            .chain(std::iter::once(self.close_button))
    }

    fn action_for(&self, button: NodeId) -> Option<PanelAction> {
        if button == self.close_button {
            return Some(PanelAction::Close);
        }
        self.mode_buttons
            .iter()
            .find(|(_, node)| *node == button)
            .map(|(mode, _)| PanelAction::Toggle(*mode))
    }
}

#[derive(Debug, Clone, Copy)]
struct Registration {
    target: ListenerTarget,
    kind: EventKind,
    id: ListenerId,
}

/// Whether `node` may be picked in `mode`
pub fn is_valid_target<D: Document + ?Sized>(doc: &D, node: NodeId, mode: Mode) -> bool {
    let Some(tag) = doc.tag_name(node) else {
        return false;
    };
    match mode {
        Mode::Image => tag == "img",
        Mode::Text => tag != "img" && !doc.text_content(node).trim().is_empty(),
        Mode::Link => doc.closest(node, "a").is_some(),
    }
}

/// Keep a panel edge inside `[0, viewport - size]`; a panel larger than
/// the viewport is pinned to 0
pub fn clamp_axis(value: f64, viewport: f64, size: f64) -> f64 {
    value.min(viewport - size).max(0.0)
}

/// Insert the panel markup under the content container and return its root
pub(crate) fn build_panel<D: Document + ?Sized>(doc: &mut D, config: &PickerConfig) -> NodeId {
    let root = doc.create_element("div");
    doc.add_class(root, &config.overlay_class());

    let title = doc.create_element("div");
    doc.add_class(title, &config.title_class());
    doc.set_text(title, &config.labels.title);
    doc.append_child(root, title);

    for mode in Mode::ALL {
        let button = doc.create_element("button");
        doc.set_attribute(button, "id", mode.button_id());
        doc.set_text(button, config.labels.for_mode(mode));
        doc.append_child(root, button);
    }

    let close = doc.create_element("button");
    doc.set_attribute(close, "id", "picker-close");
    doc.set_text(close, &config.labels.close);
    doc.append_child(root, close);

    let body = doc.body();
    doc.append_child(body, root);

    let viewport = doc.viewport();
    let layout = config.panel;
    doc.set_rect(
        root,
        BoundingBox {
            x: clamp_axis(
                f64::from(viewport.width) - layout.width - layout.margin,
                f64::from(viewport.width),
                layout.width,
            ),
            y: clamp_axis(
                f64::from(viewport.height) - layout.height - layout.margin,
                f64::from(viewport.height),
                layout.height,
            ),
            width: layout.width,
            height: layout.height,
        },
    );
    root
}

fn find_in_subtree<D: Document + ?Sized>(doc: &D, root: NodeId, id: &str) -> Option<NodeId> {
    doc.descendants(root)
        .into_iter()
        .find(|n| doc.attribute(*n, "id") == Some(id))
}

/// Resolve the panel buttons; a missing one means the markup is broken
fn locate_panel<D: Document + ?Sized>(doc: &D, root: NodeId) -> Result<Panel, PickerError> {
    let find = |id: &str| {
        find_in_subtree(doc, root, id).ok_or_else(|| PickerError::PanelMarkup(id.to_string()))
    };
    Ok(Panel {
        root,
        mode_buttons: [
            (Mode::Image, find(Mode::Image.button_id())?),
            (Mode::Text, find(Mode::Text.button_id())?),
            (Mode::Link, find(Mode::Link.button_id())?),
        ],
        close_button: find("picker-close")?,
    })
}

/// Interactive picker bound to one document.
///
/// Constructed closed; [`Picker::init`] mounts the panel and registers
/// listeners, [`Picker::close`] (also run on drop) undoes both.
pub struct Picker<D: Document> {
    doc: SharedDocument<D>,
    clipboard: Arc<dyn Clipboard>,
    config: Arc<PickerConfig>,
    runtime: Option<Handle>,
    panel: Option<Panel>,
    mode: Option<Mode>,
    highlighted: Option<NodeId>,
    dragging: bool,
    drag_offset: Point,
    listeners: Vec<Registration>,
    drag_listeners: Vec<Registration>,
}

impl<D: Document> Picker<D> {
    pub fn new(
        doc: SharedDocument<D>,
        clipboard: Arc<dyn Clipboard>,
        config: Arc<PickerConfig>,
    ) -> Self {
        Self {
            doc,
            clipboard,
            config,
            runtime: None,
            panel: None,
            mode: None,
            highlighted: None,
            dragging: false,
            drag_offset: Point::default(),
            listeners: Vec::new(),
            drag_listeners: Vec::new(),
        }
    }

    /// Mount the panel and start listening
    pub fn init(&mut self) -> Result<(), PickerError> {
        if self.panel.is_some() {
            return Err(PickerError::AlreadyInitialized);
        }
        let runtime = Handle::try_current().map_err(|_| PickerError::NoRuntime)?;

        let mut doc = lock(&self.doc);
        let root = build_panel(&mut *doc, &self.config);
        let panel = match locate_panel(&*doc, root) {
            Ok(panel) => panel,
            Err(e) => {
                doc.remove(root);
                return Err(e);
            }
        };

        let mut listeners = Vec::new();
        let mut listen = |doc: &mut D, target: ListenerTarget, kind: EventKind| {
            let id = doc.add_event_listener(target, kind);
            listeners.push(Registration { target, kind, id });
        };
        for kind in [EventKind::MouseOver, EventKind::MouseOut, EventKind::Click] {
            listen(&mut *doc, ListenerTarget::Document, kind);
        }
        listen(&mut *doc, ListenerTarget::Node(root), EventKind::MouseDown);
        for button in panel.buttons() {
            listen(&mut *doc, ListenerTarget::Node(button), EventKind::Click);
        }
        drop(doc);

        info!("Picker initialized with {} listeners", listeners.len());
        self.runtime = Some(runtime);
        self.panel = Some(panel);
        self.listeners = listeners;
        Ok(())
    }

    /// Enter `mode`, or go back to idle if `mode` is already selected
    pub fn toggle_mode(&mut self, mode: Mode) {
        if self.panel.is_none() {
            return;
        }
        self.remove_highlight();
        if self.mode == Some(mode) {
            debug!("Leaving {} mode", mode);
            self.mode = None;
        } else {
            debug!("Entering {} mode", mode);
            self.mode = Some(mode);
        }
        self.refresh_buttons();
    }

    /// Remove the panel, the highlight and every listener. Safe to repeat.
    pub fn close(&mut self) {
        self.mode = None;
        self.dragging = false;
        self.remove_highlight();

        let Some(panel) = self.panel.take() else {
            return;
        };
        let mut doc = lock(&self.doc);
        doc.remove(panel.root);
        let registrations = self.listeners.drain(..).chain(self.drag_listeners.drain(..));
        let removed = registrations
            .filter(|reg| doc.remove_event_listener(reg.id))
            .count();
        info!("Picker closed, {} listeners removed", removed);
    }

    pub fn phase(&self) -> Phase {
        match (self.panel.is_some(), self.mode) {
            (false, _) => Phase::Closed,
            (true, None) => Phase::Idle,
            (true, Some(mode)) => Phase::Selecting(mode),
        }
    }

    pub fn state(&self) -> PickerState {
        PickerState {
            is_active: self.mode.is_some(),
            current_mode: self.mode,
            highlighted: self.highlighted,
            is_dragging: self.dragging,
            drag_offset: self.drag_offset,
        }
    }

    pub fn is_active(&self) -> bool {
        self.mode.is_some()
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn highlighted(&self) -> Option<NodeId> {
        self.highlighted
    }

    pub fn panel(&self) -> Option<NodeId> {
        self.panel.map(|p| p.root)
    }

    pub fn mode_button(&self, mode: Mode) -> Option<NodeId> {
        let panel = self.panel?;
        panel
            .mode_buttons
            .iter()
            .find(|(m, _)| *m == mode)
            .map(|(_, node)| *node)
    }

    pub fn close_button(&self) -> Option<NodeId> {
        self.panel.map(|p| p.close_button)
    }

    /// Validity of `node` under the current mode; nothing is valid when idle
    pub fn is_valid_target(&self, node: NodeId) -> bool {
        match self.mode {
            Some(mode) => is_valid_target(&*lock(&self.doc), node, mode),
            None => false,
        }
    }

    /// Run the listeners registered for this event
    pub fn handle_event(&mut self, event: &PointerEvent) -> EventOutcome {
        let mut outcome = EventOutcome::default();
        let Some(panel) = self.panel else {
            return outcome;
        };

        match event.kind {
            EventKind::MouseDown => {
                if self.listens(EventKind::MouseDown, ListenerTarget::Node(panel.root)) {
                    self.start_drag(&panel, event);
                }
            }
            EventKind::MouseMove => {
                if self.listens(EventKind::MouseMove, ListenerTarget::Document) {
                    self.drag_to(&panel, event.client);
                }
            }
            EventKind::MouseUp => {
                if self.listens(EventKind::MouseUp, ListenerTarget::Document) {
                    self.end_drag();
                }
            }
            EventKind::MouseOver => {
                if self.listens(EventKind::MouseOver, ListenerTarget::Document) {
                    self.on_mouse_over(&panel, event.target);
                }
            }
            EventKind::MouseOut => {
                if self.listens(EventKind::MouseOut, ListenerTarget::Document) {
                    self.on_mouse_out(&panel, event.target);
                }
            }
            EventKind::Click => {
                // button listeners run before the document-level one
                match self.panel_action(&panel, event.target) {
                    Some(PanelAction::Toggle(mode)) => self.toggle_mode(mode),
                    Some(PanelAction::Close) => {
                        self.close();
                        outcome.closed = true;
                        return outcome;
                    }
                    None => {}
                }
                if self.listens(EventKind::Click, ListenerTarget::Document) {
                    self.on_click(&panel, event, &mut outcome);
                }
            }
        }
        outcome
    }

    fn listens(&self, kind: EventKind, target: ListenerTarget) -> bool {
        self.listeners
            .iter()
            .chain(&self.drag_listeners)
            .any(|reg| reg.kind == kind && reg.target == target)
    }

    fn panel_action(&self, panel: &Panel, target: NodeId) -> Option<PanelAction> {
        let button = {
            let doc = lock(&self.doc);
            doc.closest(target, "button")
                .filter(|b| doc.contains(panel.root, *b))?
        };
        if !self.listens(EventKind::Click, ListenerTarget::Node(button)) {
            return None;
        }
        panel.action_for(button)
    }

    fn refresh_buttons(&self) {
        let Some(panel) = self.panel else {
            return;
        };
        let active = self.mode.and_then(|m| self.mode_button(m));
        let mut doc = lock(&self.doc);
        for button in panel.buttons() {
            doc.remove_class(button, ACTIVE_CLASS);
        }
        if let Some(button) = active {
            doc.add_class(button, ACTIVE_CLASS);
        }
    }

    fn highlight(&mut self, node: NodeId) {
        self.remove_highlight();
        lock(&self.doc).add_class(node, &self.config.highlight_class());
        self.highlighted = Some(node);
    }

    fn remove_highlight(&mut self) {
        if let Some(node) = self.highlighted.take() {
            lock(&self.doc).remove_class(node, &self.config.highlight_class());
        }
    }

    fn on_mouse_over(&mut self, panel: &Panel, target: NodeId) {
        let Some(mode) = self.mode else {
            return;
        };
        let valid = {
            let doc = lock(&self.doc);
            !doc.contains(panel.root, target) && is_valid_target(&*doc, target, mode)
        };
        if valid {
            self.highlight(target);
        }
    }

    fn on_mouse_out(&mut self, panel: &Panel, target: NodeId) {
        if self.mode.is_none() || lock(&self.doc).contains(panel.root, target) {
            return;
        }
        self.remove_highlight();
    }

    fn on_click(&mut self, panel: &Panel, event: &PointerEvent, outcome: &mut EventOutcome) {
        let Some(mode) = self.mode else {
            return;
        };
        let target = event.target;
        let (inside_panel, in_anchor, valid) = {
            let doc = lock(&self.doc);
            (
                doc.contains(panel.root, target),
                doc.closest(target, "a").is_some(),
                is_valid_target(&*doc, target, mode),
            )
        };

        // never follow links while picking, whatever the mode
        if in_anchor {
            outcome.suppress();
        }
        if inside_panel {
            return;
        }
        if !valid {
            debug!("Click on {:?} is not a valid {} target", target, mode);
            return;
        }
        outcome.suppress();

        let selector = generate_selector(&*lock(&self.doc), target, &self.config.selector_options());
        let copy_path = copy_with_fallback(self.clipboard.as_ref(), &self.doc, &selector);
        if let Some(runtime) = &self.runtime {
            show_notification(
                &self.doc,
                runtime,
                &self.config.labels.copied,
                &self.config.notification_class(),
                self.config.notification_duration(),
            );
        }

        self.remove_highlight();
        self.mode = None;
        self.refresh_buttons();

        info!("Picked {} target: {}", mode, selector);
        outcome.pick = Some(PickRecord {
            selector,
            mode,
            target,
            copy_path,
            copied_at: Utc::now(),
        });
    }

    fn start_drag(&mut self, panel: &Panel, event: &PointerEvent) {
        let mut doc = lock(&self.doc);
        if !doc.contains(panel.root, event.target)
            || doc.closest(event.target, "button").is_some_and(|b| doc.contains(panel.root, b))
        {
            return;
        }
        let rect = doc.bounding_rect(panel.root);
        self.drag_offset = Point::new(event.client.x - rect.x, event.client.y - rect.y);
        if self.dragging {
            return;
        }
        self.dragging = true;
        for kind in [EventKind::MouseMove, EventKind::MouseUp] {
            let id = doc.add_event_listener(ListenerTarget::Document, kind);
            self.drag_listeners.push(Registration {
                target: ListenerTarget::Document,
                kind,
                id,
            });
        }
        debug!("Panel drag started at {:?}", event.client);
    }

    fn drag_to(&mut self, panel: &Panel, client: Point) {
        if !self.dragging {
            return;
        }
        let mut doc = lock(&self.doc);
        let viewport = doc.viewport();
        let rect = doc.bounding_rect(panel.root);
        let x = clamp_axis(
            client.x - self.drag_offset.x,
            f64::from(viewport.width),
            rect.width,
        );
        let y = clamp_axis(
            client.y - self.drag_offset.y,
            f64::from(viewport.height),
            rect.height,
        );
        doc.set_rect(panel.root, BoundingBox { x, y, ..rect });
    }

    fn end_drag(&mut self) {
        self.dragging = false;
        let mut doc = lock(&self.doc);
        for reg in self.drag_listeners.drain(..) {
            doc.remove_event_listener(reg.id);
        }
        debug!("Panel drag ended");
    }
}

impl<D: Document> Drop for Picker<D> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "picker_test.rs"]
mod picker_test;
