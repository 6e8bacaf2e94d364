//! Headless page: an in-memory document driven like a browser tab

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::clipboard::Clipboard;
use crate::config::PickerConfig;
use crate::dom::{Document, MemoryDocument, NodeId, SharedDocument, lock, query};
use crate::errors::PickerError;
use crate::events::{EventKind, EventOutcome, PointerEvent};
use crate::host::{HostMessage, HostResponse, PickerHost};
use crate::picker::PickerState;
use crate::types::{BoundingBox, Point};

pub struct Page {
    host: PickerHost<MemoryDocument>,
    base_url: Option<Url>,
    navigations: Vec<String>,
    hovered: Option<NodeId>,
}

impl Page {
    pub fn new(doc: MemoryDocument, clipboard: Arc<dyn Clipboard>, config: PickerConfig) -> Self {
        Self {
            host: PickerHost::new(crate::dom::share(doc), clipboard, Arc::new(config)),
            base_url: None,
            navigations: Vec::new(),
            hovered: None,
        }
    }

    /// Resolve relative hrefs against `base` when recording navigations
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base_url = Some(base);
        self
    }

    pub fn document(&self) -> &SharedDocument<MemoryDocument> {
        self.host.document()
    }

    pub fn host(&self) -> &PickerHost<MemoryDocument> {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut PickerHost<MemoryDocument> {
        &mut self.host
    }

    pub fn send(&mut self, message: &HostMessage) -> Result<HostResponse, PickerError> {
        self.host.handle_message(message)
    }

    /// First element matching a CSS selector
    pub fn query(&self, selector: &str) -> Result<NodeId, PickerError> {
        query::query_selector(&*lock(self.document()), selector)
    }

    pub fn picker_state(&self) -> Option<PickerState> {
        self.host.picker().map(|p| p.state())
    }

    pub fn panel_rect(&self) -> Option<BoundingBox> {
        let panel = self.host.picker()?.panel()?;
        Some(lock(self.document()).bounding_rect(panel))
    }

    /// URLs the page would have followed
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    /// Toasts currently on the page
    pub fn notification_count(&self) -> usize {
        let class = self.host.config().notification_class();
        lock(self.document()).elements_with_class(&class).len()
    }

    /// Move the pointer onto `node`: `mouseout` for the previous element,
    /// then `mouseover` for the new one
    pub fn hover(&mut self, node: NodeId) {
        if self.hovered == Some(node) {
            return;
        }
        if let Some(previous) = self.hovered.take() {
            self.host
                .dispatch(&PointerEvent::at(EventKind::MouseOut, previous));
        }
        self.host.dispatch(&PointerEvent::at(EventKind::MouseOver, node));
        self.hovered = Some(node);
    }

    /// Press and release on `node`, then run the default action of the
    /// resulting click unless a listener prevented it
    pub fn click(&mut self, node: NodeId) -> EventOutcome {
        let at = self.center_of(node);
        self.host
            .dispatch(&PointerEvent::new(EventKind::MouseDown, node, at));
        self.host
            .dispatch(&PointerEvent::new(EventKind::MouseUp, node, at));
        let outcome = self
            .host
            .dispatch(&PointerEvent::new(EventKind::Click, node, at));

        if !outcome.default_prevented {
            self.follow_link(node);
        }
        outcome
    }

    /// Press on `node` at `from`, move to `to`, release
    pub fn drag(&mut self, node: NodeId, from: Point, to: Point) {
        self.host
            .dispatch(&PointerEvent::new(EventKind::MouseDown, node, from));
        self.host
            .dispatch(&PointerEvent::new(EventKind::MouseMove, node, to));
        self.host
            .dispatch(&PointerEvent::new(EventKind::MouseUp, node, to));
    }

    fn center_of(&self, node: NodeId) -> Point {
        let rect = lock(self.document()).bounding_rect(node);
        Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
    }

    fn follow_link(&mut self, node: NodeId) {
        let href = {
            let doc = lock(self.document());
            doc.closest(node, "a")
                .and_then(|a| doc.attribute(a, "href"))
                .map(str::to_string)
        };
        let Some(href) = href else {
            return;
        };
        let target = match &self.base_url {
            Some(base) => match base.join(&href) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    debug!("Could not resolve {} against {}: {}", href, base, e);
                    href
                }
            },
            None => href,
        };
        info!("Navigating to {}", target);
        self.navigations.push(target);
    }
}
