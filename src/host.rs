//! Activation entry point: owns the lifetime of at most one picker

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clipboard::Clipboard;
use crate::config::PickerConfig;
use crate::dom::{Document, SharedDocument};
use crate::errors::PickerError;
use crate::events::{EventOutcome, PointerEvent};
use crate::picker::{Phase, Picker};

/// Messages sent by the extension's messaging layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum HostMessage {
    ShowPicker,
    ClosePicker,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostResponse {
    Activated,
    /// A picker is already live; nothing changed
    AlreadyActive,
    Closed,
    NotActive,
    Ignored,
}

pub struct PickerHost<D: Document> {
    doc: SharedDocument<D>,
    clipboard: Arc<dyn Clipboard>,
    config: Arc<PickerConfig>,
    active: Option<Picker<D>>,
}

impl<D: Document> PickerHost<D> {
    pub fn new(
        doc: SharedDocument<D>,
        clipboard: Arc<dyn Clipboard>,
        config: Arc<PickerConfig>,
    ) -> Self {
        Self {
            doc,
            clipboard,
            config,
            active: None,
        }
    }

    pub fn document(&self) -> &SharedDocument<D> {
        &self.doc
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn picker(&self) -> Option<&Picker<D>> {
        self.active.as_ref()
    }

    pub fn picker_mut(&mut self) -> Option<&mut Picker<D>> {
        self.active.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|p| p.phase() != Phase::Closed)
    }

    pub fn handle_message(&mut self, message: &HostMessage) -> Result<HostResponse, PickerError> {
        match message {
            HostMessage::ShowPicker => {
                if self.is_active() {
                    warn!("Picker already active, ignoring showPicker");
                    return Ok(HostResponse::AlreadyActive);
                }
                let mut picker = Picker::new(
                    Arc::clone(&self.doc),
                    Arc::clone(&self.clipboard),
                    Arc::clone(&self.config),
                );
                picker.init()?;
                self.active = Some(picker);
                info!("Picker activated");
                Ok(HostResponse::Activated)
            }
            HostMessage::ClosePicker => match self.active.take() {
                Some(mut picker) => {
                    picker.close();
                    Ok(HostResponse::Closed)
                }
                None => Ok(HostResponse::NotActive),
            },
            HostMessage::Unknown => {
                debug!("Ignoring unknown host message");
                Ok(HostResponse::Ignored)
            }
        }
    }

    /// Parse and handle a raw JSON message such as `{"action":"showPicker"}`
    pub fn handle_json(&mut self, json: &str) -> Result<HostResponse, PickerError> {
        let message: HostMessage = serde_json::from_str(json)
            .map_err(|e| anyhow::Error::new(e).context("Invalid host message"))?;
        self.handle_message(&message)
    }

    /// Forward an event to the live picker; drop the picker once it closes
    pub fn dispatch(&mut self, event: &PointerEvent) -> EventOutcome {
        let Some(picker) = self.active.as_mut() else {
            return EventOutcome::default();
        };
        let outcome = picker.handle_event(event);
        if outcome.closed {
            self.active = None;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::dom::{MemoryDocument, lock, share};
    use crate::events::EventKind;

    fn host() -> PickerHost<MemoryDocument> {
        PickerHost::new(
            share(MemoryDocument::default()),
            Arc::new(MemoryClipboard::new()),
            Arc::new(PickerConfig::default()),
        )
    }

    #[test]
    fn test_message_parsing() {
        let msg: HostMessage = serde_json::from_str(r#"{"action":"showPicker"}"#).unwrap();
        assert_eq!(msg, HostMessage::ShowPicker);
        let msg: HostMessage = serde_json::from_str(r#"{"action":"closePicker"}"#).unwrap();
        assert_eq!(msg, HostMessage::ClosePicker);
        let msg: HostMessage = serde_json::from_str(r#"{"action":"somethingElse"}"#).unwrap();
        assert_eq!(msg, HostMessage::Unknown);
        assert!(serde_json::from_str::<HostMessage>(r#"{"type":"showPicker"}"#).is_err());
    }

    #[tokio::test]
    async fn test_second_activation_is_rejected() {
        let mut host = host();
        assert_eq!(
            host.handle_json(r#"{"action":"showPicker"}"#).unwrap(),
            HostResponse::Activated
        );
        assert_eq!(
            host.handle_message(&HostMessage::ShowPicker).unwrap(),
            HostResponse::AlreadyActive
        );

        let doc = lock(host.document());
        let overlays = doc.elements_with_class("element-picker-overlay");
        assert_eq!(overlays.len(), 1);
    }

    #[tokio::test]
    async fn test_close_then_reactivate() {
        let mut host = host();
        host.handle_message(&HostMessage::ShowPicker).unwrap();
        assert_eq!(
            host.handle_message(&HostMessage::ClosePicker).unwrap(),
            HostResponse::Closed
        );
        assert_eq!(
            host.handle_message(&HostMessage::ClosePicker).unwrap(),
            HostResponse::NotActive
        );
        assert_eq!(lock(host.document()).listener_count(), 0);
        assert_eq!(
            host.handle_message(&HostMessage::ShowPicker).unwrap(),
            HostResponse::Activated
        );
    }

    #[tokio::test]
    async fn test_close_button_drops_picker() {
        let mut host = host();
        host.handle_message(&HostMessage::ShowPicker).unwrap();
        let close = host.picker().and_then(|p| p.close_button()).unwrap();

        let outcome = host.dispatch(&PointerEvent::at(EventKind::Click, close));
        assert!(outcome.closed);
        assert!(host.picker().is_none());
        assert!(!host.is_active());
        assert_eq!(lock(host.document()).listener_count(), 0);
    }

    #[test]
    fn test_activation_without_runtime_fails() {
        let mut host = host();
        let err = host.handle_message(&HostMessage::ShowPicker).unwrap_err();
        assert!(matches!(err, PickerError::NoRuntime));
        assert!(!host.is_active());
    }

    #[test]
    fn test_invalid_json_message() {
        let mut host = host();
        let err = host.handle_json("{not json").unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            host.handle_json(r#"{"action":"ping"}"#).unwrap(),
            HostResponse::Ignored
        );
    }
}
