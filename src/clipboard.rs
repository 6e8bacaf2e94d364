//! Clipboard access with a document-level fallback

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};

use crate::dom::{Document, SharedDocument, lock};

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard access denied")]
    Denied,
    #[error("no clipboard tool available (tried {0})")]
    Unavailable(String),
    #[error("clipboard tool '{tool}' failed: {reason}")]
    Tool { tool: String, reason: String },
}

/// Synchronous clipboard write. Failure is reported, never hidden.
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Which path actually delivered the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyPath {
    Clipboard,
    Fallback,
    Failed,
}

/// Clipboard that keeps everything written to it
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    entries: Mutex<Vec<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn last(&self) -> Option<String> {
        self.entries().pop()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push(text.to_string());
        Ok(())
    }
}

/// Clipboard that always refuses, like a page without clipboard permission
#[derive(Debug, Default, Clone, Copy)]
pub struct DeniedClipboard;

impl Clipboard for DeniedClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Denied)
    }
}

/// Platform clipboard through the usual command line helpers
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    candidates: Vec<(String, Vec<String>)>,
}

impl Default for SystemClipboard {
    fn default() -> Self {
        let candidates: &[(&str, &[&str])] = &[
            ("pbcopy", &[]),
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
            ("clip", &[]),
        ];
        Self {
            candidates: candidates
                .iter()
                .map(|(tool, args)| {
                    (
                        tool.to_string(),
                        args.iter().map(|a| a.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `text` to one tool. The child is always waited on, even when
    /// it stops reading early.
    fn pipe_to(tool: &str, args: &[String], text: &str) -> Result<(), ClipboardError> {
        let failed = |reason: String| ClipboardError::Tool {
            tool: tool.to_string(),
            reason,
        };
        let mut child = Command::new(tool)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| failed(e.to_string()))?;
        // stdin is dropped at the end of the match so the tool sees EOF
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(text.as_bytes()),
            None => Ok(()),
        };
        let status = child.wait().map_err(|e| failed(e.to_string()))?;
        written.map_err(|e| failed(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(failed(format!("exited with {}", status)))
        }
    }

    fn write_with_tools(&self, text: &str) -> Result<(), ClipboardError> {
        for (tool, args) in &self.candidates {
            match Self::pipe_to(tool, args, text) {
                Ok(()) => {
                    debug!("Copied {} bytes with {}", text.len(), tool);
                    return Ok(());
                }
                Err(e) => debug!("{}", e),
            }
        }
        let tried: Vec<&str> = self.candidates.iter().map(|(t, _)| t.as_str()).collect();
        Err(ClipboardError::Unavailable(tried.join(", ")))
    }
}

impl Clipboard for SystemClipboard {
    /// Spawning the tool blocks; on a multi-threaded runtime the worker is
    /// handed over to the blocking section first
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| self.write_with_tools(text))
            }
            _ => self.write_with_tools(text),
        }
    }
}

/// Copy through a hidden textarea that lives in the document only for the
/// duration of the call
pub fn fallback_copy<D: Document + ?Sized>(doc: &mut D, text: &str) -> bool {
    let buffer = doc.create_element("textarea");
    doc.set_attribute(buffer, "value", text);
    doc.set_attribute(buffer, "readonly", "");
    doc.set_attribute(buffer, "aria-hidden", "true");
    let body = doc.body();
    doc.append_child(body, buffer);
    let copied = doc.exec_copy(buffer);
    doc.remove(buffer);
    copied
}

/// Try the clipboard first, then the document fallback
pub fn copy_with_fallback<D: Document>(
    clipboard: &dyn Clipboard,
    doc: &SharedDocument<D>,
    text: &str,
) -> CopyPath {
    match clipboard.write_text(text) {
        Ok(()) => CopyPath::Clipboard,
        Err(e) => {
            warn!("Clipboard write failed ({}), using fallback copy", e);
            if fallback_copy(&mut *lock(doc), text) {
                CopyPath::Fallback
            } else {
                warn!("Fallback copy was refused");
                CopyPath::Failed
            }
        }
    }
}

#[cfg(test)]
#[path = "clipboard_test.rs"]
mod clipboard_test;
