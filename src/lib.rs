//! # elpicker
#![allow(clippy::uninlined_format_args)]
//!
//! Visual element picker: choose a mode (image, text or link), hover the
//! page, click an element and get a CSS selector for it on the clipboard.
//!
//! The picker runs against any tree implementing [`dom::Document`]. The
//! bundled [`dom::MemoryDocument`] loads JSON page snapshots so pickers can be
//! driven headlessly from the CLI or from tests.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Selector for every element matching a query in a snapshot
//! elpicker selector page.json "div.item a" --all
//!
//! # Same, joined with the child combinator
//! elpicker selector page.json "img.hero" --combinator child
//!
//! # Replay a scripted picking session
//! elpicker replay page.json session.json --base-url https://example.com/
//!
//! # Pretend the clipboard is unavailable to exercise the fallback copy
//! elpicker replay page.json session.json --deny-clipboard
//!
//! # Configuration (~/.elpicker/config.json)
//! elpicker config init
//! elpicker config show
//! ```
//!
//! A session script is a list of steps:
//!
//! ```json
//! {"steps": [
//!   {"action": "show_picker"},
//!   {"action": "toggle_mode", "mode": "link"},
//!   {"action": "hover", "target": "div.item a"},
//!   {"action": "click", "target": "div.item a"},
//!   {"action": "close"}
//! ]}
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use elpicker::{EventKind, HostMessage, MemoryDocument, MemoryClipboard, Mode,
//!                PickerConfig, PickerHost, PointerEvent};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let doc = MemoryDocument::load(std::path::Path::new("page.json"))?;
//! let mut host = PickerHost::new(
//!     elpicker::dom::share(doc),
//!     Arc::new(MemoryClipboard::new()),
//!     Arc::new(PickerConfig::default()),
//! );
//! host.handle_message(&HostMessage::ShowPicker)?;
//!
//! let link = {
//!     let doc = elpicker::dom::lock(host.document());
//!     elpicker::dom::query::query_selector(&*doc, "a")?
//! };
//! if let Some(picker) = host.picker_mut() {
//!     picker.toggle_mode(Mode::Link);
//! }
//! let outcome = host.dispatch(&PointerEvent::at(EventKind::Click, link));
//! if let Some(pick) = outcome.pick {
//!     println!("{}", pick.selector);
//! }
//! # Ok(())
//! # }
//! ```

/// Clipboard backends and the document fallback copy
pub mod clipboard;

/// Picker configuration
pub mod config;

/// Element tree abstraction, in-memory document and selector queries
pub mod dom;

/// Error type with CLI exit codes
pub mod errors;

/// Pointer events and listener handles
pub mod events;

/// Activation entry point owning the picker lifetime
pub mod host;

/// Transient toast notifications
pub mod notification;

/// Headless page driving a picker
pub mod page;

/// The picker controller
pub mod picker;

/// Selector generation
pub mod selector;

/// Scripted session replay
pub mod session;

/// Shared value types
pub mod types;

pub use clipboard::{Clipboard, CopyPath, DeniedClipboard, MemoryClipboard, SystemClipboard};
pub use config::PickerConfig;
pub use dom::{Document, MemoryDocument, NodeId, SharedDocument};
pub use errors::PickerError;
pub use events::{EventKind, EventOutcome, PointerEvent};
pub use host::{HostMessage, HostResponse, PickerHost};
pub use page::Page;
pub use picker::{Phase, PickRecord, Picker, PickerState};
pub use selector::{SelectorOptions, generate_selector};
pub use session::{SessionReport, SessionScript, run_session};
pub use types::{BoundingBox, Combinator, Mode, OutputFormat, Point, ViewportSize};
