//! Scripted picker sessions replayed against a [`Page`]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::clipboard::CopyPath;
use crate::host::{HostMessage, HostResponse};
use crate::page::Page;
use crate::picker::{PickRecord, PickerState};
use crate::types::{BoundingBox, Mode, Point};

/// One user action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Activation message from the extension
    ShowPicker,
    ClosePicker,
    /// Click the panel button of `mode`
    ToggleMode { mode: Mode },
    Hover { target: String },
    Click { target: String },
    /// Drag the panel from one client point to another
    Drag { from: Point, to: Point },
    Wait { ms: u64 },
    /// Click the panel's close button
    Close,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionScript {
    pub steps: Vec<Step>,
}

impl SessionScript {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid session script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub responses: Vec<HostResponse>,
    pub picks: Vec<PickRecord>,
    pub navigations: Vec<String>,
    pub final_state: Option<PickerState>,
    pub panel: Option<BoundingBox>,
    pub notifications: usize,
}

impl SessionReport {
    pub fn copied(&self) -> impl Iterator<Item = &str> {
        self.picks
            .iter()
            .filter(|p| p.copy_path != CopyPath::Failed)
            .map(|p| p.selector.as_str())
    }
}

/// Run every step in order, stopping at the first failure
pub async fn run_session(page: &mut Page, script: &SessionScript) -> Result<SessionReport> {
    let mut responses = Vec::new();
    let mut picks = Vec::new();

    for (index, step) in script.steps.iter().enumerate() {
        debug!("Step {}: {:?}", index + 1, step);
        match step {
            Step::ShowPicker => responses.push(page.send(&HostMessage::ShowPicker)?),
            Step::ClosePicker => responses.push(page.send(&HostMessage::ClosePicker)?),
            Step::ToggleMode { mode } => {
                let button = page
                    .host()
                    .picker()
                    .and_then(|p| p.mode_button(*mode))
                    .with_context(|| format!("Cannot select {} mode: picker is not active", mode))?;
                page.click(button);
            }
            Step::Hover { target } => {
                let node = page.query(target)?;
                page.hover(node);
            }
            Step::Click { target } => {
                let node = page.query(target)?;
                if let Some(pick) = page.click(node).pick {
                    picks.push(pick);
                }
            }
            Step::Drag { from, to } => {
                let panel = page
                    .host()
                    .picker()
                    .and_then(|p| p.panel())
                    .context("Cannot drag: picker is not active")?;
                page.drag(panel, *from, *to);
            }
            Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
            Step::Close => {
                let close = page
                    .host()
                    .picker()
                    .and_then(|p| p.close_button())
                    .context("Cannot close: picker is not active")?;
                page.click(close);
            }
        }
    }

    info!(
        "Session finished: {} steps, {} picks",
        script.steps.len(),
        picks.len()
    );
    Ok(SessionReport {
        responses,
        picks,
        navigations: page.navigations().to_vec(),
        final_state: page.picker_state(),
        panel: page.panel_rect(),
        notifications: page.notification_count(),
    })
}
