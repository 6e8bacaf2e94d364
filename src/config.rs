//! Picker configuration, stored as JSON under `~/.elpicker`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::PickerError;
use crate::selector::{DEFAULT_CLASS_PREFIX, SelectorOptions};
use crate::types::{Combinator, Mode};

/// Class toggled on the panel button of the active mode
pub const ACTIVE_CLASS: &str = "active";

/// Texts shown in the panel and the toast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelLabels {
    pub title: String,
    pub image: String,
    pub text: String,
    pub link: String,
    pub close: String,
    /// Toast shown after a selector was copied
    pub copied: String,
}

impl Default for PanelLabels {
    fn default() -> Self {
        Self {
            title: "Pick an element type:".to_string(),
            image: "Image".to_string(),
            text: "Text".to_string(),
            link: "Link".to_string(),
            close: "Close".to_string(),
            copied: "Selector copied!".to_string(),
        }
    }
}

impl PanelLabels {
    pub fn for_mode(&self, mode: Mode) -> &str {
        match mode {
            Mode::Image => &self.image,
            Mode::Text => &self.text,
            Mode::Link => &self.link,
        }
    }
}

/// Panel size and its initial distance from the bottom-right corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelLayout {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            width: 180.0,
            height: 190.0,
            margin: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Prefix of every class the picker adds to the page
    pub class_prefix: String,
    /// Separator between selector segments
    pub combinator: Combinator,
    /// How long a toast stays on the page
    pub notification_ms: u64,
    pub labels: PanelLabels,
    pub panel: PanelLayout,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            class_prefix: DEFAULT_CLASS_PREFIX.to_string(),
            combinator: Combinator::Descendant,
            notification_ms: 2000,
            labels: PanelLabels::default(),
            panel: PanelLayout::default(),
        }
    }
}

impl PickerConfig {
    pub fn overlay_class(&self) -> String {
        format!("{}-overlay", self.class_prefix)
    }

    pub fn title_class(&self) -> String {
        format!("{}-title", self.class_prefix)
    }

    pub fn highlight_class(&self) -> String {
        format!("{}-highlight", self.class_prefix)
    }

    pub fn notification_class(&self) -> String {
        format!("{}-notification", self.class_prefix)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn selector_options(&self) -> SelectorOptions {
        SelectorOptions {
            class_prefix: self.class_prefix.clone(),
            combinator: self.combinator,
        }
    }

    /// `~/.elpicker/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Unable to determine home directory")?;
        Ok(home_dir.join(".elpicker").join("config.json"))
    }

    /// Read a config file; an empty prefix is rejected since it would
    /// filter every class out of generated selectors
    pub fn load(path: &Path) -> Result<Self, PickerError> {
        let json = fs::read_to_string(path)
            .map_err(|e| PickerError::Config(format!("{}: {}", path.display(), e)))?;
        let config: PickerConfig = serde_json::from_str(&json)
            .map_err(|e| PickerError::Config(format!("{}: {}", path.display(), e)))?;
        if config.class_prefix.trim().is_empty() {
            return Err(PickerError::Config(
                "class_prefix must not be empty".to_string(),
            ));
        }
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Explicit path if given, else the default location, else defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::load(path)?);
        }
        let path = Self::default_path()?;
        if path.exists() {
            Ok(Self::load(&path)?)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote config to {}", path.display());
        Ok(())
    }
}
