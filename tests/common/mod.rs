// Common test utilities and fixtures

use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Page snapshots and session scripts
pub mod fixtures {
    /// Three `.item` cards, each wrapping a link, plus an image and a paragraph
    pub const ITEM_PAGE: &str = r#"{
        "viewport": {"width": 1024, "height": 768},
        "body": {
            "tag": "body",
            "children": [
                {"tag": "div", "classes": ["item"], "children": [
                    {"tag": "a", "attrs": {"href": "/x"}, "text": "Click"}
                ]},
                {"tag": "div", "classes": ["item"], "children": [
                    {"tag": "a", "attrs": {"href": "/x"}, "text": "Click"}
                ]},
                {"tag": "div", "classes": ["item"], "children": [
                    {"tag": "a", "attrs": {"href": "/x"}, "text": "Click"}
                ]},
                {"tag": "img", "classes": ["hero"], "attrs": {"src": "/hero.png"}},
                {"tag": "p", "classes": ["lead"], "text": "Welcome"}
            ]
        }
    }"#;

    /// Pick the second link, then try an image pick on text
    pub const LINK_SESSION: &str = r#"{
        "steps": [
            {"action": "show_picker"},
            {"action": "toggle_mode", "mode": "link"},
            {"action": "hover", "target": "div.item:nth-of-type(2) a"},
            {"action": "click", "target": "div.item:nth-of-type(2) a"},
            {"action": "toggle_mode", "mode": "image"},
            {"action": "click", "target": "p.lead"}
        ]
    }"#;

    /// Follow a link without the picker, then close an unopened picker
    pub const NAVIGATION_SESSION: &str = r#"{
        "steps": [
            {"action": "click", "target": "div.item a"},
            {"action": "close_picker"}
        ]
    }"#;
}

/// Write `content` to `name` inside the temporary directory
pub fn write_temp(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write fixture");
    path
}

/// Run the elpicker binary against an isolated config file
pub fn run_elpicker(dir: &TempDir, args: &[&str]) -> std::process::Output {
    let config = dir.path().join("config.json");
    if !config.exists() {
        std::fs::write(&config, "{}").expect("Failed to write config");
    }
    Command::new(env!("CARGO_BIN_EXE_elpicker"))
        .args(args)
        .arg("--config")
        .arg(&config)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute elpicker command")
}
