use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use url::Url;

use elpicker::{
    Clipboard, DeniedClipboard, MemoryClipboard, MemoryDocument, OutputFormat, Page,
    PickerConfig, SessionReport, SessionScript, SystemClipboard, ViewportSize, run_session,
};

/// Clipboard backend chosen on the command line
pub fn choose_clipboard(system: bool, deny: bool) -> Arc<dyn Clipboard> {
    if deny {
        Arc::new(DeniedClipboard)
    } else if system {
        Arc::new(SystemClipboard::new())
    } else {
        Arc::new(MemoryClipboard::new())
    }
}

pub fn print_report(report: &SessionReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Simple => {
            for pick in &report.picks {
                println!("{}\t{}\t{:?}", pick.mode, pick.selector, pick.copy_path);
            }
            for url in &report.navigations {
                println!("navigated\t{}", url);
            }
            match &report.final_state {
                Some(state) => println!(
                    "picker\topen\t{}",
                    state
                        .current_mode
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "idle".to_string())
                ),
                None => println!("picker\tclosed"),
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn handle_replay(
    snapshot: PathBuf,
    script: PathBuf,
    base_url: Option<String>,
    viewport: Option<String>,
    system_clipboard: bool,
    deny_clipboard: bool,
    format: OutputFormat,
    config_path: Option<PathBuf>,
) -> Result<()> {
    info!("Replaying {} on {}", script.display(), snapshot.display());

    let config = PickerConfig::resolve(config_path.as_deref())?;
    let mut doc = MemoryDocument::load(&snapshot)?;
    if let Some(viewport) = viewport {
        doc.set_viewport(ViewportSize::parse(&viewport)?);
    }
    let script = SessionScript::load(&script)?;

    let clipboard = choose_clipboard(system_clipboard, deny_clipboard);
    let mut page = Page::new(doc, clipboard, config);
    if let Some(base) = base_url {
        let base = Url::parse(&base).with_context(|| format!("Invalid base URL: {}", base))?;
        page = page.with_base_url(base);
    }

    let report = run_session(&mut page, &script).await?;
    print_report(&report, format)
}
