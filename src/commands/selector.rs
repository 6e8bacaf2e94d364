use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use elpicker::dom::{self, Document, MemoryDocument, NodeId};
use elpicker::{Combinator, OutputFormat, PickerConfig, PickerError, generate_selector};

#[derive(Debug, Serialize)]
pub struct SelectorResult {
    /// Index among the query matches
    pub index: usize,
    pub tag: String,
    pub selector: String,
    /// Number of elements the generated selector matches
    pub matches: usize,
}

/// Selectors for the query matches picked by `all` / `index`
pub fn generate_for_query(
    doc: &MemoryDocument,
    query: &str,
    all: bool,
    index: Option<usize>,
    config: &PickerConfig,
) -> Result<Vec<SelectorResult>> {
    let parsed = dom::parse_selector(query)?;
    let found = dom::query_selector_all(doc, &parsed);
    if found.is_empty() {
        return Err(PickerError::ElementNotFound(query.to_string()).into());
    }

    let chosen: Vec<(usize, NodeId)> = match (all, index) {
        (true, _) => found.into_iter().enumerate().collect(),
        (false, Some(i)) => {
            let node = found.get(i).copied().with_context(|| {
                format!(
                    "Index {} out of range, query matched {} element(s)",
                    i,
                    found.len()
                )
            })?;
            vec![(i, node)]
        }
        (false, None) => vec![(0, found[0])],
    };

    let options = config.selector_options();
    chosen
        .into_iter()
        .map(|(index, node)| {
            let selector = generate_selector(doc, node, &options);
            // an empty selector (the container itself) matches nothing useful
            let matches = match dom::parse_selector(&selector) {
                Ok(parsed) => dom::query_selector_all(doc, &parsed).len(),
                Err(_) => 0,
            };
            Ok(SelectorResult {
                index,
                tag: doc.tag_name(node).unwrap_or_default().to_string(),
                selector,
                matches,
            })
        })
        .collect()
}

pub fn handle_selector(
    snapshot: PathBuf,
    query: String,
    all: bool,
    index: Option<usize>,
    combinator: Option<Combinator>,
    format: OutputFormat,
    config_path: Option<PathBuf>,
) -> Result<()> {
    info!("Generating selectors for {} in {}", query, snapshot.display());

    let mut config = PickerConfig::resolve(config_path.as_deref())?;
    if let Some(combinator) = combinator {
        config.combinator = combinator;
    }
    let doc = MemoryDocument::load(&snapshot)?;
    let results = generate_for_query(&doc, &query, all, index, &config)?;

    match format {
        OutputFormat::Json => {
            if all {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if let Some(result) = results.first() {
                println!("{}", serde_json::to_string_pretty(result)?);
            }
        }
        OutputFormat::Simple => {
            for result in &results {
                println!("{}", result.selector);
            }
        }
    }
    Ok(())
}
