//! CSS selector derivation for a picked element

use crate::dom::query::{escape_ident, type_position};
use crate::dom::{Document, NodeId};
use crate::types::Combinator;

/// Default prefix of the picker's own class names
pub const DEFAULT_CLASS_PREFIX: &str = "element-picker";

/// Knobs for [`generate_selector`]
#[derive(Debug, Clone)]
pub struct SelectorOptions {
    /// Classes starting with this prefix belong to the picker and are skipped
    pub class_prefix: String,
    pub combinator: Combinator,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            class_prefix: DEFAULT_CLASS_PREFIX.to_string(),
            combinator: Combinator::Descendant,
        }
    }
}

/// Selector segment for a single element: `tag.class...:nth-of-type(k)`
pub fn segment<D: Document + ?Sized>(doc: &D, node: NodeId, options: &SelectorOptions) -> String {
    let mut segment = doc.tag_name(node).unwrap_or_default().to_ascii_lowercase();

    for class in doc.class_list(node) {
        let class = class.trim();
        if class.is_empty() || class.starts_with(options.class_prefix.as_str()) {
            continue;
        }
        segment.push('.');
        segment.push_str(&escape_ident(class));
    }

    if let Some((rank, count)) = type_position(doc, node)
        && count > 1
    {
        segment.push_str(&format!(":nth-of-type({})", rank));
    }

    segment
}

/// Build the selector path from the content container (exclusive) down to
/// `node`. Best effort: not guaranteed unique, and only valid for the tree
/// as it is right now.
pub fn generate_selector<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    options: &SelectorOptions,
) -> String {
    let body = doc.body();
    let mut path = Vec::new();
    let mut current = Some(node);

    while let Some(n) = current {
        if n == body || doc.tag_name(n).is_none() {
            break;
        }
        path.push(segment(doc, n, options));
        current = doc.parent(n);
    }

    path.reverse();
    path.join(options.combinator.separator())
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod selector_test;
