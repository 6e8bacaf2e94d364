// Unit tests for selector generation

use super::*;
use crate::dom::{MemoryDocument, parse_selector, query_selector_all};
use pretty_assertions::assert_eq;

/// `<div class="item"><a href="/x">Click</a></div>` three times
fn item_list() -> (MemoryDocument, Vec<NodeId>) {
    let mut doc = MemoryDocument::default();
    let body = doc.body();
    let anchors = (0..3)
        .map(|i| {
            let item = doc.append_element(body, "div", &["item"]);
            let a = doc.append_element(item, "a", &[]);
            doc.set_attribute(a, "href", &format!("/{}", i));
            doc.set_text(a, "Click");
            a
        })
        .collect();
    (doc, anchors)
}

#[test]
fn test_positional_qualifier_for_same_tag_siblings() {
    let (doc, anchors) = item_list();
    let selector = generate_selector(&doc, anchors[1], &SelectorOptions::default());
    assert_eq!(selector, "div.item:nth-of-type(2) a");
}

#[test]
fn test_single_child_has_no_qualifier() {
    let mut doc = MemoryDocument::default();
    let body = doc.body();
    let main = doc.append_element(body, "main", &[]);
    let p = doc.append_element(main, "P", &["lead", "intro"]);
    assert_eq!(
        generate_selector(&doc, p, &SelectorOptions::default()),
        "main p.lead.intro"
    );
}

#[test]
fn test_rank_counts_only_same_tag_siblings() {
    let mut doc = MemoryDocument::default();
    let body = doc.body();
    let section = doc.append_element(body, "section", &[]);
    doc.append_element(section, "h2", &[]);
    let first = doc.append_element(section, "p", &[]);
    doc.append_element(section, "span", &[]);
    let second = doc.append_element(section, "p", &[]);

    let options = SelectorOptions::default();
    assert_eq!(generate_selector(&doc, first, &options), "section p:nth-of-type(1)");
    assert_eq!(generate_selector(&doc, second, &options), "section p:nth-of-type(2)");
}

#[test]
fn test_picker_classes_are_filtered() {
    let mut doc = MemoryDocument::default();
    let body = doc.body();
    let img = doc.append_element(
        body,
        "img",
        &["hero", "element-picker-highlight", "rounded"],
    );
    assert_eq!(
        generate_selector(&doc, img, &SelectorOptions::default()),
        "img.hero.rounded"
    );

    let custom = SelectorOptions {
        class_prefix: "hero".to_string(),
        ..SelectorOptions::default()
    };
    assert_eq!(
        generate_selector(&doc, img, &custom),
        "img.element-picker-highlight.rounded"
    );
}

#[test]
fn test_child_combinator_option() {
    let (doc, anchors) = item_list();
    let options = SelectorOptions {
        combinator: Combinator::Child,
        ..SelectorOptions::default()
    };
    assert_eq!(
        generate_selector(&doc, anchors[2], &options),
        "div.item:nth-of-type(3) > a"
    );
}

#[test]
fn test_container_and_outside_nodes() {
    let mut doc = MemoryDocument::default();
    assert_eq!(
        generate_selector(&doc, doc.body(), &SelectorOptions::default()),
        ""
    );

    let head = doc.head();
    let title = doc.append_element(head, "title", &[]);
    assert_eq!(
        generate_selector(&doc, title, &SelectorOptions::default()),
        "html head title"
    );
}

#[test]
fn test_generated_selector_resolves_to_target() {
    let (mut doc, anchors) = item_list();
    let nested = doc.append_element(anchors[0], "span", &["icon"]);

    let options = SelectorOptions::default();
    for target in anchors.iter().copied().chain([nested]) {
        let text = generate_selector(&doc, target, &options);
        let selector = parse_selector(&text).unwrap();
        let matches = query_selector_all(&doc, &selector);
        assert!(
            matches.contains(&target),
            "{} did not resolve to its target",
            text
        );
    }
}

#[test]
fn test_segment_without_classes_or_siblings() {
    let mut doc = MemoryDocument::default();
    let body = doc.body();
    let nav = doc.append_element(body, "nav", &["element-picker-overlay"]);
    assert_eq!(segment(&doc, nav, &SelectorOptions::default()), "nav");
}

#[test]
fn test_deep_chain_resolves_back_to_target() {
    let mut doc = MemoryDocument::default();
    let mut parent = doc.body();
    for _ in 0..40 {
        parent = doc.append_element(parent, "div", &[]);
    }
    let deepest = parent;

    let selector = generate_selector(&doc, deepest, &SelectorOptions::default());
    assert_eq!(selector, vec!["div"; 40].join(" "));

    let parsed = parse_selector(&selector).unwrap();
    assert_eq!(query_selector_all(&doc, &parsed), vec![deepest]);

    let missing = parse_selector(&format!("{} span", selector)).unwrap();
    assert!(query_selector_all(&doc, &missing).is_empty());
}

#[test]
fn test_utility_classes_are_escaped() {
    let mut doc = MemoryDocument::default();
    let body = doc.body();
    let div = doc.append_element(body, "div", &["md:flex", "w-1/2", "2xl"]);

    let selector = generate_selector(&doc, div, &SelectorOptions::default());
    assert_eq!(selector, r"div.md\:flex.w-1\/2.\32 xl");

    let parsed = parse_selector(&selector).unwrap();
    assert_eq!(query_selector_all(&doc, &parsed), vec![div]);
}
