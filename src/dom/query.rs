//! Minimal CSS selector engine
//!
//! Supports exactly what generated selectors use, plus ids and the universal
//! selector: `tag`, `*`, `.class`, `#id` and `:nth-of-type(n)` compounds joined
//! by descendant (whitespace) or child (`>`) combinators.

use std::collections::HashSet;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use super::{Document, NodeId};
use crate::errors::PickerError;
use crate::types::Combinator;

/// One compound selector, e.g. `div.item:nth-of-type(2)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// `None` for `*` or an omitted type
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub nth_of_type: Option<usize>,
}

/// Parsed selector: `compounds[i]` relates to `compounds[i + 1]` through
/// `combinators[i]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

impl Selector {
    pub fn compounds(&self) -> &[Compound] {
        &self.compounds
    }

    pub fn combinators(&self) -> &[Combinator] {
        &self.combinators
    }

    pub fn matches<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        let mut failed = HashSet::new();
        self.matches_from(doc, node, self.compounds.len() - 1, &mut failed)
    }

    /// Right-to-left match of `compounds[..=index]` ending at `node`.
    /// `failed` holds the `(node, index)` pairs already known not to match,
    /// so each pair is explored at most once.
    fn matches_from<D: Document + ?Sized>(
        &self,
        doc: &D,
        node: NodeId,
        index: usize,
        failed: &mut HashSet<(NodeId, usize)>,
    ) -> bool {
        if failed.contains(&(node, index)) {
            return false;
        }
        let matched = matches_compound(doc, node, &self.compounds[index])
            && (index == 0
                || match self.combinators[index - 1] {
                    Combinator::Child => doc
                        .parent(node)
                        .is_some_and(|p| self.matches_from(doc, p, index - 1, failed)),
                    Combinator::Descendant => {
                        let mut current = doc.parent(node);
                        let mut found = false;
                        while let Some(ancestor) = current {
                            if self.matches_from(doc, ancestor, index - 1, failed) {
                                found = true;
                                break;
                            }
                            current = doc.parent(ancestor);
                        }
                        found
                    }
                });
        if !matched {
            failed.insert((node, index));
        }
        matched
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}", tag)?,
            None if self.id.is_none() && self.classes.is_empty() => write!(f, "*")?,
            None => {}
        }
        if let Some(id) = &self.id {
            write!(f, "#{}", escape_ident(id))?;
        }
        for class in &self.classes {
            write!(f, ".{}", escape_ident(class))?;
        }
        if let Some(n) = self.nth_of_type {
            write!(f, ":nth-of-type({})", n)?;
        }
        Ok(())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, compound) in self.compounds.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", self.combinators[i - 1].separator())?;
            }
            write!(f, "{}", compound)?;
        }
        Ok(())
    }
}

/// 1-based rank of `node` among its parent's children with the same tag,
/// together with the number of such siblings. `None` for parentless nodes.
pub fn type_position<D: Document + ?Sized>(doc: &D, node: NodeId) -> Option<(usize, usize)> {
    let parent = doc.parent(node)?;
    let tag = doc.tag_name(node)?;
    let mut rank = 0;
    let mut count = 0;
    for sibling in doc.children(parent) {
        if doc.tag_name(*sibling) == Some(tag) {
            count += 1;
            if *sibling == node {
                rank = count;
            }
        }
    }
    Some((rank, count))
}

fn matches_compound<D: Document + ?Sized>(doc: &D, node: NodeId, compound: &Compound) -> bool {
    let Some(tag) = doc.tag_name(node) else {
        return false;
    };
    if compound.tag.as_deref().is_some_and(|t| t != tag) {
        return false;
    }
    if let Some(id) = &compound.id
        && doc.attribute(node, "id") != Some(id.as_str())
    {
        return false;
    }
    if !compound.classes.iter().all(|c| doc.has_class(node, c)) {
        return false;
    }
    match compound.nth_of_type {
        Some(n) => type_position(doc, node).is_some_and(|(rank, _)| rank == n),
        None => true,
    }
}

/// Every element matching `selector`, in document order
pub fn query_selector_all<D: Document + ?Sized>(doc: &D, selector: &Selector) -> Vec<NodeId> {
    let root = doc.root();
    std::iter::once(root)
        .chain(doc.descendants(root))
        .filter(|n| selector.matches(doc, *n))
        .collect()
}

/// First element matching `selector` text, or `ElementNotFound`
pub fn query_selector<D: Document + ?Sized>(doc: &D, selector: &str) -> Result<NodeId, PickerError> {
    let parsed = parse_selector(selector)?;
    query_selector_all(doc, &parsed)
        .into_iter()
        .next()
        .ok_or_else(|| PickerError::ElementNotFound(selector.to_string()))
}

pub fn parse_selector(input: &str) -> Result<Selector, PickerError> {
    let invalid = |reason: String| PickerError::InvalidSelector {
        selector: input.to_string(),
        reason,
    };

    let mut chars = input.trim().chars().peekable();
    if chars.peek().is_none() {
        return Err(invalid("empty selector".to_string()));
    }

    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    loop {
        compounds.push(parse_compound(&mut chars).map_err(&invalid)?);

        let saw_space = skip_whitespace(&mut chars);
        match chars.peek() {
            None => break,
            Some('>') => {
                chars.next();
                skip_whitespace(&mut chars);
                combinators.push(Combinator::Child);
            }
            Some(_) if saw_space => combinators.push(Combinator::Descendant),
            Some(c) => return Err(invalid(format!("unexpected '{}'", c))),
        }
        if chars.peek().is_none() {
            return Err(invalid("dangling combinator".to_string()));
        }
    }

    Ok(Selector {
        compounds,
        combinators,
    })
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) -> bool {
    let mut skipped = false;
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
        skipped = true;
    }
    skipped
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Escape an identifier for use after `.` or `#`, the way `CSS.escape` does
pub fn escape_ident(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());
    for (i, &c) in chars.iter().enumerate() {
        let leading_digit =
            c.is_ascii_digit() && (i == 0 || (i == 1 && chars[0] == '-'));
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&format!("\\{:x} ", u32::from(c))),
            _ if leading_digit => out.push_str(&format!("\\{:x} ", u32::from(c))),
            '-' if chars.len() == 1 => out.push_str("\\-"),
            _ if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => out.push(c),
            _ => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

fn read_ident(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut ident = String::new();
    loop {
        match chars.peek().copied() {
            Some('\\') => {
                chars.next();
                ident.push(read_escape(chars)?);
            }
            Some(c) if is_ident_char(c) => {
                ident.push(c);
                chars.next();
            }
            _ => break,
        }
    }
    (!ident.is_empty()).then_some(ident)
}

/// Body of a `\` escape: up to six hex digits plus one optional trailing
/// space, or any single character taken literally
fn read_escape(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    let mut hex = String::new();
    while hex.len() < 6 {
        match chars.peek().copied().filter(char::is_ascii_hexdigit) {
            Some(c) => {
                hex.push(c);
                chars.next();
            }
            None => break,
        }
    }
    if hex.is_empty() {
        return chars.next();
    }
    if chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
    let code = u32::from_str_radix(&hex, 16).ok()?;
    Some(
        char::from_u32(code)
            .filter(|c| *c != '\0')
            .unwrap_or('\u{FFFD}'),
    )
}

fn parse_compound(chars: &mut Peekable<Chars<'_>>) -> Result<Compound, String> {
    let mut compound = Compound::default();
    let mut parsed_any = false;

    match chars.peek() {
        Some('*') => {
            chars.next();
            parsed_any = true;
        }
        Some(c) if is_ident_char(*c) || *c == '\\' => {
            compound.tag = read_ident(chars).map(|t| t.to_ascii_lowercase());
            parsed_any = true;
        }
        _ => {}
    }

    loop {
        match chars.peek() {
            Some('.') => {
                chars.next();
                let class = read_ident(chars).ok_or("expected class name after '.'")?;
                compound.classes.push(class);
            }
            Some('#') => {
                chars.next();
                let id = read_ident(chars).ok_or("expected id after '#'")?;
                compound.id = Some(id);
            }
            Some(':') => {
                chars.next();
                let pseudo = read_ident(chars).ok_or("expected pseudo-class after ':'")?;
                if pseudo != "nth-of-type" {
                    return Err(format!("unsupported pseudo-class ':{}'", pseudo));
                }
                if chars.next() != Some('(') {
                    return Err("expected '(' after :nth-of-type".to_string());
                }
                skip_whitespace(chars);
                let digits = read_ident(chars).ok_or("expected index in :nth-of-type()")?;
                skip_whitespace(chars);
                if chars.next() != Some(')') {
                    return Err("expected ')' closing :nth-of-type".to_string());
                }
                let n = digits
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("invalid :nth-of-type index '{}'", digits))?;
                compound.nth_of_type = Some(n);
            }
            _ => break,
        }
        parsed_any = true;
    }

    if !parsed_any {
        return Err(match chars.peek() {
            Some(c) => format!("unexpected '{}'", c),
            None => "expected selector".to_string(),
        });
    }
    Ok(compound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use pretty_assertions::assert_eq;

    fn list_page() -> (MemoryDocument, Vec<NodeId>) {
        let mut doc = MemoryDocument::default();
        let body = doc.body();
        let list = doc.append_element(body, "ul", &["menu"]);
        let items = (0..3)
            .map(|_| doc.append_element(list, "li", &["entry"]))
            .collect();
        (doc, items)
    }

    #[test]
    fn test_parse_compound_parts() {
        let sel = parse_selector("div#main.item.wide:nth-of-type(2)").unwrap();
        assert_eq!(
            sel.compounds(),
            &[Compound {
                tag: Some("div".into()),
                id: Some("main".into()),
                classes: vec!["item".into(), "wide".into()],
                nth_of_type: Some(2),
            }]
        );
        assert!(sel.combinators().is_empty());
    }

    #[test]
    fn test_parse_combinators() {
        let sel = parse_selector("ul.menu > li  a").unwrap();
        assert_eq!(sel.compounds().len(), 3);
        assert_eq!(
            sel.combinators(),
            &[Combinator::Child, Combinator::Descendant]
        );
        assert_eq!(sel.to_string(), "ul.menu > li a");
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "  ", "div >", "> div", "div:hover", "li:nth-of-type(0)", "a..b", "a[href]", "#"] {
            let err = parse_selector(bad).unwrap_err();
            assert!(
                matches!(err, PickerError::InvalidSelector { .. }),
                "expected error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_nth_of_type_matching() {
        let (doc, items) = list_page();
        let sel = parse_selector("li:nth-of-type(2)").unwrap();
        assert_eq!(query_selector_all(&doc, &sel), vec![items[1]]);
        assert_eq!(type_position(&doc, items[2]), Some((3, 3)));
        assert_eq!(type_position(&doc, doc.root()), None);
    }

    #[test]
    fn test_descendant_vs_child() {
        let (mut doc, items) = list_page();
        let link = doc.append_element(items[0], "a", &[]);

        let descendant = parse_selector("ul a").unwrap();
        assert_eq!(query_selector_all(&doc, &descendant), vec![link]);

        let child = parse_selector("ul > a").unwrap();
        assert!(query_selector_all(&doc, &child).is_empty());

        let universal = parse_selector("ul > * > a").unwrap();
        assert_eq!(query_selector_all(&doc, &universal), vec![link]);
    }

    #[test]
    fn test_escaped_identifiers() {
        assert_eq!(escape_ident("md:flex"), r"md\:flex");
        assert_eq!(escape_ident("1col"), r"\31 col");
        assert_eq!(escape_ident("-2"), r"-\32 ");
        assert_eq!(escape_ident("-"), r"\-");
        assert_eq!(escape_ident("café_x"), "café_x");

        let sel = parse_selector(r"p#a\.b.md\:flex.\31 col > a").unwrap();
        assert_eq!(sel.compounds()[0].id.as_deref(), Some("a.b"));
        assert_eq!(sel.compounds()[0].classes, vec!["md:flex", "1col"]);
        assert_eq!(sel.combinators(), &[Combinator::Child]);
        assert_eq!(sel.to_string(), r"p#a\.b.md\:flex.\31 col > a");
        assert!(parse_selector(r"a.b\").is_err());
    }

    #[test]
    fn test_query_selector_not_found() {
        let (doc, items) = list_page();
        assert_eq!(query_selector(&doc, "li.entry").unwrap(), items[0]);
        let err = query_selector(&doc, "li.missing").unwrap_err();
        assert!(matches!(err, PickerError::ElementNotFound(_)));
    }
}
