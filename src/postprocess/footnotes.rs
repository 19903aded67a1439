//! Footnote numbering.
//!
//! References are numbered in the order they are first met, walking the
//! document depth first.  Definitions are then moved to the end of the
//! document in that order, whatever order they were written in.  Notes
//! written in place (`[^some text]`) carry their own anonymous definition
//! and are numbered along with the rest.

use rustc_hash::FxHashMap;

use crate::error::Diagnostic;
use crate::nodes::{Node, NodeValue};
use crate::strings::{self, Case};

/// Number references, reorder definitions and report dangling references
/// and dropped definitions.  Returns the number of footnotes kept.
pub fn process<'a>(root: Node<'a>, messages: &mut Vec<Diagnostic>) -> usize {
    let mut definitions: FxHashMap<String, Node<'a>> = FxHashMap::default();
    let mut all: Vec<Node<'a>> = vec![];
    for child in root.descendants() {
        if let NodeValue::FootnoteDefinition(ref nfd) = child.data().value {
            all.push(child);
            if nfd.name.is_empty() {
                continue;
            }
            let label = strings::normalize_label(&nfd.name, Case::Fold);
            if definitions.contains_key(&label) {
                messages.push(Diagnostic::unresolved(
                    format!("duplicate footnote definition \"{}\" dropped", nfd.name),
                    child.data().line,
                ));
            } else {
                definitions.insert(label, child);
            }
        }
    }

    let mut ordered: Vec<Node<'a>> = vec![];
    number_references(root, &definitions, &mut ordered, messages);

    // References inside footnotes number after those in the body; a
    // definition referenced only from another footnote follows it.
    let mut i = 0;
    while i < ordered.len() {
        let def = ordered[i];
        for child in def.children() {
            number_references(child, &definitions, &mut ordered, messages);
        }
        i += 1;
    }

    for &def in &all {
        let ast = def.data();
        let NodeValue::FootnoteDefinition(ref nfd) = ast.value else {
            continue;
        };
        let kept = definitions
            .get(&strings::normalize_label(&nfd.name, Case::Fold))
            .is_some_and(|d| d.same_node(def));
        if kept && nfd.ix == 0 {
            messages.push(Diagnostic::unresolved(
                format!("footnote \"{}\" is never referenced and was dropped", nfd.name),
                ast.line,
            ));
        }
    }

    for def in all {
        def.detach();
    }
    for &def in &ordered {
        root.append(def);
    }

    tracing::debug!(footnotes = ordered.len(), "footnotes numbered");
    ordered.len()
}

/// Walk below `start`, skipping definitions, numbering each reference met.
fn number_references<'a>(
    start: Node<'a>,
    definitions: &FxHashMap<String, Node<'a>>,
    ordered: &mut Vec<Node<'a>>,
    messages: &mut Vec<Diagnostic>,
) {
    let mut stack = vec![start];

    while let Some(node) = stack.pop() {
        let name = match node.data().value {
            NodeValue::FootnoteDefinition(..) => continue,
            NodeValue::FootnoteReference(ref nfr) => Some(nfr.name.clone()),
            _ => None,
        };

        match name {
            Some(name) if name.is_empty() => number_inline_note(node, ordered),
            Some(name) => resolve_reference(node, &name, definitions, ordered, messages),
            None => stack.extend(node.reverse_children()),
        }
    }
}

fn number_inline_note<'a>(node: Node<'a>, ordered: &mut Vec<Node<'a>>) {
    let Some(def) = node.first_child() else {
        return;
    };
    ordered.push(def);
    let ix = ordered.len() as u32;

    if let NodeValue::FootnoteDefinition(ref mut nfd) = def.data_mut().value {
        nfd.ix = ix;
        nfd.total_references = 1;
    }
    if let NodeValue::FootnoteReference(ref mut nfr) = node.data_mut().value {
        nfr.ix = ix;
        nfr.ref_num = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Arena;
    use crate::{parse_document, Options};

    fn order<'a>(root: Node<'a>) -> Vec<(String, u32)> {
        root.children()
            .filter_map(|n| match n.data().value {
                NodeValue::FootnoteDefinition(ref nfd) => Some((nfd.name.clone(), nfd.ix)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn first_reference_order() {
        let arena = Arena::new();
        let root = parse_document(
            &arena,
            "c[^c] b[^b] a[^a] c[^c]\n\n[^a]: A\n[^b]: B\n[^c]: C\n",
            &Options::default(),
        );
        let mut messages = vec![];
        assert_eq!(process(root, &mut messages), 3);
        assert!(messages.is_empty());
        assert_eq!(
            order(root),
            vec![("c".into(), 1), ("b".into(), 2), ("a".into(), 3)]
        );
    }

    #[test]
    fn nested_and_unused() {
        let arena = Arena::new();
        let root = parse_document(
            &arena,
            "x[^outer]\n\n[^unused]: U\n\n[^inner]: I\n\n[^outer]: O[^inner]\n",
            &Options::default(),
        );
        let mut messages = vec![];
        process(root, &mut messages);
        assert_eq!(
            order(root),
            vec![("outer".into(), 1), ("inner".into(), 2)]
        );
        assert_eq!(messages.len(), 1);
        assert!(messages[0].message.contains("\"unused\""));
        assert_eq!(messages[0].line, Some(3));
    }

    #[test]
    fn duplicate_definitions() {
        let arena = Arena::new();
        let root = parse_document(
            &arena,
            "x[^a]\n\n[^a]: first\n\n[^A]: second\n",
            &Options::default(),
        );
        let mut messages = vec![];
        assert_eq!(process(root, &mut messages), 1);
        assert_eq!(order(root), vec![("a".into(), 1)]);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].message.starts_with("duplicate"));
        assert_eq!(messages[0].line, Some(5));
    }

    #[test]
    fn inline_notes_number_in_place() {
        let arena = Arena::new();
        let root = parse_document(
            &arena,
            "a[^x] b[^an *inline* note] c[^x]\n\n[^x]: X\n",
            &Options::default(),
        );
        let mut messages = vec![];
        assert_eq!(process(root, &mut messages), 2);
        assert!(messages.is_empty());
        assert_eq!(order(root), vec![("x".into(), 1), (String::new(), 2)]);

        let note = root.last_child().unwrap();
        let paragraph = note.first_child().unwrap();
        assert!(matches!(paragraph.data().value, NodeValue::Paragraph));
        assert!(paragraph
            .children()
            .any(|n| matches!(n.data().value, NodeValue::Emph)));
    }

    #[test]
    fn dangling_reference_is_text() {
        let arena = Arena::new();
        let root = parse_document(&arena, "a[^nowhere]", &Options::default());
        let mut messages = vec![];
        assert_eq!(process(root, &mut messages), 0);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].line, Some(1));
        let para = root.first_child().unwrap();
        let last = para.last_child().unwrap();
        assert_eq!(
            last.data().value,
            NodeValue::Text("[^nowhere]".to_string())
        );
    }
}
