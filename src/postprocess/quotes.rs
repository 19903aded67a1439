use crate::adapters::QuoteFilter;
use crate::nodes::{Node, NodeValue};

/// Pass the text of every `Text` node through `filter`.  Code, math and raw
/// HTML are different node kinds and so are left alone.
pub fn apply<'a>(root: Node<'a>, filter: &dyn QuoteFilter, locale: &str) {
    for node in root.descendants() {
        let mut ast = node.data_mut();
        if let NodeValue::Text(ref mut text) = ast.value {
            *text = filter.filter(text, locale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Arena;
    use crate::{parse_document, Options};

    #[test]
    fn code_is_untouched() {
        let arena = Arena::new();
        let root = parse_document(&arena, "a `a` a", &Options::default());
        let upper = |text: &str, _: &str| text.to_uppercase();
        apply(root, &upper, "fr");

        let para = root.first_child().unwrap();
        let values: Vec<NodeValue> = para.children().map(|n| n.data().value.clone()).collect();
        assert_eq!(values[0], NodeValue::Text("A ".to_string()));
        assert!(matches!(values[1], NodeValue::Code(ref c) if c.literal == "a"));
        assert_eq!(values[2], NodeValue::Text(" A".to_string()));
    }
}
