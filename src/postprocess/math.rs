use crate::nodes::{Node, NodeMath, NodeValue};

/// Turn every paragraph that holds nothing but one `$$…$$` span into a
/// display math block.  Returns the number of paragraphs promoted.
pub fn promote_display<'a>(root: Node<'a>) -> usize {
    let paragraphs: Vec<Node<'a>> = root
        .descendants()
        .filter(|n| matches!(n.data().value, NodeValue::Paragraph))
        .collect();

    let mut promoted = 0;
    for para in paragraphs {
        let Some(only) = para.first_child().filter(|c| c.next_sibling().is_none()) else {
            continue;
        };

        let literal = match only.data().value {
            NodeValue::Math(ref m) if m.display_math && !m.block => m.literal.clone(),
            _ => continue,
        };

        only.detach();
        para.data_mut().value = NodeValue::Math(NodeMath {
            display_math: true,
            block: true,
            literal,
        });
        promoted += 1;
    }
    promoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Arena;
    use crate::{parse_document, Options};

    #[test]
    fn only_lone_display_spans() {
        let arena = Arena::new();
        let root = parse_document(
            &arena,
            "$$x^2$$\n\nsee $$y$$\n\n$z$\n",
            &Options::default(),
        );
        assert_eq!(promote_display(root), 1);

        let first = root.first_child().unwrap();
        assert_eq!(
            first.data().value,
            NodeValue::Math(NodeMath {
                display_math: true,
                block: true,
                literal: "x^2".to_string(),
            })
        );
        assert!(first.first_child().is_none());
    }
}
