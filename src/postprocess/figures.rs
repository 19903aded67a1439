//! Figure promotion.
//!
//! A paragraph holding a single image becomes a figure.  The caption is
//! taken from a `Figure:` line, either right below the image in the same
//! paragraph or as the whole of the next paragraph, and otherwise from the
//! image's alt text.

use crate::arena_tree;
use crate::nodes::{collect_text, make_node, Arena, Node, NodeValue};

const CAPTION_MARKER: &str = "Figure:";

/// Promote every eligible paragraph.  Returns the number of figures made.
pub fn promote<'a>(arena: &'a Arena<'a>, root: Node<'a>) -> usize {
    let paragraphs: Vec<Node<'a>> = root
        .descendants()
        .filter(|n| matches!(n.data().value, NodeValue::Paragraph))
        .collect();

    let mut promoted = 0;
    for para in paragraphs {
        // An earlier promotion may have consumed this paragraph as a caption.
        if para.parent().is_none() {
            continue;
        }
        if promote_one(arena, para) {
            promoted += 1;
        }
    }
    promoted
}

fn is_image(node: Node<'_>) -> bool {
    matches!(node.data().value, NodeValue::Image(..))
}

fn is_break(node: Node<'_>) -> bool {
    matches!(
        node.data().value,
        NodeValue::SoftBreak | NodeValue::LineBreak
    )
}

/// Whether the inlines starting at `first` open with the caption marker.
fn starts_caption(first: Option<Node<'_>>) -> bool {
    first.map_or(false, |n| {
        n.data()
            .value
            .text()
            .map_or(false, |t| t.starts_with(CAPTION_MARKER))
    })
}

fn promote_one<'a>(arena: &'a Arena<'a>, para: Node<'a>) -> bool {
    let Some(image) = para.first_child().filter(|&n| is_image(n)) else {
        return false;
    };
    let line = para.data().line;

    let caption = match image.next_sibling() {
        // `![alt](src)` alone in its paragraph
        None => {
            let next = para
                .next_sibling()
                .filter(|n| matches!(n.data().value, NodeValue::Paragraph))
                .filter(|n| starts_caption(n.first_child()));
            match next {
                Some(next) => {
                    let caption = take_caption(arena, next.first_child(), line);
                    next.detach();
                    caption
                }
                None => {
                    if collect_text(image).trim().is_empty() {
                        return false;
                    }
                    Some(copy_alt(arena, image, line))
                }
            }
        }
        // `![alt](src)` followed by a `Figure:` line
        Some(br) if is_break(br) && starts_caption(br.next_sibling()) => {
            let first = br.next_sibling();
            br.detach();
            take_caption(arena, first, line)
        }
        Some(_) => return false,
    };

    let figure = make_node(arena, NodeValue::Figure, line);
    figure.data_mut().open = false;
    para.insert_before(figure);
    figure.append(image);
    if let Some(caption) = caption {
        figure.append(caption);
    }
    para.detach();
    true
}

/// Move `first` and its following siblings into a caption, dropping the
/// marker.  Returns `None` when nothing but the marker was written.
fn take_caption<'a>(arena: &'a Arena<'a>, first: Option<Node<'a>>, line: usize) -> Option<Node<'a>> {
    let first = first?;
    let rest = first.next_sibling();

    let mut remainder = String::new();
    if let Some(t) = first.data().value.text() {
        remainder = t[CAPTION_MARKER.len()..].trim_start().to_string();
    }

    let caption = make_node(arena, NodeValue::FigureCaption, line);
    caption.data_mut().open = false;

    if remainder.is_empty() {
        first.detach();
    } else {
        first.data_mut().value = NodeValue::Text(remainder);
        caption.append(first);
    }

    let mut next = rest;
    while let Some(n) = next {
        next = n.next_sibling();
        caption.append(n);
    }

    if caption.first_child().is_none() {
        None
    } else {
        Some(caption)
    }
}

/// A caption holding a copy of the image's alt inlines.
fn copy_alt<'a>(arena: &'a Arena<'a>, image: Node<'a>, line: usize) -> Node<'a> {
    let caption = make_node(arena, NodeValue::FigureCaption, line);
    caption.data_mut().open = false;

    let mut stack: Vec<(Node<'a>, Node<'a>)> =
        image.reverse_children().map(|c| (c, caption)).collect();
    while let Some((source, parent)) = stack.pop() {
        let copy: Node<'a> = arena.alloc(arena_tree::Node::new(source.data.clone()));
        parent.append(copy);
        stack.extend(source.reverse_children().map(|c| (c, copy)));
    }

    caption
}
