//! Smileys: whitespace-delimited runs such as `:)` or `^(;,;)^` in text
//! become small images.

use crate::nodes::{make_node, Arena, Node, NodeSmiley, NodeValue};

/// Every recognised smiley and the image it is shown with.
pub static SMILEYS: [(&str, &str); 31] = [
    (":ange:", "ange.png"),
    (":colere:", "angry.gif"),
    ("o_O", "blink.gif"),
    (";)", "clin.png"),
    (":B", "b.png"),
    (":diable:", "diable.png"),
    (":D", "heureux.png"),
    ("^^", "hihi.png"),
    (":o", "huh.png"),
    (":p", "langue.png"),
    (":magicien:", "magicien.png"),
    (":colere2:", "mechant.png"),
    (":ninja:", "ninja.png"),
    ("x(", "pinch.png"),
    ("X/", "pinch.png"),
    (">_<", "pinch.png"),
    (":pirate:", "pirate.png"),
    (":'(", "pleure.png"),
    (":lol:", "rire.gif"),
    (":honte:", "rouge.png"),
    (":-°", "siffle.png"),
    (":)", "smile.png"),
    (":soleil:", "soleil.png"),
    (":(", "triste.png"),
    (":euh:", "unsure.gif"),
    (":waw:", "waw.png"),
    (":zorro:", "zorro.png"),
    ("^(;,;)^", "cthulhu.png"),
    (":popcorn:", "popcorn.gif"),
    (":bounce:", "bounce.gif"),
    (":nage:", "nage.gif"),
];

/// The image for `code`, if it is a smiley.
pub fn lookup(code: &str) -> Option<&'static str> {
    SMILEYS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|&(_, image)| image)
}

/// Split every text node around the smileys it holds.  Text inside image
/// alt text is left alone.  Returns the number of smileys found.
pub fn apply<'a>(arena: &'a Arena<'a>, root: Node<'a>) -> usize {
    let texts: Vec<Node<'a>> = root
        .descendants()
        .filter(|n| matches!(n.data().value, NodeValue::Text(..)))
        .filter(|n| {
            !n.ancestors()
                .any(|a| matches!(a.data().value, NodeValue::Image(..)))
        })
        .collect();

    let mut found = 0;
    for node in texts {
        let (text, line) = {
            let ast = node.data();
            let Some(text) = ast.value.text() else {
                continue;
            };
            (text.to_string(), ast.line)
        };
        let pieces = split(&text);
        if !pieces.iter().any(|p| matches!(p, Piece::Smiley(..))) {
            continue;
        }

        for piece in pieces {
            let value = match piece {
                Piece::Text(text) => NodeValue::Text(text.to_string()),
                Piece::Smiley(code, image) => {
                    found += 1;
                    NodeValue::Smiley(NodeSmiley {
                        code: code.to_string(),
                        image: image.to_string(),
                    })
                }
            };
            let inl = make_node(arena, value, line);
            inl.data_mut().open = false;
            node.insert_before(inl);
        }
        node.detach();
    }
    found
}

enum Piece<'t> {
    Text(&'t str),
    Smiley(&'t str, &'static str),
}

fn split(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = vec![];
    let mut start = 0;
    let mut word_start = None;

    let ends = text.char_indices().chain(std::iter::once((text.len(), ' ')));
    for (i, c) in ends {
        match (c.is_whitespace(), word_start) {
            (false, None) => word_start = Some(i),
            (true, Some(from)) => {
                word_start = None;
                let word = &text[from..i];
                if let Some(image) = lookup(word) {
                    if start < from {
                        pieces.push(Piece::Text(&text[start..from]));
                    }
                    pieces.push(Piece::Smiley(word, image));
                    start = i;
                }
            }
            _ => {}
        }
    }

    if start < text.len() {
        pieces.push(Piece::Text(&text[start..]));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(text: &str) -> Vec<String> {
        split(text)
            .into_iter()
            .map(|p| match p {
                Piece::Text(t) => t.to_string(),
                Piece::Smiley(code, _) => format!("<{}>", code),
            })
            .collect()
    }

    #[test]
    fn words_split_on_whitespace() {
        assert_eq!(codes("This is funny >_<"), ["This is funny ", "<>_<>"]);
        assert_eq!(codes(":) and :("), ["<:)>", " and ", "<:(>"]);
        assert_eq!(codes("a:)b (:)) ^^"), ["a:)b (:)) ", "<^^>"]);
        assert_eq!(codes("no smileys"), ["no smileys"]);
    }

    #[test]
    fn multibyte_whitespace_keeps_offsets() {
        assert_eq!(codes("x\u{a0}:)"), ["x\u{a0}", "<:)>"]);
    }
}
