//! HTML output: the transformer from the document AST to an [`HtmlNode`]
//! tree, and serialization of that tree to a string.

mod context;
mod transform;

pub use self::context::Context;
pub use self::transform::{normalize_language, Rule, Transformer, IFRAME_SANDBOX};

use crate::hast::{HtmlNode, VOID_ELEMENTS};

/// Tags that start on a line of their own and are followed by a newline.
const BLOCK_TAGS: [&str; 29] = [
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "iframe", "li", "ol", "p",
    "pre", "section", "table", "tbody", "td", "th", "thead",
];

fn is_block(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag) || tag == "tr" || tag == "ul"
}

const fn href_safe_table() -> [bool; 256] {
    let safe = b"-_.+!*(),%#@?=;:/,+$~abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut a = [false; 256];
    let mut i = 0;
    while i < safe.len() {
        a[safe[i] as usize] = true;
        i += 1;
    }
    a
}

static HREF_SAFE: [bool; 256] = href_safe_table();

enum Step<'h> {
    Node(&'h HtmlNode),
    Close(&'h str),
}

struct Formatter {
    out: String,
    in_pre: usize,
}

impl Formatter {
    fn cr(&mut self) {
        if self.in_pre == 0 && !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn open(&mut self, tag: &str, attributes: &std::collections::BTreeMap<String, String>) {
        if is_block(tag) {
            self.cr();
        }
        self.out.push('<');
        self.out.push_str(tag);
        for (name, value) in attributes {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            if is_url_attribute(name) {
                escape_href(&mut self.out, value);
            } else {
                escape(&mut self.out, value);
            }
            self.out.push('"');
        }
        if VOID_ELEMENTS.contains(&tag) {
            self.out.push_str(" />");
            if is_block(tag) {
                self.out.push('\n');
            }
        } else {
            self.out.push('>');
            if tag == "pre" {
                self.in_pre += 1;
            }
        }
    }

    fn close(&mut self, tag: &str) {
        if tag == "pre" {
            self.in_pre = self.in_pre.saturating_sub(1);
        }
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
        if is_block(tag) && self.in_pre == 0 {
            self.out.push('\n');
        }
    }
}

pub(crate) fn is_url_attribute(name: &str) -> bool {
    matches!(name, "href" | "src")
}

/// Serialize an HTML tree.  Text and attribute values are always escaped.
///
/// ```rust
/// # use zmark::hast::HtmlNode;
/// # use zmark::html::format_document;
/// let tree = HtmlNode::bare("p", vec![HtmlNode::text("1 < 2")]);
/// assert_eq!(format_document(&tree), "<p>1 &lt; 2</p>\n");
/// ```
pub fn format_document(root: &HtmlNode) -> String {
    let mut f = Formatter {
        out: String::new(),
        in_pre: 0,
    };
    let mut stack = vec![Step::Node(root)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Close(tag) => f.close(tag),
            Step::Node(HtmlNode::Text(text)) => {
                // a line end right after a block boundary is already written
                if text != "\n" || f.in_pre > 0 || !(f.out.is_empty() || f.out.ends_with('\n')) {
                    escape(&mut f.out, text);
                }
            }
            Step::Node(HtmlNode::Fragment(children)) => {
                stack.extend(children.iter().rev().map(Step::Node));
            }
            Step::Node(HtmlNode::Element {
                tag,
                attributes,
                children,
            }) => {
                f.open(tag, attributes);
                if !VOID_ELEMENTS.contains(&tag.as_str()) {
                    stack.push(Step::Close(tag));
                    stack.extend(children.iter().rev().map(Step::Node));
                }
            }
        }
    }

    f.out
}

/// Write `buffer` to `output`, escaping HTML special characters.
pub fn escape(output: &mut String, buffer: &str) {
    let mut last = 0;
    for (i, b) in buffer.bytes().enumerate() {
        let esc = match b {
            b'"' => "&quot;",
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            _ => continue,
        };
        output.push_str(&buffer[last..i]);
        output.push_str(esc);
        last = i + 1;
    }
    output.push_str(&buffer[last..]);
}

/// Write a URL to `output`, percent-encoding anything outside the set of
/// characters that are safe in an attribute.
pub fn escape_href(output: &mut String, buffer: &str) {
    let src = buffer.as_bytes();
    let size = src.len();
    let mut i = 0;

    while i < size {
        let org = i;
        while i < size && HREF_SAFE[src[i] as usize] {
            i += 1;
        }

        if i > org {
            output.push_str(&buffer[org..i]);
        }

        if i >= size {
            break;
        }

        match src[i] {
            b'&' => output.push_str("&amp;"),
            b'\'' => output.push_str("&#x27;"),
            c => output.push_str(&format!("%{:02X}", c)),
        }

        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_get_newlines() {
        let tree = HtmlNode::Fragment(vec![
            HtmlNode::bare(
                "ul",
                vec![
                    HtmlNode::bare("li", vec![HtmlNode::text("a")]),
                    HtmlNode::bare("li", vec![HtmlNode::text("b")]),
                ],
            ),
            HtmlNode::bare("hr", vec![]),
            HtmlNode::bare(
                "pre",
                vec![HtmlNode::bare("code", vec![HtmlNode::text("x\n")])],
            ),
        ]);
        assert_eq!(
            format_document(&tree),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n<hr />\n<pre><code>x\n</code></pre>\n"
        );
    }

    #[test]
    fn attributes_are_sorted_and_escaped() {
        let tree = HtmlNode::element(
            "a",
            [
                ("title", "\"quoted\"".to_string()),
                ("href", "/a b?x=1&y='2'".to_string()),
            ],
            vec![HtmlNode::text("é")],
        );
        assert_eq!(
            format_document(&tree),
            "<a href=\"/a%20b?x=1&amp;y=&#x27;2&#x27;\" title=\"&quot;quoted&quot;\">é</a>"
        );
    }
}
