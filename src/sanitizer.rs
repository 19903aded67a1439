//! The last pass before serialization: only allow-listed tags, attributes
//! and URL schemes make it into the output.
//!
//! Disallowed elements are unwrapped, their children taking their place.
//! `script` and `style` go with their content.  Frames survive only when
//! they point at a trusted embed provider.

use std::collections::BTreeMap;

use crate::error::Diagnostic;
use crate::hast::HtmlNode;
use crate::html::{is_url_attribute, IFRAME_SANDBOX};
use crate::postprocess::embeds;

const ALLOWED_TAGS: [&str; 51] = [
    "a", "abbr", "b", "blockquote", "br", "code", "dd", "del", "details", "div", "dl", "dt", "em",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "iframe", "img", "ins",
    "kbd", "li", "mark", "ol", "p", "pre", "q", "s", "section", "small", "span", "strong", "sub",
    "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "u", "ul", "var",
];

/// Elements dropped along with everything inside them.
const DROPPED_WITH_CONTENT: [&str; 2] = ["script", "style"];

const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

fn allowed_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["class", "href", "id", "title"],
        "img" => &["alt", "class", "height", "src", "title", "width"],
        "iframe" => &["allowfullscreen", "class", "sandbox", "src"],
        "ol" => &["start"],
        "li" => &["id"],
        "td" | "th" => &["align", "colspan", "rowspan"],
        "code" | "div" | "pre" | "section" | "span" => &["class"],
        "sup" => &["class", "id"],
        "abbr" => &["title"],
        "details" => &["open"],
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => &["id"],
        _ => &[],
    }
}

/// Whether `url` may be linked to: `http`, `https` and `mailto` URLs and
/// relative references.  Control characters and whitespace are removed and
/// case is folded before the scheme is read.
///
/// ```rust
/// # use zmark::sanitizer::is_safe_url;
/// assert!(is_safe_url("https://example.com/"));
/// assert!(is_safe_url("../docs?a=b:c"));
/// assert!(!is_safe_url(" JaVa\tScRiPt:alert(1)"));
/// assert!(!is_safe_url("data:text/html,hi"));
/// ```
pub fn is_safe_url(url: &str) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_control() && !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    match cleaned.find([':', '/', '?', '#']) {
        Some(i) if cleaned.as_bytes()[i] == b':' => SAFE_SCHEMES.contains(&&cleaned[..i]),
        _ => true,
    }
}

/// Strip everything not on the allow-lists from `root`, recording one
/// diagnostic per removal.  Sanitizing the result again changes nothing.
///
/// ```rust
/// # use zmark::hast::parse_fragment;
/// # use zmark::html::format_document;
/// # use zmark::sanitizer::sanitize;
/// let mut messages = vec![];
/// let clean = sanitize(
///     parse_fragment("<p onclick=\"x()\"><blink>hi</blink></p>"),
///     &mut messages,
/// );
/// assert_eq!(format_document(&clean), "<p>hi</p>\n");
/// assert_eq!(messages.len(), 2);
/// ```
pub fn sanitize(root: HtmlNode, messages: &mut Vec<Diagnostic>) -> HtmlNode {
    let mut out = sanitize_node(root, messages);
    if out.len() == 1 {
        if let Some(node) = out.pop() {
            return node;
        }
    }
    HtmlNode::Fragment(out)
}

fn sanitize_children(children: Vec<HtmlNode>, messages: &mut Vec<Diagnostic>) -> Vec<HtmlNode> {
    children
        .into_iter()
        .flat_map(|child| sanitize_node(child, messages))
        .collect()
}

fn sanitize_node(node: HtmlNode, messages: &mut Vec<Diagnostic>) -> Vec<HtmlNode> {
    let (tag, attributes, children) = match node {
        HtmlNode::Text(_) => return vec![node],
        HtmlNode::Fragment(children) => {
            return vec![HtmlNode::Fragment(sanitize_children(children, messages))]
        }
        HtmlNode::Element {
            tag,
            attributes,
            children,
        } => (tag, attributes, children),
    };

    if DROPPED_WITH_CONTENT.contains(&tag.as_str()) {
        messages.push(Diagnostic::sanitized(format!(
            "removed <{}> element and its content",
            tag
        )));
        return vec![];
    }

    if !ALLOWED_TAGS.contains(&tag.as_str()) {
        messages.push(Diagnostic::sanitized(format!("removed <{}> element", tag)));
        return sanitize_children(children, messages);
    }

    let attributes = sanitize_attributes(&tag, attributes, messages);
    let children = sanitize_children(children, messages);

    if tag == "iframe" {
        return sanitize_iframe(attributes, children, messages);
    }

    vec![HtmlNode::Element {
        tag,
        attributes,
        children,
    }]
}

fn sanitize_attributes(
    tag: &str,
    attributes: BTreeMap<String, String>,
    messages: &mut Vec<Diagnostic>,
) -> BTreeMap<String, String> {
    let allowed = allowed_attributes(tag);
    attributes
        .into_iter()
        .filter(|(name, value)| {
            if !allowed.contains(&name.as_str()) {
                messages.push(Diagnostic::sanitized(format!(
                    "removed {} attribute from <{}>",
                    name, tag
                )));
                false
            } else if is_url_attribute(name) && !is_safe_url(value) {
                messages.push(Diagnostic::sanitized(format!(
                    "removed unsafe {} from <{}>",
                    name, tag
                )));
                false
            } else {
                true
            }
        })
        .collect()
}

fn sanitize_iframe(
    mut attributes: BTreeMap<String, String>,
    children: Vec<HtmlNode>,
    messages: &mut Vec<Diagnostic>,
) -> Vec<HtmlNode> {
    let src = attributes.get("src").cloned().unwrap_or_default();

    if embeds::is_trusted_src(&src) {
        if attributes.get("sandbox").map(String::as_str) != Some(IFRAME_SANDBOX) {
            messages.push(Diagnostic::sanitized("sandboxed embedded frame"));
            attributes.insert("sandbox".to_string(), IFRAME_SANDBOX.to_string());
        }
        return vec![HtmlNode::Element {
            tag: "iframe".to_string(),
            attributes,
            children,
        }];
    }

    if src.is_empty() {
        messages.push(Diagnostic::sanitized("removed <iframe> element"));
        return children;
    }

    messages.push(Diagnostic::sanitized(format!(
        "replaced frame from untrusted source {} with a link",
        src
    )));
    vec![HtmlNode::element(
        "a",
        [("href", src.clone())],
        vec![HtmlNode::text(src)],
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use crate::hast::parse_fragment;
    use crate::html::format_document;

    fn clean(html: &str) -> (String, Vec<Diagnostic>) {
        let mut messages = vec![];
        let node = sanitize(parse_fragment(html), &mut messages);
        (format_document(&node), messages)
    }

    #[test]
    fn unwraps_unknown_tags() {
        let (html, messages) = clean("<p><font color=red>a <b>b</b></font></p>");
        assert_eq!(html, "<p>a <b>b</b></p>\n");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, DiagnosticKind::SanitizedContent);
    }

    #[test]
    fn drops_scripts_with_content() {
        let (html, messages) = clean("<p>a<script>alert(1)</script>b</p>");
        assert_eq!(html, "<p>ab</p>\n");
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn unsafe_urls() {
        let (html, messages) = clean(
            "<a href=\"jav&#x09;ascript:alert(1)\">x</a><img src=\"data:image/png,x\" alt=\"y\">",
        );
        assert_eq!(html, "<a>x</a><img alt=\"y\" />");
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn safe_urls() {
        for url in [
            "http://a.b",
            "HTTPS://a.b",
            "mailto:a@b.c",
            "/x:y",
            "#top",
            "?q=a:b",
            "rel/path",
        ] {
            assert!(is_safe_url(url), "{}", url);
        }
        for url in ["javascript:x", "vbscript:x", "data:x", ":x", "java\u{0}script:x"] {
            assert!(!is_safe_url(url), "{}", url);
        }
    }

    #[test]
    fn frames() {
        let (html, messages) =
            clean("<iframe src=\"https://www.youtube.com/embed/abc\"></iframe>");
        assert_eq!(
            html,
            "<iframe sandbox=\"allow-scripts allow-same-origin allow-popups allow-presentation\" src=\"https://www.youtube.com/embed/abc\"></iframe>\n"
        );
        assert_eq!(messages.len(), 1);

        let (html, _) = clean("<iframe src=\"https://evil.example/x\"></iframe>");
        assert_eq!(
            html,
            "<a href=\"https://evil.example/x\">https://evil.example/x</a>"
        );

        let (html, messages) = clean("<iframe src=\"javascript:x\">fallback</iframe>");
        assert_eq!(html, "fallback");
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn idempotent() {
        let dirty = parse_fragment(
            "<div onclick=x><iframe src=\"https://vimeo.com/1\"></iframe>\
             <a href=\"javascript:x\" class=ping>a</a><x-y><style>p{}</style>\
             <span class=\"k\">k</span></x-y></div>",
        );
        let mut messages = vec![];
        let once = sanitize(dirty, &mut messages);
        assert!(!messages.is_empty());

        let mut again = vec![];
        let twice = sanitize(once.clone(), &mut again);
        assert_eq!(once, twice);
        assert!(again.is_empty());
    }
}
