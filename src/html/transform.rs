//! The rule table mapping each AST node kind to HTML.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};

use crate::error::{Error, Result};
use crate::hast::{parse_fragment, HtmlNode, MAX_FRAGMENT_DEPTH, VOID_ELEMENTS};
use crate::html::Context;
use crate::nodes::{collect_text, ListType, Node, NodeKind, NodeValue};
use crate::scanners::{self, HtmlFlags};

/// A transform rule: builds the HTML for one node, usually by asking the
/// transformer for the HTML of the node's children.
pub type Rule = for<'a> fn(&Transformer, &Context<'_, '_>, Node<'a>) -> Result<HtmlNode>;

/// Sandbox applied to every embedded frame.
pub const IFRAME_SANDBOX: &str = "allow-scripts allow-same-origin allow-popups allow-presentation";

/// Languages whose code blocks are never highlighted.
const PLAIN_LANGUAGES: [&str; 4] = ["console", "plain", "text", "txt"];

/// Maps node kinds to the rules that render them.
///
/// ```rust
/// # use zmark::html::{Context, Transformer};
/// # use zmark::nodes::NodeKind;
/// # use zmark::{parse_document, Arena, Error, Options, Registry};
/// # use zmark::options::Plugins;
/// let arena = Arena::new();
/// let options = Options::default();
/// let plugins = Plugins::default();
/// let registry = Registry::default();
/// let root = parse_document(&arena, "*hi*", &options);
///
/// let mut transformer = Transformer::new();
/// transformer.unregister(NodeKind::Emph);
/// let ctx = Context::new(&options, &plugins, &registry);
/// assert_eq!(
///     transformer.transform(&ctx, root),
///     Err(Error::UnsupportedNode { kind: NodeKind::Emph })
/// );
/// ```
#[derive(Clone)]
pub struct Transformer {
    rules: FxHashMap<NodeKind, Rule>,
}

impl Debug for Transformer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.rules.keys().collect();
        kinds.sort();
        f.debug_struct("Transformer").field("rules", &kinds).finish()
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Transformer::new()
    }
}

impl Transformer {
    /// A transformer with a rule for every node kind.
    pub fn new() -> Self {
        let mut t = Transformer::empty();
        for kind in NodeKind::ALL {
            t.register(kind, builtin(kind));
        }
        t
    }

    /// A transformer without any rules.
    pub fn empty() -> Self {
        Transformer {
            rules: FxHashMap::default(),
        }
    }

    /// Set the rule for `kind`, returning the rule it replaces.
    pub fn register(&mut self, kind: NodeKind, rule: Rule) -> Option<Rule> {
        self.rules.insert(kind, rule)
    }

    /// Remove the rule for `kind`.
    pub fn unregister(&mut self, kind: NodeKind) -> Option<Rule> {
        self.rules.remove(&kind)
    }

    /// Whether `kind` has a rule.
    pub fn handles(&self, kind: NodeKind) -> bool {
        self.rules.contains_key(&kind)
    }

    /// Render `node` and everything below it.
    pub fn transform<'a>(&self, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
        let kind = node.kind();
        let rule = self
            .rules
            .get(&kind)
            .ok_or(Error::UnsupportedNode { kind })?;
        rule(self, ctx, node)
    }

    /// Render the children of `node`.
    ///
    /// Inline raw HTML arrives one tag at a time; an opening tag and its
    /// closing tag among the same siblings wrap whatever lies between them.
    pub fn children<'a>(&self, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<Vec<HtmlNode>> {
        let mut out = vec![];
        let mut open: Vec<(String, BTreeMap<String, String>, Vec<HtmlNode>)> = vec![];

        for child in node.children() {
            let literal = match child.data().value {
                NodeValue::Html(ref html) if !html.block => Some(html.literal.clone()),
                _ => None,
            };

            if let Some(literal) = literal.filter(|_| self.handles(NodeKind::Html)) {
                match split_tag(&literal) {
                    InlineTag::Open(tag, attributes) if open.len() < MAX_FRAGMENT_DEPTH => {
                        open.push((tag, attributes, vec![]));
                        continue;
                    }
                    InlineTag::Close(tag) => {
                        if let Some(pos) = open.iter().rposition(|(t, ..)| *t == tag) {
                            while open.len() > pos {
                                if let Some((tag, attributes, children)) = open.pop() {
                                    let element = HtmlNode::Element {
                                        tag,
                                        attributes,
                                        children,
                                    };
                                    match open.last_mut() {
                                        Some((.., siblings)) => siblings.push(element),
                                        None => out.push(element),
                                    }
                                }
                            }
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            let html = self.transform(ctx, child)?;
            match open.last_mut() {
                Some((.., siblings)) => siblings.push(html),
                None => out.push(html),
            }
        }

        while let Some((tag, attributes, children)) = open.pop() {
            let element = HtmlNode::Element {
                tag,
                attributes,
                children,
            };
            match open.last_mut() {
                Some((.., siblings)) => siblings.push(element),
                None => out.push(element),
            }
        }

        Ok(out)
    }
}

enum InlineTag {
    Open(String, BTreeMap<String, String>),
    Close(String),
    Other,
}

fn split_tag(literal: &str) -> InlineTag {
    let Some(rest) = literal.strip_prefix('<') else {
        return InlineTag::Other;
    };

    if scanners::closing_tag(rest.as_bytes()) == Some(rest.len()) {
        let name = rest[1..].trim_end_matches('>').trim().to_ascii_lowercase();
        return InlineTag::Close(name);
    }

    if scanners::open_tag(rest.as_bytes(), &mut HtmlFlags::default()) == Some(rest.len()) && !rest.ends_with("/>") {
        if let HtmlNode::Fragment(mut nodes) = parse_fragment(literal) {
            if let Some(HtmlNode::Element {
                tag, attributes, ..
            }) = nodes.pop()
            {
                if !VOID_ELEMENTS.contains(&tag.as_str()) {
                    return InlineTag::Open(tag, attributes);
                }
            }
        }
    }

    InlineTag::Other
}

fn builtin(kind: NodeKind) -> Rule {
    match kind {
        NodeKind::Document => render_document,
        NodeKind::BlockQuote => render_block_quote,
        NodeKind::List => render_list,
        NodeKind::Item => render_item,
        NodeKind::CodeBlock => render_code_block,
        NodeKind::Html => render_html,
        NodeKind::Paragraph => render_paragraph,
        NodeKind::Heading => render_heading,
        NodeKind::ThematicBreak => render_thematic_break,
        NodeKind::FootnoteDefinition => render_footnote_definition,
        NodeKind::Table => render_table,
        NodeKind::TableRow => render_table_row,
        NodeKind::TableCell => render_table_cell,
        NodeKind::Figure => render_figure,
        NodeKind::FigureCaption => render_figure_caption,
        NodeKind::Text => render_text,
        NodeKind::SoftBreak => render_soft_break,
        NodeKind::LineBreak => render_line_break,
        NodeKind::Code => render_code,
        NodeKind::Emph => render_emph,
        NodeKind::Strong => render_strong,
        NodeKind::Link => render_link,
        NodeKind::Image => render_image,
        NodeKind::FootnoteReference => render_footnote_reference,
        NodeKind::Mention => render_mention,
        NodeKind::Embed => render_embed,
        NodeKind::Math => render_math,
        NodeKind::Smiley => render_smiley,
    }
}

fn wrap<'a>(t: &Transformer, ctx: &Context<'_, '_>, node: Node<'a>, tag: &str) -> Result<HtmlNode> {
    Ok(HtmlNode::bare(tag, t.children(ctx, node)?))
}

macro_rules! wrapping_rules {
    ($($name:ident => $tag:expr),* $(,)?) => {
        $(
            fn $name<'a>(t: &Transformer, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
                wrap(t, ctx, node, $tag)
            }
        )*
    };
}

wrapping_rules! {
    render_block_quote => "blockquote",
    render_item => "li",
    render_table_row => "tr",
    render_figure => "figure",
    render_figure_caption => "figcaption",
    render_emph => "em",
    render_strong => "strong",
}

fn render_thematic_break<'a>(_: &Transformer, _: &Context<'_, '_>, _: Node<'a>) -> Result<HtmlNode> {
    Ok(HtmlNode::bare("hr", vec![]))
}

fn render_text<'a>(_: &Transformer, _: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    Ok(HtmlNode::text(
        node.data().value.text().cloned().unwrap_or_default(),
    ))
}

fn render_soft_break<'a>(_: &Transformer, _: &Context<'_, '_>, _: Node<'a>) -> Result<HtmlNode> {
    Ok(HtmlNode::text("\n"))
}

fn render_line_break<'a>(_: &Transformer, _: &Context<'_, '_>, _: Node<'a>) -> Result<HtmlNode> {
    Ok(HtmlNode::Fragment(vec![
        HtmlNode::bare("br", vec![]),
        HtmlNode::text("\n"),
    ]))
}

fn render_document<'a>(t: &Transformer, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let mut body = vec![];
    let mut footnotes = vec![];

    for child in node.children() {
        let html = t.transform(ctx, child)?;
        if matches!(child.data().value, NodeValue::FootnoteDefinition(..)) {
            footnotes.push(html);
        } else {
            body.push(html);
        }
    }

    if !footnotes.is_empty() {
        body.push(HtmlNode::element(
            "section",
            [("class", "footnotes".to_string())],
            vec![HtmlNode::bare("ol", footnotes)],
        ));
    }

    Ok(HtmlNode::Fragment(body))
}

fn render_list<'a>(t: &Transformer, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let list = match node.data().value {
        NodeValue::List(list) => list,
        _ => return wrap(t, ctx, node, "ul"),
    };
    let children = t.children(ctx, node)?;

    Ok(match list.list_type {
        ListType::Bullet => HtmlNode::bare("ul", children),
        ListType::Ordered if list.start == 1 => HtmlNode::bare("ol", children),
        ListType::Ordered => {
            HtmlNode::element("ol", [("start", list.start.to_string())], children)
        }
    })
}

fn render_paragraph<'a>(t: &Transformer, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let tight = node
        .parent()
        .and_then(|n| n.parent())
        .map_or(false, |n| match n.data().value {
            NodeValue::List(ref nl) => nl.tight,
            _ => false,
        });

    let children = t.children(ctx, node)?;
    if tight {
        Ok(HtmlNode::Fragment(children))
    } else {
        Ok(HtmlNode::bare("p", children))
    }
}

fn render_heading<'a>(t: &Transformer, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let level = match node.data().value {
        NodeValue::Heading(ref nh) => nh.level.clamp(1, 6),
        _ => 1,
    };
    wrap(t, ctx, node, &format!("h{}", level))
}

/// The name the highlighter knows a language by, or `None` when the block
/// must not be highlighted.
pub fn normalize_language(lang: &str) -> Option<String> {
    let lang = lang.to_lowercase();
    if PLAIN_LANGUAGES.contains(&lang.as_str()) {
        return None;
    }
    Some(
        match lang.as_str() {
            "latex" => "tex",
            "js" => "javascript",
            "ts" => "typescript",
            "py" => "python",
            "rb" => "ruby",
            "sh" | "shell" | "zsh" => "bash",
            "c++" => "cpp",
            "yml" => "yaml",
            "md" => "markdown",
            other => other,
        }
        .to_string(),
    )
}

fn render_code_block<'a>(
    _: &Transformer,
    ctx: &Context<'_, '_>,
    node: Node<'a>,
) -> Result<HtmlNode> {
    let (lang, literal) = match node.data().value {
        NodeValue::CodeBlock(ref ncb) => (ncb.language().map(str::to_string), ncb.literal.clone()),
        _ => (None, String::new()),
    };

    let highlighted = match (ctx.plugins.render.codefence_syntax_highlighter, &lang) {
        (Some(highlighter), Some(lang)) if ctx.highlighting() => normalize_language(lang)
            .map(|normalized| highlighter.highlight(&literal, Some(normalized.as_str()))),
        _ => None,
    };

    let code_children = match highlighted {
        Some(html) => match parse_fragment(&html) {
            HtmlNode::Fragment(nodes) => nodes,
            other => vec![other],
        },
        None => vec![HtmlNode::text(literal)],
    };

    let code = match lang {
        Some(lang) => HtmlNode::element(
            "code",
            [("class", format!("language-{}", lang))],
            code_children,
        ),
        None => HtmlNode::bare("code", code_children),
    };

    Ok(HtmlNode::bare("pre", vec![code]))
}

fn render_html<'a>(_: &Transformer, _: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let (literal, block) = match node.data().value {
        NodeValue::Html(ref html) => (html.literal.clone(), html.block),
        _ => return Ok(HtmlNode::Fragment(vec![])),
    };
    if !block {
        return Ok(parse_fragment(&literal));
    }

    let mut nodes = match parse_fragment(literal.trim_end_matches(['\r', '\n'])) {
        HtmlNode::Fragment(nodes) => nodes,
        other => vec![other],
    };
    if !nodes.is_empty() {
        nodes.push(HtmlNode::text("\n"));
    }
    Ok(HtmlNode::Fragment(nodes))
}

fn render_footnote_definition<'a>(
    t: &Transformer,
    ctx: &Context<'_, '_>,
    node: Node<'a>,
) -> Result<HtmlNode> {
    let (ix, total) = match node.data().value {
        NodeValue::FootnoteDefinition(ref nfd) => (nfd.ix, nfd.total_references),
        _ => (0, 0),
    };

    let mut backrefs = vec![];
    for ref_num in 1..=total.max(1) {
        let href = if ref_num == 1 {
            format!("#fnref-{}", ix)
        } else {
            format!("#fnref-{}-{}", ix, ref_num)
        };
        backrefs.push(HtmlNode::text(" "));
        backrefs.push(HtmlNode::element(
            "a",
            [
                ("class", "footnote-backref".to_string()),
                ("href", href),
            ],
            vec![HtmlNode::text("↩")],
        ));
    }

    let mut children = t.children(ctx, node)?;
    match children.last_mut() {
        Some(HtmlNode::Element { tag, children, .. }) if tag.as_str() == "p" => {
            children.extend(backrefs)
        }
        _ => {
            backrefs.remove(0);
            children.extend(backrefs);
        }
    }

    Ok(HtmlNode::element("li", [("id", format!("fn-{}", ix))], children))
}

fn render_table<'a>(t: &Transformer, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let mut head = vec![];
    let mut body = vec![];
    for row in node.children() {
        let header = matches!(row.data().value, NodeValue::TableRow(true));
        let html = t.transform(ctx, row)?;
        if header {
            head.push(html);
        } else {
            body.push(html);
        }
    }

    let mut children = vec![HtmlNode::bare("thead", head)];
    if !body.is_empty() {
        children.push(HtmlNode::bare("tbody", body));
    }
    Ok(HtmlNode::bare("table", children))
}

fn render_table_cell<'a>(
    t: &Transformer,
    ctx: &Context<'_, '_>,
    node: Node<'a>,
) -> Result<HtmlNode> {
    let cell = match node.data().value {
        NodeValue::TableCell(cell) => cell,
        _ => Default::default(),
    };
    let tag = if cell.header { "th" } else { "td" };
    let children = t.children(ctx, node)?;

    Ok(match cell.alignment.html_name() {
        Some(align) => HtmlNode::element(tag, [("align", align.to_string())], children),
        None => HtmlNode::bare(tag, children),
    })
}

fn render_code<'a>(_: &Transformer, _: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let literal = match node.data().value {
        NodeValue::Code(ref code) => code.literal.clone(),
        _ => String::new(),
    };
    Ok(HtmlNode::bare("code", vec![HtmlNode::text(literal)]))
}

fn render_link<'a>(t: &Transformer, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let nl = match node.data().value {
        NodeValue::Link(ref nl) => nl.clone(),
        _ => Default::default(),
    };

    let mut attributes = vec![("href", nl.url)];
    if !nl.title.is_empty() {
        attributes.push(("title", nl.title));
    }
    Ok(HtmlNode::element("a", attributes, t.children(ctx, node)?))
}

fn render_image<'a>(_: &Transformer, _: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let nl = match node.data().value {
        NodeValue::Image(ref nl) => nl.clone(),
        _ => Default::default(),
    };

    let mut attributes = vec![("src", nl.url), ("alt", collect_text(node))];
    if !nl.title.is_empty() {
        attributes.push(("title", nl.title));
    }
    Ok(HtmlNode::element("img", attributes, vec![]))
}

fn render_footnote_reference<'a>(
    _: &Transformer,
    _: &Context<'_, '_>,
    node: Node<'a>,
) -> Result<HtmlNode> {
    let (ix, ref_num) = match node.data().value {
        NodeValue::FootnoteReference(ref nfr) => (nfr.ix, nfr.ref_num),
        _ => (0, 0),
    };

    let id = if ref_num > 1 {
        format!("fnref-{}-{}", ix, ref_num)
    } else {
        format!("fnref-{}", ix)
    };

    Ok(HtmlNode::element(
        "sup",
        [("class", "footnote-ref".to_string())],
        vec![HtmlNode::element(
            "a",
            [("href", format!("#fn-{}", ix)), ("id", id)],
            vec![HtmlNode::text(ix.to_string())],
        )],
    ))
}

fn render_mention<'a>(_: &Transformer, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let name = match node.data().value {
        NodeValue::Mention(ref nm) => nm.name.clone(),
        _ => String::new(),
    };

    let href = format!(
        "{}{}",
        ctx.options.render.mention_base_url,
        utf8_percent_encode(&name, NON_ALPHANUMERIC)
    );
    Ok(HtmlNode::element(
        "a",
        [("class", "ping".to_string()), ("href", href)],
        vec![HtmlNode::text(format!("@{}", name))],
    ))
}

fn render_smiley<'a>(_: &Transformer, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let smiley = match node.data().value {
        NodeValue::Smiley(ref ns) => ns.clone(),
        _ => Default::default(),
    };

    Ok(HtmlNode::element(
        "img",
        [
            ("alt", smiley.code),
            ("class", "smiley".to_string()),
            (
                "src",
                format!("{}{}", ctx.options.render.smiley_base_url, smiley.image),
            ),
        ],
        vec![],
    ))
}

fn render_embed<'a>(_: &Transformer, _: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let embed = match node.data().value {
        NodeValue::Embed(ref ne) => ne.clone(),
        _ => Default::default(),
    };

    Ok(match (embed.provider, embed.src) {
        (Some(provider), Some(src)) => HtmlNode::element(
            "iframe",
            [
                ("allowfullscreen", String::new()),
                ("class", format!("embed embed-{}", provider)),
                ("sandbox", IFRAME_SANDBOX.to_string()),
                ("src", src),
            ],
            vec![],
        ),
        _ => HtmlNode::element(
            "a",
            [("href", embed.url.clone())],
            vec![HtmlNode::text(embed.url)],
        ),
    })
}

fn render_math<'a>(_: &Transformer, _: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    let math = match node.data().value {
        NodeValue::Math(ref nm) => nm.clone(),
        _ => Default::default(),
    };

    let (tag, class) = match (math.block, math.display_math) {
        (true, _) => ("div", "math math-display"),
        (false, true) => ("span", "math math-display"),
        (false, false) => ("span", "math math-inline"),
    };
    Ok(HtmlNode::element(
        tag,
        [("class", class.to_string())],
        vec![HtmlNode::text(math.literal)],
    ))
}
