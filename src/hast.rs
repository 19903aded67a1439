//! The HTML tree produced by the transformer and cleaned by the sanitizer.

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{local_name, ns, parse_document, Attribute, ParseOpts, QualName};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::BTreeMap;
use typed_arena::Arena;

use crate::arena_tree::{self, NodeEdge};

/// Open elements deeper than this are dropped by [`parse_fragment`], their
/// content being kept in place.
pub const MAX_FRAGMENT_DEPTH: usize = 64;

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// A node of the HTML tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    /// A sequence of nodes without a wrapper.
    Fragment(Vec<HtmlNode>),

    /// Character data.  Escaped when serialized.
    Text(String),

    /// An element.  Attribute names and the tag are lowercase.
    Element {
        /// Tag name.
        tag: String,
        /// Attributes, kept sorted so output is deterministic.
        attributes: BTreeMap<String, String>,
        /// Child nodes.
        children: Vec<HtmlNode>,
    },
}

impl HtmlNode {
    /// An element with the given attributes.
    pub fn element<'s>(
        tag: &str,
        attributes: impl IntoIterator<Item = (&'s str, String)>,
        children: Vec<HtmlNode>,
    ) -> Self {
        HtmlNode::Element {
            tag: tag.to_string(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            children,
        }
    }

    /// An element without attributes.
    pub fn bare(tag: &str, children: Vec<HtmlNode>) -> Self {
        HtmlNode::element(tag, [], children)
    }

    /// A text node.
    pub fn text(text: impl Into<String>) -> Self {
        HtmlNode::Text(text.into())
    }

    /// The tag name, if this is an element.
    pub fn tag(&self) -> Option<&str> {
        match self {
            HtmlNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// The value of attribute `name`, if this is an element carrying it.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            HtmlNode::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Child nodes of elements and fragments.
    pub fn children(&self) -> &[HtmlNode] {
        match self {
            HtmlNode::Element { children, .. } | HtmlNode::Fragment(children) => children,
            HtmlNode::Text(_) => &[],
        }
    }

    /// Concatenated text content.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                HtmlNode::Text(t) => out.push_str(t),
                _ => stack.extend(node.children().iter().rev()),
            }
        }
        out
    }
}

/// Markup deeper than this is split and parsed in pieces, so the tree
/// builder never works against a tall stack of open elements.
const MAX_PARSE_NESTING: usize = 256;

type MarkupNode<'s> = arena_tree::Node<'s, Markup>;

/// A node of the tree the parser builds before it is turned into
/// [`HtmlNode`]s.
#[derive(Debug)]
struct Markup {
    name: QualName,
    kind: MarkupKind,
}

#[derive(Debug)]
enum MarkupKind {
    Document,
    Element(RefCell<Vec<Attribute>>),
    Text(RefCell<String>),
    Comment,
}

impl Markup {
    fn new(kind: MarkupKind) -> Self {
        Markup {
            name: QualName::new(None, ns!(), local_name!("")),
            kind,
        }
    }
}

/// Builds the parser's output into an arena.
struct MarkupSink<'s> {
    arena: &'s Arena<MarkupNode<'s>>,
    document: &'s MarkupNode<'s>,
}

impl<'s> MarkupSink<'s> {
    fn new(arena: &'s Arena<MarkupNode<'s>>) -> Self {
        let document: &'s MarkupNode<'s> =
            arena.alloc(arena_tree::Node::new(Markup::new(MarkupKind::Document)));
        MarkupSink { arena, document }
    }

    fn alloc(&self, markup: Markup) -> &'s MarkupNode<'s> {
        self.arena.alloc(arena_tree::Node::new(markup))
    }

    fn text(&self, text: &str) -> &'s MarkupNode<'s> {
        self.alloc(Markup::new(MarkupKind::Text(RefCell::new(text.to_string()))))
    }

    /// The `body` element of the parsed document.
    fn body(&self) -> Option<&'s MarkupNode<'s>> {
        self.document
            .descendants()
            .find(|n| matches!(n.data.kind, MarkupKind::Element(_)) && &*n.data.name.local == "body")
    }
}

/// Appends to the text node `node`, if it is one.
fn extend_text(node: Option<&MarkupNode<'_>>, text: &str) -> bool {
    match node.map(|n| &n.data.kind) {
        Some(MarkupKind::Text(existing)) => {
            existing.borrow_mut().push_str(text);
            true
        }
        _ => false,
    }
}

impl<'s> TreeSink for MarkupSink<'s> {
    type Handle = &'s MarkupNode<'s>;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        &target.data.name
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        self.alloc(Markup {
            name,
            kind: MarkupKind::Element(RefCell::new(attrs)),
        })
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.alloc(Markup::new(MarkupKind::Comment))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        self.alloc(Markup::new(MarkupKind::Comment))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => parent.append(node),
            NodeOrText::AppendText(text) => {
                if !extend_text(parent.last_child(), &text) {
                    parent.append(self.text(&text));
                }
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if element.parent().is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.same_node(y)
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        match new_node {
            NodeOrText::AppendNode(node) => sibling.insert_before(node),
            NodeOrText::AppendText(text) => {
                if !extend_text(sibling.previous_sibling(), &text) {
                    sibling.insert_before(self.text(&text));
                }
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        if let MarkupKind::Element(ref existing) = target.data.kind {
            let mut existing = existing.borrow_mut();
            for attr in attrs {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach();
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children: Vec<_> = node.children().collect();
        for child in children {
            new_parent.append(child);
        }
    }
}

/// Parse a piece of markup the way a browser parses the content of
/// `<body>`.
///
/// Comments, doctypes and processing instructions are dropped, and
/// entities are decoded in text and attribute values.  Elements nested
/// deeper than [`MAX_FRAGMENT_DEPTH`] are unwrapped, their content taking
/// their place.
pub fn parse_fragment(html: &str) -> HtmlNode {
    let mut nodes = vec![];
    for piece in pieces(html) {
        let arena = Arena::new();
        let wrapped = format!(
            "<!DOCTYPE html><html><head></head><body>{}</body></html>",
            piece
        );
        let sink = parse_document(MarkupSink::new(&arena), ParseOpts::default())
            .from_utf8()
            .one(wrapped.as_bytes());
        if let Some(body) = sink.body() {
            for node in convert(body) {
                push_node(&mut nodes, node);
            }
        }
    }
    HtmlNode::Fragment(nodes)
}

/// Split `html` wherever the tags opened so far would nest deeper than
/// [`MAX_PARSE_NESTING`].  Tag names are only looked at roughly; the split
/// points just need to bound the work.
fn pieces(html: &str) -> Vec<&str> {
    let bytes = html.as_bytes();
    let mut pieces = vec![];
    let mut start = 0;
    let mut depth = 0usize;

    for (i, _) in bytes.iter().enumerate().filter(|(_, &b)| b == b'<') {
        match bytes.get(i + 1) {
            Some(b'/') => depth = depth.saturating_sub(1),
            Some(b) if b.is_ascii_alphabetic() => {
                let name_len = bytes[i + 1..]
                    .iter()
                    .take_while(|b| b.is_ascii_alphanumeric())
                    .count();
                let name = html[i + 1..i + 1 + name_len].to_ascii_lowercase();
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    continue;
                }
                if depth == MAX_PARSE_NESTING {
                    pieces.push(&html[start..i]);
                    start = i;
                    depth = 0;
                }
                depth += 1;
            }
            _ => {}
        }
    }

    pieces.push(&html[start..]);
    pieces
}

struct Frame {
    /// `None` for an element unwrapped for being too deep.
    element: Option<(String, BTreeMap<String, String>)>,
    children: Vec<HtmlNode>,
}

/// The children of `body` as [`HtmlNode`]s, without recursing.
fn convert<'s>(body: &'s MarkupNode<'s>) -> Vec<HtmlNode> {
    let mut stack: SmallVec<[Frame; 16]> = SmallVec::new();
    stack.push(Frame {
        element: None,
        children: vec![],
    });
    let mut depth = 0;

    for edge in body.traverse() {
        match edge {
            NodeEdge::Start(node) if node.same_node(body) => {}
            NodeEdge::End(node) if node.same_node(body) => {}
            NodeEdge::Start(node) => match node.data.kind {
                MarkupKind::Element(ref attrs) => {
                    depth += 1;
                    let element = (depth <= MAX_FRAGMENT_DEPTH).then(|| {
                        let attributes = attrs
                            .borrow()
                            .iter()
                            .map(|a| (attribute_name(&a.name), a.value.to_string()))
                            .fold(BTreeMap::new(), |mut map, (k, v)| {
                                map.entry(k).or_insert(v);
                                map
                            });
                        (node.data.name.local.to_ascii_lowercase().to_string(), attributes)
                    });
                    stack.push(Frame {
                        element,
                        children: vec![],
                    });
                }
                MarkupKind::Text(ref text) => {
                    if let Some(frame) = stack.last_mut() {
                        push_node(&mut frame.children, HtmlNode::Text(text.borrow().clone()));
                    }
                }
                MarkupKind::Document | MarkupKind::Comment => {}
            },
            NodeEdge::End(node) => {
                if !matches!(node.data.kind, MarkupKind::Element(_)) {
                    continue;
                }
                depth -= 1;
                let Some(frame) = stack.pop() else {
                    continue;
                };
                let Some(parent) = stack.last_mut() else {
                    continue;
                };
                match frame.element {
                    Some((tag, attributes)) => parent.children.push(HtmlNode::Element {
                        tag,
                        attributes,
                        children: frame.children,
                    }),
                    None => {
                        for child in frame.children {
                            push_node(&mut parent.children, child);
                        }
                    }
                }
            }
        }
    }

    stack.pop().map(|f| f.children).unwrap_or_default()
}

fn attribute_name(name: &QualName) -> String {
    match name.prefix {
        Some(ref prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_ascii_lowercase().to_string(),
    }
}

/// Append `node`, joining it to a preceding text node.
fn push_node(nodes: &mut Vec<HtmlNode>, node: HtmlNode) {
    match (nodes.last_mut(), node) {
        (Some(HtmlNode::Text(last)), HtmlNode::Text(text)) => last.push_str(&text),
        (_, node) => nodes.push(node),
    }
}
