//! The Markdown AST.

use crate::arena_tree;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;

/// The core AST node enum.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// The root of every document.  Contains **blocks**.
    Document,

    /// **Block**. A block quote.  Contains other **blocks**.
    ///
    /// ``` md
    /// > A block quote.
    /// ```
    BlockQuote,

    /// **Block**.  A list.  Contains list items.
    List(NodeList),

    /// **Block**.  A list item.  Contains other **blocks**.  Carries the
    /// marker geometry of this particular item.
    Item(NodeList),

    /// **Block**. A code block; may be fenced or indented.  Contains raw
    /// text which is not parsed as Markdown, although is HTML escaped.
    CodeBlock(NodeCodeBlock),

    /// **Block**. Raw HTML.  Contains no children; the literal is parsed
    /// into HTML nodes at transform time and sanitized afterwards.
    Html(NodeHtml),

    /// **Block**. A paragraph.  Contains **inlines**.
    Paragraph,

    /// **Block**. A heading; may be ATX or setext.  Contains **inlines**.
    Heading(NodeHeading),

    /// **Block**. A thematic break.  Has no children.
    ThematicBreak,

    /// **Block**. A footnote definition.  Contains other **blocks**.
    FootnoteDefinition(NodeFootnoteDefinition),

    /// **Block**. A GFM table.  Contains table rows.
    Table(Vec<TableAlignment>),

    /// **Block**. A table row.  The `bool` is whether it is the header row.
    /// Contains table cells.
    TableRow(bool),

    /// **Block**.  A table cell.  Contains **inlines**.
    TableCell(NodeTableCell),

    /// **Block**. A figure promoted from a lone image paragraph.  Contains
    /// the image and an optional [`NodeValue::FigureCaption`].
    Figure,

    /// **Block**. The caption of a figure.  Contains **inlines**.
    FigureCaption,

    /// **Inline**.  Textual content.
    Text(String),

    /// **Inline**.  A soft line break.
    SoftBreak,

    /// **Inline**.  A hard line break.
    LineBreak,

    /// **Inline**.  A code span.
    Code(NodeCode),

    /// **Inline**.  Emphasised text.
    Emph,

    /// **Inline**.  Strong text.
    Strong,

    /// **Inline**.  A link to some URL, with possible title.
    Link(NodeLink),

    /// **Inline**.  An image.  Its children are the alt text.
    Image(NodeLink),

    /// **Inline**.  A footnote reference.
    FootnoteReference(NodeFootnoteReference),

    /// **Inline**.  A mention of a user, `@name` or `@**display name**`.
    Mention(NodeMention),

    /// **Inline**.  Externally hosted content, `!(https://…)`.
    Embed(NodeEmbed),

    /// **Inline** or **Block**.  A math span, `$…$`, `$$…$$`, or a `$$` fenced block.
    Math(NodeMath),

    /// **Inline**.  A smiley such as `:)`, shown as a small image.
    Smiley(NodeSmiley),
}

/// Fieldless discriminant of [`NodeValue`], used to key transform rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Document,
    BlockQuote,
    List,
    Item,
    CodeBlock,
    Html,
    Paragraph,
    Heading,
    ThematicBreak,
    FootnoteDefinition,
    Table,
    TableRow,
    TableCell,
    Figure,
    FigureCaption,
    Text,
    SoftBreak,
    LineBreak,
    Code,
    Emph,
    Strong,
    Link,
    Image,
    FootnoteReference,
    Mention,
    Embed,
    Math,
    Smiley,
}

impl NodeKind {
    /// Every kind, in declaration order.
    pub const ALL: [NodeKind; 28] = [
        NodeKind::Document,
        NodeKind::BlockQuote,
        NodeKind::List,
        NodeKind::Item,
        NodeKind::CodeBlock,
        NodeKind::Html,
        NodeKind::Paragraph,
        NodeKind::Heading,
        NodeKind::ThematicBreak,
        NodeKind::FootnoteDefinition,
        NodeKind::Table,
        NodeKind::TableRow,
        NodeKind::TableCell,
        NodeKind::Figure,
        NodeKind::FigureCaption,
        NodeKind::Text,
        NodeKind::SoftBreak,
        NodeKind::LineBreak,
        NodeKind::Code,
        NodeKind::Emph,
        NodeKind::Strong,
        NodeKind::Link,
        NodeKind::Image,
        NodeKind::FootnoteReference,
        NodeKind::Mention,
        NodeKind::Embed,
        NodeKind::Math,
        NodeKind::Smiley,
    ];

    /// The snake_case name used in diagnostics and errors.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::BlockQuote => "block_quote",
            NodeKind::List => "list",
            NodeKind::Item => "item",
            NodeKind::CodeBlock => "code_block",
            NodeKind::Html => "html",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::ThematicBreak => "thematic_break",
            NodeKind::FootnoteDefinition => "footnote_definition",
            NodeKind::Table => "table",
            NodeKind::TableRow => "table_row",
            NodeKind::TableCell => "table_cell",
            NodeKind::Figure => "figure",
            NodeKind::FigureCaption => "figure_caption",
            NodeKind::Text => "text",
            NodeKind::SoftBreak => "softbreak",
            NodeKind::LineBreak => "linebreak",
            NodeKind::Code => "code",
            NodeKind::Emph => "emph",
            NodeKind::Strong => "strong",
            NodeKind::Link => "link",
            NodeKind::Image => "image",
            NodeKind::FootnoteReference => "footnote_reference",
            NodeKind::Mention => "mention",
            NodeKind::Embed => "embed",
            NodeKind::Math => "math",
            NodeKind::Smiley => "smiley",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Alignment of a single table cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TableAlignment {
    /// Cell content is unaligned.
    #[default]
    None,

    /// Cell content is aligned left.
    Left,

    /// Cell content is centered.
    Center,

    /// Cell content is aligned right.
    Right,
}

impl TableAlignment {
    pub(crate) fn html_name(&self) -> Option<&'static str> {
        match *self {
            TableAlignment::None => None,
            TableAlignment::Left => Some("left"),
            TableAlignment::Center => Some("center"),
            TableAlignment::Right => Some("right"),
        }
    }
}

/// A table cell's column alignment and whether it sits in the header row.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeTableCell {
    /// Column alignment from the delimiter row.
    pub alignment: TableAlignment,

    /// Whether the cell belongs to the header row.
    pub header: bool,
}

/// An inline code span.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeCode {
    /// The number of backticks delimiting the span.
    pub num_backticks: usize,

    /// The content of the inline code span.
    /// As the contents are not interpreted as Markdown at all,
    /// they are contained within this structure,
    /// rather than inserted into a child inline of any kind.
    pub literal: String,
}

/// The details of a link's destination, or an image's source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeLink {
    /// The URL for the link destination or image source.
    pub url: String,

    /// The title for the link or image.
    pub title: String,
}

/// The metadata of a list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeList {
    /// The kind of list (bullet (unordered) or ordered).
    pub list_type: ListType,

    /// Number of spaces before the list marker.
    pub marker_offset: usize,

    /// Number of characters between the start of the list marker and the item text (including the list marker(s)).
    pub padding: usize,

    /// For ordered lists, the ordinal the list starts at.
    pub start: usize,

    /// For ordered lists, the delimiter after each number.
    pub delimiter: ListDelimType,

    /// For bullet lists, the character used for each bullet.
    pub bullet_char: u8,

    /// Whether the list is tight, i.e. whether the paragraphs are wrapped
    /// in `<p>` tags when formatted as HTML.
    pub tight: bool,
}

/// The type of list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListType {
    /// A bullet list, i.e. an unordered list.
    #[default]
    Bullet,

    /// An ordered list.
    Ordered,
}

/// The delimiter for ordered lists, i.e. the character which appears after each number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListDelimType {
    /// A period character `.`.
    #[default]
    Period,

    /// A paren character `)`.
    Paren,
}

/// The metadata and data of a code block (fenced or indented).
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct NodeCodeBlock {
    /// Whether the code block is fenced.
    pub fenced: bool,

    /// For fenced code blocks, the fence character itself (`` ` `` or `~`).
    pub fence_char: u8,

    /// For fenced code blocks, the length of the fence.
    pub fence_length: usize,

    /// For fenced code blocks, the indentation level of the code within the block.
    pub fence_offset: usize,

    /// For fenced code blocks, the info string after the opening fence, if any.
    pub info: String,

    /// The literal contents of the code block.
    pub literal: String,
}

impl NodeCodeBlock {
    /// The first word of the info string, which names the language.
    pub fn language(&self) -> Option<&str> {
        self.info.split_whitespace().next()
    }
}

/// The metadata of a heading.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeading {
    /// The level of the header; from 1 to 6 for ATX headings, 1 or 2 for setext headings.
    pub level: u8,

    /// Whether the heading is setext (if not, ATX).
    pub setext: bool,
}

/// Raw HTML, block or inline.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeHtml {
    /// Whether this came from an HTML block rather than an inline tag.
    pub block: bool,

    /// The HTML block start condition that matched, 1 to 7; 0 for inline HTML.
    pub block_type: u8,

    /// The literal markup.
    pub literal: String,
}

/// The metadata of a footnote definition.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeFootnoteDefinition {
    /// The name of the footnote.
    pub name: String,

    /// The index assigned on first reference; 0 until footnotes are processed.
    pub ix: u32,

    /// Total number of references to this footnote.
    pub total_references: u32,
}

/// The metadata of a footnote reference.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeFootnoteReference {
    /// The name of the footnote.
    pub name: String,

    /// The index of the footnote in the document; 0 until footnotes are processed.
    pub ix: u32,

    /// Which reference to the footnote this is, starting at 1.
    pub ref_num: u32,
}

/// A mention candidate.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeMention {
    /// The mentioned name, without the `@` or `**` markers.
    pub name: String,

    /// The source text, restored verbatim when the mention does not resolve.
    pub literal: String,
}

/// Externally hosted content.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeEmbed {
    /// The URL as written.
    pub url: String,

    /// The name of the recognised provider.
    pub provider: Option<String>,

    /// The trusted embed URL, set once a provider has been recognised.
    pub src: Option<String>,
}

/// A math span or block.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct NodeMath {
    /// Whether this is display math (`$$`).
    pub display_math: bool,

    /// Whether this is a block of its own rather than a span inside a paragraph.
    pub block: bool,

    /// The literal TeX source.
    pub literal: String,
}

/// A smiley and the image standing in for it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeSmiley {
    /// The characters as written, used as the image's alt text.
    pub code: String,

    /// File name of the image, relative to the smiley base URL.
    pub image: String,
}

impl NodeValue {
    /// The fieldless kind of this value.
    pub fn kind(&self) -> NodeKind {
        match *self {
            NodeValue::Document => NodeKind::Document,
            NodeValue::BlockQuote => NodeKind::BlockQuote,
            NodeValue::List(..) => NodeKind::List,
            NodeValue::Item(..) => NodeKind::Item,
            NodeValue::CodeBlock(..) => NodeKind::CodeBlock,
            NodeValue::Html(..) => NodeKind::Html,
            NodeValue::Paragraph => NodeKind::Paragraph,
            NodeValue::Heading(..) => NodeKind::Heading,
            NodeValue::ThematicBreak => NodeKind::ThematicBreak,
            NodeValue::FootnoteDefinition(..) => NodeKind::FootnoteDefinition,
            NodeValue::Table(..) => NodeKind::Table,
            NodeValue::TableRow(..) => NodeKind::TableRow,
            NodeValue::TableCell(..) => NodeKind::TableCell,
            NodeValue::Figure => NodeKind::Figure,
            NodeValue::FigureCaption => NodeKind::FigureCaption,
            NodeValue::Text(..) => NodeKind::Text,
            NodeValue::SoftBreak => NodeKind::SoftBreak,
            NodeValue::LineBreak => NodeKind::LineBreak,
            NodeValue::Code(..) => NodeKind::Code,
            NodeValue::Emph => NodeKind::Emph,
            NodeValue::Strong => NodeKind::Strong,
            NodeValue::Link(..) => NodeKind::Link,
            NodeValue::Image(..) => NodeKind::Image,
            NodeValue::FootnoteReference(..) => NodeKind::FootnoteReference,
            NodeValue::Mention(..) => NodeKind::Mention,
            NodeValue::Embed(..) => NodeKind::Embed,
            NodeValue::Math(..) => NodeKind::Math,
            NodeValue::Smiley(..) => NodeKind::Smiley,
        }
    }

    /// Whether the type the node is of can contain inline nodes.
    pub fn contains_inlines(&self) -> bool {
        matches!(
            *self,
            NodeValue::Paragraph
                | NodeValue::Heading(..)
                | NodeValue::TableCell(..)
                | NodeValue::FigureCaption
        )
    }

    /// Indicates whether this node is a block node or inline node.
    pub fn block(&self) -> bool {
        match *self {
            NodeValue::Math(ref m) => m.block,
            NodeValue::Html(ref h) => h.block,
            _ => matches!(
                *self,
                NodeValue::Document
                    | NodeValue::BlockQuote
                    | NodeValue::FootnoteDefinition(_)
                    | NodeValue::List(..)
                    | NodeValue::Item(..)
                    | NodeValue::CodeBlock(..)
                    | NodeValue::Paragraph
                    | NodeValue::Heading(..)
                    | NodeValue::ThematicBreak
                    | NodeValue::Table(..)
                    | NodeValue::TableRow(..)
                    | NodeValue::TableCell(..)
                    | NodeValue::Figure
                    | NodeValue::FigureCaption
            ),
        }
    }

    pub(crate) fn accepts_lines(&self) -> bool {
        match *self {
            NodeValue::Paragraph | NodeValue::Heading(..) | NodeValue::CodeBlock(..) => true,
            NodeValue::Html(ref h) => h.block,
            NodeValue::Math(ref m) => m.block,
            _ => false,
        }
    }

    /// Return a reference to the text of a `Text` inline, if this node is one.
    pub fn text(&self) -> Option<&String> {
        match *self {
            NodeValue::Text(ref t) => Some(t),
            _ => None,
        }
    }

    /// Return a mutable reference to the text of a `Text` inline, if this node is one.
    pub fn text_mut(&mut self) -> Option<&mut String> {
        match *self {
            NodeValue::Text(ref mut t) => Some(t),
            _ => None,
        }
    }
}

/// A single node in the AST.
#[derive(Debug, Clone)]
pub struct Ast {
    /// The node value itself.
    pub value: NodeValue,

    /// The 1-based line in the source document this node starts on.
    pub line: usize,

    pub(crate) content: String,
    pub(crate) open: bool,
    pub(crate) last_line_blank: bool,
    pub(crate) nesting: usize,
}

impl Ast {
    /// Create a new AST node with the given value.
    pub fn new(value: NodeValue, line: usize) -> Self {
        Ast {
            value,
            line,
            content: String::new(),
            open: true,
            last_line_blank: false,
            nesting: 0,
        }
    }
}

/// The type of a node within the document.
///
/// It is bound by the lifetime `'a`, which corresponds to the `Arena` nodes are allocated in.
/// Child `Ast`s are wrapped in `RefCell` for interior mutability.
pub type AstNode<'a> = arena_tree::Node<'a, RefCell<Ast>>;

/// A reference to a node in the arena.
pub type Node<'a> = &'a AstNode<'a>;

/// The arena every node of one document is allocated in.
pub type Arena<'a> = typed_arena::Arena<AstNode<'a>>;

impl<'a> arena_tree::Node<'a, RefCell<Ast>> {
    /// Borrow the node's payload.
    pub fn data(&self) -> Ref<'_, Ast> {
        self.data.borrow()
    }

    /// Mutably borrow the node's payload.
    pub fn data_mut(&self) -> RefMut<'_, Ast> {
        self.data.borrow_mut()
    }

    /// The kind of the node's value.
    pub fn kind(&self) -> NodeKind {
        self.data.borrow().value.kind()
    }
}

pub(crate) fn last_child_is_open<'a>(node: &'a AstNode<'a>) -> bool {
    node.last_child().is_some_and(|n| n.data().open)
}

/// Whether `node` may hold a child with value `child` while parsing.
pub fn can_contain_type<'a>(node: &'a AstNode<'a>, child: &NodeValue) -> bool {
    if let NodeValue::Document = *child {
        return false;
    }

    match node.data().value {
        NodeValue::Document
        | NodeValue::BlockQuote
        | NodeValue::FootnoteDefinition(_)
        | NodeValue::Item(..) => child.block() && !matches!(*child, NodeValue::Item(..)),

        NodeValue::List(..) => matches!(*child, NodeValue::Item(..)),

        NodeValue::Paragraph
        | NodeValue::Heading(..)
        | NodeValue::Emph
        | NodeValue::Strong
        | NodeValue::Link(..)
        | NodeValue::Image(..)
        | NodeValue::FigureCaption
        | NodeValue::TableCell(..) => !child.block(),

        NodeValue::Table(..) => matches!(*child, NodeValue::TableRow(..)),

        NodeValue::TableRow(..) => matches!(*child, NodeValue::TableCell(..)),

        NodeValue::Figure => matches!(*child, NodeValue::Image(..) | NodeValue::FigureCaption),

        _ => false,
    }
}

pub(crate) fn ends_with_blank_line<'a>(node: &'a AstNode<'a>) -> bool {
    let mut it = Some(node);
    while let Some(cur) = it {
        if cur.data().last_line_blank {
            return true;
        }
        match cur.data().value {
            NodeValue::List(..) | NodeValue::Item(..) => it = cur.last_child(),
            _ => it = None,
        };
    }
    false
}

/// Allocate a new detached node in `arena`.
pub fn make_node<'a>(arena: &'a Arena<'a>, value: NodeValue, line: usize) -> Node<'a> {
    arena.alloc(arena_tree::Node::new(RefCell::new(Ast::new(value, line))))
}

/// The plain text of a node's inline descendants, as used for `alt` attributes.
pub fn collect_text<'a>(node: Node<'a>) -> String {
    let mut text = String::new();
    for n in node.descendants() {
        match n.data().value {
            NodeValue::Text(ref t) => text.push_str(t),
            NodeValue::Code(ref c) => text.push_str(&c.literal),
            NodeValue::Math(ref m) => text.push_str(&m.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
            _ => {}
        }
    }
    text
}
