//! The block phase of the parser, and the driver for the inline phase.
//!
//! Lines are fed through the usual open-container algorithm: every line
//! first walks the chain of open blocks to see how far it continues them,
//! then the enabled block tokenizers get a chance to open new containers
//! in priority order, and whatever is left of the line lands in the deepest
//! block that accepts text.

mod inlines;
pub(crate) use self::inlines::merge_adjacent_text;
pub mod options;
pub mod registry;
mod table;

use std::cmp::min;
use std::mem;

use rustc_hash::FxHashMap;

use crate::entity;
use crate::nodes::{
    can_contain_type, ends_with_blank_line, last_child_is_open, make_node, Arena, ListDelimType,
    ListType, Node, NodeCodeBlock, NodeFootnoteDefinition, NodeHeading, NodeHtml, NodeList,
    NodeMath, NodeValue,
};
use crate::parser::registry::{BlockTokenizer, Registry};
use crate::scanners;
use crate::strings::{self, Case};

pub use crate::parser::options::Options;

const TAB_STOP: usize = 4;
const CODE_INDENT: usize = 4;

/// Container nesting ceiling used when the depth guard is switched off.
pub(crate) const MAX_NESTING_UNGUARDED: usize = 512;

/// Parse a Markdown document to an AST.
///
/// The tokenizers switched off in `options.tokenizers` take no part.
///
/// ```rust
/// # use zmark::{nodes::Arena, parse_document, nodes::NodeValue, Options};
/// let arena = Arena::new();
/// let root = parse_document(&arena, "# Hi\n", &Options::default());
/// let heading = root.first_child().unwrap();
/// assert!(matches!(heading.data().value, NodeValue::Heading(..)));
/// ```
pub fn parse_document<'a>(arena: &'a Arena<'a>, md: &str, options: &Options) -> Node<'a> {
    let registry = Registry::new(&options.tokenizers);
    parse_document_with_registry(arena, md, options, &registry)
}

pub(crate) fn parse_document_with_registry<'a>(
    arena: &'a Arena<'a>,
    md: &str,
    options: &Options,
    registry: &Registry,
) -> Node<'a> {
    let root = make_node(arena, NodeValue::Document, 1);
    let max_nesting = options
        .limits
        .depth
        .map_or(MAX_NESTING_UNGUARDED, |d| d.saturating_add(1));
    Parser::new(arena, root, registry, max_nesting).parse(md)
}

/// Return whether the byte at the given offset passes the callback.
///
/// Returns `false` if the offset is out of bounds.
fn byte_matches<F>(bytes: &[u8], offset: usize, predicate: F) -> bool
where
    F: Fn(u8) -> bool,
{
    bytes.get(offset).is_some_and(|&b| predicate(b))
}

fn newline_len(line: &str) -> usize {
    let bytes = line.as_bytes();
    let mut n = 0;
    if bytes.last() == Some(&b'\n') {
        n += 1;
    }
    if bytes.len() > n && bytes[bytes.len() - n - 1] == b'\r' {
        n += 1;
    }
    n
}

fn node_is<'a>(node: Node<'a>, f: impl Fn(&NodeValue) -> bool) -> bool {
    f(&node.data().value)
}

/// A reference link's resolved details.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedReference {
    /// The destination URL of the reference link.
    pub url: String,

    /// The title of the link.
    pub title: String,
}

/// Link reference definitions, keyed by normalized label.
pub(crate) type RefMap = FxHashMap<String, ResolvedReference>;

struct Parser<'a, 'r> {
    arena: &'a Arena<'a>,
    registry: &'r Registry,
    refmap: RefMap,
    root: Node<'a>,
    current: Node<'a>,
    max_nesting: usize,
    line_number: usize,
    offset: usize,
    column: usize,
    first_nonspace: usize,
    first_nonspace_column: usize,
    indent: usize,
    blank: bool,
    partially_consumed_tab: bool,
}

impl<'a, 'r> Parser<'a, 'r> {
    fn new(
        arena: &'a Arena<'a>,
        root: Node<'a>,
        registry: &'r Registry,
        max_nesting: usize,
    ) -> Self {
        Parser {
            arena,
            registry,
            refmap: RefMap::default(),
            root,
            current: root,
            max_nesting,
            line_number: 0,
            offset: 0,
            column: 0,
            first_nonspace: 0,
            first_nonspace_column: 0,
            indent: 0,
            blank: false,
            partially_consumed_tab: false,
        }
    }

    fn parse(mut self, s: &str) -> Node<'a> {
        let cleaned;
        let s = if s.contains('\0') {
            cleaned = s.replace('\0', "\u{fffd}");
            cleaned.as_str()
        } else {
            s
        };
        let sb = s.as_bytes();
        let end = s.len();

        let mut ix = 0;
        let matcher = jetscii::bytes!(b'\r', b'\n');

        while ix < end {
            let mut eol = match matcher.find(&sb[ix..]) {
                Some(offset) => ix + offset,
                None => end,
            };
            if eol < end {
                if sb[eol] == b'\r' {
                    eol += 1;
                    if eol < end && sb[eol] == b'\n' {
                        eol += 1;
                    }
                } else {
                    eol += 1;
                }
            }

            self.process_line(&s[ix..eol]);

            ix = eol;
        }

        self.finalize_document();
        self.root
    }

    fn process_line(&mut self, line: &str) {
        self.offset = 0;
        self.column = 0;
        self.first_nonspace = 0;
        self.first_nonspace_column = 0;
        self.indent = 0;
        self.blank = false;
        self.partially_consumed_tab = false;

        if self.line_number == 0 && line.starts_with('\u{feff}') {
            self.offset += 3;
        }

        self.line_number += 1;

        if let Some((last_matched_container, all_matched)) = self.check_open_blocks(line) {
            let mut container = last_matched_container;
            let current = self.current;
            self.open_new_blocks(&mut container, line, all_matched);

            if current.same_node(self.current) {
                self.add_text_to_container(container, last_matched_container, line);
            }
        }
    }

    ///////////////////////
    // Check open blocks //
    ///////////////////////

    fn check_open_blocks(&mut self, line: &str) -> Option<(Node<'a>, bool)> {
        let mut all_matched = false;
        let mut container = self.root;

        loop {
            if !last_child_is_open(container) {
                all_matched = true;
                break;
            }
            let Some(child) = container.last_child() else {
                break;
            };
            container = child;

            self.find_first_nonspace(line);

            let value = container.data().value.clone();
            let continues = match value {
                NodeValue::BlockQuote => self.parse_block_quote_prefix(line),
                NodeValue::Item(ref nl) => self.parse_item_prefix(line, container, nl),
                NodeValue::CodeBlock(ref ncb) => {
                    self.parse_code_block_prefix(line, container, ncb)?
                }
                NodeValue::Math(ref m) if m.block => self.parse_math_block_prefix(line, container)?,
                NodeValue::Html(ref h) if h.block => self.parse_html_block_prefix(h.block_type),
                NodeValue::Paragraph => !self.blank,
                NodeValue::Table(..) => !self.blank,
                NodeValue::FootnoteDefinition(..) => self.parse_footnote_definition_prefix(line),
                NodeValue::Heading(..) | NodeValue::TableRow(..) | NodeValue::TableCell(..) => {
                    false
                }
                _ => true,
            };

            if !continues {
                break;
            }
        }

        if !all_matched {
            container = container.parent()?;
        }

        Some((container, all_matched))
    }

    fn find_first_nonspace(&mut self, line: &str) {
        let mut chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
        let bytes = line.as_bytes();

        if self.first_nonspace <= self.offset {
            self.first_nonspace = self.offset;
            self.first_nonspace_column = self.column;

            loop {
                match bytes.get(self.first_nonspace) {
                    Some(b' ') => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += 1;
                        chars_to_tab -= 1;
                        if chars_to_tab == 0 {
                            chars_to_tab = TAB_STOP;
                        }
                    }
                    Some(b'\t') => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += chars_to_tab;
                        chars_to_tab = TAB_STOP;
                    }
                    _ => break,
                }
            }
        }

        self.indent = self.first_nonspace_column - self.column;
        self.blank = bytes
            .get(self.first_nonspace)
            .map_or(true, |&b| strings::is_line_end_char(b));
    }

    fn parse_block_quote_prefix(&mut self, line: &str) -> bool {
        let bytes = line.as_bytes();
        let indent = self.indent;
        if indent <= 3 && bytes.get(self.first_nonspace) == Some(&b'>') {
            self.advance_offset(line, indent + 1, true);

            if byte_matches(bytes, self.offset, strings::is_space_or_tab) {
                self.advance_offset(line, 1, true);
            }

            return true;
        }

        false
    }

    fn parse_item_prefix(&mut self, line: &str, container: Node<'a>, nl: &NodeList) -> bool {
        if self.indent >= nl.marker_offset + nl.padding {
            self.advance_offset(line, nl.marker_offset + nl.padding, true);
            true
        } else if self.blank && container.first_child().is_some() {
            let offset = self.first_nonspace - self.offset;
            self.advance_offset(line, offset, false);
            true
        } else {
            false
        }
    }

    fn parse_code_block_prefix(
        &mut self,
        line: &str,
        container: Node<'a>,
        ncb: &NodeCodeBlock,
    ) -> Option<bool> {
        if !ncb.fenced {
            if self.indent >= CODE_INDENT {
                self.advance_offset(line, CODE_INDENT, true);
                return Some(true);
            } else if self.blank {
                let offset = self.first_nonspace - self.offset;
                self.advance_offset(line, offset, false);
                return Some(true);
            }
            return Some(false);
        }

        let bytes = line.as_bytes();
        let matched = if self.indent <= 3 && bytes.get(self.first_nonspace) == Some(&ncb.fence_char)
        {
            scanners::close_code_fence(&line[self.first_nonspace..]).unwrap_or(0)
        } else {
            0
        };

        if matched >= ncb.fence_length {
            self.advance_offset(line, matched, false);
            self.current = self.finalize(container)?;
            return None;
        }

        let mut i = ncb.fence_offset;
        while i > 0 && byte_matches(bytes, self.offset, strings::is_space_or_tab) {
            self.advance_offset(line, 1, true);
            i -= 1;
        }
        Some(true)
    }

    fn parse_math_block_prefix(&mut self, line: &str, container: Node<'a>) -> Option<bool> {
        if self.indent <= 3 && scanners::math_fence(&line[self.first_nonspace..]).is_some() {
            let len = line.len() - newline_len(line) - self.offset;
            self.advance_offset(line, len, false);
            self.current = self.finalize(container)?;
            return None;
        }
        Some(true)
    }

    fn parse_html_block_prefix(&self, t: u8) -> bool {
        match t {
            1..=5 => true,
            _ => !self.blank,
        }
    }

    fn parse_footnote_definition_prefix(&mut self, line: &str) -> bool {
        if self.indent >= 4 {
            self.advance_offset(line, 4, true);
            true
        } else {
            line == "\n" || line == "\r\n"
        }
    }

    /////////////////////
    // Open new blocks //
    /////////////////////

    fn open_new_blocks(&mut self, container: &mut Node<'a>, line: &str, all_matched: bool) {
        let mut maybe_lazy = node_is(self.current, |v| matches!(v, NodeValue::Paragraph));

        while !node_is(container, |v| {
            matches!(v, NodeValue::CodeBlock(..))
                || matches!(v, NodeValue::Html(h) if h.block)
                || matches!(v, NodeValue::Math(m) if m.block)
        }) {
            self.find_first_nonspace(line);
            let indented = self.indent >= CODE_INDENT;

            let registry = self.registry;
            let opened = registry.block_tokenizers().iter().any(|&tokenizer| {
                self.try_start(tokenizer, container, line, indented, all_matched, maybe_lazy)
            });

            if !opened || container.data().value.accepts_lines() {
                break;
            }

            maybe_lazy = false;
        }
    }

    fn try_start(
        &mut self,
        tokenizer: BlockTokenizer,
        container: &mut Node<'a>,
        line: &str,
        indented: bool,
        all_matched: bool,
        maybe_lazy: bool,
    ) -> bool {
        match tokenizer {
            BlockTokenizer::FencedCode => !indented && self.handle_code_fence(container, line),
            BlockTokenizer::Math => !indented && self.handle_math_block(container, line),
            BlockTokenizer::Heading => {
                !indented
                    && (self.handle_atx_heading(container, line)
                        || self.handle_setext_heading(container, line))
            }
            BlockTokenizer::ThematicBreak => {
                !indented && self.handle_thematic_break(container, line, all_matched)
            }
            BlockTokenizer::Blockquote => !indented && self.handle_blockquote(container, line),
            BlockTokenizer::List => self.handle_list(container, line, indented),
            BlockTokenizer::IndentedCode => {
                self.handle_code_block(container, line, indented, maybe_lazy)
            }
            BlockTokenizer::Table => !indented && self.handle_table(container, line),
            BlockTokenizer::FootnoteDefinition => !indented && self.handle_footnote(container, line),
            BlockTokenizer::Html => !indented && self.handle_html_block(container, line),
            // Reference definitions are peeled off paragraphs as they close.
            BlockTokenizer::Definition => false,
        }
    }

    /// Whether a new container of `value`, plus `extra` levels beneath it,
    /// still fits under the nesting ceiling.
    fn has_room(&self, container: Node<'a>, value: &NodeValue, extra: usize) -> bool {
        let mut parent = container;
        while !can_contain_type(parent, value) {
            match parent.parent() {
                Some(p) => parent = p,
                None => return false,
            }
        }
        parent.data().nesting + 1 + extra <= self.max_nesting
    }

    fn handle_blockquote(&mut self, container: &mut Node<'a>, line: &str) -> bool {
        if line.as_bytes().get(self.first_nonspace) != Some(&b'>')
            || !self.has_room(container, &NodeValue::BlockQuote, 0)
        {
            return false;
        }

        let offset = self.first_nonspace + 1 - self.offset;
        self.advance_offset(line, offset, false);
        if byte_matches(line.as_bytes(), self.offset, strings::is_space_or_tab) {
            self.advance_offset(line, 1, true);
        }
        *container = self.add_child(container, NodeValue::BlockQuote);

        true
    }

    fn handle_atx_heading(&mut self, container: &mut Node<'a>, line: &str) -> bool {
        let Some(matched) = scanners::atx_heading_start(&line[self.first_nonspace..]) else {
            return false;
        };

        let level = line.as_bytes()[self.first_nonspace..]
            .iter()
            .take_while(|&&b| b == b'#')
            .count() as u8;

        let offset = self.offset;
        self.advance_offset(line, self.first_nonspace + matched - offset, false);
        *container = self.add_child(
            container,
            NodeValue::Heading(NodeHeading {
                level,
                setext: false,
            }),
        );

        true
    }

    fn handle_setext_heading(&mut self, container: &mut Node<'a>, line: &str) -> bool {
        if !node_is(container, |v| matches!(v, NodeValue::Paragraph)) {
            return false;
        }
        let Some(sc) = scanners::setext_heading_line(&line[self.first_nonspace..]) else {
            return false;
        };

        let has_content = {
            let mut content = mem::take(&mut container.data_mut().content);
            let has_content = self.resolve_reference_link_definitions(&mut content);
            container.data_mut().content = content;
            has_content
        };
        if has_content {
            container.data_mut().value = NodeValue::Heading(NodeHeading {
                level: match sc {
                    scanners::SetextChar::Equals => 1,
                    scanners::SetextChar::Hyphen => 2,
                },
                setext: true,
            });
            let adv = line.len() - newline_len(line) - self.offset;
            self.advance_offset(line, adv, false);
        }

        true
    }

    fn handle_thematic_break(
        &mut self,
        container: &mut Node<'a>,
        line: &str,
        all_matched: bool,
    ) -> bool {
        let lazy_paragraph =
            !all_matched && node_is(container, |v| matches!(v, NodeValue::Paragraph));
        if lazy_paragraph || scanners::thematic_break(&line[self.first_nonspace..]).is_none() {
            return false;
        }

        *container = self.add_child(container, NodeValue::ThematicBreak);

        let adv = line.len() - newline_len(line) - self.offset;
        self.advance_offset(line, adv, false);

        true
    }

    fn handle_code_fence(&mut self, container: &mut Node<'a>, line: &str) -> bool {
        let Some(matched) = scanners::open_code_fence(&line[self.first_nonspace..]) else {
            return false;
        };

        let first_nonspace = self.first_nonspace;
        let offset = self.offset;
        let ncb = NodeCodeBlock {
            fenced: true,
            fence_char: line.as_bytes()[first_nonspace],
            fence_length: matched,
            fence_offset: first_nonspace - offset,
            info: String::new(),
            literal: String::new(),
        };
        *container = self.add_child(container, NodeValue::CodeBlock(ncb));
        self.advance_offset(line, first_nonspace + matched - offset, false);

        true
    }

    fn handle_math_block(&mut self, container: &mut Node<'a>, line: &str) -> bool {
        let Some(matched) = scanners::math_fence(&line[self.first_nonspace..]) else {
            return false;
        };

        *container = self.add_child(
            container,
            NodeValue::Math(NodeMath {
                display_math: true,
                block: true,
                literal: String::new(),
            }),
        );
        let offset = self.offset;
        self.advance_offset(line, self.first_nonspace + matched - offset, false);

        true
    }

    fn handle_html_block(&mut self, container: &mut Node<'a>, line: &str) -> bool {
        let rest = &line[self.first_nonspace..];
        let block_type = match scanners::html_block_start(rest) {
            Some(t) => t,
            None if !node_is(container, |v| matches!(v, NodeValue::Paragraph))
                && scanners::html_block_start_7(rest) =>
            {
                7
            }
            None => return false,
        };

        *container = self.add_child(
            container,
            NodeValue::Html(NodeHtml {
                block: true,
                block_type,
                literal: String::new(),
            }),
        );

        true
    }

    fn handle_footnote(&mut self, container: &mut Node<'a>, line: &str) -> bool {
        let Some(matched) = scanners::footnote_definition(&line[self.first_nonspace..]) else {
            return false;
        };

        let value = NodeValue::FootnoteDefinition(NodeFootnoteDefinition::default());
        if !self.has_room(container, &value, 0) {
            return false;
        }

        let raw = &line[self.first_nonspace + 2..self.first_nonspace + matched];
        let name = raw.split(']').next().unwrap_or_default().to_string();
        let offset = self.first_nonspace + matched - self.offset;
        self.advance_offset(line, offset, false);
        *container = self.add_child(
            container,
            NodeValue::FootnoteDefinition(NodeFootnoteDefinition {
                name,
                ..Default::default()
            }),
        );

        true
    }

    fn handle_list(&mut self, container: &mut Node<'a>, line: &str, indented: bool) -> bool {
        let in_list = node_is(container, |v| matches!(v, NodeValue::List(..)));
        if (indented && !in_list) || self.indent >= 4 {
            return false;
        }

        let Some((matched, mut nl)) = parse_list_marker(
            line,
            self.first_nonspace,
            node_is(container, |v| matches!(v, NodeValue::Paragraph)),
        ) else {
            return false;
        };

        let joins_list = match container.data().value {
            NodeValue::List(ref mnl) => lists_match(&nl, mnl),
            _ => false,
        };
        let room = if joins_list {
            self.has_room(container, &NodeValue::Item(nl), 0)
        } else {
            self.has_room(container, &NodeValue::List(nl), 1)
        };
        if !room {
            return false;
        }

        let offset = self.first_nonspace + matched - self.offset;
        self.advance_offset(line, offset, false);
        let (save_partially_consumed_tab, save_offset, save_column) =
            (self.partially_consumed_tab, self.offset, self.column);

        let bytes = line.as_bytes();
        while self.column - save_column <= 5
            && byte_matches(bytes, self.offset, strings::is_space_or_tab)
        {
            self.advance_offset(line, 1, true);
        }

        let i = self.column - save_column;
        if !(1..5).contains(&i) || byte_matches(bytes, self.offset, strings::is_line_end_char) {
            nl.padding = matched + 1;
            self.offset = save_offset;
            self.column = save_column;
            self.partially_consumed_tab = save_partially_consumed_tab;
            if i > 0 {
                self.advance_offset(line, 1, true);
            }
        } else {
            nl.padding = matched + i;
        }

        nl.marker_offset = self.indent;

        if !joins_list {
            *container = self.add_child(container, NodeValue::List(nl));
        }

        *container = self.add_child(container, NodeValue::Item(nl));

        true
    }

    fn handle_code_block(
        &mut self,
        container: &mut Node<'a>,
        line: &str,
        indented: bool,
        maybe_lazy: bool,
    ) -> bool {
        if !indented || maybe_lazy || self.blank {
            return false;
        }

        self.advance_offset(line, CODE_INDENT, true);
        *container = self.add_child(container, NodeValue::CodeBlock(NodeCodeBlock::default()));

        true
    }

    fn handle_table(&mut self, container: &mut Node<'a>, line: &str) -> bool {
        match table::try_opening_block(self, *container, line) {
            Some(table) => {
                *container = table;
                true
            }
            None => false,
        }
    }

    //////////
    // Core //
    //////////

    fn advance_offset(&mut self, line: &str, mut count: usize, columns: bool) {
        let bytes = line.as_bytes();
        while count > 0 && self.offset < bytes.len() {
            match bytes[self.offset] {
                b'\t' => {
                    let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
                    if columns {
                        self.partially_consumed_tab = chars_to_tab > count;
                        let chars_to_advance = min(count, chars_to_tab);
                        self.column += chars_to_advance;
                        if !self.partially_consumed_tab {
                            self.offset += 1;
                        };
                        count -= chars_to_advance;
                    } else {
                        self.partially_consumed_tab = false;
                        self.column += chars_to_tab;
                        self.offset += 1;
                        count -= 1;
                    }
                }
                _ => {
                    self.partially_consumed_tab = false;
                    self.offset += 1;
                    self.column += 1;
                    count -= 1;
                }
            }
        }
    }

    fn add_child(&mut self, mut parent: Node<'a>, value: NodeValue) -> Node<'a> {
        while !can_contain_type(parent, &value) {
            parent = match self.finalize(parent) {
                Some(p) => p,
                None => break,
            };
        }

        let node = make_node(self.arena, value, self.line_number);
        node.data_mut().nesting = parent.data().nesting + 1;
        parent.append(node);
        node
    }

    fn add_text_to_container(
        &mut self,
        mut container: Node<'a>,
        last_matched_container: Node<'a>,
        line: &str,
    ) {
        self.find_first_nonspace(line);

        if self.blank {
            if let Some(last_child) = container.last_child() {
                last_child.data_mut().last_line_blank = true;
            }
        }

        let last_line_blank = self.blank
            && match container.data().value {
                NodeValue::BlockQuote | NodeValue::Heading(..) | NodeValue::ThematicBreak => false,
                NodeValue::CodeBlock(ref ncb) => !ncb.fenced,
                NodeValue::Item(..) => {
                    container.first_child().is_some()
                        || container.data().line != self.line_number
                }
                _ => true,
            };
        container.data_mut().last_line_blank = last_line_blank;

        let mut tmp = container;
        while let Some(parent) = tmp.parent() {
            parent.data_mut().last_line_blank = false;
            tmp = parent;
        }

        if !self.current.same_node(last_matched_container)
            && container.same_node(last_matched_container)
            && !self.blank
            && node_is(self.current, |v| matches!(v, NodeValue::Paragraph))
        {
            self.add_line(self.current, line);
            return;
        }

        while !self.current.same_node(last_matched_container) {
            match self.finalize(self.current) {
                Some(parent) => self.current = parent,
                None => break,
            }
        }

        let value = container.data().value.clone();
        match value {
            NodeValue::CodeBlock(..) => self.add_line(container, line),
            NodeValue::Math(ref m) if m.block => self.add_line(container, line),
            NodeValue::Html(ref h) if h.block => {
                self.add_line(container, line);

                if scanners::html_block_end(h.block_type, &line[self.first_nonspace..]) {
                    if let Some(parent) = self.finalize(container) {
                        container = parent;
                    }
                }
            }
            _ => {
                if self.blank {
                    // nothing to add
                } else if value.accepts_lines() {
                    let mut line = line;
                    if let NodeValue::Heading(ref nh) = value {
                        if !nh.setext {
                            line = strings::chop_trailing_hashes(line);
                        }
                    }

                    // `chop_trailing_hashes` may leave a heading like `###   ###`
                    // shorter than the recorded first non-space.
                    if self.first_nonspace <= line.len() {
                        let count = self.first_nonspace - self.offset;
                        self.advance_offset(line, count, false);
                        self.add_line(container, line);
                    }
                } else if !node_is(container, |v| matches!(v, NodeValue::Table(..))) {
                    container = self.add_child(container, NodeValue::Paragraph);
                    let count = self.first_nonspace - self.offset;
                    self.advance_offset(line, count, false);
                    self.add_line(container, line);
                }
            }
        }

        self.current = container;
    }

    fn add_line(&mut self, node: Node<'a>, line: &str) {
        let mut ast = node.data_mut();
        if self.partially_consumed_tab {
            self.offset += 1;
            let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
            for _ in 0..chars_to_tab {
                ast.content.push(' ');
            }
        }
        if self.offset < line.len() {
            ast.content.push_str(&line[self.offset..]);
        }
    }

    fn finalize_document(&mut self) {
        while !self.current.same_node(self.root) {
            match self.finalize(self.current) {
                Some(parent) => self.current = parent,
                None => break,
            }
        }

        self.finalize(self.root);
        self.process_inlines();
    }

    fn finalize(&mut self, node: Node<'a>) -> Option<Node<'a>> {
        let parent = node.parent();
        let mut content = mem::take(&mut node.data_mut().content);
        node.data_mut().open = false;

        let mut value = node.data().value.clone();
        match value {
            NodeValue::Paragraph => {
                let has_content = self.resolve_reference_link_definitions(&mut content);
                if !has_content {
                    node.detach();
                }
            }
            NodeValue::CodeBlock(ref mut ncb) => {
                if !ncb.fenced {
                    strings::remove_trailing_blank_lines(&mut content);
                    content.push('\n');
                } else {
                    let (info, rest) = split_first_line(&content);
                    let info = strings::unescape(&entity::unescape_html(strings::trim_str(info)));
                    ncb.info = info;
                    content = rest.to_string();
                }
                ncb.literal = mem::take(&mut content);
            }
            NodeValue::Math(ref mut m) if m.block => {
                let (_, rest) = split_first_line(&content);
                m.literal = rest.to_string();
                content.clear();
            }
            NodeValue::Html(ref mut h) if h.block => {
                h.literal = mem::take(&mut content);
            }
            NodeValue::List(ref mut nl) => {
                nl.tight = self.determine_list_tight(node);
            }
            _ => {}
        }

        let mut ast = node.data_mut();
        ast.value = value;
        ast.content = content;

        parent
    }

    fn resolve_reference_link_definitions(&mut self, content: &mut String) -> bool {
        if !self.registry.has_block(BlockTokenizer::Definition) {
            return !strings::is_blank(content);
        }

        let mut pos = 0;
        while content.as_bytes().get(pos) == Some(&b'[') {
            match self.parse_reference_inline(&content[pos..]) {
                Some((offset, rr)) => {
                    pos += offset;
                    if let Some((lab, rr)) = rr {
                        self.refmap.entry(lab).or_insert(rr);
                    }
                }
                None => break,
            }
        }

        if pos != 0 {
            content.drain(..pos);
        }

        !strings::is_blank(content)
    }

    fn parse_reference_inline(
        &self,
        content: &str,
    ) -> Option<(usize, Option<(String, ResolvedReference)>)> {
        let mut scanner = inlines::Scanner::new();

        let lab = match scanner.link_label(content) {
            Some(lab) if !lab.is_empty() => lab.to_string(),
            _ => return None,
        };

        if scanner.peek_byte(content) != Some(b':') {
            return None;
        }

        scanner.pos += 1;
        scanner.spnl(content);
        let (url, matchlen) = inlines::manual_scan_link_url(&content[scanner.pos..])?;
        let url = url.to_string();
        scanner.pos += matchlen;

        let beforetitle = scanner.pos;
        scanner.spnl(content);
        let title_search = if scanner.pos == beforetitle {
            None
        } else {
            scanners::link_title(&content[scanner.pos..])
        };
        let title = match title_search {
            Some(matchlen) => {
                let t = &content[scanner.pos..scanner.pos + matchlen];
                scanner.pos += matchlen;
                t
            }
            None => {
                scanner.pos = beforetitle;
                ""
            }
        };

        scanner.skip_spaces(content);
        if !scanner.skip_line_end(content) {
            if title.is_empty() {
                return None;
            }
            scanner.pos = beforetitle;
            scanner.skip_spaces(content);
            if !scanner.skip_line_end(content) {
                return None;
            }
        }

        let lab = strings::normalize_label(&lab, Case::Fold);
        let rr = (!lab.is_empty() && !self.refmap.contains_key(&lab)).then(|| {
            (
                lab,
                ResolvedReference {
                    url: strings::clean_url(&url),
                    title: strings::clean_title(title),
                },
            )
        });
        Some((scanner.pos, rr))
    }

    fn determine_list_tight(&self, node: Node<'a>) -> bool {
        let mut ch = node.first_child();

        while let Some(item) = ch {
            if item.data().last_line_blank && item.next_sibling().is_some() {
                return false;
            }

            let mut subch = item.first_child();
            while let Some(subitem) = subch {
                if (item.next_sibling().is_some() || subitem.next_sibling().is_some())
                    && ends_with_blank_line(subitem)
                {
                    return false;
                }
                subch = subitem.next_sibling();
            }

            ch = item.next_sibling();
        }

        true
    }

    fn process_inlines(&mut self) {
        let blocks: Vec<Node<'a>> = self
            .root
            .descendants()
            .filter(|n| n.data().value.contains_inlines())
            .collect();
        for node in blocks {
            self.parse_inlines(node);
        }
    }

    fn parse_inlines(&mut self, node: Node<'a>) {
        let (content, line, nesting) = {
            let mut ast = node.data_mut();
            (mem::take(&mut ast.content), ast.line, ast.nesting)
        };
        let content = strings::rtrim_str(&content);
        // Room left for inline layers between the block and its leaf text.
        let max_inline_nesting = self.max_nesting.saturating_sub(nesting + 1);

        let delimiter_arena = typed_arena::Arena::new();
        let mut subj = inlines::Subject::new(
            self.arena,
            self.registry,
            content,
            line,
            max_inline_nesting,
            &self.refmap,
            &delimiter_arena,
        );

        while subj.parse_inline(node) {}
        subj.process_emphasis(0);
        inlines::merge_adjacent_text(node);
    }
}

fn split_first_line(content: &str) -> (&str, &str) {
    match content.find('\n') {
        Some(eol) => (content[..eol].trim_end_matches('\r'), &content[eol + 1..]),
        None => (content, ""),
    }
}

fn parse_list_marker(
    line: &str,
    mut pos: usize,
    interrupts_paragraph: bool,
) -> Option<(usize, NodeList)> {
    let bytes = line.as_bytes();
    let mut c = *bytes.get(pos)?;
    let startpos = pos;

    // An empty item cannot interrupt a paragraph.
    let rest_is_empty = |from: usize| {
        bytes[from..]
            .iter()
            .find(|&&b| !strings::is_space_or_tab(b))
            .map_or(true, |&b| strings::is_line_end_char(b))
    };

    if c == b'*' || c == b'-' || c == b'+' {
        pos += 1;
        if !bytes.get(pos).map_or(true, |&b| strings::isspace(b)) {
            return None;
        }

        if interrupts_paragraph && rest_is_empty(pos) {
            return None;
        }

        return Some((
            pos - startpos,
            NodeList {
                list_type: ListType::Bullet,
                marker_offset: 0,
                padding: 0,
                start: 1,
                delimiter: ListDelimType::Period,
                bullet_char: c,
                tight: false,
            },
        ));
    }

    if c.is_ascii_digit() {
        let mut start: usize = 0;
        let mut digits = 0;

        while digits < 9 && bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            start = (10 * start) + (bytes[pos] - b'0') as usize;
            pos += 1;
            digits += 1;
        }

        if interrupts_paragraph && start != 1 {
            return None;
        }

        c = *bytes.get(pos)?;
        if c != b'.' && c != b')' {
            return None;
        }

        pos += 1;

        if !bytes.get(pos).map_or(true, |&b| strings::isspace(b)) {
            return None;
        }

        if interrupts_paragraph && rest_is_empty(pos) {
            return None;
        }

        return Some((
            pos - startpos,
            NodeList {
                list_type: ListType::Ordered,
                marker_offset: 0,
                padding: 0,
                start,
                delimiter: if c == b'.' {
                    ListDelimType::Period
                } else {
                    ListDelimType::Paren
                },
                bullet_char: 0,
                tight: false,
            },
        ));
    }

    None
}

fn lists_match(list_data: &NodeList, item_data: &NodeList) -> bool {
    list_data.list_type == item_data.list_type
        && list_data.delimiter == item_data.delimiter
        && list_data.bullet_char == item_data.bullet_char
}
