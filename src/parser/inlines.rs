//! The inline phase: turns the text content of a leaf block into inline
//! nodes.
//!
//! At every byte that some enabled tokenizer triggers on, the tokenizers
//! are offered the position in priority order and the first one to claim
//! it wins.  Emphasis and brackets are resolved through the delimiter stack
//! and bracket stack.

use std::cell::Cell;
use std::ptr;

use unicode_categories::UnicodeCategories;

use crate::entity;
use crate::nodes::{
    make_node, Arena, Node, NodeCode, NodeEmbed, NodeFootnoteDefinition, NodeFootnoteReference,
    NodeHtml, NodeLink, NodeMath, NodeMention, NodeValue,
};
use crate::parser::registry::{InlineTokenizer, Registry};
use crate::parser::RefMap;
use crate::scanners::{self, HtmlFlags};
use crate::strings::{self, ispunct, isspace, Case};

const MAXBACKTICKS: usize = 80;
const MAX_LINK_LABEL_LENGTH: usize = 1000;
const MAX_MENTION_LENGTH: usize = 64;
const MAX_PAREN_DEPTH: usize = 32;

/// A cursor over some input, shared by the inline phase and the parsing of
/// link reference definitions.
#[derive(Debug, Default)]
pub(crate) struct Scanner {
    pub pos: usize,
}

impl Scanner {
    pub fn new() -> Self {
        Scanner { pos: 0 }
    }

    #[inline]
    pub fn peek_byte(&self, input: &str) -> Option<u8> {
        self.peek_byte_n(input, 0)
    }

    #[inline]
    pub fn peek_byte_n(&self, input: &str, n: usize) -> Option<u8> {
        input.as_bytes().get(self.pos + n).copied()
    }

    #[inline]
    pub fn eof(&self, input: &str) -> bool {
        self.pos >= input.len()
    }

    pub fn skip_spaces(&mut self, input: &str) -> bool {
        let mut skipped = false;
        while matches!(self.peek_byte(input), Some(b' ' | b'\t')) {
            self.pos += 1;
            skipped = true;
        }
        skipped
    }

    pub fn skip_line_end(&mut self, input: &str) -> bool {
        let old_pos = self.pos;
        if self.peek_byte(input) == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek_byte(input) == Some(b'\n') {
            self.pos += 1;
        }
        self.pos > old_pos || self.eof(input)
    }

    pub fn spnl(&mut self, input: &str) {
        self.skip_spaces(input);
        if self.skip_line_end(input) {
            self.skip_spaces(input);
        }
    }

    pub fn take_while(&mut self, input: &str, c: u8) -> usize {
        let start_pos = self.pos;
        while self.peek_byte(input) == Some(c) {
            self.pos += 1;
        }
        self.pos - start_pos
    }

    /// `[label]`, returning the trimmed label.
    pub fn link_label<'i>(&mut self, input: &'i str) -> Option<&'i str> {
        let startpos = self.pos;

        if self.peek_byte(input) != Some(b'[') {
            return None;
        }

        self.pos += 1;

        let mut length = 0;
        loop {
            match self.peek_byte(input) {
                Some(b'[') | None => break,
                Some(b']') => {
                    let raw_label = strings::trim_str(&input[startpos + 1..self.pos]);
                    self.pos += 1;
                    return Some(raw_label);
                }
                Some(b'\\') => {
                    self.pos += 1;
                    length += 1;
                    if self.peek_byte(input).is_some_and(ispunct) {
                        self.pos += 1;
                        length += 1;
                    }
                }
                Some(_) => {
                    self.pos += 1;
                    length += 1;
                }
            }
            if length > MAX_LINK_LABEL_LENGTH {
                break;
            }
        }

        self.pos = startpos;
        None
    }
}

pub(crate) struct Delimiter<'a: 'd, 'd> {
    inl: Node<'a>,
    position: usize,
    length: usize,
    delim_char: u8,
    can_open: bool,
    can_close: bool,
    prev: Cell<Option<&'d Delimiter<'a, 'd>>>,
    next: Cell<Option<&'d Delimiter<'a, 'd>>>,
}

struct Bracket<'a> {
    inl_text: Node<'a>,
    position: usize,
    image: bool,
    active: bool,
    bracket_after: bool,
}

/// What a tokenizer made of the current position.
enum Claim<'a> {
    /// Not this tokenizer's syntax; the position is offered to the next one.
    Declined,
    /// A new inline to append to the block.
    Inline(Node<'a>),
    /// The input was consumed and the tree already updated.
    Handled,
}

pub(crate) struct Subject<'a: 'd, 'r, 'd, 'i> {
    arena: &'a Arena<'a>,
    registry: &'r Registry,
    input: &'i str,
    line: usize,
    max_nesting: usize,
    scanner: Scanner,
    refmap: &'r RefMap,
    delimiter_arena: &'d typed_arena::Arena<Delimiter<'a, 'd>>,
    last_delimiter: Option<&'d Delimiter<'a, 'd>>,
    brackets: Vec<Bracket<'a>>,
    backticks: [usize; MAXBACKTICKS + 1],
    scanned_for_backticks: bool,
    unclosed_dollars: [bool; 3],
    html_flags: HtmlFlags,
    unclosed_embed: bool,
    unclosed_display_mention: bool,
    special_chars: [bool; 256],
}

impl<'a, 'r, 'd, 'i> Subject<'a, 'r, 'd, 'i> {
    pub fn new(
        arena: &'a Arena<'a>,
        registry: &'r Registry,
        input: &'i str,
        line: usize,
        max_nesting: usize,
        refmap: &'r RefMap,
        delimiter_arena: &'d typed_arena::Arena<Delimiter<'a, 'd>>,
    ) -> Self {
        let mut special_chars = [false; 256];
        special_chars[b'\r' as usize] = true;
        special_chars[b'\n' as usize] = true;
        for &tokenizer in registry.inline_tokenizers() {
            for c in 0..=u8::MAX {
                if tokenizer.triggers_on(c) {
                    special_chars[c as usize] = true;
                }
            }
        }

        Subject {
            arena,
            registry,
            input,
            line,
            max_nesting,
            scanner: Scanner::new(),
            refmap,
            delimiter_arena,
            last_delimiter: None,
            brackets: vec![],
            backticks: [0; MAXBACKTICKS + 1],
            scanned_for_backticks: false,
            unclosed_dollars: [false; 3],
            html_flags: HtmlFlags::default(),
            unclosed_embed: false,
            unclosed_display_mention: false,
            special_chars,
        }
    }

    #[inline]
    fn pos(&self) -> usize {
        self.scanner.pos
    }

    #[inline]
    fn peek_byte(&self) -> Option<u8> {
        self.scanner.peek_byte(self.input)
    }

    #[inline]
    fn peek_byte_n(&self, n: usize) -> Option<u8> {
        self.scanner.peek_byte_n(self.input, n)
    }

    /// Parse the next inline at the cursor and append it to `node`.
    /// Returns `false` once the input is exhausted.
    pub fn parse_inline(&mut self, node: Node<'a>) -> bool {
        let Some(c) = self.peek_byte() else {
            return false;
        };

        let new_inl = match c {
            b'\r' | b'\n' => Some(self.handle_newline()),
            c if self.special_chars[c as usize] => self.handle_special(c, node),
            _ => self.text_run(self.pos(), node),
        };

        if let Some(inl) = new_inl {
            node.append(inl);
        }

        true
    }

    fn handle_special(&mut self, c: u8, node: Node<'a>) -> Option<Node<'a>> {
        let start = self.pos();
        let registry = self.registry;
        for &tokenizer in registry.inline_tokenizers() {
            if !tokenizer.triggers_on(c) {
                continue;
            }
            match self.try_tokenizer(tokenizer, c) {
                Claim::Inline(inl) => return Some(inl),
                Claim::Handled => return None,
                Claim::Declined => self.scanner.pos = start,
            }
        }

        // Nobody claimed the byte: it is plain text.
        self.scanner.pos += 1;
        self.text_run(start, node)
    }

    fn try_tokenizer(&mut self, tokenizer: InlineTokenizer, c: u8) -> Claim<'a> {
        match tokenizer {
            InlineTokenizer::Escape => self.handle_backslash(),
            InlineTokenizer::Entity => self.handle_entity(),
            InlineTokenizer::CodeSpan => Claim::Inline(self.handle_backticks()),
            InlineTokenizer::InlineMath => Claim::Inline(self.handle_dollars()),
            InlineTokenizer::Autolink if c == b'<' => self.handle_autolink(),
            InlineTokenizer::Autolink => self.handle_bare_url(),
            InlineTokenizer::Html => self.handle_html(),
            InlineTokenizer::Embed => self.handle_embed(),
            InlineTokenizer::Image if c == b'!' => self.handle_image_open(),
            InlineTokenizer::FootnoteReference => self.handle_footnote_reference(),
            InlineTokenizer::Link if c == b'[' => {
                self.scanner.pos += 1;
                let inl = self.make_inline(NodeValue::Text("[".to_string()));
                self.push_bracket(false, inl);
                Claim::Inline(inl)
            }
            InlineTokenizer::Image | InlineTokenizer::Link => self.handle_close_bracket(),
            InlineTokenizer::Emphasis => Claim::Inline(self.handle_delim(c)),
            InlineTokenizer::Mention => self.handle_mention(),
        }
    }

    fn make_inline(&self, value: NodeValue) -> Node<'a> {
        let node = make_node(self.arena, value, self.line);
        node.data_mut().open = false;
        node
    }

    fn find_special_char(&self) -> usize {
        let bytes = self.input.as_bytes();
        for n in self.pos()..bytes.len() {
            let c = bytes[n];
            if self.special_chars[c as usize] && (c != b'h' || self.could_start_bare_url(n)) {
                return n;
            }
        }
        bytes.len()
    }

    fn could_start_bare_url(&self, n: usize) -> bool {
        let bytes = self.input.as_bytes();
        bytes[n..].starts_with(b"http") && (n == 0 || !bytes[n - 1].is_ascii_alphanumeric())
    }

    /// Plain text from `start` up to the next byte some tokenizer may claim.
    fn text_run(&mut self, start: usize, node: Node<'a>) -> Option<Node<'a>> {
        let end = self.find_special_char().max(self.pos());
        self.scanner.pos = end;

        let mut contents = &self.input[start..end];
        if self
            .peek_byte()
            .is_some_and(strings::is_line_end_char)
        {
            contents = strings::rtrim_str(contents);
        }

        // Leading space after a hard break was already consumed as indentation.
        if node
            .last_child()
            .is_some_and(|n| matches!(n.data().value, NodeValue::LineBreak))
        {
            contents = strings::ltrim_str(contents);
        }

        if contents.is_empty() {
            None
        } else {
            Some(self.make_inline(NodeValue::Text(contents.to_string())))
        }
    }

    fn handle_newline(&mut self) -> Node<'a> {
        let nlpos = self.pos();
        self.scanner.skip_line_end(self.input);
        let bytes = self.input.as_bytes();
        let inl = if nlpos > 1 && bytes[nlpos - 1] == b' ' && bytes[nlpos - 2] == b' ' {
            self.make_inline(NodeValue::LineBreak)
        } else {
            self.make_inline(NodeValue::SoftBreak)
        };
        self.line += 1;
        self.scanner.skip_spaces(self.input);
        inl
    }

    fn handle_backslash(&mut self) -> Claim<'a> {
        self.scanner.pos += 1;

        match self.peek_byte() {
            Some(c) if ispunct(c) => {
                self.scanner.pos += 1;
                Claim::Inline(self.make_inline(NodeValue::Text((c as char).to_string())))
            }
            Some(b'\r' | b'\n') => {
                self.scanner.skip_line_end(self.input);
                let inl = self.make_inline(NodeValue::LineBreak);
                self.line += 1;
                self.scanner.skip_spaces(self.input);
                Claim::Inline(inl)
            }
            _ => Claim::Declined,
        }
    }

    fn handle_entity(&mut self) -> Claim<'a> {
        match entity::unescape(&self.input[self.pos() + 1..]) {
            Some((entity, len)) => {
                self.scanner.pos += 1 + len;
                Claim::Inline(self.make_inline(NodeValue::Text(entity)))
            }
            None => Claim::Declined,
        }
    }

    fn count_lines(&mut self, from: usize, to: usize) {
        self.line += self.input[from..to].bytes().filter(|&b| b == b'\n').count();
    }

    fn scan_to_closing_backtick(&mut self, openticklength: usize) -> Option<usize> {
        if openticklength > MAXBACKTICKS {
            return None;
        }

        if self.scanned_for_backticks && self.backticks[openticklength] <= self.pos() {
            return None;
        }

        loop {
            while self.peek_byte().is_some_and(|c| c != b'`') {
                self.scanner.pos += 1;
            }
            if self.scanner.eof(self.input) {
                self.scanned_for_backticks = true;
                return None;
            }
            let numticks = self.scanner.take_while(self.input, b'`');
            if numticks <= MAXBACKTICKS {
                self.backticks[numticks] = self.pos() - numticks;
            }
            if numticks == openticklength {
                return Some(self.pos());
            }
        }
    }

    fn handle_backticks(&mut self) -> Node<'a> {
        let startpos = self.pos();
        let openticks = self.scanner.take_while(self.input, b'`');
        let endpos = self.scan_to_closing_backtick(openticks);

        match endpos {
            None => {
                self.scanner.pos = startpos + openticks;
                self.make_inline(NodeValue::Text("`".repeat(openticks)))
            }
            Some(endpos) => {
                let buf = &self.input[startpos + openticks..endpos - openticks];
                let code = NodeCode {
                    num_backticks: openticks,
                    literal: strings::normalize_code(buf),
                };
                let node = self.make_inline(NodeValue::Code(code));
                self.count_lines(startpos, endpos);
                node
            }
        }
    }

    /// The end of the code span opening at `from`, or just past the
    /// backtick run when it never closes.
    fn skip_code_span(&self, from: usize) -> usize {
        let bytes = self.input.as_bytes();
        let run = bytes[from..].iter().take_while(|&&b| b == b'`').count();
        let mut i = from + run;
        while i < bytes.len() {
            if bytes[i] == b'`' {
                let len = bytes[i..].iter().take_while(|&&b| b == b'`').count();
                if len == run {
                    return i + len;
                }
                i += len;
            } else {
                i += 1;
            }
        }
        from + run
    }

    fn scan_to_closing_dollar(&mut self, opendollars: usize) -> Option<usize> {
        // no space after a single opening $
        if opendollars == 1 && self.peek_byte().is_some_and(isspace) {
            return None;
        }

        // A run that found no closer once will not find one further on.
        if self.unclosed_dollars[opendollars] {
            return None;
        }

        let code_spans = self.registry.has_inline(InlineTokenizer::CodeSpan);
        let bytes = self.input.as_bytes();
        loop {
            let Some(c) = self.peek_byte() else {
                self.unclosed_dollars[opendollars] = true;
                return None;
            };
            match c {
                b'\\' => self.scanner.pos += 2,
                b'`' if code_spans => self.scanner.pos = self.skip_code_span(self.pos()),
                b'$' => {
                    let before = bytes[self.pos() - 1];
                    let numdollars = self.scanner.take_while(self.input, b'$');
                    if numdollars != opendollars {
                        continue;
                    }
                    if opendollars == 1
                        && (isspace(before) || self.peek_byte().is_some_and(|c| c.is_ascii_digit()))
                    {
                        continue;
                    }
                    return Some(self.pos());
                }
                _ => self.scanner.pos += 1,
            }
        }
    }

    fn handle_dollars(&mut self) -> Node<'a> {
        let startpos = self.pos();
        let opendollars = self.scanner.take_while(self.input, b'$');

        let endpos = if opendollars <= 2 {
            self.scan_to_closing_dollar(opendollars)
                .filter(|&endpos| endpos - startpos > opendollars * 2)
        } else {
            None
        };

        match endpos {
            Some(endpos) => {
                let literal = &self.input[startpos + opendollars..endpos - opendollars];
                let math = NodeMath {
                    display_math: opendollars == 2,
                    block: false,
                    literal: literal.to_string(),
                };
                let node = self.make_inline(NodeValue::Math(math));
                self.count_lines(startpos, endpos);
                node
            }
            None => {
                self.scanner.pos = startpos + opendollars;
                self.make_inline(NodeValue::Text("$".repeat(opendollars)))
            }
        }
    }

    fn make_autolink(&self, url: String, text: &str) -> Node<'a> {
        let inl = self.make_inline(NodeValue::Link(NodeLink {
            url,
            title: String::new(),
        }));
        inl.append(self.make_inline(NodeValue::Text(text.to_string())));
        inl
    }

    fn handle_autolink(&mut self) -> Claim<'a> {
        let start = self.pos() + 1;
        let rest = &self.input.as_bytes()[start..];

        if let Some(matchlen) = scanners::autolink_uri(rest) {
            let raw = &self.input[start..start + matchlen - 1];
            self.scanner.pos = start + matchlen;
            let text = entity::unescape_html(raw);
            return Claim::Inline(self.make_autolink(text.clone(), &text));
        }

        if let Some(matchlen) = scanners::autolink_email(rest) {
            let raw = &self.input[start..start + matchlen - 1];
            self.scanner.pos = start + matchlen;
            let text = entity::unescape_html(raw);
            return Claim::Inline(self.make_autolink(format!("mailto:{}", text), &text));
        }

        Claim::Declined
    }

    /// `http://…` and `https://…` written out in running text.
    fn handle_bare_url(&mut self) -> Claim<'a> {
        let start = self.pos();
        if !self.brackets.is_empty() || !self.could_start_bare_url(start) {
            return Claim::Declined;
        }

        let rest = &self.input[start..];
        let scheme_len = if rest.starts_with("https://") {
            8
        } else if rest.starts_with("http://") {
            7
        } else {
            return Claim::Declined;
        };

        let bytes = rest.as_bytes();
        let mut end = bytes
            .iter()
            .position(|&b| isspace(b) || b == b'<')
            .unwrap_or(bytes.len());

        let opens = bytes[..end].iter().filter(|&&b| b == b'(').count();
        let mut closes = bytes[..end].iter().filter(|&&b| b == b')').count();
        loop {
            match bytes[..end].last() {
                Some(b'?' | b'!' | b'.' | b',' | b':' | b';' | b'*' | b'_' | b'~' | b'\'' | b'"') => {
                    end -= 1
                }
                Some(b')') if closes > opens => {
                    closes -= 1;
                    end -= 1;
                }
                _ => break,
            }
        }

        if end <= scheme_len {
            return Claim::Declined;
        }

        let url = &rest[..end];
        self.scanner.pos = start + end;
        Claim::Inline(self.make_autolink(url.to_string(), url))
    }

    fn handle_html(&mut self) -> Claim<'a> {
        let start = self.pos();
        match scanners::html_tag(&self.input.as_bytes()[start + 1..], &mut self.html_flags) {
            Some(matchlen) => {
                let end = start + 1 + matchlen;
                let literal = self.input[start..end].to_string();
                self.scanner.pos = end;
                self.count_lines(start, end);
                Claim::Inline(self.make_inline(NodeValue::Html(NodeHtml {
                    block: false,
                    block_type: 0,
                    literal,
                })))
            }
            None => Claim::Declined,
        }
    }

    /// `!(https://…)`
    fn handle_embed(&mut self) -> Claim<'a> {
        let start = self.pos();
        let rest = &self.input[start..];
        if !(rest.starts_with("!(https://") || rest.starts_with("!(http://")) {
            return Claim::Declined;
        }

        if self.unclosed_embed {
            return Claim::Declined;
        }
        let Some(close) = rest[2..].find(|c: char| c == ')' || c.is_whitespace()) else {
            self.unclosed_embed = true;
            return Claim::Declined;
        };
        if rest.as_bytes()[2 + close] != b')' {
            return Claim::Declined;
        }

        let url = rest[2..2 + close].to_string();
        self.scanner.pos = start + 2 + close + 1;
        Claim::Inline(self.make_inline(NodeValue::Embed(NodeEmbed {
            url,
            provider: None,
            src: None,
        })))
    }

    fn handle_image_open(&mut self) -> Claim<'a> {
        if self.peek_byte_n(1) != Some(b'[') {
            return Claim::Declined;
        }
        self.scanner.pos += 2;
        let inl = self.make_inline(NodeValue::Text("![".to_string()));
        self.push_bracket(true, inl);
        Claim::Inline(inl)
    }

    /// `[^name]`, or `[^some text]` for a note written in place.
    fn handle_footnote_reference(&mut self) -> Claim<'a> {
        if self.peek_byte_n(1) != Some(b'^') {
            return Claim::Declined;
        }

        let start = self.pos() + 2;
        let bytes = self.input.as_bytes();
        let len = bytes[start..]
            .iter()
            .take(MAX_LINK_LABEL_LENGTH + 1)
            .take_while(|&&b| b != b']' && b != b'[')
            .count();
        if len == 0 || len > MAX_LINK_LABEL_LENGTH || bytes.get(start + len) != Some(&b']') {
            return Claim::Declined;
        }

        let label = &self.input[start..start + len];
        let inline_note = label.bytes().any(isspace);
        if inline_note && strings::trim_str(label).is_empty() {
            return Claim::Declined;
        }

        self.scanner.pos = start + len + 1;
        let reference = self.make_inline(NodeValue::FootnoteReference(NodeFootnoteReference {
            name: if inline_note {
                String::new()
            } else {
                label.to_string()
            },
            ix: 0,
            ref_num: 0,
        }));

        if inline_note {
            let definition = self.inline_note(label);
            reference.data_mut().nesting = definition.data().nesting + 1;
            reference.append(definition);
            self.count_lines(start, start + len);
        }
        Claim::Inline(reference)
    }

    /// An anonymous footnote definition holding `text` as its only
    /// paragraph.  It hangs below its reference until footnotes are
    /// numbered.
    fn inline_note(&self, text: &str) -> Node<'a> {
        let definition = self.make_inline(NodeValue::FootnoteDefinition(
            NodeFootnoteDefinition::default(),
        ));
        let paragraph = self.make_inline(NodeValue::Paragraph);
        definition.append(paragraph);

        let delimiter_arena = typed_arena::Arena::new();
        let mut subj = Subject::new(
            self.arena,
            self.registry,
            strings::trim_str(text),
            self.line,
            self.max_nesting.saturating_sub(3),
            self.refmap,
            &delimiter_arena,
        );
        while subj.parse_inline(paragraph) {}
        subj.process_emphasis(0);
        merge_adjacent_text(paragraph);

        let nesting = paragraph.children().map(|n| n.data().nesting).max().unwrap_or(0);
        paragraph.data_mut().nesting = nesting + 1;
        definition.data_mut().nesting = nesting + 2;
        definition
    }

    /// `@name` or `@**display name**`.
    fn handle_mention(&mut self) -> Claim<'a> {
        let start = self.pos();
        if self.input[..start]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric)
        {
            return Claim::Declined;
        }

        let rest = &self.input[start + 1..];
        let (name, consumed) = if let Some(display) = rest.strip_prefix("**") {
            if self.unclosed_display_mention {
                return Claim::Declined;
            }
            let Some(close) = display.find("**") else {
                self.unclosed_display_mention = true;
                return Claim::Declined;
            };
            let name = &display[..close];
            if name.contains(['\r', '\n']) {
                return Claim::Declined;
            }
            (name.trim(), 2 + close + 2)
        } else {
            let len = rest
                .bytes()
                .position(|b| !(b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')))
                .unwrap_or(rest.len());
            let name = rest[..len].trim_end_matches(['.', '-']);
            (name, name.len())
        };

        if name.is_empty() || name.chars().count() > MAX_MENTION_LENGTH {
            return Claim::Declined;
        }

        let end = start + 1 + consumed;
        let mention = NodeMention {
            name: name.to_string(),
            literal: self.input[start..end].to_string(),
        };
        self.scanner.pos = end;
        Claim::Inline(self.make_inline(NodeValue::Mention(mention)))
    }

    ////////////////////
    // Emphasis       //
    ////////////////////

    fn char_before(&self, pos: usize) -> char {
        self.input[..pos].chars().next_back().unwrap_or('\n')
    }

    fn char_at(&self, pos: usize) -> char {
        self.input[pos..].chars().next().unwrap_or('\n')
    }

    fn scan_delims(&mut self, c: u8) -> (usize, bool, bool) {
        let before_char = self.char_before(self.pos());
        let numdelims = self.scanner.take_while(self.input, c);
        let after_char = self.char_at(self.pos());

        let left_flanking = numdelims > 0
            && !after_char.is_whitespace()
            && (!is_punctuation(after_char)
                || before_char.is_whitespace()
                || is_punctuation(before_char));
        let right_flanking = numdelims > 0
            && !before_char.is_whitespace()
            && (!is_punctuation(before_char)
                || after_char.is_whitespace()
                || is_punctuation(after_char));

        if c == b'_' {
            (
                numdelims,
                left_flanking && (!right_flanking || is_punctuation(before_char)),
                right_flanking && (!left_flanking || is_punctuation(after_char)),
            )
        } else {
            (numdelims, left_flanking, right_flanking)
        }
    }

    fn handle_delim(&mut self, c: u8) -> Node<'a> {
        let start = self.pos();
        let (numdelims, can_open, can_close) = self.scan_delims(c);

        let inl = self.make_inline(NodeValue::Text(self.input[start..self.pos()].to_string()));

        if can_open || can_close {
            self.push_delimiter(c, numdelims, can_open, can_close, inl);
        }

        inl
    }

    fn push_delimiter(&mut self, c: u8, length: usize, can_open: bool, can_close: bool, inl: Node<'a>) {
        let d = self.delimiter_arena.alloc(Delimiter {
            prev: Cell::new(self.last_delimiter),
            next: Cell::new(None),
            inl,
            position: self.pos(),
            length,
            delim_char: c,
            can_open,
            can_close,
        });
        if let Some(prev) = self.last_delimiter {
            prev.next.set(Some(d));
        }
        self.last_delimiter = Some(d);
    }

    /// Match closers against openers from `stack_bottom` upwards, lowering
    /// the nodes between each matched pair into an `Emph` or `Strong`.
    pub fn process_emphasis(&mut self, stack_bottom: usize) {
        // Where the search for an opener of each kind last came up empty.
        // `_` uses slot 0; `*` is further split by whether the closer can
        // also open and by its length modulo 3.
        let mut openers_bottom = [stack_bottom; 7];

        let mut candidate = self.last_delimiter;
        let mut closer: Option<&'d Delimiter<'a, 'd>> = None;
        while let Some(c) = candidate.filter(|c| c.position >= stack_bottom) {
            closer = Some(c);
            candidate = c.prev.get();
        }

        while let Some(c) = closer {
            if !c.can_close {
                closer = c.next.get();
                continue;
            }

            let ix = match c.delim_char {
                b'_' => 0,
                _ => 1 + (if c.can_open { 3 } else { 0 }) + c.length % 3,
            };

            let mut opener = c.prev.get();
            let mut opener_found = false;
            let mut mod_three_rule_invoked = false;

            while let Some(o) = opener.filter(|o| o.position >= openers_bottom[ix]) {
                if o.can_open && o.delim_char == c.delim_char {
                    // "***hello*there**": an opener and closer pair whose
                    // lengths sum to a multiple of three cannot match when
                    // either side could both open and close.
                    let odd_match = (c.can_open || o.can_close)
                        && (o.length + c.length) % 3 == 0
                        && !(o.length % 3 == 0 && c.length % 3 == 0);
                    if !odd_match {
                        opener_found = true;
                        break;
                    }
                    mod_three_rule_invoked = true;
                }
                opener = o.prev.get();
            }

            if let Some(o) = opener.filter(|_| opener_found) {
                if nesting_after(o.inl, Some(c.inl)) < self.max_nesting {
                    closer = self.insert_emph(o, c);
                    continue;
                }
                // Whatever would wrap this span is already too deep.
                openers_bottom = [c.position; 7];
                mod_three_rule_invoked = false;
            }

            closer = c.next.get();
            if !mod_three_rule_invoked {
                openers_bottom[ix] = c.position;
            }
            if !c.can_open {
                self.remove_delimiter(c);
            }
        }

        while let Some(d) = self.last_delimiter.filter(|d| d.position >= stack_bottom) {
            self.remove_delimiter(d);
        }
    }

    fn remove_delimiter(&mut self, delimiter: &'d Delimiter<'a, 'd>) {
        match delimiter.next.get() {
            None => self.last_delimiter = delimiter.prev.get(),
            Some(next) => next.prev.set(delimiter.prev.get()),
        }
        if let Some(prev) = delimiter.prev.get() {
            prev.next.set(delimiter.next.get());
        }
    }

    fn insert_emph(
        &mut self,
        opener: &'d Delimiter<'a, 'd>,
        closer: &'d Delimiter<'a, 'd>,
    ) -> Option<&'d Delimiter<'a, 'd>> {
        let text_len = |d: &Delimiter<'a, 'd>| d.inl.data().value.text().map_or(0, String::len);
        let mut opener_num_chars = text_len(opener);
        let mut closer_num_chars = text_len(closer);
        let use_delims = if closer_num_chars >= 2 && opener_num_chars >= 2 {
            2
        } else {
            1
        };

        opener_num_chars -= use_delims;
        closer_num_chars -= use_delims;

        for (d, len) in [(opener, opener_num_chars), (closer, closer_num_chars)] {
            if let Some(t) = d.inl.data_mut().value.text_mut() {
                t.truncate(len);
            }
        }

        // Everything between the pair is plain text by now.
        let mut delim = closer.prev.get();
        while let Some(d) = delim.filter(|d| !ptr::eq(*d, opener)) {
            self.remove_delimiter(d);
            delim = d.prev.get();
        }

        let emph = self.make_inline(if use_delims == 1 {
            NodeValue::Emph
        } else {
            NodeValue::Strong
        });

        let mut nesting = 0;
        let mut tmp = opener.inl.next_sibling();
        while let Some(n) = tmp.filter(|n| !n.same_node(closer.inl)) {
            tmp = n.next_sibling();
            nesting = nesting.max(n.data().nesting);
            emph.append(n);
        }
        emph.data_mut().nesting = nesting + 1;
        opener.inl.insert_after(emph);

        if opener_num_chars == 0 {
            opener.inl.detach();
            self.remove_delimiter(opener);
        }

        if closer_num_chars == 0 {
            closer.inl.detach();
            self.remove_delimiter(closer);
            closer.next.get()
        } else {
            Some(closer)
        }
    }

    ////////////////////
    // Brackets       //
    ////////////////////

    fn push_bracket(&mut self, image: bool, inl_text: Node<'a>) {
        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
        }
        self.brackets.push(Bracket {
            inl_text,
            position: self.pos(),
            image,
            active: true,
            bracket_after: false,
        });
    }

    fn handle_close_bracket(&mut self) -> Claim<'a> {
        self.scanner.pos += 1;
        let initial_pos = self.pos();

        let Some(bracket) = self.brackets.last() else {
            return Claim::Inline(self.make_inline(NodeValue::Text("]".to_string())));
        };
        let (is_image, active, bracket_after, bracket_pos) = (
            bracket.image,
            bracket.active,
            bracket.bracket_after,
            bracket.position,
        );

        if !active {
            self.brackets.pop();
            return Claim::Inline(self.make_inline(NodeValue::Text("]".to_string())));
        }

        // Inline destination: `(url "title")`.
        if self.peek_byte() == Some(b'(') {
            let bytes = self.input.as_bytes();
            let sps = spacechars(&bytes[initial_pos + 1..]);
            let starturl = initial_pos + 1 + sps;
            if let Some((url, n)) = manual_scan_link_url(&self.input[starturl..]) {
                let endurl = starturl + n;
                let starttitle = endurl + spacechars(&bytes[endurl..]);
                let endtitle = if starttitle == endurl {
                    starttitle
                } else {
                    starttitle + scanners::link_title(&self.input[starttitle..]).unwrap_or(0)
                };
                let endall = endtitle + spacechars(&bytes[endtitle..]);

                if bytes.get(endall) == Some(&b')') {
                    let url = strings::clean_url(url);
                    let title = strings::clean_title(&self.input[starttitle..endtitle]);
                    if !self.close_bracket_match(is_image, url, title) {
                        return self.unmatched_close_bracket(initial_pos);
                    }
                    self.count_lines(initial_pos, endall);
                    self.scanner.pos = endall + 1;
                    return Claim::Handled;
                }
            }
        }

        // Reference link: `[text][label]`, `[text][]` or `[text]`.
        let mut label = self.scanner.link_label(self.input).map(str::to_string);
        if label.is_none() {
            self.scanner.pos = initial_pos;
        }
        if label.as_deref().map_or(true, str::is_empty) && !bracket_after {
            label = Some(self.input[bracket_pos..initial_pos - 1].to_string());
        }

        let reference = label
            .map(|l| strings::normalize_label(&l, Case::Fold))
            .and_then(|l| self.refmap.get(&l).cloned());

        if let Some(reference) = reference {
            if !self.close_bracket_match(is_image, reference.url, reference.title) {
                return self.unmatched_close_bracket(initial_pos);
            }
            return Claim::Handled;
        }

        self.unmatched_close_bracket(initial_pos)
    }

    fn unmatched_close_bracket(&mut self, initial_pos: usize) -> Claim<'a> {
        self.brackets.pop();
        self.scanner.pos = initial_pos;
        Claim::Inline(self.make_inline(NodeValue::Text("]".to_string())))
    }

    /// Wrap everything after the innermost bracket into a link or image.
    /// Returns `false`, leaving the bracket in place, when the result would
    /// nest too deeply.
    fn close_bracket_match(&mut self, is_image: bool, url: String, title: String) -> bool {
        let Some((inl_text, position)) = self.brackets.last().map(|b| (b.inl_text, b.position))
        else {
            return false;
        };

        self.process_emphasis(position);

        let nesting = nesting_after(inl_text, None);
        if nesting >= self.max_nesting {
            // Every open bracket encloses this span too.
            for b in &mut self.brackets {
                b.active = false;
            }
            return false;
        }
        self.brackets.pop();

        let nl = NodeLink { url, title };
        let inl = self.make_inline(if is_image {
            NodeValue::Image(nl)
        } else {
            NodeValue::Link(nl)
        });
        inl.data_mut().nesting = nesting + 1;

        inl_text.insert_before(inl);
        let mut tmpch = inl_text.next_sibling();
        while let Some(tmp) = tmpch {
            tmpch = tmp.next_sibling();
            inl.append(tmp);
        }
        inl_text.detach();

        // Links may not contain other links.
        if !is_image {
            for b in self.brackets.iter_mut().filter(|b| !b.image) {
                b.active = false;
            }
        }
        true
    }
}

/// The deepest inline nesting among the siblings after `from`, up to but
/// excluding `until`.
fn nesting_after<'a>(from: Node<'a>, until: Option<Node<'a>>) -> usize {
    let mut nesting = 0;
    let mut sibling = from.next_sibling();
    while let Some(n) = sibling.filter(|n| until.map_or(true, |u| !n.same_node(u))) {
        nesting = nesting.max(n.data().nesting);
        sibling = n.next_sibling();
    }
    nesting
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || c.is_punctuation() || c.is_symbol()
}

fn spacechars(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|&&b| isspace(b)).count()
}

/// A link destination, either `<…>` or a run with balanced parentheses.
/// Returns the raw destination and the number of bytes consumed.
pub(crate) fn manual_scan_link_url(input: &str) -> Option<(&str, usize)> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    if bytes.first() == Some(&b'<') {
        i += 1;
        while i < len {
            match bytes[i] {
                b'>' => return Some((&input[1..i], i + 1)),
                b'\\' => i += 2,
                b'\n' | b'<' => return None,
                _ => i += 1,
            }
        }
        return None;
    }

    let mut nb_p = 0;
    while i < len {
        match bytes[i] {
            b'\\' if i + 1 < len && ispunct(bytes[i + 1]) => i += 2,
            b'(' => {
                nb_p += 1;
                i += 1;
                if nb_p > MAX_PAREN_DEPTH {
                    return None;
                }
            }
            b')' => {
                if nb_p == 0 {
                    break;
                }
                nb_p -= 1;
                i += 1;
            }
            b if isspace(b) || b.is_ascii_control() => break,
            _ => i += 1,
        }
    }

    if i == 0 && bytes.first() != Some(&b')') || nb_p != 0 {
        return None;
    }

    Some((&input[..i], i))
}

/// Join runs of adjacent text nodes below `node`.
pub(crate) fn merge_adjacent_text<'a>(node: Node<'a>) {
    let texts: Vec<Node<'a>> = node
        .descendants()
        .filter(|n| matches!(n.data().value, NodeValue::Text(..)))
        .collect();

    for text in texts {
        if text.parent().is_none() {
            continue;
        }
        while let Some(next) = text.next_sibling() {
            let Some(more) = next.data().value.text().cloned() else {
                break;
            };
            if let Some(t) = text.data_mut().value.text_mut() {
                t.push_str(&more);
            }
            next.detach();
        }
    }
}
