//! Hand-written line and tag scanners.
//!
//! Each scanner looks at the start of its input and returns the length of
//! the match, if any.

use crate::strings::{is_line_end_char, is_space_or_tab, isspace};

pub enum SetextChar {
    Equals,
    Hyphen,
}

fn rest_is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| is_space_or_tab(b) || is_line_end_char(b))
}

fn run_of(bytes: &[u8], c: u8) -> usize {
    bytes.iter().take_while(|&&b| b == c).count()
}

pub fn atx_heading_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let hashes = run_of(bytes, b'#');
    if !(1..=6).contains(&hashes) {
        return None;
    }
    match bytes.get(hashes) {
        None => Some(hashes),
        Some(&b) if is_line_end_char(b) => Some(hashes),
        Some(&b) if is_space_or_tab(b) => {
            Some(hashes + bytes[hashes..].iter().take_while(|&&b| is_space_or_tab(b)).count())
        }
        _ => None,
    }
}

pub fn open_code_fence(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let c = *bytes.first()?;
    if c != b'`' && c != b'~' {
        return None;
    }
    let len = run_of(bytes, c);
    if len < 3 {
        return None;
    }
    if c == b'`' && bytes[len..].contains(&b'`') {
        return None;
    }
    Some(len)
}

pub fn close_code_fence(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let c = *bytes.first()?;
    if c != b'`' && c != b'~' {
        return None;
    }
    let len = run_of(bytes, c);
    if len >= 3 && rest_is_blank(&bytes[len..]) {
        Some(len)
    } else {
        None
    }
}

/// A `$$` line opening or closing a display math block.
pub fn math_fence(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    if bytes.starts_with(b"$$") && rest_is_blank(&bytes[2..]) {
        Some(2)
    } else {
        None
    }
}

pub fn setext_heading_line(line: &str) -> Option<SetextChar> {
    let bytes = line.as_bytes();
    let (c, kind) = match bytes.first() {
        Some(b'=') => (b'=', SetextChar::Equals),
        Some(b'-') => (b'-', SetextChar::Hyphen),
        _ => return None,
    };
    let len = run_of(bytes, c);
    if rest_is_blank(&bytes[len..]) {
        Some(kind)
    } else {
        None
    }
}

pub fn thematic_break(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let c = *bytes.first()?;
    if c != b'*' && c != b'-' && c != b'_' {
        return None;
    }
    let mut count = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == c {
            count += 1;
        } else if is_line_end_char(b) {
            return if count >= 3 { Some(i) } else { None };
        } else if !is_space_or_tab(b) {
            return None;
        }
    }
    if count >= 3 {
        Some(bytes.len())
    } else {
        None
    }
}

/// `[^label]:` plus trailing spaces.
pub fn footnote_definition(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    if !bytes.starts_with(b"[^") {
        return None;
    }
    let label = bytes[2..]
        .iter()
        .take_while(|&&b| !matches!(b, b']' | b' ' | b'\t' | b'\r' | b'\n' | 0))
        .count();
    if label == 0 {
        return None;
    }
    let mut i = 2 + label;
    if bytes.get(i) != Some(&b']') || bytes.get(i + 1) != Some(&b':') {
        return None;
    }
    i += 2;
    i += bytes[i..].iter().take_while(|&&b| is_space_or_tab(b)).count();
    Some(i)
}

const BLOCK_TAG_NAMES: [&str; 62] = [
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "search", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track", "ul",
];

const RAW_TAG_NAMES: [&str; 4] = ["pre", "script", "style", "textarea"];

fn tag_name_len(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() => bytes
            .iter()
            .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'-')
            .count(),
        _ => 0,
    }
}

/// HTML block start conditions 1 to 6.  Returns the condition number.
pub fn html_block_start(line: &str) -> Option<u8> {
    let bytes = line.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }
    let rest = &bytes[1..];

    if rest.starts_with(b"!--") {
        return Some(2);
    }
    if rest.starts_with(b"?") {
        return Some(3);
    }
    if rest.starts_with(b"![CDATA[") {
        return Some(5);
    }
    if rest.first() == Some(&b'!') && rest.get(1).is_some_and(|b| b.is_ascii_alphabetic()) {
        return Some(4);
    }

    let closing = rest.first() == Some(&b'/');
    let name_start = if closing { &rest[1..] } else { rest };
    let len = tag_name_len(name_start);
    if len == 0 {
        return None;
    }
    let name = std::str::from_utf8(&name_start[..len])
        .ok()?
        .to_ascii_lowercase();
    let after = &name_start[len..];

    if !closing && RAW_TAG_NAMES.contains(&name.as_str()) {
        match after.first() {
            None => return Some(1),
            Some(&b) if isspace(b) || b == b'>' => return Some(1),
            _ => {}
        }
    }

    if BLOCK_TAG_NAMES.contains(&name.as_str()) {
        match after.first() {
            None => return Some(6),
            Some(&b) if isspace(b) || b == b'>' => return Some(6),
            Some(b'/') if after.get(1) == Some(&b'>') => return Some(6),
            _ => {}
        }
    }

    None
}

/// HTML block start condition 7: a complete tag alone on its line.
pub fn html_block_start_7(line: &str) -> bool {
    let bytes = line.as_bytes();
    if bytes.first() != Some(&b'<') {
        return false;
    }
    let rest = &bytes[1..];
    let matched = if rest.first() == Some(&b'/') {
        closing_tag(rest)
    } else {
        open_tag(rest, &mut HtmlFlags::default())
    };
    match matched {
        Some(len) => rest_is_blank(&rest[len..]),
        None => false,
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(needle)
}

pub fn html_block_end(block_type: u8, line: &str) -> bool {
    match block_type {
        1 => RAW_TAG_NAMES
            .iter()
            .any(|t| contains_ci(line, &format!("</{}>", t))),
        2 => line.contains("-->"),
        3 => line.contains("?>"),
        4 => line.contains('>'),
        5 => line.contains("]]>"),
        _ => false,
    }
}

const MAX_SCHEME_LENGTH: usize = 32;

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(|&b| isspace(b)) {
        i += 1;
    }
    i
}

/// Inline HTML constructs found to run unclosed to the end of the input.
///
/// The scanners are always handed the rest of the input, so a closer missing
/// once is missing for every later start as well.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlFlags {
    pub skip_comment: bool,
    pub skip_pi: bool,
    pub skip_cdata: bool,
    pub skip_declaration: bool,
    pub skip_double_quote: bool,
    pub skip_single_quote: bool,
}

/// An open tag, starting just after the `<`.
pub fn open_tag(bytes: &[u8], flags: &mut HtmlFlags) -> Option<usize> {
    let mut i = tag_name_len(bytes);
    if i == 0 {
        return None;
    }

    loop {
        let ws = skip_whitespace(bytes, i);
        match bytes.get(ws) {
            Some(b'>') => return Some(ws + 1),
            Some(b'/') if bytes.get(ws + 1) == Some(&b'>') => return Some(ws + 2),
            _ => {}
        }
        if ws == i {
            return None;
        }

        // attribute name
        let start = ws;
        match bytes.get(start) {
            Some(&b) if b.is_ascii_alphabetic() || b == b'_' || b == b':' => {}
            _ => return None,
        }
        i = start
            + bytes[start..]
                .iter()
                .take_while(|&&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-'))
                .count();

        // optional value
        let eq = skip_whitespace(bytes, i);
        if bytes.get(eq) == Some(&b'=') {
            let v = skip_whitespace(bytes, eq + 1);
            match bytes.get(v) {
                Some(&q) if q == b'"' || q == b'\'' => {
                    let skip = if q == b'"' {
                        &mut flags.skip_double_quote
                    } else {
                        &mut flags.skip_single_quote
                    };
                    if *skip {
                        return None;
                    }
                    let Some(close) = bytes[v + 1..].iter().position(|&b| b == q) else {
                        *skip = true;
                        return None;
                    };
                    i = v + 1 + close + 1;
                }
                Some(_) => {
                    let len = bytes[v..]
                        .iter()
                        .take_while(|&&b| {
                            !isspace(b) && !matches!(b, b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
                        })
                        .count();
                    if len == 0 {
                        return None;
                    }
                    i = v + len;
                }
                None => return None,
            }
        }
    }
}

/// A closing tag, starting just after the `<`.
pub fn closing_tag(bytes: &[u8]) -> Option<usize> {
    if bytes.first() != Some(&b'/') {
        return None;
    }
    let len = tag_name_len(&bytes[1..]);
    if len == 0 {
        return None;
    }
    let i = skip_whitespace(bytes, 1 + len);
    if bytes.get(i) == Some(&b'>') {
        Some(i + 1)
    } else {
        None
    }
}

fn find(bytes: &[u8], from: usize, needle: &[u8], skip: &mut bool) -> Option<usize> {
    if *skip || from > bytes.len() {
        return None;
    }
    let found = bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p + needle.len());
    *skip = found.is_none();
    found
}

/// Any inline raw HTML construct, starting just after the `<`.
pub fn html_tag(bytes: &[u8], flags: &mut HtmlFlags) -> Option<usize> {
    match bytes.first()? {
        b'/' => closing_tag(bytes),
        b'?' => find(bytes, 1, b"?>", &mut flags.skip_pi),
        b'!' => {
            if bytes.starts_with(b"!-->") {
                Some(4)
            } else if bytes.starts_with(b"!--->") {
                Some(5)
            } else if bytes.starts_with(b"!--") {
                find(bytes, 3, b"-->", &mut flags.skip_comment)
            } else if bytes.starts_with(b"![CDATA[") {
                find(bytes, 8, b"]]>", &mut flags.skip_cdata)
            } else if bytes.get(1).is_some_and(|b| b.is_ascii_alphabetic()) {
                find(bytes, 2, b">", &mut flags.skip_declaration)
            } else {
                None
            }
        }
        _ => open_tag(bytes, flags),
    }
}

/// `scheme:rest>` for the schemes autolinks are allowed to carry, starting
/// just after the `<`.  Returns the length including the `>`.
pub fn autolink_uri(bytes: &[u8]) -> Option<usize> {
    if !bytes.first().is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }
    let colon = bytes
        .iter()
        .take(MAX_SCHEME_LENGTH + 1)
        .position(|&b| !(b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'-')))?;
    if colon < 2 || bytes[colon] != b':' {
        return None;
    }
    let scheme = std::str::from_utf8(&bytes[..colon]).ok()?.to_ascii_lowercase();
    if !matches!(scheme.as_str(), "http" | "https" | "mailto") {
        return None;
    }
    let rest = bytes[colon + 1..]
        .iter()
        .take_while(|&&b| b > b' ' && b != b'<' && b != b'>')
        .count();
    if bytes.get(colon + 1 + rest) == Some(&b'>') {
        Some(colon + 1 + rest + 1)
    } else {
        None
    }
}

/// `user@host.tld>`, starting just after the `<`.
pub fn autolink_email(bytes: &[u8]) -> Option<usize> {
    let local = bytes
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || b".!#$%&'*+/=?^_`{|}~-".contains(&b))
        .count();
    if local == 0 || bytes.get(local) != Some(&b'@') {
        return None;
    }
    let mut i = local + 1;
    loop {
        let label = bytes[i..]
            .iter()
            .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'-')
            .count();
        if label == 0 || label > 63 || bytes[i] == b'-' || bytes[i + label - 1] == b'-' {
            return None;
        }
        i += label;
        match bytes.get(i) {
            Some(b'.') => i += 1,
            Some(b'>') => return Some(i + 1),
            _ => return None,
        }
    }
}

/// A link title in any of its three quotings.
pub fn link_title(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let close = match bytes.first()? {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => i += 2,
            b if b == close => return Some(i + 1),
            b'(' if close == b')' => return None,
            _ => i += 1,
        }
    }
    None
}
