use crate::entity;

#[derive(PartialEq, Eq, Clone, Copy)]
pub enum Case {
    Preserve,
    Fold,
}

pub fn isspace(ch: u8) -> bool {
    matches!(ch, b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r' | b' ')
}

pub fn ispunct(ch: u8) -> bool {
    ch.is_ascii_punctuation()
}

pub fn is_line_end_char(ch: u8) -> bool {
    matches!(ch, 10 | 13)
}

pub fn is_space_or_tab(ch: u8) -> bool {
    matches!(ch, 9 | 32)
}

/// Remove backslashes before ASCII punctuation.
pub fn unescape(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() && ispunct(bytes[i + 1]) {
            out.push_str(&s[last..i]);
            last = i + 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    out.push_str(&s[last..]);
    out
}

/// Code span content: line endings become spaces, and one leading and
/// trailing space is stripped when both are present on non-blank content.
pub fn normalize_code(v: &str) -> String {
    let mut r = String::with_capacity(v.len());
    let mut contains_nonspace = false;
    let mut chars = v.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    r.push(' ');
                }
            }
            '\n' => r.push(' '),
            c => {
                if c != ' ' {
                    contains_nonspace = true;
                }
                r.push(c);
            }
        }
    }

    if contains_nonspace && r.len() >= 2 && r.starts_with(' ') && r.ends_with(' ') {
        r.remove(0);
        r.pop();
    }

    r
}

pub fn remove_trailing_blank_lines(line: &mut String) {
    let trimmed = line.trim_end_matches([' ', '\t', '\r', '\n']).len();
    match line[trimmed..].find(['\r', '\n']) {
        Some(eol) => line.truncate(trimmed + eol),
        None if trimmed == 0 => line.clear(),
        None => {}
    }
}

/// Remove an ATX heading's closing sequence of `#`s.
pub fn chop_trailing_hashes(line: &str) -> &str {
    let line = rtrim_str(line);
    let without = line.trim_end_matches('#');
    if without.len() == line.len() {
        return line;
    }
    if without.is_empty() {
        return without;
    }
    if without.ends_with([' ', '\t']) {
        rtrim_str(without)
    } else {
        line
    }
}

pub fn rtrim_str(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_ascii() && isspace(c as u8))
}

pub fn ltrim_str(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_ascii() && isspace(c as u8))
}

pub fn trim_str(s: &str) -> &str {
    ltrim_str(rtrim_str(s))
}

pub fn is_blank(s: &str) -> bool {
    s.bytes().all(isspace)
}

pub fn clean_url(url: &str) -> String {
    let url = trim_str(url);
    if url.is_empty() {
        return String::new();
    }
    unescape(&entity::unescape_html(url))
}

pub fn clean_title(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    let bytes = title.as_bytes();
    let first = bytes[0];
    let last = bytes[bytes.len() - 1];

    let inner = if title.len() >= 2
        && ((first == b'\'' && last == b'\'')
            || (first == b'(' && last == b')')
            || (first == b'"' && last == b'"'))
    {
        &title[1..title.len() - 1]
    } else {
        title
    };

    unescape(&entity::unescape_html(inner))
}

/// Collapse internal whitespace, trim, and optionally case-fold a link or
/// footnote label so that equivalent labels compare equal.
pub fn normalize_label(i: &str, casing: Case) -> String {
    let i = trim_str(i);

    let mut v = String::with_capacity(i.len());
    let mut last_was_whitespace = false;
    for c in i.chars() {
        if c.is_whitespace() {
            if !last_was_whitespace {
                last_was_whitespace = true;
                v.push(' ');
            }
        } else {
            last_was_whitespace = false;
            v.push(c);
        }
    }

    match casing {
        Case::Preserve => v,
        Case::Fold => caseless::default_case_fold_str(&v),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn normalize_code_handles_lone_newline() {
        assert_eq!(normalize_code("\n"), " ");
    }

    #[test]
    fn normalize_code_handles_lone_space() {
        assert_eq!(normalize_code(" "), " ");
        assert_eq!(normalize_code(" a "), "a");
    }

    #[test]
    fn labels_fold_and_collapse() {
        assert_eq!(normalize_label("  Foo \n\t BAR ", Case::Fold), "foo bar");
        assert_eq!(normalize_label("Straße", Case::Fold), "strasse");
        assert_eq!(normalize_label(" Keep  Me ", Case::Preserve), "Keep Me");
    }

    #[test]
    fn trailing_hashes() {
        assert_eq!(chop_trailing_hashes("foo ##"), "foo");
        assert_eq!(chop_trailing_hashes("foo#"), "foo#");
        assert_eq!(chop_trailing_hashes("###"), "");
    }

    #[test]
    fn trailing_blank_lines() {
        let mut s = "code\n\n  \n".to_string();
        remove_trailing_blank_lines(&mut s);
        assert_eq!(s, "code");
    }
}
