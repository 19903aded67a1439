//! HTML entity and numeric character reference decoding.

use std::char;
use std::cmp::min;

include!(concat!(env!("OUT_DIR"), "/entitydata.rs"));

/// Decode the entity at the start of `text`, which follows an `&`.
///
/// Returns the decoded string and the number of bytes consumed, including
/// the trailing `;`.
pub fn unescape(text: &str) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'#' {
        let mut codepoint: u32 = 0;
        let mut i;

        let num_digits = if bytes[1].is_ascii_digit() {
            i = 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                codepoint = codepoint * 10 + (bytes[i] - b'0') as u32;
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 1
        } else if bytes[1] == b'x' || bytes[1] == b'X' {
            i = 2;
            while i < bytes.len() && bytes[i].is_ascii_hexdigit() {
                let digit = (bytes[i] as char).to_digit(16).unwrap_or(0);
                codepoint = codepoint * 16 + digit;
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 2
        } else {
            return None;
        };

        if (1..=7).contains(&num_digits) && i < bytes.len() && bytes[i] == b';' {
            if codepoint == 0 || (0xD800..=0xDFFF).contains(&codepoint) || codepoint >= 0x11_0000
            {
                codepoint = 0xFFFD;
            }
            let ch = char::from_u32(codepoint).unwrap_or('\u{FFFD}');
            return Some((ch.to_string(), i + 1));
        }
        return None;
    }

    let size = min(bytes.len(), entitydata::MAX_LENGTH);
    for i in 1..size {
        match bytes[i] {
            b';' => {
                return entitydata::TRANSLATED_ENTITIES
                    .get(&text[..i])
                    .map(|e| (e.to_string(), i + 1));
            }
            c if !c.is_ascii_alphanumeric() => return None,
            _ => {}
        }
    }

    None
}

/// Decode every entity in `src`; anything that does not decode is kept as-is.
pub fn unescape_html(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp + 1..];
        match unescape(rest) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &rest[consumed..];
            }
            None => out.push('&'),
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_numeric() {
        assert_eq!(unescape("amp;x"), Some(("&".to_string(), 4)));
        assert_eq!(unescape("#65;"), Some(("A".to_string(), 4)));
        assert_eq!(unescape("#x41;"), Some(("A".to_string(), 5)));
        assert_eq!(unescape("#0;"), Some(("\u{FFFD}".to_string(), 3)));
        assert_eq!(unescape("nosuchentity;"), None);
        assert_eq!(unescape("amp"), None);
    }

    #[test]
    fn whole_strings() {
        assert_eq!(unescape_html("a &lt; b &amp c"), "a < b &amp c");
        assert_eq!(unescape_html("&copy;&#x20AC;"), "©€");
    }
}
