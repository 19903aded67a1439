//! French-style guillemets.

use crate::adapters::QuoteFilter;

struct LocaleMarks {
    left: char,
    right: char,
    space: char,
}

fn marks(locale: &str) -> Option<LocaleMarks> {
    let language = locale.split(['-', '_']).next().unwrap_or(locale);
    match language.to_ascii_lowercase().as_str() {
        "fr" => Some(LocaleMarks {
            left: '«',
            right: '»',
            space: '\u{202f}',
        }),
        _ => None,
    }
}

/// Replaces `<<` and `>>` with guillemets and the whitespace just inside
/// them with a narrow no-break space.  Text in any other locale is returned
/// unchanged.
///
/// ```rust
/// # use zmark::adapters::QuoteFilter;
/// # use zmark::plugins::guillemets::Guillemets;
/// assert_eq!(Guillemets.filter("<< oui >>", "fr"), "«\u{202f}oui\u{202f}»");
/// assert_eq!(Guillemets.filter("<< yes >>", "en"), "<< yes >>");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Guillemets;

impl QuoteFilter for Guillemets {
    fn filter(&self, text: &str, locale: &str) -> String {
        let Some(marks) = marks(locale) else {
            return text.to_string();
        };

        let replaced = text
            .replace("<<", &marks.left.to_string())
            .replace(">>", &marks.right.to_string());

        let chars: Vec<char> = replaced.chars().collect();
        let mut out = String::with_capacity(replaced.len());
        for (i, &c) in chars.iter().enumerate() {
            let after_left = i > 0 && chars[i - 1] == marks.left;
            let before_right = chars.get(i + 1) == Some(&marks.right);
            if c.is_whitespace() && (after_left || before_right) {
                out.push(marks.space);
            } else {
                out.push(c);
            }
        }
        out
    }
}
