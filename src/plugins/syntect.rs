//! Adapter for the Syntect syntax highlighter plugin.

use std::fmt::{self, Debug, Formatter};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::adapters::SyntaxHighlighterAdapter;
use crate::html;

/// Syntect syntax highlighter plugin.
///
/// Highlighted code is marked up with `span` elements carrying scope
/// classes, e.g. `<span class="source rust">`; style them with a CSS theme.
pub struct SyntectAdapter {
    syntax_set: SyntaxSet,
}

impl Debug for SyntectAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntectAdapter")
            .field("syntaxes", &self.syntax_set.syntaxes().len())
            .finish()
    }
}

impl Default for SyntectAdapter {
    fn default() -> Self {
        SyntectAdapter::new()
    }
}

impl SyntectAdapter {
    /// Construct a new `SyntectAdapter` with the default syntax definitions.
    pub fn new() -> Self {
        SyntectAdapter {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// Construct a `SyntectAdapter` with a custom syntax set.
    pub fn with_syntax_set(syntax_set: SyntaxSet) -> Self {
        SyntectAdapter { syntax_set }
    }
}

impl SyntaxHighlighterAdapter for SyntectAdapter {
    fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let ss = &self.syntax_set;
        let syntax = lang
            .filter(|l| !l.is_empty())
            .and_then(|l| ss.find_syntax_by_token(l))
            .or_else(|| ss.find_syntax_by_first_line(code))
            .unwrap_or_else(|| ss.find_syntax_plain_text());

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, ss, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
                tracing::warn!(%err, "highlighting failed, emitting plain code");
                let mut escaped = String::with_capacity(code.len());
                html::escape(&mut escaped, code);
                return escaped;
            }
        }
        generator.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classed_spans() {
        let adapter = SyntectAdapter::new();
        let html = adapter.highlight("fn main() {}\n", Some("rust"));
        assert!(html.contains("<span class=\"source rust\">"), "{}", html);
        assert!(!html.contains("style="));
    }

    #[test]
    fn unknown_language_is_plain() {
        let adapter = SyntectAdapter::new();
        let html = adapter.highlight("a < b\n", Some("no-such-language"));
        assert!(html.contains("a &lt; b"), "{}", html);
    }
}
