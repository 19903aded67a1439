//! Adapter traits for the external collaborators of the pipeline.
//!
//! Each plugin has to implement one of the traits available in this module.

use async_trait::async_trait;
use std::fmt::{self, Debug, Formatter};

/// Implement this adapter for creating a plugin for custom syntax highlighting of codefence blocks.
pub trait SyntaxHighlighterAdapter: Send + Sync {
    /// Generates syntax highlighted HTML for the contents of a code block.
    ///
    /// `code`: The source code to be syntax highlighted.
    /// `lang`: The normalised language name from the info string, if any.
    ///
    /// The result is parsed back into HTML nodes and sanitized like any other
    /// markup, so only `span` elements with `class` attributes survive.
    fn highlight(&self, code: &str, lang: Option<&str>) -> String;
}

/// Locale-aware typographic substitution applied to text nodes.
pub trait QuoteFilter: Send + Sync {
    /// Return `text` with the substitutions for `locale` applied.  Unknown
    /// locales must return the text unchanged.
    fn filter(&self, text: &str, locale: &str) -> String;
}

impl<F> QuoteFilter for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    fn filter(&self, text: &str, locale: &str) -> String {
        self(text, locale)
    }
}

/// Confirms whether a mentioned member exists.
///
/// Any `Fn(&str) -> bool` closure is a resolver; implement the trait
/// directly for lookups that need to await.
///
/// ```rust
/// # use std::sync::Arc;
/// # use zmark::{markdown_to_html, Options};
/// # use zmark::adapters::MentionResolver;
/// let mut options = Options::default();
/// options.parse.mention_resolver = Some(Arc::new(|name: &str| name == "alice"));
/// ```
#[async_trait]
pub trait MentionResolver: Send + Sync {
    /// Whether a member called `name` exists.
    async fn exists(&self, name: &str) -> bool;
}

#[async_trait]
impl<F> MentionResolver for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    async fn exists(&self, name: &str) -> bool {
        self(name)
    }
}

impl<'c> Debug for dyn MentionResolver + 'c {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("<dyn MentionResolver>")
    }
}
