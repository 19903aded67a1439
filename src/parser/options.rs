//! Configuration for the parser and renderer.

#[cfg(feature = "bon")]
use bon::Builder;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{MentionResolver, QuoteFilter, SyntaxHighlighterAdapter};

/// The default maximum tree depth.
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

/// The default time allowed for each external lookup.
pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Default, Debug, Clone)]
/// Umbrella options struct.  One value is scoped to a render call and never
/// mutated by it.
pub struct Options<'c> {
    /// Resource limits.
    pub limits: Limits,

    /// Select which tokenizers are active.
    pub tokenizers: Tokenizers,

    /// Configure parse-time options.
    pub parse: Parse<'c>,

    /// Configure render-time options.
    pub render: Render,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Bounds on the work a single document may cause.
pub struct Limits {
    /// Maximum depth of the document tree.  The root is at depth 0.  A tree
    /// exactly this deep is accepted; anything deeper fails with
    /// [`Error::ComplexityExceeded`](crate::Error::ComplexityExceeded).
    /// `None` disables the check.
    ///
    /// ```rust
    /// # use zmark::{markdown_to_html, Error, Options};
    /// let mut options = Options::default();
    /// options.limits.depth = Some(3);
    ///
    /// assert!(markdown_to_html("> hi", &options).is_ok());
    /// assert!(matches!(
    ///     markdown_to_html("> > hi", &options),
    ///     Err(Error::ComplexityExceeded { depth: 4, max: 3 })
    /// ));
    /// ```
    pub depth: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            depth: Some(DEFAULT_DEPTH_LIMIT),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "bon", derive(Builder))]
/// Tokenizer selection.
pub struct Tokenizers {
    /// Names of tokenizers to switch off, e.g. `"table"` or `"mention"`.
    /// The render-time features `"highlight"`, `"figure"` and `"smiley"` are
    /// accepted as well.  Unknown names are ignored.
    ///
    /// ```rust
    /// # use zmark::{markdown_to_html, Options};
    /// let mut options = Options::default();
    /// options.tokenizers.disabled = vec!["emphasis".to_string()];
    ///
    /// assert_eq!(markdown_to_html("*hi*", &options).unwrap(),
    ///            "<p>*hi*</p>\n");
    /// ```
    #[cfg_attr(feature = "bon", builder(default))]
    pub disabled: Vec<String>,
}

#[derive(Clone)]
#[cfg_attr(feature = "bon", derive(Builder))]
/// Options for parser functions.
pub struct Parse<'c> {
    /// Looks up mentioned members.  Without a resolver, `@name` stays text.
    pub mention_resolver: Option<Arc<dyn MentionResolver + 'c>>,

    /// How long each external lookup may take before it is treated as failed.
    #[cfg_attr(feature = "bon", builder(default = DEFAULT_COLLABORATOR_TIMEOUT))]
    pub collaborator_timeout: Duration,
}

impl Default for Parse<'_> {
    fn default() -> Self {
        Parse {
            mention_resolver: None,
            collaborator_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }
}

impl Debug for Parse<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parse")
            .field("mention_resolver", &self.mention_resolver)
            .field("collaborator_timeout", &self.collaborator_timeout)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "bon", derive(Builder))]
/// Options for formatter functions.
pub struct Render {
    /// Locale handed to the quote filter, e.g. `"fr"`.  Without a locale no
    /// quote substitution happens.
    ///
    /// ```rust
    /// # use zmark::{markdown_to_html, Options};
    /// let mut options = Options::default();
    /// options.render.locale = Some("fr".to_string());
    ///
    /// assert_eq!(markdown_to_html("<< Salut >>", &options).unwrap(),
    ///            "<p>«\u{202f}Salut\u{202f}»</p>\n");
    /// ```
    pub locale: Option<String>,

    /// Prefix of the link a resolved mention points at.
    #[cfg_attr(feature = "bon", builder(default = "/members/".to_string()))]
    pub mention_base_url: String,

    /// Prefix of the image a smiley is shown with.
    #[cfg_attr(feature = "bon", builder(default = "/static/smileys/".to_string()))]
    pub smiley_base_url: String,
}

impl Default for Render {
    fn default() -> Self {
        Render {
            locale: None,
            mention_base_url: "/members/".to_string(),
            smiley_base_url: "/static/smileys/".to_string(),
        }
    }
}

#[derive(Default, Debug, Clone)]
#[cfg_attr(feature = "bon", derive(Builder))]
/// Umbrella plugins struct.
pub struct Plugins<'p> {
    /// Configure render-time plugins.
    #[cfg_attr(feature = "bon", builder(default))]
    pub render: RenderPlugins<'p>,
}

#[derive(Default, Clone)]
#[cfg_attr(feature = "bon", derive(Builder))]
/// Plugins for alternative rendering.
pub struct RenderPlugins<'p> {
    /// Provide a syntax highlighter adapter implementation for syntax
    /// highlighting of codefence blocks.
    ///
    /// ```rust
    /// # use zmark::{markdown_to_html_with_plugins, Options, options::Plugins};
    /// # use zmark::adapters::SyntaxHighlighterAdapter;
    /// pub struct MockAdapter {}
    /// impl SyntaxHighlighterAdapter for MockAdapter {
    ///     fn highlight(&self, code: &str, lang: Option<&str>) -> String {
    ///         format!("<span class=\"lang-{}\">{}</span>", lang.unwrap_or("none"), code)
    ///     }
    /// }
    ///
    /// let options = Options::default();
    /// let adapter = MockAdapter {};
    /// let mut plugins = Plugins::default();
    /// plugins.render.codefence_syntax_highlighter = Some(&adapter);
    ///
    /// assert_eq!(markdown_to_html_with_plugins("```rust\nfn main();\n```", &options, &plugins).unwrap(),
    ///            "<pre><code class=\"language-rust\"><span class=\"lang-rust\">fn main();\n</span></code></pre>\n");
    /// ```
    pub codefence_syntax_highlighter: Option<&'p dyn SyntaxHighlighterAdapter>,

    /// Typographic substitution applied to text when `render.locale` is set.
    /// Defaults to [`plugins::guillemets`](crate::plugins::guillemets).
    pub quote_filter: Option<&'p dyn QuoteFilter>,
}

impl Debug for RenderPlugins<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPlugins")
            .field(
                "codefence_syntax_highlighter",
                &self
                    .codefence_syntax_highlighter
                    .map(|_| "impl SyntaxHighlighterAdapter"),
            )
            .field(
                "quote_filter",
                &self.quote_filter.map(|_| "impl QuoteFilter"),
            )
            .finish()
    }
}
