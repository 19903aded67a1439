//! A Markdown to HTML pipeline for untrusted, user-authored text.
//!
//! Input is parsed into an arena-allocated AST by a set of pluggable
//! tokenizers, checked against a depth limit, post-processed (footnotes,
//! mentions, embeds, math, figures, typographic quotes), turned into an
//! HTML tree by a table of per-node rules, sanitized against allow-lists,
//! and finally serialized.
//!
//! ```
//! # use zmark::{markdown_to_html, Options};
//! assert_eq!(markdown_to_html("Hello, **世界**!", &Options::default()).unwrap(),
//!            "<p>Hello, <strong>世界</strong>!</p>\n");
//! ```
//!
//! Mentions need an external lookup, which is only done by the
//! asynchronous [`render`] family:
//!
//! ```
//! # use std::sync::Arc;
//! # use zmark::{render, Options};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut options = Options::default();
//! options.parse.mention_resolver = Some(Arc::new(|name: &str| name == "alice"));
//!
//! let rendered = render("@alice and @bob", &options).await.unwrap();
//! assert_eq!(rendered.contents,
//!            "<p><a class=\"ping\" href=\"/members/alice\">@alice</a> and @bob</p>\n");
//! assert_eq!(rendered.messages.len(), 1);
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default, clippy::too_many_arguments)]

pub mod adapters;
pub mod arena_tree;
mod depth;
mod entity;
pub mod error;
pub mod hast;
pub mod html;
pub mod nodes;
mod parser;
pub mod plugins;
pub mod postprocess;
pub mod sanitizer;
mod scanners;
mod strings;

pub use crate::depth::{check_depth, tree_depth};
pub use crate::error::{Diagnostic, DiagnosticKind, Error, Rendered, Result};
pub use crate::nodes::Arena;
pub use crate::parser::options::{self, Options, Plugins};
pub use crate::parser::registry::{self, Registry};
pub use crate::parser::{parse_document, ResolvedReference};

use crate::html::{format_document, Context, Transformer};
use crate::parser::parse_document_with_registry;
use crate::postprocess::MentionSet;

/// Render Markdown to sanitized HTML, resolving mentions through
/// `options.parse.mention_resolver`.
///
/// Fails with [`Error::ComplexityExceeded`] when the document nests deeper
/// than `options.limits.depth`.  Everything else that goes wrong is
/// recorded in [`Rendered::messages`] and rendering carries on.
pub async fn render(markdown: &str, options: &Options<'_>) -> Result<Rendered> {
    render_with_plugins(markdown, options, &Plugins::default()).await
}

/// Render Markdown to sanitized HTML using plugins.
pub async fn render_with_plugins(
    markdown: &str,
    options: &Options<'_>,
    plugins: &Plugins<'_>,
) -> Result<Rendered> {
    let registry = Registry::new(&options.tokenizers);

    let mentions = match options.parse.mention_resolver {
        Some(ref resolver) if registry.is_enabled("mention") => {
            let names = mention_candidates(markdown, options, &registry)?;
            tracing::debug!(candidates = names.len(), "looking up mentions");
            Some(
                postprocess::mentions::resolve(
                    names,
                    resolver.as_ref(),
                    options.parse.collaborator_timeout,
                )
                .await,
            )
        }
        _ => None,
    };

    render_document(markdown, options, plugins, &registry, mentions.as_ref())
}

/// Render a byte buffer, failing with [`Error::ParseError`] when it is not
/// valid UTF-8.
///
/// ```
/// # use zmark::{render_bytes, Error, Options};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let err = render_bytes(b"ok\nok\n\xff", &Options::default()).await.unwrap_err();
/// assert!(matches!(err, Error::ParseError { line: 3, .. }));
/// # }
/// ```
pub async fn render_bytes(bytes: &[u8], options: &Options<'_>) -> Result<Rendered> {
    let markdown = std::str::from_utf8(bytes).map_err(|e| {
        let line = bytes[..e.valid_up_to()]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1;
        Error::ParseError {
            line,
            message: e.to_string(),
        }
    })?;
    render(markdown, options).await
}

/// Render Markdown to sanitized HTML without looking up mentions; every
/// `@name` stays text.
pub fn markdown_to_html(markdown: &str, options: &Options<'_>) -> Result<String> {
    markdown_to_html_with_plugins(markdown, options, &Plugins::default())
}

/// Render Markdown to sanitized HTML using plugins, without looking up
/// mentions.
pub fn markdown_to_html_with_plugins(
    markdown: &str,
    options: &Options<'_>,
    plugins: &Plugins<'_>,
) -> Result<String> {
    let registry = Registry::new(&options.tokenizers);
    render_document(markdown, options, plugins, &registry, None).map(|r| r.contents)
}

/// The names mentioned in `markdown`.  The tree is dropped before any
/// lookup starts.
fn mention_candidates(
    markdown: &str,
    options: &Options<'_>,
    registry: &Registry,
) -> Result<Vec<String>> {
    let arena = Arena::new();
    let root = parse_document_with_registry(&arena, markdown, options, registry);
    if let Some(max) = options.limits.depth {
        check_depth(root, max)?;
    }
    Ok(postprocess::mentions::candidates(root))
}

fn render_document(
    markdown: &str,
    options: &Options<'_>,
    plugins: &Plugins<'_>,
    registry: &Registry,
    mentions: Option<&MentionSet>,
) -> Result<Rendered> {
    let arena = Arena::new();
    let root = parse_document_with_registry(&arena, markdown, options, registry);

    if let Some(max) = options.limits.depth {
        let depth = check_depth(root, max)?;
        tracing::debug!(depth, max, "tree depth checked");
    }

    let mut messages = vec![];
    postprocess::run(&arena, root, options, plugins, registry, mentions, &mut messages);

    let ctx = Context::new(options, plugins, registry);
    let tree = Transformer::new().transform(&ctx, root)?;
    let tree = sanitizer::sanitize(tree, &mut messages);
    let contents = format_document(&tree);

    tracing::debug!(
        bytes = contents.len(),
        diagnostics = messages.len(),
        "document rendered"
    );
    Ok(Rendered { contents, messages })
}
