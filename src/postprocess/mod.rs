//! Passes over the parsed tree that run before it is turned into HTML.
//!
//! Each pass is a plain function over the root node and can be run on its
//! own; [`run`] applies all of them in the order a render call does.

pub mod embeds;
pub mod figures;
pub mod footnotes;
pub mod math;
pub mod mentions;
pub mod quotes;
pub mod smileys;

pub use self::mentions::MentionSet;

use crate::adapters::QuoteFilter;
use crate::error::Diagnostic;
use crate::nodes::{Arena, Node};
use crate::options::Plugins;
use crate::parser::merge_adjacent_text;
use crate::parser::registry::Registry;
use crate::plugins::guillemets::Guillemets;
use crate::Options;

/// Apply every post-processing pass to the tree under `root`.
///
/// `mentions` holds the names confirmed to exist; with `None`, every
/// mention is put back as text without a diagnostic.
pub fn run<'a>(
    arena: &'a Arena<'a>,
    root: Node<'a>,
    options: &Options,
    plugins: &Plugins,
    registry: &Registry,
    mentions: Option<&MentionSet>,
    messages: &mut Vec<Diagnostic>,
) {
    mentions::apply(root, mentions, messages);

    // Definitions still need dropping when only references are switched off.
    if registry.is_enabled("footnoteReference") || registry.is_enabled("footnoteDefinition") {
        footnotes::process(root, messages);
    }

    embeds::resolve(root, messages);

    let promoted = math::promote_display(root);
    if promoted > 0 {
        tracing::debug!(promoted, "display math promoted");
    }

    if registry.is_enabled("figure") {
        let figures = figures::promote(arena, root);
        tracing::debug!(figures, "figures promoted");
    }

    merge_adjacent_text(root);

    if registry.is_enabled("smiley") {
        let smileys = smileys::apply(arena, root);
        tracing::debug!(smileys, "smileys replaced");
    }

    if let Some(ref locale) = options.render.locale {
        let filter: &dyn QuoteFilter = plugins.render.quote_filter.unwrap_or(&Guillemets);
        quotes::apply(root, filter, locale);
    }
}
