//! The tokenizer registry: which recognizers run, and in what order.

use std::fmt;

use crate::parser::options::Tokenizers;

/// Block-level recognizers, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockTokenizer {
    /// ```` ``` ```` and `~~~` fences.
    FencedCode,
    /// `$$` fenced display math.
    Math,
    /// ATX (`#`) and setext (underlined) headings.
    Heading,
    /// `***`, `---` and `___`.
    ThematicBreak,
    /// `>` block quotes.
    Blockquote,
    /// Bullet and ordered lists.
    List,
    /// Code indented by four or more columns.
    IndentedCode,
    /// Pipe tables.
    Table,
    /// `[^id]: …`
    FootnoteDefinition,
    /// `[label]: url "title"` link reference definitions.
    Definition,
    /// Raw HTML blocks.
    Html,
}

impl BlockTokenizer {
    /// Every block tokenizer, in priority order.
    pub const ALL: [BlockTokenizer; 11] = [
        BlockTokenizer::FencedCode,
        BlockTokenizer::Math,
        BlockTokenizer::Heading,
        BlockTokenizer::ThematicBreak,
        BlockTokenizer::Blockquote,
        BlockTokenizer::List,
        BlockTokenizer::IndentedCode,
        BlockTokenizer::Table,
        BlockTokenizer::FootnoteDefinition,
        BlockTokenizer::Definition,
        BlockTokenizer::Html,
    ];

    /// The configuration name of the tokenizer.
    pub fn name(self) -> &'static str {
        match self {
            BlockTokenizer::FencedCode => "fencedCode",
            BlockTokenizer::Math => "math",
            BlockTokenizer::Heading => "heading",
            BlockTokenizer::ThematicBreak => "thematicBreak",
            BlockTokenizer::Blockquote => "blockquote",
            BlockTokenizer::List => "list",
            BlockTokenizer::IndentedCode => "indentedCode",
            BlockTokenizer::Table => "table",
            BlockTokenizer::FootnoteDefinition => "footnoteDefinition",
            BlockTokenizer::Definition => "definition",
            BlockTokenizer::Html => "html",
        }
    }

    /// Whether the construct may start while a paragraph is open.
    pub fn interrupts_paragraph(self) -> bool {
        !matches!(
            self,
            BlockTokenizer::IndentedCode | BlockTokenizer::Definition
        )
    }
}

/// Inline-level recognizers, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineTokenizer {
    /// Backslash escapes.
    Escape,
    /// Named and numeric character references.
    Entity,
    /// Backtick code spans.
    CodeSpan,
    /// `$…$` and `$$…$$`.
    InlineMath,
    /// `<https://…>`, `<a@b.c>` and bare `https://` URLs.
    Autolink,
    /// Inline raw HTML tags.
    Html,
    /// `!(https://…)`
    Embed,
    /// `![alt](src)`
    Image,
    /// `[^id]`
    FootnoteReference,
    /// `[text](url)` and reference links.
    Link,
    /// `*`/`_` emphasis and strong emphasis.
    Emphasis,
    /// `@name` and `@**display name**`.
    Mention,
}

impl InlineTokenizer {
    /// Every inline tokenizer, in priority order.
    pub const ALL: [InlineTokenizer; 12] = [
        InlineTokenizer::Escape,
        InlineTokenizer::Entity,
        InlineTokenizer::CodeSpan,
        InlineTokenizer::InlineMath,
        InlineTokenizer::Autolink,
        InlineTokenizer::Html,
        InlineTokenizer::Embed,
        InlineTokenizer::Image,
        InlineTokenizer::FootnoteReference,
        InlineTokenizer::Link,
        InlineTokenizer::Emphasis,
        InlineTokenizer::Mention,
    ];

    /// The configuration name of the tokenizer.
    pub fn name(self) -> &'static str {
        match self {
            InlineTokenizer::Escape => "escape",
            InlineTokenizer::Entity => "entity",
            InlineTokenizer::CodeSpan => "codeSpan",
            InlineTokenizer::InlineMath => "inlineMath",
            InlineTokenizer::Autolink => "autolink",
            InlineTokenizer::Html => "html",
            InlineTokenizer::Embed => "embed",
            InlineTokenizer::Image => "image",
            InlineTokenizer::FootnoteReference => "footnoteReference",
            InlineTokenizer::Link => "link",
            InlineTokenizer::Emphasis => "emphasis",
            InlineTokenizer::Mention => "mention",
        }
    }

    /// Whether the tokenizer can start a match on byte `c`.
    pub fn triggers_on(self, c: u8) -> bool {
        match self {
            InlineTokenizer::Escape => c == b'\\',
            InlineTokenizer::Entity => c == b'&',
            InlineTokenizer::CodeSpan => c == b'`',
            InlineTokenizer::InlineMath => c == b'$',
            InlineTokenizer::Autolink => c == b'<' || c == b'h',
            InlineTokenizer::Html => c == b'<',
            InlineTokenizer::Embed => c == b'!',
            InlineTokenizer::Image => c == b'!' || c == b']',
            InlineTokenizer::FootnoteReference => c == b'[',
            InlineTokenizer::Link => c == b'[' || c == b']',
            InlineTokenizer::Emphasis => c == b'*' || c == b'_',
            InlineTokenizer::Mention => c == b'@',
        }
    }
}

impl fmt::Display for BlockTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for InlineTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Render-time features that share the disable list with tokenizers.
pub const RENDER_FEATURES: [&str; 3] = ["highlight", "figure", "smiley"];

/// The active tokenizers for one configuration, in priority order.
///
/// A registry is immutable once built and may be shared between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    blocks: Vec<BlockTokenizer>,
    inlines: Vec<InlineTokenizer>,
    disabled_features: Vec<&'static str>,
}

impl Registry {
    /// Build the registry for `tokenizers`, dropping every disabled name.
    pub fn new(tokenizers: &Tokenizers) -> Self {
        let off = |name: &str| tokenizers.disabled.iter().any(|d| d == name);

        for name in &tokenizers.disabled {
            let known = BlockTokenizer::ALL.iter().any(|t| t.name() == name)
                || InlineTokenizer::ALL.iter().any(|t| t.name() == name)
                || RENDER_FEATURES.contains(&name.as_str());
            if !known {
                tracing::warn!(name = %name, "ignoring unknown tokenizer name");
            }
        }

        Registry {
            blocks: BlockTokenizer::ALL
                .into_iter()
                .filter(|t| !off(t.name()))
                .collect(),
            inlines: InlineTokenizer::ALL
                .into_iter()
                .filter(|t| !off(t.name()))
                .collect(),
            disabled_features: RENDER_FEATURES
                .into_iter()
                .filter(|f| off(f))
                .collect(),
        }
    }

    /// Enabled block tokenizers, highest priority first.
    pub fn block_tokenizers(&self) -> &[BlockTokenizer] {
        &self.blocks
    }

    /// Enabled inline tokenizers, highest priority first.
    pub fn inline_tokenizers(&self) -> &[InlineTokenizer] {
        &self.inlines
    }

    /// Whether the tokenizer or render feature called `name` is active.
    /// Unknown names are reported as disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.blocks.iter().any(|t| t.name() == name)
            || self.inlines.iter().any(|t| t.name() == name)
            || (RENDER_FEATURES.contains(&name) && !self.disabled_features.contains(&name))
    }

    pub(crate) fn has_block(&self, tokenizer: BlockTokenizer) -> bool {
        self.blocks.contains(&tokenizer)
    }

    pub(crate) fn has_inline(&self, tokenizer: InlineTokenizer) -> bool {
        self.inlines.contains(&tokenizer)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new(&Tokenizers::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_survives_disabling() {
        let registry = Registry::new(&Tokenizers {
            disabled: vec!["table".into(), "codeSpan".into(), "figure".into()],
        });
        assert_eq!(registry.block_tokenizers().len(), 10);
        assert_eq!(registry.block_tokenizers()[0], BlockTokenizer::FencedCode);
        assert!(!registry
            .block_tokenizers()
            .contains(&BlockTokenizer::Table));
        assert_eq!(
            registry.inline_tokenizers()[..3],
            [
                InlineTokenizer::Escape,
                InlineTokenizer::Entity,
                InlineTokenizer::InlineMath
            ]
        );
        assert!(!registry.is_enabled("figure"));
        assert!(registry.is_enabled("highlight"));
        assert!(registry.is_enabled("smiley"));
        assert!(registry.is_enabled("html"));
    }

    #[test]
    fn unknown_names_are_ignored() {
        let registry = Registry::new(&Tokenizers {
            disabled: vec!["lineNumbers".into()],
        });
        assert_eq!(registry, Registry::default());
        assert!(!registry.is_enabled("lineNumbers"));
    }
}
