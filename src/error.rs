//! Errors and diagnostics raised while rendering.

use crate::nodes::NodeKind;
use std::fmt;

/// Fatal errors.  Any of these aborts the render call and no HTML is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The document tree is nested deeper than `limits.depth` allows.
    #[error("markdown AST too complex: tree depth {depth} > {max}")]
    ComplexityExceeded {
        /// Depth actually found.
        depth: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The input was rejected before parsing.
    #[error("parse error on line {line}: {message}")]
    ParseError {
        /// 1-based line the problem was found on.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The transformer has no rule for a node kind.
    #[error("no transform rule registered for {kind} nodes")]
    UnsupportedNode {
        /// The kind without a rule.
        kind: NodeKind,
    },
}

/// Convenience `Result` alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Classes of non-fatal conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A footnote reference without definition, or a mention that did not
    /// resolve.  The source text is kept literally.  Also recorded for
    /// footnote definitions dropped as duplicate or unreferenced.
    UnresolvedReference,

    /// A tag or attribute was removed or rewritten by the sanitizer, or an
    /// embed fell back to a plain link.
    SanitizedContent,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::UnresolvedReference => "unresolved reference",
            DiagnosticKind::SanitizedContent => "sanitized content",
        })
    }
}

/// A non-fatal message recorded during rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The class of condition.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
    /// Source line, where one is known.
    pub line: Option<usize>,
}

impl Diagnostic {
    pub(crate) fn unresolved(message: impl Into<String>, line: usize) -> Self {
        Diagnostic {
            kind: DiagnosticKind::UnresolvedReference,
            message: message.into(),
            line: Some(line),
        }
    }

    pub(crate) fn sanitized(message: impl Into<String>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::SanitizedContent,
            message: message.into(),
            line: None,
        }
    }

    pub(crate) fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {}): {}", self.kind, line, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// The output of a successful render.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rendered {
    /// The sanitized HTML.
    pub contents: String,
    /// Every non-fatal diagnostic, in the order they were raised.
    pub messages: Vec<Diagnostic>,
}
