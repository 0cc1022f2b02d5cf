//! The five diagnostic kinds, plus a [`Handler`] that implements the
//! halt-or-accumulate policy: every stage but the semantic analyzer halts
//! at its first error via `?`; the analyzer accumulates through the
//! handler and the driver decides when to stop.

pub mod emitter;

use modc_span::Span;
use std::fmt;
use thiserror::Error;

/// Convenience alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// A single, localized compiler message. `span` is `None` only for
/// [`Diagnostic::Io`], which has no position in the source being compiled.
#[derive(Debug, Clone, Error)]
pub enum Diagnostic {
    #[error("Error: {message} ({span})")]
    Lex { message: String, span: Span },

    #[error("Error: {message} ({span})")]
    Parse { message: String, span: Span },

    #[error("Semantic error: {message} ({span})")]
    Semantic { message: String, span: Span },

    #[error("Error: {message} ({span})")]
    Runtime { message: String, span: Span },

    #[error("Compilation error: {message}")]
    Io { message: String },
}

impl Diagnostic {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::Lex { message: message.into(), span }
    }

    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self::Parse { message: message.into(), span }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self::Semantic { message: message.into(), span }
    }

    pub fn runtime(message: impl Into<String>, span: Span) -> Self {
        Self::Runtime { message: message.into(), span }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io { message: message.into() }
    }

    /// The `Error: …` / `Semantic error: …` / `Compilation error: …` line
    /// printed to the user for this diagnostic.
    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Diagnostic::Lex { span, .. }
            | Diagnostic::Parse { span, .. }
            | Diagnostic::Semantic { span, .. }
            | Diagnostic::Runtime { span, .. } => Some(*span),
            Diagnostic::Io { .. } => None,
        }
    }
}

impl From<std::io::Error> for Diagnostic {
    fn from(e: std::io::Error) -> Self {
        Diagnostic::io(e.to_string())
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::Lex => "lex",
            DiagnosticKind::Parse => "parse",
            DiagnosticKind::Semantic => "semantic",
            DiagnosticKind::Runtime => "runtime",
            DiagnosticKind::Io => "io",
        };
        write!(f, "{s}")
    }
}

/// The tag of a [`Diagnostic`], useful for tests that only want to assert
/// "three semantic errors were raised" without matching full messages.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lex,
    Parse,
    Semantic,
    Runtime,
    Io,
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::Lex { .. } => DiagnosticKind::Lex,
            Diagnostic::Parse { .. } => DiagnosticKind::Parse,
            Diagnostic::Semantic { .. } => DiagnosticKind::Semantic,
            Diagnostic::Runtime { .. } => DiagnosticKind::Runtime,
            Diagnostic::Io { .. } => DiagnosticKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_has_the_right_prefix_per_kind() {
        assert!(Diagnostic::lex("bad char", Span::dummy()).render().starts_with("Error: "));
        assert!(Diagnostic::parse("bad token", Span::dummy()).render().starts_with("Error: "));
        assert!(Diagnostic::semantic("undefined name", Span::dummy())
            .render()
            .starts_with("Semantic error: "));
        assert!(Diagnostic::runtime("division by zero", Span::dummy())
            .render()
            .starts_with("Error: "));
        assert!(Diagnostic::io("no such file").render().starts_with("Compilation error: "));
    }
}
