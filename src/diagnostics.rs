//! Unified, `miette`-based diagnostics for the template compiler.
//!
//! Every failure produced while lexing, parsing, resolving, compiling or
//! rendering a template is a [`TempletError`]. Construct them with the
//! [`err_msg!`](crate::err_msg) and [`err_ctx!`](crate::err_ctx) macros rather
//! than by hand:
//!
//! - `err_msg!(Compile, "macro `{}` is not defined", name)` for message-only errors.
//! - `err_ctx!(Syntax, message, &src, span)` when a source and span are at hand.
//! - `err_ctx!(Syntax, message, &src, span, help)` to attach a help line.
//!
//! Syntax errors always name the offending line in their message, so they stay
//! readable even when rendered without a source snippet.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::Span;

pub type SourceArc = Arc<NamedSource<String>>;

/// Type-safe error classification, mirroring the [`TempletError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Malformed template text, tag arguments or macro signatures
    Syntax,
    /// Missing, unreadable or circular imports
    Resolve,
    /// Well-formed input that cannot be compiled (unknown `from` names)
    Compile,
    /// Failures while executing a compiled program
    Render,
    /// Broken engine invariants
    Internal,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Syntax => "Syntax",
            ErrorType::Resolve => "Resolve",
            ErrorType::Compile => "Compile",
            ErrorType::Render => "Render",
            ErrorType::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single additional label for multi-span diagnostics.
#[derive(Debug)]
pub struct RelatedLabel {
    pub source: SourceArc,
    pub span: Span,
    pub label: String,
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The primary source for this error (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
    /// Additional labeled spans for multi-label diagnostics.
    pub related: Vec<RelatedLabel>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
            related: vec![],
        }
    }
}

#[derive(Debug, Error)]
pub enum TempletError {
    #[error("Syntax error: {message}")]
    Syntax {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Resolve error: {message}")]
    Resolve {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Compile error: {message}")]
    Compile {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Render error: {message}")]
    Render {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl TempletError {
    fn parts(&self) -> (&str, &ErrorContext) {
        match self {
            TempletError::Syntax { message, ctx, .. }
            | TempletError::Resolve { message, ctx, .. }
            | TempletError::Compile { message, ctx, .. }
            | TempletError::Render { message, ctx, .. }
            | TempletError::Internal { message, ctx, .. } => (message, ctx),
        }
    }

    /// The bare message, without the variant prefix.
    pub fn message(&self) -> &str {
        self.parts().0
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            TempletError::Syntax { .. } => ErrorType::Syntax,
            TempletError::Resolve { .. } => ErrorType::Resolve,
            TempletError::Compile { .. } => ErrorType::Compile,
            TempletError::Render { .. } => ErrorType::Render,
            TempletError::Internal { .. } => ErrorType::Internal,
        }
    }

    /// Attaches a cause, keeping the variant and context.
    pub fn caused_by(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        let slot = match &mut self {
            TempletError::Syntax { source, .. }
            | TempletError::Resolve { source, .. }
            | TempletError::Compile { source, .. }
            | TempletError::Render { source, .. }
            | TempletError::Internal { source, .. } => source,
        };
        *slot = Some(Box::new(cause));
        self
    }
}

impl Diagnostic for TempletError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!(
            "templet::{}",
            self.error_type().as_str().to_lowercase()
        )))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.parts()
            .1
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.parts()
            .1
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (message, ctx) = self.parts();
        let mut labels = Vec::new();
        if let Some(span) = ctx.span {
            labels.push(LabeledSpan::new(
                Some(message.to_string()),
                span.start,
                span.len().max(1),
            ));
        }
        for rel in &ctx.related {
            labels.push(LabeledSpan::new(
                Some(rel.label.clone()),
                rel.span.start,
                rel.span.len().max(1),
            ));
        }
        if labels.is_empty() {
            None
        } else {
            Some(Box::new(labels.into_iter()))
        }
    }
}

/// Converts a named source string into a shareable error source.
pub fn to_error_source(name: impl AsRef<str>, source: impl AsRef<str>) -> SourceArc {
    Arc::new(NamedSource::new(
        name.as_ref().to_string(),
        source.as_ref().to_string(),
    ))
}

/// Constructs a [`TempletError`] variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::TempletError::$variant {
            message: format!($msg, $($arg),+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
    ($variant:ident, $msg:expr) => {
        $crate::TempletError::$variant {
            message: format!("{}", $msg),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a [`TempletError`] variant with a message, a `&SourceArc`, a span,
/// and optionally a help line.
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::TempletError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
                related: vec![],
            },
            source: None,
        }
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::TempletError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
            source: None,
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn multilabel_diagnostics_render_all_labels() {
        let src = to_error_source("page.html", "{% macro a.b() %}");
        let related = vec![RelatedLabel {
            source: src.clone(),
            span: Span::new(0, 2),
            label: "tag opened here".to_string(),
        }];
        let err = TempletError::Syntax {
            message: "Unexpected dot in macro argument".to_string(),
            ctx: ErrorContext {
                source: Some(src.clone()),
                span: Some(Span::new(9, 12)),
                help: Some("Parameter names cannot contain '.'".to_string()),
                related,
            },
            source: None,
        };
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("tag opened here"));
        assert!(output.contains("Parameter names cannot contain"));
        assert!(output.contains("templet::syntax"));
    }

    #[test]
    fn error_chaining_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = err_msg!(Resolve, "cannot load `{}`", "shared.tpl").caused_by(io);
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("cannot load `shared.tpl`"));
        assert!(output.contains("no such file"));
    }

    #[test]
    fn error_type_matches_variant() {
        let src = to_error_source("t", "abc");
        let err = err_ctx!(Compile, "nope", &src, Span::new(0, 1), "try again");
        assert_eq!(err.error_type(), ErrorType::Compile);
        assert_eq!(err.message(), "nope");
        assert_eq!(err_msg!(Render, "x").error_type().to_string(), "Render");
    }
}
