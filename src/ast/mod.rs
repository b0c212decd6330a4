//! Syntax tree for templates.
//!
//! The document parser produces a tree of [`Node`]s. Tag nodes carry their
//! already-parsed arguments ([`TagArgs`]); outputs and tag arguments share the
//! small [`Expr`] language defined here.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod tag;

pub use tag::{CallArgs, DefaultValue, FromArgs, ImportArgs, MacroSignature, Param, TagArgs};

// ============================================================================
// SPANS
// ============================================================================

/// Byte range into a template's source text.
///
/// # Examples
///
/// ```rust
/// use templet::ast::Span;
/// let span = Span::new(3, 8).join(Span::new(10, 12));
/// assert_eq!(span, Span::new(3, 12));
/// assert_eq!(span.len(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

// ============================================================================
// TEMPLATE TREE
// ============================================================================

/// A parsed template file.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Resolved name of the file (what resolvers and diagnostics call it).
    pub name: String,
    pub source: String,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal markup copied to the output unchanged.
    Text(String),
    /// `{{ expr }}`
    Output(OutputNode),
    /// `{% name args %}`, with nested content for tags that have an end tag.
    Tag(TagNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputNode {
    pub expr: Expr,
    /// The expression text as written, whitespace trimmed.
    pub source: String,
    pub line: usize,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagNode {
    pub name: String,
    pub args: TagArgs,
    pub content: Vec<Node>,
    pub line: usize,
    pub span: Span,
}

impl Node {
    /// Name of the tag if this node is one.
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Node::Tag(tag) => Some(&tag.name),
            _ => None,
        }
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    None,
    Bool(bool),
    Number(f64),
    String(String),
}

/// Address of a macro in the private symbol table: the file that defines it
/// and its declared name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolKey {
    pub source: String,
    pub name: String,
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.source, self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// A variable root the compiler has not resolved yet.
    Var(String),
    /// A macro parameter or other lexically bound name.
    Local(String),
    /// An entry of the ambient rendering context.
    Context(String),
    /// A macro reachable only through the private symbol table.
    Symbol(SymbolKey),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    List(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
}

impl Expr {
    /// Builds `a.b.c` from a dotted variable path.
    pub fn path(dotted: &str) -> Expr {
        let mut parts = dotted.split('.');
        let root = Expr::Var(parts.next().unwrap_or_default().to_string());
        parts.fold(root, |acc, member| Expr::Member(Box::new(acc), member.to_string()))
    }

    /// Resolves every [`Expr::Var`] to a local or a context reference.
    pub fn resolve(&mut self, is_local: &dyn Fn(&str) -> bool) {
        self.rewrite(&mut |expr| match expr {
            Expr::Var(name) if is_local(name) => Some(Expr::Local(name.clone())),
            Expr::Var(name) => Some(Expr::Context(name.clone())),
            _ => None,
        });
    }

    /// Top-down rewrite. When `f` returns a replacement the node is swapped and
    /// its replacement is not visited again, so every node is rewritten at
    /// most once.
    pub fn rewrite(&mut self, f: &mut dyn FnMut(&Expr) -> Option<Expr>) {
        if let Some(replacement) = f(self) {
            *self = replacement;
            return;
        }
        match self {
            Expr::Member(target, _) => target.rewrite(f),
            Expr::Index(target, index) => {
                target.rewrite(f);
                index.rewrite(f);
            }
            Expr::List(items) => items.iter_mut().for_each(|item| item.rewrite(f)),
            Expr::Map(entries) => entries.iter_mut().for_each(|(_, v)| v.rewrite(f)),
            Expr::Call {
                callee,
                args,
                kwargs,
            } => {
                callee.rewrite(f);
                args.iter_mut().for_each(|arg| arg.rewrite(f));
                kwargs.iter_mut().for_each(|(_, v)| v.rewrite(f));
            }
            Expr::Literal(_)
            | Expr::Var(_)
            | Expr::Local(_)
            | Expr::Context(_)
            | Expr::Symbol(_) => {}
        }
    }
}
