//! Compiled form of a template.
//!
//! Instructions are backend-neutral: [`crate::runtime::Renderer`] executes
//! them directly and [`crate::lower`] serializes them as script text.

use std::sync::Arc;

use crate::ast::{Expr, SymbolKey};

/// Where a defined macro is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Binding {
    /// `context.<name>`
    Context(String),
    /// `context.<alias>.<name>`
    Namespace { alias: String, name: String },
    /// The private symbol table, unreachable from template code by name.
    Hidden(SymbolKey),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrParam {
    pub name: String,
    /// Resolved default expression; evaluated only when the argument is
    /// absent or undefined.
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroDef {
    pub name: String,
    pub params: Vec<IrParam>,
    pub body: Vec<Instr>,
    /// File the macro was written in.
    pub source: String,
    /// Output is pre-rendered markup and is never escaped again.
    pub safe: bool,
}

impl MacroDef {
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    EmitLiteral(String),
    EmitExpr(Expr),
    DefineMacro {
        binding: Binding,
        def: Arc<MacroDef>,
    },
    /// Runs `expr` with `caller` bound to `body` for the duration.
    InvokeWithCapturedBlock {
        body: Arc<Vec<Instr>>,
        expr: Expr,
        /// The wrapped expression as written.
        source: String,
    },
    /// Makes sure `context.<alias>` is a namespace, runs `members` (which
    /// bind into it) and installs `literal` as its display body.
    BindNamespace {
        alias: String,
        members: Vec<Instr>,
        literal: Arc<Vec<Instr>>,
    },
}

impl Instr {
    /// Applies [`Expr::rewrite`] to every expression reachable from this
    /// instruction, macro bodies and defaults included. Nested namespaces
    /// are left alone; they were qualified against their own file.
    pub fn rewrite_exprs(&mut self, f: &mut dyn FnMut(&Expr) -> Option<Expr>) {
        match self {
            Instr::EmitLiteral(_) | Instr::BindNamespace { .. } => {}
            Instr::EmitExpr(expr) => expr.rewrite(f),
            Instr::DefineMacro { def, .. } => {
                let def = Arc::make_mut(def);
                for param in &mut def.params {
                    if let Some(default) = &mut param.default {
                        default.rewrite(f);
                    }
                }
                rewrite_all(&mut def.body, f);
            }
            Instr::InvokeWithCapturedBlock { body, expr, .. } => {
                rewrite_all(Arc::make_mut(body).as_mut_slice(), f);
                expr.rewrite(f);
            }
        }
    }
}

pub fn rewrite_all(instrs: &mut [Instr], f: &mut dyn FnMut(&Expr) -> Option<Expr>) {
    for instr in instrs {
        instr.rewrite_exprs(f);
    }
}

/// One top-level piece of an imported file.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Output of a nested `import` or `from` tag; kept as-is.
    Import(Vec<Instr>),
    /// A macro definition declared at the file's top level.
    Macro { name: String, instrs: Vec<Instr> },
    /// Everything else: markup, outputs and other tags.
    Html(Vec<Instr>),
}

/// A compiled template.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: String,
    pub instrs: Vec<Instr>,
}
