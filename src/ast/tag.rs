//! Normalized tag arguments, as produced by each tag's `parse` step.

use super::Expr;

/// One declared macro parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<DefaultValue>,
}

/// A parameter default: the expression text exactly as written (whitespace
/// removed) and its parsed form.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultValue {
    pub text: String,
    pub expr: Expr,
}

/// `name(param, param=default, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct MacroSignature {
    pub name: String,
    pub params: Vec<Param>,
}

impl MacroSignature {
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }
}

/// The expression wrapped by a `call` block.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArgs {
    pub expr: Expr,
    pub source: String,
}

/// `"path" as alias [with context]`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportArgs {
    pub path: String,
    pub alias: String,
    /// `with`/`context` were present. Accepted and recorded; no effect.
    pub with_context: bool,
}

/// `"path" import name, name ...`
#[derive(Debug, Clone, PartialEq)]
pub struct FromArgs {
    pub path: String,
    pub names: Vec<String>,
    pub with_context: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TagArgs {
    Macro(MacroSignature),
    Call(CallArgs),
    Import(ImportArgs),
    From(FromArgs),
}
