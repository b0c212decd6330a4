//! Per-file macro symbol tables and reference qualification.
//!
//! When a file's macros are imported they stop living at `context.<name>`.
//! Any reference one of them makes to a sibling has to follow it to its new
//! home. The table records which names the file defines; qualification then
//! rewrites context references to those names, and only those, structurally.

use std::collections::BTreeSet;

use crate::ast::{Expr, SymbolKey};
use crate::compiler::ir::{rewrite_all, Binding, Fragment, Instr};

/// Macros declared at the top level of one file, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    source: String,
    names: Vec<String>,
}

impl SymbolTable {
    pub fn from_fragments(source: &str, fragments: &[Fragment]) -> Self {
        let mut names: Vec<String> = Vec::new();
        for fragment in fragments {
            if let Fragment::Macro { name, .. } = fragment {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        Self {
            source: source.to_string(),
            names,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn key(&self, name: &str) -> SymbolKey {
        SymbolKey {
            source: self.source.clone(),
            name: name.to_string(),
        }
    }

    /// Moves a macro fragment under `alias`: its definition binds to
    /// `context.<alias>.<name>` and sibling references become
    /// `context.<alias>.<sibling>`.
    pub fn qualify_into_namespace(&self, instrs: &mut [Instr], alias: &str) {
        self.rebind(instrs, |name| Binding::Namespace {
            alias: alias.to_string(),
            name: name.to_string(),
        });
        rewrite_all(instrs, &mut |expr| match expr {
            Expr::Context(name) if self.contains(name) => Some(Expr::Member(
                Box::new(Expr::Context(alias.to_string())),
                name.clone(),
            )),
            _ => None,
        });
    }

    /// Binds the `selected` macros directly on the context and hides the
    /// rest in the symbol table. References to hidden siblings become
    /// symbol lookups; references to selected ones stay as they are.
    pub fn qualify_selected(&self, instrs: &mut [Instr], selected: &BTreeSet<String>) {
        self.rebind(instrs, |name| {
            if selected.contains(name) {
                Binding::Context(name.to_string())
            } else {
                Binding::Hidden(self.key(name))
            }
        });
        rewrite_all(instrs, &mut |expr| match expr {
            Expr::Context(name) if self.contains(name) && !selected.contains(name) => {
                Some(Expr::Symbol(self.key(name)))
            }
            _ => None,
        });
    }

    /// Rewrites the binding of every top-level definition this table owns.
    fn rebind(&self, instrs: &mut [Instr], target: impl Fn(&str) -> Binding) {
        for instr in instrs {
            if let Instr::DefineMacro { binding, def } = instr {
                if matches!(binding, Binding::Context(name) if self.contains(name)) {
                    *binding = target(&def.name);
                }
            }
        }
    }
}
