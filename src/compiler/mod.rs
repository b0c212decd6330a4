//! Template tree to instructions.
//!
//! The compiler walks nodes in order and hands every tag to its definition
//! in the [`TagRegistry`]. It owns the state tags need while compiling:
//!
//! - the lexical stack of macro parameters, so outputs can tell a local from
//!   a context variable,
//! - the stack of files being compiled, for relative imports, diagnostics
//!   and cycle detection.

use crate::ast::{Expr, Node, Template};
use crate::diagnostics::{to_error_source, SourceArc};
use crate::resolver::Resolver;
use crate::syntax::parse_template;
use crate::tags::TagRegistry;
use crate::{err_msg, TempletError};

pub mod ir;
pub mod symbols;

pub use ir::{Binding, Fragment, Instr, IrParam, MacroDef, Program};
pub use symbols::SymbolTable;

pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub max_import_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }
}

/// Options threaded through nested compilation unchanged: the chain of
/// enclosing template names and the current block name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub parents: Vec<String>,
    pub block: Option<String>,
}

impl Frame {
    /// Same frame with no parent chain; used for imported macro bodies.
    pub fn detached(&self) -> Frame {
        Frame {
            parents: Vec::new(),
            block: self.block.clone(),
        }
    }
}

struct OpenFile {
    name: String,
    src: SourceArc,
}

pub struct Compiler<'a> {
    tags: &'a TagRegistry,
    resolver: &'a dyn Resolver,
    options: CompileOptions,
    locals: Vec<Vec<String>>,
    files: Vec<OpenFile>,
}

impl<'a> Compiler<'a> {
    pub fn new(tags: &'a TagRegistry, resolver: &'a dyn Resolver, options: CompileOptions) -> Self {
        Self {
            tags,
            resolver,
            options,
            locals: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Compiles a parsed template into a program.
    pub fn compile(&mut self, template: &Template) -> Result<Program, TempletError> {
        let instrs =
            self.within_file(template, |c| c.compile_nodes(&template.nodes, &Frame::default()))?;
        tracing::debug!(
            template = %template.name,
            instrs = instrs.len(),
            "compiled template"
        );
        Ok(Program {
            name: template.name.clone(),
            instrs,
        })
    }

    pub fn compile_nodes(&mut self, nodes: &[Node], frame: &Frame) -> Result<Vec<Instr>, TempletError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            out.extend(self.compile_node(node, frame)?);
        }
        Ok(out)
    }

    pub fn compile_node(&mut self, node: &Node, frame: &Frame) -> Result<Vec<Instr>, TempletError> {
        match node {
            Node::Text(text) => Ok(vec![Instr::EmitLiteral(text.clone())]),
            Node::Output(output) => Ok(vec![Instr::EmitExpr(self.resolve(&output.expr))]),
            Node::Tag(tag) => {
                let tags = self.tags;
                let Some(definition) = tags.get(&tag.name) else {
                    return Err(err_msg!(Internal, "No definition for tag `{}`", tag.name));
                };
                definition.compile(self, tag, frame)
            }
        }
    }

    /// Resolves variable roots against the macro parameters in scope.
    pub fn resolve(&self, expr: &Expr) -> Expr {
        let mut expr = expr.clone();
        expr.resolve(&|name| self.is_local(name));
        expr
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|frame| frame.iter().any(|n| n == name))
    }

    /// Runs `f` with `names` bound as locals.
    pub fn with_locals<T>(
        &mut self,
        names: Vec<String>,
        f: impl FnOnce(&mut Self) -> Result<T, TempletError>,
    ) -> Result<T, TempletError> {
        self.locals.push(names);
        let result = f(self);
        self.locals.pop();
        result
    }

    /// Loads and parses `path` relative to the file being compiled.
    ///
    /// Fails when the file is already being compiled further up the import
    /// chain or when the chain is deeper than the configured limit.
    pub fn load(&mut self, path: &str) -> Result<Template, TempletError> {
        let from = self.files.last().map(|f| f.name.clone());
        let source = self.resolver.load(path, from.as_deref())?;
        if self.files.iter().any(|f| f.name == source.name) {
            let chain: Vec<&str> = self.files.iter().map(|f| f.name.as_str()).collect();
            return Err(err_msg!(
                Resolve,
                "Circular import of `{}` (chain: {} -> {})",
                source.name,
                chain.join(" -> "),
                source.name
            ));
        }
        if self.files.len() >= self.options.max_import_depth {
            return Err(err_msg!(
                Resolve,
                "Import of `{}` exceeds the maximum import depth of {}",
                source.name,
                self.options.max_import_depth
            ));
        }
        parse_template(&source.name, &source.text, self.tags)
    }

    /// Runs `f` with `template` as the current file. Locals of the
    /// enclosing file are not visible inside.
    pub fn within_file<T>(
        &mut self,
        template: &Template,
        f: impl FnOnce(&mut Self) -> Result<T, TempletError>,
    ) -> Result<T, TempletError> {
        self.files.push(OpenFile {
            name: template.name.clone(),
            src: to_error_source(&template.name, &template.source),
        });
        let outer = std::mem::take(&mut self.locals);
        let result = f(self);
        self.locals = outer;
        self.files.pop();
        result
    }

    /// Name of the file being compiled.
    pub fn filename(&self) -> &str {
        self.files.last().map(|f| f.name.as_str()).unwrap_or_default()
    }

    /// Source of the file being compiled, for diagnostics.
    pub fn source(&self) -> SourceArc {
        match self.files.last() {
            Some(file) => file.src.clone(),
            None => to_error_source("<unknown>", ""),
        }
    }
}
