//! Direct execution of compiled programs.
//!
//! The [`Renderer`] walks instructions, evaluating expressions against the
//! lexical [`Scope`] chain (macro parameters) and the shared [`Context`].
//!
//! Macro invocation follows a fixed protocol:
//!
//! 1. snapshot the context,
//! 2. bind positional arguments, then fill defaults in order for those
//!    still undefined (defaults see every bound argument),
//! 3. let `context.kwargs` override parameters it names,
//! 4. remove parameter-named keys from the context,
//! 5. run the body into a fresh output,
//! 6. restore every snapshot key, keeping keys the body added.

use std::collections::HashMap as StdHashMap;
use std::sync::Arc;

use im::HashMap;

use crate::ast::{Expr, Literal, SymbolKey};
use crate::compiler::{Binding, Instr, MacroDef, Program};
use crate::{err_msg, TempletError};

pub mod context;
pub mod scope;
pub mod value;

pub use context::Context;
pub use scope::Scope;
pub use value::{Callable, CallableKind, DisplayBody, Namespace, Value};

/// Nesting limit for macro and caller invocations.
pub const MAX_CALL_DEPTH: usize = 128;

const CALLER: &str = "caller";
const KWARGS: &str = "kwargs";

pub struct Renderer {
    context: Context,
    symbols: StdHashMap<SymbolKey, Value>,
    depth: usize,
}

impl Renderer {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            symbols: StdHashMap::new(),
            depth: 0,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn into_context(self) -> Context {
        self.context
    }

    /// Runs `program` and returns its output.
    pub fn render(&mut self, program: &Program) -> Result<String, TempletError> {
        let mut out = String::new();
        self.exec(&program.instrs, &Scope::root(), &mut out)?;
        tracing::debug!(template = %program.name, bytes = out.len(), "rendered template");
        Ok(out)
    }

    // ========================================================================
    // INSTRUCTIONS
    // ========================================================================

    fn exec(&mut self, instrs: &[Instr], scope: &Arc<Scope>, out: &mut String) -> Result<(), TempletError> {
        for instr in instrs {
            match instr {
                Instr::EmitLiteral(text) => out.push_str(text),
                Instr::EmitExpr(expr) => {
                    let value = self.eval(expr, scope)?;
                    out.push_str(&self.stringify(&value)?);
                }
                Instr::DefineMacro { binding, def } => {
                    let callable = Value::Callable(Arc::new(Callable {
                        kind: CallableKind::Macro(Arc::clone(def)),
                        captured: Arc::clone(scope),
                    }));
                    self.bind(binding, callable);
                }
                Instr::InvokeWithCapturedBlock { body, expr, source } => {
                    tracing::trace!(call = %source, "invoking with caller");
                    let outer = self.context.get(CALLER).cloned();
                    let caller = Value::Callable(Arc::new(Callable {
                        kind: CallableKind::Caller {
                            body: Arc::clone(body),
                            outer,
                        },
                        captured: Arc::clone(scope),
                    }));
                    let previous = self.context.insert(CALLER, caller);
                    let result = self.eval(expr, scope);
                    self.swap_caller(previous);
                    out.push_str(&self.stringify(&result?)?);
                }
                Instr::BindNamespace {
                    alias,
                    members,
                    literal,
                } => {
                    let namespace = self.namespace(alias);
                    self.context.insert(alias.clone(), Value::Namespace(namespace));
                    self.exec(members, scope, out)?;
                    let mut namespace = self.namespace(alias);
                    namespace.display = Some(Arc::new(DisplayBody {
                        body: Arc::clone(literal),
                        scope: Arc::clone(scope),
                    }));
                    self.context.insert(alias.clone(), Value::Namespace(namespace));
                }
            }
        }
        Ok(())
    }

    /// Sets `context.caller` (or removes it for `None`), returning the
    /// value it replaced.
    fn swap_caller(&mut self, caller: Option<Value>) -> Option<Value> {
        match caller {
            Some(caller) => self.context.insert(CALLER, caller),
            None => self.context.remove(CALLER),
        }
    }

    /// The namespace at `context.<alias>`, starting from a plain map's
    /// entries when the context holds one there.
    fn namespace(&self, alias: &str) -> Namespace {
        match self.context.get(alias) {
            Some(Value::Namespace(ns)) => ns.clone(),
            Some(Value::Map(members)) => Namespace {
                members: members.clone(),
                display: None,
            },
            _ => Namespace::default(),
        }
    }

    fn bind(&mut self, binding: &Binding, value: Value) {
        match binding {
            Binding::Context(name) => {
                self.context.insert(name.clone(), value);
            }
            Binding::Namespace { alias, name } => {
                let mut namespace = self.namespace(alias);
                namespace.members.insert(name.clone(), value);
                self.context.insert(alias.clone(), Value::Namespace(namespace));
            }
            Binding::Hidden(key) => {
                self.symbols.insert(key.clone(), value);
            }
        }
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    pub fn eval(&mut self, expr: &Expr, scope: &Arc<Scope>) -> Result<Value, TempletError> {
        Ok(match expr {
            Expr::Literal(literal) => match literal {
                Literal::None => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
            },
            Expr::Var(name) => scope
                .lookup(name)
                .or_else(|| self.context.get(name))
                .cloned()
                .unwrap_or_default(),
            Expr::Local(name) => scope.lookup(name).cloned().unwrap_or_default(),
            Expr::Context(name) => self.context.get(name).cloned().unwrap_or_default(),
            Expr::Symbol(key) => self.symbols.get(key).cloned().unwrap_or_default(),
            Expr::Member(target, name) => self.eval(target, scope)?.member(name),
            Expr::Index(target, index) => {
                let target = self.eval(target, scope)?;
                let index = self.eval(index, scope)?;
                target.index(&index)
            }
            Expr::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.eval(item, scope))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Map(entries) => {
                let mut map = HashMap::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value, scope)?);
                }
                Value::Map(map)
            }
            Expr::Call {
                callee,
                args,
                kwargs,
            } => {
                let target = self.eval(callee, scope)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                let kwargs = if kwargs.is_empty() {
                    None
                } else {
                    let mut map = HashMap::new();
                    for (key, value) in kwargs {
                        map.insert(key.clone(), self.eval(value, scope)?);
                    }
                    Some(map)
                };
                self.call(&target, args, kwargs, callee)?
            }
        })
    }

    /// Invokes `target`. Keyword arguments are visible as `context.kwargs`
    /// for the duration of this call only.
    fn call(
        &mut self,
        target: &Value,
        args: Vec<Value>,
        kwargs: Option<HashMap<String, Value>>,
        callee: &Expr,
    ) -> Result<Value, TempletError> {
        let callable = match target {
            Value::Undefined | Value::Null => return Ok(Value::Undefined),
            Value::Callable(callable) => Arc::clone(callable),
            other => {
                return Err(err_msg!(
                    Render,
                    "Cannot call {} value `{}`",
                    other.type_name(),
                    describe(callee)
                ))
            }
        };
        self.check_depth(|| describe(callee))?;

        let previous = match kwargs {
            Some(kwargs) => self.context.insert(KWARGS, Value::Map(kwargs)),
            None => self.context.remove(KWARGS),
        };
        self.depth += 1;
        let result = match &callable.kind {
            CallableKind::Macro(def) => self.invoke_macro(def, &callable.captured, args),
            CallableKind::Caller { body, outer } => {
                let current = self.swap_caller(outer.clone());
                let mut out = String::new();
                let result = self.exec(body, &callable.captured, &mut out);
                self.swap_caller(current);
                result.map(|()| Value::String(out))
            }
        };
        self.depth -= 1;
        match previous {
            Some(previous) => {
                self.context.insert(KWARGS, previous);
            }
            None => {
                self.context.remove(KWARGS);
            }
        }
        result
    }

    fn invoke_macro(
        &mut self,
        def: &Arc<MacroDef>,
        captured: &Arc<Scope>,
        args: Vec<Value>,
    ) -> Result<Value, TempletError> {
        tracing::trace!(macro_name = %def.name, args = args.len(), "invoking macro");
        let snapshot = self.context.clone();

        let mut args = args.into_iter();
        let mut vars: HashMap<String, Value> = def
            .params
            .iter()
            .map(|param| (param.name.clone(), args.next().unwrap_or_default()))
            .collect();
        for param in &def.params {
            let Some(default) = &param.default else {
                continue;
            };
            if vars.get(&param.name).map_or(true, Value::is_undefined) {
                let partial = Scope::child(captured, vars.clone());
                let value = self.eval(default, &partial)?;
                vars.insert(param.name.clone(), value);
            }
        }

        if let Some(Value::Map(kwargs)) = self.context.get(KWARGS) {
            for param in &def.params {
                if let Some(value) = kwargs.get(&param.name) {
                    if !value.is_undefined() {
                        vars.insert(param.name.clone(), value.clone());
                    }
                }
            }
        }

        for param in &def.params {
            self.context.remove(&param.name);
        }

        let scope = Scope::child(captured, vars);
        let mut out = String::new();
        let result = self.exec(&def.body, &scope, &mut out);
        self.context.restore(snapshot);
        result?;
        Ok(Value::String(out))
    }

    /// Output text of a value. Namespaces render their display body, which
    /// counts against the call depth like an invocation.
    pub fn stringify(&mut self, value: &Value) -> Result<String, TempletError> {
        match value {
            Value::Namespace(Namespace {
                display: Some(display),
                ..
            }) => {
                let display = Arc::clone(display);
                self.check_depth(|| "namespace display".to_string())?;
                self.depth += 1;
                let mut out = String::new();
                let result = self.exec(&display.body, &display.scope, &mut out);
                self.depth -= 1;
                result.map(|()| out)
            }
            other => Ok(other.to_string()),
        }
    }

    fn check_depth(&self, what: impl FnOnce() -> String) -> Result<(), TempletError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(err_msg!(
                Render,
                "Maximum call depth of {} exceeded calling `{}`",
                MAX_CALL_DEPTH,
                what()
            ));
        }
        Ok(())
    }
}

/// Short description of a callee for error messages.
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Var(name) | Expr::Local(name) | Expr::Context(name) => name.clone(),
        Expr::Symbol(key) => key.name.clone(),
        Expr::Member(target, name) => format!("{}.{name}", describe(target)),
        _ => "expression".to_string(),
    }
}
