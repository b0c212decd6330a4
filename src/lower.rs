//! Serializes a program as JavaScript-style source.
//!
//! The generated text targets a host runtime that provides `_ctx` (the
//! context object), `_utils` (`extend`, `each`, `withKwargs`) and `_symbols`
//! (the private symbol table). Lowering is deterministic: compiling the same
//! template twice yields identical text.

use crate::ast::{Expr, Literal};
use crate::compiler::{Binding, Instr, MacroDef, Program};
use crate::runtime::value::format_number;

const INDENT: &str = "  ";

/// Renders `program` as script text.
pub fn to_source(program: &Program) -> String {
    let mut writer = Writer::default();
    writer.instrs(&program.instrs);
    writer.out
}

/// Renders one expression.
pub fn expr_source(expr: &Expr) -> String {
    match expr {
        Expr::Literal(literal) => literal_source(literal),
        Expr::Var(name) | Expr::Context(name) => format!("_ctx.{name}"),
        Expr::Local(name) => local_ident(name),
        Expr::Symbol(key) => format!("_symbols[{}]", quote(&key.to_string())),
        Expr::Member(target, name) => format!("{}.{name}", expr_source(target)),
        Expr::Index(target, index) => format!("{}[{}]", expr_source(target), expr_source(index)),
        Expr::List(items) => format!("[{}]", join(items.iter().map(expr_source))),
        Expr::Map(entries) => map_source(entries),
        Expr::Call {
            callee,
            args,
            kwargs,
        } => {
            let call = format!(
                "{}({})",
                expr_source(callee),
                join(args.iter().map(expr_source))
            );
            if kwargs.is_empty() {
                call
            } else {
                format!(
                    "_utils.withKwargs(_ctx, {}, function () {{ return {call}; }})",
                    map_source(kwargs)
                )
            }
        }
    }
}

fn literal_source(literal: &Literal) -> String {
    match literal {
        Literal::None => "null".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Number(n) => format_number(*n),
        Literal::String(s) => quote(s),
    }
}

fn map_source(entries: &[(String, Expr)]) -> String {
    let entries = entries
        .iter()
        .map(|(key, value)| format!("{}: {}", quote(key), expr_source(value)));
    format!("{{{}}}", join(entries))
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}

/// JSON string literal, which is also a valid script string literal.
fn quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "let", "new", "null", "return", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Parameter names become function locals; reserved words get a prefix.
fn local_ident(name: &str) -> String {
    if RESERVED.contains(&name) || name.starts_with('_') {
        format!("_{name}")
    } else {
        name.to_string()
    }
}

fn binding_target(binding: &Binding) -> String {
    match binding {
        Binding::Context(name) => format!("_ctx.{name}"),
        Binding::Namespace { alias, name } => format!("_ctx.{alias}.{name}"),
        Binding::Hidden(key) => format!("_symbols[{}]", quote(&key.to_string())),
    }
}

#[derive(Default)]
struct Writer {
    out: String,
    depth: usize,
}

impl Writer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn instrs(&mut self, instrs: &[Instr]) {
        for instr in instrs {
            self.instr(instr);
        }
    }

    fn instr(&mut self, instr: &Instr) {
        match instr {
            Instr::EmitLiteral(text) => self.line(&format!("_output += {};", quote(text))),
            Instr::EmitExpr(expr) => self.line(&format!("_output += {};", expr_source(expr))),
            Instr::DefineMacro { binding, def } => self.define(binding, def),
            Instr::InvokeWithCapturedBlock { body, expr, .. } => {
                self.line("var __caller = _ctx.caller;");
                self.line("_ctx.caller = (function (__outer) {");
                self.indented(|w| {
                    w.line("return function () {");
                    w.indented(|w| {
                        w.line("var _output = \"\",");
                        w.line("  __inner = _ctx.caller;");
                        w.line("_ctx.caller = __outer;");
                        w.instrs(body);
                        w.line("_ctx.caller = __inner;");
                        w.line("return _output;");
                    });
                    w.line("};");
                });
                self.line("})(__caller);");
                self.line(&format!("_output += {};", expr_source(expr)));
                self.line("if (__caller === undefined) { delete _ctx.caller; } else { _ctx.caller = __caller; }");
            }
            Instr::BindNamespace {
                alias,
                members,
                literal,
            } => {
                let target = format!("_ctx.{alias}");
                self.line(&format!("{target} = ({target} || {{}});"));
                self.instrs(members);
                self.line(&format!("{target}.toString = function () {{"));
                self.indented(|w| {
                    w.line("var _output = \"\";");
                    w.instrs(literal);
                    w.line("return _output;");
                });
                self.line("};");
            }
        }
    }

    fn define(&mut self, binding: &Binding, def: &MacroDef) {
        let target = binding_target(binding);
        let params: Vec<String> = def.param_names().map(local_ident).collect();
        let names = join(def.param_names().map(quote));

        self.line(&format!("{target} = function ({}) {{", params.join(", ")));
        self.indented(|w| {
            w.line("var _output = \"\",");
            w.line("  __ctx = _utils.extend({}, _ctx);");
            for (param, ident) in def.params.iter().zip(&params) {
                if let Some(default) = &param.default {
                    w.line(&format!(
                        "if ({ident} === undefined) {{ {ident} = {}; }}",
                        expr_source(default)
                    ));
                }
            }
            if !def.params.is_empty() {
                w.line("if (_ctx.kwargs !== undefined) {");
                w.indented(|w| {
                    for (param, ident) in def.params.iter().zip(&params) {
                        w.line(&format!(
                            "if (_ctx.kwargs.{0} !== undefined) {{ {ident} = _ctx.kwargs.{0}; }}",
                            param.name
                        ));
                    }
                });
                w.line("}");
                w.line(&format!(
                    "_utils.each([{names}], function (k) {{ delete _ctx[k]; }});"
                ));
            }
            w.instrs(&def.body);
            w.line("_ctx = _utils.extend(_ctx, __ctx);");
            w.line("return _output;");
        });
        self.line("};");
        self.line(&format!("{target}.safe = {};", def.safe));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_parameter_names_are_prefixed() {
        assert_eq!(local_ident("class"), "_class");
        assert_eq!(local_ident("name"), "name");
    }

    #[test]
    fn calls_with_keywords_go_through_with_kwargs() {
        let expr = Expr::Call {
            callee: Box::new(Expr::Context("greet".into())),
            args: vec![Expr::Literal(Literal::String("Ann".into()))],
            kwargs: vec![("greeting".into(), Expr::Literal(Literal::String("Hi".into())))],
        };
        assert_eq!(
            expr_source(&expr),
            r#"_utils.withKwargs(_ctx, {"greeting": "Hi"}, function () { return _ctx.greet("Ann"); })"#
        );
    }

    #[test]
    fn namespace_members_are_qualified() {
        let expr = Expr::Member(Box::new(Expr::Context("widgets".into())), "button".into());
        assert_eq!(expr_source(&expr), "_ctx.widgets.button");
    }
}
