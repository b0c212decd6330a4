//! `{% macro name(params) %} ... {% endmacro %}`

use std::sync::Arc;

use crate::ast::{MacroSignature, Node, TagArgs, TagNode};
use crate::compiler::{Binding, Compiler, Frame, Instr, IrParam, MacroDef};
use crate::syntax::lexer::Token;
use crate::tags::{mismatched_args, signature, ParseContext, Tag};
use crate::TempletError;

pub struct MacroTag;

impl Tag for MacroTag {
    fn name(&self) -> &'static str {
        "macro"
    }

    fn ends(&self) -> bool {
        true
    }

    fn block(&self) -> bool {
        true
    }

    fn parse(&self, tokens: &[Token], cx: &ParseContext<'_>) -> Result<TagArgs, TempletError> {
        signature::parse_signature(tokens, cx).map(TagArgs::Macro)
    }

    fn compile(
        &self,
        compiler: &mut Compiler<'_>,
        tag: &TagNode,
        frame: &Frame,
    ) -> Result<Vec<Instr>, TempletError> {
        let TagArgs::Macro(sig) = &tag.args else {
            return Err(mismatched_args(self.name(), tag));
        };
        let def = compile_macro(compiler, sig, &tag.content, frame)?;
        Ok(vec![Instr::DefineMacro {
            binding: Binding::Context(sig.name.clone()),
            def: Arc::new(def),
        }])
    }
}

/// Compiles a macro body with its parameters in scope. Defaults see the
/// parameters too, so `b=a` refers to the first argument.
pub fn compile_macro(
    compiler: &mut Compiler<'_>,
    sig: &MacroSignature,
    content: &[Node],
    frame: &Frame,
) -> Result<MacroDef, TempletError> {
    let names: Vec<String> = sig.param_names().map(str::to_string).collect();
    let (params, body) = compiler.with_locals(names, |c| {
        let params = sig
            .params
            .iter()
            .map(|p| IrParam {
                name: p.name.clone(),
                default: p.default.as_ref().map(|d| c.resolve(&d.expr)),
            })
            .collect::<Vec<_>>();
        let body = c.compile_nodes(content, frame)?;
        Ok((params, body))
    })?;

    tracing::debug!(
        macro_name = %sig.name,
        file = compiler.filename(),
        params = params.len(),
        "compiled macro"
    );
    Ok(MacroDef {
        name: sig.name.clone(),
        params,
        body,
        source: compiler.filename().to_string(),
        safe: true,
    })
}
