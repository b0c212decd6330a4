//! `{% call expr %} ... {% endcall %}`
//!
//! The block content becomes a zero-argument `caller` visible to whatever
//! `expr` invokes. The previous `caller`, if any, comes back afterwards.

use std::sync::Arc;

use crate::ast::{CallArgs, TagArgs, TagNode};
use crate::compiler::{Compiler, Frame, Instr};
use crate::syntax::expr::parse_expr;
use crate::syntax::lexer::{Token, TokenKind};
use crate::tags::{mismatched_args, ParseContext, Tag};
use crate::{err_ctx, TempletError};

pub struct CallTag;

impl Tag for CallTag {
    fn name(&self) -> &'static str {
        "call"
    }

    fn ends(&self) -> bool {
        true
    }

    fn block(&self) -> bool {
        false
    }

    fn parse(&self, tokens: &[Token], cx: &ParseContext<'_>) -> Result<TagArgs, TempletError> {
        if tokens.iter().all(|t| t.kind == TokenKind::Whitespace) {
            return Err(err_ctx!(
                Syntax,
                format!("Missing expression in call tag on line {}.", cx.line),
                cx.src,
                cx.span
            ));
        }
        let expr = parse_expr(tokens, cx.src)?;
        let source: String = tokens.iter().map(Token::source_text).collect();
        Ok(TagArgs::Call(CallArgs {
            expr,
            source: source.trim().to_string(),
        }))
    }

    fn compile(
        &self,
        compiler: &mut Compiler<'_>,
        tag: &TagNode,
        frame: &Frame,
    ) -> Result<Vec<Instr>, TempletError> {
        let TagArgs::Call(args) = &tag.args else {
            return Err(mismatched_args(self.name(), tag));
        };
        let body = compiler.compile_nodes(&tag.content, frame)?;
        Ok(vec![Instr::InvokeWithCapturedBlock {
            body: Arc::new(body),
            expr: compiler.resolve(&args.expr),
            source: args.source.clone(),
        }])
    }
}
