//! `{% from "path" import a, b %}`
//!
//! Binds the listed macros of the target file directly on the context.
//! Their unlisted siblings are still defined, but only in the private symbol
//! table, so the listed macros can call them without leaking them.

use std::collections::BTreeSet;

use crate::ast::{FromArgs, TagArgs, TagNode};
use crate::compiler::{Compiler, Fragment, Frame, Instr, SymbolTable};
use crate::syntax::lexer::Token;
use crate::tags::import::{collect_fragments, parse_header, unexpected_variable};
use crate::tags::{mismatched_args, ParseContext, Tag};
use crate::{err_ctx, TempletError};

pub struct FromTag;

impl Tag for FromTag {
    fn name(&self) -> &'static str {
        "from"
    }

    fn ends(&self) -> bool {
        false
    }

    fn block(&self) -> bool {
        true
    }

    fn parse(&self, tokens: &[Token], cx: &ParseContext<'_>) -> Result<TagArgs, TempletError> {
        let header = parse_header(tokens, cx, self.name())?;
        let Some(marker) = header.words.iter().rposition(|t| t.text == "import") else {
            return Err(err_ctx!(
                Syntax,
                format!("Missing `import` in from tag on line {}.", cx.line),
                cx.src,
                cx.span,
                "write `{% from \"file\" import name %}`"
            ));
        };
        if let Some(stray) = header.words[..marker].first() {
            return Err(unexpected_variable(stray, cx));
        }

        let mut names: Vec<String> = Vec::new();
        for token in &header.words[marker + 1..] {
            if token.text.contains('.') {
                return Err(err_ctx!(
                    Syntax,
                    format!(
                        "Unexpected dot in imported name \"{}\" on line {}.",
                        token.text, token.line
                    ),
                    cx.src,
                    token.span
                ));
            }
            if !names.contains(&token.text) {
                names.push(token.text.clone());
            }
        }
        if names.is_empty() {
            return Err(err_ctx!(
                Syntax,
                format!("No macro names listed in from tag on line {}.", cx.line),
                cx.src,
                cx.span
            ));
        }

        Ok(TagArgs::From(FromArgs {
            path: header.path,
            names,
            with_context: header.with_context,
        }))
    }

    fn compile(
        &self,
        compiler: &mut Compiler<'_>,
        tag: &TagNode,
        frame: &Frame,
    ) -> Result<Vec<Instr>, TempletError> {
        let TagArgs::From(args) = &tag.args else {
            return Err(mismatched_args(self.name(), tag));
        };
        let (source, fragments) = collect_fragments(compiler, &args.path, frame)?;
        let table = SymbolTable::from_fragments(&source, &fragments);

        if let Some(missing) = args.names.iter().find(|name| !table.contains(name)) {
            return Err(err_ctx!(
                Compile,
                format!(
                    "Macro `{missing}` is not defined in `{source}` (from tag on line {}).",
                    tag.line
                ),
                &compiler.source(),
                tag.span,
                format!("`{source}` defines: {}", table.names().join(", "))
            ));
        }
        let selected: BTreeSet<String> = args.names.iter().cloned().collect();

        let mut out = Vec::new();
        for fragment in fragments {
            match fragment {
                Fragment::Import(instrs) => out.extend(instrs),
                Fragment::Html(_) => {}
                Fragment::Macro { mut instrs, .. } => {
                    table.qualify_selected(&mut instrs, &selected);
                    out.extend(instrs);
                }
            }
        }

        tracing::debug!(
            file = %source,
            selected = ?args.names,
            hidden = table.names().len() - selected.len(),
            "imported macros"
        );
        Ok(out)
    }
}
