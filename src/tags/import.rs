//! `{% import "path" as alias %}`
//!
//! Compiles every top-level macro of the target file under
//! `context.<alias>`. The file's markup becomes the namespace's display
//! body, so `{{ alias }}` renders it.

use std::sync::Arc;

use crate::ast::{ImportArgs, Node, TagArgs, TagNode};
use crate::compiler::{Compiler, Fragment, Frame, Instr, SymbolTable};
use crate::syntax::expr::unescape;
use crate::syntax::lexer::{Token, TokenKind};
use crate::tags::{mismatched_args, ParseContext, Tag};
use crate::{err_ctx, TempletError};

pub struct ImportTag;

impl Tag for ImportTag {
    fn name(&self) -> &'static str {
        "import"
    }

    fn ends(&self) -> bool {
        false
    }

    fn block(&self) -> bool {
        true
    }

    fn parse(&self, tokens: &[Token], cx: &ParseContext<'_>) -> Result<TagArgs, TempletError> {
        let header = parse_header(tokens, cx, self.name())?;
        let mut words = header.words.into_iter();
        let Some(alias) = words.next() else {
            return Err(err_ctx!(
                Syntax,
                format!("Missing namespace alias in import tag on line {}.", cx.line),
                cx.src,
                cx.span,
                "write `{% import \"file\" as name %}`"
            ));
        };
        if let Some(extra) = words.next() {
            return Err(unexpected_variable(&extra, cx));
        }
        if alias.text.contains('.') {
            return Err(err_ctx!(
                Syntax,
                format!(
                    "Unexpected dot in namespace alias \"{}\" on line {}.",
                    alias.text, alias.line
                ),
                cx.src,
                alias.span
            ));
        }
        Ok(TagArgs::Import(ImportArgs {
            path: header.path,
            alias: alias.text,
            with_context: header.with_context,
        }))
    }

    fn compile(
        &self,
        compiler: &mut Compiler<'_>,
        tag: &TagNode,
        frame: &Frame,
    ) -> Result<Vec<Instr>, TempletError> {
        let TagArgs::Import(args) = &tag.args else {
            return Err(mismatched_args(self.name(), tag));
        };
        let (source, fragments) = collect_fragments(compiler, &args.path, frame)?;
        let table = SymbolTable::from_fragments(&source, &fragments);

        let mut members = Vec::new();
        let mut literal = Vec::new();
        for fragment in fragments {
            match fragment {
                Fragment::Import(instrs) => members.extend(instrs),
                Fragment::Html(instrs) => literal.extend(instrs),
                Fragment::Macro { mut instrs, .. } => {
                    table.qualify_into_namespace(&mut instrs, &args.alias);
                    members.extend(instrs);
                }
            }
        }

        tracing::debug!(
            file = %source,
            alias = %args.alias,
            macros = table.names().len(),
            "imported namespace"
        );
        Ok(vec![Instr::BindNamespace {
            alias: args.alias.clone(),
            members,
            literal: Arc::new(literal),
        }])
    }
}

// ============================================================================
// SHARED WITH `from`
// ============================================================================

/// Arguments common to `import` and `from`: one path string and the bare
/// words around it, keywords removed.
pub(crate) struct ImportHeader {
    pub path: String,
    pub words: Vec<Token>,
    pub with_context: bool,
}

pub(crate) fn parse_header(
    tokens: &[Token],
    cx: &ParseContext<'_>,
    tag: &str,
) -> Result<ImportHeader, TempletError> {
    let mut path: Option<String> = None;
    let mut words = Vec::new();
    let mut with_context = false;

    for token in tokens {
        match token.kind {
            TokenKind::Whitespace | TokenKind::Comma => {}
            TokenKind::String if path.is_none() => path = Some(unescape(&token.text)),
            TokenKind::String => {
                return Err(err_ctx!(
                    Syntax,
                    format!("Unexpected string {} on line {}.", token.text, token.line),
                    cx.src,
                    token.span
                ));
            }
            TokenKind::Var => match token.text.as_str() {
                "as" => {}
                "with" | "context" => with_context = true,
                _ => words.push(token.clone()),
            },
            _ => {
                return Err(err_ctx!(
                    Syntax,
                    format!(
                        "Unexpected {:?} in {tag} tag on line {}.",
                        token.source_text(),
                        token.line
                    ),
                    cx.src,
                    token.span,
                    "only string literal paths are supported"
                ));
            }
        }
    }

    let Some(path) = path else {
        return Err(err_ctx!(
            Syntax,
            format!("Missing file path in {tag} tag on line {}.", cx.line),
            cx.src,
            cx.span
        ));
    };
    Ok(ImportHeader {
        path,
        words,
        with_context,
    })
}

pub(crate) fn unexpected_variable(token: &Token, cx: &ParseContext<'_>) -> TempletError {
    err_ctx!(
        Syntax,
        format!("Unexpected variable \"{}\" on line {}.", token.text, token.line),
        cx.src,
        token.span
    )
}

/// Loads `path` and compiles its top-level nodes into fragments.
///
/// Macros are compiled with a detached frame; everything else keeps the
/// caller's frame. Returns the file's resolved name with the fragments.
pub(crate) fn collect_fragments(
    compiler: &mut Compiler<'_>,
    path: &str,
    frame: &Frame,
) -> Result<(String, Vec<Fragment>), TempletError> {
    let template = compiler.load(path)?;
    let fragments = compiler.within_file(&template, |c| {
        let mut fragments = Vec::with_capacity(template.nodes.len());
        for node in &template.nodes {
            let fragment = match node {
                Node::Tag(tag) => match &tag.args {
                    TagArgs::Macro(sig) => Fragment::Macro {
                        name: sig.name.clone(),
                        instrs: c.compile_node(node, &frame.detached())?,
                    },
                    TagArgs::Import(_) | TagArgs::From(_) => {
                        Fragment::Import(c.compile_node(node, frame)?)
                    }
                    TagArgs::Call(_) => Fragment::Html(c.compile_node(node, frame)?),
                },
                Node::Text(_) | Node::Output(_) => Fragment::Html(c.compile_node(node, frame)?),
            };
            fragments.push(fragment);
        }
        Ok(fragments)
    })?;
    Ok((template.name, fragments))
}
