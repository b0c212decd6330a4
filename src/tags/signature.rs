//! Macro signature parsing.
//!
//! `name(a, b=default(1, 2), c="x")` is consumed token by token. A depth
//! counter tracks brackets opened inside default expressions so that only
//! depth-0 commas and the depth-0 closing paren end a parameter. An `=` at
//! depth 0 marks where a default expression starts; when the parameter ends,
//! everything emitted since that mark collapses into a single default value
//! attached to the parameter before it.

use crate::ast::{DefaultValue, MacroSignature, Param};
use crate::syntax::expr::parse_expr;
use crate::syntax::lexer::{Token, TokenKind};
use crate::tags::ParseContext;
use crate::{err_ctx, TempletError};

/// Parses the argument tokens of a `{% macro %}` tag.
pub fn parse_signature(
    tokens: &[Token],
    cx: &ParseContext<'_>,
) -> Result<MacroSignature, TempletError> {
    let mut parser = SignatureParser::new(cx);
    for token in tokens {
        parser.feed(token)?;
    }
    parser.finish()
}

#[derive(Debug)]
enum Piece {
    Param(Token),
    Comma(Token),
    /// Part of a default expression not yet collapsed.
    Expr(Token),
    Default(DefaultValue, Token),
}

struct SignatureParser<'a> {
    cx: &'a ParseContext<'a>,
    name: Option<String>,
    scope: usize,
    default_start: Option<usize>,
    out: Vec<Piece>,
    closed: bool,
}

impl<'a> SignatureParser<'a> {
    fn new(cx: &'a ParseContext<'a>) -> Self {
        Self {
            cx,
            name: None,
            scope: 0,
            default_start: None,
            out: Vec::new(),
            closed: false,
        }
    }

    fn feed(&mut self, token: &Token) -> Result<(), TempletError> {
        if token.kind == TokenKind::Whitespace {
            return Ok(());
        }
        if self.closed {
            return Err(self.error(
                token,
                format!(
                    "Unexpected {:?} after macro signature on line {}.",
                    token.source_text(),
                    token.line
                ),
            ));
        }
        if self.name.is_none() {
            return self.capture_name(token);
        }

        match token.kind {
            TokenKind::Function => {
                self.scope += 1;
                self.out.push(Piece::Expr(token.clone()));
            }
            TokenKind::Var if self.scope == 0 && self.default_start.is_none() => {
                if token.text.contains('.') {
                    return Err(self.error(
                        token,
                        format!(
                            "Unexpected dot in macro argument \"{}\" on line {}.",
                            token.text, token.line
                        ),
                    ));
                }
                self.out.push(Piece::Param(token.clone()));
            }
            TokenKind::Assignment if self.scope == 0 => {
                let follows_param = matches!(self.out.last(), Some(Piece::Param(_)));
                if self.default_start.is_some() || !follows_param {
                    return Err(self.error(
                        token,
                        format!("Unexpected '=' in macro signature on line {}.", token.line),
                    ));
                }
                self.default_start = Some(self.out.len());
            }
            TokenKind::Comma if self.scope == 0 => {
                self.collapse_default(token)?;
                self.out.push(Piece::Comma(token.clone()));
            }
            TokenKind::ParenClose if self.scope == 0 => {
                self.collapse_default(token)?;
                self.closed = true;
            }
            kind if kind.is_open() => {
                self.scope += 1;
                self.out.push(Piece::Expr(token.clone()));
            }
            kind if kind.is_close() => {
                if self.scope == 0 {
                    return Err(self.error(
                        token,
                        format!("Unbalanced {:?} in macro signature on line {}.", token.text, token.line),
                    ));
                }
                self.scope -= 1;
                self.out.push(Piece::Expr(token.clone()));
            }
            // Literals (bool and none included) and anything nested inside a
            // default expression are kept as written.
            _ => self.out.push(Piece::Expr(token.clone())),
        }
        Ok(())
    }

    fn capture_name(&mut self, token: &Token) -> Result<(), TempletError> {
        match token.kind {
            TokenKind::Function | TokenKind::FunctionEmpty if !token.text.contains('.') => {
                self.name = Some(token.text.clone());
                self.closed = token.kind == TokenKind::FunctionEmpty;
                Ok(())
            }
            _ => Err(self.error(
                token,
                format!(
                    "Expected a macro name followed by '(' on line {}, found {:?}.",
                    token.line,
                    token.source_text()
                ),
            )),
        }
    }

    /// Folds everything since the recorded `=` into one default value.
    fn collapse_default(&mut self, at: &Token) -> Result<(), TempletError> {
        let Some(start) = self.default_start.take() else {
            return Ok(());
        };
        let tokens: Vec<Token> = self
            .out
            .drain(start..)
            .filter_map(|piece| match piece {
                Piece::Expr(token) => Some(token),
                _ => None,
            })
            .collect();
        let Some(first) = tokens.first().cloned() else {
            return Err(self.error(
                at,
                format!("Missing default value before {:?} on line {}.", at.text, at.line),
            ));
        };
        let text: String = tokens.iter().map(Token::source_text).collect();
        let expr = parse_expr(&tokens, self.cx.src)?;
        self.out
            .push(Piece::Default(DefaultValue { text, expr }, first));
        Ok(())
    }

    fn finish(self) -> Result<MacroSignature, TempletError> {
        let Some(name) = self.name.clone() else {
            return Err(err_ctx!(
                Syntax,
                format!("Missing macro name on line {}.", self.cx.line),
                self.cx.src,
                self.cx.span
            ));
        };
        if !self.closed {
            return Err(err_ctx!(
                Syntax,
                format!(
                    "Missing ')' to close the signature of macro `{name}` on line {}.",
                    self.cx.line
                ),
                self.cx.src,
                self.cx.span
            ));
        }

        let mut params: Vec<Param> = Vec::new();
        let mut expect_param = true;
        for piece in &self.out {
            match piece {
                Piece::Param(token) if expect_param => {
                    if params.iter().any(|p| p.name == token.text) {
                        return Err(self.error(
                            token,
                            format!(
                                "Duplicate parameter \"{}\" in macro `{name}` on line {}.",
                                token.text, token.line
                            ),
                        ));
                    }
                    params.push(Param {
                        name: token.text.clone(),
                        default: None,
                    });
                    expect_param = false;
                }
                Piece::Default(value, _) if !expect_param => {
                    if let Some(param) = params.last_mut() {
                        param.default = Some(value.clone());
                    }
                }
                Piece::Comma(_) if !expect_param => expect_param = true,
                Piece::Param(token)
                | Piece::Comma(token)
                | Piece::Expr(token)
                | Piece::Default(_, token) => {
                    return Err(self.error(
                        token,
                        format!(
                            "Unexpected {:?} in signature of macro `{name}` on line {}.",
                            token.source_text(),
                            token.line
                        ),
                    ));
                }
            }
        }

        tracing::trace!(macro_name = %name, params = params.len(), "parsed macro signature");
        Ok(MacroSignature { name, params })
    }

    fn error(&self, token: &Token, message: String) -> TempletError {
        err_ctx!(Syntax, message, self.cx.src, token.span)
    }
}
