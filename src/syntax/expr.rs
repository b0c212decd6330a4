//! Recursive-descent parser for the expression subset used in outputs,
//! `call` blocks and parameter defaults: literals, variable paths, indexing,
//! list and map literals, and calls with positional and keyword arguments.

use crate::ast::{Expr, Literal};
use crate::diagnostics::SourceArc;
use crate::syntax::lexer::{Token, TokenKind};
use crate::{err_ctx, Span, TempletError};

/// Parses the whole token slice as a single expression. Whitespace tokens
/// are ignored.
pub fn parse_expr(tokens: &[Token], src: &SourceArc) -> Result<Expr, TempletError> {
    let tokens: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Whitespace)
        .collect();
    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
        src,
    };
    let expr = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(parser.unexpected(extra));
    }
    Ok(expr)
}

struct ExprParser<'a> {
    tokens: &'a [&'a Token],
    pos: usize,
    src: &'a SourceArc,
}

impl<'a> ExprParser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn next(&mut self) -> Result<&'a Token, TempletError> {
        let token = self.peek().ok_or_else(|| self.eof())?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'a Token, TempletError> {
        let token = self.next()?;
        if token.kind != kind {
            return Err(self.unexpected(token));
        }
        Ok(token)
    }

    fn expr(&mut self) -> Result<Expr, TempletError> {
        let mut expr = self.primary()?;
        while self.peek_kind(0) == Some(TokenKind::BracketOpen) {
            self.pos += 1;
            let index = self.expr()?;
            self.expect(TokenKind::BracketClose)?;
            expr = Expr::Index(Box::new(expr), Box::new(index));
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, TempletError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::String => Ok(Expr::Literal(Literal::String(unescape(&token.text)))),
            TokenKind::Number => token
                .text
                .parse::<f64>()
                .map(|n| Expr::Literal(Literal::Number(n)))
                .map_err(|_| self.unexpected(token)),
            TokenKind::Bool => Ok(Expr::Literal(Literal::Bool(token.text == "true"))),
            TokenKind::None => Ok(Expr::Literal(Literal::None)),
            TokenKind::Var => Ok(Expr::path(&token.text)),
            TokenKind::FunctionEmpty => Ok(Expr::Call {
                callee: Box::new(Expr::path(&token.text)),
                args: vec![],
                kwargs: vec![],
            }),
            TokenKind::Function => {
                let (args, kwargs) = self.call_args()?;
                Ok(Expr::Call {
                    callee: Box::new(Expr::path(&token.text)),
                    args,
                    kwargs,
                })
            }
            TokenKind::BracketOpen => self.list(),
            TokenKind::CurlyOpen => self.map(),
            TokenKind::ParenOpen => {
                let inner = self.expr()?;
                self.expect(TokenKind::ParenClose)?;
                Ok(inner)
            }
            _ => Err(self.unexpected(token)),
        }
    }

    /// Arguments after a `name(` token, up to and including the closing paren.
    fn call_args(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), TempletError> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();
        if self.peek_kind(0) == Some(TokenKind::ParenClose) {
            self.pos += 1;
            return Ok((args, kwargs));
        }
        loop {
            let is_keyword = self.peek_kind(0) == Some(TokenKind::Var)
                && self.peek_kind(1) == Some(TokenKind::Assignment);
            if is_keyword {
                let name = self.next()?;
                if name.text.contains('.') {
                    return Err(self.unexpected(name));
                }
                self.pos += 1;
                kwargs.push((name.text.clone(), self.expr()?));
            } else {
                if let Some((name, _)) = kwargs.first() {
                    let token = self.peek().ok_or_else(|| self.eof())?;
                    return Err(err_ctx!(
                        Syntax,
                        format!(
                            "Positional argument after keyword argument `{name}` on line {}.",
                            token.line
                        ),
                        self.src,
                        token.span
                    ));
                }
                args.push(self.expr()?);
            }
            let sep = self.next()?;
            match sep.kind {
                TokenKind::Comma => continue,
                TokenKind::ParenClose => return Ok((args, kwargs)),
                _ => return Err(self.unexpected(sep)),
            }
        }
    }

    fn list(&mut self) -> Result<Expr, TempletError> {
        let mut items = Vec::new();
        while self.peek_kind(0) != Some(TokenKind::BracketClose) {
            items.push(self.expr()?);
            if self.peek_kind(0) == Some(TokenKind::Comma) {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.expect(TokenKind::BracketClose)?;
        Ok(Expr::List(items))
    }

    fn map(&mut self) -> Result<Expr, TempletError> {
        let mut entries = Vec::new();
        while self.peek_kind(0) != Some(TokenKind::CurlyClose) {
            let key = self.next()?;
            let key = match key.kind {
                TokenKind::String => unescape(&key.text),
                TokenKind::Var if !key.text.contains('.') => key.text.clone(),
                _ => return Err(self.unexpected(key)),
            };
            self.expect(TokenKind::Colon)?;
            entries.push((key, self.expr()?));
            if self.peek_kind(0) == Some(TokenKind::Comma) {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.expect(TokenKind::CurlyClose)?;
        Ok(Expr::Map(entries))
    }

    fn unexpected(&self, token: &Token) -> TempletError {
        if token.kind == TokenKind::Operator {
            return err_ctx!(
                Syntax,
                format!(
                    "Operator {:?} on line {} is not supported in expressions.",
                    token.text, token.line
                ),
                self.src,
                token.span
            );
        }
        err_ctx!(
            Syntax,
            format!(
                "Unexpected {:?} token {:?} on line {}.",
                token.kind,
                token.source_text(),
                token.line
            ),
            self.src,
            token.span
        )
    }

    fn eof(&self) -> TempletError {
        let (span, line) = self
            .tokens
            .last()
            .map(|t| (Span::new(t.span.end, t.span.end), t.line))
            .unwrap_or_default();
        err_ctx!(
            Syntax,
            format!("Unexpected end of expression on line {}.", line.max(1)),
            self.src,
            span
        )
    }
}

/// Strips the quotes from a string token and resolves backslash escapes.
pub fn unescape(quoted: &str) -> String {
    let inner = quoted
        .get(1..quoted.len().saturating_sub(1))
        .unwrap_or_default();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
