//! Tokenizer for tag arguments and output expressions.
//!
//! Rules are tried in order against the remaining input; the first match wins.
//! Function-call openers (`name(`) are recognized as a single token so the
//! signature parser can tell a macro name apart from a plain variable.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::SourceArc;
use crate::{err_ctx, Span, TempletError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Whitespace,
    String,
    Bool,
    None,
    Number,
    /// `name()` with nothing between the parentheses
    FunctionEmpty,
    /// `name(`
    Function,
    Var,
    Operator,
    Assignment,
    ParenOpen,
    ParenClose,
    BracketOpen,
    BracketClose,
    CurlyOpen,
    CurlyClose,
    Comma,
    Colon,
}

impl TokenKind {
    pub fn is_open(self) -> bool {
        matches!(
            self,
            TokenKind::ParenOpen | TokenKind::BracketOpen | TokenKind::CurlyOpen
        )
    }

    pub fn is_close(self) -> bool {
        matches!(
            self,
            TokenKind::ParenClose | TokenKind::BracketClose | TokenKind::CurlyClose
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Matched text. For `Function`/`FunctionEmpty` this is the callee name only.
    pub text: String,
    pub span: Span,
    pub line: usize,
}

impl Token {
    /// Source-faithful text of the token, parentheses included.
    pub fn source_text(&self) -> String {
        match self.kind {
            TokenKind::Function => format!("{}(", self.text),
            TokenKind::FunctionEmpty => format!("{}()", self.text),
            _ => self.text.clone(),
        }
    }
}

struct LexRule {
    kind: TokenKind,
    regex: Regex,
    /// Capture group holding the token text (0 = whole match).
    group: usize,
}

fn rule(kind: TokenKind, pattern: &str, group: usize) -> LexRule {
    LexRule {
        kind,
        regex: Regex::new(pattern).expect("lexer rule is a valid regex"),
        group,
    }
}

const IDENT_PATH: &str = r"[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*";

static RULES: Lazy<Vec<LexRule>> = Lazy::new(|| {
    vec![
        rule(TokenKind::Whitespace, r"^\s+", 0),
        rule(TokenKind::String, r#"^(?:"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*')"#, 0),
        rule(TokenKind::Bool, r"^(?:true|false)\b", 0),
        rule(TokenKind::None, r"^(?:none|null)\b", 0),
        rule(TokenKind::Number, r"^[+\-]?\d+(?:\.\d+)?", 0),
        rule(TokenKind::FunctionEmpty, &format!(r"^({IDENT_PATH})\s*\(\s*\)"), 1),
        rule(TokenKind::Function, &format!(r"^({IDENT_PATH})\s*\("), 1),
        rule(TokenKind::Var, &format!("^{IDENT_PATH}"), 0),
        rule(TokenKind::Operator, r"^(?:==|!=|<=|>=|&&|\|\||[+\-*/%<>!~?])", 0),
        rule(TokenKind::Assignment, r"^=", 0),
        rule(TokenKind::ParenOpen, r"^\(", 0),
        rule(TokenKind::ParenClose, r"^\)", 0),
        rule(TokenKind::BracketOpen, r"^\[", 0),
        rule(TokenKind::BracketClose, r"^\]", 0),
        rule(TokenKind::CurlyOpen, r"^\{", 0),
        rule(TokenKind::CurlyClose, r"^\}", 0),
        rule(TokenKind::Comma, r"^,", 0),
        rule(TokenKind::Colon, r"^:", 0),
    ]
});

/// Tokenizes `input`, which starts at byte `base` of `src` on line `line`.
///
/// Spans are absolute offsets into `src`; line numbers advance over newlines
/// inside the input.
pub fn tokenize(
    input: &str,
    base: usize,
    line: usize,
    src: &SourceArc,
) -> Result<Vec<Token>, TempletError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = line;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some((rule, whole, text)) = RULES.iter().find_map(|rule| {
            let caps = rule.regex.captures(rest)?;
            let whole = caps.get(0)?.as_str();
            let text = caps.get(rule.group)?.as_str();
            Some((rule, whole, text))
        }) else {
            let ch = rest.chars().next().unwrap_or_default();
            let span = Span::new(base + pos, base + pos + ch.len_utf8());
            let message = if ch == '"' || ch == '\'' {
                format!("Unterminated string on line {line}.")
            } else {
                format!("Unexpected character {ch:?} on line {line}.")
            };
            return Err(err_ctx!(Syntax, message, src, span));
        };

        tokens.push(Token {
            kind: rule.kind,
            text: text.to_string(),
            span: Span::new(base + pos, base + pos + whole.len()),
            line,
        });
        line += whole.matches('\n').count();
        pos += whole.len();
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::to_error_source;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let src = to_error_source("t", input);
        tokenize(input, 0, 1, &src)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn signature_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"greet(name, greeting="Hello")"#),
            vec![Function, Var, Comma, Var, Assignment, String, ParenClose]
        );
    }

    #[test]
    fn numbers_take_an_optional_sign() {
        use TokenKind::*;
        assert_eq!(kinds("-1 +2.5 - 3"), vec![Number, Number, Operator, Number]);
    }

    #[test]
    fn empty_call_is_one_token() {
        let src = to_error_source("t", "now()");
        let tokens = tokenize("now()", 0, 1, &src).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::FunctionEmpty);
        assert_eq!(tokens[0].text, "now");
        assert_eq!(tokens[0].source_text(), "now()");
    }

    #[test]
    fn keywords_need_word_boundary() {
        use TokenKind::*;
        assert_eq!(kinds("true trueish none nonesuch"), vec![Bool, Var, None, Var]);
    }

    #[test]
    fn dotted_function_name() {
        let src = to_error_source("t", "widgets.button(\"Go\")");
        let tokens = tokenize("widgets.button(\"Go\")", 0, 1, &src).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Function);
        assert_eq!(tokens[0].text, "widgets.button");
    }

    #[test]
    fn spans_are_absolute_and_lines_advance() {
        let src = to_error_source("t", "xxxx a\n b");
        let tokens = tokenize("a\n b", 5, 3, &src).unwrap();
        assert_eq!(tokens[0].span, Span::new(5, 6));
        let b = tokens.last().unwrap();
        assert_eq!(b.text, "b");
        assert_eq!(b.line, 4);
    }

    #[test]
    fn unterminated_string_is_syntax_error() {
        let src = to_error_source("t", "\"abc");
        let err = tokenize("\"abc", 0, 7, &src).unwrap_err();
        assert!(err.to_string().contains("line 7"));
    }
}
