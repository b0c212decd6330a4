//! Template text to syntax tree: the pest document grammar, the argument
//! tokenizer and the expression parser.

pub mod expr;
pub mod lexer;
pub mod parser;

pub use expr::parse_expr;
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::parse_template;
