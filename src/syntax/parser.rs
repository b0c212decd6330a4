//! Document parser.
//!
//! pest splits the template into text, comments, outputs and tags. The flat
//! segment list is then folded into a tree: a tag whose definition `ends`
//! opens a frame that collects nodes until the matching `end<name>` tag.

use pest::{error::Error, iterators::Pair, Parser};
use pest_derive::Parser;

use crate::ast::{Node, OutputNode, TagNode, Template};
use crate::diagnostics::{to_error_source, RelatedLabel, SourceArc};
use crate::syntax::expr::parse_expr;
use crate::syntax::lexer::tokenize;
use crate::tags::{ParseContext, TagRegistry};
use crate::{err_ctx, ErrorContext, Span, TempletError};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct TemplateParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses `source` into a template tree. Tag arguments are parsed by the tag
/// definitions in `tags`; unknown tags are syntax errors.
pub fn parse_template(
    name: &str,
    source: &str,
    tags: &TagRegistry,
) -> Result<Template, TempletError> {
    let src = to_error_source(name, source);
    let pairs =
        TemplateParser::parse(Rule::template, source).map_err(|e| convert_parse_error(e, &src))?;

    let mut builder = TreeBuilder {
        name,
        src: &src,
        tags,
        root: Vec::new(),
        open: Vec::new(),
    };
    for pair in pairs.flatten() {
        match pair.as_rule() {
            Rule::text => builder.push(Node::Text(pair.as_str().to_string())),
            Rule::output => builder.output(pair)?,
            Rule::tag => builder.tag(pair)?,
            _ => {}
        }
    }
    let nodes = builder.finish()?;

    tracing::debug!(template = name, nodes = nodes.len(), "parsed template");
    Ok(Template {
        name: name.to_string(),
        source: source.to_string(),
        nodes,
    })
}

// ============================================================================
// TREE BUILDING
// ============================================================================

/// A tag waiting for its end tag.
struct OpenTag {
    node: TagNode,
}

struct TreeBuilder<'a> {
    name: &'a str,
    src: &'a SourceArc,
    tags: &'a TagRegistry,
    root: Vec<Node>,
    open: Vec<OpenTag>,
}

impl<'a> TreeBuilder<'a> {
    fn push(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(open) => open.node.content.push(node),
            None => self.root.push(node),
        }
    }

    fn output(&mut self, pair: Pair<'_, Rule>) -> Result<(), TempletError> {
        let span = get_span(&pair);
        let line = pair.as_span().start_pos().line_col().0;
        let Some(body) = pair.into_inner().next() else {
            return Err(self.error(format!("Empty output on line {line}."), span));
        };
        let text = body.as_str();
        if text.trim().is_empty() {
            return Err(self.error(format!("Empty output on line {line}."), span));
        }
        let tokens = tokenize(text, body.as_span().start(), line, self.src)?;
        let expr = parse_expr(&tokens, self.src)?;
        self.push(Node::Output(OutputNode {
            expr,
            source: text.trim().to_string(),
            line,
            span,
        }));
        Ok(())
    }

    fn tag(&mut self, pair: Pair<'_, Rule>) -> Result<(), TempletError> {
        let span = get_span(&pair);
        let line = pair.as_span().start_pos().line_col().0;
        let Some(body) = pair.into_inner().next() else {
            return Err(self.error(format!("Empty tag on line {line}."), span));
        };
        let raw = body.as_str();
        let lead = raw.len() - raw.trim_start().len();
        let trimmed = &raw[lead..];
        let name_len = trimmed
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(trimmed.len());
        let name = &trimmed[..name_len];
        if name.is_empty() {
            return Err(self.error(format!("Empty tag on line {line}."), span));
        }

        if let Some(closed) = name.strip_prefix("end") {
            if !self.tags.contains(name) && self.tags.contains(closed) {
                return self.close(closed, &trimmed[name_len..], line, span);
            }
        }

        let Some(definition) = self.tags.get(name) else {
            return Err(err_ctx!(
                Syntax,
                format!("Unexpected tag \"{name}\" on line {line}."),
                self.src,
                span,
                format!("available tags: {}", self.available())
            ));
        };

        let args_start = body.as_span().start() + lead + name_len;
        let args_line = line + raw[..lead + name_len].matches('\n').count();
        let tokens = tokenize(&trimmed[name_len..], args_start, args_line, self.src)?;
        let cx = ParseContext {
            src: self.src,
            file: self.name,
            line,
            span,
        };
        let args = definition.parse(&tokens, &cx)?;
        let node = TagNode {
            name: name.to_string(),
            args,
            content: Vec::new(),
            line,
            span,
        };

        if definition.ends() {
            self.open.push(OpenTag { node });
        } else {
            self.push(Node::Tag(node));
        }
        Ok(())
    }

    fn close(&mut self, name: &str, rest: &str, line: usize, span: Span) -> Result<(), TempletError> {
        if !rest.trim().is_empty() {
            return Err(self.error(
                format!("Unexpected arguments to \"end{name}\" on line {line}."),
                span,
            ));
        }
        let Some(open) = self.open.pop() else {
            return Err(self.error(
                format!("Unexpected end of tag \"{name}\" on line {line}."),
                span,
            ));
        };
        if open.node.name != name {
            let message = format!(
                "Expected end tag \"end{}\" on line {line}, found \"end{name}\".",
                open.node.name
            );
            return Err(TempletError::Syntax {
                message,
                ctx: ErrorContext {
                    source: Some(self.src.clone()),
                    span: Some(span),
                    help: None,
                    related: vec![RelatedLabel {
                        source: self.src.clone(),
                        span: open.node.span,
                        label: format!("\"{}\" opened here", open.node.name),
                    }],
                },
                source: None,
            });
        }
        let mut node = open.node;
        node.span = node.span.join(span);
        self.push(Node::Tag(node));
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Node>, TempletError> {
        if let Some(open) = self.open.pop() {
            return Err(err_ctx!(
                Syntax,
                format!(
                    "Missing end tag \"end{}\" for tag opened on line {}.",
                    open.node.name, open.node.line
                ),
                self.src,
                open.node.span
            ));
        }
        Ok(self.root)
    }

    fn available(&self) -> String {
        self.tags
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn error(&self, message: String, span: Span) -> TempletError {
        err_ctx!(Syntax, message, self.src, span)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn get_span(pair: &Pair<Rule>) -> Span {
    Span {
        start: pair.as_span().start(),
        end: pair.as_span().end(),
    }
}

fn convert_parse_error(error: Error<Rule>, src: &SourceArc) -> TempletError {
    let span = match error.location {
        pest::error::InputLocation::Pos(pos) => Span::new(pos, pos),
        pest::error::InputLocation::Span((start, end)) => Span::new(start, end),
    };
    let line = match error.line_col {
        pest::error::LineColLocation::Pos((line, _)) => line,
        pest::error::LineColLocation::Span((line, _), _) => line,
    };
    err_ctx!(
        Syntax,
        format!("Unclosed delimiter on line {line}."),
        src,
        span,
        "every `{{`, `{%` and `{#` needs a matching `}}`, `%}` or `#}`"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TagArgs;

    fn parse(source: &str) -> Result<Template, TempletError> {
        parse_template("t.html", source, &TagRegistry::standard())
    }

    #[test]
    fn text_outputs_and_comments() {
        let t = parse("a {# note #}{{ name }} b").unwrap();
        assert_eq!(t.nodes.len(), 3);
        assert_eq!(t.nodes[0], Node::Text("a ".into()));
        assert!(matches!(&t.nodes[1], Node::Output(o) if o.source == "name"));
        assert_eq!(t.nodes[2], Node::Text(" b".into()));
    }

    #[test]
    fn block_tags_collect_content() {
        let t = parse("{% macro m(a) %}<b>{{ a }}</b>{% endmacro %}after").unwrap();
        let Node::Tag(tag) = &t.nodes[0] else {
            panic!("expected tag");
        };
        assert_eq!(tag.name, "macro");
        assert!(matches!(&tag.args, TagArgs::Macro(sig) if sig.name == "m"));
        assert_eq!(tag.content.len(), 3);
        assert_eq!(t.nodes[1], Node::Text("after".into()));
    }

    #[test]
    fn inline_tags_have_no_content() {
        let t = parse(r#"{% import "w.html" as w %}x"#).unwrap();
        assert_eq!(t.nodes[0].tag_name(), Some("import"));
        assert_eq!(t.nodes.len(), 2);
    }

    #[test]
    fn lines_are_tracked_across_text() {
        let t = parse("\n\n{% macro m() %}{% endmacro %}").unwrap();
        let Node::Tag(tag) = &t.nodes[1] else {
            panic!("expected tag");
        };
        assert_eq!(tag.line, 3);
    }

    #[test]
    fn unknown_and_unbalanced_tags_fail() {
        assert!(parse("{% bogus %}").unwrap_err().message().contains("bogus"));
        assert!(parse("{% macro m() %}").is_err());
        assert!(parse("{% endmacro %}").is_err());
        assert!(parse("{% macro m() %}{% call m() %}{% endmacro %}").is_err());
        assert!(parse("{{ open").is_err());
    }
}
