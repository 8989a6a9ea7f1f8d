//! Recursive-descent parser for the filter expression language.
//!
//! Produces an untyped [`ParseNode`] tree of AND/OR/condition nodes; the
//! typed AST is built separately by [`ConditionGroup::load`] so conversion
//! stays independently testable from parsing.
//!
//! Precedence, from loose to tight: `|` (OR), `&` (AND), parentheses.
//!
//! [`ConditionGroup::load`]: crate::ast::ConditionGroup::load

use std::fmt;

use crate::ast::{FilterOp, FilterValue, GroupOp};
use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};

/// Untyped parse tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseNode {
    Group {
        op: GroupOp,
        children: Vec<ParseNode>,
    },
    Condition {
        name: String,
        op: FilterOp,
        value: Option<FilterValue>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    fn new(message: String) -> Self {
        Self {
            message,
            span: None,
        }
    }

    fn at_position(message: String, span: Span) -> Self {
        Self {
            message,
            span: Some(span),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} (at bytes {}-{})", self.message, span.start, span.end),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses a raw filter string. A blank string is the valid "no filter" case
/// and yields `Ok(None)`.
pub fn parse(input: &str) -> Result<Option<ParseNode>, ParseError> {
    let tokens: Vec<Token> = Lexer::new(input).collect();
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut parser = Parser::new(&tokens);
    let node = parser.parse_or_expression()?;
    if let Some(token) = parser.peek() {
        return Err(ParseError::at_position(
            format!("unexpected {:?} after end of expression", token.kind),
            token.span,
        ));
    }
    Ok(Some(node))
}

struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&Token<'a>> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn match_token(&self, kind: &TokenKind) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(&t.kind) == std::mem::discriminant(kind))
    }

    /// `or_expr := and_expr ('|' and_expr)*`
    fn parse_or_expression(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![self.parse_and_expression()?];
        while self.match_token(&TokenKind::Or) {
            self.advance();
            children.push(self.parse_and_expression()?);
        }
        if children.len() == 1 {
            Ok(children.swap_remove(0))
        } else {
            Ok(ParseNode::Group {
                op: GroupOp::Or,
                children,
            })
        }
    }

    /// `and_expr := term ('&' term)*`
    fn parse_and_expression(&mut self) -> Result<ParseNode, ParseError> {
        let mut children = vec![self.parse_term()?];
        while self.match_token(&TokenKind::And) {
            self.advance();
            children.push(self.parse_term()?);
        }
        if children.len() == 1 {
            Ok(children.swap_remove(0))
        } else {
            Ok(ParseNode::Group {
                op: GroupOp::And,
                children,
            })
        }
    }

    /// `term := '(' or_expr ')' | condition`
    fn parse_term(&mut self) -> Result<ParseNode, ParseError> {
        if self.match_token(&TokenKind::LParen) {
            self.advance();
            let node = self.parse_or_expression()?;
            if !self.match_token(&TokenKind::RParen) {
                return Err(match self.peek() {
                    Some(token) => ParseError::at_position(
                        format!("expected ')', found {:?}", token.kind),
                        token.span,
                    ),
                    None => ParseError::new("unbalanced '(': reached end of input".to_string()),
                });
            }
            self.advance();
            return Ok(node);
        }
        self.parse_condition()
    }

    /// `condition := name operator value?`
    fn parse_condition(&mut self) -> Result<ParseNode, ParseError> {
        let name = match self.advance() {
            Some(token) => match &token.kind {
                TokenKind::Name(name) => (*name).to_string(),
                kind => {
                    return Err(ParseError::at_position(
                        format!("expected filter name, found {kind:?}"),
                        token.span,
                    ))
                }
            },
            None => return Err(ParseError::new("expected filter name".to_string())),
        };

        let op = match self.advance() {
            Some(token) => match &token.kind {
                TokenKind::Eq => FilterOp::Eq,
                TokenKind::NotEq => FilterOp::NotEq,
                TokenKind::Present => FilterOp::Present,
                TokenKind::Absent => FilterOp::Absent,
                kind => {
                    return Err(ParseError::at_position(
                        format!("expected operator after '{name}', found {kind:?}"),
                        token.span,
                    ))
                }
            },
            None => {
                return Err(ParseError::new(format!(
                    "expected operator after '{name}'"
                )))
            }
        };

        if !op.takes_value() {
            return Ok(ParseNode::Condition {
                name,
                op,
                value: None,
            });
        }

        let mut items = vec![self.expect_value()?];
        while self.match_token(&TokenKind::Comma) {
            self.advance();
            items.push(self.expect_value()?);
        }

        // A dumped list reads back as `[v1,v2,...]`; strip the brackets so
        // the canonical form is a fixed point. Items that legitimately
        // contain brackets are quote-protected by the dump, so the strip
        // never fires on them.
        if is_dumped_list(&items) {
            if let Some(first) = items.first_mut() {
                first.remove(0);
            }
            if let Some(last) = items.last_mut() {
                last.pop();
            }
        }
        let mut items: Vec<String> = items.iter().map(|item| strip_quotes(item)).collect();

        let value = if items.len() == 1 {
            FilterValue::Scalar(items.swap_remove(0))
        } else {
            FilterValue::List(items)
        };
        Ok(ParseNode::Condition {
            name,
            op,
            value: Some(value),
        })
    }

    fn expect_value(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Some(token) => match &token.kind {
                TokenKind::Value(raw) => Ok(raw.trim().to_string()),
                kind => Err(ParseError::at_position(
                    format!("expected value, found {kind:?}"),
                    token.span,
                )),
            },
            None => Err(ParseError::new("expected value".to_string())),
        }
    }
}

/// Whether a multi-item value is a dumped list `[v1,v2,...]` reading back.
/// The outer bracket pair is stripped only when the first and last items
/// carry it the way the dump emits it: directly around a quoted item or an
/// item with no brackets of its own. `a=[x],[y]` keeps its items intact.
fn is_dumped_list(items: &[String]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let first = items.first().and_then(|item| item.strip_prefix('['));
    let last = items.last().and_then(|item| item.strip_suffix(']'));
    match (first, last) {
        (Some(first), Some(last)) => item_is_canonical(first) && item_is_canonical(last),
        _ => false,
    }
}

fn item_is_canonical(item: &str) -> bool {
    is_quoted(item) || !item.contains(['[', ']'])
}

fn is_quoted(item: &str) -> bool {
    item.len() >= 2 && item.starts_with('"') && item.ends_with('"')
}

/// Strips one layer of protective quotes, added by the canonical dump
/// whenever the bare item text would not survive a re-parse.
fn strip_quotes(item: &str) -> String {
    if is_quoted(item) {
        item[1..item.len() - 1].to_string()
    } else {
        item.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(name: &str, op: FilterOp, value: Option<FilterValue>) -> ParseNode {
        ParseNode::Condition {
            name: name.to_string(),
            op,
            value,
        }
    }

    fn scalar(v: &str) -> Option<FilterValue> {
        Some(FilterValue::Scalar(v.to_string()))
    }

    #[test]
    fn test_blank_input_is_no_filter() {
        assert_eq!(parse("").expect("blank is valid"), None);
        assert_eq!(parse("   ").expect("blank is valid"), None);
    }

    #[test]
    fn test_single_condition() {
        assert_eq!(
            parse("status=open").expect("valid"),
            Some(condition("status", FilterOp::Eq, scalar("open")))
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        assert_eq!(
            parse("a=1|b=2&c=3").expect("valid"),
            Some(ParseNode::Group {
                op: GroupOp::Or,
                children: vec![
                    condition("a", FilterOp::Eq, scalar("1")),
                    ParseNode::Group {
                        op: GroupOp::And,
                        children: vec![
                            condition("b", FilterOp::Eq, scalar("2")),
                            condition("c", FilterOp::Eq, scalar("3")),
                        ],
                    },
                ],
            })
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        assert_eq!(
            parse("(a=1|b=2)&c=3").expect("valid"),
            Some(ParseNode::Group {
                op: GroupOp::And,
                children: vec![
                    ParseNode::Group {
                        op: GroupOp::Or,
                        children: vec![
                            condition("a", FilterOp::Eq, scalar("1")),
                            condition("b", FilterOp::Eq, scalar("2")),
                        ],
                    },
                    condition("c", FilterOp::Eq, scalar("3")),
                ],
            })
        );
    }

    #[test]
    fn test_empty_value_is_valid_and_distinct() {
        assert_eq!(
            parse("one=").expect("valid"),
            Some(condition("one", FilterOp::Eq, scalar("")))
        );
    }

    #[test]
    fn test_csv_collapses_single_item_to_scalar() {
        assert_eq!(
            parse("multi=1,2,valuehere").expect("valid"),
            Some(condition(
                "multi",
                FilterOp::Eq,
                Some(FilterValue::List(vec![
                    "1".to_string(),
                    "2".to_string(),
                    "valuehere".to_string(),
                ]))
            ))
        );
        assert_eq!(
            parse("multi=1").expect("valid"),
            Some(condition("multi", FilterOp::Eq, scalar("1")))
        );
    }

    #[test]
    fn test_no_value_operators() {
        assert_eq!(
            parse("one!").expect("valid"),
            Some(condition("one", FilterOp::Present, None))
        );
        assert_eq!(
            parse("one!!").expect("valid"),
            Some(condition("one", FilterOp::Absent, None))
        );
    }

    #[test]
    fn test_value_after_presence_operator_is_rejected() {
        assert!(parse("one!val").is_err());
        assert!(parse("one!!val").is_err());
        assert!(parse("(one!val)").is_err());
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(parse("(a=1").is_err());
        assert!(parse("a=1)").is_err());
    }

    #[test]
    fn test_missing_operator() {
        assert!(parse("justaname").is_err());
        assert!(parse("a=1&justaname").is_err());
    }

    #[test]
    fn test_illegal_character_is_a_syntax_error() {
        assert!(parse("a#=1").is_err());
    }

    #[test]
    fn test_dangling_connector() {
        assert!(parse("a=1&").is_err());
        assert!(parse("|a=1").is_err());
    }

    #[test]
    fn test_quoted_items_are_unquoted() {
        assert_eq!(
            parse(r#"a="x,y""#).expect("valid"),
            Some(condition("a", FilterOp::Eq, scalar("x,y")))
        );
    }

    #[test]
    fn test_bracketed_list_reads_back() {
        assert_eq!(
            parse("multi=[1,2,valuehere]").expect("valid"),
            parse("multi=1,2,valuehere").expect("valid")
        );
    }

    #[test]
    fn test_bracketed_raw_items_survive() {
        // Brackets are ordinary value characters; the dumped-list strip must
        // not fire on items that carry their own brackets.
        assert_eq!(
            parse("a=[x],[y]").expect("valid"),
            Some(condition(
                "a",
                FilterOp::Eq,
                Some(FilterValue::List(vec!["[x]".to_string(), "[y]".to_string()]))
            ))
        );
        assert_eq!(
            parse("a=[only]").expect("valid"),
            Some(condition("a", FilterOp::Eq, scalar("[only]")))
        );
        // The canonical form of such a list quotes the items; it reads back
        // to the same value.
        assert_eq!(
            parse(r#"a=["[x]","[y]"]"#).expect("valid"),
            parse("a=[x],[y]").expect("valid")
        );
    }

    #[test]
    fn test_connector_suffix_value() {
        // `x AND` is a legal value; the connector window needs a trailing
        // space to count.
        assert_eq!(
            parse("a=x AND&b=2").expect("valid"),
            Some(ParseNode::Group {
                op: GroupOp::And,
                children: vec![
                    condition("a", FilterOp::Eq, scalar("x AND")),
                    condition("b", FilterOp::Eq, scalar("2")),
                ],
            })
        );
    }
}
