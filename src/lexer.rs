//! Lexer for the filter expression language.
//!
//! The grammar is mode-sensitive: a value may contain almost any character
//! (only `&`, `|`, `(`, `)` and `,` are structural), so the lexer switches
//! into value mode right after `=`/`!=` and back out once the value list
//! ends. Outside value mode only the name character class `[A-Za-z0-9_.]`
//! and the structural set are legal.
//!
//! Canonical dumps are re-parseable: the keywords `AND`/`OR` are accepted as
//! connector synonyms for `&`/`|`, and a double quote opens a quoted section
//! inside a value that protects structural characters.

use crate::token::{Span, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    /// Names, operators, connectors, parentheses.
    Normal,
    /// A value item is expected (just consumed `=`, `!=` or a comma).
    Value,
    /// A value item was just produced; a comma continues the list.
    AfterValue,
}

pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte index into the input.
    position: usize,
    mode: Mode,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            position: 0,
            mode: Mode::Normal,
        }
    }

    /// Returns the character at the current position without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Advances one character and returns it.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Reads one raw value item. Stops at structural characters and at the
    /// canonical-dump connector sequences ` AND ` / ` OR `. Double-quoted
    /// sections are consumed verbatim, structural characters included.
    fn read_value(&mut self) -> Token<'a> {
        let start = self.position;
        while let Some(c) = self.peek() {
            if c == '"' {
                self.bump();
                while let Some(inner) = self.bump() {
                    if inner == '"' {
                        break;
                    }
                }
                continue;
            }
            if matches!(c, '&' | '|' | '(' | ')' | ',') {
                break;
            }
            if self.rest().starts_with(" AND ") || self.rest().starts_with(" OR ") {
                break;
            }
            self.bump();
        }
        Token {
            kind: TokenKind::Value(&self.input[start..self.position]),
            span: Span::new(start, self.position),
        }
    }

    /// Reads a name or a connector keyword.
    /// The starting character has already been consumed by the caller.
    fn read_name(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.bump();
            } else {
                break;
            }
        }
        let literal = &self.input[start..self.position];
        let kind = match literal {
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            _ => TokenKind::Name(literal),
        };
        Token {
            kind,
            span: Span::new(start, self.position),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.mode {
            Mode::Value => {
                let token = self.read_value();
                self.mode = Mode::AfterValue;
                return Some(token);
            }
            Mode::AfterValue => {
                if self.peek() == Some(',') {
                    let start = self.position;
                    self.bump();
                    self.mode = Mode::Value;
                    return Some(Token {
                        kind: TokenKind::Comma,
                        span: Span::new(start, self.position),
                    });
                }
                self.mode = Mode::Normal;
            }
            Mode::Normal => {}
        }

        self.skip_whitespace();
        let start = self.position;
        let c = self.bump()?;

        let kind = match c {
            '&' => TokenKind::And,
            '|' => TokenKind::Or,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '=' => {
                self.mode = Mode::Value;
                TokenKind::Eq
            }
            '!' => match self.peek() {
                Some('=') => {
                    self.bump();
                    self.mode = Mode::Value;
                    TokenKind::NotEq
                }
                Some('!') => {
                    self.bump();
                    TokenKind::Absent
                }
                _ => TokenKind::Present,
            },
            c if is_name_char(c) => return Some(self.read_name(start)),
            _ => TokenKind::Illegal,
        };
        Some(Token {
            kind,
            span: Span::new(start, self.position),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        Lexer::new(input).map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_condition() {
        assert_eq!(
            kinds("status=open"),
            vec![
                TokenKind::Name("status"),
                TokenKind::Eq,
                TokenKind::Value("open"),
            ]
        );
    }

    #[test]
    fn test_connectors_and_groups() {
        assert_eq!(
            kinds("(a=1|b=2)&c=3"),
            vec![
                TokenKind::LParen,
                TokenKind::Name("a"),
                TokenKind::Eq,
                TokenKind::Value("1"),
                TokenKind::Or,
                TokenKind::Name("b"),
                TokenKind::Eq,
                TokenKind::Value("2"),
                TokenKind::RParen,
                TokenKind::And,
                TokenKind::Name("c"),
                TokenKind::Eq,
                TokenKind::Value("3"),
            ]
        );
    }

    #[test]
    fn test_no_value_operators() {
        assert_eq!(
            kinds("one!&two!!"),
            vec![
                TokenKind::Name("one"),
                TokenKind::Present,
                TokenKind::And,
                TokenKind::Name("two"),
                TokenKind::Absent,
            ]
        );
    }

    #[test]
    fn test_not_equal_operator() {
        assert_eq!(
            kinds("a!=x"),
            vec![TokenKind::Name("a"), TokenKind::NotEq, TokenKind::Value("x")]
        );
    }

    #[test]
    fn test_empty_value_before_delimiter_and_eof() {
        assert_eq!(
            kinds("one=&two="),
            vec![
                TokenKind::Name("one"),
                TokenKind::Eq,
                TokenKind::Value(""),
                TokenKind::And,
                TokenKind::Name("two"),
                TokenKind::Eq,
                TokenKind::Value(""),
            ]
        );
    }

    #[test]
    fn test_comma_separated_values() {
        assert_eq!(
            kinds("multi=1,2,valuehere"),
            vec![
                TokenKind::Name("multi"),
                TokenKind::Eq,
                TokenKind::Value("1"),
                TokenKind::Comma,
                TokenKind::Value("2"),
                TokenKind::Comma,
                TokenKind::Value("valuehere"),
            ]
        );
    }

    #[test]
    fn test_value_keeps_odd_characters() {
        // '*', '=', spaces and unicode are all ordinary value characters.
        assert_eq!(
            kinds("q=a*b=c d"),
            vec![
                TokenKind::Name("q"),
                TokenKind::Eq,
                TokenKind::Value("a*b=c d"),
            ]
        );
    }

    #[test]
    fn test_value_stops_at_keyword_connector() {
        assert_eq!(
            kinds("a=1 OR b=2"),
            vec![
                TokenKind::Name("a"),
                TokenKind::Eq,
                TokenKind::Value("1"),
                TokenKind::Or,
                TokenKind::Name("b"),
                TokenKind::Eq,
                TokenKind::Value("2"),
            ]
        );
    }

    #[test]
    fn test_quoted_section_protects_structural_characters() {
        assert_eq!(
            kinds(r#"a="x,y|z""#),
            vec![
                TokenKind::Name("a"),
                TokenKind::Eq,
                TokenKind::Value(r#""x,y|z""#),
            ]
        );
    }

    #[test]
    fn test_dotted_names() {
        assert_eq!(
            kinds("rel1.rel2.b1=2"),
            vec![
                TokenKind::Name("rel1.rel2.b1"),
                TokenKind::Eq,
                TokenKind::Value("2"),
            ]
        );
    }

    #[test]
    fn test_illegal_character() {
        assert_eq!(kinds("#"), vec![TokenKind::Illegal]);
    }

    #[test]
    fn test_blank_input_produces_no_tokens() {
        assert_eq!(kinds(""), vec![]);
        assert_eq!(kinds("   "), vec![]);
    }
}
