//! Token definitions for the filter expression language.

/// A token is a single unit of the language, with a specific kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    /// A filter name: `[A-Za-z0-9_.]+`, dots denoting relationship traversal.
    Name(&'a str),
    /// A raw value item. Only produced after `=`/`!=` and between commas;
    /// values admit almost any character, so the lexer scans them in a
    /// dedicated mode.
    Value(&'a str),

    // Operators
    Eq,      // =
    NotEq,   // !=
    Present, // !
    Absent,  // !!

    // Connectors and punctuation
    And, // `&`, or the keyword AND in canonical dumps
    Or,  // `|`, or the keyword OR in canonical dumps
    LParen,
    RParen,
    Comma,

    /// A character with no meaning at the current position.
    Illegal,
}

/// Represents a byte span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
