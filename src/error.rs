//! Error taxonomy for filter parsing and compilation.
//!
//! All variants are raised synchronously and are never retried; the input
//! is deterministic, so retrying reproduces the identical error. Callers
//! surface them as request-level validation failures. Compilation never
//! partially applies: the query object is left untouched whenever any of
//! these errors occurs.

use thiserror::Error;

use crate::ast::FilterOp;
use crate::parser::ParseError;
use crate::token::Span;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// Malformed filter string; nothing downstream executes.
    #[error("syntax error: {message}")]
    Syntax { message: String, span: Option<Span> },

    /// A logical name has no entry in the resource's mapping table.
    #[error("unknown filter '{0}'")]
    UnknownFilter(String),

    /// An operator outside the filter's declared allow-list.
    #[error("operator '{operator}' is not allowed for filter '{filter}'")]
    UnsupportedOperator { filter: String, operator: FilterOp },

    /// A dotted path segment does not correspond to a declared association
    /// reachable from the current traversal point.
    #[error("unknown relation '{segment}' in filter path '{path}'")]
    UnknownRelation { segment: String, path: String },

    /// A model named by the caller or by an association is missing from the
    /// schema registry.
    #[error("model '{0}' is not declared in the schema registry")]
    UnknownModel(String),
}

impl From<ParseError> for FilterError {
    fn from(error: ParseError) -> Self {
        FilterError::Syntax {
            message: error.message,
            span: error.span,
        }
    }
}
