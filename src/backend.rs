//! Backend capability interface.
//!
//! The compiler core never branches on the backend type; it talks to this
//! minimal surface and each query builder supplies a thin adapter.

use crate::ast::GroupOp;
use crate::schema::JoinKind;

/// A fully qualified column reference: table (or alias) plus column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnRef<'a> {
    pub table: &'a str,
    pub column: &'a str,
}

/// One join the compiler decided to emit, in backend-neutral form.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    /// Physical table being joined.
    pub table: String,
    /// Compiler-assigned alias, unique within the compilation.
    pub alias: String,
    pub kind: JoinKind,
    /// Table name or alias of the traversal parent.
    pub parent_table: String,
    /// Join key on the parent side.
    pub local_key: String,
    /// Join key on the aliased side.
    pub foreign_key: String,
}

/// Backend-neutral leaf predicate. Fuzzy markers have already been
/// translated into SQL wildcard patterns by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Eq(String),
    NotEq(String),
    In(Vec<String>),
    NotIn(Vec<String>),
    Like(String),
    NotLike(String),
    IsNotNull,
    IsNull,
}

/// The mutation surface of one relational query builder.
///
/// `comparison` and `combine` build predicates without touching the query;
/// `add_join`, `add_where` and `select` mutate it. The compiler finishes
/// all validation before calling any mutating method, which is what keeps
/// failed compilations from leaving a half-built query behind.
pub trait QueryAdapter {
    type Predicate;

    /// Table (or alias) name that unqualified root columns resolve against.
    fn root_table(&self) -> &str;

    fn comparison(&self, column: ColumnRef<'_>, comparison: &Comparison) -> Self::Predicate;

    /// Combines already-built predicates with the backend's native AND/OR.
    fn combine(&self, op: GroupOp, children: Vec<Self::Predicate>) -> Self::Predicate;

    fn add_join(&mut self, join: &JoinSpec);

    fn add_where(&mut self, predicate: Self::Predicate);

    fn select(&mut self, columns: &[&str]);
}
