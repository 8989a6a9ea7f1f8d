//! sea-query adapter.

use sea_query::{
    Alias, Asterisk, Expr, JoinType, PostgresQueryBuilder, SelectStatement, SimpleExpr, Value,
};

use crate::ast::GroupOp;
use crate::backend::{ColumnRef, Comparison, JoinSpec, QueryAdapter};
use crate::schema::JoinKind;

/// Thin wrapper over [`SelectStatement`]. Joins and WHERE predicates are
/// applied as they arrive; the column list is resolved when the statement
/// is finalized so `select` can replace the default `*`.
#[derive(Debug, Clone)]
pub struct SeaQueryAdapter {
    select: SelectStatement,
    root_table: String,
    columns: Vec<String>,
}

impl SeaQueryAdapter {
    pub fn new(root_table: &str) -> Self {
        let mut select = SelectStatement::new();
        select.from(Alias::new(root_table));
        Self {
            select,
            root_table: root_table.to_string(),
            columns: Vec::new(),
        }
    }

    /// Wraps an existing statement so the compiled filter chains onto
    /// whatever the caller already built.
    pub fn from_statement(select: SelectStatement, root_table: &str) -> Self {
        Self {
            select,
            root_table: root_table.to_string(),
            columns: Vec::new(),
        }
    }

    pub fn into_statement(mut self) -> SelectStatement {
        if self.columns.is_empty() {
            self.select.column(Asterisk);
        } else {
            for column in &self.columns {
                self.select
                    .column((Alias::new(self.root_table.as_str()), Alias::new(column.as_str())));
            }
        }
        self.select
    }

    pub fn to_sql(&self) -> String {
        self.clone().into_statement().to_string(PostgresQueryBuilder)
    }
}

fn string_value(value: &str) -> Value {
    Value::String(Some(Box::new(value.to_string())))
}

impl QueryAdapter for SeaQueryAdapter {
    type Predicate = SimpleExpr;

    fn root_table(&self) -> &str {
        &self.root_table
    }

    fn comparison(&self, column: ColumnRef<'_>, comparison: &Comparison) -> SimpleExpr {
        let col = Expr::col((Alias::new(column.table), Alias::new(column.column)));
        match comparison {
            Comparison::Eq(value) => col.eq(string_value(value)),
            Comparison::NotEq(value) => col.ne(string_value(value)),
            Comparison::In(values) => col.is_in(values.iter().map(|v| string_value(v))),
            Comparison::NotIn(values) => col.is_not_in(values.iter().map(|v| string_value(v))),
            Comparison::Like(pattern) => col.like(pattern.as_str()),
            Comparison::NotLike(pattern) => col.not_like(pattern.as_str()),
            Comparison::IsNotNull => col.is_not_null(),
            Comparison::IsNull => col.is_null(),
        }
    }

    fn combine(&self, op: GroupOp, children: Vec<SimpleExpr>) -> SimpleExpr {
        children
            .into_iter()
            .reduce(|acc, expr| match op {
                GroupOp::And => acc.and(expr),
                GroupOp::Or => acc.or(expr),
            })
            .unwrap_or_else(|| Expr::val(true).into())
    }

    fn add_join(&mut self, join: &JoinSpec) {
        let join_type = match join.kind {
            JoinKind::Inner => JoinType::InnerJoin,
            JoinKind::Left => JoinType::LeftJoin,
        };
        self.select.join_as(
            join_type,
            Alias::new(join.table.as_str()),
            Alias::new(join.alias.as_str()),
            Expr::col((
                Alias::new(join.parent_table.as_str()),
                Alias::new(join.local_key.as_str()),
            ))
            .equals((
                Alias::new(join.alias.as_str()),
                Alias::new(join.foreign_key.as_str()),
            )),
        );
    }

    fn add_where(&mut self, predicate: SimpleExpr) {
        self.select.and_where(predicate);
    }

    fn select(&mut self, columns: &[&str]) {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
    }
}
