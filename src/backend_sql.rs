//! Plain-SQL string adapter, for callers without a structured builder.

use crate::ast::GroupOp;
use crate::backend::{ColumnRef, Comparison, JoinSpec, QueryAdapter};
use crate::schema::JoinKind;

/// Accumulates joins and predicates as SQL text and renders a complete
/// SELECT on demand. Identifiers are double-quoted, literals single-quoted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSqlAdapter {
    root_table: String,
    columns: Vec<String>,
    joins: Vec<String>,
    predicates: Vec<String>,
}

impl RawSqlAdapter {
    pub fn new(root_table: &str) -> Self {
        Self {
            root_table: root_table.to_string(),
            columns: Vec::new(),
            joins: Vec::new(),
            predicates: Vec::new(),
        }
    }

    pub fn join_count(&self) -> usize {
        self.joins.len()
    }

    pub fn build(&self) -> String {
        let columns = if self.columns.is_empty() {
            format!("{}.*", quote_ident(&self.root_table))
        } else {
            self.columns
                .iter()
                .map(|column| format!("{}.{}", quote_ident(&self.root_table), quote_ident(column)))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", columns, quote_ident(&self.root_table));
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.join(" AND "));
        }
        sql
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn column_ref(column: ColumnRef<'_>) -> String {
    format!("{}.{}", quote_ident(column.table), quote_ident(column.column))
}

impl QueryAdapter for RawSqlAdapter {
    type Predicate = String;

    fn root_table(&self) -> &str {
        &self.root_table
    }

    fn comparison(&self, column: ColumnRef<'_>, comparison: &Comparison) -> String {
        let col = column_ref(column);
        match comparison {
            Comparison::Eq(value) => format!("{col} = {}", quote_literal(value)),
            Comparison::NotEq(value) => format!("{col} <> {}", quote_literal(value)),
            Comparison::In(values) if values.is_empty() => "1 = 2".to_string(),
            Comparison::In(values) => format!(
                "{col} IN ({})",
                values.iter().map(|v| quote_literal(v)).collect::<Vec<_>>().join(", ")
            ),
            Comparison::NotIn(values) if values.is_empty() => "1 = 1".to_string(),
            Comparison::NotIn(values) => format!(
                "{col} NOT IN ({})",
                values.iter().map(|v| quote_literal(v)).collect::<Vec<_>>().join(", ")
            ),
            Comparison::Like(pattern) => format!("{col} LIKE {}", quote_literal(pattern)),
            Comparison::NotLike(pattern) => format!("{col} NOT LIKE {}", quote_literal(pattern)),
            Comparison::IsNotNull => format!("{col} IS NOT NULL"),
            Comparison::IsNull => format!("{col} IS NULL"),
        }
    }

    fn combine(&self, op: GroupOp, mut children: Vec<String>) -> String {
        match children.len() {
            0 => "1 = 1".to_string(),
            1 => children.swap_remove(0),
            _ => format!("({})", children.join(&format!(" {op} "))),
        }
    }

    fn add_join(&mut self, join: &JoinSpec) {
        let kind = match join.kind {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
        };
        self.joins.push(format!(
            "{kind} JOIN {} AS {} ON {}.{} = {}.{}",
            quote_ident(&join.table),
            quote_ident(&join.alias),
            quote_ident(&join.parent_table),
            quote_ident(&join.local_key),
            quote_ident(&join.alias),
            quote_ident(&join.foreign_key),
        ));
    }

    fn add_where(&mut self, predicate: String) {
        self.predicates.push(predicate);
    }

    fn select(&mut self, columns: &[&str]) {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books_column<'a>(column: &'a str) -> ColumnRef<'a> {
        ColumnRef {
            table: "books",
            column,
        }
    }

    #[test]
    fn test_plain_select() {
        let adapter = RawSqlAdapter::new("books");
        assert_eq!(adapter.build(), r#"SELECT "books".* FROM "books""#);
    }

    #[test]
    fn test_comparisons() {
        let adapter = RawSqlAdapter::new("books");
        assert_eq!(
            adapter.comparison(books_column("name"), &Comparison::Eq("Book1".to_string())),
            r#""books"."name" = 'Book1'"#
        );
        assert_eq!(
            adapter.comparison(
                books_column("state"),
                &Comparison::In(vec!["a".to_string(), "b".to_string()])
            ),
            r#""books"."state" IN ('a', 'b')"#
        );
        assert_eq!(
            adapter.comparison(books_column("name"), &Comparison::Like("Bo%".to_string())),
            r#""books"."name" LIKE 'Bo%'"#
        );
        assert_eq!(
            adapter.comparison(books_column("deleted_at"), &Comparison::IsNull),
            r#""books"."deleted_at" IS NULL"#
        );
    }

    #[test]
    fn test_literal_escaping() {
        let adapter = RawSqlAdapter::new("books");
        assert_eq!(
            adapter.comparison(books_column("name"), &Comparison::Eq("O'Brien".to_string())),
            r#""books"."name" = 'O''Brien'"#
        );
    }

    #[test]
    fn test_combine_nesting() {
        let adapter = RawSqlAdapter::new("books");
        let a = adapter.comparison(books_column("a"), &Comparison::Eq("1".to_string()));
        let b = adapter.comparison(books_column("b"), &Comparison::Eq("2".to_string()));
        let combined = adapter.combine(GroupOp::Or, vec![a, b]);
        assert_eq!(
            combined,
            r#"("books"."a" = '1' OR "books"."b" = '2')"#
        );
    }

    #[test]
    fn test_join_and_where_rendering() {
        let mut adapter = RawSqlAdapter::new("books");
        adapter.add_join(&JoinSpec {
            table: "taggings".to_string(),
            alias: "taggings_1".to_string(),
            kind: JoinKind::Inner,
            parent_table: "books".to_string(),
            local_key: "id".to_string(),
            foreign_key: "book_id".to_string(),
        });
        let predicate =
            adapter.comparison(books_column("name"), &Comparison::Eq("x".to_string()));
        adapter.add_where(predicate);
        let sql = adapter.build();
        assert!(sql.contains(
            r#"INNER JOIN "taggings" AS "taggings_1" ON "books"."id" = "taggings_1"."book_id""#
        ));
        assert!(sql.ends_with(r#"WHERE "books"."name" = 'x'"#));
    }
}
