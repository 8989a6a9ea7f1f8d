//! Join-aware query compiler.
//!
//! Walks the typed AST for WHERE logic and the path grouping tree for the
//! set of required joins. Every fallible step (attribute mapping, operator
//! checks, relation traversal) runs before the first adapter mutation, so
//! a failed compilation leaves the caller's query object untouched.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::ast::{ConditionGroup, FilterExpr, FilterOp, FilterValue, GroupOp};
use crate::backend::{ColumnRef, Comparison, JoinSpec, QueryAdapter};
use crate::error::FilterError;
use crate::mapping::{AttributeMapping, FilterSpec};
use crate::parser;
use crate::schema::{ModelSchema, SchemaRegistry};
use crate::tree::{FilterTreeNode, HasRelationPath};

/// Alias registry scoped to exactly one compilation. A relation path keeps
/// its first-assigned alias for the whole call; the counter is never shared
/// across compilations, so concurrent calls cannot collide.
#[derive(Debug, Default)]
struct CompilationState {
    aliases: HashMap<Vec<String>, String>,
    counter: usize,
}

impl CompilationState {
    fn alias_for(&mut self, relation_path: &[String]) -> String {
        if let Some(alias) = self.aliases.get(relation_path) {
            return alias.clone();
        }
        self.counter += 1;
        let segment = relation_path.last().map_or("", String::as_str);
        let alias = format!("{}_{}", segment, self.counter);
        self.aliases.insert(relation_path.to_vec(), alias.clone());
        alias
    }

    fn alias(&self, relation_path: &[String]) -> Option<&str> {
        self.aliases.get(relation_path).map(String::as_str)
    }
}

/// A leaf condition after attribute mapping: physical relation path and
/// column, with transform rewrites already applied.
#[derive(Debug, Clone, PartialEq)]
struct ResolvedCondition {
    relation_path: Vec<String>,
    column: String,
    op: FilterOp,
    value: Option<FilterValue>,
}

impl HasRelationPath for ResolvedCondition {
    fn relation_path(&self) -> &[String] {
        &self.relation_path
    }
}

/// The AST with every leaf resolved through the mapping table. Mirrors the
/// original nesting so predicate construction preserves it structurally.
#[derive(Debug)]
enum ResolvedExpr {
    Condition(ResolvedCondition),
    Group {
        op: GroupOp,
        children: Vec<ResolvedExpr>,
    },
}

impl ResolvedExpr {
    fn leaves(&self) -> Vec<&ResolvedCondition> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a ResolvedCondition>) {
        match self {
            ResolvedExpr::Condition(condition) => out.push(condition),
            ResolvedExpr::Group { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

/// Compiles filter expressions against one resource: its attribute mapping,
/// the schema registry and the root model name.
pub struct FilterCompiler<'a> {
    schema: &'a SchemaRegistry,
    mapping: &'a AttributeMapping,
    root_model: &'a str,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(schema: &'a SchemaRegistry, mapping: &'a AttributeMapping, root_model: &'a str) -> Self {
        Self {
            schema,
            mapping,
            root_model,
        }
    }

    /// Parses, loads and compiles a raw filter string into the adapter.
    /// A blank string is the valid "no filter" case: the query is returned
    /// untouched.
    pub fn apply<A: QueryAdapter>(&self, input: &str, adapter: &mut A) -> Result<(), FilterError> {
        let Some(node) = parser::parse(input)? else {
            trace!("blank filter string, query left untouched");
            return Ok(());
        };
        let expr = ConditionGroup::load(node);
        self.compile(&expr, adapter)
    }

    /// Compiles an already-loaded AST into the adapter.
    pub fn compile<A: QueryAdapter>(
        &self,
        expr: &FilterExpr,
        adapter: &mut A,
    ) -> Result<(), FilterError> {
        let root_model = self
            .schema
            .model(self.root_model)
            .ok_or_else(|| FilterError::UnknownModel(self.root_model.to_string()))?;
        let root_table = adapter.root_table().to_string();

        // Validation pass: resolve every leaf, then discover and check the
        // joins. Nothing below may mutate the adapter.
        let resolved = self.resolve_expr(expr)?;
        let tree = FilterTreeNode::build(resolved.leaves());
        let mut state = CompilationState::default();
        let mut joins = Vec::new();
        self.plan_joins(&tree, root_model, &root_table, &mut state, &mut joins)?;

        let predicate = build_predicate(&resolved, &state, &root_table, adapter);

        debug!(filter = %expr, joins = joins.len(), "compiled filter expression");
        for join in &joins {
            trace!(alias = %join.alias, table = %join.table, "adding join");
            adapter.add_join(join);
        }
        adapter.add_where(predicate);
        Ok(())
    }

    fn resolve_expr(&self, expr: &FilterExpr) -> Result<ResolvedExpr, FilterError> {
        match expr {
            FilterExpr::Group(group) => Ok(ResolvedExpr::Group {
                op: group.op,
                children: group
                    .children
                    .iter()
                    .map(|child| self.resolve_expr(child))
                    .collect::<Result<_, _>>()?,
            }),
            FilterExpr::Condition(condition) => {
                let logical = condition.name();
                let mapped = self.mapping.resolve(
                    &logical,
                    FilterSpec {
                        op: condition.op,
                        value: condition.value.clone(),
                    },
                )?;
                let mut segments: Vec<String> =
                    mapped.target.split('.').map(str::to_string).collect();
                let column = segments.pop().unwrap_or_default();
                // Re-establish the operator/value invariant in case a
                // transform rewrote the operator.
                let value = if mapped.spec.op.takes_value() {
                    Some(
                        mapped
                            .spec
                            .value
                            .unwrap_or_else(|| FilterValue::Scalar(String::new())),
                    )
                } else {
                    None
                };
                Ok(ResolvedExpr::Condition(ResolvedCondition {
                    relation_path: segments,
                    column,
                    op: mapped.spec.op,
                    value,
                }))
            }
        }
    }

    /// Emits one join per distinct relation path, depth first so a parent's
    /// alias exists before its children reference it.
    fn plan_joins<T: HasRelationPath>(
        &self,
        node: &FilterTreeNode<T>,
        model: &ModelSchema,
        parent_table: &str,
        state: &mut CompilationState,
        joins: &mut Vec<JoinSpec>,
    ) -> Result<(), FilterError> {
        for (segment, child) in node.children() {
            let association = model.association(segment).ok_or_else(|| {
                FilterError::UnknownRelation {
                    segment: segment.to_string(),
                    path: child.relation_path().join("."),
                }
            })?;
            let target = self
                .schema
                .model(&association.target_model)
                .ok_or_else(|| FilterError::UnknownModel(association.target_model.clone()))?;
            let alias = state.alias_for(child.relation_path());
            joins.push(JoinSpec {
                table: target.table.clone(),
                alias: alias.clone(),
                kind: association.join_kind,
                parent_table: parent_table.to_string(),
                local_key: association.local_key.clone(),
                foreign_key: association.foreign_key.clone(),
            });
            self.plan_joins(child, target, &alias, state, joins)?;
        }
        Ok(())
    }
}

/// Post-order walk of the resolved AST; groups combine their already-built
/// children with the backend's native AND/OR.
fn build_predicate<A: QueryAdapter>(
    expr: &ResolvedExpr,
    state: &CompilationState,
    root_table: &str,
    adapter: &A,
) -> A::Predicate {
    match expr {
        ResolvedExpr::Group { op, children } => adapter.combine(
            *op,
            children
                .iter()
                .map(|child| build_predicate(child, state, root_table, adapter))
                .collect(),
        ),
        ResolvedExpr::Condition(condition) => {
            let table = if condition.relation_path.is_empty() {
                root_table
            } else {
                state.alias(&condition.relation_path).unwrap_or(root_table)
            };
            let column = ColumnRef {
                table,
                column: &condition.column,
            };
            leaf_predicate(column, condition, adapter)
        }
    }
}

fn leaf_predicate<A: QueryAdapter>(
    column: ColumnRef<'_>,
    condition: &ResolvedCondition,
    adapter: &A,
) -> A::Predicate {
    match (condition.op, &condition.value) {
        (FilterOp::Present, _) => adapter.comparison(column, &Comparison::IsNotNull),
        (FilterOp::Absent, _) => adapter.comparison(column, &Comparison::IsNull),
        (op, Some(FilterValue::Scalar(value))) => {
            adapter.comparison(column, &scalar_comparison(op, value))
        }
        (op, Some(FilterValue::List(items))) => {
            if items.iter().any(|item| is_fuzzy(item)) {
                // Mixed exact/fuzzy lists expand into per-item predicates.
                let children = items
                    .iter()
                    .map(|item| adapter.comparison(column, &scalar_comparison(op, item)))
                    .collect();
                let connective = if op == FilterOp::NotEq {
                    GroupOp::And
                } else {
                    GroupOp::Or
                };
                adapter.combine(connective, children)
            } else if op == FilterOp::NotEq {
                adapter.comparison(column, &Comparison::NotIn(items.clone()))
            } else {
                adapter.comparison(column, &Comparison::In(items.clone()))
            }
        }
        // Unreachable after resolve_expr normalization.
        (op, None) => adapter.comparison(column, &scalar_comparison(op, "")),
    }
}

fn scalar_comparison(op: FilterOp, value: &str) -> Comparison {
    match (op, is_fuzzy(value)) {
        (FilterOp::NotEq, true) => Comparison::NotLike(like_pattern(value)),
        (FilterOp::NotEq, false) => Comparison::NotEq(value.to_string()),
        (_, true) => Comparison::Like(like_pattern(value)),
        (_, false) => Comparison::Eq(value.to_string()),
    }
}

/// `*` is the public fuzzy-match marker.
fn is_fuzzy(value: &str) -> bool {
    value.contains('*')
}

/// Translates the fuzzy marker to the SQL wildcard, escaping the wildcard
/// characters the value itself may contain.
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' => pattern.push('%'),
            '%' | '_' => {
                pattern.push('\\');
                pattern.push(c);
            }
            '\\' => pattern.push_str("\\\\"),
            _ => pattern.push(c),
        }
    }
    pattern
}
