//! Typed, immutable filter AST with canonical serialization.
//!
//! [`ConditionGroup::load`] converts the untyped parse tree into this
//! representation; [`FilterExpr::dump`] renders the canonical form. The
//! canonical form is whitespace-normalized and fully parenthesized, and it
//! is a fixed point: re-parsing and re-dumping a dump yields the same text.

use std::fmt;

use crate::parser::ParseNode;

/// Comparison operator attached to a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// `=`: equality, membership for lists, pattern match for fuzzy values.
    Eq,
    /// `!=`: the negation of `=`.
    NotEq,
    /// `!`: the attribute is present (not null). Never carries a value.
    Present,
    /// `!!`: the attribute is absent (null). Never carries a value.
    Absent,
}

impl FilterOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::NotEq => "!=",
            FilterOp::Present => "!",
            FilterOp::Absent => "!!",
        }
    }

    /// Whether the operator carries a value (`=`/`!=`) or forbids one.
    pub fn takes_value(&self) -> bool {
        matches!(self, FilterOp::Eq | FilterOp::NotEq)
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Logical connector of a [`ConditionGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOp {
    And,
    Or,
}

impl fmt::Display for GroupOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupOp::And => "AND",
            GroupOp::Or => "OR",
        })
    }
}

/// A scalar or a comma-separated list. A single-item list collapses to a
/// scalar during parsing, so `List` always holds at least two items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Scalar(String),
    List(Vec<String>),
}

/// A leaf condition: dotted path, operator and optional value.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// The logical name split on dots; the final segment is the attribute,
    /// everything before it is the relation path.
    pub path: Vec<String>,
    pub op: FilterOp,
    pub value: Option<FilterValue>,
}

/// A boolean connective over two or more conditions or nested groups.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup {
    pub op: GroupOp,
    pub children: Vec<FilterExpr>,
}

/// Either a bare condition or a group; the result of loading a parse tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Condition(Condition),
    Group(ConditionGroup),
}

impl ConditionGroup {
    /// Converts the untyped parse tree into the typed AST. A group with
    /// exactly one child collapses to that child, so a bare condition never
    /// appears wrapped.
    pub fn load(node: ParseNode) -> FilterExpr {
        match node {
            ParseNode::Condition { name, op, value } => FilterExpr::Condition(Condition {
                path: name.split('.').map(str::to_string).collect(),
                op,
                value,
            }),
            ParseNode::Group { op, mut children } => {
                if children.len() == 1 {
                    return Self::load(children.swap_remove(0));
                }
                FilterExpr::Group(ConditionGroup {
                    op,
                    children: children.into_iter().map(Self::load).collect(),
                })
            }
        }
    }

    pub fn dump(&self) -> String {
        let inner = self
            .children
            .iter()
            .map(FilterExpr::dump)
            .collect::<Vec<_>>()
            .join(&format!(" {} ", self.op));
        format!("( {} )", inner)
    }
}

impl Condition {
    /// The full dotted logical name.
    pub fn name(&self) -> String {
        self.path.join(".")
    }

    /// The relation segments, i.e. the path minus the attribute. Empty for
    /// root-level attributes.
    pub fn relation_path(&self) -> &[String] {
        self.path.split_last().map_or(&[], |(_, rest)| rest)
    }

    /// The final path segment.
    pub fn attribute(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }

    pub fn dump(&self) -> String {
        let mut out = self.name();
        out.push_str(self.op.symbol());
        match &self.value {
            None => {}
            Some(FilterValue::Scalar(v)) => out.push_str(&dump_item(v)),
            Some(FilterValue::List(items)) => {
                out.push('[');
                out.push_str(
                    &items
                        .iter()
                        .map(|item| dump_item(item))
                        .collect::<Vec<_>>()
                        .join(","),
                );
                out.push(']');
            }
        }
        out
    }
}

impl FilterExpr {
    /// The canonical, whitespace-normalized form.
    pub fn dump(&self) -> String {
        match self {
            FilterExpr::Condition(condition) => condition.dump(),
            FilterExpr::Group(group) => group.dump(),
        }
    }

    /// Post-order list of leaf conditions; the AND/OR structure is lost.
    pub fn flatten(&self) -> Vec<&Condition> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a Condition>) {
        match self {
            FilterExpr::Condition(condition) => leaves.push(condition),
            FilterExpr::Group(group) => {
                for child in &group.children {
                    child.collect_leaves(leaves);
                }
            }
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

/// Renders one value item, quoting it whenever the bare text would not
/// survive a re-parse of the canonical form. Brackets are quoted so a
/// dumped list never carries them inside an item, and connector words are
/// quoted even at the item's edge: the group form supplies the surrounding
/// spaces that would turn a trailing ` AND` into a connector.
fn dump_item(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.trim() != value
        || value.contains([',', '&', '|', '(', ')', '[', ']'])
        || value.contains(" AND ")
        || value.contains(" OR ")
        || value.starts_with("AND ")
        || value.starts_with("OR ")
        || value.ends_with(" AND")
        || value.ends_with(" OR")
        || (value.len() >= 2 && value.starts_with('"') && value.ends_with('"'));
    if needs_quotes {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
