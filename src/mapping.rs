//! Logical-to-physical attribute mapping.
//!
//! Each resource declares once, at setup time, which logical filter names
//! exist and what they compile to: either a physical column path
//! ([`MappingTarget::Static`]) or a transform function
//! ([`MappingTarget::Transform`]) that may rename the target and rewrite
//! the operator/value spec. The table is immutable after declaration.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::{FilterOp, FilterValue};
use crate::error::FilterError;

/// The raw `{operator, value}` pair of a single condition, as handed to
/// transform entries.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub op: FilterOp,
    pub value: Option<FilterValue>,
}

/// A resolved filter: the physical dotted path plus the (possibly
/// rewritten) spec to compile against it.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedFilter {
    pub target: String,
    pub spec: FilterSpec,
}

pub type TransformFn = Arc<dyn Fn(FilterSpec) -> MappedFilter + Send + Sync>;

/// Closed tagged variant so the compiler pattern-matches exhaustively
/// instead of probing for callables.
#[derive(Clone)]
pub enum MappingTarget {
    Static(String),
    Transform(TransformFn),
}

impl fmt::Debug for MappingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingTarget::Static(path) => f.debug_tuple("Static").field(path).finish(),
            MappingTarget::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// One declared filter: its target plus an optional operator allow-list.
#[derive(Debug, Clone)]
pub struct FilterDefinition {
    target: MappingTarget,
    allowed: Option<Vec<FilterOp>>,
}

impl FilterDefinition {
    /// Restricts the filter to the given operators; anything else raises
    /// [`FilterError::UnsupportedOperator`]. Checked against the operator
    /// as requested, before any transform rewrite.
    pub fn allow(&mut self, operators: &[FilterOp]) -> &mut Self {
        self.allowed = Some(operators.to_vec());
        self
    }
}

/// Mapping from logical filter name to its definition.
#[derive(Debug, Clone, Default)]
pub struct AttributeMapping {
    entries: HashMap<String, FilterDefinition>,
}

impl AttributeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a logical name backed directly by a physical column path.
    pub fn attribute(&mut self, logical: &str, physical: &str) -> &mut FilterDefinition {
        self.define(logical, MappingTarget::Static(physical.to_string()))
    }

    /// Declares a logical name backed by a transform function. The function
    /// receives the raw spec and returns the rewritten spec together with
    /// the physical target path.
    pub fn transform<F>(&mut self, logical: &str, transform: F) -> &mut FilterDefinition
    where
        F: Fn(FilterSpec) -> MappedFilter + Send + Sync + 'static,
    {
        self.define(logical, MappingTarget::Transform(Arc::new(transform)))
    }

    fn define(&mut self, logical: &str, target: MappingTarget) -> &mut FilterDefinition {
        let definition = FilterDefinition {
            target,
            allowed: None,
        };
        match self.entries.entry(logical.to_string()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(definition);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(definition),
        }
    }

    pub fn contains(&self, logical: &str) -> bool {
        self.entries.contains_key(logical)
    }

    /// Resolves a logical name against the table. Unknown names fail
    /// immediately; they are never silently dropped or passed through.
    pub fn resolve(&self, logical: &str, spec: FilterSpec) -> Result<MappedFilter, FilterError> {
        let definition = self
            .entries
            .get(logical)
            .ok_or_else(|| FilterError::UnknownFilter(logical.to_string()))?;

        if let Some(allowed) = &definition.allowed {
            if !allowed.contains(&spec.op) {
                return Err(FilterError::UnsupportedOperator {
                    filter: logical.to_string(),
                    operator: spec.op,
                });
            }
        }

        Ok(match &definition.target {
            MappingTarget::Static(path) => MappedFilter {
                target: path.clone(),
                spec,
            },
            MappingTarget::Transform(transform) => transform(spec),
        })
    }
}
