//! Model and association metadata consumed by the query compiler.
//!
//! The compiler does not encode how a specific association shape joins; it
//! only looks one up by relation name. Registries are declared
//! programmatically by the resource layer or loaded from a JSON document.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("cannot read schema file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// How a joined relation attaches to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

/// One declared association: target model, join kind and key columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub target_model: String,
    #[serde(default)]
    pub join_kind: JoinKind,
    /// Column on the owning side of the join.
    pub local_key: String,
    /// Column on the joined side.
    pub foreign_key: String,
}

impl Association {
    pub fn new(target_model: &str, join_kind: JoinKind, local_key: &str, foreign_key: &str) -> Self {
        Self {
            target_model: target_model.to_string(),
            join_kind,
            local_key: local_key.to_string(),
            foreign_key: foreign_key.to_string(),
        }
    }
}

/// Table name, primary key and associations of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub associations: HashMap<String, Association>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl ModelSchema {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            primary_key: default_primary_key(),
            associations: HashMap::new(),
        }
    }

    pub fn with_primary_key(mut self, primary_key: &str) -> Self {
        self.primary_key = primary_key.to_string();
        self
    }

    pub fn associate(mut self, name: &str, association: Association) -> Self {
        self.associations.insert(name.to_string(), association);
        self
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.get(name)
    }
}

/// Model name to schema lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    #[serde(flatten)]
    models: HashMap<String, ModelSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, model_name: &str, model: ModelSchema) -> &mut Self {
        self.models.insert(model_name.to_string(), model);
        self
    }

    pub fn model(&self, name: &str) -> Option<&ModelSchema> {
        self.models.get(name)
    }

    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
