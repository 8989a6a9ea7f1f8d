//! Compiler for a compact REST filter expression language.
//!
//! A filter string such as `author.name=Tolstoy&taggings.label=classic*`
//! moves through the pipeline in stages:
//!
//! 1. [`lexer`] splits the raw string into tokens, tracking whether it is
//!    reading names or values.
//! 2. [`parser`] builds an untyped AND/OR parse tree with standard boolean
//!    precedence.
//! 3. [`ast`] converts it into the typed AST and renders the canonical dump
//!    form, which re-parses to itself.
//! 4. [`tree`] regroups the leaf conditions by relation path, which is the
//!    shape join planning needs.
//! 5. [`mapping`] resolves each logical filter name to a physical column
//!    path, applying per-resource renames and operator allow-lists.
//! 6. [`compiler`] plans joins against the [`schema`] registry, builds the
//!    predicate tree and applies both through a [`QueryAdapter`].
//!
//! Two adapters ship in-crate: [`SeaQueryAdapter`] targets sea-query's
//! `SelectStatement` and [`RawSqlAdapter`] renders plain SQL text.
//!
//! ```
//! use filter_compiler::{
//!     Association, AttributeMapping, FilterCompiler, JoinKind, ModelSchema, RawSqlAdapter,
//!     SchemaRegistry,
//! };
//!
//! let mut schema = SchemaRegistry::new();
//! schema
//!     .define(
//!         "Book",
//!         ModelSchema::new("books").associate(
//!             "author",
//!             Association::new("Author", JoinKind::Inner, "author_id", "id"),
//!         ),
//!     )
//!     .define("Author", ModelSchema::new("authors"));
//!
//! let mut mapping = AttributeMapping::new();
//! mapping.attribute("author.name", "author.name");
//!
//! let compiler = FilterCompiler::new(&schema, &mapping, "Book");
//! let mut adapter = RawSqlAdapter::new("books");
//! compiler.apply("author.name=Tolstoy", &mut adapter)?;
//! assert!(adapter.build().contains(r#""author_1"."name" = 'Tolstoy'"#));
//! # Ok::<(), filter_compiler::FilterError>(())
//! ```

pub mod ast;
pub mod backend;
pub mod backend_sea;
pub mod backend_sql;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod mapping;
pub mod parser;
pub mod schema;
pub mod token;
pub mod tree;

pub use ast::{Condition, ConditionGroup, FilterExpr, FilterOp, FilterValue, GroupOp};
pub use backend::{ColumnRef, Comparison, JoinSpec, QueryAdapter};
pub use backend_sea::SeaQueryAdapter;
pub use backend_sql::RawSqlAdapter;
pub use compiler::FilterCompiler;
pub use error::FilterError;
pub use mapping::{AttributeMapping, FilterSpec, MappedFilter, MappingTarget};
pub use parser::{parse, ParseError, ParseNode};
pub use schema::{Association, JoinKind, ModelSchema, SchemaError, SchemaRegistry};
pub use tree::{FilterTreeNode, HasRelationPath};
