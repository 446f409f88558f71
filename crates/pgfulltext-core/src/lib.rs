//! pgfulltext - PostgreSQL full-text search expressions for application entities.
//!
//! This crate builds the SQL that keeps a denormalized `tsvector` column in
//! sync with an entity's text columns and compiles searches against it. It
//! never holds a connection: operations that touch the database take a
//! [`host::HostConnection`] explicitly.
//!
//! # Example
//!
//! ```rust,ignore
//! use pgfulltext::{SearchIndex, SearchRequest, RankSpec, TextSearchConfig, Weight};
//! use pgfulltext::host::sqlite::{introspect_schema, open_database};
//!
//! fn main() -> pgfulltext::Result<()> {
//!     let mut conn = open_database("/path/to/app.db")?;
//!     let schema = introspect_schema(&conn, "person")?;
//!
//!     let index = SearchIndex::builder(schema)
//!         .fields([("name", Weight::A), ("description", Weight::D)])
//!         .config(TextSearchConfig::new("english")?)
//!         .build()?;
//!
//!     // Rebuild the stored vectors
//!     index.update_search_field(&mut conn, pgfulltext::UpdateScope::All, None)?;
//!
//!     // Plan a ranked search
//!     let plan = index.search(&SearchRequest::new("Pepa").rank(RankSpec::new("rank")))?;
//!     println!("{}", plan.to_select_sql(index.table(), index.dialect()));
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod index;
pub mod schema;

// Re-export commonly used types
pub use config::{FullTextDefaults, IndexDefinition};
pub use error::{FullTextError, Result};
pub use host::{HostConnection, PostgresDialect, SqlDialect, SqlValue, SqliteDialect};
pub use index::{
    exact_match, negated_prefix_match, prefix_match, ColumnRef, FieldSpec, FieldSpecs,
    HeadlineSpec, Lookup, LookupKind, QueryBinding, RankSpec, SaveObserver, SearchIndex,
    SearchPlan, SearchRegistry, SearchRequest, SearchTerm, TextSearchConfig, UpdateScope,
    VectorExpression, Weight,
};
pub use schema::{Column, ColumnKind, EntitySchema};
