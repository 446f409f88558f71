//! Full-text search index definitions and SQL generation.
//!
//! This module provides:
//! - Field declarations, weights and configurations
//! - Search document (`tsvector`) expression building
//! - Structured lookups (exact, prefix, negated prefix)
//! - Free-text search planning with rank and headline columns
//! - Transactional propagation into the persisted vector column

mod definition;
mod fields;
mod lookup;
mod planner;
mod propagate;
mod registry;
mod vector;

pub use definition::{SaveObserver, SearchIndex, SearchIndexBuilder};
pub use fields::{FieldSpec, FieldSpecs, ResolvedField, TextSearchConfig, Weight};
pub use lookup::{
    compile, compile_terms, escape_term, exact_match, negated_prefix_match, prefix_match,
    render_lookup, ColumnRef, CompiledLookup, Lookup, LookupKind, SearchTerm, TermToken,
};
pub use planner::{
    HeadlineSpec, OrderBy, QueryBinding, RankSpec, SearchPlan, SearchPlanner, SearchRequest,
    SelectExtra, SortDirection,
};
pub use propagate::{propagate, update_statement, UpdateScope, UpdateStatement};
pub use registry::SearchRegistry;
pub use vector::{
    CoalesceColumn, FieldExpression, FieldOverrides, JsonKey, VectorBuilder, VectorExpression,
};
