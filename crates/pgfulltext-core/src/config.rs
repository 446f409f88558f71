//! Centralized configuration for pgfulltext.
//!
//! Default values live in [`FullTextDefaults`]; per-entity settings can be
//! loaded from JSON through [`IndexDefinition`].

use crate::index::{FieldSpecs, QueryBinding, SearchIndex, TextSearchConfig, Weight};
use crate::schema::EntitySchema;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Library-wide defaults.
pub struct FullTextDefaults;

impl FullTextDefaults {
    pub const CONFIG: &'static str = "pg_catalog.english";
    pub const SEARCH_FIELD: &'static str = "search_index";
    pub const WEIGHT: Weight = Weight::D;
    pub const RANK_FUNCTION: &'static str = "ts_rank";
    /// Divide the rank by itself + 1 (PostgreSQL normalization flag 32).
    pub const RANK_NORMALIZATION: i32 = 32;
    pub const HEADLINE_FUNCTION: &'static str = "ts_headline";
}

fn default_search_field() -> Option<String> {
    Some(FullTextDefaults::SEARCH_FIELD.to_string())
}

/// Serializable description of one searchable entity.
///
/// ```json
/// {
///   "search_field": "search_index",
///   "config": "english",
///   "fields": [["name", "A"], "description"],
///   "auto_update": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IndexDefinition {
    /// Persisted vector column; `null` searches the fields directly.
    #[serde(default = "default_search_field")]
    pub search_field: Option<String>,
    #[serde(default)]
    pub config: TextSearchConfig,
    #[serde(default)]
    pub fields: FieldSpecs,
    #[serde(default)]
    pub auto_update: bool,
    #[serde(default)]
    pub default_weight: Weight,
    #[serde(default)]
    pub query_binding: QueryBinding,
}

impl Default for IndexDefinition {
    fn default() -> Self {
        Self {
            search_field: default_search_field(),
            config: TextSearchConfig::default(),
            fields: FieldSpecs::default(),
            auto_update: false,
            default_weight: FullTextDefaults::WEIGHT,
            query_binding: QueryBinding::default(),
        }
    }
}

impl IndexDefinition {
    /// Parse a definition from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the definition against `schema` and build the index.
    pub fn into_index(self, schema: EntitySchema) -> Result<SearchIndex> {
        let mut builder = SearchIndex::builder(schema)
            .fields(self.fields)
            .config(self.config)
            .default_weight(self.default_weight)
            .auto_update(self.auto_update)
            .query_binding(self.query_binding);
        builder = match self.search_field {
            Some(field) => builder.search_field(&field),
            None => builder.without_search_field(),
        };
        builder.build()
    }
}
