//! Per-entity search registration.

use super::fields::{FieldSpecs, TextSearchConfig, Weight};
use super::lookup::{self, CompiledLookup, LookupKind, SearchTerm};
use super::planner::{QueryBinding, SearchPlan, SearchPlanner, SearchRequest};
use super::propagate::{propagate, UpdateScope};
use super::vector::{FieldExpression, FieldOverrides, VectorBuilder, VectorExpression};
use crate::config::FullTextDefaults;
use crate::host::{HostConnection, PostgresDialect, SqlDialect, SqlValue};
use crate::schema::{ColumnKind, EntitySchema};
use crate::{FullTextError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Full-text search settings for one entity, validated against its schema.
///
/// Immutable once built; share it freely between threads.
#[derive(Clone)]
pub struct SearchIndex {
    schema: EntitySchema,
    fields: FieldSpecs,
    search_field: Option<String>,
    config: TextSearchConfig,
    default_weight: Weight,
    auto_update: bool,
    overrides: FieldOverrides,
    query_binding: QueryBinding,
    dialect: Arc<dyn SqlDialect>,
}

impl fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchIndex")
            .field("table", &self.schema.table())
            .field("fields", &self.fields)
            .field("search_field", &self.search_field)
            .field("config", &self.config)
            .field("auto_update", &self.auto_update)
            .field("overrides", &self.overrides)
            .field("query_binding", &self.query_binding)
            .finish()
    }
}

/// Builder for [`SearchIndex`].
pub struct SearchIndexBuilder {
    schema: EntitySchema,
    fields: FieldSpecs,
    search_field: Option<String>,
    config: TextSearchConfig,
    default_weight: Weight,
    auto_update: bool,
    overrides: FieldOverrides,
    query_binding: QueryBinding,
    dialect: Arc<dyn SqlDialect>,
}

impl SearchIndexBuilder {
    pub fn fields(mut self, fields: impl Into<FieldSpecs>) -> Self {
        self.fields = fields.into();
        self
    }

    pub fn search_field(mut self, name: &str) -> Self {
        self.search_field = Some(name.to_string());
        self
    }

    /// Search the fields directly; nothing is persisted.
    pub fn without_search_field(mut self) -> Self {
        self.search_field = None;
        self
    }

    pub fn config(mut self, config: TextSearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn default_weight(mut self, weight: Weight) -> Self {
        self.default_weight = weight;
        self
    }

    /// Propagate on [`SaveObserver::saved`].
    pub fn auto_update(mut self, enabled: bool) -> Self {
        self.auto_update = enabled;
        self
    }

    /// Replace the source expression of `field`.
    pub fn override_field(mut self, field: &str, expression: Arc<dyn FieldExpression>) -> Self {
        self.overrides.insert(field, expression);
        self
    }

    pub fn query_binding(mut self, binding: QueryBinding) -> Self {
        self.query_binding = binding;
        self
    }

    /// Dialect used for rendering when no connection is involved.
    pub fn dialect(mut self, dialect: Arc<dyn SqlDialect>) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn build(self) -> Result<SearchIndex> {
        // Surfaces unknown or key fields now rather than at first search.
        self.fields.resolve(&self.schema, self.default_weight)?;

        if let Some(field) = self.undeclared_override() {
            return Err(FullTextError::UnknownField {
                table: self.schema.table().to_string(),
                fields: vec![field],
            });
        }

        let search_field = match self.search_field {
            Some(name) => match self.schema.column(&name) {
                Some(column) => {
                    if column.kind != ColumnKind::Vector {
                        debug!(
                            "Search field {}.{} is declared as {:?}",
                            self.schema.table(),
                            name,
                            column.kind
                        );
                    }
                    Some(name)
                }
                None => {
                    warn!(
                        "Search field {} does not exist in {}; the index will not be persisted",
                        name,
                        self.schema.table()
                    );
                    None
                }
            },
            None => None,
        };

        Ok(SearchIndex {
            schema: self.schema,
            fields: self.fields,
            search_field,
            config: self.config,
            default_weight: self.default_weight,
            auto_update: self.auto_update,
            overrides: self.overrides,
            query_binding: self.query_binding,
            dialect: self.dialect,
        })
    }

    fn undeclared_override(&self) -> Option<String> {
        self.overrides
            .field_names()
            .find(|name| self.schema.column(name).is_none())
            .map(str::to_string)
    }
}

impl SearchIndex {
    pub fn builder(schema: EntitySchema) -> SearchIndexBuilder {
        SearchIndexBuilder {
            schema,
            fields: FieldSpecs::default(),
            search_field: Some(FullTextDefaults::SEARCH_FIELD.to_string()),
            config: TextSearchConfig::default(),
            default_weight: FullTextDefaults::WEIGHT,
            auto_update: false,
            overrides: FieldOverrides::new(),
            query_binding: QueryBinding::default(),
            dialect: Arc::new(PostgresDialect),
        }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn table(&self) -> &str {
        self.schema.table()
    }

    pub fn fields(&self) -> &FieldSpecs {
        &self.fields
    }

    /// Persisted vector column, if any.
    pub fn search_field(&self) -> Option<&str> {
        self.search_field.as_deref()
    }

    pub fn config(&self) -> &TextSearchConfig {
        &self.config
    }

    pub fn auto_update(&self) -> bool {
        self.auto_update
    }

    pub fn query_binding(&self) -> QueryBinding {
        self.query_binding
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    /// The document expression over the declared fields.
    pub fn vector_expression(&self, config: Option<&TextSearchConfig>) -> Result<VectorExpression> {
        self.render_vector(&self.fields, config, self.dialect())
    }

    /// The document expression over `fields` instead of the declared ones.
    pub fn vector_expression_for(
        &self,
        fields: &FieldSpecs,
        config: Option<&TextSearchConfig>,
    ) -> Result<VectorExpression> {
        self.render_vector(fields, config, self.dialect())
    }

    fn render_vector(
        &self,
        fields: &FieldSpecs,
        config: Option<&TextSearchConfig>,
        dialect: &dyn SqlDialect,
    ) -> Result<VectorExpression> {
        VectorBuilder::new(&self.schema, dialect, &self.overrides, self.default_weight)
            .build(fields, config.unwrap_or(&self.config))
    }

    /// Plan a free-text search.
    ///
    /// With `request.fields` the document is built ad hoc; otherwise the
    /// persisted column is searched.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchPlan> {
        let config = request.config.as_ref().unwrap_or(&self.config);
        let planner = SearchPlanner::new(self.dialect(), self.query_binding, config);
        planner.plan(request, || match &request.fields {
            Some(fields) => Ok(self.vector_expression_for(fields, Some(config))?.into_string()),
            None => self.search_column(),
        })
    }

    /// Compile a structured lookup against the persisted column.
    pub fn lookup(&self, kind: LookupKind, term: impl Into<SearchTerm>) -> Result<CompiledLookup> {
        let document = self.search_column()?;
        lookup::compile(kind, &document, &term.into(), self.dialect())
    }

    fn search_column(&self) -> Result<String> {
        match &self.search_field {
            Some(field) => Ok(self.dialect.qualified_name(self.schema.table(), field)),
            None => Err(FullTextError::MissingSearchField {
                table: self.schema.table().to_string(),
            }),
        }
    }

    /// Recompute the persisted vector for `scope`.
    ///
    /// Does nothing and returns 0 when the index has no persisted search field.
    pub fn update_search_field<C>(
        &self,
        conn: &mut C,
        scope: impl Into<UpdateScope>,
        config: Option<&TextSearchConfig>,
    ) -> Result<usize>
    where
        C: HostConnection + ?Sized,
    {
        let search_field = match &self.search_field {
            Some(field) => field,
            None => {
                debug!("{} has no search field; skipping update", self.schema.table());
                return Ok(0);
            }
        };
        let vector = self.render_vector(&self.fields, config, conn.dialect())?;
        propagate(conn, &self.schema, search_field, &vector, &scope.into())
    }
}

/// Explicit post-write hook.
///
/// Call after a row has been written successfully; nothing is registered on
/// any global event bus.
pub trait SaveObserver {
    fn saved(&self, conn: &mut dyn HostConnection, key: &SqlValue) -> Result<()>;
}

impl SaveObserver for SearchIndex {
    fn saved(&self, conn: &mut dyn HostConnection, key: &SqlValue) -> Result<()> {
        if self.auto_update {
            self.update_search_field(conn, UpdateScope::One(key.clone()), None)?;
        }
        Ok(())
    }
}
