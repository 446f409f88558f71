//! Search document (`tsvector`) expression building.
//!
//! Each field becomes `setweight(to_tsvector(<config>, <source>), '<W>')` and
//! the per-field vectors are concatenated with `||` in declaration order.

use super::fields::{FieldSpecs, ResolvedField, TextSearchConfig, Weight};
use crate::host::SqlDialect;
use crate::schema::EntitySchema;
use crate::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Produces the text a field contributes before normalization.
///
/// `column_ref` is the already quoted `table.column` reference.
pub trait FieldExpression: Send + Sync {
    fn source_expression(&self, column_ref: &str, dialect: &dyn SqlDialect) -> String;
}

impl<F> FieldExpression for F
where
    F: Fn(&str, &dyn SqlDialect) -> String + Send + Sync,
{
    fn source_expression(&self, column_ref: &str, dialect: &dyn SqlDialect) -> String {
        self(column_ref, dialect)
    }
}

/// The default source: the raw column with NULL read as empty text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoalesceColumn;

impl FieldExpression for CoalesceColumn {
    fn source_expression(&self, column_ref: &str, _dialect: &dyn SqlDialect) -> String {
        format!("coalesce({}, '')", column_ref)
    }
}

/// Extracts one key of a JSON column as text.
#[derive(Debug, Clone)]
pub struct JsonKey {
    key: String,
}

impl JsonKey {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }
}

impl FieldExpression for JsonKey {
    fn source_expression(&self, column_ref: &str, dialect: &dyn SqlDialect) -> String {
        format!(
            "coalesce({} ->> {}, '')",
            column_ref,
            dialect.quote_literal(&self.key)
        )
    }
}

/// Per-field source overrides, consulted before [`CoalesceColumn`].
#[derive(Clone, Default)]
pub struct FieldOverrides {
    by_field: HashMap<String, Arc<dyn FieldExpression>>,
}

impl FieldOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, expression: Arc<dyn FieldExpression>) {
        self.by_field.insert(field.to_string(), expression);
    }

    pub fn get(&self, field: &str) -> Option<&dyn FieldExpression> {
        self.by_field.get(field).map(|e| e.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.by_field.keys().map(String::as_str)
    }
}

impl fmt::Debug for FieldOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<_> = self.by_field.keys().collect();
        fields.sort();
        f.debug_struct("FieldOverrides")
            .field("fields", &fields)
            .finish()
    }
}

/// A rendered search document expression. Evaluates to a `tsvector`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VectorExpression(String);

impl VectorExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for VectorExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VectorExpression {
    fn from(expression: String) -> Self {
        VectorExpression(expression)
    }
}

impl From<&str> for VectorExpression {
    fn from(expression: &str) -> Self {
        VectorExpression(expression.to_string())
    }
}

impl AsRef<str> for VectorExpression {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds [`VectorExpression`]s for one entity.
#[derive(Clone, Copy)]
pub struct VectorBuilder<'a> {
    schema: &'a EntitySchema,
    dialect: &'a dyn SqlDialect,
    overrides: &'a FieldOverrides,
    default_weight: Weight,
}

impl<'a> VectorBuilder<'a> {
    pub fn new(
        schema: &'a EntitySchema,
        dialect: &'a dyn SqlDialect,
        overrides: &'a FieldOverrides,
        default_weight: Weight,
    ) -> Self {
        Self {
            schema,
            dialect,
            overrides,
            default_weight,
        }
    }

    /// Combine `fields` into one document expression under `config`.
    ///
    /// Output is a pure function of the inputs: same declarations, same
    /// configuration, same bytes.
    pub fn build(&self, fields: &FieldSpecs, config: &TextSearchConfig) -> Result<VectorExpression> {
        let resolved = fields.resolve(self.schema, self.default_weight)?;
        let expression = resolved
            .iter()
            .map(|field| self.field_vector(field, config))
            .collect::<Vec<_>>()
            .join(" || ");

        debug!(
            "Built search vector for {} over {} field(s)",
            self.schema.table(),
            resolved.len()
        );
        Ok(VectorExpression(expression))
    }

    fn field_vector(&self, field: &ResolvedField<'_>, config: &TextSearchConfig) -> String {
        let column_ref = self
            .dialect
            .qualified_name(self.schema.table(), &field.column.column);
        let source = match self.overrides.get(&field.column.name) {
            Some(expression) => expression.source_expression(&column_ref, self.dialect),
            None => CoalesceColumn.source_expression(&column_ref, self.dialect),
        };
        format!(
            "setweight(to_tsvector({}, {}), '{}')",
            self.dialect.quote_literal(config.name()),
            source,
            field.weight
        )
    }
}
