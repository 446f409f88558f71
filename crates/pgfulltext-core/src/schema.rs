//! Entity schema as seen by the search layer.

use serde::{Deserialize, Serialize};

/// Storage class of a column, as far as text search cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    Boolean,
    Json,
    /// A persisted `tsvector` column.
    Vector,
    Other,
}

impl ColumnKind {
    /// Columns picked up when an index declares no fields.
    pub fn is_text_bearing(&self) -> bool {
        matches!(self, ColumnKind::Text)
    }
}

/// One column of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Field name used in declarations.
    pub name: String,
    /// Database column name.
    pub column: String,
    pub kind: ColumnKind,
    #[serde(default)]
    pub primary_key: bool,
}

impl Column {
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            column: name.to_string(),
            kind,
            primary_key: false,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ColumnKind::Integer)
    }

    pub fn json(name: &str) -> Self {
        Self::new(name, ColumnKind::Json)
    }

    pub fn vector(name: &str) -> Self {
        Self::new(name, ColumnKind::Vector)
    }

    /// Store the field under a different database column name.
    pub fn with_column(mut self, column: &str) -> Self {
        self.column = column.to_string();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// Table name plus its columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    table: String,
    columns: Vec<Column>,
}

impl EntitySchema {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
        }
    }

    /// Append a column. A column with the same field name replaces the old one.
    pub fn with_column(mut self, column: Column) -> Self {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Non-key text columns in declaration order.
    pub fn text_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| !c.primary_key && c.kind.is_text_bearing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> EntitySchema {
        EntitySchema::new("person")
            .with_column(Column::integer("id").primary_key())
            .with_column(Column::text("name"))
            .with_column(Column::text("description").with_column("descr"))
            .with_column(Column::vector("search_index"))
    }

    #[test]
    fn test_lookup_columns() {
        let schema = person();
        assert_eq!(schema.column("description").unwrap().column, "descr");
        assert!(schema.column("missing").is_none());
        assert_eq!(schema.primary_key().unwrap().name, "id");
    }

    #[test]
    fn test_text_columns_skip_key_and_vector() {
        let schema = person();
        let names: Vec<_> = schema.text_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "description"]);
    }

    #[test]
    fn test_text_primary_key_is_not_searchable() {
        let schema = EntitySchema::new("tag")
            .with_column(Column::text("slug").primary_key())
            .with_column(Column::text("label"));
        let names: Vec<_> = schema.text_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["label"]);
    }

    #[test]
    fn test_redeclared_column_replaces() {
        let schema = person().with_column(Column::json("name"));
        assert_eq!(schema.columns().len(), 4);
        assert_eq!(schema.column("name").unwrap().kind, ColumnKind::Json);
    }
}
