//! Field declarations: which columns feed the search document and how heavily.

use crate::config::FullTextDefaults;
use crate::schema::{Column, EntitySchema};
use crate::{FullTextError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

/// `name` or `schema.name`, as accepted for a text search configuration.
static CONFIG_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)?$").unwrap()
});

/// Ranking tier of a field, `A` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Weight {
    A,
    B,
    C,
    #[default]
    D,
}

impl Weight {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weight::A => "A",
            Weight::B => "B",
            Weight::C => "C",
            Weight::D => "D",
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weight {
    type Err = FullTextError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Weight::A),
            "B" => Ok(Weight::B),
            "C" => Ok(Weight::C),
            "D" => Ok(Weight::D),
            other => Err(FullTextError::validation(
                "weight",
                format!("expected one of A, B, C, D but got {:?}", other),
            )),
        }
    }
}

impl Serialize for Weight {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Weight {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Name of a text search configuration (`regconfig`), e.g. `pg_catalog.english`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TextSearchConfig(String);

impl TextSearchConfig {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !CONFIG_NAME.is_match(&name) {
            return Err(FullTextError::validation(
                "config",
                format!("{:?} is not a valid text search configuration name", name),
            ));
        }
        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for TextSearchConfig {
    fn default() -> Self {
        Self(FullTextDefaults::CONFIG.to_string())
    }
}

impl fmt::Display for TextSearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TextSearchConfig {
    type Error = FullTextError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TextSearchConfig {
    type Error = FullTextError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TextSearchConfig> for String {
    fn from(value: TextSearchConfig) -> Self {
        value.0
    }
}

/// A searchable field and its optional weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "FieldSpecRepr", into = "FieldSpecRepr")]
pub struct FieldSpec {
    pub name: String,
    pub weight: Option<Weight>,
}

impl FieldSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            weight: None,
        }
    }

    pub fn weighted(name: &str, weight: Weight) -> Self {
        Self {
            name: name.to_string(),
            weight: Some(weight),
        }
    }

    pub fn resolved_weight(&self, default: Weight) -> Weight {
        self.weight.unwrap_or(default)
    }
}

impl From<&str> for FieldSpec {
    fn from(name: &str) -> Self {
        FieldSpec::new(name)
    }
}

impl From<(&str, Weight)> for FieldSpec {
    fn from((name, weight): (&str, Weight)) -> Self {
        FieldSpec::weighted(name, weight)
    }
}

/// Accepted JSON shapes: `"name"`, `["name", "A"]`, `{"name": .., "weight": ..}`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FieldSpecRepr {
    Name(String),
    Pair(String, Weight),
    Full {
        name: String,
        #[serde(default)]
        weight: Option<Weight>,
    },
}

impl From<FieldSpecRepr> for FieldSpec {
    fn from(repr: FieldSpecRepr) -> Self {
        match repr {
            FieldSpecRepr::Name(name) => FieldSpec { name, weight: None },
            FieldSpecRepr::Pair(name, weight) => FieldSpec {
                name,
                weight: Some(weight),
            },
            FieldSpecRepr::Full { name, weight } => FieldSpec { name, weight },
        }
    }
}

impl From<FieldSpec> for FieldSpecRepr {
    fn from(spec: FieldSpec) -> Self {
        match spec.weight {
            Some(weight) => FieldSpecRepr::Pair(spec.name, weight),
            None => FieldSpecRepr::Name(spec.name),
        }
    }
}

/// Ordered, duplicate-free set of field declarations.
///
/// Immutable once built. An empty set means "every text column".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct FieldSpecs {
    specs: Vec<FieldSpec>,
}

/// A declaration checked against the schema, with its weight settled.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedField<'a> {
    pub column: &'a Column,
    pub weight: Weight,
}

impl FieldSpecs {
    /// Build from declarations, keeping the first declaration of each name.
    pub fn new<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldSpec>,
    {
        let mut seen = HashSet::new();
        let mut specs = Vec::new();
        for spec in fields.into_iter().map(Into::into) {
            if seen.insert(spec.name.clone()) {
                specs.push(spec);
            } else {
                debug!("Dropping duplicate field declaration: {}", spec.name);
            }
        }
        Self { specs }
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.specs.iter()
    }

    /// Check every declaration against `schema` and settle weights.
    ///
    /// Unknown names and primary-key columns are rejected together in one
    /// error. With no declarations, every non-key text column is used at
    /// `default_weight`.
    pub fn resolve<'a>(
        &self,
        schema: &'a EntitySchema,
        default_weight: Weight,
    ) -> Result<Vec<ResolvedField<'a>>> {
        let resolved: Vec<ResolvedField<'a>> = if self.specs.is_empty() {
            schema
                .text_columns()
                .map(|column| ResolvedField {
                    column,
                    weight: default_weight,
                })
                .collect()
        } else {
            let mut unknown = Vec::new();
            let mut resolved = Vec::with_capacity(self.specs.len());
            for spec in &self.specs {
                match schema.column(&spec.name) {
                    Some(column) if !column.primary_key => resolved.push(ResolvedField {
                        column,
                        weight: spec.resolved_weight(default_weight),
                    }),
                    _ => unknown.push(spec.name.clone()),
                }
            }
            if !unknown.is_empty() {
                return Err(FullTextError::UnknownField {
                    table: schema.table().to_string(),
                    fields: unknown,
                });
            }
            resolved
        };

        if resolved.is_empty() {
            return Err(FullTextError::NoSearchableFields {
                table: schema.table().to_string(),
            });
        }
        Ok(resolved)
    }
}

impl From<Vec<FieldSpec>> for FieldSpecs {
    fn from(specs: Vec<FieldSpec>) -> Self {
        FieldSpecs::new(specs)
    }
}

impl<F: Into<FieldSpec>, const N: usize> From<[F; N]> for FieldSpecs {
    fn from(specs: [F; N]) -> Self {
        FieldSpecs::new(specs)
    }
}

impl From<FieldSpecs> for Vec<FieldSpec> {
    fn from(specs: FieldSpecs) -> Self {
        specs.specs
    }
}

impl<F: Into<FieldSpec>> FromIterator<F> for FieldSpecs {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        FieldSpecs::new(iter)
    }
}
