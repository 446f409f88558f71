//! Free-text search planning.
//!
//! A [`SearchRequest`] is turned into a [`SearchPlan`]: the match predicate,
//! the computed rank/headline columns and the ordering. An empty query plans
//! to nothing at all.

use super::fields::{FieldSpecs, TextSearchConfig};
use crate::config::FullTextDefaults;
use crate::host::{ParamBinder, SqlDialect, SqlValue};
use crate::{FullTextError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// Output names and function names that end up unquoted or quoted in SQL.
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// How the free-text query reaches the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryBinding {
    /// Positional parameter, like structured lookups.
    #[default]
    Bound,
    /// Single-quoted literal embedded in the statement text.
    Inline,
}

/// Relevance score column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSpec {
    pub output_name: String,
    pub function: String,
    pub normalization: i32,
}

impl RankSpec {
    pub fn new(output_name: &str) -> Self {
        Self {
            output_name: output_name.to_string(),
            function: FullTextDefaults::RANK_FUNCTION.to_string(),
            normalization: FullTextDefaults::RANK_NORMALIZATION,
        }
    }

    pub fn function(mut self, function: &str) -> Self {
        self.function = function.to_string();
        self
    }

    pub fn normalization(mut self, normalization: i32) -> Self {
        self.normalization = normalization;
        self
    }

    fn validate(&self) -> Result<()> {
        validate_identifier("rank.output_name", &self.output_name)?;
        validate_identifier("rank.function", &self.function)
    }
}

/// Highlighted excerpt column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineSpec {
    pub output_name: String,
    /// Any expression the engine can evaluate, usually a column reference.
    pub source_expression: String,
}

impl HeadlineSpec {
    pub fn new(output_name: &str, source_expression: &str) -> Self {
        Self {
            output_name: output_name.to_string(),
            source_expression: source_expression.to_string(),
        }
    }
}

fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(FullTextError::validation(
            field,
            format!("'{}' is not a valid identifier", value),
        ))
    }
}

/// A free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// Pass the query to `to_tsquery` as boolean syntax instead of `plainto_tsquery`.
    pub raw: bool,
    /// Overrides the index configuration when set.
    pub config: Option<TextSearchConfig>,
    pub rank: Option<RankSpec>,
    pub headline: Option<HeadlineSpec>,
    /// Search these fields ad hoc instead of the persisted vector.
    pub fields: Option<FieldSpecs>,
}

impl SearchRequest {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Default::default()
        }
    }

    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn config(mut self, config: TextSearchConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn rank(mut self, rank: RankSpec) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn headline(mut self, headline: HeadlineSpec) -> Self {
        self.headline = Some(headline);
        self
    }

    pub fn fields(mut self, fields: impl Into<FieldSpecs>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    /// True when the query is empty and the search is a no-op.
    ///
    /// Whitespace is still a query: it yields no lexemes and matches nothing.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn descending(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: SortDirection::Descending,
        }
    }
}

/// A named computed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectExtra {
    pub name: String,
    pub expression: String,
}

/// Everything a caller needs to run a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchPlan {
    /// `None` means every row passes.
    pub predicate: Option<String>,
    pub params: Vec<SqlValue>,
    pub select_extras: Vec<SelectExtra>,
    pub order_by: Vec<OrderBy>,
}

impl SearchPlan {
    pub fn is_noop(&self) -> bool {
        self.predicate.is_none() && self.select_extras.is_empty() && self.order_by.is_empty()
    }

    pub fn extra(&self, name: &str) -> Option<&str> {
        self.select_extras
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.expression.as_str())
    }

    /// Render `SELECT <table>.*, <extras> FROM <table> [WHERE ..] [ORDER BY ..]`.
    ///
    /// Placeholders in the result refer to [`SearchPlan::params`].
    pub fn to_select_sql(&self, table: &str, dialect: &dyn SqlDialect) -> String {
        let table = dialect.quote_name(table);
        let mut columns = vec![format!("{}.*", table)];
        columns.extend(
            self.select_extras
                .iter()
                .map(|e| format!("{} AS {}", e.expression, dialect.quote_name(&e.name))),
        );

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), table);
        if let Some(predicate) = &self.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|o| {
                    let direction = match o.direction {
                        SortDirection::Ascending => "ASC",
                        SortDirection::Descending => "DESC",
                    };
                    format!("{} {}", dialect.quote_name(&o.column), direction)
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        sql
    }
}

impl fmt::Display for SearchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.predicate {
            Some(predicate) => f.write_str(predicate),
            None => f.write_str("<all rows>"),
        }
    }
}

/// Plans free-text searches for one entity.
pub struct SearchPlanner<'a> {
    dialect: &'a dyn SqlDialect,
    binding: QueryBinding,
    config: &'a TextSearchConfig,
}

impl<'a> SearchPlanner<'a> {
    pub fn new(dialect: &'a dyn SqlDialect, binding: QueryBinding, config: &'a TextSearchConfig) -> Self {
        Self {
            dialect,
            binding,
            config,
        }
    }

    /// Plan `request` against the document produced by `document`.
    ///
    /// `document` is only called for non-empty queries, so a missing search
    /// field never fails a no-op search.
    pub fn plan<F>(&self, request: &SearchRequest, document: F) -> Result<SearchPlan>
    where
        F: FnOnce() -> Result<String>,
    {
        if request.is_empty() {
            return Ok(SearchPlan::default());
        }
        if let Some(rank) = &request.rank {
            rank.validate()?;
        }
        if let Some(headline) = &request.headline {
            validate_identifier("headline.output_name", &headline.output_name)?;
        }

        let document = document()?;
        let config = self
            .dialect
            .quote_literal(request.config.as_ref().unwrap_or(self.config).name());
        let function = if request.raw { "to_tsquery" } else { "plainto_tsquery" };

        let mut binder = ParamBinder::new(self.dialect);
        let query = match self.binding {
            QueryBinding::Bound => binder.bind(request.query.as_str()),
            QueryBinding::Inline => self.dialect.quote_literal(&request.query),
        };
        let tsquery = format!("{}({}, {})", function, config, query);

        let mut plan = SearchPlan {
            predicate: Some(format!("({}) @@ ({})", document, tsquery)),
            params: binder.into_params(),
            ..Default::default()
        };

        if let Some(rank) = &request.rank {
            plan.select_extras.push(SelectExtra {
                name: rank.output_name.clone(),
                expression: format!(
                    "{}({}, {}, {})",
                    rank.function, document, tsquery, rank.normalization
                ),
            });
            plan.order_by = vec![OrderBy::descending(&rank.output_name)];
        }

        if let Some(headline) = &request.headline {
            plan.select_extras.push(SelectExtra {
                name: headline.output_name.clone(),
                expression: format!(
                    "{}({}, {}, {})",
                    FullTextDefaults::HEADLINE_FUNCTION,
                    config,
                    headline.source_expression,
                    tsquery
                ),
            });
        }

        debug!(
            "Planned {} search with {} extra column(s)",
            function,
            plan.select_extras.len()
        );
        Ok(plan)
    }
}
