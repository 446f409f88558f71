//! Structured full-text lookups: exact, prefix and negated-prefix term lists.
//!
//! Terms are escaped and joined into a `tsquery` expression which is passed as
//! a bound parameter:
//! - `["foo", "bar"]` exact → `'foo' & 'bar'`
//! - `["foo", "bar"]` prefix → `'foo':* & 'bar':*`
//! - `["foo"]` negated prefix → `!'foo':*`

use super::fields::TextSearchConfig;
use crate::host::{ParamBinder, SqlDialect, SqlValue};
use crate::{FullTextError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const PREFIX_MARKER: &str = ":*";
const NEGATION_MARKER: &str = "!";
const AND_OPERATOR: &str = " & ";

/// How each term is turned into a `tsquery` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Exact,
    Prefix,
    NegatedPrefix,
}

impl LookupKind {
    pub const ALL: [LookupKind; 3] = [LookupKind::Exact, LookupKind::Prefix, LookupKind::NegatedPrefix];

    /// Name of the lookup in predicate-building APIs.
    pub fn lookup_name(&self) -> &'static str {
        match self {
            LookupKind::Exact => "ft",
            LookupKind::Prefix => "ft_startswith",
            LookupKind::NegatedPrefix => "ft_not_startswith",
        }
    }

    pub fn from_lookup_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.lookup_name() == name)
    }

    /// Render one literal as a query token.
    pub fn transform(&self, term: &str, dialect: &dyn SqlDialect) -> String {
        let quoted = escape_term(term, dialect);
        match self {
            LookupKind::Exact => quoted,
            LookupKind::Prefix => format!("{}{}", quoted, PREFIX_MARKER),
            LookupKind::NegatedPrefix => format!("{}{}{}", NEGATION_MARKER, quoted, PREFIX_MARKER),
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.lookup_name())
    }
}

/// Quote a literal for use inside a `tsquery`.
///
/// Backslashes are removed first; quoting itself is left to the dialect.
pub fn escape_term(term: &str, dialect: &dyn SqlDialect) -> String {
    dialect.quote_literal(&term.replace('\\', ""))
}

/// One element of a raw term sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermToken {
    Config(TextSearchConfig),
    Literal(String),
}

impl From<&str> for TermToken {
    fn from(value: &str) -> Self {
        TermToken::Literal(value.to_string())
    }
}

impl From<TextSearchConfig> for TermToken {
    fn from(value: TextSearchConfig) -> Self {
        TermToken::Config(value)
    }
}

/// The right-hand side of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    Literal(String),
    Conjunction {
        config: Option<TextSearchConfig>,
        terms: Vec<String>,
    },
}

impl SearchTerm {
    pub fn terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SearchTerm::Conjunction {
            config: None,
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_config<I, S>(config: TextSearchConfig, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SearchTerm::Conjunction {
            config: Some(config),
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from a raw sequence whose first element may name a configuration.
    ///
    /// A configuration anywhere but first is rejected.
    pub fn from_tokens<I>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = TermToken>,
    {
        let mut tokens = tokens.into_iter().peekable();
        let config = match tokens.peek() {
            Some(TermToken::Config(_)) => match tokens.next() {
                Some(TermToken::Config(config)) => Some(config),
                _ => None,
            },
            _ => None,
        };

        let mut terms = Vec::new();
        for token in tokens {
            match token {
                TermToken::Literal(term) => terms.push(term),
                TermToken::Config(config) => {
                    return Err(FullTextError::validation(
                        "terms",
                        format!("configuration {} must be the first element", config),
                    ))
                }
            }
        }
        Ok(SearchTerm::Conjunction { config, terms })
    }

    fn parts(&self) -> (Option<&TextSearchConfig>, Vec<&str>) {
        match self {
            SearchTerm::Literal(term) => (None, vec![term.as_str()]),
            SearchTerm::Conjunction { config, terms } => {
                (config.as_ref(), terms.iter().map(String::as_str).collect())
            }
        }
    }
}

impl From<&str> for SearchTerm {
    fn from(value: &str) -> Self {
        SearchTerm::Literal(value.to_string())
    }
}

impl From<String> for SearchTerm {
    fn from(value: String) -> Self {
        SearchTerm::Literal(value)
    }
}

impl From<Vec<String>> for SearchTerm {
    fn from(value: Vec<String>) -> Self {
        SearchTerm::terms(value)
    }
}

impl From<Vec<&str>> for SearchTerm {
    fn from(value: Vec<&str>) -> Self {
        SearchTerm::terms(value)
    }
}

/// Join the transformed terms with `&`.
pub fn compile_terms(kind: LookupKind, terms: &[&str], dialect: &dyn SqlDialect) -> Result<String> {
    if terms.is_empty() {
        return Err(FullTextError::EmptyTerms);
    }
    Ok(terms
        .iter()
        .map(|term| kind.transform(term, dialect))
        .collect::<Vec<_>>()
        .join(AND_OPERATOR))
}

/// Render `<document> @@ to_tsquery([$n::regconfig,] $m)`, binding into `binder`.
pub fn render_lookup(
    kind: LookupKind,
    document: &str,
    term: &SearchTerm,
    binder: &mut ParamBinder<'_>,
) -> Result<String> {
    let (config, terms) = term.parts();
    let query = compile_terms(kind, &terms, binder.dialect())?;

    let sql = match config {
        Some(config) => {
            let config_param = binder.bind(config.name());
            let query_param = binder.bind(query);
            format!(
                "{} @@ to_tsquery({}::regconfig, {})",
                document, config_param, query_param
            )
        }
        None => {
            let query_param = binder.bind(query);
            format!("{} @@ to_tsquery({})", document, query_param)
        }
    };
    debug!("Compiled {} lookup on {}", kind, document);
    Ok(sql)
}

/// A lookup predicate template and the parameters to bind, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledLookup {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Compile a lookup as a standalone predicate with parameters numbered from 1.
pub fn compile(
    kind: LookupKind,
    document: &str,
    term: &SearchTerm,
    dialect: &dyn SqlDialect,
) -> Result<CompiledLookup> {
    let mut binder = ParamBinder::new(dialect);
    let sql = render_lookup(kind, document, term, &mut binder)?;
    Ok(CompiledLookup {
        sql,
        params: binder.into_params(),
    })
}

/// Column reference used as the left-hand side of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            column: column.to_string(),
        }
    }

    pub fn bare(column: &str) -> Self {
        Self {
            table: None,
            column: column.to_string(),
        }
    }

    pub fn render(&self, dialect: &dyn SqlDialect) -> String {
        match &self.table {
            Some(table) => dialect.qualified_name(table, &self.column),
            None => dialect.quote_name(&self.column),
        }
    }
}

/// A full-text predicate over a vector column, usable in any WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub kind: LookupKind,
    pub field: ColumnRef,
    pub term: SearchTerm,
}

impl Lookup {
    pub fn new(kind: LookupKind, field: ColumnRef, term: impl Into<SearchTerm>) -> Self {
        Self {
            kind,
            field,
            term: term.into(),
        }
    }

    pub fn exact(field: ColumnRef, term: impl Into<SearchTerm>) -> Self {
        Self::new(LookupKind::Exact, field, term)
    }

    pub fn prefix(field: ColumnRef, term: impl Into<SearchTerm>) -> Self {
        Self::new(LookupKind::Prefix, field, term)
    }

    pub fn negated_prefix(field: ColumnRef, term: impl Into<SearchTerm>) -> Self {
        Self::new(LookupKind::NegatedPrefix, field, term)
    }

    /// Render into a larger statement, sharing its parameter numbering.
    pub fn to_sql(&self, binder: &mut ParamBinder<'_>) -> Result<String> {
        let document = self.field.render(binder.dialect());
        render_lookup(self.kind, &document, &self.term, binder)
    }

    /// Render as a standalone predicate.
    pub fn compile(&self, dialect: &dyn SqlDialect) -> Result<CompiledLookup> {
        let document = self.field.render(dialect);
        compile(self.kind, &document, &self.term, dialect)
    }
}

pub fn exact_match(field: ColumnRef, term: impl Into<SearchTerm>) -> Lookup {
    Lookup::exact(field, term)
}

pub fn prefix_match(field: ColumnRef, term: impl Into<SearchTerm>) -> Lookup {
    Lookup::prefix(field, term)
}

pub fn negated_prefix_match(field: ColumnRef, term: impl Into<SearchTerm>) -> Lookup {
    Lookup::negated_prefix(field, term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{PostgresDialect, SqliteDialect};

    fn text(params: &[SqlValue]) -> Vec<String> {
        params.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_exact_single_literal() {
        let compiled = compile(LookupKind::Exact, "\"search_index\"", &"Foobar".into(), &PostgresDialect).unwrap();
        assert_eq!(compiled.sql, "\"search_index\" @@ to_tsquery($1)");
        assert_eq!(text(&compiled.params), vec!["'Foobar'"]);
    }

    #[test]
    fn test_prefix_conjunction() {
        let term = SearchTerm::terms(["foo", "bar"]);
        let compiled = compile(LookupKind::Prefix, "doc", &term, &PostgresDialect).unwrap();
        assert_eq!(text(&compiled.params), vec!["'foo':* & 'bar':*"]);
    }

    #[test]
    fn test_negated_prefix() {
        let compiled = compile(LookupKind::NegatedPrefix, "doc", &"foo".into(), &PostgresDialect).unwrap();
        assert_eq!(text(&compiled.params), vec!["!'foo':*"]);

        let term = SearchTerm::terms(["Foobar", "Baz"]);
        let compiled = compile(LookupKind::NegatedPrefix, "doc", &term, &PostgresDialect).unwrap();
        assert_eq!(text(&compiled.params), vec!["!'Foobar':* & !'Baz':*"]);
    }

    #[test]
    fn test_config_is_first_parameter() {
        let french = TextSearchConfig::new("french").unwrap();
        let term = SearchTerm::with_config(french, ["Le Foobar", "Le Baz"]);
        let compiled = compile(LookupKind::Exact, "doc", &term, &PostgresDialect).unwrap();
        assert_eq!(compiled.sql, "doc @@ to_tsquery($1::regconfig, $2)");
        assert_eq!(text(&compiled.params), vec!["french", "'Le Foobar' & 'Le Baz'"]);
    }

    #[test]
    fn test_quotes_and_backslashes_are_neutralized() {
        let compiled = compile(LookupKind::Exact, "doc", &"O'Re\\'illy".into(), &PostgresDialect).unwrap();
        assert_eq!(text(&compiled.params), vec!["'O''Re''illy'"]);
        assert!(!compiled.sql.contains("Re"));
    }

    #[test]
    fn test_escaping_cases() {
        let cases = [
            ("plain", "'plain'"),
            ("it's", "'it''s'"),
            ("''", "''''''"),
            ("back\\slash", "'backslash'"),
            ("\\'", "''''"),
            ("a\\'b'c", "'a''b''c'"),
            ("'); drop table person; --", "'''); drop table person; --'"),
        ];
        for (input, expected) in cases {
            let compiled = compile(LookupKind::Exact, "doc", &input.into(), &PostgresDialect).unwrap();
            assert_eq!(text(&compiled.params), vec![expected], "input {:?}", input);
            assert_eq!(compiled.sql, "doc @@ to_tsquery($1)");

            let compiled = compile(LookupKind::NegatedPrefix, "doc", &input.into(), &SqliteDialect).unwrap();
            assert_eq!(text(&compiled.params), vec![format!("!{}:*", expected)]);
        }
    }

    #[test]
    fn test_empty_terms() {
        let err = compile(LookupKind::Prefix, "doc", &SearchTerm::terms(Vec::<String>::new()), &PostgresDialect)
            .unwrap_err();
        assert!(matches!(err, FullTextError::EmptyTerms));

        let only_config = SearchTerm::from_tokens([TermToken::Config(TextSearchConfig::default())]).unwrap();
        let err = compile(LookupKind::Exact, "doc", &only_config, &PostgresDialect).unwrap_err();
        assert!(matches!(err, FullTextError::EmptyTerms));
    }

    #[test]
    fn test_from_tokens_extracts_leading_config() {
        let simple = TextSearchConfig::new("simple").unwrap();
        let term = SearchTerm::from_tokens([
            TermToken::from(simple.clone()),
            TermToken::from("a"),
            TermToken::from("b"),
        ]).unwrap();
        assert_eq!(term, SearchTerm::with_config(simple.clone(), ["a", "b"]));

        let err = SearchTerm::from_tokens([TermToken::from("a"), TermToken::from(simple)]).unwrap_err();
        assert!(matches!(err, FullTextError::Validation { .. }));
    }

    #[test]
    fn test_lookup_names() {
        for kind in LookupKind::ALL {
            assert_eq!(LookupKind::from_lookup_name(kind.lookup_name()), Some(kind));
        }
        assert_eq!(LookupKind::from_lookup_name("ft_endswith"), None);
    }

    #[test]
    fn test_lookup_embeds_with_shared_numbering() {
        let mut binder = ParamBinder::starting_at(&SqliteDialect, 2);
        let lookup = prefix_match(ColumnRef::new("book", "search_index"), vec!["rust", "sql"]);
        let sql = lookup.to_sql(&mut binder).unwrap();
        assert_eq!(sql, "\"book\".\"search_index\" @@ to_tsquery(?2)");
        assert_eq!(text(binder.params()), vec!["'rust':* & 'sql':*"]);
    }

    #[test]
    fn test_operator_constructors() {
        let field = ColumnRef::bare("search_index");
        assert_eq!(exact_match(field.clone(), "a").kind, LookupKind::Exact);
        assert_eq!(negated_prefix_match(field.clone(), "a").kind, LookupKind::NegatedPrefix);
        let compiled = negated_prefix_match(field, "a").compile(&PostgresDialect).unwrap();
        assert_eq!(compiled.sql, "\"search_index\" @@ to_tsquery($1)");
    }
}
