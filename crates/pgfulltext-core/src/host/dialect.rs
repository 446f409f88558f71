//! Quoting and placeholder rules of the host engine.

/// Identifier quoting, literal quoting and parameter markers for one engine.
///
/// Every literal that ends up inside generated SQL passes through
/// [`SqlDialect::quote_literal`]; nothing else concatenates user text.
pub trait SqlDialect: Send + Sync {
    /// Quote a table or column name.
    fn quote_name(&self, name: &str) -> String;

    /// Quote a text value as a string literal.
    fn quote_literal(&self, value: &str) -> String;

    /// Positional parameter marker for the 1-based `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Render `table.column` with both parts quoted.
    fn qualified_name(&self, table: &str, column: &str) -> String {
        format!("{}.{}", self.quote_name(table), self.quote_name(column))
    }
}

/// A well-formed quoted identifier: wrapped in `"` with every inner `"` doubled.
fn is_quoted_identifier(name: &str) -> bool {
    name.len() >= 2
        && name.starts_with('"')
        && name.ends_with('"')
        && !name[1..name.len() - 1].replace("\"\"", "").contains('"')
}

fn quote_identifier(name: &str) -> String {
    if is_quoted_identifier(name) {
        return name.to_string();
    }
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Literal quoting with `standard_conforming_strings = on`: backslashes are
/// ordinary characters and only single quotes need doubling.
fn quote_standard_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// PostgreSQL: `"name"`, `'literal'`, `$n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn quote_name(&self, name: &str) -> String {
        quote_identifier(name)
    }

    fn quote_literal(&self, value: &str) -> String {
        quote_standard_literal(value)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }
}

/// SQLite: `"name"`, `'literal'`, `?n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn quote_name(&self, name: &str) -> String {
        quote_identifier(name)
    }

    fn quote_literal(&self, value: &str) -> String {
        quote_standard_literal(value)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{}", index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_name() {
        let d = PostgresDialect;
        assert_eq!(d.quote_name("person"), "\"person\"");
        assert_eq!(d.quote_name("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_quote_name_is_idempotent() {
        let d = PostgresDialect;
        assert_eq!(d.quote_name("\"person\""), "\"person\"");
        assert_eq!(d.quote_name(&d.quote_name("person")), "\"person\"");
        assert_eq!(d.quote_name(&d.quote_name("odd\"name")), "\"odd\"\"name\"");
    }

    #[test]
    fn test_malformed_quoted_name_is_requoted() {
        let d = PostgresDialect;
        assert_eq!(d.quote_name("\"a\"b\""), "\"\"\"a\"\"b\"\"\"");
        assert_eq!(
            SqliteDialect.quote_name("\"x\" ; drop table t; --\""),
            "\"\"\"x\"\" ; drop table t; --\"\"\""
        );
        assert_eq!(d.quote_name("\""), "\"\"\"\"");
        assert_eq!(d.quote_name("\"a\"\"\"b\""), "\"\"\"a\"\"\"\"\"\"b\"\"\"");
    }

    #[test]
    fn test_quote_literal_doubles_quotes() {
        let d = PostgresDialect;
        assert_eq!(d.quote_literal("Pepa"), "'Pepa'");
        assert_eq!(d.quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(d.quote_literal("'); DROP TABLE x; --"), "'''); DROP TABLE x; --'");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(PostgresDialect.placeholder(1), "$1");
        assert_eq!(SqliteDialect.placeholder(3), "?3");
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(
            SqliteDialect.qualified_name("person", "name"),
            "\"person\".\"name\""
        );
    }
}
