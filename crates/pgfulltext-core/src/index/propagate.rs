//! Writes the search document back into the persisted vector column.

use super::vector::VectorExpression;
use crate::host::{with_transaction, HostConnection, ParamBinder, SqlDialect, SqlValue};
use crate::schema::EntitySchema;
use crate::{FullTextError, Result};
use tracing::{debug, info};

/// Rows an update touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateScope {
    One(SqlValue),
    Many(Vec<SqlValue>),
    All,
}

impl UpdateScope {
    pub fn keys<I, V>(keys: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        UpdateScope::Many(keys.into_iter().map(Into::into).collect())
    }
}

impl From<SqlValue> for UpdateScope {
    fn from(key: SqlValue) -> Self {
        UpdateScope::One(key)
    }
}

impl From<Vec<SqlValue>> for UpdateScope {
    fn from(keys: Vec<SqlValue>) -> Self {
        UpdateScope::Many(keys)
    }
}

/// A ready-to-execute `UPDATE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Build `UPDATE <table> SET <search_column> = <vector> [WHERE <pk> IN (..)]`.
///
/// Returns `None` when the scope selects no keys.
pub fn update_statement(
    schema: &EntitySchema,
    search_column: &str,
    vector: &VectorExpression,
    scope: &UpdateScope,
    dialect: &dyn SqlDialect,
) -> Result<Option<UpdateStatement>> {
    let keys: &[SqlValue] = match scope {
        UpdateScope::All => &[],
        UpdateScope::One(key) => std::slice::from_ref(key),
        UpdateScope::Many(keys) if keys.is_empty() => return Ok(None),
        UpdateScope::Many(keys) => keys,
    };

    let mut sql = format!(
        "UPDATE {} SET {} = {}",
        dialect.quote_name(schema.table()),
        dialect.quote_name(search_column),
        vector
    );

    let mut binder = ParamBinder::new(dialect);
    if !matches!(scope, UpdateScope::All) {
        let pk = schema
            .primary_key()
            .ok_or_else(|| FullTextError::MissingPrimaryKey {
                table: schema.table().to_string(),
            })?;
        let placeholders = binder.bind_list(keys.iter().cloned());
        sql.push_str(&format!(
            " WHERE {} IN ({})",
            dialect.quote_name(&pk.column),
            placeholders
        ));
    }

    Ok(Some(UpdateStatement {
        sql,
        params: binder.into_params(),
    }))
}

/// Recompute and store the vector for `scope` in one transaction.
///
/// Joins the caller's transaction if one is open. Returns the affected row count.
pub fn propagate<C>(
    conn: &mut C,
    schema: &EntitySchema,
    search_column: &str,
    vector: &VectorExpression,
    scope: &UpdateScope,
) -> Result<usize>
where
    C: HostConnection + ?Sized,
{
    let statement = match update_statement(schema, search_column, vector, scope, conn.dialect())? {
        Some(statement) => statement,
        None => {
            debug!("No keys to update in {}", schema.table());
            return Ok(0);
        }
    };

    let rows = with_transaction(conn, |conn| conn.execute(&statement.sql, &statement.params))?;
    info!(
        "Updated {} on {} row(s) of {}",
        search_column,
        rows,
        schema.table()
    );
    Ok(rows)
}
