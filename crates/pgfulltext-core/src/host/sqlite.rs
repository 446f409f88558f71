//! rusqlite implementation of the host engine primitives.

use super::{HostConnection, SqlDialect, SqlValue, SqliteDialect};
use crate::schema::{Column, ColumnKind, EntitySchema};
use crate::{FullTextError, Result};
use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tracing::debug;

static SQLITE_DIALECT: SqliteDialect = SqliteDialect;

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Integer(v) => ToSqlOutput::from(*v),
            SqlValue::Text(v) => ToSqlOutput::from(v.as_str()),
        })
    }
}

impl HostConnection for Connection {
    fn dialect(&self) -> &dyn SqlDialect {
        &SQLITE_DIALECT
    }

    fn in_transaction(&self) -> bool {
        !self.is_autocommit()
    }

    fn begin(&mut self) -> Result<()> {
        self.execute_batch("BEGIN;")?;
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        let rows = Connection::execute(self, sql, params_from_iter(params.iter()))?;
        Ok(rows)
    }

    fn commit(&mut self) -> Result<()> {
        self.execute_batch("COMMIT;")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.execute_batch("ROLLBACK;")?;
        Ok(())
    }
}

/// Open (or create) a database file with the library's connection settings.
pub fn open_database(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| FullTextError::Execution {
                message: format!("Failed to create directory {}: {}", parent.display(), e),
            })?;
        }
    }

    let conn = Connection::open(db_path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode=WAL;
        PRAGMA busy_timeout=30000;
        PRAGMA synchronous=NORMAL;
        ",
    )?;
    Ok(())
}

/// Map a declared SQLite column type onto a [`ColumnKind`].
pub fn column_kind(declared: &str) -> ColumnKind {
    let declared = declared.to_ascii_uppercase();
    if declared.contains("TSVECTOR") {
        ColumnKind::Vector
    } else if declared.contains("JSON") {
        ColumnKind::Json
    } else if declared.contains("CHAR") || declared.contains("TEXT") || declared.contains("CLOB") {
        ColumnKind::Text
    } else if declared.contains("BOOL") {
        ColumnKind::Boolean
    } else if declared.contains("INT") {
        ColumnKind::Integer
    } else if declared.contains("REAL") || declared.contains("FLOA") || declared.contains("DOUB") {
        ColumnKind::Real
    } else {
        ColumnKind::Other
    }
}

/// Build an [`EntitySchema`] for `table` from `PRAGMA table_info`.
pub fn introspect_schema(conn: &Connection, table: &str) -> Result<EntitySchema> {
    let sql = format!(
        "PRAGMA table_info({})",
        SQLITE_DIALECT.quote_name(table)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        let name: String = row.get(1)?;
        let declared: String = row.get(2)?;
        let pk: i64 = row.get(5)?;
        Ok((name, declared, pk))
    })?;

    let mut schema = EntitySchema::new(table);
    for row in rows {
        let (name, declared, pk) = row?;
        let mut column = Column::new(&name, column_kind(&declared));
        if pk > 0 {
            column = column.primary_key();
        }
        schema = schema.with_column(column);
    }

    if schema.columns().is_empty() {
        return Err(FullTextError::EntityNotFound {
            name: table.to_string(),
        });
    }

    debug!("Introspected {} columns from {}", schema.columns().len(), table);
    Ok(schema)
}
