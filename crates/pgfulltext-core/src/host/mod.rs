//! Primitives consumed from the host database engine.
//!
//! This module provides:
//! - Identifier/literal quoting and placeholder rules ([`SqlDialect`])
//! - Bound parameter values and positional binding ([`SqlValue`], [`ParamBinder`])
//! - Transactional statement execution ([`HostConnection`], [`with_transaction`])
//! - A rusqlite-backed implementation ([`sqlite`])

mod dialect;
pub mod sqlite;

pub use dialect::{PostgresDialect, SqlDialect, SqliteDialect};

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use tracing::{debug, error, trace};

/// A value bound to a positional statement parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Integer(i64),
    Text(String),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Integer(v) => write!(f, "{}", v),
            SqlValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

/// Collects bound parameters and hands out matching placeholders.
///
/// Numbering starts at 1 unless the fragment is going to be embedded after
/// parameters the caller already bound (see [`ParamBinder::starting_at`]).
pub struct ParamBinder<'a> {
    dialect: &'a dyn SqlDialect,
    first_index: usize,
    params: Vec<SqlValue>,
}

impl<'a> ParamBinder<'a> {
    pub fn new(dialect: &'a dyn SqlDialect) -> Self {
        Self::starting_at(dialect, 1)
    }

    /// Start numbering at `first_index` (1-based).
    pub fn starting_at(dialect: &'a dyn SqlDialect, first_index: usize) -> Self {
        Self {
            dialect,
            first_index: first_index.max(1),
            params: Vec::new(),
        }
    }

    pub fn dialect(&self) -> &'a dyn SqlDialect {
        self.dialect
    }

    /// Bind a value and return the placeholder that refers to it.
    pub fn bind(&mut self, value: impl Into<SqlValue>) -> String {
        self.params.push(value.into());
        self.dialect
            .placeholder(self.first_index + self.params.len() - 1)
    }

    /// Bind a list of values, returning their comma separated placeholders.
    pub fn bind_list<I, V>(&mut self, values: I) -> String
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        values
            .into_iter()
            .map(|v| self.bind(v))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    pub fn into_params(self) -> Vec<SqlValue> {
        self.params
    }
}

/// A connection to the host engine able to run statements in a transaction.
///
/// Implementations are passed explicitly to every operation that touches the
/// database; the library never holds a connection of its own.
pub trait HostConnection {
    /// Quoting and placeholder rules matching this connection.
    fn dialect(&self) -> &dyn SqlDialect;

    /// True while a transaction opened by the caller is still pending.
    fn in_transaction(&self) -> bool;

    fn begin(&mut self) -> Result<()>;

    /// Execute one statement, returning the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;
}

/// Run `f` inside a transaction on `conn`.
///
/// Commits when `f` succeeds, rolls back when it returns an error and rolls
/// back before re-raising when it panics. If the caller already opened a
/// transaction, `f` runs inside it and the caller keeps ownership of the
/// commit or rollback.
pub fn with_transaction<C, F, T>(conn: &mut C, f: F) -> Result<T>
where
    C: HostConnection + ?Sized,
    F: FnOnce(&mut C) -> Result<T>,
{
    if conn.in_transaction() {
        trace!("joining caller-managed transaction");
        return f(conn);
    }

    conn.begin()?;
    trace!("started transaction");

    let outcome = catch_unwind(AssertUnwindSafe(|| f(&mut *conn)));

    match outcome {
        Ok(Ok(value)) => {
            if let Err(commit_err) = conn.commit() {
                let _ = conn.rollback();
                return Err(commit_err);
            }
            trace!("transaction committed");
            Ok(value)
        }
        Ok(Err(err)) => {
            let _ = conn.rollback();
            debug!(?err, "transaction rolled back due to error");
            Err(err)
        }
        Err(payload) => {
            let _ = conn.rollback();
            error!("transaction rolled back after panic");
            resume_unwind(payload);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::FullTextError;

    /// Records every call so tests can assert on the exact statement flow.
    #[derive(Default)]
    pub struct RecordingConnection {
        pub log: Vec<String>,
        pub statements: Vec<(String, Vec<SqlValue>)>,
        pub fail_execute: Option<String>,
        pub open: bool,
    }

    impl HostConnection for RecordingConnection {
        fn dialect(&self) -> &dyn SqlDialect {
            &PostgresDialect
        }

        fn in_transaction(&self) -> bool {
            self.open
        }

        fn begin(&mut self) -> Result<()> {
            self.open = true;
            self.log.push("BEGIN".into());
            Ok(())
        }

        fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize> {
            self.log.push("EXECUTE".into());
            self.statements.push((sql.to_string(), params.to_vec()));
            match &self.fail_execute {
                Some(message) => Err(FullTextError::Execution {
                    message: message.clone(),
                }),
                None => Ok(params.len().max(1)),
            }
        }

        fn commit(&mut self) -> Result<()> {
            self.open = false;
            self.log.push("COMMIT".into());
            Ok(())
        }

        fn rollback(&mut self) -> Result<()> {
            self.open = false;
            self.log.push("ROLLBACK".into());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingConnection;
    use super::*;
    use crate::FullTextError;

    #[test]
    fn test_binder_numbers_placeholders() {
        let mut binder = ParamBinder::new(&PostgresDialect);
        assert_eq!(binder.bind("a"), "$1");
        assert_eq!(binder.bind(7i64), "$2");
        assert_eq!(
            binder.into_params(),
            vec![SqlValue::Text("a".into()), SqlValue::Integer(7)]
        );
    }

    #[test]
    fn test_binder_offset_and_list() {
        let mut binder = ParamBinder::starting_at(&SqliteDialect, 3);
        assert_eq!(binder.bind_list([1i64, 2, 3]), "?3,?4,?5");
        assert_eq!(binder.params().len(), 3);
    }

    #[test]
    fn test_transaction_commits_on_success() {
        let mut conn = RecordingConnection::default();
        let rows = with_transaction(&mut conn, |c| c.execute("UPDATE t SET x = 1", &[])).unwrap();
        assert_eq!(rows, 1);
        assert_eq!(conn.log, vec!["BEGIN", "EXECUTE", "COMMIT"]);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut conn = RecordingConnection {
            fail_execute: Some("constraint violated".into()),
            ..Default::default()
        };
        let result = with_transaction(&mut conn, |c| c.execute("UPDATE t SET x = 1", &[]));
        assert!(matches!(result, Err(FullTextError::Execution { .. })));
        assert_eq!(conn.log, vec!["BEGIN", "EXECUTE", "ROLLBACK"]);
        assert!(!conn.in_transaction());
    }

    #[test]
    fn test_transaction_rolls_back_on_panic() {
        let mut conn = RecordingConnection::default();
        let panicked = catch_unwind(AssertUnwindSafe(|| {
            let _: Result<()> = with_transaction(&mut conn, |_| panic!("forced panic"));
        }));
        assert!(panicked.is_err());
        assert_eq!(conn.log, vec!["BEGIN", "ROLLBACK"]);
    }

    #[test]
    fn test_transaction_joins_open_transaction() {
        let mut conn = RecordingConnection {
            open: true,
            ..Default::default()
        };
        with_transaction(&mut conn, |c| c.execute("UPDATE t SET x = 1", &[])).unwrap();
        assert_eq!(conn.log, vec!["EXECUTE"]);
        assert!(conn.in_transaction());
    }
}
