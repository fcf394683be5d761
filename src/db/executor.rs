//! Executor contract
//!
//! The only interface repositories depend on. Implemented by a bare
//! connection (each `transaction` call opens and commits its own transaction)
//! and by an open transaction (`transaction` reuses it, so nested repository
//! calls share one atomic unit).

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Params, Row, Transaction};

use crate::error::Result;

/// Build a value from one result row
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

pub trait Executor {
    /// Execute a statement, returning the number of changed rows
    fn run<P: Params>(&self, sql: &str, params: P) -> Result<usize>;

    fn get_all<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<Vec<T>>;

    fn get_first<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<Option<T>>;

    /// Run `f` atomically; an `Err` from `f` rolls everything back
    fn transaction<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction<'_>) -> Result<R>;

    /// Row id assigned by the last successful INSERT
    fn last_insert_id(&self) -> i64;
}

fn run_on<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<usize> {
    Ok(conn.execute(sql, params)?)
}

fn get_all_on<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<T>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params, T::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn get_first_on<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<T>> {
    Ok(conn.query_row(sql, params, T::from_row).optional()?)
}

impl Executor for Connection {
    fn run<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        run_on(self, sql, params)
    }

    fn get_all<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<Vec<T>> {
        get_all_on(self, sql, params)
    }

    fn get_first<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<Option<T>> {
        get_first_on(self, sql, params)
    }

    fn transaction<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction<'_>) -> Result<R>,
    {
        // Dropping the transaction without commit rolls it back
        let tx = self.unchecked_transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn last_insert_id(&self) -> i64 {
        self.last_insert_rowid()
    }
}

impl Executor for Transaction<'_> {
    fn run<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        run_on(self, sql, params)
    }

    fn get_all<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<Vec<T>> {
        get_all_on(self, sql, params)
    }

    fn get_first<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<Option<T>> {
        get_first_on(self, sql, params)
    }

    fn transaction<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction<'_>) -> Result<R>,
    {
        f(self)
    }

    fn last_insert_id(&self) -> i64 {
        self.last_insert_rowid()
    }
}

// =============================================================================
// Scalar rows
// =============================================================================

impl FromRow for i64 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

impl FromRow for Option<i64> {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

impl FromRow for String {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

/// Error for a text column holding a value the model does not know
pub(crate) fn invalid_text(column: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Text,
        format!("unexpected value '{}'", value).into(),
    )
}
