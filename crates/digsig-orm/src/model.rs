//! Record descriptors and the operations shared by every record kind.
//!
//! Each record struct implements [`Model`], declaring its table, its column
//! list and how a row maps onto the struct. The free functions in this
//! module ([`get`], [`find`], [`list`], [`count`], [`delete`]) then work for
//! any record kind; record-specific creation and update logic lives next to
//! each struct.

use digsig_types::EntityKind;
use rusqlite::{Connection, OptionalExtension, Params, Row};

use crate::error::OrmError;

/// A record type mapped onto one table.
pub trait Model: Sized {
    /// The record kind, which also names the backing table.
    const KIND: EntityKind;

    /// Column names in the order [`Model::from_row`] reads them. The primary
    /// key `id` comes first.
    const COLUMNS: &'static [&'static str];

    /// Builds a record from a row selected with [`Model::COLUMNS`].
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Returns the primary key.
    fn id(&self) -> i64;

    /// Returns the backing table name.
    fn table() -> &'static str {
        Self::KIND.table()
    }

    /// Re-reads this record from the database.
    fn reload(&self, conn: &Connection) -> Result<Self, OrmError> {
        get(conn, self.id())
    }
}

/// `SELECT <columns> FROM <table>` for `M`, without any clause.
pub(crate) fn select_sql<M: Model>() -> String {
    format!("SELECT {} FROM {}", M::COLUMNS.join(", "), M::table())
}

/// `RETURNING <columns>` for `M`, appended to inserts and updates.
pub(crate) fn returning_sql<M: Model>() -> String {
    format!("RETURNING {}", M::COLUMNS.join(", "))
}

/// Selects all records of `M` matching `clause` (a `WHERE`/`ORDER BY`/`LIMIT`
/// tail).
pub(crate) fn select_where<M: Model, P: Params>(
    conn: &Connection,
    clause: &str,
    params: P,
) -> Result<Vec<M>, OrmError> {
    let sql = format!("{} {}", select_sql::<M>(), clause);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, M::from_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

/// Selects the first record of `M` matching `clause`, if any.
pub(crate) fn select_first<M: Model, P: Params>(
    conn: &Connection,
    clause: &str,
    params: P,
) -> Result<Option<M>, OrmError> {
    let sql = format!("{} {} LIMIT 1", select_sql::<M>(), clause);
    Ok(conn.query_row(&sql, params, M::from_row).optional()?)
}

/// Runs an `INSERT ... RETURNING` statement and maps the new row onto `M`.
pub(crate) fn insert_returning<M: Model, P: Params>(
    conn: &Connection,
    statement: &str,
    params: P,
) -> Result<M, OrmError> {
    let sql = format!("{} {}", statement, returning_sql::<M>());
    let record = conn.query_row(&sql, params, M::from_row)?;
    tracing::debug!(table = M::table(), id = record.id(), "created record");
    Ok(record)
}

/// Runs an `UPDATE ... RETURNING` statement and maps the updated row onto
/// `M`. Returns `None` when the statement matched no row.
pub(crate) fn update_returning<M: Model, P: Params>(
    conn: &Connection,
    statement: &str,
    params: P,
) -> Result<Option<M>, OrmError> {
    let sql = format!("{} {}", statement, returning_sql::<M>());
    Ok(conn.query_row(&sql, params, M::from_row).optional()?)
}

/// Returns the record with the given primary key, or `None`.
///
/// # Errors
///
/// Returns `OrmError::Database` on SQL failure.
pub fn find<M: Model>(conn: &Connection, id: i64) -> Result<Option<M>, OrmError> {
    select_first(conn, "WHERE id = ?1", [id])
}

/// Returns the record with the given primary key.
///
/// # Errors
///
/// Returns `OrmError::NotFound` if no such record exists, or
/// `OrmError::Database` on SQL failure.
pub fn get<M: Model>(conn: &Connection, id: i64) -> Result<M, OrmError> {
    find(conn, id)?.ok_or(OrmError::NotFound {
        table: M::table(),
        id,
    })
}

/// Returns every record of `M`, ascending by primary key.
///
/// # Errors
///
/// Returns `OrmError::Database` on SQL failure.
pub fn list<M: Model>(conn: &Connection) -> Result<Vec<M>, OrmError> {
    select_where(conn, "ORDER BY id ASC", [])
}

/// Returns the number of records of `M`.
///
/// # Errors
///
/// Returns `OrmError::Database` on SQL failure.
pub fn count<M: Model>(conn: &Connection) -> Result<i64, OrmError> {
    let sql = format!("SELECT COUNT(*) FROM {}", M::table());
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

/// Deletes the record with the given primary key.
///
/// Dependent rows follow the schema's `ON DELETE` rules; a parent that is
/// still referenced without a cascade makes the engine reject the delete.
///
/// # Errors
///
/// Returns `OrmError::NotFound` if no row was deleted, or
/// `OrmError::Database` on SQL failure (including constraint violations).
pub fn delete<M: Model>(conn: &Connection, id: i64) -> Result<(), OrmError> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", M::table());
    let count = conn.execute(&sql, [id])?;
    if count == 0 {
        return Err(OrmError::NotFound {
            table: M::table(),
            id,
        });
    }
    tracing::debug!(table = M::table(), id, "deleted record");
    Ok(())
}
