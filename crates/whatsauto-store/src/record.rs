//! Collection-agnostic record operations.
//!
//! Each persisted type describes its table through [`Record`]; the generic
//! [`Database`] methods below are the only place SQL for put / get / delete
//! is assembled. Records come back in stored (insertion) order, and a put
//! that replaces an existing key keeps the record's original position.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::database::Database;
use crate::error::{Result, StoreError};

/// The three persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Documents,
    Contacts,
    Assignments,
}

impl Collection {
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Documents => "documents",
            Collection::Contacts => "contacts",
            Collection::Assignments => "assignments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Documents => "Document",
            Collection::Contacts => "Contact",
            Collection::Assignments => "Assignment",
        };
        f.write_str(name)
    }
}

/// A type stored in one collection.
pub trait Record: Sized {
    type Key;

    const COLLECTION: Collection;

    /// Column names in bind / read order. The first column is the primary key.
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> &Self::Key;

    fn encode_key(key: &Self::Key) -> String;

    /// Encode every column, in [`Record::COLUMNS`] order.
    fn to_values(&self) -> Result<Vec<Value>>;

    /// Decode a row selected with [`Record::COLUMNS`].
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

// ---------------------------------------------------------------------------
// SQL assembly
// ---------------------------------------------------------------------------

fn select_sql<R: Record>() -> String {
    format!(
        "SELECT {} FROM {}",
        R::COLUMNS.join(", "),
        R::COLLECTION.table()
    )
}

fn upsert_sql<R: Record>() -> String {
    let placeholders = (1..=R::COLUMNS.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = R::COLUMNS[1..]
        .iter()
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} ({cols}) VALUES ({placeholders})
         ON CONFLICT({key}) DO UPDATE SET {updates}",
        table = R::COLLECTION.table(),
        cols = R::COLUMNS.join(", "),
        key = R::COLUMNS[0],
    )
}

// ---------------------------------------------------------------------------
// Connection-level helpers (usable inside a transaction)
// ---------------------------------------------------------------------------

pub(crate) fn put_in<R: Record>(conn: &Connection, record: &R) -> Result<()> {
    let values = record.to_values()?;
    conn.execute(&upsert_sql::<R>(), params_from_iter(values))?;
    Ok(())
}

pub(crate) fn get_one_in<R: Record>(conn: &Connection, key: &R::Key) -> Result<Option<R>> {
    let sql = format!("{} WHERE {} = ?1", select_sql::<R>(), R::COLUMNS[0]);
    conn.query_row(&sql, params![R::encode_key(key)], R::from_row)
        .optional()
        .map_err(StoreError::from_read)
}

pub(crate) fn exists_in<R: Record>(conn: &Connection, key: &R::Key) -> Result<bool> {
    let sql = format!(
        "SELECT 1 FROM {} WHERE {} = ?1",
        R::COLLECTION.table(),
        R::COLUMNS[0]
    );
    let found = conn
        .query_row(&sql, params![R::encode_key(key)], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn query_in<R: Record>(
    conn: &Connection,
    filter: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<R>> {
    let sql = format!("{} {filter} ORDER BY rowid ASC", select_sql::<R>());
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(args, R::from_row)
        .map_err(StoreError::from_read)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row.map_err(StoreError::from_read)?);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Public operations
// ---------------------------------------------------------------------------

impl Database {
    /// Insert or replace a record by primary key.
    pub fn put<R: Record>(&self, record: &R) -> Result<()> {
        put_in(self.conn(), record)?;
        tracing::debug!(
            collection = %R::COLLECTION,
            key = %R::encode_key(record.key()),
            "record stored"
        );
        Ok(())
    }

    /// Put a batch of records in one transaction.
    ///
    /// Either every record is written or, on the first failure, none is:
    /// the transaction rolls back when it is dropped uncommitted. The error
    /// carries no per-record detail.
    pub fn put_many<R: Record>(&self, records: &[R]) -> Result<usize> {
        let tx = self.conn().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&upsert_sql::<R>())?;
            for record in records {
                stmt.execute(params_from_iter(record.to_values()?))?;
            }
        }
        tx.commit()?;

        tracing::debug!(
            collection = %R::COLLECTION,
            count = records.len(),
            "batch put committed"
        );
        Ok(records.len())
    }

    /// Every record of a collection, in stored order.
    pub fn get_all<R: Record>(&self) -> Result<Vec<R>> {
        query_in(self.conn(), "", &[])
    }

    /// Point lookup. A missing key is `Ok(None)`, not an error.
    pub fn get_one<R: Record>(&self, key: &R::Key) -> Result<Option<R>> {
        get_one_in(self.conn(), key)
    }

    /// Delete a record. Returns whether a row was removed; deleting a missing
    /// key succeeds with `false`.
    pub fn delete<R: Record>(&self, key: &R::Key) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            R::COLLECTION.table(),
            R::COLUMNS[0]
        );
        let affected = self.conn().execute(&sql, params![R::encode_key(key)])?;
        Ok(affected > 0)
    }

    /// Number of records in a collection.
    pub fn count<R: Record>(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", R::COLLECTION.table());
        let n: i64 = self.conn().query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

// ---------------------------------------------------------------------------
// Field codecs
// ---------------------------------------------------------------------------

/// Timestamps are stored as RFC 3339 text with as many fractional digits as
/// needed, so the instant survives the round trip exactly.
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> Value {
    Value::Text(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub(crate) fn decode_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

pub(crate) fn decode_tag<T>(idx: usize, text: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.parse::<T>().map_err(|e| conversion_failure(idx, e))
}

pub(crate) fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::Text(s.to_string()))
}
