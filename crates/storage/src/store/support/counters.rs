#![forbid(unsafe_code)]

use super::super::StoreError;
use rusqlite::{Connection, OptionalExtension, Transaction, params};

pub(in crate::store) const NEWS_COUNTER: &str = "news";

pub(in crate::store) fn counter_value(conn: &Connection, name: &str) -> Result<i64, StoreError> {
    Ok(conn
        .query_row(
            "SELECT value FROM counters WHERE name=?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0))
}

/// Reads the counter (absent counts as 0), stores `value + 1` and returns it.
pub(in crate::store) fn next_counter_tx(
    tx: &Transaction<'_>,
    name: &str,
) -> Result<i64, StoreError> {
    let current = counter_value(tx, name)?;
    let next = current
        .checked_add(1)
        .ok_or(StoreError::InvalidInput("counter overflow"))?;
    tx.execute(
        r#"
        INSERT INTO counters(name, value) VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET value=excluded.value
        "#,
        params![name, next],
    )?;
    Ok(next)
}
