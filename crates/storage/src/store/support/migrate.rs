#![forbid(unsafe_code)]

use super::super::StoreError;
use hub_core::clock::now_ms;
use rusqlite::{Connection, OptionalExtension, params};

pub(in crate::store) const SCHEMA_VERSION: i64 = 1;

pub(in crate::store) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    // journal_mode returns the resulting mode as a row.
    conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get::<_, String>(0))?;

    conn.execute_batch(
        r#"
        PRAGMA synchronous=NORMAL;

        CREATE TABLE IF NOT EXISTS store_state (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          schema_version INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS counters (
          name TEXT PRIMARY KEY,
          value INTEGER NOT NULL CHECK(value >= 0)
        );

        CREATE TABLE IF NOT EXISTS news (
          id INTEGER PRIMARY KEY CHECK(id >= 1),
          title TEXT NOT NULL,
          author TEXT NOT NULL,
          description TEXT,
          link TEXT,
          image_ref TEXT,
          created_at_ms INTEGER NOT NULL,
          created_by TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO store_state(singleton, schema_version, created_at_ms) VALUES (1, ?1, ?2)",
        params![SCHEMA_VERSION, now_ms()],
    )?;

    let version = conn
        .query_row(
            "SELECT schema_version FROM store_state WHERE singleton=1",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    match version {
        Some(v) if v == SCHEMA_VERSION => Ok(()),
        Some(_) => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema version mismatch",
        )),
        None => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema state row is missing",
        )),
    }
}
