//! Schema migrations
//!
//! The schema version is SQLite's `user_version`. Each migration with an id
//! above the stored version runs in its own transaction, which also advances
//! the version to that id. Statements use `IF NOT EXISTS` so a retry after a
//! failure is harmless.

use rusqlite::Connection;

use super::executor::Executor;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub id: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        name: "shopping",
        sql: "
            CREATE TABLE IF NOT EXISTS lists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                currency_code TEXT NOT NULL DEFAULT 'BRL',
                is_completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                hide_purchased_by_default INTEGER NOT NULL DEFAULT 0,
                ask_price_on_purchase INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                is_predefined INTEGER NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                list_id INTEGER NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                quantity_num REAL NOT NULL DEFAULT 1,
                unit TEXT,
                category_id INTEGER NOT NULL REFERENCES categories(id),
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'purchased')),
                position INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                purchased_at TEXT,
                unit_price_minor INTEGER,
                total_price_minor INTEGER,
                price_source TEXT CHECK (price_source IN ('unit', 'total'))
            );

            CREATE INDEX IF NOT EXISTS idx_items_list ON items(list_id);
            CREATE INDEX IF NOT EXISTS idx_items_bucket ON items(category_id, status, position);
        ",
    },
    Migration {
        id: 2,
        name: "inbox",
        sql: "
            CREATE TABLE IF NOT EXISTS user_inputs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                usage_count INTEGER NOT NULL DEFAULT 0 CHECK (usage_count >= 0),
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS input_tags (
                input_id INTEGER NOT NULL REFERENCES user_inputs(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (input_id, tag_id)
            );

            CREATE INDEX IF NOT EXISTS idx_input_tags_tag ON input_tags(tag_id);
        ",
    },
    Migration {
        id: 3,
        name: "user_lists",
        sql: "
            CREATE TABLE IF NOT EXISTS user_lists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS list_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                list_id INTEGER NOT NULL REFERENCES user_lists(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_list_entries_list ON list_entries(list_id, position);
        ",
    },
];

/// Highest version this build knows about
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.id)
}

pub fn schema_version(conn: &Connection) -> Result<i64> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Bring the schema up to date, returning the ids that were applied
pub fn run(conn: &Connection) -> Result<Vec<i64>> {
    run_pending(conn, MIGRATIONS)
}

/// Apply every migration in `migrations` newer than the stored version
pub fn run_pending(conn: &Connection, migrations: &[Migration]) -> Result<Vec<i64>> {
    let current = schema_version(conn)?;
    let supported = migrations.last().map_or(0, |m| m.id);
    if current > supported {
        return Err(Error::UnsupportedSchemaVersion {
            found: current,
            supported,
        });
    }

    let mut pending: Vec<&Migration> = migrations.iter().filter(|m| m.id > current).collect();
    pending.sort_by_key(|m| m.id);

    let mut applied = Vec::with_capacity(pending.len());
    for migration in pending {
        Executor::transaction(conn, |tx| {
            tx.execute_batch(migration.sql)?;
            tx.pragma_update(None, "user_version", migration.id)?;
            Ok(())
        })?;
        tracing::debug!("Applied migration {} ({})", migration.id, migration.name);
        applied.push(migration.id);
    }

    Ok(applied)
}
