/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for the vocabulary tables
 * and handles schema migrations for version upgrades.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Apply connection-level settings; runs on every open
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // WAL plus FULL sync: a committed transaction survives a crash
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=FULL;
        PRAGMA foreign_keys=ON;
        "#,
    )
    .context("Failed to configure database connection")?;
    Ok(())
}

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    configure_connection(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    // word is stored normalized, so the primary key is case-insensitive in effect
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS words (
            word TEXT PRIMARY KEY NOT NULL CHECK (word <> ''),
            translation TEXT,
            source TEXT NOT NULL,
            exported INTEGER NOT NULL DEFAULT 0 CHECK (exported IN (0, 1)),
            created_at TEXT NOT NULL,
            exported_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_words_export_queue ON words(exported, created_at, word);
        CREATE INDEX IF NOT EXISTS idx_words_created ON words(created_at);
        "#,
    )?;

    // exported never goes back to 0
    conn.execute_batch(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_words_exported_monotonic
        BEFORE UPDATE OF exported ON words
        WHEN OLD.exported = 1 AND NEW.exported = 0
        BEGIN
            SELECT RAISE(ABORT, 'exported flag cannot be reset');
        END;

        CREATE TRIGGER IF NOT EXISTS trg_words_created_at_immutable
        BEFORE UPDATE OF created_at ON words
        WHEN OLD.created_at <> NEW.created_at
        BEGIN
            SELECT RAISE(ABORT, 'created_at cannot change');
        END;
        "#,
    )?;

    info!("Database schema created successfully");
    Ok(())
}

/// Migrate the schema from one version to another
fn migrate_schema(conn: &Connection, from_version: i32) -> Result<()> {
    let current = from_version;

    if current < SCHEMA_VERSION {
        // No released schema predates v1
        return Err(anyhow::anyhow!(
            "Unknown schema version: {}. Cannot migrate.",
            current
        ));
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    info!("Schema migration completed to v{}", SCHEMA_VERSION);
    Ok(())
}
