//! SQLite schema backing [`super::SqliteLayerStore`].

use rusqlite::{Connection, OptionalExtension, Transaction};

use super::StoreError;

/// Layer schema version written by this build.
pub const SCHEMA_VERSION: i64 = 1;

/// Create the layer tables if needed and check the recorded schema version.
///
/// Databases written by a different version are rejected so migrations can be
/// applied explicitly.
pub(super) fn initialise_schema(connection: &mut Connection) -> Result<(), StoreError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| StoreError::Migration {
            step: "enable foreign keys",
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| StoreError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| StoreError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create layers",
        "CREATE TABLE IF NOT EXISTS layers (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0),
            crs_wkt TEXT,
            precision_scale REAL CHECK (precision_scale IS NULL OR precision_scale > 0),
            field_names TEXT NOT NULL DEFAULT '[]'
        )",
    )?;
    run_migration_step(
        transaction,
        "create layer_features",
        "CREATE TABLE IF NOT EXISTS layer_features (
            id INTEGER PRIMARY KEY,
            layer_id INTEGER NOT NULL,
            min_x REAL,
            min_y REAL,
            max_x REAL,
            max_y REAL,
            geometry BLOB NOT NULL,
            properties TEXT NOT NULL,
            FOREIGN KEY (layer_id) REFERENCES layers(id) ON DELETE CASCADE
        )",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "index layer_features",
        "CREATE INDEX IF NOT EXISTS idx_layer_features_envelope
            ON layer_features(layer_id, min_x, max_x, min_y, max_y)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS layer_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM layer_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| StoreError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(StoreError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO layer_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| StoreError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), StoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| StoreError::Migration { step, source })
}
