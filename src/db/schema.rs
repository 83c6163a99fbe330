// src/db/schema.rs

//! Database schema definitions and migrations for pkgscout
//!
//! This module defines the SQLite schema for the bundle cache and the
//! conflict resolution log, and provides a migration system to evolve the
//! schema over time.

use crate::error::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Initialize the schema version tracking table
fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Current schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        debug!("Schema is up to date");
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    info!(
        "Schema migration complete. Now at version {}",
        SCHEMA_VERSION
    );
    Ok(())
}

/// Apply a specific migration version
fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Err(Error::InitError(format!(
            "Unknown migration version: {}",
            version
        ))),
    }
}

/// Initial schema - Version 1
///
/// Creates the bundle cache:
/// - bundles: package bundles keyed by (package, distro, distro version)
fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        -- Bundles: packages recommended together for one distro release
        CREATE TABLE bundles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package_name TEXT NOT NULL,
            distro TEXT NOT NULL,
            distro_version TEXT NOT NULL,
            bundle_json TEXT NOT NULL,
            provenance TEXT NOT NULL CHECK(provenance IN ('curated', 'generated')),
            created_at TEXT NOT NULL,
            usage_count INTEGER NOT NULL DEFAULT 0,
            success_count INTEGER NOT NULL DEFAULT 0,
            failure_count INTEGER NOT NULL DEFAULT 0,
            UNIQUE(package_name, distro, distro_version)
        );

        CREATE INDEX idx_bundles_lookup ON bundles(package_name, distro, distro_version);
        CREATE INDEX idx_bundles_usage ON bundles(usage_count);
        ",
    )?;

    info!("Schema version 1 created successfully");
    Ok(())
}

/// Schema Version 2: Add the conflict resolution log
///
/// Append-only record of which resolution was chosen for a detected
/// conflict. `success` stays NULL until the caller reports an outcome.
fn migrate_v2(conn: &Connection) -> Result<()> {
    debug!("Migrating to schema version 2");

    conn.execute_batch(
        "
        CREATE TABLE conflict_resolutions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package_name TEXT NOT NULL,
            conflict_type TEXT NOT NULL CHECK(conflict_type IN ('known', 'file', 'hardware', 'system')),
            resolution TEXT NOT NULL,
            success INTEGER,
            created_at TEXT NOT NULL
        );

        CREATE INDEX idx_resolutions_package ON conflict_resolutions(package_name);
        CREATE INDEX idx_resolutions_created_at ON conflict_resolutions(created_at);
        ",
    )?;

    info!("Schema version 2 applied successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (NamedTempFile, Connection) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        (temp_file, conn)
    }

    #[test]
    fn test_schema_version_tracking() {
        let (_temp, conn) = create_test_db();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, 0);

        set_schema_version(&conn, 1).unwrap();
        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_migrate_creates_all_tables() {
        let (_temp, conn) = create_test_db();

        migrate(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"bundles".to_string()));
        assert!(tables.contains(&"conflict_resolutions".to_string()));
        assert!(tables.contains(&"schema_version".to_string()));
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let (_temp, conn) = create_test_db();

        migrate(&conn).unwrap();
        let version1 = get_schema_version(&conn).unwrap();

        migrate(&conn).unwrap();
        let version2 = get_schema_version(&conn).unwrap();

        assert_eq!(version1, version2);
        assert_eq!(version1, SCHEMA_VERSION);
    }

    #[test]
    fn test_bundles_unique_constraint() {
        let (_temp, conn) = create_test_db();
        migrate(&conn).unwrap();

        let insert = "INSERT INTO bundles (package_name, distro, distro_version, bundle_json, provenance, created_at)
                      VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
        conn.execute(
            insert,
            ["hyprland", "arch", "rolling", "{}", "curated", "2024-01-01T00:00:00Z"],
        )
        .unwrap();

        let result = conn.execute(
            insert,
            ["hyprland", "arch", "rolling", "{}", "generated", "2024-01-02T00:00:00Z"],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_provenance_check_constraint() {
        let (_temp, conn) = create_test_db();
        migrate(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO bundles (package_name, distro, distro_version, bundle_json, provenance, created_at)
             VALUES ('sway', 'arch', 'rolling', '{}', 'guessed', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
