// src/conflict/log.rs

//! Append-only log of how conflicts were resolved
//!
//! Every call opens the database for the duration of one statement, so the
//! log can be shared freely between an oracle and whoever later reports
//! whether the chosen resolution worked.

use super::ConflictKind;
use crate::db;
use crate::db::models::{ConflictResolution, ResolutionCount};
use crate::error::Result;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ResolutionLog {
    db_path: String,
}

impl ResolutionLog {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Record a chosen resolution, returning its log ID
    pub fn append(&self, package: &str, kind: ConflictKind, resolution: &str) -> Result<i64> {
        let conn = db::open_or_init(&self.db_path)?;
        let mut entry =
            ConflictResolution::new(package.to_lowercase(), kind, resolution.to_string());
        let id = entry.insert(&conn)?;
        debug!("Logged resolution {} for {}: {}", id, package, resolution);
        Ok(id)
    }

    /// Report whether a logged resolution worked; false for unknown IDs
    pub fn set_success(&self, id: i64, success: bool) -> Result<bool> {
        let conn = db::open_or_init(&self.db_path)?;
        ConflictResolution::set_success(&conn, id, success)
    }

    pub fn find_by_package(&self, package: &str) -> Result<Vec<ConflictResolution>> {
        let conn = db::open_or_init(&self.db_path)?;
        ConflictResolution::find_by_package(&conn, &package.to_lowercase())
    }

    /// Resolution tallies for a package, most chosen first
    pub fn counts_for_package(&self, package: &str) -> Result<Vec<ResolutionCount>> {
        let conn = db::open_or_init(&self.db_path)?;
        ConflictResolution::counts_for_package(&conn, &package.to_lowercase())
    }
}
