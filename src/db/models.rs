// src/db/models.rs

//! Data models for pkgscout database entities
//!
//! This module defines Rust structs that correspond to database tables
//! and provides methods for creating, reading, updating, and deleting records.

use crate::conflict::ConflictKind;
use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Get current timestamp as ISO 8601 string
pub(crate) fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Wrap a parse failure of a stored column as a rusqlite conversion error
fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn invalid_data(column: usize, msg: String) -> rusqlite::Error {
    conversion_error(
        column,
        std::io::Error::new(std::io::ErrorKind::InvalidData, msg),
    )
}

/// Where a bundle's package list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Hand-picked by maintainers
    Curated,
    /// Suggested by an external generator (e.g. a language model)
    Generated,
}

impl Provenance {
    pub fn as_str(&self) -> &str {
        match self {
            Provenance::Curated => "curated",
            Provenance::Generated => "generated",
        }
    }
}

impl FromStr for Provenance {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "curated" => Ok(Provenance::Curated),
            "generated" => Ok(Provenance::Generated),
            _ => Err(format!("Invalid bundle provenance: {}", s)),
        }
    }
}

/// Serialized payload of a bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleData {
    /// Packages to install together, in suggested order
    pub packages: Vec<String>,

    /// Why these packages belong together
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl BundleData {
    pub fn new(packages: Vec<String>) -> Self {
        Self {
            packages,
            reasoning: None,
        }
    }
}

/// Counter columns that can be bumped independently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleCounter {
    Usage,
    Success,
    Failure,
}

impl BundleCounter {
    fn update_sql(&self) -> &'static str {
        match self {
            BundleCounter::Usage => {
                "UPDATE bundles SET usage_count = usage_count + 1
                 WHERE package_name = ?1 AND distro = ?2 AND distro_version = ?3"
            }
            BundleCounter::Success => {
                "UPDATE bundles SET success_count = success_count + 1
                 WHERE package_name = ?1 AND distro = ?2 AND distro_version = ?3"
            }
            BundleCounter::Failure => {
                "UPDATE bundles SET failure_count = failure_count + 1
                 WHERE package_name = ?1 AND distro = ?2 AND distro_version = ?3"
            }
        }
    }
}

/// A cached bundle of packages recommended for one distro release
#[derive(Debug, Clone, Serialize)]
pub struct Bundle {
    pub id: Option<i64>,
    pub package_name: String,
    pub distro: String,
    pub distro_version: String,
    pub data: BundleData,
    pub provenance: Provenance,
    pub created_at: String,
    pub usage_count: i64,
    pub success_count: i64,
    pub failure_count: i64,
}

/// Aggregate statistics over the bundle cache
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BundleStats {
    pub total_bundles: i64,
    pub total_uses: i64,
    pub generated_count: i64,
    pub curated_count: i64,
    /// Mean success rate (percent) over bundles with at least one outcome
    pub avg_success_rate: f64,
}

const BUNDLE_COLUMNS: &str = "id, package_name, distro, distro_version, bundle_json, provenance,
     created_at, usage_count, success_count, failure_count";

impl Bundle {
    /// Create a new Bundle with zeroed counters
    ///
    /// Package and distro names are stored lower-cased; the distro version
    /// is kept verbatim.
    pub fn new(
        package_name: &str,
        distro: &str,
        distro_version: &str,
        data: BundleData,
        provenance: Provenance,
    ) -> Self {
        Self {
            id: None,
            package_name: package_name.to_lowercase(),
            distro: distro.to_lowercase(),
            distro_version: distro_version.to_string(),
            data,
            provenance,
            created_at: current_timestamp(),
            usage_count: 0,
            success_count: 0,
            failure_count: 0,
        }
    }

    /// Success rate as a percentage in [0, 100]
    ///
    /// Zero when no outcome has been recorded yet.
    pub fn success_rate(&self) -> f64 {
        let total = self.success_count + self.failure_count;
        if total <= 0 {
            return 0.0;
        }
        (self.success_count as f64 / total as f64) * 100.0
    }

    /// Insert this bundle, replacing any existing row with the same key
    ///
    /// The replaced row's counters are not carried over.
    pub fn upsert(&mut self, conn: &Connection) -> Result<i64> {
        let bundle_json = serde_json::to_string(&self.data)?;

        conn.execute(
            "INSERT OR REPLACE INTO bundles
             (package_name, distro, distro_version, bundle_json, provenance, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &self.package_name,
                &self.distro,
                &self.distro_version,
                &bundle_json,
                self.provenance.as_str(),
                &self.created_at,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        self.usage_count = 0;
        self.success_count = 0;
        self.failure_count = 0;
        Ok(id)
    }

    /// Find a bundle by its (package, distro, version) key
    pub fn find(
        conn: &Connection,
        package_name: &str,
        distro: &str,
        distro_version: &str,
    ) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bundles
             WHERE package_name = ?1 AND distro = ?2 AND distro_version = ?3",
            BUNDLE_COLUMNS
        ))?;

        let bundle = stmt
            .query_row(
                params![
                    package_name.to_lowercase(),
                    distro.to_lowercase(),
                    distro_version
                ],
                Self::from_row,
            )
            .optional()?;

        Ok(bundle)
    }

    /// Bump one counter of an existing bundle
    ///
    /// Returns false when no bundle exists for the key.
    pub fn bump(
        conn: &Connection,
        counter: BundleCounter,
        package_name: &str,
        distro: &str,
        distro_version: &str,
    ) -> Result<bool> {
        let changed = conn.execute(
            counter.update_sql(),
            params![
                package_name.to_lowercase(),
                distro.to_lowercase(),
                distro_version
            ],
        )?;
        Ok(changed > 0)
    }

    /// List the most used bundles
    pub fn popular(conn: &Connection, limit: usize) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bundles ORDER BY usage_count DESC, id ASC LIMIT ?1",
            BUNDLE_COLUMNS
        ))?;

        let bundles = stmt
            .query_map([limit as i64], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bundles)
    }

    /// Count all bundles
    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM bundles", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Compute cache-wide statistics
    pub fn stats(conn: &Connection) -> Result<BundleStats> {
        let stats = conn.query_row(
            "SELECT
                COUNT(*),
                SUM(usage_count),
                SUM(CASE WHEN provenance = 'generated' THEN 1 ELSE 0 END),
                AVG(CAST(success_count AS REAL) / NULLIF(success_count + failure_count, 0) * 100)
             FROM bundles",
            [],
            |row| {
                let total: i64 = row.get(0)?;
                let uses: Option<i64> = row.get(1)?;
                let generated: Option<i64> = row.get(2)?;
                let avg: Option<f64> = row.get(3)?;
                let generated = generated.unwrap_or(0);

                Ok(BundleStats {
                    total_bundles: total,
                    total_uses: uses.unwrap_or(0),
                    generated_count: generated,
                    curated_count: total - generated,
                    avg_success_rate: (avg.unwrap_or(0.0) * 100.0).round() / 100.0,
                })
            },
        )?;

        Ok(stats)
    }

    /// Convert a database row to a Bundle
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let bundle_json: String = row.get(4)?;
        let data: BundleData =
            serde_json::from_str(&bundle_json).map_err(|e| conversion_error(4, e))?;

        let provenance_str: String = row.get(5)?;
        let provenance = provenance_str
            .parse::<Provenance>()
            .map_err(|e| invalid_data(5, e))?;

        Ok(Self {
            id: Some(row.get(0)?),
            package_name: row.get(1)?,
            distro: row.get(2)?,
            distro_version: row.get(3)?,
            data,
            provenance,
            created_at: row.get(6)?,
            usage_count: row.get(7)?,
            success_count: row.get(8)?,
            failure_count: row.get(9)?,
        })
    }
}

/// A logged decision about how a detected conflict was resolved
#[derive(Debug, Clone, Serialize)]
pub struct ConflictResolution {
    pub id: Option<i64>,
    pub package_name: String,
    pub conflict_type: ConflictKind,
    pub resolution: String,
    /// Outcome reported later by the caller; None until then
    pub success: Option<bool>,
    pub created_at: String,
}

/// How often one resolution was chosen for a package, and how it went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionCount {
    pub resolution: String,
    pub chosen: i64,
    pub succeeded: i64,
    pub failed: i64,
}

const RESOLUTION_COLUMNS: &str =
    "id, package_name, conflict_type, resolution, success, created_at";

impl ConflictResolution {
    /// Create a new ConflictResolution stamped with the current time
    pub fn new(package_name: String, conflict_type: ConflictKind, resolution: String) -> Self {
        Self {
            id: None,
            package_name,
            conflict_type,
            resolution,
            success: None,
            created_at: current_timestamp(),
        }
    }

    /// Append this resolution to the log
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO conflict_resolutions (package_name, conflict_type, resolution, success, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &self.package_name,
                self.conflict_type.as_str(),
                &self.resolution,
                &self.success,
                &self.created_at,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Record the outcome of a previously logged resolution
    ///
    /// Returns false when no entry has the given ID.
    pub fn set_success(conn: &Connection, id: i64, success: bool) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE conflict_resolutions SET success = ?1 WHERE id = ?2",
            params![success, id],
        )?;
        Ok(changed > 0)
    }

    /// Find a resolution entry by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM conflict_resolutions WHERE id = ?1",
            RESOLUTION_COLUMNS
        ))?;

        let entry = stmt.query_row([id], Self::from_row).optional()?;

        Ok(entry)
    }

    /// Find all resolutions logged for a package, oldest first
    pub fn find_by_package(conn: &Connection, package_name: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM conflict_resolutions WHERE package_name = ?1 ORDER BY id",
            RESOLUTION_COLUMNS
        ))?;

        let entries = stmt
            .query_map([package_name], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Tally resolutions chosen for a package, most chosen first
    pub fn counts_for_package(conn: &Connection, package_name: &str) -> Result<Vec<ResolutionCount>> {
        let mut stmt = conn.prepare(
            "SELECT resolution,
                    COUNT(*),
                    SUM(CASE WHEN success = 1 THEN 1 ELSE 0 END),
                    SUM(CASE WHEN success = 0 THEN 1 ELSE 0 END)
             FROM conflict_resolutions
             WHERE package_name = ?1
             GROUP BY resolution
             ORDER BY COUNT(*) DESC, resolution ASC",
        )?;

        let counts = stmt
            .query_map([package_name], |row| {
                Ok(ResolutionCount {
                    resolution: row.get(0)?,
                    chosen: row.get(1)?,
                    succeeded: row.get(2)?,
                    failed: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    /// Convert a database row to a ConflictResolution
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let type_str: String = row.get(2)?;
        let conflict_type = type_str
            .parse::<ConflictKind>()
            .map_err(|e| invalid_data(2, e))?;

        Ok(Self {
            id: Some(row.get(0)?),
            package_name: row.get(1)?,
            conflict_type,
            resolution: row.get(3)?,
            success: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
