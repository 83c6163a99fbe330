// src/bundle.rs

//! Cache of dependency bundles keyed by (package, distro, version)
//!
//! A bundle is the list of extra packages that make something work on a
//! given distribution release, with counters tracking how often it was
//! applied and how that went. Storage failures never reach the caller:
//! they are logged and the operation degrades to a miss or a no-op.

use crate::db;
use crate::db::models::{Bundle, BundleCounter, BundleData, BundleStats, Provenance};
use crate::error::Result;
use rusqlite::Connection;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct BundleCache {
    db_path: String,
}

impl BundleCache {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn with_conn<T>(&self, op: &str, f: impl FnOnce(&Connection) -> Result<T>) -> Option<T> {
        let result = db::open_or_init(&self.db_path).and_then(|conn| f(&conn));
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Bundle cache {} failed: {}", op, e);
                None
            }
        }
    }

    pub fn get(&self, package: &str, distro: &str, distro_version: &str) -> Option<Bundle> {
        let bundle = self
            .with_conn("lookup", |conn| Bundle::find(conn, package, distro, distro_version))
            .flatten();
        debug!(
            "Bundle cache {} for {} on {} {}",
            if bundle.is_some() { "hit" } else { "miss" },
            package,
            distro,
            distro_version
        );
        bundle
    }

    /// Store a bundle, replacing any previous one for the same key
    ///
    /// Returns the row ID, or None if the write failed.
    pub fn upsert(
        &self,
        package: &str,
        distro: &str,
        distro_version: &str,
        data: BundleData,
        provenance: Provenance,
    ) -> Option<i64> {
        let mut bundle = Bundle::new(package, distro, distro_version, data, provenance);
        self.with_conn("upsert", |conn| bundle.upsert(conn))
    }

    fn bump(&self, counter: BundleCounter, package: &str, distro: &str, distro_version: &str) -> bool {
        self.with_conn("update", |conn| {
            Bundle::bump(conn, counter, package, distro, distro_version)
        })
        .unwrap_or(false)
    }

    /// Count one more use; false when no such bundle exists
    pub fn increment_usage(&self, package: &str, distro: &str, distro_version: &str) -> bool {
        self.bump(BundleCounter::Usage, package, distro, distro_version)
    }

    pub fn record_success(&self, package: &str, distro: &str, distro_version: &str) -> bool {
        self.bump(BundleCounter::Success, package, distro, distro_version)
    }

    pub fn record_failure(&self, package: &str, distro: &str, distro_version: &str) -> bool {
        self.bump(BundleCounter::Failure, package, distro, distro_version)
    }

    /// Most used bundles first
    pub fn popular(&self, limit: usize) -> Vec<Bundle> {
        self.with_conn("popular", |conn| Bundle::popular(conn, limit))
            .unwrap_or_default()
    }

    pub fn stats(&self) -> BundleStats {
        self.with_conn("stats", Bundle::stats).unwrap_or_default()
    }
}
