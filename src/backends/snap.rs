// src/backends/snap.rs

//! Snap backend
//!
//! Uses `snap find` when it works, and falls back to the Snap Store find
//! API when the command yields nothing (snapd socket down, offline cache,
//! etc).

use super::{Backend, BackendAdapter, CommandRunner, MAX_RESULTS, PackageRecord};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_SNAP_API_URL: &str = "https://api.snapcraft.io/v2/snaps/find";

const REPOSITORY: &str = "snapcraft";

pub struct SnapAdapter {
    runner: Arc<dyn CommandRunner>,
    client: Option<Client>,
    api_url: String,
}

impl SnapAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>, client: Option<Client>, api_url: String) -> Self {
        Self {
            runner,
            client,
            api_url,
        }
    }

    fn search_api(&self, term: &str) -> Vec<PackageRecord> {
        let Some(client) = &self.client else {
            return Vec::new();
        };

        let response = match client
            .get(&self.api_url)
            .query(&[("q", term), ("fields", "name,version,summary,publisher")])
            .header("Snap-Device-Series", "16")
            .send()
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Snap Store request failed: {}", e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            debug!("Snap Store returned HTTP {}", response.status());
            return Vec::new();
        }

        match response.text() {
            Ok(body) => parse_api_response(&body),
            Err(e) => {
                warn!("Failed to read Snap Store response: {}", e);
                Vec::new()
            }
        }
    }
}

impl BackendAdapter for SnapAdapter {
    fn backend(&self) -> Backend {
        Backend::Snap
    }

    fn is_available(&self) -> bool {
        self.runner.has_command("snap")
    }

    fn search(&self, term: &str) -> Vec<PackageRecord> {
        let mut records = match self.runner.run("snap", &["find", term]) {
            Some(output) if output.success() => parse_find_output(&output.stdout),
            _ => Vec::new(),
        };

        if records.is_empty() {
            debug!("snap find gave nothing for '{}', trying the store API", term);
            records = self.search_api(term);
        }

        records.truncate(MAX_RESULTS);
        records
    }
}

/// Parse `snap find` output (`Name Version Publisher Notes Summary`)
pub fn parse_find_output(output: &str) -> Vec<PackageRecord> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return None;
            }
            let summary = parts.get(4..).map(|s| s.join(" ")).unwrap_or_default();
            Some(PackageRecord::new(
                parts[0],
                parts[1],
                Backend::Snap,
                REPOSITORY,
                format!("{} (by {})", summary, parts[2]),
            ))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Publisher {
    #[serde(rename = "display-name", default)]
    display_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct SnapDetails {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    publisher: Option<Publisher>,
}

#[derive(Debug, Default, Deserialize)]
struct Revision {
    #[serde(default)]
    version: Option<String>,
}

/// One store result; fields appear flat or nested depending on API version
#[derive(Debug, Deserialize)]
struct StoreSnap {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    publisher: Option<Publisher>,
    #[serde(default)]
    snap: Option<SnapDetails>,
    #[serde(default)]
    revision: Option<Revision>,
}

impl StoreSnap {
    fn into_record(self) -> Option<PackageRecord> {
        if self.name.is_empty() {
            return None;
        }
        let details = self.snap.unwrap_or_default();
        let version = self
            .version
            .or(self.revision.and_then(|r| r.version))
            .unwrap_or_else(|| "latest".to_string());
        let summary = self.summary.or(details.summary).unwrap_or_default();
        let publisher = self
            .publisher
            .or(details.publisher)
            .map(|p| p.display_name)
            .unwrap_or_default();

        Some(PackageRecord::new(
            self.name,
            version,
            Backend::Snap,
            REPOSITORY,
            format!("{} (by {})", summary, publisher),
        ))
    }
}

/// Parse a Snap Store find response, skipping malformed entries
pub fn parse_api_response(body: &str) -> Vec<PackageRecord> {
    let response: FindResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            debug!("Malformed Snap Store response: {}", e);
            return Vec::new();
        }
    };

    response
        .results
        .into_iter()
        .take(MAX_RESULTS)
        .filter_map(|value| serde_json::from_value::<StoreSnap>(value).ok())
        .filter_map(StoreSnap::into_record)
        .collect()
}
