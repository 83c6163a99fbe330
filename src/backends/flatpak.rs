// src/backends/flatpak.rs

//! Flatpak backend
//!
//! `flatpak search` prints a header row followed by tab-separated
//! `name, description, application id, version, branch, remotes` columns.

use super::{Backend, BackendAdapter, CommandRunner, PackageRecord, parse_size_mb};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_REMOTE: &str = "flathub";

pub struct FlatpakAdapter {
    runner: Arc<dyn CommandRunner>,
    lookup_sizes: bool,
}

impl FlatpakAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            lookup_sizes: false,
        }
    }

    pub fn with_size_lookup(mut self, enabled: bool) -> Self {
        self.lookup_sizes = enabled;
        self
    }

    fn download_size(&self, app_id: &str) -> f64 {
        self.runner
            .run("flatpak", &["remote-info", DEFAULT_REMOTE, app_id])
            .filter(|output| output.success())
            .and_then(|output| parse_download_size(&output.stdout))
            .unwrap_or(0.0)
    }
}

impl BackendAdapter for FlatpakAdapter {
    fn backend(&self) -> Backend {
        Backend::Flatpak
    }

    fn is_available(&self) -> bool {
        self.runner.has_command("flatpak")
    }

    fn search(&self, term: &str) -> Vec<PackageRecord> {
        let output = match self.runner.run("flatpak", &["search", term]) {
            Some(output) if output.success() => output,
            _ => return Vec::new(),
        };

        let entries = parse_search_output(&output.stdout);
        let mut records = Vec::with_capacity(entries.len());
        for (mut record, app_id) in entries {
            if self.lookup_sizes {
                record.size_mb = self.download_size(&app_id);
            }
            records.push(record);
        }

        debug!("flatpak returned {} records for '{}'", records.len(), term);
        records
    }
}

/// Parse `flatpak search` output into records paired with their app IDs
pub fn parse_search_output(output: &str) -> Vec<(PackageRecord, String)> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').map(str::trim).collect();
            if parts.len() < 3 || parts[0].is_empty() || parts[2].is_empty() {
                return None;
            }

            let (name, description, app_id) = (parts[0], parts[1], parts[2]);
            let version = parts
                .get(3)
                .copied()
                .filter(|v| !v.is_empty())
                .unwrap_or("latest");

            let record = PackageRecord::new(
                name,
                version,
                Backend::Flatpak,
                DEFAULT_REMOTE,
                format!("{} ({})", description, app_id),
            );
            Some((record, app_id.to_string()))
        })
        .collect()
}

/// Extract `Download size:` from `flatpak remote-info` output, in MB
pub fn parse_download_size(output: &str) -> Option<f64> {
    output
        .lines()
        .filter_map(|line| line.split_once("Download size:"))
        .find_map(|(_, size)| parse_size_mb(size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::OsAffinity;
    use crate::backends::runner::fake::FakeRunner;

    const SEARCH_OUTPUT: &str = "Name\tDescription\tApplication ID\tVersion\tBranch\tRemotes
Firefox\tFast, Private & Safe Web Browser\torg.mozilla.firefox\t122.0\tstable\tflathub
Tor Browser Launcher\tSecurely download and run Tor Browser\tcom.github.micahflee.torbrowser-launcher\t\tstable\tflathub
broken line
";

    #[test]
    fn test_parse_search_output() {
        let entries = parse_search_output(SEARCH_OUTPUT);
        assert_eq!(entries.len(), 2);

        let (firefox, app_id) = &entries[0];
        assert_eq!(firefox.name, "Firefox");
        assert_eq!(firefox.version, "122.0");
        assert_eq!(firefox.description, "Fast, Private & Safe Web Browser (org.mozilla.firefox)");
        assert_eq!(firefox.repository, "flathub");
        assert_eq!(firefox.os_affinity, OsAffinity::Universal);
        assert_eq!(app_id, "org.mozilla.firefox");

        // Empty version column
        assert_eq!(entries[1].0.version, "latest");
    }

    #[test]
    fn test_search_with_sizes() {
        let runner = Arc::new(
            FakeRunner::new()
                .with_output("flatpak search firefox", SEARCH_OUTPUT)
                .with_output(
                    "flatpak remote-info flathub org.mozilla.firefox",
                    "        ID: org.mozilla.firefox\n   Download size: 95.3 MB\n Installed size: 250.1 MB\n",
                ),
        );
        let adapter = FlatpakAdapter::new(runner).with_size_lookup(true);
        let records = adapter.search("firefox");
        assert_eq!(records.len(), 2);
        assert!((records[0].size_mb - 95.3).abs() < 1e-9);
        // remote-info not canned for the second app
        assert_eq!(records[1].size_mb, 0.0);
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(parse_search_output("Name\tDescription\tApplication ID\n").is_empty());
    }
}
