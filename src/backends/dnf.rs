// src/backends/dnf.rs

//! Fedora/RHEL backend via dnf

use super::{Backend, BackendAdapter, CommandRunner, PackageRecord};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Architecture suffixes dnf appends to package names
const KNOWN_ARCHES: &[&str] = &[
    "x86_64", "i686", "noarch", "aarch64", "ppc64le", "s390x", "armv7hl", "src",
];

pub struct DnfAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl DnfAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl BackendAdapter for DnfAdapter {
    fn backend(&self) -> Backend {
        Backend::Dnf
    }

    fn is_available(&self) -> bool {
        self.runner.has_command("dnf")
    }

    fn search(&self, term: &str) -> Vec<PackageRecord> {
        let output = match self.runner.run("dnf", &["search", "-q", term]) {
            Some(output) if output.success() => output,
            _ => return Vec::new(),
        };

        let records = parse_search_output(&output.stdout);
        debug!("dnf returned {} records for '{}'", records.len(), term);
        records
    }

    fn files_owned_by(&self, package: &str) -> Option<BTreeSet<String>> {
        let output = self.runner.run("rpm", &["-ql", package])?;
        if !output.success() {
            return None;
        }
        Some(
            output
                .stdout
                .lines()
                .map(str::trim)
                .filter(|line| line.starts_with('/'))
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Parse `dnf search` output (`name.arch : summary`)
pub fn parse_search_output(output: &str) -> Vec<PackageRecord> {
    output
        .lines()
        .filter(|line| !line.starts_with('=') && !line.starts_with("Last metadata"))
        .filter_map(|line| {
            let (name, summary) = line.split_once(" : ")?;
            let name = strip_arch(name.trim());
            if name.is_empty() || name.contains(char::is_whitespace) {
                return None;
            }
            Some(PackageRecord::new(
                name,
                "unknown",
                Backend::Dnf,
                "dnf",
                summary.trim(),
            ))
        })
        .collect()
}

fn strip_arch(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((base, arch)) if KNOWN_ARCHES.contains(&arch) => base,
        _ => name,
    }
}
