// src/backends/apt.rs

//! Debian/Ubuntu backend via apt-cache
//!
//! `apt-cache search` only prints `name - description`, so versions and
//! install state come from a single batched `apt-cache policy` call over
//! every name found. Installed sizes come from the RFC 822 stanzas printed
//! by `apt-cache show`.

use super::{Backend, BackendAdapter, CommandRunner, PackageRecord};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Version and install state reported by `apt-cache policy`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyInfo {
    pub candidate: Option<String>,
    pub installed: bool,
}

pub struct AptAdapter {
    runner: Arc<dyn CommandRunner>,
    lookup_sizes: bool,
}

impl AptAdapter {
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

    fn policy(&self, names: &[&str]) -> HashMap<String, PolicyInfo> {
        if names.is_empty() {
            return HashMap::new();
        }

        let mut args = Vec::with_capacity(names.len() + 1);
        args.push("policy");
        args.extend_from_slice(names);

        match self.runner.run("apt-cache", &args) {
            Some(output) => parse_policy_output(&output.stdout),
            None => HashMap::new(),
        }
    }

    fn installed_size(&self, name: &str) -> f64 {
        self.runner
            .run("apt-cache", &["show", name])
            .filter(|output| output.success())
            .and_then(|output| parse_show_installed_size(&output.stdout))
            .unwrap_or(0.0)
    }
}

impl BackendAdapter for AptAdapter {
    fn backend(&self) -> Backend {
        Backend::Apt
    }

    fn is_available(&self) -> bool {
        self.runner.has_command("apt-cache")
    }

    fn search(&self, term: &str) -> Vec<PackageRecord> {
        let output = match self.runner.run("apt-cache", &["search", term]) {
            Some(output) if output.success() => output,
            _ => return Vec::new(),
        };

        let mut records = parse_search_output(&output.stdout);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        let policy = self.policy(&names);

        for record in &mut records {
            if let Some(info) = policy.get(&record.name) {
                if let Some(candidate) = &info.candidate {
                    record.version = candidate.clone();
                }
                record.installed = info.installed;
            }
        }

        if self.lookup_sizes {
            for record in &mut records {
                record.size_mb = self.installed_size(&record.name);
            }
        }

        debug!("apt returned {} records for '{}'", records.len(), term);
        records
    }

    fn files_owned_by(&self, package: &str) -> Option<BTreeSet<String>> {
        let output = self.runner.run("dpkg", &["-L", package])?;
        if !output.success() {
            return None;
        }
        Some(
            output
                .stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && *line != "/.")
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Parse `apt-cache search` output (`name - description`)
///
/// Versions start out as "unknown" until policy data fills them in.
pub fn parse_search_output(output: &str) -> Vec<PackageRecord> {
    output
        .lines()
        .filter_map(|line| {
            let (name, description) = line.split_once(" - ")?;
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return None;
            }
            Some(PackageRecord::new(
                name,
                "unknown",
                Backend::Apt,
                "apt",
                description.trim(),
            ))
        })
        .collect()
}

/// Parse `apt-cache policy name...` output into per-package info
///
/// Each block starts with an unindented `name:` header followed by
/// indented `Installed:` and `Candidate:` lines.
pub fn parse_policy_output(output: &str) -> HashMap<String, PolicyInfo> {
    let mut result = HashMap::new();
    let mut current: Option<(String, PolicyInfo)> = None;

    for line in output.lines() {
        if !line.starts_with(char::is_whitespace) {
            if let Some((name, info)) = current.take() {
                result.insert(name, info);
            }
            if let Some(name) = line.trim().strip_suffix(':') {
                current = Some((name.to_string(), PolicyInfo::default()));
            }
            continue;
        }

        let Some((_, info)) = current.as_mut() else {
            continue;
        };
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key {
            "Installed" => info.installed = !value.is_empty() && value != "(none)",
            "Candidate" if value != "(none)" => info.candidate = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some((name, info)) = current {
        result.insert(name, info);
    }
    result
}

/// The one field we need from an `apt-cache show` stanza
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AptShowEntry {
    #[serde(default)]
    package: Option<String>,
    #[serde(rename = "Installed-Size", default)]
    installed_size: Option<String>,
}

/// Extract `Installed-Size` (KiB) from `apt-cache show` output, in MB
///
/// The first stanza carrying the field wins.
pub fn parse_show_installed_size(output: &str) -> Option<f64> {
    let entries: Vec<AptShowEntry> = match rfc822_like::from_str(output) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Failed to parse apt-cache show output: {}", e);
            return None;
        }
    };

    entries.iter().find_map(|entry| {
        let kib: f64 = entry.installed_size.as_deref()?.trim().parse().ok()?;
        debug!(
            "Installed-Size of {}: {} KiB",
            entry.package.as_deref().unwrap_or("?"),
            kib
        );
        Some(kib / 1024.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::runner::fake::FakeRunner;

    const POLICY_OUTPUT: &str = "\
vim:
  Installed: 2:9.0.1378-2
  Candidate: 2:9.0.1378-2
  Version table:
 *** 2:9.0.1378-2 500
        500 http://deb.debian.org/debian bookworm/main amd64 Packages
        100 /var/lib/dpkg/status
vim-gtk3:
  Installed: (none)
  Candidate: 2:9.0.1378-2
  Version table:
     2:9.0.1378-2 500
        500 http://deb.debian.org/debian bookworm/main amd64 Packages
";

    #[test]
    fn test_parse_search_output() {
        let output = "vim - Vi IMproved - enhanced vi editor\nvim-gtk3 - Vi IMproved - enhanced vi editor - with GTK3 GUI\nnot a record\n";
        let records = parse_search_output(output);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "vim");
        assert_eq!(records[0].description, "Vi IMproved - enhanced vi editor");
        assert_eq!(records[0].version, "unknown");
        assert_eq!(records[0].repository, "apt");
    }

    #[test]
    fn test_parse_policy_output() {
        let policy = parse_policy_output(POLICY_OUTPUT);
        assert_eq!(policy.len(), 2);

        let vim = &policy["vim"];
        assert!(vim.installed);
        assert_eq!(vim.candidate.as_deref(), Some("2:9.0.1378-2"));

        let gtk = &policy["vim-gtk3"];
        assert!(!gtk.installed);
    }

    #[test]
    fn test_search_batches_policy() {
        let runner = Arc::new(
            FakeRunner::new()
                .with_output(
                    "apt-cache search vim",
                    "vim - Vi IMproved - enhanced vi editor\nvim-gtk3 - Vi IMproved - with GTK3 GUI\nvim-tiny - Vi IMproved - compact\n",
                )
                .with_output("apt-cache policy vim vim-gtk3 vim-tiny", POLICY_OUTPUT),
        );
        let adapter = AptAdapter::new(runner.clone());

        let records = adapter.search("vim");
        assert_eq!(records.len(), 3);
        assert!(records[0].installed);
        assert_eq!(records[1].version, "2:9.0.1378-2");
        // Absent from policy output
        assert_eq!(records[2].version, "unknown");
        assert!(!records[2].installed);

        let policy_calls = runner
            .calls()
            .iter()
            .filter(|c| c.starts_with("apt-cache policy"))
            .count();
        assert_eq!(policy_calls, 1);
    }

    #[test]
    fn test_parse_show_installed_size() {
        let output = "\
Package: neovim
Version: 0.7.2-7
Installed-Size: 2048
Maintainer: Debian Vim Maintainers <team+vim@tracker.debian.org>
Description-en: heavily refactored vim fork

";
        assert_eq!(parse_show_installed_size(output), Some(2.0));
        assert_eq!(parse_show_installed_size("Package: neovim\n"), None);
    }

    #[test]
    fn test_files_owned_by_skips_root_marker() {
        let runner = Arc::new(FakeRunner::new().with_output(
            "dpkg -L nouveau-firmware",
            "/.\n/lib\n/lib/firmware/nouveau/nv50.bin\n",
        ));
        let adapter = AptAdapter::new(runner);
        let files = adapter.files_owned_by("nouveau-firmware").unwrap();
        assert_eq!(files.len(), 2);
        assert!(!files.contains("/."));
    }
}
