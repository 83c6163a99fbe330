// src/backends/npm.rs

//! npm registry backend via `npm search --json`

use super::{Backend, BackendAdapter, CommandRunner, MAX_RESULTS, PackageRecord};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct NpmAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl NpmAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl BackendAdapter for NpmAdapter {
    fn backend(&self) -> Backend {
        Backend::Npm
    }

    fn is_available(&self) -> bool {
        self.runner.has_command("npm")
    }

    fn search(&self, term: &str) -> Vec<PackageRecord> {
        let output = match self.runner.run("npm", &["search", term, "--json", "--long"]) {
            Some(output) if output.success() => output,
            _ => return Vec::new(),
        };

        let records = parse_search_output(&output.stdout);
        debug!("npm returned {} records for '{}'", records.len(), term);
        records
    }
}

/// Parse the JSON array printed by `npm search --json`
pub fn parse_search_output(output: &str) -> Vec<PackageRecord> {
    let entries: Vec<Value> = match serde_json::from_str(output) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Malformed npm search output: {}", e);
            return Vec::new();
        }
    };

    entries
        .iter()
        .take(MAX_RESULTS)
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str().filter(|n| !n.is_empty())?;
            let version = entry
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            let description = entry
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            Some(PackageRecord::new(
                name,
                version,
                Backend::Npm,
                "npmjs",
                description,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_output() {
        let output = r#"[
            {"name": "typescript", "version": "5.3.3", "description": "TypeScript is a language for application scale JavaScript development"},
            {"name": "ts-node", "version": "10.9.2"},
            {"version": "1.0.0", "description": "nameless"},
            {"name": "", "version": "1.0.0"}
        ]"#;
        let records = parse_search_output(output);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "typescript");
        assert_eq!(records[0].repository, "npmjs");
        assert_eq!(records[1].description, "");
    }

    #[test]
    fn test_parse_caps_and_rejects_garbage() {
        let entries: Vec<String> = (0..25)
            .map(|i| format!(r#"{{"name": "pkg{}", "version": "1.0.{}"}}"#, i, i))
            .collect();
        let output = format!("[{}]", entries.join(","));
        assert_eq!(parse_search_output(&output).len(), MAX_RESULTS);
        assert!(parse_search_output("npm ERR! code E404").is_empty());
    }
}
