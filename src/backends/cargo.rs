// src/backends/cargo.rs

//! crates.io backend via `cargo search`

use super::{Backend, BackendAdapter, CommandRunner, MAX_RESULTS, PackageRecord};
use std::sync::Arc;
use tracing::debug;

pub struct CargoAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl CargoAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl BackendAdapter for CargoAdapter {
    fn backend(&self) -> Backend {
        Backend::Cargo
    }

    fn is_available(&self) -> bool {
        self.runner.has_command("cargo")
    }

    fn search(&self, term: &str) -> Vec<PackageRecord> {
        let limit = MAX_RESULTS.to_string();
        let output = match self
            .runner
            .run("cargo", &["search", term, "--limit", &limit])
        {
            Some(output) if output.success() => output,
            _ => return Vec::new(),
        };

        let records = parse_search_output(&output.stdout);
        debug!("cargo returned {} records for '{}'", records.len(), term);
        records
    }
}

/// Parse `cargo search` output (`name = "version"    # description`)
pub fn parse_search_output(output: &str) -> Vec<PackageRecord> {
    output
        .lines()
        .filter(|line| !line.starts_with("..."))
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<PackageRecord> {
    let (name, rest) = line.split_once('=')?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }

    let rest = rest.trim_start().strip_prefix('"')?;
    let (version, rest) = rest.split_once('"')?;
    let description = rest.trim_start().strip_prefix('#')?.trim();
    if version.is_empty() || description.is_empty() {
        return None;
    }

    Some(PackageRecord::new(
        name,
        version,
        Backend::Cargo,
        "crates.io",
        description,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::runner::fake::FakeRunner;

    const OUTPUT: &str = r#"ripgrep = "14.1.0"            # ripgrep is a line-oriented search tool that recursively searches the current directory
grep = "0.3.1"                # Fast line oriented regex searching as a library.
no-description = "1.0.0"
... and 245 crates more (use --limit N to see more)
"#;

    #[test]
    fn test_parse_search_output() {
        let records = parse_search_output(OUTPUT);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "ripgrep");
        assert_eq!(records[0].version, "14.1.0");
        assert!(records[0].description.starts_with("ripgrep is a line-oriented"));
        assert_eq!(records[1].repository, "crates.io");
    }

    #[test]
    fn test_search_passes_limit() {
        let runner = Arc::new(FakeRunner::new().with_output("cargo search ripgrep --limit 20", OUTPUT));
        let adapter = CargoAdapter::new(runner);
        assert_eq!(adapter.search("ripgrep").len(), 2);
    }
}
