// src/backends/pacman.rs

//! Arch Linux backends: pacman and the yay/paru AUR helpers
//!
//! All three print the same `-Ss` format:
//!
//! ```text
//! extra/vim 9.1.0-1 (1.8 MiB 4.0 MiB) [installed]
//!     Vi Improved, a highly configurable, improved version of the vi text editor
//! ```
//!
//! AUR helpers also list official repository packages, so their adapters
//! keep only records from the `aur` repository to avoid duplicating pacman.

use super::{Backend, BackendAdapter, CommandRunner, PackageRecord, parse_size_mb};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Search adapter for pacman, yay or paru
pub struct PacmanAdapter {
    runner: Arc<dyn CommandRunner>,
    backend: Backend,
    lookup_sizes: bool,
}

impl PacmanAdapter {
    /// Adapter for the official repositories via pacman
    pub fn pacman(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            backend: Backend::Pacman,
            lookup_sizes: false,
        }
    }

    /// Adapter for an AUR helper (`Backend::Yay` or `Backend::Paru`)
    pub fn aur(runner: Arc<dyn CommandRunner>, backend: Backend) -> Self {
        Self {
            runner,
            backend,
            lookup_sizes: false,
        }
    }

    pub fn with_size_lookup(mut self, enabled: bool) -> Self {
        self.lookup_sizes = enabled;
        self
    }

    fn program(&self) -> &str {
        self.backend.as_str()
    }

    fn installed_size(&self, name: &str) -> f64 {
        self.runner
            .run("pacman", &["-Si", name])
            .filter(|output| output.success())
            .and_then(|output| parse_installed_size(&output.stdout))
            .unwrap_or(0.0)
    }
}

impl BackendAdapter for PacmanAdapter {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn is_available(&self) -> bool {
        self.runner.has_command(self.program())
    }

    fn search(&self, term: &str) -> Vec<PackageRecord> {
        let output = match self.runner.run(self.program(), &["-Ss", term]) {
            Some(output) if output.success() => output,
            _ => return Vec::new(),
        };

        let mut records = parse_search_output(&output.stdout, self.backend);
        if self.backend != Backend::Pacman {
            records.retain(|r| r.repository.eq_ignore_ascii_case("aur"));
        }

        if self.lookup_sizes && self.backend == Backend::Pacman {
            for record in &mut records {
                record.size_mb = self.installed_size(&record.name);
            }
        }

        debug!("{} returned {} records for '{}'", self.backend, records.len(), term);
        records
    }

    fn files_owned_by(&self, package: &str) -> Option<BTreeSet<String>> {
        let output = self.runner.run("pacman", &["-Ql", package])?;
        if !output.success() {
            return None;
        }
        Some(parse_file_list(&output.stdout))
    }
}

/// Parse `pacman -Ss` style output
pub fn parse_search_output(output: &str, backend: Backend) -> Vec<PackageRecord> {
    let mut records = Vec::new();
    let mut lines = output.lines().peekable();

    while let Some(line) = lines.next() {
        if line.trim().is_empty() || line.starts_with(char::is_whitespace) {
            continue;
        }

        let Some(mut record) = parse_header(line, backend) else {
            debug!("Skipping malformed {} line: {}", backend, line);
            continue;
        };

        if let Some(next) = lines.peek()
            && next.starts_with(char::is_whitespace)
        {
            record.description = next.trim().to_string();
            lines.next();
        }
        records.push(record);
    }

    records
}

/// Parse `repo/name version [flags...]`
fn parse_header(line: &str, backend: Backend) -> Option<PackageRecord> {
    let mut fields = line.split_whitespace();
    let (repo, name) = fields.next()?.split_once('/')?;
    let version = fields.next()?;
    if repo.is_empty() || name.is_empty() {
        return None;
    }

    let flags: String = fields.collect::<Vec<_>>().join(" ");
    let mut record = PackageRecord::new(name, version, backend, repo, "");
    record.installed = flags.to_lowercase().contains("[installed");
    Some(record)
}

/// Parse `pacman -Ql` output (`name /path/to/file`) into a path set
pub fn parse_file_list(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| line.split_once(' '))
        .map(|(_, path)| path.trim())
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract `Installed Size` from `pacman -Si` output, in MB
pub fn parse_installed_size(output: &str) -> Option<f64> {
    output
        .lines()
        .filter(|line| line.starts_with("Installed Size"))
        .find_map(|line| line.split_once(':'))
        .and_then(|(_, size)| parse_size_mb(size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::OsAffinity;
    use crate::backends::runner::fake::FakeRunner;

    const SEARCH_OUTPUT: &str = "\
extra/vim 9.1.0016-1 (1.8 MiB 4.0 MiB) [installed]
    Vi Improved, a highly configurable, improved version of the vi text editor
extra/neovim 0.9.5-3
    Fork of Vim aiming to improve user experience, plugins, and GUIs
garbage-line-without-slash
extra/gvim 9.1.0016-1
";

    #[test]
    fn test_parse_search_output() {
        let records = parse_search_output(SEARCH_OUTPUT, Backend::Pacman);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].name, "vim");
        assert_eq!(records[0].version, "9.1.0016-1");
        assert_eq!(records[0].repository, "extra");
        assert!(records[0].installed);
        assert!(records[0].description.starts_with("Vi Improved"));
        assert_eq!(records[0].os_affinity, OsAffinity::Arch);

        assert_eq!(records[1].name, "neovim");
        assert!(!records[1].installed);

        // No description line follows
        assert_eq!(records[2].name, "gvim");
        assert_eq!(records[2].description, "");
    }

    #[test]
    fn test_aur_helper_keeps_only_aur() {
        let output = "\
aur/visual-studio-code-bin 1.86.0-1 (+1523 12.40) [installed]
    Visual Studio Code (vscode)
extra/code 1.86.0-1
    The Open Source build of Visual Studio Code (vscode) editor
";
        let runner = Arc::new(FakeRunner::new().with_output("yay -Ss code", output));
        let adapter = PacmanAdapter::aur(runner, Backend::Yay);

        assert!(adapter.is_available());
        let records = adapter.search("code");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "visual-studio-code-bin");
        assert_eq!(records[0].backend, Backend::Yay);
        assert!(records[0].installed);
    }

    #[test]
    fn test_nonzero_exit_yields_nothing() {
        let runner = Arc::new(FakeRunner::new().with_status("pacman -Ss zzz", 1, ""));
        let adapter = PacmanAdapter::pacman(runner);
        assert!(adapter.search("zzz").is_empty());
    }

    #[test]
    fn test_size_lookup() {
        let runner = Arc::new(
            FakeRunner::new()
                .with_output("pacman -Ss neovim", "extra/neovim 0.9.5-3\n    Vim fork\n")
                .with_output(
                    "pacman -Si neovim",
                    "Repository      : extra\nName            : neovim\nInstalled Size  : 26.43 MiB\n",
                ),
        );
        let adapter = PacmanAdapter::pacman(runner).with_size_lookup(true);
        let records = adapter.search("neovim");
        assert_eq!(records.len(), 1);
        assert!((records[0].size_mb - 26.43).abs() < 1e-9);
    }

    #[test]
    fn test_files_owned_by() {
        let runner = Arc::new(
            FakeRunner::new()
                .with_output(
                    "pacman -Ql wine",
                    "wine /usr/\nwine /usr/bin/wine\nwine /usr/bin/wineserver\n",
                )
                .with_status("pacman -Ql missing", 1, ""),
        );
        let adapter = PacmanAdapter::pacman(runner);

        let files = adapter.files_owned_by("wine").unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.contains("/usr/bin/wineserver"));

        assert!(adapter.files_owned_by("missing").is_none());
    }

    #[test]
    fn test_parse_installed_size_missing() {
        assert_eq!(parse_installed_size("Name : vim\n"), None);
    }
}
