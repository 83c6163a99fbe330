// src/backends/mod.rs

//! Backend adapters for package search
//!
//! Each adapter wraps one software-distribution backend and turns its
//! native output into [`PackageRecord`]s:
//! - Arch: pacman, plus the yay/paru AUR helpers
//! - Debian: apt
//! - Fedora: dnf
//! - Universal: flatpak, snap, cargo, npm, PyPI
//!
//! Adapters never fail. A missing tool, a non-zero exit or a transport
//! error all produce an empty result list, and malformed records are
//! skipped individually.

pub mod apt;
pub mod cargo;
pub mod dnf;
pub mod flatpak;
pub mod npm;
pub mod pacman;
pub mod pypi;
pub mod runner;
pub mod snap;

pub use runner::{CommandOutput, CommandRunner, SystemRunner};

use crate::error::{Error, Result};
use crate::translate::DistroFamily;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for registry HTTP requests
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Cap on records taken from backends that return unbounded result sets
pub const MAX_RESULTS: usize = 20;

/// A software-distribution backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Pacman,
    Yay,
    Paru,
    Apt,
    Dnf,
    Flatpak,
    Snap,
    Cargo,
    Npm,
    Pip,
}

impl Backend {
    pub fn all() -> &'static [Backend] {
        &[
            Backend::Pacman,
            Backend::Yay,
            Backend::Paru,
            Backend::Apt,
            Backend::Dnf,
            Backend::Flatpak,
            Backend::Snap,
            Backend::Cargo,
            Backend::Npm,
            Backend::Pip,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            Backend::Pacman => "pacman",
            Backend::Yay => "yay",
            Backend::Paru => "paru",
            Backend::Apt => "apt",
            Backend::Dnf => "dnf",
            Backend::Flatpak => "flatpak",
            Backend::Snap => "snap",
            Backend::Cargo => "cargo",
            Backend::Npm => "npm",
            Backend::Pip => "pip",
        }
    }

    /// Packaging family this backend belongs to, if any
    pub fn family(&self) -> Option<DistroFamily> {
        match self {
            Backend::Pacman | Backend::Yay | Backend::Paru => Some(DistroFamily::Arch),
            Backend::Apt => Some(DistroFamily::Debian),
            Backend::Dnf => Some(DistroFamily::Fedora),
            _ => None,
        }
    }

    /// Whether this is a distribution's own package manager
    pub fn is_native(&self) -> bool {
        matches!(self, Backend::Pacman | Backend::Apt | Backend::Dnf)
    }

    pub fn os_affinity(&self) -> OsAffinity {
        match self.family() {
            Some(DistroFamily::Arch) => OsAffinity::Arch,
            Some(DistroFamily::Debian) => OsAffinity::Debian,
            Some(DistroFamily::Fedora) => OsAffinity::Fedora,
            None => OsAffinity::Universal,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pacman" => Ok(Backend::Pacman),
            "yay" => Ok(Backend::Yay),
            "paru" => Ok(Backend::Paru),
            "apt" => Ok(Backend::Apt),
            "dnf" => Ok(Backend::Dnf),
            "flatpak" => Ok(Backend::Flatpak),
            "snap" => Ok(Backend::Snap),
            "cargo" => Ok(Backend::Cargo),
            "npm" => Ok(Backend::Npm),
            "pip" | "pypi" => Ok(Backend::Pip),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// Which OS family a record is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsAffinity {
    Arch,
    Debian,
    Fedora,
    Universal,
}

impl OsAffinity {
    pub fn as_str(&self) -> &str {
        match self {
            OsAffinity::Arch => "arch",
            OsAffinity::Debian => "debian",
            OsAffinity::Fedora => "fedora",
            OsAffinity::Universal => "universal",
        }
    }
}

/// One search hit from one backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    pub backend: Backend,
    pub repository: String,
    pub description: String,
    pub installed: bool,
    /// Relevance to the current query, assigned by ranking
    pub score: u32,
    /// Installed size in MB, 0 when unknown
    pub size_mb: f64,
    pub os_affinity: OsAffinity,
}

impl PackageRecord {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        backend: Backend,
        repository: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            backend,
            repository: repository.into(),
            description: description.into(),
            installed: false,
            score: 0,
            size_mb: 0.0,
            os_affinity: backend.os_affinity(),
        }
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} {}",
            self.backend, self.repository, self.name, self.version
        )?;
        if self.size_mb > 0.0 {
            write!(f, " ({:.1} MB)", self.size_mb)?;
        }
        if self.os_affinity != OsAffinity::Universal {
            write!(f, " [{}]", self.os_affinity.as_str())?;
        }
        if self.installed {
            write!(f, " [installed]")?;
        }
        Ok(())
    }
}

/// Common interface for all search backends
pub trait BackendAdapter: Send + Sync {
    /// Which backend this adapter queries
    fn backend(&self) -> Backend;

    /// Whether the backend's tooling is present on this host
    fn is_available(&self) -> bool;

    /// Search the backend for `term`
    ///
    /// Never fails: unavailable tooling or bad output yields an empty list.
    fn search(&self, term: &str) -> Vec<PackageRecord>;

    /// Files owned by an installed package
    ///
    /// None means the backend cannot answer, which is different from a
    /// package that owns no files. The native adapters read the local
    /// package database (`pacman -Ql`, `dpkg -L`, `rpm -ql`), so a
    /// candidate that is not installed yet always yields None and the
    /// file overlap check skips it.
    fn files_owned_by(&self, _package: &str) -> Option<BTreeSet<String>> {
        None
    }
}

/// Tunables shared by every adapter
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Look up installed/download sizes (one extra command per record)
    pub lookup_sizes: bool,
    pub http_timeout: Duration,
    pub pypi_url: String,
    pub snap_api_url: String,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            lookup_sizes: false,
            http_timeout: HTTP_TIMEOUT,
            pypi_url: pypi::DEFAULT_PYPI_URL.to_string(),
            snap_api_url: snap::DEFAULT_SNAP_API_URL.to_string(),
        }
    }
}

/// Build a blocking HTTP client for registry lookups
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("pkgscout/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {}", e)))
}

/// Instantiate adapters for the requested backends, in the given order
///
/// Availability is not checked here; the search coordinator skips
/// adapters whose tooling is missing.
pub fn build_adapters(
    backends: &[Backend],
    runner: Arc<dyn CommandRunner>,
    options: &AdapterOptions,
) -> Vec<Arc<dyn BackendAdapter>> {
    let needs_http = backends
        .iter()
        .any(|b| matches!(b, Backend::Snap | Backend::Pip));
    let client = if needs_http {
        match http_client(options.http_timeout) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Registry lookups disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut adapters: Vec<Arc<dyn BackendAdapter>> = Vec::with_capacity(backends.len());
    for backend in backends {
        let runner = Arc::clone(&runner);
        let adapter: Arc<dyn BackendAdapter> = match backend {
            Backend::Pacman => Arc::new(
                pacman::PacmanAdapter::pacman(runner).with_size_lookup(options.lookup_sizes),
            ),
            Backend::Yay | Backend::Paru => Arc::new(pacman::PacmanAdapter::aur(runner, *backend)),
            Backend::Apt => {
                Arc::new(apt::AptAdapter::new(runner).with_size_lookup(options.lookup_sizes))
            }
            Backend::Dnf => Arc::new(dnf::DnfAdapter::new(runner)),
            Backend::Flatpak => Arc::new(
                flatpak::FlatpakAdapter::new(runner).with_size_lookup(options.lookup_sizes),
            ),
            Backend::Snap => Arc::new(snap::SnapAdapter::new(
                runner,
                client.clone(),
                options.snap_api_url.clone(),
            )),
            Backend::Cargo => Arc::new(cargo::CargoAdapter::new(runner)),
            Backend::Npm => Arc::new(npm::NpmAdapter::new(runner)),
            Backend::Pip => Arc::new(pypi::PypiAdapter::new(
                runner,
                client.clone(),
                options.pypi_url.clone(),
            )),
        };
        adapters.push(adapter);
    }

    debug!("Built {} backend adapters", adapters.len());
    adapters
}

/// Adapter able to list files of installed packages for a family
pub fn file_provider(
    family: DistroFamily,
    runner: Arc<dyn CommandRunner>,
) -> Arc<dyn BackendAdapter> {
    match family {
        DistroFamily::Arch => Arc::new(pacman::PacmanAdapter::pacman(runner)),
        DistroFamily::Debian => Arc::new(apt::AptAdapter::new(runner)),
        DistroFamily::Fedora => Arc::new(dnf::DnfAdapter::new(runner)),
    }
}

/// Parse a human-readable size such as `45.2 MiB` or `1.2 GB` into MB
///
/// Binary and decimal units are treated alike, matching what package
/// managers print.
pub fn parse_size_mb(text: &str) -> Option<f64> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let value: f64 = number.replace(',', "").parse().ok()?;

    let unit = unit.trim().to_ascii_uppercase();
    let unit = unit.split_whitespace().next().unwrap_or("");
    match unit {
        "B" | "BYTES" => Some(value / (1024.0 * 1024.0)),
        "K" | "KB" | "KIB" => Some(value / 1024.0),
        "M" | "MB" | "MIB" | "" => Some(value),
        "G" | "GB" | "GIB" => Some(value * 1024.0),
        _ => None,
    }
}
