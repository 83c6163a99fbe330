// src/config.rs

//! Configuration: TOML file plus `PKGSCOUT_*` environment overrides
//!
//! Every field has a default, so a missing file or a file naming only a
//! few keys is fine. The environment is applied on top of the file once,
//! in [`Config::load`].

use crate::backends::{AdapterOptions, Backend, pypi, snap};
use crate::conflict::OracleCapabilities;
use crate::error::{Error, Result};
use crate::search;
use crate::translate::DistroFamily;
use serde::{Deserialize, Serialize};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_PREFIX: &str = "PKGSCOUT_";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "pkgscout.db";
const SYSTEM_CONFIG_PATH: &str = "/etc/pkgscout/config.toml";
const SYSTEM_CACHE_DIR: &str = "/var/cache/pkgscout";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Holds the database and the community conflict overlay
    pub cache_dir: PathBuf,
    /// Defaults to `<cache_dir>/pkgscout.db`
    pub db_path: Option<PathBuf>,
    /// Backends queried concurrently
    pub concurrency: usize,
    /// Overall search deadline
    pub timeout_secs: u64,
    pub http_timeout_secs: u64,
    /// Backends to search; empty means all of them
    pub backends: Vec<Backend>,
    /// Family whose package manager earns the ranking bonus; detected when unset
    pub native_family: Option<DistroFamily>,
    pub lookup_sizes: bool,
    pub file_overlap: bool,
    pub community_overlay: bool,
    /// Log filter used when `RUST_LOG` is unset
    pub log: String,
    pub pypi_url: String,
    pub snap_api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            db_path: None,
            concurrency: search::DEFAULT_CONCURRENCY,
            timeout_secs: search::DEFAULT_TIMEOUT.as_secs(),
            http_timeout_secs: crate::backends::HTTP_TIMEOUT.as_secs(),
            backends: Vec::new(),
            native_family: None,
            lookup_sizes: false,
            file_overlap: false,
            community_overlay: false,
            log: "warn".to_string(),
            pypi_url: pypi::DEFAULT_PYPI_URL.to_string(),
            snap_api_url: snap::DEFAULT_SNAP_API_URL.to_string(),
        }
    }
}

fn running_as_root() -> bool {
    std::fs::metadata("/proc/self")
        .map(|meta| meta.uid() == 0)
        .unwrap_or(false)
}

fn default_cache_dir() -> PathBuf {
    if running_as_root() {
        return PathBuf::from(SYSTEM_CACHE_DIR);
    }
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pkgscout")
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::ConfigError(format!(
            "{}{} must be a boolean, got '{}'",
            ENV_PREFIX, key, other
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        Error::ConfigError(format!(
            "{}{} must be a number, got '{}'",
            ENV_PREFIX, key, value
        ))
    })
}

impl Config {
    /// Per-user config file, or the system-wide one when running as root
    pub fn default_path() -> Option<PathBuf> {
        if running_as_root() {
            return Some(PathBuf::from(SYSTEM_CONFIG_PATH));
        }
        dirs::config_dir().map(|dir| dir.join("pkgscout").join(CONFIG_FILE_NAME))
    }

    /// Load the config file (explicit path or the default location) and
    /// apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);

        let mut config = match &path {
            Some(path) if path.exists() => Self::load_file(path)?,
            _ => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())?;
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Override fields from environment variables
    ///
    /// `lookup` receives the key without the `PKGSCOUT_` prefix.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CACHE_DIR") {
            self.cache_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("DB_PATH") {
            self.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("CONCURRENCY") {
            self.concurrency = parse_number("CONCURRENCY", &value)?;
        }
        if let Some(value) = lookup("TIMEOUT_SECS") {
            self.timeout_secs = parse_number("TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("NATIVE_FAMILY") {
            let family = value.parse::<DistroFamily>().map_err(Error::ConfigError)?;
            self.native_family = Some(family);
        }
        if let Some(value) = lookup("LOOKUP_SIZES") {
            self.lookup_sizes = parse_bool("LOOKUP_SIZES", &value)?;
        }
        if let Some(value) = lookup("FILE_OVERLAP") {
            self.file_overlap = parse_bool("FILE_OVERLAP", &value)?;
        }
        if let Some(value) = lookup("COMMUNITY_OVERLAY") {
            self.community_overlay = parse_bool("COMMUNITY_OVERLAY", &value)?;
        }
        if let Some(value) = lookup("BACKENDS") {
            self.backends = value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| name.parse::<Backend>().map_err(Error::ConfigError))
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(value) = lookup("LOG") {
            self.log = value;
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.cache_dir.join(DB_FILE_NAME))
    }

    /// Database path as the string form the storage layer takes
    pub fn db_path_string(&self) -> String {
        self.db_path().to_string_lossy().into_owned()
    }

    /// Configured backends, or every backend when none are listed
    pub fn backends(&self) -> Vec<Backend> {
        if self.backends.is_empty() {
            Backend::all().to_vec()
        } else {
            self.backends.clone()
        }
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions {
            lookup_sizes: self.lookup_sizes,
            http_timeout: Duration::from_secs(self.http_timeout_secs.max(1)),
            pypi_url: self.pypi_url.clone(),
            snap_api_url: self.snap_api_url.clone(),
        }
    }

    pub fn oracle_capabilities(&self) -> OracleCapabilities {
        OracleCapabilities {
            file_overlap: self.file_overlap,
            community_overlay: self.community_overlay,
        }
    }
}
