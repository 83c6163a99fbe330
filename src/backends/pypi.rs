// src/backends/pypi.rs

//! PyPI backend
//!
//! PyPI has no search API, so this is a direct project lookup through the
//! JSON API: a hit yields exactly one record, anything else yields none.

use super::{Backend, BackendAdapter, CommandRunner, PackageRecord};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_PYPI_URL: &str = "https://pypi.org";

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    info: ProjectInfo,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

pub struct PypiAdapter {
    runner: Arc<dyn CommandRunner>,
    client: Option<Client>,
    base_url: String,
}

impl PypiAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>, client: Option<Client>, base_url: String) -> Self {
        Self {
            runner,
            client,
            base_url,
        }
    }

    fn project_url(&self, term: &str) -> String {
        format!("{}/pypi/{}/json", self.base_url.trim_end_matches('/'), term)
    }
}

impl BackendAdapter for PypiAdapter {
    fn backend(&self) -> Backend {
        Backend::Pip
    }

    fn is_available(&self) -> bool {
        self.runner.has_command("pip") || self.runner.has_command("pip3")
    }

    fn search(&self, term: &str) -> Vec<PackageRecord> {
        let Some(client) = &self.client else {
            return Vec::new();
        };
        if term.is_empty() || term.contains(['/', '?', '#', ' ']) {
            return Vec::new();
        }

        let url = self.project_url(term);
        let response = match client.get(&url).send() {
            Ok(response) => response,
            Err(e) => {
                warn!("PyPI request failed: {}", e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            debug!("PyPI returned HTTP {} for {}", response.status(), term);
            return Vec::new();
        }

        match response.text() {
            Ok(body) => parse_project_response(&body, term).into_iter().collect(),
            Err(e) => {
                warn!("Failed to read PyPI response: {}", e);
                Vec::new()
            }
        }
    }
}

/// Build a record from a PyPI project JSON document
pub fn parse_project_response(body: &str, term: &str) -> Option<PackageRecord> {
    let response: ProjectResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            debug!("Malformed PyPI response for {}: {}", term, e);
            return None;
        }
    };

    let info = response.info;
    Some(PackageRecord::new(
        info.name.filter(|n| !n.is_empty()).unwrap_or_else(|| term.to_string()),
        info.version.unwrap_or_else(|| "unknown".to_string()),
        Backend::Pip,
        "pypi",
        info.summary.unwrap_or_default(),
    ))
}
