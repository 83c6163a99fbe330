// src/conflict/rules.rs

//! Known conflict rules
//!
//! The built-in table covers the conflicts that bite people most often on
//! desktop Linux. Extra rules can be dropped into a JSON overlay file, which
//! is merged after the built-ins when the oracle is constructed.

use super::Severity;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Characters that start a version qualifier in a rule pattern
const QUALIFIER_CHARS: [char; 3] = ['<', '>', '='];

/// A known incompatibility between a package and others
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRule {
    /// Base package name, optionally version-qualified (`cuda`, `nvidia>=470`)
    pub trigger: String,
    #[serde(default)]
    pub conflicts_with: Vec<String>,
    /// Combinations that work but are known to be rough
    #[serde(default)]
    pub warns_with: Vec<String>,
    pub severity: Severity,
    pub description: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub recommended: usize,
    #[serde(default)]
    pub votes: u32,
    #[serde(default)]
    pub affected_users: u32,
}

impl ConflictRule {
    /// Trigger with any version qualifier removed, lower-cased
    pub fn trigger_base(&self) -> String {
        strip_qualifier(&self.trigger).to_lowercase()
    }
}

#[allow(clippy::too_many_arguments)]
fn rule(
    trigger: &str,
    conflicts_with: &[&str],
    warns_with: &[&str],
    severity: Severity,
    description: &str,
    options: &[&str],
    recommended: usize,
    votes: u32,
) -> ConflictRule {
    ConflictRule {
        trigger: trigger.to_string(),
        conflicts_with: conflicts_with.iter().map(|s| s.to_string()).collect(),
        warns_with: warns_with.iter().map(|s| s.to_string()).collect(),
        severity,
        description: description.to_string(),
        options: options.iter().map(|s| s.to_string()).collect(),
        recommended,
        votes,
        affected_users: 0,
    }
}

static BUILTIN_RULES: LazyLock<Vec<ConflictRule>> = LazyLock::new(|| {
    vec![
        rule(
            "wine-staging",
            &["wine"],
            &[],
            Severity::Critical,
            "wine-staging and wine provide the same files",
            &[
                "Remove wine first, then install wine-staging",
                "Install wine-ge-custom instead (no conflict)",
                "Force install (may break system)",
            ],
            0,
            1523,
        ),
        rule(
            "nvidia",
            &["nouveau"],
            &[],
            Severity::Critical,
            "NVIDIA proprietary drivers conflict with open-source Nouveau",
            &[
                "Blacklist nouveau, then install nvidia",
                "Use nvidia-open (hybrid approach)",
                "Keep nouveau (no proprietary drivers)",
            ],
            0,
            8492,
        ),
        rule(
            "cuda",
            &["nvidia<470"],
            &[],
            Severity::Critical,
            "CUDA requires NVIDIA driver version 470 or newer",
            &[
                "Update NVIDIA drivers first",
                "Use CUDA containers instead",
                "Install older CUDA version",
            ],
            0,
            2341,
        ),
        rule(
            "pipewire",
            &["pulseaudio"],
            &[],
            Severity::Warning,
            "PipeWire and PulseAudio both manage audio",
            &[
                "Replace PulseAudio with PipeWire (modern)",
                "Use pipewire-pulse (compatibility layer)",
                "Keep PulseAudio",
            ],
            1,
            5621,
        ),
        rule(
            "wayland",
            &[],
            &["nvidia<495"],
            Severity::Warning,
            "Wayland has issues with older NVIDIA drivers",
            &[
                "Update NVIDIA drivers to 495+",
                "Use X11 instead of Wayland",
                "Try anyway (may be unstable)",
            ],
            0,
            3127,
        ),
    ]
});

/// The built-in rule table
pub fn builtin_rules() -> &'static [ConflictRule] {
    &BUILTIN_RULES
}

/// Load extra rules from a JSON array on disk
///
/// A missing file is an empty overlay. Unreadable or malformed files are
/// logged and also yield an empty overlay.
pub fn load_overlay(path: &Path) -> Vec<ConflictRule> {
    if !path.exists() {
        debug!("No conflict overlay at {}", path.display());
        return Vec::new();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read conflict overlay {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match parse_overlay(&content) {
        Ok(rules) => {
            debug!("Loaded {} overlay rules from {}", rules.len(), path.display());
            rules
        }
        Err(e) => {
            warn!("Ignoring malformed conflict overlay {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

pub fn parse_overlay(content: &str) -> serde_json::Result<Vec<ConflictRule>> {
    serde_json::from_str(content)
}

/// Remove a trailing version qualifier: `nvidia<470` becomes `nvidia`
pub fn strip_qualifier(pattern: &str) -> &str {
    match pattern.find(QUALIFIER_CHARS) {
        Some(idx) => pattern[..idx].trim(),
        None => pattern.trim(),
    }
}

/// Names a candidate is matched under, most specific first
///
/// `nvidia-dkms` yields `nvidia-dkms` then `nvidia`; trailing segments are
/// stripped one at a time.
pub fn candidate_bases(candidate: &str) -> Vec<String> {
    let lowered = candidate.to_lowercase();
    let mut base = strip_qualifier(&lowered);
    let mut bases = Vec::new();

    while !base.is_empty() {
        bases.push(base.to_string());
        match base.rfind('-') {
            Some(idx) => base = &base[..idx],
            None => break,
        }
    }

    bases
}
