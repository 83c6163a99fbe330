// src/conflict/mod.rs

//! Conflict detection before install
//!
//! The oracle inspects a candidate package against what is already
//! installed and the host's hardware/session, and reports conflicts
//! ordered most severe first. It only returns data; presenting the
//! options and acting on a choice is left to the caller.

pub mod log;
pub mod rules;

pub use log::ResolutionLog;
pub use rules::{ConflictRule, builtin_rules, candidate_bases, load_overlay, strip_qualifier};

use crate::backends::BackendAdapter;
use crate::error::{Error, Result};
use crate::profile::SystemInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File name of the community rule overlay inside the cache directory
pub const OVERLAY_FILE_NAME: &str = "conflict_overlay.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Matched a known rule
    Known,
    /// Two packages own the same paths
    File,
    /// Incompatible with detected hardware
    Hardware,
    /// Incompatible with the running session
    System,
}

impl ConflictKind {
    pub fn as_str(&self) -> &str {
        match self {
            ConflictKind::Known => "known",
            ConflictKind::File => "file",
            ConflictKind::Hardware => "hardware",
            ConflictKind::System => "system",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "known" => Ok(ConflictKind::Known),
            "file" => Ok(ConflictKind::File),
            "hardware" => Ok(ConflictKind::Hardware),
            "system" => Ok(ConflictKind::System),
            _ => Err(format!("Unknown conflict type: {}", s)),
        }
    }
}

/// Ordered most severe first, so sorting ascending puts critical on top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conflict found for a candidate package
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedConflict {
    pub kind: ConflictKind,
    pub severity: Severity,
    /// The candidate being checked
    pub conflicting_package: String,
    /// The installed package it clashes with, if any
    pub installed_package: Option<String>,
    pub description: String,
    pub options: Vec<String>,
    pub recommended: usize,
    pub votes: u32,
    pub affected_users: u32,
}

/// Optional checks that cost extra work or trust
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleCapabilities {
    /// Compare file lists of the candidate and every installed package
    pub file_overlap: bool,
    /// Merge rules from the community overlay file
    pub community_overlay: bool,
}

struct SystemRule {
    kind: ConflictKind,
    severity: Severity,
    applies: fn(&SystemInfo) -> bool,
    fragments: &'static [&'static str],
    description: &'static str,
    options: &'static [&'static str],
}

fn has_nvidia_gpu(system: &SystemInfo) -> bool {
    system
        .gpu_vendor
        .as_deref()
        .is_some_and(|vendor| vendor.to_lowercase().contains("nvidia"))
}

fn is_wayland_session(system: &SystemInfo) -> bool {
    system
        .session_type
        .as_deref()
        .is_some_and(|session| session.eq_ignore_ascii_case("wayland"))
}

static SYSTEM_RULES: &[SystemRule] = &[
    SystemRule {
        kind: ConflictKind::Hardware,
        severity: Severity::Critical,
        applies: has_nvidia_gpu,
        fragments: &["nouveau", "xf86-video-nouveau"],
        description: "This package conflicts with NVIDIA GPU",
        options: &[
            "Use NVIDIA drivers instead",
            "Remove NVIDIA card (not recommended)",
            "Install anyway (will likely fail)",
        ],
    },
    SystemRule {
        kind: ConflictKind::System,
        severity: Severity::Warning,
        applies: is_wayland_session,
        fragments: &["xorg", "xf86"],
        description: "This package is X11-only, you're running Wayland",
        options: &[
            "Install XWayland compatibility layer",
            "Switch to X11 session",
            "Find Wayland alternative",
        ],
    },
];

/// Checks candidate packages for conflicts before they are installed
pub struct ConflictOracle {
    rules: Vec<ConflictRule>,
    capabilities: OracleCapabilities,
    file_provider: Option<Arc<dyn BackendAdapter>>,
    log: Option<ResolutionLog>,
}

impl ConflictOracle {
    /// Oracle with the built-in rules only
    pub fn new(capabilities: OracleCapabilities) -> Self {
        Self {
            rules: builtin_rules().to_vec(),
            capabilities,
            file_provider: None,
            log: None,
        }
    }

    /// Merge the community overlay found in `cache_dir`
    ///
    /// Does nothing unless the `community_overlay` capability is enabled.
    pub fn with_overlay_dir(self, cache_dir: &Path) -> Self {
        if !self.capabilities.community_overlay {
            return self;
        }
        let overlay = load_overlay(&cache_dir.join(OVERLAY_FILE_NAME));
        self.with_rules(overlay)
    }

    /// Append extra rules after the ones already loaded
    pub fn with_rules(mut self, rules: Vec<ConflictRule>) -> Self {
        if !rules.is_empty() {
            info!("Merged {} extra conflict rules", rules.len());
        }
        self.rules.extend(rules);
        self
    }

    /// Adapter used to list files owned by installed packages
    pub fn with_file_provider(mut self, provider: Arc<dyn BackendAdapter>) -> Self {
        self.file_provider = Some(provider);
        self
    }

    pub fn with_resolution_log(mut self, log: ResolutionLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn rules(&self) -> &[ConflictRule] {
        &self.rules
    }

    pub fn capabilities(&self) -> OracleCapabilities {
        self.capabilities
    }

    /// The log resolutions are written to, for reporting outcomes later
    pub fn resolution_log(&self) -> Option<&ResolutionLog> {
        self.log.as_ref()
    }

    /// Everything that would go wrong installing `candidate`
    ///
    /// Known rules run first, then file overlap, then hardware and session
    /// checks. The result is ordered critical, warning, info; within a tier
    /// conflicts keep the order they were found in.
    pub fn check_conflicts(
        &self,
        candidate: &str,
        installed: &BTreeSet<String>,
        system: &SystemInfo,
    ) -> Vec<DetectedConflict> {
        let lowered: BTreeSet<String> = installed.iter().map(|name| name.to_lowercase()).collect();

        let mut conflicts = self.check_known(candidate, &lowered);
        conflicts.extend(self.check_file_overlap(candidate, installed));
        conflicts.extend(check_system(candidate, system));

        conflicts.sort_by_key(|conflict| conflict.severity);
        debug!("{} conflicts found for {}", conflicts.len(), candidate);
        conflicts
    }

    fn check_known(&self, candidate: &str, installed: &BTreeSet<String>) -> Vec<DetectedConflict> {
        let bases = candidate_bases(candidate);
        let mut conflicts = Vec::new();

        for rule in &self.rules {
            let trigger = rule.trigger_base();
            if !bases.iter().any(|base| *base == trigger) {
                continue;
            }

            for pattern in &rule.conflicts_with {
                if let Some(found) = Self::installed_match(pattern, installed) {
                    conflicts.push(known_conflict(candidate, rule, found, rule.severity));
                }
            }
            for pattern in &rule.warns_with {
                if let Some(found) = Self::installed_match(pattern, installed) {
                    conflicts.push(known_conflict(candidate, rule, found, Severity::Warning));
                }
            }
        }

        conflicts
    }

    /// Installed name matching a rule pattern, by exact lower-cased membership
    fn installed_match(pattern: &str, installed: &BTreeSet<String>) -> Option<String> {
        let base = strip_qualifier(pattern).to_lowercase();
        if base.is_empty() || !installed.contains(&base) {
            return None;
        }
        Some(base)
    }

    fn check_file_overlap(
        &self,
        candidate: &str,
        installed: &BTreeSet<String>,
    ) -> Vec<DetectedConflict> {
        if !self.capabilities.file_overlap {
            return Vec::new();
        }
        let Some(provider) = &self.file_provider else {
            return Vec::new();
        };
        let Some(candidate_files) = provider.files_owned_by(candidate) else {
            debug!("No file list for {}, skipping overlap check", candidate);
            return Vec::new();
        };

        let mut conflicts = Vec::new();
        for package in installed {
            if package.eq_ignore_ascii_case(candidate) {
                continue;
            }
            let Some(files) = provider.files_owned_by(package) else {
                continue;
            };

            let overlap = candidate_files.intersection(&files).count();
            if overlap > 1 {
                conflicts.push(DetectedConflict {
                    kind: ConflictKind::File,
                    severity: Severity::Critical,
                    conflicting_package: candidate.to_string(),
                    installed_package: Some(package.clone()),
                    description: format!("{} file conflicts detected", overlap),
                    options: vec![
                        format!("Remove {} first", package),
                        "Force install (may break system)".to_string(),
                        "Cancel installation".to_string(),
                    ],
                    recommended: 0,
                    votes: 0,
                    affected_users: 0,
                });
            }
        }

        conflicts
    }

    /// Record the resolution chosen for `conflict`
    ///
    /// Never fails the caller: storage errors are logged and swallowed.
    /// Returns the log ID when the entry was written.
    pub fn log_resolution(&self, conflict: &DetectedConflict, resolution: &str) -> Option<i64> {
        let log = self.log.as_ref()?;
        match log.append(&conflict.conflicting_package, conflict.kind, resolution) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(
                    "Failed to log resolution for {}: {}",
                    conflict.conflicting_package, e
                );
                None
            }
        }
    }
}

fn known_conflict(
    candidate: &str,
    rule: &ConflictRule,
    installed: String,
    severity: Severity,
) -> DetectedConflict {
    DetectedConflict {
        kind: ConflictKind::Known,
        severity,
        conflicting_package: candidate.to_string(),
        installed_package: Some(installed),
        description: rule.description.clone(),
        options: rule.options.clone(),
        recommended: rule.recommended,
        votes: rule.votes,
        affected_users: rule.affected_users,
    }
}

fn check_system(candidate: &str, system: &SystemInfo) -> Vec<DetectedConflict> {
    let lowered = candidate.to_lowercase();

    SYSTEM_RULES
        .iter()
        .filter(|rule| (rule.applies)(system))
        .filter(|rule| rule.fragments.iter().any(|fragment| lowered.contains(fragment)))
        .map(|rule| DetectedConflict {
            kind: rule.kind,
            severity: rule.severity,
            conflicting_package: candidate.to_string(),
            installed_package: None,
            description: rule.description.to_string(),
            options: rule.options.iter().map(|o| o.to_string()).collect(),
            recommended: 0,
            votes: 0,
            affected_users: 0,
        })
        .collect()
}

/// The options offered to the user for a set of conflicts
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionPrompt {
    pub conflict: DetectedConflict,
    pub options: Vec<String>,
    pub default: usize,
}

impl ResolutionPrompt {
    /// Validate a zero-based option index and return its text
    pub fn choose(&self, choice: usize) -> Result<&str> {
        self.options
            .get(choice)
            .map(String::as_str)
            .ok_or(Error::InvalidChoice {
                choice,
                available: self.options.len(),
            })
    }

    pub fn default_choice(&self) -> Option<&str> {
        self.options.get(self.default).map(String::as_str)
    }
}

/// Prompt for the most severe conflict only
///
/// Resolving the first conflict usually changes what else conflicts, so
/// the rest are re-checked after it is handled rather than prompted now.
pub fn resolution_prompt(conflicts: &[DetectedConflict]) -> Option<ResolutionPrompt> {
    let first = conflicts.first()?;
    Some(ResolutionPrompt {
        conflict: first.clone(),
        options: first.options.clone(),
        default: first.recommended.min(first.options.len().saturating_sub(1)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{Backend, PackageRecord};
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct FakeFiles {
        files: HashMap<String, BTreeSet<String>>,
    }

    impl FakeFiles {
        fn new(entries: &[(&str, &[&str])]) -> Self {
            let files = entries
                .iter()
                .map(|(pkg, paths)| {
                    (
                        pkg.to_string(),
                        paths.iter().map(|p| p.to_string()).collect(),
                    )
                })
                .collect();
            Self { files }
        }
    }

    impl BackendAdapter for FakeFiles {
        fn backend(&self) -> Backend {
            Backend::Pacman
        }

        fn is_available(&self) -> bool {
            true
        }

        fn search(&self, _term: &str) -> Vec<PackageRecord> {
            Vec::new()
        }

        fn files_owned_by(&self, package: &str) -> Option<BTreeSet<String>> {
            self.files.get(package).cloned()
        }
    }

    fn installed(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_nvidia_dkms_conflicts_with_nouveau() {
        let oracle = ConflictOracle::new(OracleCapabilities::default());
        let conflicts =
            oracle.check_conflicts("nvidia-dkms", &installed(&["nouveau"]), &SystemInfo::default());

        assert_eq!(conflicts.len(), 1);
        let conflict = &conflicts[0];
        assert_eq!(conflict.kind, ConflictKind::Known);
        assert_eq!(conflict.severity, Severity::Critical);
        assert_eq!(conflict.installed_package.as_deref(), Some("nouveau"));
        assert_eq!(conflict.recommended, 0);
        assert_eq!(conflict.conflicting_package, "nvidia-dkms");
    }

    #[test]
    fn test_no_conflicts_without_installed_match() {
        let oracle = ConflictOracle::new(OracleCapabilities::default());
        let conflicts =
            oracle.check_conflicts("wine-staging", &installed(&["winetricks"]), &SystemInfo::default());
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_version_qualified_patterns_match_base_name() {
        let oracle = ConflictOracle::new(OracleCapabilities::default());

        let cuda = oracle.check_conflicts("cuda", &installed(&["NVIDIA"]), &SystemInfo::default());
        assert_eq!(cuda.len(), 1);
        assert_eq!(cuda[0].installed_package.as_deref(), Some("nvidia"));

        // warns_with always reports a warning
        let wayland = oracle.check_conflicts("wayland", &installed(&["nvidia"]), &SystemInfo::default());
        assert_eq!(wayland.len(), 1);
        assert_eq!(wayland[0].severity, Severity::Warning);
    }

    #[test]
    fn test_rule_pattern_needs_exact_installed_name() {
        let remake = ConflictRule {
            trigger: "remake".to_string(),
            conflicts_with: vec!["make".to_string()],
            warns_with: Vec::new(),
            severity: Severity::Critical,
            description: "remake replaces make".to_string(),
            options: vec!["Remove make".to_string()],
            recommended: 0,
            votes: 0,
            affected_users: 0,
        };
        let oracle = ConflictOracle::new(OracleCapabilities::default()).with_rules(vec![remake]);

        // gcc shares a mapping row with make but is a different package
        let conflicts = oracle.check_conflicts("remake", &installed(&["gcc"]), &SystemInfo::default());
        assert!(conflicts.is_empty());

        let conflicts = oracle.check_conflicts("remake", &installed(&["Make"]), &SystemInfo::default());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].installed_package.as_deref(), Some("make"));
    }

    #[test]
    fn test_warns_with_downgrades_critical_rule() {
        let rule = ConflictRule {
            trigger: "gamescope".to_string(),
            conflicts_with: vec!["gamescope-git".to_string()],
            warns_with: vec!["mangohud".to_string()],
            severity: Severity::Critical,
            description: "gamescope overlaps with these packages".to_string(),
            options: vec!["Remove the other package".to_string(), "Keep both".to_string()],
            recommended: 0,
            votes: 0,
            affected_users: 0,
        };
        let oracle = ConflictOracle::new(OracleCapabilities::default()).with_rules(vec![rule]);

        // the warning stays behind the critical match from the same rule
        let conflicts = oracle.check_conflicts(
            "gamescope",
            &installed(&["mangohud", "gamescope-git"]),
            &SystemInfo::default(),
        );
        let found: Vec<(Option<&str>, Severity)> = conflicts
            .iter()
            .map(|c| (c.installed_package.as_deref(), c.severity))
            .collect();
        assert_eq!(
            found,
            vec![
                (Some("gamescope-git"), Severity::Critical),
                (Some("mangohud"), Severity::Warning),
            ]
        );

        let only_warning =
            oracle.check_conflicts("gamescope", &installed(&["mangohud"]), &SystemInfo::default());
        assert_eq!(only_warning.len(), 1);
        assert_eq!(only_warning[0].severity, Severity::Warning);
    }

    #[test]
    fn test_severity_ordering_is_stable() {
        let system = SystemInfo {
            gpu_vendor: Some("NVIDIA Corporation".to_string()),
            session_type: Some("wayland".to_string()),
            kernel_version: None,
        };
        let oracle = ConflictOracle::new(OracleCapabilities::default());
        let conflicts = oracle.check_conflicts("xf86-video-nouveau", &BTreeSet::new(), &system);

        let kinds: Vec<(ConflictKind, Severity)> =
            conflicts.iter().map(|c| (c.kind, c.severity)).collect();
        assert_eq!(
            kinds,
            vec![
                (ConflictKind::Hardware, Severity::Critical),
                (ConflictKind::System, Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_warning_sorted_after_critical() {
        let extra = ConflictRule {
            trigger: "pipewire".to_string(),
            conflicts_with: vec!["jack2".to_string()],
            warns_with: Vec::new(),
            severity: Severity::Critical,
            description: "pipewire-jack replaces jack2".to_string(),
            options: vec!["Remove jack2".to_string()],
            recommended: 0,
            votes: 12,
            affected_users: 3,
        };
        let oracle = ConflictOracle::new(OracleCapabilities::default()).with_rules(vec![extra]);

        let conflicts = oracle.check_conflicts(
            "pipewire",
            &installed(&["pulseaudio", "jack2"]),
            &SystemInfo::default(),
        );
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].installed_package.as_deref(), Some("jack2"));
        assert_eq!(conflicts[0].affected_users, 3);
        assert_eq!(conflicts[1].severity, Severity::Warning);
        assert_eq!(conflicts[1].recommended, 1);
    }

    #[test]
    fn test_file_overlap_needs_capability_and_provider() {
        let provider = Arc::new(FakeFiles::new(&[
            ("wine-staging", &["/usr/bin/wine", "/usr/bin/wineserver", "/usr/lib/wine/a.so"]),
            ("wine-mono", &["/usr/share/wine/mono/x.msi"]),
            ("wine-helper", &["/usr/bin/wine", "/usr/share/doc/helper"]),
            ("wine-legacy", &["/usr/bin/wine", "/usr/bin/wineserver"]),
        ]));
        let packages = installed(&["wine-legacy", "wine-mono", "wine-helper", "wine-staging"]);

        let disabled = ConflictOracle::new(OracleCapabilities::default())
            .with_file_provider(provider.clone());
        assert!(disabled
            .check_conflicts("wine-staging", &packages, &SystemInfo::default())
            .is_empty());

        let caps = OracleCapabilities {
            file_overlap: true,
            community_overlay: false,
        };
        assert!(ConflictOracle::new(caps)
            .check_conflicts("wine-staging", &packages, &SystemInfo::default())
            .is_empty());

        let oracle = ConflictOracle::new(caps).with_file_provider(provider);
        let conflicts = oracle.check_conflicts("wine-staging", &packages, &SystemInfo::default());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::File);
        assert_eq!(conflicts[0].installed_package.as_deref(), Some("wine-legacy"));
        assert_eq!(conflicts[0].description, "2 file conflicts detected");
        assert_eq!(conflicts[0].options[0], "Remove wine-legacy first");

        // Candidate with no file list contributes nothing
        assert!(oracle
            .check_conflicts("not-installed", &packages, &SystemInfo::default())
            .is_empty());
    }

    #[test]
    fn test_overlay_only_with_capability() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(OVERLAY_FILE_NAME),
            r#"[{"trigger": "tlp", "conflicts_with": ["power-profiles-daemon"],
                 "severity": "warning", "description": "Both tune power",
                 "options": ["Remove power-profiles-daemon"], "votes": 40}]"#,
        )
        .unwrap();

        let off = ConflictOracle::new(OracleCapabilities::default()).with_overlay_dir(temp_dir.path());
        assert_eq!(off.rules().len(), builtin_rules().len());

        let caps = OracleCapabilities {
            file_overlap: false,
            community_overlay: true,
        };
        let on = ConflictOracle::new(caps).with_overlay_dir(temp_dir.path());
        assert_eq!(on.rules().len(), builtin_rules().len() + 1);

        let conflicts = on.check_conflicts(
            "tlp",
            &installed(&["power-profiles-daemon"]),
            &SystemInfo::default(),
        );
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].votes, 40);
    }

    #[test]
    fn test_resolution_prompt_first_only() {
        assert!(resolution_prompt(&[]).is_none());

        let oracle = ConflictOracle::new(OracleCapabilities::default());
        let conflicts = oracle.check_conflicts(
            "pipewire",
            &installed(&["pulseaudio"]),
            &SystemInfo::default(),
        );
        let prompt = resolution_prompt(&conflicts).unwrap();
        assert_eq!(prompt.default, 1);
        assert_eq!(
            prompt.default_choice(),
            Some("Use pipewire-pulse (compatibility layer)")
        );
        assert_eq!(prompt.choose(2).unwrap(), "Keep PulseAudio");

        match prompt.choose(3) {
            Err(Error::InvalidChoice { choice, available }) => {
                assert_eq!((choice, available), (3, 3));
            }
            other => panic!("expected InvalidChoice, got {:?}", other),
        }
    }

    #[test]
    fn test_log_resolution() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("pkgscout.db");

        let oracle = ConflictOracle::new(OracleCapabilities::default());
        let conflicts =
            oracle.check_conflicts("nvidia", &installed(&["nouveau"]), &SystemInfo::default());

        // No log attached
        assert!(oracle.log_resolution(&conflicts[0], "Keep nouveau").is_none());

        let oracle = oracle.with_resolution_log(ResolutionLog::new(db_path.to_str().unwrap()));
        let id = oracle
            .log_resolution(&conflicts[0], &conflicts[0].options[0])
            .unwrap();

        let log = oracle.resolution_log().unwrap();
        assert!(log.set_success(id, true).unwrap());
        let entries = log.find_by_package("nvidia").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].conflict_type, ConflictKind::Known);
        assert_eq!(entries[0].success, Some(true));
    }

    #[test]
    fn test_log_resolution_swallows_errors() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be opened as a database
        let log = ResolutionLog::new(temp_dir.path().to_str().unwrap());
        let oracle = ConflictOracle::new(OracleCapabilities::default()).with_resolution_log(log);

        let conflicts =
            oracle.check_conflicts("nvidia", &installed(&["nouveau"]), &SystemInfo::default());
        assert!(oracle.log_resolution(&conflicts[0], "Keep nouveau").is_none());
    }

    #[test]
    fn test_conflict_kind_round_trip() {
        for kind in [
            ConflictKind::Known,
            ConflictKind::File,
            ConflictKind::Hardware,
            ConflictKind::System,
        ] {
            assert_eq!(kind.as_str().parse::<ConflictKind>().unwrap(), kind);
        }
        assert!("bogus".parse::<ConflictKind>().is_err());
    }
}
