// src/profile.rs

//! Host profiling: distribution, installed packages, and GPU/session facts
//!
//! Detection never fails. Anything that cannot be read or run leaves the
//! corresponding field empty.

use crate::backends::CommandRunner;
use crate::translate::DistroFamily;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

pub const OS_RELEASE_PATH: &str = "/etc/os-release";
pub const KERNEL_RELEASE_PATH: &str = "/proc/sys/kernel/osrelease";

/// Hardware and session facts the conflict checks look at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// e.g. "NVIDIA", "AMD", "Intel"
    pub gpu_vendor: Option<String>,
    /// `XDG_SESSION_TYPE`: "wayland", "x11", "tty"
    pub session_type: Option<String>,
    pub kernel_version: Option<String>,
}

impl SystemInfo {
    pub fn detect(runner: &dyn CommandRunner) -> Self {
        let gpu_vendor = runner
            .run("lspci", &[])
            .filter(|output| output.success())
            .and_then(|output| parse_gpu_vendor(&output.stdout));

        let session_type = std::env::var("XDG_SESSION_TYPE")
            .ok()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let kernel_version = std::fs::read_to_string(KERNEL_RELEASE_PATH)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            gpu_vendor,
            session_type,
            kernel_version,
        }
    }
}

/// Vendor of the display controller listed by `lspci`
///
/// Hybrid laptops list more than one; NVIDIA wins when present since it is
/// the one driver conflicts hinge on.
pub fn parse_gpu_vendor(lspci_output: &str) -> Option<String> {
    let controllers: Vec<&str> = lspci_output
        .lines()
        .filter(|line| line.contains("VGA compatible controller") || line.contains("3D controller"))
        .filter_map(|line| line.split_once(": ").map(|(_, device)| device.trim()))
        .collect();

    let vendor_of = |device: &str| -> String {
        let lower = device.to_lowercase();
        if lower.contains("nvidia") {
            "NVIDIA".to_string()
        } else if lower.contains("amd") || lower.contains("ati technologies") {
            "AMD".to_string()
        } else if lower.contains("intel") {
            "Intel".to_string()
        } else {
            device.split_whitespace().next().unwrap_or(device).to_string()
        }
    };

    controllers
        .iter()
        .find(|device| device.to_lowercase().contains("nvidia"))
        .or(controllers.first())
        .map(|device| vendor_of(*device))
}

/// The fields of `/etc/os-release` worth knowing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub id_like: Vec<String>,
    pub version_id: Option<String>,
}

impl OsRelease {
    /// Packaging family from ID, falling back to ID_LIKE
    pub fn family(&self) -> Option<DistroFamily> {
        DistroFamily::from_distro_id(&self.id)
            .or_else(|| self.id_like.iter().find_map(|id| DistroFamily::from_distro_id(id)))
    }
}

pub fn parse_os_release(content: &str) -> OsRelease {
    let mut release = OsRelease::default();

    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        match key {
            "ID" => release.id = value.to_lowercase(),
            "ID_LIKE" => {
                release.id_like = value.split_whitespace().map(str::to_lowercase).collect();
            }
            "VERSION_ID" if !value.is_empty() => release.version_id = Some(value.to_string()),
            _ => {}
        }
    }

    release
}

/// One name per line, blanks dropped
pub fn parse_name_list(output: &str) -> impl Iterator<Item = String> + '_ {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

/// Commands that list installed package names, one per line
const INSTALLED_QUERIES: &[(&str, &[&str])] = &[
    ("pacman", &["-Qq"]),
    ("dpkg-query", &["-W", "-f=${Package}\\n"]),
    ("rpm", &["-qa", "--qf", "%{NAME}\\n"]),
    ("flatpak", &["list", "--app", "--columns=application"]),
];

/// What the host runs and has installed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostProfile {
    /// os-release ID, "unknown" when unreadable
    pub distro: String,
    /// os-release VERSION_ID, "rolling" when absent
    pub distro_version: String,
    pub family: Option<DistroFamily>,
    pub installed: BTreeSet<String>,
    pub system: SystemInfo,
}

impl HostProfile {
    pub fn detect(runner: &dyn CommandRunner) -> Self {
        Self::detect_from(runner, Path::new(OS_RELEASE_PATH))
    }

    pub fn detect_from(runner: &dyn CommandRunner, os_release: &Path) -> Self {
        let release = match std::fs::read_to_string(os_release) {
            Ok(content) => parse_os_release(&content),
            Err(e) => {
                debug!("Cannot read {}: {}", os_release.display(), e);
                OsRelease::default()
            }
        };

        let distro = if release.id.is_empty() {
            "unknown".to_string()
        } else {
            release.id.clone()
        };

        let profile = Self {
            distro,
            distro_version: release
                .version_id
                .clone()
                .unwrap_or_else(|| "rolling".to_string()),
            family: release.family(),
            installed: installed_packages(runner),
            system: SystemInfo::detect(runner),
        };

        debug!(
            "Host profile: {} {} ({} packages installed)",
            profile.distro,
            profile.distro_version,
            profile.installed.len()
        );
        profile
    }
}

/// Union of every installed-package listing the host supports
pub fn installed_packages(runner: &dyn CommandRunner) -> BTreeSet<String> {
    let mut installed = BTreeSet::new();

    for (program, args) in INSTALLED_QUERIES {
        if !runner.has_command(program) {
            continue;
        }
        match runner.run(program, args) {
            Some(output) if output.success() => {
                installed.extend(parse_name_list(&output.stdout));
            }
            _ => debug!("{} did not list installed packages", program),
        }
    }

    installed
}
