// src/translate/mod.rs

//! Cross-distro package name translation
//!
//! The same software ships under different names per packaging family:
//! `libssl-dev` on Debian is `openssl-devel` on Fedora and `openssl` on
//! Arch. [`Translator`] builds one reverse index per family from the static
//! [`table::PACKAGE_MAPPINGS`] and answers lookups against them.

pub mod table;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

pub use table::{PACKAGE_MAPPINGS, PackageMapping, TABLE_VERSION};

/// A packaging family: distributions sharing a package naming convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistroFamily {
    Debian,
    Fedora,
    Arch,
}

impl DistroFamily {
    pub const ALL: [DistroFamily; 3] = [DistroFamily::Debian, DistroFamily::Fedora, DistroFamily::Arch];

    pub fn as_str(&self) -> &str {
        match self {
            DistroFamily::Debian => "debian",
            DistroFamily::Fedora => "fedora",
            DistroFamily::Arch => "arch",
        }
    }

    /// Map an os-release `ID` (or a family name) to its packaging family
    pub fn from_distro_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "debian" | "ubuntu" | "mint" | "linuxmint" | "pop" | "elementary" => {
                Some(DistroFamily::Debian)
            }
            "fedora" | "rhel" | "centos" | "rocky" | "alma" | "almalinux" => {
                Some(DistroFamily::Fedora)
            }
            "arch" | "manjaro" | "endeavouros" | "artix" | "instantos" => Some(DistroFamily::Arch),
            _ => None,
        }
    }
}

impl fmt::Display for DistroFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistroFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_distro_id(s).ok_or_else(|| format!("Unknown distro family: {}", s))
    }
}

static GLOBAL: LazyLock<Translator> = LazyLock::new(Translator::new);

/// Translates package names across distribution families
#[derive(Debug)]
pub struct Translator {
    mappings: &'static [PackageMapping],
    debian_index: HashMap<String, usize>,
    fedora_index: HashMap<String, usize>,
    arch_index: HashMap<String, usize>,
}

impl Translator {
    /// Build a translator over the built-in table
    pub fn new() -> Self {
        Self::with_table(PACKAGE_MAPPINGS)
    }

    /// Shared translator over the built-in table, built on first use
    pub fn global() -> &'static Translator {
        &GLOBAL
    }

    /// Build a translator over an arbitrary static table
    pub fn with_table(mappings: &'static [PackageMapping]) -> Self {
        let mut debian_index = HashMap::new();
        let mut fedora_index = HashMap::new();
        let mut arch_index = HashMap::new();

        for (idx, mapping) in mappings.iter().enumerate() {
            for name in mapping.debian {
                debian_index.insert(name.to_lowercase(), idx);
            }
            for name in mapping.fedora {
                fedora_index.insert(name.to_lowercase(), idx);
            }
            for name in mapping.arch {
                arch_index.insert(name.to_lowercase(), idx);
            }
        }

        debug!(
            "Built translation indices (table v{}): {} mappings",
            TABLE_VERSION,
            mappings.len()
        );

        Self {
            mappings,
            debian_index,
            fedora_index,
            arch_index,
        }
    }

    fn index(&self, family: DistroFamily) -> &HashMap<String, usize> {
        match family {
            DistroFamily::Debian => &self.debian_index,
            DistroFamily::Fedora => &self.fedora_index,
            DistroFamily::Arch => &self.arch_index,
        }
    }

    /// Mapping that owns `name` in one family's index
    pub fn owning_mapping_in(&self, name: &str, family: DistroFamily) -> Option<&'static PackageMapping> {
        let mappings = self.mappings;
        self.index(family)
            .get(&name.to_lowercase())
            .map(|&idx| &mappings[idx])
    }

    /// Mapping that owns `name` in any family (Debian, then Fedora, then Arch)
    pub fn owning_mapping(&self, name: &str) -> Option<&'static PackageMapping> {
        DistroFamily::ALL
            .iter()
            .find_map(|&family| self.owning_mapping_in(name, family))
    }

    /// Whether `name` is a known package name in `family`
    pub fn is_known_in(&self, name: &str, family: DistroFamily) -> bool {
        self.index(family).contains_key(&name.to_lowercase())
    }

    /// Translate a package name from one family to another
    ///
    /// Returns `None` when no mapping owns `name` in the source family.
    pub fn translate(
        &self,
        name: &str,
        from: DistroFamily,
        to: DistroFamily,
    ) -> Option<&'static [&'static str]> {
        self.owning_mapping_in(name, from)
            .map(|mapping| mapping.names_for(to))
    }

    /// Canonical identifier for a package name, if any family knows it
    pub fn canonical_name(&self, name: &str) -> Option<&'static str> {
        self.owning_mapping(name).map(|mapping| mapping.canonical)
    }

    /// Every known name for a package across all families
    ///
    /// Never empty: an unknown name yields a set holding just itself.
    pub fn get_all_known_names(&self, name: &str) -> BTreeSet<String> {
        match self.owning_mapping(name) {
            Some(mapping) => mapping.all_names().map(str::to_string).collect(),
            None => BTreeSet::from([name.to_string()]),
        }
    }

    /// Every spelling worth searching for before declaring a package missing
    ///
    /// The original query comes first, then the target family's names, then
    /// the remaining known names in sorted order. Duplicates are removed
    /// case-insensitively, keeping the first occurrence.
    pub fn suggest_search_terms(&self, query: &str, target: DistroFamily) -> Vec<String> {
        let mut candidates: Vec<String> = vec![query.to_string()];

        if let Some(mapping) = self.owning_mapping(query) {
            candidates.extend(mapping.names_for(target).iter().map(|s| s.to_string()));
        }
        candidates.extend(self.get_all_known_names(query));

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|term| seen.insert(term.to_lowercase()))
            .collect()
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}
