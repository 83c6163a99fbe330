// src/intent.rs

//! Intent-based categorization of installed software
//!
//! An intent records *why* something is installed ("a code editor",
//! "a browser") instead of the distro-specific package that provides it.
//! Intents are what a [`Manifest`] carries between machines, and
//! [`expand`] turns them back into installable names on the target.

use crate::db::models::current_timestamp;
use crate::error::Result;
use crate::translate::{DistroFamily, Translator};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Current manifest document version
pub const MANIFEST_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Editors,
    Browsers,
    DevTools,
    Media,
    Terminals,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Editors => "editors",
            Category::Browsers => "browsers",
            Category::DevTools => "dev-tools",
            Category::Media => "media",
            Category::Terminals => "terminals",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "editors" => Ok(Category::Editors),
            "browsers" => Ok(Category::Browsers),
            "dev-tools" => Ok(Category::DevTools),
            "media" => Ok(Category::Media),
            "terminals" => Ok(Category::Terminals),
            "other" => Ok(Category::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// The purpose behind a set of interchangeable packages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intent {
    pub category: Category,
    pub name: &'static str,
    pub description: &'static str,
    /// Packages that satisfy this intent, preferred first
    pub alternatives: &'static [&'static str],
}

pub static INTENTS: &[Intent] = &[
    Intent {
        category: Category::Editors,
        name: "vscode",
        description: "Visual Studio Code",
        alternatives: &["code", "visual-studio-code-bin", "code-oss"],
    },
    Intent {
        category: Category::Editors,
        name: "vim",
        description: "Vi IMproved",
        alternatives: &["vim", "neovim", "nvim"],
    },
    Intent {
        category: Category::Editors,
        name: "emacs",
        description: "GNU Emacs",
        alternatives: &["emacs", "emacs-nox"],
    },
    Intent {
        category: Category::Browsers,
        name: "firefox",
        description: "Mozilla Firefox",
        alternatives: &["firefox", "firefox-esr"],
    },
    Intent {
        category: Category::Browsers,
        name: "chrome",
        description: "Google Chrome",
        alternatives: &["google-chrome", "google-chrome-stable", "chromium"],
    },
    Intent {
        category: Category::DevTools,
        name: "git",
        description: "Version control system",
        alternatives: &["git"],
    },
    Intent {
        category: Category::DevTools,
        name: "docker",
        description: "Container platform",
        alternatives: &["docker", "docker-ce", "docker.io"],
    },
    Intent {
        category: Category::Media,
        name: "vlc",
        description: "VLC media player",
        alternatives: &["vlc"],
    },
    Intent {
        category: Category::Media,
        name: "spotify",
        description: "Spotify music player",
        alternatives: &["spotify", "spotify-client"],
    },
    Intent {
        category: Category::Terminals,
        name: "kitty",
        description: "Kitty terminal emulator",
        alternatives: &["kitty"],
    },
    Intent {
        category: Category::Terminals,
        name: "alacritty",
        description: "Alacritty terminal emulator",
        alternatives: &["alacritty"],
    },
];

/// Look up an intent by its own name
pub fn find_intent(name: &str) -> Option<&'static Intent> {
    INTENTS.iter().find(|i| i.name.eq_ignore_ascii_case(name))
}

/// Intent that a concrete package name satisfies, if any
pub fn intent_for_package(package: &str) -> Option<&'static Intent> {
    INTENTS.iter().find(|i| {
        i.name.eq_ignore_ascii_case(package)
            || i.alternatives.iter().any(|a| a.eq_ignore_ascii_case(package))
    })
}

/// Group installed packages by intent
///
/// Packages not covered by any matched intent land in [`Category::Other`],
/// sorted. Categories with nothing in them are left out.
pub fn categorize<I, S>(installed: I) -> BTreeMap<Category, Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let installed: BTreeSet<String> = installed
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .collect();
    let lowered: HashSet<String> = installed.iter().map(|n| n.to_lowercase()).collect();

    let mut categorized: BTreeMap<Category, Vec<String>> = BTreeMap::new();
    let mut covered: HashSet<String> = HashSet::new();

    for intent in INTENTS {
        let matched = intent
            .alternatives
            .iter()
            .any(|alt| lowered.contains(&alt.to_lowercase()));
        if matched {
            categorized
                .entry(intent.category)
                .or_default()
                .push(intent.name.to_string());
            covered.extend(intent.alternatives.iter().map(|alt| alt.to_lowercase()));
        }
    }

    let other: Vec<String> = installed
        .into_iter()
        .filter(|name| !covered.contains(&name.to_lowercase()))
        .collect();
    if !other.is_empty() {
        categorized.insert(Category::Other, other);
    }

    debug!("Categorized packages into {} buckets", categorized.len());
    categorized
}

/// Turn intents back into installable package names for `target`
///
/// Known intents resolve to their preferred alternative. Anything else is
/// treated as a plain package name and translated: the first suggested
/// spelling known in the target family wins, else the name itself.
pub fn expand(
    intents: &BTreeMap<Category, Vec<String>>,
    target: DistroFamily,
    translator: &Translator,
) -> BTreeMap<Category, Vec<String>> {
    intents
        .iter()
        .map(|(category, names)| {
            let packages = names
                .iter()
                .map(|name| expand_one(name, target, translator))
                .collect();
            (*category, packages)
        })
        .collect()
}

fn expand_one(name: &str, target: DistroFamily, translator: &Translator) -> String {
    if let Some(first) = find_intent(name).and_then(|intent| intent.alternatives.first()) {
        return first.to_string();
    }

    let suggestions = translator.suggest_search_terms(name, target);
    suggestions
        .iter()
        .find(|term| translator.is_known_in(term, target))
        .or(suggestions.first())
        .cloned()
        .unwrap_or_else(|| name.to_string())
}

/// Portable description of a system's software, by intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub created_at: String,
    /// e.g. "arch rolling"
    pub created_on_distro: String,
    pub intents: BTreeMap<Category, Vec<String>>,
    /// Raw package names, for targets that want exact names
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Manifest {
    /// Build a manifest from the host's installed package names
    pub fn from_installed<I, S>(installed: I, distro: &str, distro_version: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let packages: BTreeSet<String> = installed
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();

        Self {
            version: MANIFEST_VERSION.to_string(),
            created_at: current_timestamp(),
            created_on_distro: format!("{} {}", distro, distro_version).trim().to_string(),
            intents: categorize(&packages),
            packages: packages.into_iter().collect(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Packages to install on `target`, per category
    pub fn plan_for(&self, target: DistroFamily, translator: &Translator) -> BTreeMap<Category, Vec<String>> {
        expand(&self.intents, target, translator)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize() {
        let map = categorize(["neovim", "firefox", "chromium", "htop", "git", "base-devel"]);

        assert_eq!(map[&Category::Editors], vec!["vim"]);
        assert_eq!(map[&Category::Browsers], vec!["firefox", "chrome"]);
        assert_eq!(map[&Category::DevTools], vec!["git"]);
        assert_eq!(map[&Category::Other], vec!["base-devel", "htop"]);
        assert!(!map.contains_key(&Category::Media));
        assert!(!map.contains_key(&Category::Terminals));
    }

    #[test]
    fn test_categorize_is_case_insensitive() {
        let map = categorize(["Alacritty"]);
        assert_eq!(map[&Category::Terminals], vec!["alacritty"]);
        assert!(!map.contains_key(&Category::Other));
    }

    #[test]
    fn test_categorize_empty() {
        let none: [&str; 0] = [];
        assert!(categorize(none).is_empty());
    }

    #[test]
    fn test_expand_known_intent_uses_first_alternative() {
        let translator = Translator::new();
        let mut intents = BTreeMap::new();
        intents.insert(Category::Editors, vec!["vscode".to_string(), "vim".to_string()]);

        let plan = expand(&intents, DistroFamily::Debian, &translator);
        assert_eq!(plan[&Category::Editors], vec!["code", "vim"]);
    }

    #[test]
    fn test_expand_translates_plain_packages() {
        let translator = Translator::new();
        let mut intents = BTreeMap::new();
        intents.insert(
            Category::Other,
            vec!["libssl-dev".to_string(), "htop".to_string()],
        );

        let plan = expand(&intents, DistroFamily::Fedora, &translator);
        assert_eq!(plan[&Category::Other], vec!["openssl-devel", "htop"]);
    }

    #[test]
    fn test_manifest_round_trip_through_json() {
        let manifest = Manifest::from_installed(["kitty", "vlc", "ripgrep"], "arch", "rolling")
            .with_metadata("managers", "pacman,flatpak");

        assert_eq!(manifest.created_on_distro, "arch rolling");
        assert_eq!(manifest.packages, vec!["kitty", "ripgrep", "vlc"]);

        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"terminals\""));
        let parsed = Manifest::from_json(&json).unwrap();
        assert_eq!(parsed, manifest);

        let plan = parsed.plan_for(DistroFamily::Debian, &Translator::new());
        assert_eq!(plan[&Category::Media], vec!["vlc"]);
        assert_eq!(plan[&Category::Other], vec!["ripgrep"]);
    }

    #[test]
    fn test_intent_for_package() {
        assert_eq!(intent_for_package("nvim").unwrap().name, "vim");
        assert_eq!(intent_for_package("docker.io").unwrap().category, Category::DevTools);
        assert!(intent_for_package("htop").is_none());
    }
}
