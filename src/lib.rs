// src/lib.rs

//! pkgscout: cross-distro package discovery
//!
//! Finds software across native package managers and universal backends,
//! and helps decide what to install on a given host.
//!
//! # Architecture
//!
//! - Backends: one adapter per package manager, all failure-tolerant
//! - Search: concurrent fan-out with a per-backend deadline, then ranking
//! - Translate: package names mapped between Debian, Fedora and Arch
//! - Conflicts: known rules, file overlap and hardware/session checks
//! - Intents and bundles: portable "why is this installed" data, and a
//!   SQLite cache of dependency bundles per distro release

pub mod backends;
pub mod bundle;
pub mod config;
pub mod conflict;
pub mod db;
mod error;
pub mod intent;
pub mod profile;
pub mod search;
pub mod translate;

pub use error::{Error, Result};
