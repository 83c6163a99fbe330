// src/translate/table.rs

//! Static cross-distro package name table
//!
//! Each entry maps one canonical package to the names it goes by in each
//! packaging family. A name must not appear in two entries of the same
//! family; the translator's reverse indices rely on it.

use super::DistroFamily;

/// Bumped whenever entries are added, removed or renamed
pub const TABLE_VERSION: u32 = 2;

/// Maps a package across different distribution families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageMapping {
    pub canonical: &'static str,
    pub debian: &'static [&'static str],
    pub fedora: &'static [&'static str],
    pub arch: &'static [&'static str],
    pub description: &'static str,
}

impl PackageMapping {
    /// Names this package goes by in `family`
    pub fn names_for(&self, family: DistroFamily) -> &'static [&'static str] {
        match family {
            DistroFamily::Debian => self.debian,
            DistroFamily::Fedora => self.fedora,
            DistroFamily::Arch => self.arch,
        }
    }

    /// Every name across all families, family by family
    pub fn all_names(&self) -> impl Iterator<Item = &'static str> {
        self.debian
            .iter()
            .chain(self.fedora.iter())
            .chain(self.arch.iter())
            .copied()
    }
}

pub static PACKAGE_MAPPINGS: &[PackageMapping] = &[
    PackageMapping {
        canonical: "openssl-dev",
        debian: &["libssl-dev"],
        fedora: &["openssl-devel"],
        arch: &["openssl"],
        description: "OpenSSL development headers",
    },
    PackageMapping {
        canonical: "python-dev",
        debian: &["python3-dev", "python3.11-dev"],
        fedora: &["python3-devel"],
        arch: &["python"],
        description: "Python development headers",
    },
    PackageMapping {
        canonical: "build-essential",
        debian: &["build-essential"],
        fedora: &["gcc", "gcc-c++", "make"],
        arch: &["base-devel"],
        description: "Basic build tools",
    },
    PackageMapping {
        canonical: "jpeg-dev",
        debian: &["libjpeg-dev"],
        fedora: &["libjpeg-turbo-devel"],
        arch: &["libjpeg-turbo"],
        description: "JPEG library development files",
    },
    PackageMapping {
        canonical: "png-dev",
        debian: &["libpng-dev"],
        fedora: &["libpng-devel"],
        arch: &["libpng"],
        description: "PNG library development files",
    },
    PackageMapping {
        canonical: "curl-dev",
        debian: &["libcurl4-openssl-dev"],
        fedora: &["libcurl-devel"],
        arch: &["curl"],
        description: "cURL development files",
    },
    PackageMapping {
        canonical: "xml2-dev",
        debian: &["libxml2-dev"],
        fedora: &["libxml2-devel"],
        arch: &["libxml2"],
        description: "XML library development files",
    },
    PackageMapping {
        canonical: "sqlite-dev",
        debian: &["libsqlite3-dev"],
        fedora: &["sqlite-devel"],
        arch: &["sqlite"],
        description: "SQLite development files",
    },
    PackageMapping {
        canonical: "ncurses-dev",
        debian: &["libncurses-dev", "libncurses5-dev"],
        fedora: &["ncurses-devel"],
        arch: &["ncurses"],
        description: "Terminal UI library development files",
    },
    PackageMapping {
        canonical: "readline-dev",
        debian: &["libreadline-dev"],
        fedora: &["readline-devel"],
        arch: &["readline"],
        description: "Readline library development files",
    },
    PackageMapping {
        canonical: "zlib-dev",
        debian: &["zlib1g-dev"],
        fedora: &["zlib-devel"],
        arch: &["zlib"],
        description: "Compression library development files",
    },
    PackageMapping {
        canonical: "ffi-dev",
        debian: &["libffi-dev"],
        fedora: &["libffi-devel"],
        arch: &["libffi"],
        description: "Foreign function interface library development files",
    },
    PackageMapping {
        canonical: "lzma-dev",
        debian: &["liblzma-dev"],
        fedora: &["xz-devel"],
        arch: &["xz"],
        description: "XZ/LZMA compression development files",
    },
    PackageMapping {
        canonical: "bzip2-dev",
        debian: &["libbz2-dev"],
        fedora: &["bzip2-devel"],
        arch: &["bzip2"],
        description: "Bzip2 compression development files",
    },
    PackageMapping {
        canonical: "pkg-config",
        debian: &["pkg-config", "pkgconf"],
        fedora: &["pkgconf-pkg-config"],
        arch: &["pkgconf"],
        description: "Library compile/link flag helper",
    },
    PackageMapping {
        canonical: "gtk3-dev",
        debian: &["libgtk-3-dev"],
        fedora: &["gtk3-devel"],
        arch: &["gtk3"],
        description: "GTK 3 development files",
    },
];
