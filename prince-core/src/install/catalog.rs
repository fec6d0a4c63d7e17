//! PrinceXML distribution catalog.
//!
//! Maps a platform to the vendor's download URL. Windows and macOS have one
//! fixed build per architecture; everything else is matched against an
//! ordered table of distribution rules where the first match wins.

use thiserror::Error;
use tracing::debug;

use super::platform::{DistroId, DistroProbe, OsFamily, PlatformId};

/// PrinceXML release installed by default.
pub const VENDOR_VERSION: &str = "15.4.1";

/// Download location of all distribution archives.
pub const DOWNLOAD_BASE: &str = "https://www.princexml.com/download";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no PrinceXML distribution available for platform {0}")]
    UnsupportedPlatform(String),

    #[error("failed to determine platform: {0}")]
    PlatformProbe(String),
}

// ============================================================================
// Archive Format
// ============================================================================

/// How a downloaded distribution is unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Windows setup program run in silent administrative mode.
    Installer,
    /// ZIP archive with a single top-level directory.
    Zip,
    /// Gzip-compressed tar archive with a single top-level directory.
    TarGz,
}

impl ArchiveFormat {
    /// Infers the format from a URL or filename.
    pub fn from_url(url: &str) -> Option<Self> {
        let lower = url.to_lowercase();
        if lower.ends_with(".exe") {
            Some(Self::Installer)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }

    /// Suffix for the temporary download file.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Installer => ".exe",
            Self::Zip => ".zip",
            Self::TarGz => ".tar.gz",
        }
    }
}

// ============================================================================
// Distribution Rules
// ============================================================================

/// One entry of the distribution table.
#[derive(Debug, Clone, Copy)]
pub struct DistroRule {
    /// Operating system as in [`PlatformId::os`].
    pub os: &'static str,
    /// Architecture as reported by the platform script.
    pub arch: &'static str,
    /// Accepted vendors; empty accepts any vendor.
    pub vendors: &'static [&'static str],
    /// Required major version, if any.
    pub major: Option<&'static str>,
    /// Archive name without the `prince-<version>-` prefix.
    pub archive: &'static str,
}

impl DistroRule {
    pub fn matches(&self, os: &str, id: &DistroId) -> bool {
        self.os == os
            && self.arch == id.arch
            && (self.vendors.is_empty() || self.vendors.contains(&id.vendor.as_str()))
            && self.major.map_or(true, |major| id.major() == major)
    }
}

const UBUNTU: &[&str] = &["ubuntu", "linuxmint", "pop", "elementary"];
const DEBIAN: &[&str] = &["debian", "raspbian"];
const RHEL: &[&str] = &["rhel", "centos", "rocky", "almalinux", "ol", "fedora"];
const OPENSUSE: &[&str] = &["opensuse", "opensuse-leap", "sles"];

const fn linux(
    arch: &'static str,
    vendors: &'static [&'static str],
    major: Option<&'static str>,
    archive: &'static str,
) -> DistroRule {
    DistroRule {
        os: "linux",
        arch,
        vendors,
        major,
        archive,
    }
}

/// Ordered distribution table. Generic per-architecture Linux builds come
/// last; other systems never fall back to them.
pub static DISTRO_RULES: &[DistroRule] = &[
    linux("amd64", UBUNTU, Some("24"), "ubuntu24.04-amd64.tar.gz"),
    linux("amd64", UBUNTU, Some("22"), "ubuntu22.04-amd64.tar.gz"),
    linux("amd64", UBUNTU, Some("20"), "ubuntu20.04-amd64.tar.gz"),
    linux("arm64", UBUNTU, Some("24"), "ubuntu24.04-arm64.tar.gz"),
    linux("arm64", UBUNTU, Some("22"), "ubuntu22.04-arm64.tar.gz"),
    linux("amd64", DEBIAN, Some("12"), "debian12-amd64.tar.gz"),
    linux("amd64", DEBIAN, Some("11"), "debian11-amd64.tar.gz"),
    linux("arm64", DEBIAN, Some("12"), "debian12-arm64.tar.gz"),
    linux("amd64", RHEL, Some("9"), "rhel9-x86_64.tar.gz"),
    linux("amd64", RHEL, Some("8"), "rhel8-x86_64.tar.gz"),
    linux("arm64", RHEL, Some("9"), "rhel9-aarch64.tar.gz"),
    linux("amd64", &["alpine"], None, "alpine3.19-x86_64.tar.gz"),
    linux("amd64", OPENSUSE, Some("15"), "opensuse15.5-x86_64.tar.gz"),
    DistroRule {
        os: "freebsd",
        arch: "amd64",
        vendors: &["freebsd"],
        major: None,
        archive: "freebsd13.0-x86_64.tar.gz",
    },
    linux("amd64", &[], None, "linux-generic-x86_64.tar.gz"),
    linux("arm64", &[], None, "linux-generic-aarch64.tar.gz"),
];

/// First rule matching `id` on `os`, if any.
pub fn match_distro(os: &str, id: &DistroId) -> Option<&'static DistroRule> {
    DISTRO_RULES.iter().find(|rule| rule.matches(os, id))
}

fn archive_url(base: &str, version: &str, archive: &str) -> String {
    format!("{}/prince-{}-{}", base.trim_end_matches('/'), version, archive)
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolves the download URL of `version` for `platform` under `base`,
/// normally [`DOWNLOAD_BASE`].
///
/// `probe` is consulted only for platforms other than Windows and macOS.
pub async fn resolve_download_url(
    base: &str,
    platform: &PlatformId,
    probe: &dyn DistroProbe,
    version: &str,
) -> Result<String, ResolveError> {
    let archive = match platform.family() {
        OsFamily::Windows => match platform.arch.as_str() {
            "ia32" => "setup.exe",
            "x64" | "arm64" => "win64.zip",
            _ => return Err(ResolveError::UnsupportedPlatform(platform.to_string())),
        },
        OsFamily::MacOs => "macos.zip",
        OsFamily::Unix => {
            let id = probe.probe().await?;
            debug!("Resolving distribution for {}", id);
            match match_distro(&platform.os, &id) {
                Some(rule) => rule.archive,
                None => return Err(ResolveError::UnsupportedPlatform(id.to_string())),
            }
        }
    };

    Ok(archive_url(base, version, archive))
}
