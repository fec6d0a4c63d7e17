//! Platform identification for choosing a PrinceXML distribution.
//!
//! Two levels of detail are used:
//!
//! - [`PlatformId`]: CPU architecture and OS family of the running process,
//!   enough to pick the Windows and macOS builds.
//! - [`DistroId`]: distribution vendor and version, obtained from a bundled
//!   helper script, needed to pick one of the many Linux builds.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::catalog::ResolveError;

// ============================================================================
// Platform Id
// ============================================================================

/// OS family, deciding how the download URL is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOs,
    /// Everything else; needs a distribution probe.
    Unix,
}

/// `<arch>-<os>` of the running process, e.g. `x64-linux`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformId {
    /// `x64`, `ia32`, `arm64`, or the raw Rust target arch.
    pub arch: String,
    /// `win32`, `darwin`, `linux`, `freebsd`, ...
    pub os: String,
}

impl PlatformId {
    pub fn new(arch: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            os: os.into(),
        }
    }

    /// Detects the platform of the running process.
    pub fn current() -> Self {
        let arch = match std::env::consts::ARCH {
            "x86_64" => "x64",
            "x86" => "ia32",
            "aarch64" => "arm64",
            other => other,
        };
        let os = match std::env::consts::OS {
            "windows" => "win32",
            "macos" => "darwin",
            other => other,
        };
        Self::new(arch, os)
    }

    pub fn family(&self) -> OsFamily {
        match self.os.as_str() {
            "win32" => OsFamily::Windows,
            "darwin" => OsFamily::MacOs,
            _ => OsFamily::Unix,
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.arch, self.os)
    }
}

// ============================================================================
// Distribution Id
// ============================================================================

/// `<arch>-<vendor><version>` as printed by the helper script, e.g.
/// `amd64-ubuntu22.04`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroId {
    /// `amd64`, `ix86`, `arm64`, ...
    pub arch: String,
    /// `ubuntu`, `debian`, `rhel`, `alpine`, ...
    pub vendor: String,
    /// `22.04`, `12`, ... possibly empty.
    pub version: String,
}

impl DistroId {
    /// Parses the first whitespace-separated token of `output`.
    pub fn parse(output: &str) -> Option<Self> {
        let token = output.split_whitespace().next()?;
        let (arch, rest) = token.split_once('-')?;
        if arch.is_empty() || rest.is_empty() {
            return None;
        }
        let split = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (vendor, version) = rest.split_at(split);
        Some(Self {
            arch: arch.to_string(),
            vendor: vendor.to_lowercase(),
            version: version.to_string(),
        })
    }

    /// Major version, e.g. `22` for `22.04`.
    pub fn major(&self) -> &str {
        self.version.split('.').next().unwrap_or("")
    }
}

impl fmt::Display for DistroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}{}", self.arch, self.vendor, self.version)
    }
}

// ============================================================================
// Distribution Probes
// ============================================================================

/// Source of the distribution identifier on Unix-like hosts.
#[async_trait]
pub trait DistroProbe: Send + Sync {
    async fn probe(&self) -> Result<DistroId, ResolveError>;
}

/// Platform-detection script shipped with the crate.
pub const PLATFORM_SCRIPT: &str = include_str!("../../scripts/platform.sh");

/// Runs the bundled platform-detection script through `sh`.
#[derive(Debug, Clone, Default)]
pub struct HelperScriptProbe;

#[async_trait]
impl DistroProbe for HelperScriptProbe {
    async fn probe(&self) -> Result<DistroId, ResolveError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(PLATFORM_SCRIPT)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ResolveError::PlatformProbe(e.to_string()))?;

        if !output.status.success() {
            return Err(ResolveError::PlatformProbe(format!(
                "platform script exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("Platform script reported {:?}", stdout.trim());
        DistroId::parse(&stdout).ok_or_else(|| {
            ResolveError::PlatformProbe(format!("unexpected platform output: {:?}", stdout))
        })
    }
}

/// Fixed identifier, for hosts that already know their distribution.
#[derive(Debug, Clone)]
pub struct StaticProbe(pub DistroId);

#[async_trait]
impl DistroProbe for StaticProbe {
    async fn probe(&self) -> Result<DistroId, ResolveError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_family() {
        assert_eq!(PlatformId::new("x64", "win32").family(), OsFamily::Windows);
        assert_eq!(PlatformId::new("arm64", "darwin").family(), OsFamily::MacOs);
        assert_eq!(PlatformId::new("x64", "linux").family(), OsFamily::Unix);
        assert_eq!(PlatformId::new("x64", "freebsd").family(), OsFamily::Unix);
    }

    #[test]
    fn test_platform_current_display() {
        let id = PlatformId::current().to_string();
        #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
        assert_eq!(id, "x64-linux");
        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        assert_eq!(id, "arm64-darwin");
        assert!(id.contains('-'));
    }

    #[test]
    fn test_distro_parse() {
        let id = DistroId::parse("amd64-ubuntu22.04\n").unwrap();
        assert_eq!(id.arch, "amd64");
        assert_eq!(id.vendor, "ubuntu");
        assert_eq!(id.version, "22.04");
        assert_eq!(id.major(), "22");
        assert_eq!(id.to_string(), "amd64-ubuntu22.04");
    }

    #[test]
    fn test_distro_parse_dashed_vendor_and_trailing_text() {
        let id = DistroId::parse("amd64-opensuse-leap15.5 (extra)").unwrap();
        assert_eq!(id.vendor, "opensuse-leap");
        assert_eq!(id.major(), "15");
    }

    #[test]
    fn test_distro_parse_without_version() {
        let id = DistroId::parse("arm64-arch").unwrap();
        assert_eq!(id.vendor, "arch");
        assert_eq!(id.version, "");
        assert_eq!(id.major(), "");
    }

    #[test]
    fn test_distro_parse_invalid() {
        assert!(DistroId::parse("").is_none());
        assert!(DistroId::parse("amd64").is_none());
        assert!(DistroId::parse("-ubuntu22").is_none());
    }

    #[tokio::test]
    async fn test_static_probe() {
        let id = DistroId::parse("amd64-debian12").unwrap();
        let probe = StaticProbe(id.clone());
        assert_eq!(probe.probe().await.unwrap(), id);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_helper_script_probe_runs() {
        let id = HelperScriptProbe.probe().await.unwrap();
        assert!(!id.arch.is_empty());
        assert!(!id.vendor.is_empty());
    }
}
