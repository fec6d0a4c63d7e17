//! Detection of a PrinceXML installation already reachable through `PATH`.

use regex::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::env;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("prince not found in PATH")]
    NotFound,

    #[error("failed to run `{} --version`: {reason}", .path.display())]
    VersionCommandFailed { path: PathBuf, reason: String },

    #[error("failed to parse prince version from output: {0:?}")]
    VersionParseFailure(String),
}

/// A `prince` executable found on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTool {
    pub path: PathBuf,
    /// `major.minor`, e.g. `15.4`.
    pub version: String,
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Prince\s+(\d+\.\d+)").expect("valid regex"))
}

/// Extracts `major.minor` from the output of `prince --version`.
pub fn parse_version(output: &str) -> Option<String> {
    version_regex()
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Looks for `prince` in the process `PATH` and asks it for its version.
pub async fn detect_installed_tool() -> Result<InstalledTool, DetectError> {
    let path = env::find_in_path("prince").ok_or(DetectError::NotFound)?;
    query_version(&path).await
}

/// Same as [`detect_installed_tool`] with an explicit `PATH` value.
pub async fn detect_in_path_var(path_var: &OsStr) -> Result<InstalledTool, DetectError> {
    let path = env::find_in_path_var("prince", path_var).ok_or(DetectError::NotFound)?;
    query_version(&path).await
}

async fn query_version(path: &Path) -> Result<InstalledTool, DetectError> {
    let output = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| DetectError::VersionCommandFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(DetectError::VersionCommandFailed {
            path: path.to_path_buf(),
            reason: output.status.to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version =
        parse_version(&stdout).ok_or_else(|| DetectError::VersionParseFailure(stdout.to_string()))?;

    debug!("Found prince {} at {}", version, path.display());
    Ok(InstalledTool {
        path: path.to_path_buf(),
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("Prince 15.4.1\nCopyright 2002-2024 YesLogic Pty. Ltd.\n"),
            Some("15.4".to_string())
        );
        assert_eq!(parse_version("Prince  9.0 rev 5"), Some("9.0".to_string()));
        assert_eq!(parse_version("prince 15.4"), None);
        assert_eq!(parse_version("Version: Prince 15.4"), None);
        assert_eq!(parse_version(""), None);
    }

    #[tokio::test]
    async fn test_detect_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = detect_in_path_var(dir.path().as_os_str()).await.unwrap_err();
        assert!(matches!(err, DetectError::NotFound));
    }

    #[cfg(unix)]
    fn fake_prince(dir: &Path, script: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("prince");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detect_reports_version() {
        let dir = tempfile::tempdir().unwrap();
        fake_prince(dir.path(), "#!/bin/sh\necho 'Prince 15.4.1'\n");

        let tool = detect_in_path_var(dir.path().as_os_str()).await.unwrap();
        assert_eq!(tool.version, "15.4");
        assert_eq!(tool.path, dir.path().join("prince"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detect_unparseable_version() {
        let dir = tempfile::tempdir().unwrap();
        fake_prince(dir.path(), "#!/bin/sh\necho 'something else'\n");

        let err = detect_in_path_var(dir.path().as_os_str()).await.unwrap_err();
        assert!(matches!(err, DetectError::VersionParseFailure(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detect_not_executable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("prince"), "not a program").unwrap();

        let err = detect_in_path_var(dir.path().as_os_str()).await.unwrap_err();
        assert!(matches!(err, DetectError::VersionCommandFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detect_failing_version_command() {
        let dir = tempfile::tempdir().unwrap();
        fake_prince(dir.path(), "#!/bin/sh
echo 'Prince 15.4.1'
exit 3
");

        let err = detect_in_path_var(dir.path().as_os_str()).await.unwrap_err();
        match err {
            DetectError::VersionCommandFailed { path, reason } => {
                assert_eq!(path, dir.path().join("prince"));
                assert!(reason.contains('3'), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
