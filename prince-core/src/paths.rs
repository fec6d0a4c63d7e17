//! Package-directory layout shared by the invoker and the provisioner.
//!
//! The PrinceXML distribution is unpacked into a `prince/` directory that
//! sits inside the package directory:
//!
//! - Linux: `~/.local/share/prince-core/prince/`
//! - macOS: `~/Library/Application Support/prince-core/prince/`
//! - Windows: `C:\Users\<User>\AppData\Local\prince-core\prince\`
//!
//! When no per-user data directory is available the OS temp directory is
//! used instead.

use std::path::{Path, PathBuf};

/// Subdirectory name under the per-user data directory.
const PACKAGE_DIR_NAME: &str = "prince-core";

/// Subdirectory of the package directory holding the unpacked distribution.
const INSTALL_DIR_NAME: &str = "prince";

// ============================================================================
// Path Resolution
// ============================================================================

/// Returns the package directory.
///
/// e.g., `~/.local/share/prince-core/` on Linux
pub fn package_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(PACKAGE_DIR_NAME)
}

/// Returns the directory the distribution is unpacked into.
///
/// Path: `{package}/prince/`
pub fn install_dir_in(package_dir: &Path) -> PathBuf {
    package_dir.join(INSTALL_DIR_NAME)
}

// ============================================================================
// Install Locations
// ============================================================================

/// A place inside the package directory where a `prince` binary may live
/// after the provisioner ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallLocation {
    /// Installation tree, relative to the package directory. Passed to
    /// `prince --prefix`.
    pub basedir: &'static [&'static str],
    /// Binary, relative to `basedir`.
    pub binary: &'static [&'static str],
}

impl InstallLocation {
    /// Absolute installation tree for a package directory.
    pub fn basedir_in(&self, package_dir: &Path) -> PathBuf {
        join_all(package_dir, self.basedir)
    }

    /// Absolute binary path for a package directory.
    pub fn binary_in(&self, package_dir: &Path) -> PathBuf {
        join_all(&self.basedir_in(package_dir), self.binary)
    }
}

/// Known install locations, probed in order.
pub const INSTALL_LOCATIONS: &[InstallLocation] = &[
    // Unix tarball and macOS zip
    InstallLocation {
        basedir: &["prince", "lib", "prince"],
        binary: &["bin", "prince"],
    },
    // Windows installer (administrative install)
    InstallLocation {
        basedir: &["prince", "program files", "Prince", "Engine"],
        binary: &["bin", "prince.exe"],
    },
    // Windows zip
    InstallLocation {
        basedir: &["prince"],
        binary: &["bin", "prince.exe"],
    },
];

/// Returns the first install location whose binary exists as a file.
pub fn find_installed(package_dir: &Path) -> Option<(PathBuf, PathBuf)> {
    INSTALL_LOCATIONS.iter().find_map(|location| {
        let binary = location.binary_in(package_dir);
        binary
            .is_file()
            .then(|| (binary, location.basedir_in(package_dir)))
    })
}

fn join_all(base: &Path, parts: &[&str]) -> PathBuf {
    parts.iter().fold(base.to_path_buf(), |acc, part| acc.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_package_dir_contains_name() {
        let dir = package_dir();
        assert!(dir.ends_with(PACKAGE_DIR_NAME));
    }

    #[test]
    fn test_install_dir_is_under_package() {
        let package = Path::new("/opt/pkg");
        let install = install_dir_in(package);
        assert!(install.starts_with(package));
        assert!(install.ends_with("prince"));
    }

    #[test]
    fn test_install_location_paths() {
        let package = Path::new("/opt/pkg");
        let unix = &INSTALL_LOCATIONS[0];
        assert_eq!(
            unix.basedir_in(package),
            Path::new("/opt/pkg/prince/lib/prince")
        );
        assert_eq!(
            unix.binary_in(package),
            Path::new("/opt/pkg/prince/lib/prince/bin/prince")
        );
    }

    #[test]
    fn test_find_installed_none() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_installed(temp_dir.path()).is_none());
    }

    #[test]
    fn test_find_installed_unix_layout() {
        let temp_dir = TempDir::new().unwrap();
        let bin_dir = temp_dir.path().join("prince/lib/prince/bin");
        fs::create_dir_all(&bin_dir).unwrap();
        fs::write(bin_dir.join("prince"), b"").unwrap();

        let (binary, prefix) = find_installed(temp_dir.path()).unwrap();
        assert_eq!(binary, bin_dir.join("prince"));
        assert_eq!(prefix, temp_dir.path().join("prince/lib/prince"));
    }

    #[test]
    fn test_find_installed_ignores_directories() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the binary should be is not a match
        fs::create_dir_all(temp_dir.path().join("prince/lib/prince/bin/prince")).unwrap();
        assert!(find_installed(temp_dir.path()).is_none());
    }
}
