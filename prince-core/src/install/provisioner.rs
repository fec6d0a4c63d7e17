//! Install and uninstall of the bundled PrinceXML distribution.
//!
//! `Provisioner::install` is a strictly sequential pipeline:
//!
//! 1. detect a `prince` already reachable through `PATH`
//! 2. resolve the download URL for this platform
//! 3. download into a temporary file in the package directory
//! 4. unpack into `<package>/prince/`
//!
//! Each step is reported through an [`InstallEvent`] callback. The temporary
//! archive is removed on every exit path. A partially unpacked tree is left
//! in place.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempPath;
use tracing::{debug, info, warn};

use super::catalog::{
    resolve_download_url, ArchiveFormat, ResolveError, DOWNLOAD_BASE, VENDOR_VERSION,
};
use super::detect::{detect_in_path_var, detect_installed_tool, DetectError, InstalledTool};
use super::downloader::{download_file, DownloadProgress};
use super::extractor::{extract_archive, make_executable, run_installer};
use super::platform::{DistroProbe, HelperScriptProbe, PlatformId};
use crate::paths;

/// Pause after unpacking before reporting completion. Empirical; some
/// filesystems were seen to lag behind the extractor.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

// ============================================================================
// Settings & Outcome
// ============================================================================

#[derive(Debug, Clone)]
pub struct InstallSettings {
    /// Holds the temporary archive and the `prince/` install directory.
    pub package_dir: PathBuf,
    /// PrinceXML release to download.
    pub version: String,
    /// Location the distribution archives are fetched from.
    pub download_base: String,
    pub settle_delay: Duration,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            package_dir: paths::package_dir(),
            version: VENDOR_VERSION.to_string(),
            download_base: DOWNLOAD_BASE.to_string(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl InstallSettings {
    pub fn install_dir(&self) -> PathBuf {
        paths::install_dir_in(&self.package_dir)
    }
}

/// Result of a completed install run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// `prince` is already reachable through `PATH`; nothing was downloaded.
    AlreadyInstalled(InstalledTool),
    /// The distribution was unpacked into `dir`.
    Installed { dir: PathBuf },
    /// The Windows setup program ran but reported failure.
    InstallerFailed { stdout: String, stderr: String },
}

/// Progress of [`Provisioner::install`], in pipeline order.
#[derive(Debug, Clone)]
pub enum InstallEvent<'a> {
    /// Looking for `prince` in `PATH`.
    Checking,
    /// `prince` is already available; the pipeline stops here.
    Found(&'a InstalledTool),
    /// Resolving the download URL for this platform.
    Resolving,
    /// Fetching the archive at `url`.
    Downloading { url: &'a str },
    Progress(DownloadProgress),
    /// Download complete.
    Downloaded { bytes: u64 },
    /// Unpacking into the install directory.
    Unpacking,
}

/// A distribution archive downloaded into the package directory.
///
/// The file is deleted when this value is dropped.
#[derive(Debug)]
pub struct DownloadedArchive {
    pub path: TempPath,
    pub format: ArchiveFormat,
    /// ZIP top-level directory, derived from the URL file name.
    pub top_dir: String,
    /// Bytes received.
    pub bytes: u64,
}

// ============================================================================
// Provisioner
// ============================================================================

pub struct Provisioner {
    settings: InstallSettings,
    platform: PlatformId,
    probe: Box<dyn DistroProbe>,
    /// `PATH` value searched for an existing `prince`; `None` = process `PATH`.
    search_path: Option<OsString>,
}

impl Default for Provisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl Provisioner {
    /// Provisioner for the running platform with default settings.
    pub fn new() -> Self {
        Self::with_settings(InstallSettings::default())
    }

    pub fn with_settings(settings: InstallSettings) -> Self {
        Self {
            settings,
            platform: PlatformId::current(),
            probe: Box::new(HelperScriptProbe),
            search_path: None,
        }
    }

    /// Overrides the detected platform.
    pub fn with_platform(mut self, platform: PlatformId) -> Self {
        self.platform = platform;
        self
    }

    /// Replaces the bundled platform script.
    pub fn with_probe(mut self, probe: impl DistroProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Searches `path_var` instead of the process `PATH` for `prince`.
    pub fn with_search_path(mut self, path_var: impl Into<OsString>) -> Self {
        self.search_path = Some(path_var.into());
        self
    }

    pub fn settings(&self) -> &InstallSettings {
        &self.settings
    }

    pub fn platform(&self) -> &PlatformId {
        &self.platform
    }

    // ========================================================================
    // Installation
    // ========================================================================

    /// Makes PrinceXML available, downloading it unless `PATH` has it.
    ///
    /// An unsupported platform surfaces as a [`ResolveError`] that can be
    /// recovered with `downcast_ref`.
    pub async fn install<F>(&self, on_event: F) -> Result<InstallOutcome>
    where
        F: Fn(InstallEvent<'_>),
    {
        on_event(InstallEvent::Checking);
        match self.detect().await {
            Ok(tool) => {
                info!("prince {} already installed at {}", tool.version, tool.path.display());
                on_event(InstallEvent::Found(&tool));
                return Ok(InstallOutcome::AlreadyInstalled(tool));
            }
            Err(e) => debug!("No usable prince in PATH: {}", e),
        }

        on_event(InstallEvent::Resolving);
        let url = self.resolve_url().await?;
        self.install_from_url(&url, on_event).await
    }

    async fn detect(&self) -> Result<InstalledTool, DetectError> {
        match &self.search_path {
            Some(path_var) => detect_in_path_var(path_var).await,
            None => detect_installed_tool().await,
        }
    }

    /// Download URL of the configured release for this platform.
    pub async fn resolve_url(&self) -> Result<String, ResolveError> {
        resolve_download_url(
            &self.settings.download_base,
            &self.platform,
            self.probe.as_ref(),
            &self.settings.version,
        )
        .await
    }

    /// Downloads the distribution at `url` and unpacks it.
    pub async fn install_from_url<F>(&self, url: &str, on_event: F) -> Result<InstallOutcome>
    where
        F: Fn(InstallEvent<'_>),
    {
        on_event(InstallEvent::Downloading { url });
        let archive = self
            .download(url, |progress| on_event(InstallEvent::Progress(progress)))
            .await
            .context("failed to download")?;
        on_event(InstallEvent::Downloaded {
            bytes: archive.bytes,
        });

        on_event(InstallEvent::Unpacking);
        self.unpack_download(archive)
            .await
            .context("failed to extract")
    }

    /// Downloads `url` into a temporary file in the package directory.
    pub async fn download<F>(&self, url: &str, progress_cb: F) -> Result<DownloadedArchive>
    where
        F: Fn(DownloadProgress),
    {
        let format = ArchiveFormat::from_url(url)
            .ok_or_else(|| anyhow::anyhow!("Unknown archive format for {}", url))?;

        tokio::fs::create_dir_all(&self.settings.package_dir)
            .await
            .with_context(|| {
                format!("Failed to create {}", self.settings.package_dir.display())
            })?;

        // Removed when dropped
        let path = tempfile::Builder::new()
            .prefix("prince-")
            .suffix(format.extension())
            .tempfile_in(&self.settings.package_dir)
            .context("Failed to create temporary download file")?
            .into_temp_path();

        let bytes = download_file(url, &path, progress_cb).await?;

        Ok(DownloadedArchive {
            path,
            format,
            top_dir: archive_stem(url, format).to_string(),
            bytes,
        })
    }

    /// Unpacks a downloaded archive, then deletes it.
    pub async fn unpack_download(&self, archive: DownloadedArchive) -> Result<InstallOutcome> {
        let outcome = self
            .unpack(&archive.path, archive.format, &archive.top_dir)
            .await?;

        if let Err(e) = archive.path.close() {
            warn!("Failed to clean up archive: {}", e);
        }
        Ok(outcome)
    }

    /// Unpacks a downloaded distribution into the install directory.
    ///
    /// `top_dir` is the ZIP archive's top-level directory.
    pub async fn unpack(
        &self,
        archive: &Path,
        format: ArchiveFormat,
        top_dir: &str,
    ) -> Result<InstallOutcome> {
        let install_dir = self.settings.install_dir();

        match format {
            ArchiveFormat::Installer => {
                let output = run_installer(archive, &install_dir).await?;
                if !output.status.success() {
                    return Ok(InstallOutcome::InstallerFailed {
                        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    });
                }
            }
            ArchiveFormat::Zip => {
                extract_archive(archive, &install_dir, format, top_dir)?;
                let binary = paths::INSTALL_LOCATIONS[0].binary_in(&self.settings.package_dir);
                if binary.is_file() {
                    make_executable(&binary)?;
                }
            }
            ArchiveFormat::TarGz => {
                extract_archive(archive, &install_dir, format, top_dir)?;
            }
        }

        tokio::time::sleep(self.settings.settle_delay).await;

        info!("PrinceXML installed into {}", install_dir.display());
        Ok(InstallOutcome::Installed { dir: install_dir })
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes the install directory. Returns whether anything was removed.
    pub async fn uninstall(&self) -> Result<bool> {
        let install_dir = self.settings.install_dir();

        if !install_dir.exists() {
            debug!("Nothing to remove at {}", install_dir.display());
            return Ok(false);
        }

        tokio::fs::remove_dir_all(&install_dir)
            .await
            .with_context(|| format!("Failed to remove {}", install_dir.display()))?;

        info!("PrinceXML removed from {}", install_dir.display());
        Ok(true)
    }
}

/// File name of `url` without the archive suffix, e.g.
/// `prince-15.4.1-macos` for `.../prince-15.4.1-macos.zip`.
fn archive_stem(url: &str, format: ArchiveFormat) -> &str {
    let name = url.rsplit('/').next().unwrap_or(url);
    let cut = name.len().saturating_sub(format.extension().len());
    name.get(..cut).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::platform::{DistroId, StaticProbe};
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn provisioner(package_dir: &Path) -> Provisioner {
        Provisioner::with_settings(InstallSettings {
            package_dir: package_dir.to_path_buf(),
            settle_delay: Duration::ZERO,
            ..InstallSettings::default()
        })
    }

    #[test]
    fn test_default_settings() {
        let settings = InstallSettings::default();
        assert_eq!(settings.version, VENDOR_VERSION);
        assert_eq!(settings.settle_delay, Duration::from_millis(500));
        assert!(settings.install_dir().starts_with(&settings.package_dir));
    }

    #[test]
    fn test_archive_stem() {
        assert_eq!(
            archive_stem(
                "https://www.princexml.com/download/prince-15.4.1-macos.zip",
                ArchiveFormat::Zip
            ),
            "prince-15.4.1-macos"
        );
        assert_eq!(
            archive_stem("prince-15.4.1-linux-generic-x86_64.tar.gz", ArchiveFormat::TarGz),
            "prince-15.4.1-linux-generic-x86_64"
        );
    }

    #[tokio::test]
    async fn test_uninstall_missing_dir_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let removed = provisioner(temp_dir.path()).uninstall().await.unwrap();
        assert!(!removed);
        assert!(temp_dir.path().exists());
    }

    #[tokio::test]
    async fn test_uninstall_removes_tree() {
        let temp_dir = TempDir::new().unwrap();
        let bin_dir = temp_dir.path().join("prince/lib/prince/bin");
        fs::create_dir_all(&bin_dir).unwrap();
        fs::write(bin_dir.join("prince"), b"").unwrap();

        let provisioner = provisioner(temp_dir.path());
        assert!(provisioner.uninstall().await.unwrap());
        assert!(!temp_dir.path().join("prince").exists());
        assert!(!provisioner.uninstall().await.unwrap());
    }

    #[tokio::test]
    async fn test_unpack_tarball_is_discoverable() {
        let temp_dir = TempDir::new().unwrap();
        let archive_path = temp_dir.path().join("download.tar.gz");
        {
            let file = File::create(&archive_path).unwrap();
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            let mut builder = tar::Builder::new(encoder);
            let data = b"#!/bin/sh\n";
            let mut header = tar::Header::new_gnu();
            header.set_path("prince-15.4.1-debian12-amd64/lib/prince/bin/prince").unwrap();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append(&header, &data[..]).unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        let provisioner = provisioner(temp_dir.path());
        let outcome = provisioner
            .unpack(&archive_path, ArchiveFormat::TarGz, "prince-15.4.1-debian12-amd64")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            InstallOutcome::Installed {
                dir: temp_dir.path().join("prince")
            }
        );
        let (binary, prefix) = paths::find_installed(temp_dir.path()).unwrap();
        assert_eq!(prefix, temp_dir.path().join("prince/lib/prince"));
        assert!(binary.ends_with("bin/prince"));
    }

    #[tokio::test]
    async fn test_unpack_zip_marks_binary_executable() {
        let temp_dir = TempDir::new().unwrap();
        let archive_path = temp_dir.path().join("download.zip");
        {
            let file = File::create(&archive_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored)
                .unix_permissions(0o644);
            zip.start_file("prince-15.4.1-macos/lib/prince/bin/prince", options)
                .unwrap();
            zip.write_all(b"#!/bin/sh\n").unwrap();
            zip.finish().unwrap();
        }

        let provisioner = provisioner(temp_dir.path());
        provisioner
            .unpack(&archive_path, ArchiveFormat::Zip, "prince-15.4.1-macos")
            .await
            .unwrap();

        let binary = temp_dir.path().join("prince/lib/prince/bin/prince");
        assert!(binary.is_file());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&binary).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_archive() {
        let temp_dir = TempDir::new().unwrap();
        let provisioner = provisioner(temp_dir.path());

        let result = provisioner
            .install_from_url("https://example.com/prince-15.4.1-macos.zip", |_| {})
            .await;
        assert!(result.is_err());

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "{:?}", leftovers);
    }

    /// Records the pipeline's events by name.
    #[derive(Default)]
    struct EventLog(std::sync::Mutex<Vec<String>>);

    impl EventLog {
        fn record(&self, event: InstallEvent<'_>) {
            let name = match event {
                InstallEvent::Checking => "checking".to_string(),
                InstallEvent::Found(tool) => format!("found {}", tool.version),
                InstallEvent::Resolving => "resolving".to_string(),
                InstallEvent::Downloading { url } => format!("downloading {}", url),
                InstallEvent::Progress(_) => "progress".to_string(),
                InstallEvent::Downloaded { bytes } => format!("downloaded {}", bytes),
                InstallEvent::Unpacking => "unpacking".to_string(),
            };
            self.0.lock().unwrap().push(name);
        }

        fn names(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_stops_at_existing_prince() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let bin_dir = temp_dir.path().join("bin");
        fs::create_dir(&bin_dir).unwrap();
        let script = bin_dir.join("prince");
        fs::write(&script, "#!/bin/sh\necho 'Prince 15.4.1'\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let package_dir = temp_dir.path().join("package");
        let provisioner = provisioner(&package_dir)
            .with_search_path(bin_dir.as_os_str())
            .with_platform(PlatformId::new("x64", "linux"))
            .with_probe(StaticProbe(DistroId::parse("amd64-debian12").unwrap()));

        let log = EventLog::default();
        let outcome = provisioner.install(|e| log.record(e)).await.unwrap();

        assert_eq!(
            outcome,
            InstallOutcome::AlreadyInstalled(InstalledTool {
                path: script,
                version: "15.4".to_string(),
            })
        );
        assert_eq!(log.names(), ["checking", "found 15.4"]);
        assert!(!package_dir.exists());
    }

    #[tokio::test]
    async fn test_install_runs_until_download_fails() {
        let temp_dir = TempDir::new().unwrap();
        let empty_path = temp_dir.path().join("empty");
        fs::create_dir(&empty_path).unwrap();
        let package_dir = temp_dir.path().join("package");

        let provisioner = Provisioner::with_settings(InstallSettings {
            package_dir: package_dir.clone(),
            download_base: "https://downloads.example.com/prince".to_string(),
            settle_delay: Duration::ZERO,
            ..InstallSettings::default()
        })
        .with_search_path(empty_path.as_os_str())
        .with_platform(PlatformId::new("x64", "linux"))
        .with_probe(StaticProbe(DistroId::parse("amd64-debian12").unwrap()));

        let log = EventLog::default();
        let err = provisioner.install(|e| log.record(e)).await.unwrap_err();

        assert!(format!("{:#}", err).starts_with("failed to download: "), "{:#}", err);
        let url = format!(
            "https://downloads.example.com/prince/prince-{}-debian12-amd64.tar.gz",
            VENDOR_VERSION
        );
        assert_eq!(
            log.names(),
            ["checking".to_string(), "resolving".to_string(), format!("downloading {}", url)]
        );

        let leftovers: Vec<_> = fs::read_dir(&package_dir).unwrap().collect();
        assert!(leftovers.is_empty(), "{:?}", leftovers);
    }

    #[tokio::test]
    async fn test_install_unsupported_platform() {
        let temp_dir = TempDir::new().unwrap();
        let provisioner = provisioner(temp_dir.path())
            .with_search_path(temp_dir.path().as_os_str())
            .with_platform(PlatformId::new("arm64", "freebsd"))
            .with_probe(StaticProbe(DistroId::parse("arm64-freebsd14.0").unwrap()));

        let log = EventLog::default();
        let err = provisioner.install(|e| log.record(e)).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::UnsupportedPlatform(id)) if id == "arm64-freebsd14.0"
        ));
        assert_eq!(log.names(), ["checking", "resolving"]);
    }

    #[tokio::test]
    async fn test_unknown_archive_format() {
        let temp_dir = TempDir::new().unwrap();
        let result = provisioner(temp_dir.path())
            .install_from_url("https://www.princexml.com/download/prince.dmg", |_| {})
            .await;
        assert!(result.is_err());
    }
}
