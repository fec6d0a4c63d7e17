//! Unpacking of downloaded PrinceXML distributions.
//!
//! Archives carry a single top-level directory which is stripped so the
//! distribution lands directly in the install directory. The Windows
//! setup program is run in silent administrative mode instead.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::catalog::ArchiveFormat;

// ============================================================================
// Archive Extraction
// ============================================================================

/// Extracts a ZIP or tar.gz archive into `dest_dir`.
///
/// `top_dir` names the ZIP archive's top-level directory, normally the
/// archive file stem. Tarballs always lose their first path component.
pub fn extract_archive(
    archive_path: &Path,
    dest_dir: &Path,
    format: ArchiveFormat,
    top_dir: &str,
) -> Result<()> {
    info!(
        "Extracting {:?} archive {} to {}",
        format,
        archive_path.display(),
        dest_dir.display()
    );

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    match format {
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir, top_dir),
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir, 1),
        ArchiveFormat::Installer => {
            anyhow::bail!("Installer is not an extractable archive; run it with run_installer")
        }
    }
}

/// Removes `top_dir` from the front of `path`. Paths outside it are kept.
fn strip_top_dir(path: &Path, top_dir: &str) -> Option<PathBuf> {
    let stripped = match path.strip_prefix(top_dir) {
        Ok(rest) => rest.to_path_buf(),
        Err(_) => path.to_path_buf(),
    };
    if stripped.as_os_str().is_empty() {
        None
    } else {
        Some(stripped)
    }
}

/// Drops the first `count` components of `path`.
fn strip_components(path: &Path, count: usize) -> Option<PathBuf> {
    let stripped: PathBuf = path.components().skip(count).collect();
    if stripped.as_os_str().is_empty() {
        None
    } else {
        Some(stripped)
    }
}

// ============================================================================
// ZIP Extraction
// ============================================================================

fn extract_zip(archive_path: &Path, dest_dir: &Path, top_dir: &str) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open zip: {}", archive_path.display()))?;

    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read zip: {}", archive_path.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => path.to_owned(),
            None => {
                debug!("Skipping unsafe path in zip");
                continue;
            }
        };

        let Some(relative) = strip_top_dir(&entry_path, top_dir) else {
            continue;
        };
        let dest_path = dest_dir.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut outfile = File::create(&dest_path)
                .with_context(|| format!("Failed to create: {}", dest_path.display()))?;

            io::copy(&mut entry, &mut outfile)?;

            #[cfg(unix)]
            set_unix_permissions(&dest_path, entry.unix_mode())?;
        }
    }

    debug!("ZIP extraction complete");
    Ok(())
}

// ============================================================================
// TAR.GZ Extraction
// ============================================================================

fn extract_tar_gz(archive_path: &Path, dest_dir: &Path, strip: usize) -> Result<()> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open tar.gz: {}", archive_path.display()))?;

    let reader = BufReader::new(file);
    let decoder = flate2::read::GzDecoder::new(reader);
    extract_tar(decoder, dest_dir, strip)
}

fn extract_tar<R: Read>(reader: R, dest_dir: &Path, strip: usize) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    let dest_dir_canonical = dest_dir
        .canonicalize()
        .unwrap_or_else(|_| dest_dir.to_path_buf());

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_type = entry.header().entry_type();

        // Links could point outside dest_dir
        if entry_type.is_symlink() || entry_type.is_hard_link() {
            warn!("Skipping symlink/hardlink in tar archive");
            continue;
        }

        let path = entry.path()?.into_owned();

        if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
            warn!("Skipping unsafe path in tar: {:?}", path);
            continue;
        }

        let Some(relative) = strip_components(&path, strip) else {
            continue;
        };
        let dest_path = dest_dir.join(&relative);

        let dest_canonical = if dest_path.exists() {
            dest_path.canonicalize()?
        } else if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
            let parent_canonical = parent.canonicalize()?;
            parent_canonical.join(dest_path.file_name().unwrap_or_default())
        } else {
            dest_path.clone()
        };

        if !dest_canonical.starts_with(&dest_dir_canonical) {
            warn!(
                "Skipping path that escapes dest_dir: {:?} -> {:?}",
                path, dest_canonical
            );
            continue;
        }

        if entry_type.is_dir() {
            fs::create_dir_all(&dest_path)?;
        } else if entry_type.is_file() {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut outfile = File::create(&dest_path)
                .with_context(|| format!("Failed to create: {}", dest_path.display()))?;
            io::copy(&mut entry, &mut outfile)?;
            outfile.flush()?;

            #[cfg(unix)]
            {
                if let Ok(mode) = entry.header().mode() {
                    set_unix_permissions(&dest_path, Some(mode))?;
                }
            }
        }
    }

    debug!("TAR extraction complete");
    Ok(())
}

// ============================================================================
// Windows Installer
// ============================================================================

/// Arguments for a silent administrative install into `target_dir`.
pub fn installer_args(target_dir: &Path) -> Vec<String> {
    vec![
        "/s".to_string(),
        "/a".to_string(),
        format!("/vTARGETDIR=\"{}\" /qn", target_dir.display()),
    ]
}

/// Runs the setup program at `installer` into `target_dir`.
///
/// Returns the captured output whether or not the installer succeeded;
/// only a failure to launch it is an error.
pub async fn run_installer(installer: &Path, target_dir: &Path) -> Result<Output> {
    tokio::fs::create_dir_all(target_dir)
        .await
        .with_context(|| format!("Failed to create directory: {}", target_dir.display()))?;

    let target_dir = std::path::absolute(target_dir)
        .with_context(|| format!("Failed to resolve {}", target_dir.display()))?;

    info!(
        "Running installer {} into {}",
        installer.display(),
        target_dir.display()
    );

    let output = Command::new(installer)
        .args(installer_args(&target_dir))
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to launch installer {}", installer.display()))?;

    if !output.status.success() {
        warn!("Installer exited with {}", output.status);
    }
    Ok(output)
}

// ============================================================================
// Unix Permissions
// ============================================================================

#[cfg(unix)]
fn set_unix_permissions(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        if mode & 0o111 != 0 {
            let permissions = fs::Permissions::from_mode(mode | 0o755);
            fs::set_permissions(path, permissions)
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }
    }

    Ok(())
}

/// Sets mode `0755` on `path` (Unix only).
#[allow(unused_variables)]
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).with_context(|| {
            format!("Failed to set executable permission on {}", path.display())
        })?;

        debug!("Set executable permission on {}", path.display());
    }

    Ok(())
}
