//! Provisioning of the PrinceXML distribution.
//!
//! # Architecture
//!
//! - `platform`: platform and distribution identification
//! - `catalog`: download URL resolution for a platform
//! - `detect`: detection of an existing `prince` in `PATH`
//! - `proxy`: proxy configuration for downloads
//! - `downloader`: streaming downloads with progress reporting
//! - `extractor`: archive unpacking and the Windows installer
//! - `provisioner`: the install / uninstall pipeline
//!
//! # Storage Location
//!
//! The distribution is unpacked into `<package>/prince/`, see
//! [`crate::paths`].

pub mod catalog;
pub mod detect;
pub mod downloader;
pub mod extractor;
pub mod platform;
pub mod provisioner;
pub mod proxy;

pub use catalog::{
    resolve_download_url, ArchiveFormat, ResolveError, DOWNLOAD_BASE, VENDOR_VERSION,
};
pub use detect::{detect_installed_tool, DetectError, InstalledTool};
pub use downloader::DownloadProgress;
pub use platform::{DistroId, DistroProbe, HelperScriptProbe, PlatformId, StaticProbe};
pub use provisioner::{
    DownloadedArchive, InstallEvent, InstallOutcome, InstallSettings, Provisioner,
};
