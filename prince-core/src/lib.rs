//! Prince Core Library
//!
//! Drives the PrinceXML HTML/XML-to-PDF renderer through its prince(1)
//! command-line tool. It includes:
//!
//! - A fluent builder validating options against a versioned registry and
//!   running prince(1) as a child process
//! - Provisioning of the PrinceXML distribution into a package directory
//!   (platform detection, download, unpacking, removal)
//! - Shared package-directory layout and `PATH` lookup

pub mod api;
pub mod env;
pub mod install;
pub mod paths;

// Re-export the invoker
pub use api::{
    ExecuteError, Failure, OneOrMany, OptionRegistry, OptionValue, Prince, PrinceConfig,
    PrinceError, PrinceOptions, Rendered, PRINCE_15, PRINCE_9,
};

// Re-export the provisioner
pub use install::{
    detect_installed_tool, DetectError, DownloadProgress, InstallEvent, InstallOutcome,
    InstallSettings, InstalledTool, Provisioner, ResolveError, VENDOR_VERSION,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn exports_are_accessible() {
        fn _check_types(
            _prince: &Prince,
            _config: &PrinceConfig,
            _options: &PrinceOptions,
            _registry: &OptionRegistry,
            _value: &OptionValue,
            _error: &ExecuteError,
            _provisioner: &Provisioner,
            _settings: &InstallSettings,
            _outcome: &InstallOutcome,
        ) {
        }
    }

    #[test]
    fn current_registry_is_default() {
        let prince = Prince::from_config(PrinceConfig::default());
        assert_eq!(prince.registry().version, PRINCE_15.version);
    }
}
