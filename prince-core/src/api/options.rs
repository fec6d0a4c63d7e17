//! Option registry: which long options prince(1) accepts and whether each
//! one takes a value.
//!
//! Every supported prince(1) release gets its own constant table. A new
//! release means a new table, never an edit to an old one.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Option Values
// ============================================================================

/// Value stored for a configured option.
///
/// `Bool(true)` is emitted as a bare flag. Every other value is emitted as
/// the argument following the flag, `Bool(false)` as the literal `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

impl OptionValue {
    /// Returns true for a flag that takes no argument.
    pub fn is_flag(&self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        Self::Text(value.to_string())
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Allow-list of long options for one prince(1) release.
#[derive(Debug)]
pub struct OptionRegistry {
    /// prince(1) release the table describes.
    pub version: &'static str,
    /// `(name, takes_value)` pairs.
    entries: &'static [(&'static str, bool)],
}

impl OptionRegistry {
    /// Registry for the newest supported release.
    pub fn current() -> &'static OptionRegistry {
        &PRINCE_15
    }

    /// Returns `Some(takes_value)` for a known option, `None` otherwise.
    pub fn lookup(&self, name: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, takes_value)| *takes_value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn takes_value(&self, name: &str) -> bool {
        self.lookup(name).unwrap_or(false)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Option requesting image output instead of a single output document.
pub const RASTER_OUTPUT: &str = "raster-output";

/// prince(1) 9.0 option set.
pub static PRINCE_9: OptionRegistry = OptionRegistry {
    version: "9.0",
    entries: &[
        ("help", false),
        ("version", false),
        ("credits", false),
        ("verbose", false),
        ("log", true),
        ("input", true),
        ("input-list", true),
        ("baseurl", true),
        ("fileroot", true),
        ("no-xinclude", false),
        ("no-network", false),
        ("http-user", true),
        ("http-password", true),
        ("http-proxy", true),
        ("http-timeout", true),
        ("cookiejar", true),
        ("ssl-cacert", true),
        ("ssl-capath", true),
        ("insecure", false),
        ("javascript", false),
        ("script", true),
        ("style", true),
        ("media", true),
        ("no-author-style", false),
        ("no-default-style", false),
        ("output", true),
        ("profile", true),
        ("attach", true),
        ("no-embed-fonts", false),
        ("no-subset-fonts", false),
        ("no-compress", false),
        ("pdf-title", true),
        ("pdf-subject", true),
        ("pdf-author", true),
        ("pdf-keywords", true),
        ("pdf-creator", true),
        ("encrypt", false),
        ("key-bits", true),
        ("user-password", true),
        ("owner-password", true),
        ("disallow-print", false),
        ("disallow-copy", false),
        ("disallow-annotate", false),
        ("disallow-modify", false),
        ("scanfonts", false),
    ],
};

/// prince(1) 15 option set.
pub static PRINCE_15: OptionRegistry = OptionRegistry {
    version: "15.4",
    entries: &[
        // General
        ("help", false),
        ("version", false),
        ("credits", false),
        ("prefix", true),
        ("license-file", true),
        ("license-key", true),
        ("verbose", false),
        ("debug", false),
        ("log", true),
        ("no-warn-css", false),
        ("no-warn-css-unknown", false),
        ("no-warn-css-unsupported", false),
        ("structured-log", true),
        ("fail-dropped-content", false),
        ("fail-missing-resources", false),
        ("fail-missing-glyphs", false),
        ("fail-pdf-profile-error", false),
        ("fail-pdf-tag-error", false),
        ("fail-stripped-transparency", false),
        ("fail-invalid-licence", false),
        ("fail-safe", false),
        ("control", false),
        // Input
        ("input", true),
        ("input-list", true),
        ("baseurl", true),
        ("fileroot", true),
        ("remap", true),
        ("iframes", false),
        ("xinclude", false),
        ("no-xinclude", false),
        ("xml-external-entities", false),
        ("no-local-files", false),
        ("no-network", false),
        ("no-redirects", false),
        ("no-parallel-downloads", false),
        // Network
        ("auth", true),
        ("auth-method", true),
        ("auth-user", true),
        ("auth-password", true),
        ("auth-server", true),
        ("auth-scheme", true),
        ("no-auth-preemptive", false),
        ("http-user", true),
        ("http-password", true),
        ("http-proxy", true),
        ("http-timeout", true),
        ("cookie", true),
        ("cookiejar", true),
        ("ssl-cacert", true),
        ("ssl-capath", true),
        ("ssl-version", true),
        ("ssl-max-version", true),
        ("insecure", false),
        // JavaScript
        ("javascript", false),
        ("script", true),
        ("max-passes", true),
        // CSS
        ("style", true),
        ("media", true),
        ("page-size", true),
        ("page-margin", true),
        ("no-author-style", false),
        ("no-default-style", false),
        // PDF output
        ("output", true),
        ("profile", true),
        ("pdf-profile", true),
        ("pdf-output-intent", true),
        ("pdf-lang", true),
        ("pdf-script", true),
        ("pdf-event-script", true),
        ("pdf-title", true),
        ("pdf-subject", true),
        ("pdf-author", true),
        ("pdf-keywords", true),
        ("pdf-creator", true),
        ("pdf-xmp", true),
        ("pdf-forms", false),
        ("tagged-pdf", false),
        ("attach", true),
        ("cssdpi", true),
        ("fallback-cmyk-profile", true),
        ("convert-colors", false),
        ("force-identity-encoding", false),
        ("no-artificial-fonts", false),
        ("no-embed-fonts", false),
        ("no-subset-fonts", false),
        ("no-system-fonts", false),
        ("no-compress", false),
        ("no-object-streams", false),
        ("scanfonts", false),
        // Encryption
        ("encrypt", false),
        ("key-bits", true),
        ("user-password", true),
        ("owner-password", true),
        ("disallow-print", false),
        ("disallow-copy", false),
        ("allow-copy-for-accessibility", false),
        ("disallow-annotate", false),
        ("disallow-modify", false),
        ("allow-assembly", false),
        // Raster output
        ("raster-output", true),
        ("raster-format", true),
        ("raster-jpeg-quality", true),
        ("raster-pages", true),
        ("raster-dpi", true),
        ("raster-threads", true),
        ("raster-background", true),
    ],
};
