//! Invoker configuration.
//!
//! `PrinceConfig` is the state a [`Prince`](super::Prince) builder carries.
//! `PrinceOptions` is the optional caller-supplied override set accepted at
//! construction time; it deserializes from JSON so hosts can keep it in a
//! settings file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::options::OptionValue;

/// Default child-process timeout (10 seconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default cap on captured stdout and stderr (10 MiB each).
pub const DEFAULT_MAX_BUFFER: usize = 10 * 1024 * 1024;

/// Default binary name, resolved through `PATH` when not a file.
pub const DEFAULT_BINARY: &str = "prince";

// ============================================================================
// Configuration
// ============================================================================

/// Everything needed to build and run one prince(1) command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinceConfig {
    /// Binary path, or a bare name looked up in `PATH`.
    pub binary: String,
    /// Installation tree passed as `--prefix`; empty = unset.
    pub prefix: String,
    /// License file passed as `--license-file`; empty = unset.
    pub license: String,
    /// Child-process timeout in milliseconds; 0 disables it.
    pub timeout_ms: u64,
    /// Cap on captured stdout and stderr, in bytes.
    pub max_buffer: usize,
    /// Working directory of the child process.
    pub cwd: String,
    /// Options in insertion order. Not checked against any registry.
    pub options: IndexMap<String, OptionValue>,
    pub inputs: Vec<String>,
    pub cookies: Vec<String>,
    /// Output document; empty only when `raster-output` is set.
    pub output: String,
}

impl Default for PrinceConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            prefix: String::new(),
            license: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_buffer: DEFAULT_MAX_BUFFER,
            cwd: ".".to_string(),
            options: IndexMap::new(),
            inputs: Vec::new(),
            cookies: Vec::new(),
            output: String::new(),
        }
    }
}

// ============================================================================
// One-or-many
// ============================================================================

/// A single string or a sequence of strings; normalized to a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for OneOrMany {
    fn from(values: &[&str]) -> Self {
        Self::Many(values.iter().map(|v| v.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany {
    fn from(values: [&str; N]) -> Self {
        Self::Many(values.iter().map(|v| v.to_string()).collect())
    }
}

// ============================================================================
// Construction-time overrides
// ============================================================================

/// Optional overrides applied after install-location discovery.
///
/// Every field goes through the matching builder setter, so `binary`
/// clears any discovered `prefix` unless `prefix` is given too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinceOptions {
    pub binary: Option<String>,
    pub prefix: Option<String>,
    pub license: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_buffer: Option<usize>,
    pub cwd: Option<String>,
    pub inputs: Option<OneOrMany>,
    pub cookies: Option<OneOrMany>,
    pub output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PrinceConfig::default();
        assert_eq!(config.binary, "prince");
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.max_buffer, 10 * 1024 * 1024);
        assert_eq!(config.cwd, ".");
        assert!(config.prefix.is_empty());
        assert!(config.output.is_empty());
        assert!(config.options.is_empty());
    }

    #[test]
    fn test_one_or_many_normalizes() {
        assert_eq!(OneOrMany::from("a.html").into_vec(), vec!["a.html"]);
        assert_eq!(OneOrMany::from(["a.html"]).into_vec(), vec!["a.html"]);
        assert_eq!(
            OneOrMany::from(vec!["a.html", "b.html"]).into_vec(),
            vec!["a.html", "b.html"]
        );
    }

    #[test]
    fn test_options_from_json() {
        let json = r#"{ "binary": "/usr/bin/prince", "inputs": "doc.html", "cookies": ["a=1", "b=2"] }"#;
        let options: PrinceOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.binary.as_deref(), Some("/usr/bin/prince"));
        assert_eq!(options.inputs, Some(OneOrMany::One("doc.html".into())));
        assert_eq!(
            options.cookies.map(OneOrMany::into_vec),
            Some(vec!["a=1".to_string(), "b=2".to_string()])
        );
        assert!(options.output.is_none());
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: PrinceConfig = serde_json::from_str(r#"{ "output": "out.pdf" }"#).unwrap();
        assert_eq!(config.output, "out.pdf");
        assert_eq!(config.binary, DEFAULT_BINARY);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_config_options_keep_order_through_json() {
        let json = r#"{ "options": { "media": "print", "javascript": true, "encrypt": true } }"#;
        let config: PrinceConfig = serde_json::from_str(json).unwrap();
        let names: Vec<_> = config.options.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["media", "javascript", "encrypt"]);
    }
}
