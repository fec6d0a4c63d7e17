//! HTTP proxy selection for distribution downloads.
//!
//! Order: `http_proxy`, `CARGO_HTTP_PROXY`, then `http.proxy` from Cargo's
//! `config.toml` (or legacy `config`) under `CARGO_HOME`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
struct CargoConfig {
    #[serde(default)]
    http: CargoHttp,
}

#[derive(Debug, Default, Deserialize)]
struct CargoHttp {
    proxy: Option<String>,
}

/// Proxy URL to use for downloads, if any is configured.
pub fn configured_proxy() -> Option<String> {
    from_env("http_proxy")
        .or_else(|| from_env("CARGO_HTTP_PROXY"))
        .or_else(|| cargo_home().and_then(|home| cargo_config_proxy(&home)))
}

fn from_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn cargo_home() -> Option<PathBuf> {
    std::env::var_os("CARGO_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".cargo")))
}

/// Reads `http.proxy` from the Cargo configuration in `cargo_home`.
pub fn cargo_config_proxy(cargo_home: &Path) -> Option<String> {
    for name in ["config.toml", "config"] {
        let path = cargo_home.join(name);
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        match toml::from_str::<CargoConfig>(&content) {
            Ok(config) => {
                let proxy = config.http.proxy.filter(|p| !p.trim().is_empty());
                if proxy.is_some() {
                    debug!("Using proxy from {}", path.display());
                }
                return proxy;
            }
            Err(e) => {
                warn!("Ignoring unreadable Cargo config {}: {}", path.display(), e);
            }
        }
    }
    None
}
