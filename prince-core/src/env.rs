//! `PATH` lookup helpers.
//!
//! Both the invoker (resolving the configured binary) and the provisioner
//! (detecting a globally installed `prince`) scan the `PATH` environment
//! variable the same way.

use std::ffi::OsStr;
use std::path::PathBuf;
use tracing::debug;

/// Searches every directory of `path_var` for a file named `name`.
///
/// `path_var` is split with the platform path-list delimiter.
///
/// On Windows a name without extension is also tried with `.exe`.
pub fn find_in_path_var(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(path_var) {
        for candidate in candidate_names(name) {
            let path = dir.join(&candidate);
            if path.is_file() {
                debug!("Resolved {} to {}", name, path.display());
                return Some(path);
            }
        }
    }
    None
}

/// Searches the process `PATH` for a file named `name`.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    find_in_path_var(name, &path_var)
}

fn candidate_names(name: &str) -> Vec<String> {
    #[allow(unused_mut)]
    let mut names = vec![name.to_string()];
    #[cfg(windows)]
    {
        if std::path::Path::new(name).extension().is_none() {
            names.push(format!("{}.exe", name));
        }
    }
    names
}
