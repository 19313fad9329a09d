// Credential provider binary location

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use super::error::CredentialProviderError;

/// Pick the plugin binary: the override verbatim when present, else the default.
pub fn resolve_binary_path(default_path: &Path, override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(path) if !path.as_os_str().is_empty() => {
            info!(
                bin_path = %path.display(),
                default = %default_path.display(),
                "Image credential provider binary path overridden"
            );
            path.to_path_buf()
        }
        _ => default_path.to_path_buf(),
    }
}

/// Fail unless `path` names an existing file.
pub fn ensure_binary_exists(path: &Path) -> Result<(), CredentialProviderError> {
    let not_found = |source: io::Error| CredentialProviderError::BinaryNotFound {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(not_found)?;
    if metadata.is_dir() {
        return Err(not_found(io::Error::other("path is a directory")));
    }
    Ok(())
}

/// Directory kubelet should search for the plugin. A bare file name yields ".".
pub fn binary_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => path.to_path_buf(),
    }
}
