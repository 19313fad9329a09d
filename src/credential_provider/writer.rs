// Atomic config file writes

use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use super::error::CredentialProviderError;

pub const CONFIG_FILE_MODE: u32 = 0o644;
const DIR_MODE: u32 = 0o755;

/// Write `data` to `path` atomically with `mode`, creating parent directories.
///
/// The bytes land in a temporary file next to `path` which is then renamed
/// over it, so readers never observe a partial document.
pub fn write_file_with_dir(path: &Path, data: &[u8], mode: u32) -> Result<(), CredentialProviderError> {
    let write_failure = |source: std::io::Error| CredentialProviderError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    create_dir_all(parent).map_err(write_failure)?;

    let mut file = NamedTempFile::new_in(parent).map_err(write_failure)?;
    file.write_all(data).map_err(write_failure)?;
    set_mode(file.path(), mode).map_err(write_failure)?;
    file.as_file().sync_all().map_err(write_failure)?;
    file.persist(path).map_err(|e| write_failure(e.error))?;

    debug!(path = %path.display(), bytes = data.len(), "Wrote file");
    Ok(())
}

#[cfg(unix)]
fn create_dir_all(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(dir)
}

#[cfg(not(unix))]
fn create_dir_all(dir: &Path) -> std::io::Result<()> {
    let _ = DIR_MODE;
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
