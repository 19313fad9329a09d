// Kubelet version discovery

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("failed to run {} --version: {source}", .binary.display())]
    Exec {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} --version exited with {status}: {stderr}", .binary.display())]
    ExitStatus {
        binary: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("kubelet reported an empty version")]
    Empty,
    #[error("invalid kubelet version {version:?}: {source}")]
    Invalid {
        version: String,
        #[source]
        source: semver::Error,
    },
}

/// Something that can report the installed kubelet's version string.
pub trait KubeletVersionSource {
    fn kubelet_version(&self) -> Result<String, VersionError>;
}

/// Queries the kubelet binary with `--version`.
#[derive(Debug, Clone)]
pub struct KubeletBinary {
    binary: PathBuf,
}

impl KubeletBinary {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl KubeletVersionSource for KubeletBinary {
    fn kubelet_version(&self) -> Result<String, VersionError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|source| VersionError::Exec {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VersionError::ExitStatus {
                binary: self.binary.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        debug!(
            binary = %self.binary().display(),
            raw = %raw.trim(),
            "kubelet --version output"
        );
        parse_version_output(&raw)
    }
}

/// A version known up front, e.g. passed on the command line.
#[derive(Debug, Clone)]
pub struct FixedVersion(pub String);

impl KubeletVersionSource for FixedVersion {
    fn kubelet_version(&self) -> Result<String, VersionError> {
        let version = self.0.trim();
        if version.is_empty() {
            return Err(VersionError::Empty);
        }
        Ok(version.to_string())
    }
}

/// Extract the version from `kubelet --version` output ("Kubernetes v1.27.3-eks-...").
pub(crate) fn parse_version_output(raw: &str) -> Result<String, VersionError> {
    let trimmed = raw.trim();
    let version = trimmed
        .strip_prefix("Kubernetes")
        .map(str::trim_start)
        .unwrap_or(trimmed);
    if version.is_empty() {
        return Err(VersionError::Empty);
    }
    Ok(version.to_string())
}

/// Parse a kubelet version into a comparable semantic version.
///
/// The leading `v` is optional. `vMAJOR` and `vMAJOR.MINOR` are accepted as
/// shorthands for `vMAJOR.0.0` and `vMAJOR.MINOR.0`. Build metadata is dropped
/// since it does not take part in precedence.
pub fn parse_version(version: &str) -> Result<semver::Version, VersionError> {
    let stripped = version.strip_prefix('v').unwrap_or(version);

    let normalized = if stripped.contains(['-', '+']) {
        stripped.to_string()
    } else {
        match stripped.matches('.').count() {
            0 => format!("{}.0.0", stripped),
            1 => format!("{}.0", stripped),
            _ => stripped.to_string(),
        }
    };

    let mut parsed =
        semver::Version::parse(&normalized).map_err(|source| VersionError::Invalid {
            version: version.to_string(),
            source,
        })?;
    parsed.build = semver::BuildMetadata::EMPTY;
    Ok(parsed)
}
