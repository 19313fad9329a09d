use std::path::PathBuf;

use crate::kubelet::VersionError;

/// Errors raised while generating the image credential provider config.
///
/// None of these are retried here. The caller owns the retry/abort policy for
/// the provisioning pass.
#[derive(Debug, thiserror::Error)]
pub enum CredentialProviderError {
    #[error("unable to determine kubelet version: {0}")]
    VersionUnavailable(#[from] VersionError),
    #[error(
        "image credential provider binary was not found on path {}. error: {source}",
        .path.display()
    )]
    BinaryNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render image credential provider config: {0}")]
    RenderFailure(String),
    #[error(
        "failed to write image credential provider config to {}: {source}",
        .path.display()
    )]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
