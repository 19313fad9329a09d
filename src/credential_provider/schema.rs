use std::fmt;

use crate::kubelet::{parse_version, VersionError};

/// First kubelet release that understands the `v1` credential provider schema.
pub const SCHEMA_BOUNDARY_VERSION: &str = "v1.27.0";

/// ecr-credential-provider handles public.ecr.aws from 1.27 on.
pub const PUBLIC_ECR_PATTERN: &str = "public.ecr.aws";

/// Credential provider config schema generation understood by a kubelet.
///
/// Anything at or above the boundary is treated as `Current`; there is no
/// third generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaGeneration {
    Legacy,
    Current,
}

impl SchemaGeneration {
    /// Classify a kubelet version string against [`SCHEMA_BOUNDARY_VERSION`].
    pub fn classify(version: &str) -> Result<Self, VersionError> {
        let version = parse_version(version)?;
        let boundary = parse_version(SCHEMA_BOUNDARY_VERSION)?;

        if version < boundary {
            Ok(Self::Legacy)
        } else {
            Ok(Self::Current)
        }
    }

    pub fn config_api_version(self) -> &'static str {
        match self {
            Self::Legacy => "kubelet.config.k8s.io/v1alpha1",
            Self::Current => "kubelet.config.k8s.io/v1",
        }
    }

    pub fn provider_api_version(self) -> &'static str {
        match self {
            Self::Legacy => "credentialprovider.kubelet.k8s.io/v1alpha1",
            Self::Current => "credentialprovider.kubelet.k8s.io/v1",
        }
    }

    pub fn includes_public_ecr(self) -> bool {
        matches!(self, Self::Current)
    }

    /// Base patterns plus whatever this generation appends.
    pub fn match_images(self, base: &[&str]) -> Vec<String> {
        let mut patterns: Vec<String> = base.iter().map(|p| p.to_string()).collect();
        if self.includes_public_ecr() {
            patterns.push(PUBLIC_ECR_PATTERN.to_string());
        }
        patterns
    }
}

impl fmt::Display for SchemaGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Current => write!(f, "current"),
        }
    }
}
