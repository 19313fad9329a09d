//! Generates the kubelet image credential provider configuration for worker nodes.

pub mod credential_provider;
pub mod kubelet;
pub mod settings;

pub use credential_provider::{
    generate_image_credential_provider_config, write_image_credential_provider_config,
    CredentialProviderError, GeneratedConfig, SchemaGeneration,
};
pub use kubelet::{FixedVersion, KubeletBinary, KubeletFlags, KubeletVersionSource};
pub use settings::Settings;
