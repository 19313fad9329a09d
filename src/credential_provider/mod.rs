//! Kubelet image credential provider configuration.
//!
//! Locates the credential provider plugin, picks the config schema the
//! installed kubelet understands, renders the config document and writes it
//! where kubelet expects it. On success the plugin directory and config path
//! are published into the kubelet flags.

mod binary;
mod error;
mod render;
mod schema;
mod writer;

pub use binary::{binary_dir, ensure_binary_exists, resolve_binary_path};
pub use error::CredentialProviderError;
pub use render::{provider_name, render, TemplateVars, MATCH_IMAGES};
pub use schema::{SchemaGeneration, PUBLIC_ECR_PATTERN, SCHEMA_BOUNDARY_VERSION};
pub use writer::{write_file_with_dir, CONFIG_FILE_MODE};

use std::path::PathBuf;
use tracing::info;

use crate::kubelet::{KubeletFlags, KubeletVersionSource};
use crate::settings::ProviderSettings;

pub const BIN_DIR_FLAG: &str = "image-credential-provider-bin-dir";
pub const CONFIG_FLAG: &str = "image-credential-provider-config";

/// A rendered config that has not been written yet.
#[derive(Debug, Clone)]
pub struct GeneratedConfig {
    pub binary_path: PathBuf,
    pub config_path: PathBuf,
    pub kubelet_version: String,
    pub generation: SchemaGeneration,
    pub contents: Vec<u8>,
}

impl GeneratedConfig {
    /// Record the plugin directory and config path for the kubelet command line.
    pub fn publish(&self, flags: &mut KubeletFlags) {
        flags.insert(
            BIN_DIR_FLAG,
            binary_dir(&self.binary_path).display().to_string(),
        );
        flags.insert(CONFIG_FLAG, self.config_path.display().to_string());
    }
}

/// Resolve the plugin binary, check it exists, classify the kubelet and render.
///
/// Nothing is written.
pub fn generate_image_credential_provider_config(
    settings: &ProviderSettings,
    versions: &dyn KubeletVersionSource,
) -> Result<GeneratedConfig, CredentialProviderError> {
    let binary_path = resolve_binary_path(
        &settings.default_binary_path(),
        settings.bin_path_override.as_deref(),
    );
    ensure_binary_exists(&binary_path)?;

    let kubelet_version = versions.kubelet_version()?;
    let generation = SchemaGeneration::classify(&kubelet_version)?;
    info!(
        kubelet_version = %kubelet_version,
        generation = %generation,
        api_version = generation.config_api_version(),
        "Selected image credential provider config schema"
    );

    let contents = render(generation, &binary_path, MATCH_IMAGES)?;

    Ok(GeneratedConfig {
        binary_path,
        config_path: settings.config_path(),
        kubelet_version,
        generation,
        contents,
    })
}

/// Generate the config, write it, and publish its flags.
///
/// `flags` is only touched once the file is on disk.
pub fn write_image_credential_provider_config(
    settings: &ProviderSettings,
    versions: &dyn KubeletVersionSource,
    flags: &mut KubeletFlags,
) -> Result<GeneratedConfig, CredentialProviderError> {
    let config = generate_image_credential_provider_config(settings, versions)?;

    write_file_with_dir(&config.config_path, &config.contents, CONFIG_FILE_MODE)?;
    config.publish(flags);

    info!(
        path = %config.config_path.display(),
        provider = %config.binary_path.display(),
        "Wrote image credential provider config"
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubelet::{FixedVersion, VersionError};
    use serde_json::Value;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct FailingVersion;

    impl KubeletVersionSource for FailingVersion {
        fn kubelet_version(&self) -> Result<String, VersionError> {
            Err(VersionError::Empty)
        }
    }

    fn settings_in(root: &Path) -> ProviderSettings {
        ProviderSettings {
            root: root.to_path_buf(),
            ..ProviderSettings::default()
        }
    }

    fn install_binary(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"#!/bin/sh\n").unwrap();
    }

    fn read_doc(path: &Path) -> Value {
        serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
    }

    #[test]
    fn test_legacy_kubelet_with_default_binary() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings_in(temp_dir.path());
        install_binary(&settings.default_binary_path());

        let mut flags = KubeletFlags::new();
        let config = write_image_credential_provider_config(
            &settings,
            &FixedVersion("v1.26.5".to_string()),
            &mut flags,
        )
        .unwrap();

        assert_eq!(config.generation, SchemaGeneration::Legacy);
        assert_eq!(config.config_path, temp_dir.path().join("config.json"));

        let doc = read_doc(&config.config_path);
        assert_eq!(doc["apiVersion"], "kubelet.config.k8s.io/v1alpha1");
        assert_eq!(
            doc["providers"][0]["apiVersion"],
            "credentialprovider.kubelet.k8s.io/v1alpha1"
        );
        assert_eq!(doc["providers"][0]["name"], "ecr-credential-provider");
        assert_eq!(doc["providers"][0]["matchImages"].as_array().unwrap().len(), 10);

        assert_eq!(
            flags.get(BIN_DIR_FLAG),
            Some(temp_dir.path().display().to_string().as_str())
        );
        assert_eq!(
            flags.get(CONFIG_FLAG),
            Some(config.config_path.display().to_string().as_str())
        );
    }

    #[test]
    fn test_current_kubelet_with_override_binary() {
        let temp_dir = TempDir::new().unwrap();
        let custom = temp_dir.path().join("custom/path/provider");
        install_binary(&custom);

        let settings = ProviderSettings {
            bin_path_override: Some(custom.clone()),
            ..settings_in(&temp_dir.path().join("etc"))
        };

        let mut flags = KubeletFlags::new();
        flags.insert("node-ip", "10.0.0.1");
        let config = write_image_credential_provider_config(
            &settings,
            &FixedVersion("v1.28.0".to_string()),
            &mut flags,
        )
        .unwrap();

        let doc = read_doc(&config.config_path);
        assert_eq!(doc["apiVersion"], "kubelet.config.k8s.io/v1");
        assert_eq!(doc["providers"][0]["name"], "provider");
        let images = doc["providers"][0]["matchImages"].as_array().unwrap();
        assert_eq!(images.len(), 11);
        assert!(images.iter().any(|v| v == "public.ecr.aws"));

        assert_eq!(
            flags.get(BIN_DIR_FLAG),
            Some(temp_dir.path().join("custom/path").display().to_string().as_str())
        );
        assert_eq!(
            flags.get(CONFIG_FLAG),
            Some(settings.config_path().display().to_string().as_str())
        );
        // Unrelated flags are left alone
        assert_eq!(flags.get("node-ip"), Some("10.0.0.1"));
        assert_eq!(flags.len(), 3);
    }

    #[test]
    fn test_override_used_even_when_default_exists() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings_in(temp_dir.path());
        install_binary(&settings.default_binary_path());

        let settings = ProviderSettings {
            bin_path_override: Some(temp_dir.path().join("elsewhere/missing")),
            ..settings
        };

        let result = generate_image_credential_provider_config(
            &settings,
            &FixedVersion("v1.28.0".to_string()),
        );
        assert!(matches!(
            result,
            Err(CredentialProviderError::BinaryNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_binary_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings_in(&temp_dir.path().join("etc"));

        let mut flags = KubeletFlags::new();
        let err = write_image_credential_provider_config(
            &settings,
            &FixedVersion("v1.28.0".to_string()),
            &mut flags,
        )
        .unwrap_err();

        match err {
            CredentialProviderError::BinaryNotFound { path, .. } => {
                assert_eq!(path, settings.default_binary_path())
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!settings.config_path().exists());
        assert!(flags.is_empty());
    }

    #[test]
    fn test_version_failure_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings_in(temp_dir.path());
        install_binary(&settings.default_binary_path());

        let mut flags = KubeletFlags::new();
        let err =
            write_image_credential_provider_config(&settings, &FailingVersion, &mut flags)
                .unwrap_err();
        assert!(matches!(err, CredentialProviderError::VersionUnavailable(_)));

        let err = write_image_credential_provider_config(
            &settings,
            &FixedVersion("garbage".to_string()),
            &mut flags,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CredentialProviderError::VersionUnavailable(VersionError::Invalid { .. })
        ));

        assert!(!settings.config_path().exists());
        assert!(flags.is_empty());
    }

    #[test]
    fn test_write_failure_leaves_flags_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let binary = temp_dir.path().join("bin/ecr-credential-provider");
        install_binary(&binary);

        // Config root is a regular file so the directory cannot be created
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();

        let settings = ProviderSettings {
            bin_path_override: Some(binary),
            ..settings_in(&blocker)
        };

        let mut flags = KubeletFlags::new();
        let err = write_image_credential_provider_config(
            &settings,
            &FixedVersion("v1.29.1".to_string()),
            &mut flags,
        )
        .unwrap_err();

        assert!(matches!(err, CredentialProviderError::WriteFailure { .. }));
        assert!(flags.is_empty());
    }

    #[test]
    fn test_generation_is_reproducible() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings_in(temp_dir.path());
        install_binary(&settings.default_binary_path());

        let version = FixedVersion("v1.27.0".to_string());
        let first = generate_image_credential_provider_config(&settings, &version).unwrap();
        let second = generate_image_credential_provider_config(&settings, &version).unwrap();

        assert_eq!(first.generation, SchemaGeneration::Current);
        assert_eq!(first.contents, second.contents);
    }
}
