use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the credential provider binary path.
pub const BIN_PATH_OVERRIDE_ENV: &str = "ECR_CREDENTIAL_PROVIDER_BIN_PATH";

/// Prefix for environment variables mapped onto settings, e.g. `CREDPROV_PROVIDER__ROOT`.
pub const ENV_PREFIX: &str = "CREDPROV";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub kubelet: KubeletSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    /// Directory holding the default plugin binary and the generated config
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// File name of the generated config inside `root`
    #[serde(default = "default_config_file_name")]
    pub config_file_name: String,

    /// File name of the default plugin binary inside `root`
    #[serde(default = "default_binary_name")]
    pub binary_name: String,

    /// Plugin binary to use instead of `root/binary_name`
    #[serde(default)]
    pub bin_path_override: Option<PathBuf>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            config_file_name: default_config_file_name(),
            binary_name: default_binary_name(),
            bin_path_override: None,
        }
    }
}

impl ProviderSettings {
    pub fn default_binary_path(&self) -> PathBuf {
        self.root.join(&self.binary_name)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(&self.config_file_name)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct KubeletSettings {
    /// Kubelet executable queried for its version
    #[serde(default = "default_kubelet_binary")]
    pub binary: PathBuf,
}

impl Default for KubeletSettings {
    fn default() -> Self {
        Self {
            binary: default_kubelet_binary(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("/etc/eks/image-credential-provider")
}

fn default_config_file_name() -> String {
    "config.json".to_string()
}

fn default_binary_name() -> String {
    "ecr-credential-provider".to_string()
}

fn default_kubelet_binary() -> PathBuf {
    PathBuf::from("kubelet")
}

impl Settings {
    /// Load settings from the process environment and an optional settings file.
    pub fn new(settings_file: Option<&Path>) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::load(settings_file, vars)
    }

    /// Load settings from an explicit set of environment variables.
    ///
    /// Precedence, lowest first: built-in defaults, the settings file,
    /// `CREDPROV_*` variables, then `ECR_CREDENTIAL_PROVIDER_BIN_PATH`.
    pub fn load(
        settings_file: Option<&Path>,
        vars: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let bin_path_override = vars
            .get(BIN_PATH_OVERRIDE_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let mut builder = Config::builder();

        if let Some(path) = settings_file {
            if !path.exists() {
                return Err(ConfigError::Message(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!("Loading settings from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(Some(vars)),
        );

        let config = builder.build()?;

        // Deserialize and collect unused fields
        let mut unused_fields = Vec::new();
        let mut settings: Settings = serde_ignored::deserialize(config, |path| {
            unused_fields.push(path.to_string());
        })?;

        for field in &unused_fields {
            tracing::warn!("Unknown settings field: {}", field);
        }

        // The plain override variable takes precedence over everything else
        if let Some(path) = bin_path_override {
            settings.provider.bin_path_override = Some(path);
        }

        if settings.provider.config_file_name.is_empty() {
            return Err(ConfigError::Message(
                "provider.config_file_name must not be empty".to_string(),
            ));
        }
        if settings.provider.binary_name.is_empty() {
            return Err(ConfigError::Message(
                "provider.binary_name must not be empty".to_string(),
            ));
        }

        Ok(settings)
    }
}
