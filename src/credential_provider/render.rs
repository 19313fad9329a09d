// Credential provider config rendering

use lazy_static::lazy_static;
use serde::Serialize;
use std::path::Path;
use tera::Tera;
use tracing::debug;

use super::error::CredentialProviderError;
use super::schema::SchemaGeneration;

const TEMPLATE_NAME: &str = "image-credential-provider.json";

lazy_static! {
    /// Parsed once per process. Holds the parse error instead of panicking so
    /// a broken template surfaces as a render failure.
    static ref TEMPLATES: Result<Tera, String> = {
        let mut tera = Tera::default();
        match tera.add_raw_template(
            TEMPLATE_NAME,
            include_str!("../../templates/image-credential-provider.json.tera"),
        ) {
            Ok(()) => Ok(tera),
            Err(e) => Err(format!("{:#}", e)),
        }
    };
}

/// Registries served by ecr-credential-provider on every kubelet version.
pub const MATCH_IMAGES: &[&str] = &[
    "*.dkr.ecr.*.amazonaws.com",
    "*.dkr-ecr.*.on.aws",
    "*.dkr.ecr.*.amazonaws.com.cn",
    "*.dkr-ecr.*.on.amazonwebservices.com.cn",
    "*.dkr.ecr-fips.*.amazonaws.com",
    "*.dkr-ecr-fips.*.on.aws",
    "*.dkr.ecr.*.c2s.ic.gov",
    "*.dkr.ecr.*.sc2s.sgov.gov",
    "*.dkr.ecr.*.cloud.adc-e.uk",
    "*.dkr.ecr.*.csp.hci.ic.gov",
];

/// Values substituted into the template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateVars {
    pub config_api_version: String,
    pub provider_api_version: String,
    pub provider_name: String,
    pub match_images: Vec<String>,
}

impl TemplateVars {
    pub fn new(generation: SchemaGeneration, binary_path: &Path, base_patterns: &[&str]) -> Self {
        Self {
            config_api_version: generation.config_api_version().to_string(),
            provider_api_version: generation.provider_api_version().to_string(),
            provider_name: provider_name(binary_path),
            match_images: generation.match_images(base_patterns),
        }
    }
}

/// The name kubelet uses to invoke the plugin: the binary's file name.
pub fn provider_name(binary_path: &Path) -> String {
    binary_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| binary_path.display().to_string())
}

/// Render the credential provider config document.
///
/// Output depends only on the arguments, so repeated calls yield identical bytes.
pub fn render(
    generation: SchemaGeneration,
    binary_path: &Path,
    base_patterns: &[&str],
) -> Result<Vec<u8>, CredentialProviderError> {
    let vars = TemplateVars::new(generation, binary_path, base_patterns);
    render_vars(&vars)
}

pub(crate) fn render_vars(vars: &TemplateVars) -> Result<Vec<u8>, CredentialProviderError> {
    let tera = TEMPLATES
        .as_ref()
        .map_err(|e| CredentialProviderError::RenderFailure(e.clone()))?;

    let context = tera::Context::from_serialize(vars)
        .map_err(|e| CredentialProviderError::RenderFailure(format!("{:#}", e)))?;

    let rendered = tera
        .render(TEMPLATE_NAME, &context)
        .map_err(|e| CredentialProviderError::RenderFailure(format!("{:#}", e)))?;

    debug!(
        provider = %vars.provider_name,
        api_version = %vars.config_api_version,
        match_images = vars.match_images.len(),
        "Rendered image credential provider config"
    );

    Ok(rendered.into_bytes())
}
