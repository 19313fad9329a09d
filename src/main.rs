use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kubelet_credprov::credential_provider::{self, SchemaGeneration};
use kubelet_credprov::{FixedVersion, KubeletBinary, KubeletFlags, KubeletVersionSource, Settings};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (TOML or YAML)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the image credential provider config and print the resulting kubelet flags
    Write {
        /// Use this kubelet version instead of running `kubelet --version`
        #[arg(long)]
        kubelet_version: Option<String>,
    },
    /// Render the image credential provider config to stdout without writing it
    Render {
        /// Use this kubelet version instead of running `kubelet --version`
        #[arg(long)]
        kubelet_version: Option<String>,
    },
    /// Show which config schema a kubelet version maps to
    Classify {
        /// Kubelet version, e.g. v1.27.3
        version: String,
    },
}

fn version_source(
    settings: &Settings,
    kubelet_version: Option<String>,
) -> Box<dyn KubeletVersionSource> {
    match kubelet_version {
        Some(version) => Box::new(FixedVersion(version)),
        None => Box::new(KubeletBinary::new(settings.kubelet.binary.clone())),
    }
}

fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    Settings::new(path.as_deref()).context("Failed to load settings")
}

fn main() -> Result<()> {
    // Logs go to stderr so rendered output on stdout stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Write { kubelet_version } => {
            let settings = load_settings(cli.settings)?;
            let versions = version_source(&settings, kubelet_version);
            let mut flags = KubeletFlags::new();
            credential_provider::write_image_credential_provider_config(
                &settings.provider,
                versions.as_ref(),
                &mut flags,
            )
            .context("Failed to write image credential provider config")?;

            for arg in flags.to_args() {
                println!("{}", arg);
            }
        }
        Commands::Render { kubelet_version } => {
            let settings = load_settings(cli.settings)?;
            let versions = version_source(&settings, kubelet_version);
            let config = credential_provider::generate_image_credential_provider_config(
                &settings.provider,
                versions.as_ref(),
            )
            .context("Failed to render image credential provider config")?;

            std::io::stdout()
                .write_all(&config.contents)
                .context("Failed to write config to stdout")?;
        }
        Commands::Classify { version } => {
            let generation = SchemaGeneration::classify(&version)
                .with_context(|| format!("Failed to classify kubelet version {}", version))?;
            println!("generation: {}", generation);
            println!("config apiVersion: {}", generation.config_api_version());
            println!("provider apiVersion: {}", generation.provider_api_version());
        }
    }

    Ok(())
}
