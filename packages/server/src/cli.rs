//! Command-line interface and logging setup

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use podcast_studio::Settings;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info,podcast_studio=debug,podcast_server=debug,tower_http=info";

/// Two-speaker podcast generation service
#[derive(Parser, Debug)]
#[command(
    name = "podcast-server",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generates two-speaker podcasts and streams progress over Server-Sent Events"
)]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(long, env = "PODCAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "PODCAST_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PODCAST_PORT")]
    pub port: Option<u16>,

    /// Directory for uploaded files
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// Directory for generated podcasts and scripts
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "human")]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output
    Human,
    /// JSON lines for log collectors
    Json,
    /// Single-line compact output
    Compact,
}

impl Cli {
    /// Install the global tracing subscriber. `RUST_LOG` wins over the
    /// built-in filter.
    pub fn init_logging(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let result = match self.log_format {
            LogFormat::Human => tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .try_init(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(filter)
                .try_init(),
            LogFormat::Compact => tracing_subscriber::registry()
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .with(filter)
                .try_init(),
        };
        if let Err(err) = result {
            eprintln!("logging already initialized: {err}");
        }
    }

    /// Command-line values take precedence over the configuration file.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(dir) = &self.upload_dir {
            settings.storage.upload_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            settings.storage.output_dir = dir.clone();
        }
    }
}
