use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sitesnap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Export a running localized web application as a static HTML snapshot")]
#[command(
    long_about = "SiteSnap fetches every locale/controller page of a locally running web \
                       application, rewrites bundled asset references, mirrors ancillary \
                       resources and packs the result into a zip archive."
)]
#[command(before_help = "📸 SiteSnap - Static HTML Export Tool")]
#[command(after_help = "EXAMPLES:\n  \
    sitesnap --config sitesnap.toml\n  \
    sitesnap --input www --output out --verbose\n  \
    sitesnap --base-url http://127.0.0.1:8080 --host example.com\n  \
    sitesnap --generate-config")]
pub struct Cli {
    /// Input directory holding the application's web root
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory for the static snapshot
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Name of the zip archive written next to the output directory
    #[arg(long)]
    pub archive_name: Option<String>,

    /// Host header sent with every page request
    #[arg(long)]
    pub host: Option<String>,

    /// Base URL of the locally running application
    #[arg(long, help = "Base URL serving the rendered pages (e.g. http://127.0.0.1:8080)")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, help = "Timeout for each page request (seconds)")]
    pub timeout: Option<u64>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be exported without executing)
    #[arg(long, help = "Show what would be exported without actually doing it")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_input_dir(self.input.clone())
            .with_output_dir(self.output.clone())
            .with_archive_name(self.archive_name.clone())
            .with_host(self.host.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(self.timeout)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
