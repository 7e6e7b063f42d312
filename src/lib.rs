pub mod cli;
pub mod config;
pub mod error;
pub mod exporter;
pub mod fetcher;
pub mod rewriter;
pub mod site;
pub mod ui;
pub mod walker;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{AssetConfig, CliOverrides, Config, ExportConfig, HttpConfig, SiteConfig};
pub use error::{Result, SnapshotError, UserFriendlyError};

// Core functionality re-exports
pub use exporter::{ChangeAwareCopier, CopyAction, ExportOrchestrator, ExportReport, ExportRequest};
pub use fetcher::{FetchResult, PageTask, SnapshotFetcher};
pub use site::{AppRouter, AssetBundle, AssetBundler, ConfigBundler, ConfigRouter, Locale};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};
pub use walker::{ResourceFile, ResourceWalker};

use std::path::Path;

/// Main library interface for SiteSnap functionality
pub struct SiteSnap {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl SiteSnap {
    /// Create a new SiteSnap instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
        })
    }

    /// Create SiteSnap instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            crate::cli::OutputFormat::Human => OutputMode::Human,
            crate::cli::OutputFormat::Json => OutputMode::Json,
            crate::cli::OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Run the full static export against the configured application.
    pub async fn export(&self) -> Result<ExportReport> {
        let bundler = ConfigBundler::new(&self.config.assets);
        let router = ConfigRouter::new(&self.config.site);
        let walker = ResourceWalker::new(self.config.export.restricted_extensions.clone())
            .with_excluded_root(self.config.export.output_dir.clone());
        let fetcher = SnapshotFetcher::new(self.config.request_timeout_duration())?;

        let orchestrator = ExportOrchestrator::new(
            &bundler,
            &router,
            &walker,
            &fetcher,
            &self.output_formatter,
            &self.progress_manager,
        );

        let request = ExportRequest {
            source_root: self.config.export.input_dir.clone(),
            output_root: self.config.export.output_dir.clone(),
            archive_name: self.config.export.archive_name.clone(),
            public_path_prefix: self.config.export.public_path_prefix.clone(),
        };

        let report = orchestrator.export(&request).await?;
        self.output_formatter.print_export_summary(&report);

        Ok(report)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config).map_err(SnapshotError::Io)?;
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Get progress manager reference
    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &SnapshotError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
