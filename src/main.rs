use clap::Parser;
use sitesnap::{Cli, OutputFormatter, OutputMode, SiteSnap, SnapshotError, UserFriendlyError};
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let sitesnap = match SiteSnap::from_cli(&cli) {
        Ok(sitesnap) => sitesnap,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    if cli.dry_run {
        return handle_dry_run(&sitesnap);
    }

    match sitesnap.export().await {
        // Partial failures were already reported as warnings; the snapshot on
        // disk is usable, so the run still counts as a success.
        Ok(_report) => 0,
        Err(e) => {
            sitesnap.handle_error(&e);

            match e {
                SnapshotError::Config { .. } => 2,
                SnapshotError::SourceMissing { .. } => 3,
                SnapshotError::InvalidPath { .. } => 4,
                SnapshotError::Fetch { .. } => 5,
                SnapshotError::Archive { .. } => 6,
                SnapshotError::Permission { .. } => 7,
                SnapshotError::DirectoryCreate { .. } => 8,
                _ => 1,
            }
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "sitesnap.toml".to_string());

    match SiteSnap::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  sitesnap --config {}", config_path);
            println!("\nEdit the file to match your application's locales and controllers.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(sitesnap: &SiteSnap) -> i32 {
    let formatter = sitesnap.output_formatter();
    let config = sitesnap.config();

    formatter.info("DRY RUN MODE - No pages will be exported");
    formatter.info("Configuration that would be used:");

    println!("  Host: {}", config.site.host);
    println!("  Base URL: {}", config.site.base_url);
    println!("  Locales: {}", config.site.locales.join(", "));
    println!("  Controllers: {}", config.site.controllers.join(", "));
    println!("  Input directory: {}", config.export.input_dir.display());
    println!("  Output directory: {}", config.export.output_dir.display());
    println!("  Archive: {}", config.export.archive_name);
    println!("  Request timeout: {} seconds", config.http.timeout);

    let page_count = config.site.locales.len() * config.site.controllers.len();
    formatter.info(&format!("Would fetch up to {} pages", page_count));

    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to perform the actual export");

    0
}

fn print_startup_error(error: &SnapshotError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitesnap::{Config, OutputFormat};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn cli_with_config(config: Option<PathBuf>) -> Cli {
        Cli {
            input: None,
            output: None,
            config,
            archive_name: None,
            host: None,
            base_url: None,
            timeout: None,
            output_format: OutputFormat::Plain,
            verbose: 0,
            quiet: true,
            dry_run: false,
            generate_config: true,
        }
    }

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = cli_with_config(Some(config_path.clone()));
        let exit_code = handle_generate_config(&cli);

        assert_eq!(exit_code, 0);
        assert!(config_path.exists());

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[site]"));
        assert!(content.contains("[assets]"));
    }

    #[test]
    fn test_dry_run_mode() {
        let mut config = Config::default();
        config.site.controllers = vec!["home".to_string()];

        let sitesnap = SiteSnap::new(config, OutputMode::Plain, 0, true).unwrap();
        let exit_code = handle_dry_run(&sitesnap);
        assert_eq!(exit_code, 0);
    }
}
