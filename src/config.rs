use crate::error::{Result, SnapshotError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub site: SiteConfig,
    pub assets: AssetConfig,
    pub export: ExportConfig,
    pub http: HttpConfig,
}

/// The `[site]` section: what the running application looks like from the
/// outside. The first locale listed is the default one.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub host: String,
    pub base_url: String,
    pub locales: Vec<String>,
    pub controllers: Vec<String>,
    pub index_controller: String,
}

/// The `[assets]` section: bundle outputs to fold into the snapshot, both
/// relative to the input directory. Either may be absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AssetConfig {
    pub css_bundle: Option<PathBuf>,
    pub js_bundle: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub archive_name: String,
    /// File kinds never mirrored into the snapshot.
    pub restricted_extensions: Vec<String>,
    /// Prefix for rewritten image URLs; empty keeps them snapshot-relative.
    pub public_path_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            assets: AssetConfig::default(),
            export: ExportConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            base_url: "http://127.0.0.1:8080".to_string(),
            locales: vec!["default".to_string()],
            controllers: Vec::new(),
            index_controller: "index".to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("out"),
            archive_name: "www.zip".to_string(),
            restricted_extensions: vec![
                "php".to_string(),
                "vphp".to_string(),
                "buildpath".to_string(),
                "setting".to_string(),
                "project".to_string(),
                "htaccess".to_string(),
                "json".to_string(),
                "js".to_string(),
                "less".to_string(),
                "css".to_string(),
                "coffee".to_string(),
                "gitignore".to_string(),
                "md".to_string(),
            ],
            public_path_prefix: String::new(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: 30, // seconds per page request
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SnapshotError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| SnapshotError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["sitesnap.toml", "sitesnap.config.toml", ".sitesnap.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref input_dir) = cli_args.input_dir {
            self.export.input_dir = input_dir.clone();
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.export.output_dir = output_dir.clone();
        }

        if let Some(ref archive_name) = cli_args.archive_name {
            self.export.archive_name = archive_name.clone();
        }

        if let Some(ref host) = cli_args.host {
            self.site.host = host.clone();
        }

        if let Some(ref base_url) = cli_args.base_url {
            self.site.base_url = base_url.clone();
        }

        if let Some(timeout) = cli_args.timeout {
            self.http.timeout = timeout;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| SnapshotError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| SnapshotError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.site.locales.is_empty() {
            return Err(SnapshotError::Config {
                message: "At least one locale must be specified".to_string(),
            });
        }

        if self.site.controllers.is_empty() {
            return Err(SnapshotError::Config {
                message: "At least one controller must be specified".to_string(),
            });
        }

        if self.site.host.trim().is_empty() {
            return Err(SnapshotError::Config {
                message: "Site host must not be empty".to_string(),
            });
        }

        // Catch malformed base URLs before any request is attempted.
        url::Url::parse(&self.site.base_url).map_err(|e| SnapshotError::Config {
            message: format!("Invalid base URL {}: {}", self.site.base_url, e),
        })?;

        if self.export.archive_name.trim().is_empty() {
            return Err(SnapshotError::Config {
                message: "Archive name must not be empty".to_string(),
            });
        }

        if self.http.timeout == 0 {
            return Err(SnapshotError::Config {
                message: "HTTP timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.http.timeout)
    }

    pub fn create_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.site.host = "example.com".to_string();
        sample_config.site.locales = vec!["default".to_string(), "fr".to_string()];
        sample_config.site.controllers = vec!["home".to_string(), "about".to_string()];
        sample_config.assets.css_bundle = Some(PathBuf::from("cache/site.css"));
        sample_config.assets.js_bundle = Some(PathBuf::from("www/cache/site.js"));
        sample_config.export.input_dir = PathBuf::from("www");
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub archive_name: Option<String>,
    pub host: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<u64>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_dir(mut self, input_dir: Option<PathBuf>) -> Self {
        self.input_dir = input_dir;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_archive_name(mut self, archive_name: Option<String>) -> Self {
        self.archive_name = archive_name;
        self
    }

    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<u64>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.site.controllers = vec!["home".to_string()];
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site.locales, vec!["default"]);
        assert_eq!(config.export.archive_name, "www.zip");
        assert!(config
            .export
            .restricted_extensions
            .contains(&"php".to_string()));
        assert_eq!(config.http.timeout, 30);
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        config.site.controllers.clear();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.site.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.http.timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let config = valid_config();
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.site.host, loaded_config.site.host);
        assert_eq!(config.export.archive_name, loaded_config.export.archive_name);
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::load_from_file("/nonexistent/sitesnap.toml");
        assert!(matches!(result, Err(SnapshotError::Config { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = valid_config();

        let overrides = CliOverrides::new()
            .with_output_dir(Some(PathBuf::from("/tmp/snapshot")))
            .with_timeout(Some(60));

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.export.output_dir, PathBuf::from("/tmp/snapshot"));
        assert_eq!(config.http.timeout, 60);
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(!sample.is_empty());
        assert!(sample.contains("[site]"));
        assert!(sample.contains("[assets]"));
        assert!(sample.contains("[export]"));
        assert!(sample.contains("[http]"));
    }
}
