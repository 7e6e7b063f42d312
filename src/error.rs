use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot copy file - source file does not exist: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Failed to create directory {path}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Failed to write archive {path}: {message}")]
    Archive { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Permission denied: {path}")]
    Permission { path: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for SnapshotError {
    fn user_message(&self) -> String {
        match self {
            SnapshotError::SourceMissing { path } => {
                format!("Source file does not exist: {}", path.display())
            }
            SnapshotError::DirectoryCreate { path, source } => {
                format!("Failed to create directory {}: {}", path.display(), source)
            }
            SnapshotError::Fetch { url, message } => {
                format!("Failed to fetch {}: {}", url, message)
            }
            SnapshotError::Archive { path, message } => {
                format!("Failed to write archive {}: {}", path.display(), message)
            }
            SnapshotError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            SnapshotError::Permission { path } => {
                format!("Permission denied accessing: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            SnapshotError::SourceMissing { .. } => Some(
                "Check that the input directory is correct and the application has generated its assets.".to_string(),
            ),
            SnapshotError::DirectoryCreate { .. } => Some(
                "Ensure the output location is writable and not held open by another process.".to_string(),
            ),
            SnapshotError::Fetch { .. } => Some(
                "Verify the application is running locally and the base URL in the configuration is reachable.".to_string(),
            ),
            SnapshotError::Archive { .. } => Some(
                "The exported files were written; re-run the export or archive the output directory manually.".to_string(),
            ),
            SnapshotError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string(),
            ),
            SnapshotError::Permission { .. } => Some(
                "Ensure you have the necessary read/write permissions for the target directory.".to_string(),
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for SnapshotError {
    fn from(error: toml::de::Error) -> Self {
        SnapshotError::Config {
            message: error.to_string(),
        }
    }
}

impl From<url::ParseError> for SnapshotError {
    fn from(error: url::ParseError) -> Self {
        SnapshotError::Config {
            message: format!("invalid URL: {}", error),
        }
    }
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
