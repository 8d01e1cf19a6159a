use std::path::PathBuf;

use thiserror::Error;

/// Main error type for callmap operations
#[derive(Error, Debug)]
pub enum CallmapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Analysis task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, CallmapError>;
