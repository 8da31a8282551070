//! Error types for the core crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing the analysis context.
///
/// Per-document and per-link anomalies are never errors; they are carried
/// as warnings or dangling references alongside successful results.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown category '{0}' (expected one of files, engineering, tools, platforms, _meta, all)")]
    UnknownCategory(String),
}

impl CoreError {
    pub(crate) fn config_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
