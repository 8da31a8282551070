//! Repository-level configuration.
//!
//! Configuration lives in `.ssot/config.json` under the repository root.
//! Every field has a default so an absent file, or a partial one, is valid.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding tool state inside the repository.
pub const CONFIG_DIR: &str = ".ssot";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsotConfig {
    /// File names exempt from orphan classification at the root or a category root.
    pub entry_points: Vec<String>,

    /// Upper bound on concurrent file reads during a corpus load.
    pub max_concurrency: usize,

    /// Repository-relative path of the controlled vocabulary.
    pub taxonomy_path: String,

    /// Minimum corpus-wide count for a term to be proposed for the vocabulary.
    pub undefined_term_threshold: usize,

    /// Maximum number of ranked sources returned by a query.
    pub max_results: usize,

    /// Stop enumerating cycles after this many have been found.
    pub max_cycles: usize,

    /// Directory names never descended into.
    pub skip_dirs: Vec<String>,
}

impl Default for SsotConfig {
    fn default() -> Self {
        Self {
            entry_points: vec!["README.md".to_string(), "INDEX.md".to_string()],
            max_concurrency: 8,
            taxonomy_path: "_meta/TAXONOMY.md".to_string(),
            undefined_term_threshold: 3,
            max_results: 5,
            max_cycles: 10_000,
            skip_dirs: [".git", "node_modules", "target", ".venv", "venv", CONFIG_DIR]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl SsotConfig {
    /// Path of the config file for a repository root.
    pub fn path_for(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Loads the config for a repository, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path_for(root);
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path).map_err(|e| CoreError::config_io(&path, e))?;
        let mut config: SsotConfig =
            serde_json::from_str(&raw).map_err(|source| CoreError::Config {
                path: path.clone(),
                source,
            })?;
        config.max_concurrency = config.max_concurrency.max(1);
        config.max_results = config.max_results.max(1);
        Ok(config)
    }

    /// Writes the config, creating the config directory if needed.
    pub fn save(&self, root: &Path) -> Result<PathBuf> {
        let path = Self::path_for(root);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| CoreError::config_io(dir, e))?;
        }
        let body = serde_json::to_string_pretty(self).map_err(|source| CoreError::Config {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, body).map_err(|e| CoreError::config_io(&path, e))?;
        Ok(path)
    }

    /// Returns true if `path` is an entry point.
    ///
    /// Entry points are files named like one of `entry_points` (ASCII
    /// case-insensitive) that sit at the repository root or directly inside
    /// a top-level directory.
    pub fn is_entry_point(&self, path: &str) -> bool {
        if path.split('/').count() > 2 {
            return false;
        }
        let name = path.rsplit('/').next().unwrap_or(path);
        self.entry_points
            .iter()
            .any(|entry| entry.eq_ignore_ascii_case(name))
    }

    /// Returns true if the walker should not descend into a directory with this name.
    pub fn skips_dir(&self, name: &str) -> bool {
        name.starts_with('.') || self.skip_dirs.iter().any(|d| d == name)
    }
}
