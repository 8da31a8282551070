//! Document categories.
//!
//! The repository is organised into a fixed set of top-level directories.
//! Anything that is not one of them is rejected at parse time, which also
//! keeps user-supplied filters from escaping the repository.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A top-level content category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "files")]
    Files,
    #[serde(rename = "engineering")]
    Engineering,
    #[serde(rename = "tools")]
    Tools,
    #[serde(rename = "platforms")]
    Platforms,
    #[serde(rename = "_meta")]
    Meta,
}

impl Category {
    /// All categories in their canonical order.
    pub const ALL: [Category; 5] = [
        Category::Files,
        Category::Engineering,
        Category::Tools,
        Category::Platforms,
        Category::Meta,
    ];

    /// The directory name of this category under the repository root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Engineering => "engineering",
            Self::Tools => "tools",
            Self::Platforms => "platforms",
            Self::Meta => "_meta",
        }
    }

    /// Derives the category of a repository-relative path from its first segment.
    pub fn of_path(path: &str) -> Option<Self> {
        let first = path.split('/').next()?;
        // A bare file at the root is never inside a category.
        if first == path {
            return None;
        }
        first.parse().ok()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.dir_name() == s)
            .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}

/// Scope of a load or query: a single category or the whole repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Returns true if a document with the given category is in scope.
    pub fn matches(&self, category: Option<Category>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => category == Some(*wanted),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Only(c) => write!(f, "{}", c),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}
