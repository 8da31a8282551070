use std::path::PathBuf;
use thiserror::Error;

/// Fatal corpus load failures.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Repository not found at {path}: {source}")]
    RepositoryNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Repository root {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("Corpus load cancelled")]
    Cancelled,

    #[error("Failed to start reader pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
