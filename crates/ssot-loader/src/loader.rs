//! Repository walk and parallel document reads.

use crate::cancel::CancelFlag;
use crate::error::LoadError;
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use ssot_core::{CategoryFilter, Document, SsotConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A per-file anomaly that did not stop the load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadWarning {
    /// The file is not valid UTF-8.
    DocumentDecode { path: String, message: String },
    /// The file or directory entry could not be read.
    Unreadable { path: String, message: String },
}

impl LoadWarning {
    pub fn path(&self) -> &str {
        match self {
            Self::DocumentDecode { path, .. } | Self::Unreadable { path, .. } => path,
        }
    }
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DocumentDecode { path, message } => write!(f, "{}: not UTF-8 ({})", path, message),
            Self::Unreadable { path, message } => write!(f, "{}: unreadable ({})", path, message),
        }
    }
}

/// The documents of one load, in discovery (sorted path) order.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub root: PathBuf,
    pub filter: CategoryFilter,
    pub documents: Vec<Document>,
    pub warnings: Vec<LoadWarning>,
    /// SHA-256 over every (path, content hash) pair; equal hashes mean equal corpora.
    pub corpus_hash: String,
    pub duration_ms: u64,
}

impl Corpus {
    /// Finds a document by repository-relative path.
    pub fn get(&self, path: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.path == path)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

enum ReadOutcome {
    Loaded(Document),
    Skipped(LoadWarning),
    Cancelled,
}

/// Loads every markdown document under `root` that falls within `filter`.
///
/// # Errors
///
/// Fails if the root does not exist, is not a readable directory, or the
/// load is cancelled. An empty corpus is a valid result.
pub fn load_corpus(
    root: &Path,
    filter: CategoryFilter,
    config: &SsotConfig,
    cancel: &CancelFlag,
) -> Result<Corpus, LoadError> {
    let start = Instant::now();

    let metadata = fs::metadata(root).map_err(|source| LoadError::RepositoryNotFound {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(LoadError::NotADirectory(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|source| LoadError::RepositoryNotFound {
        path: root.to_path_buf(),
        source,
    })?;

    let scan_root = match filter {
        CategoryFilter::All => root.to_path_buf(),
        CategoryFilter::Only(category) => root.join(category.dir_name()),
    };

    let mut warnings = Vec::new();
    let files = if scan_root.is_dir() {
        discover(root, &scan_root, config, &mut warnings)
    } else {
        debug!("Category directory {} does not exist", scan_root.display());
        Vec::new()
    };
    debug!("Discovered {} markdown files", files.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_concurrency.max(1))
        .build()?;
    let outcomes: Vec<ReadOutcome> = pool.install(|| {
        files
            .par_iter()
            .map(|(rel, abs)| read_document(rel, abs, cancel))
            .collect()
    });

    if cancel.is_cancelled() {
        warn!("Corpus load cancelled, discarding {} reads", outcomes.len());
        return Err(LoadError::Cancelled);
    }

    let mut documents = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            ReadOutcome::Loaded(doc) => documents.push(doc),
            ReadOutcome::Skipped(warning) => {
                warn!("Skipping {}", warning);
                warnings.push(warning);
            }
            ReadOutcome::Cancelled => return Err(LoadError::Cancelled),
        }
    }

    let corpus_hash = corpus_hash(&documents);
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Loaded {} documents ({} warnings) from {} in {}ms",
        documents.len(),
        warnings.len(),
        root.display(),
        duration_ms
    );

    Ok(Corpus {
        root: root.to_path_buf(),
        filter,
        documents,
        warnings,
        corpus_hash,
        duration_ms,
    })
}

/// Collects (relative path, absolute path) for markdown files, sorted by relative path.
fn discover(
    root: &Path,
    scan_root: &Path,
    config: &SsotConfig,
    warnings: &mut Vec<LoadWarning>,
) -> Vec<(String, PathBuf)> {
    let walker = WalkDir::new(scan_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !config.skips_dir(&entry.file_name().to_string_lossy())
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| relative_path(root, p))
                    .unwrap_or_else(|| scan_root.display().to_string());
                warnings.push(LoadWarning::Unreadable {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let is_markdown = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("md"));
        if entry.file_type().is_file() && is_markdown {
            files.push((relative_path(root, entry.path()), entry.into_path()));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    files
}

fn read_document(rel: &str, abs: &Path, cancel: &CancelFlag) -> ReadOutcome {
    if cancel.is_cancelled() {
        return ReadOutcome::Cancelled;
    }

    let bytes = match fs::read(abs) {
        Ok(bytes) => bytes,
        Err(e) => {
            return ReadOutcome::Skipped(LoadWarning::Unreadable {
                path: rel.to_string(),
                message: e.to_string(),
            })
        }
    };

    match String::from_utf8(bytes) {
        Ok(text) => ReadOutcome::Loaded(Document::parse(rel, text)),
        Err(e) => ReadOutcome::Skipped(LoadWarning::DocumentDecode {
            path: rel.to_string(),
            message: e.utf8_error().to_string(),
        }),
    }
}

/// Repository-relative path with `/` separators.
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn corpus_hash(documents: &[Document]) -> String {
    let mut hasher = Sha256::new();
    for doc in documents {
        hasher.update(doc.path.as_bytes());
        hasher.update([0u8]);
        hasher.update(doc.content_hash.as_bytes());
        hasher.update([b'\n']);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssot_core::Category;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, body: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn load(root: &Path, filter: CategoryFilter) -> Result<Corpus, LoadError> {
        load_corpus(root, filter, &SsotConfig::default(), &CancelFlag::new())
    }

    fn paths(corpus: &Corpus) -> Vec<&str> {
        corpus.documents.iter().map(|d| d.path.as_str()).collect()
    }

    #[test]
    fn test_loads_in_sorted_order() {
        let dir = tempdir().unwrap();
        write(dir.path(), "tools/z.md", b"# Z");
        write(dir.path(), "files/b.md", b"# B");
        write(dir.path(), "files/a.md", b"# A");
        write(dir.path(), "README.md", b"# Root");
        write(dir.path(), "files/notes.txt", b"ignored");

        let corpus = load(dir.path(), CategoryFilter::All).unwrap();
        assert_eq!(paths(&corpus), vec!["README.md", "files/a.md", "files/b.md", "tools/z.md"]);
        assert_eq!(corpus.get("files/a.md").unwrap().category, Some(Category::Files));
        assert!(corpus.warnings.is_empty());
    }

    #[test]
    fn test_category_filter() {
        let dir = tempdir().unwrap();
        write(dir.path(), "files/a.md", b"# A");
        write(dir.path(), "tools/t.md", b"# T");

        let corpus = load(dir.path(), CategoryFilter::Only(Category::Tools)).unwrap();
        assert_eq!(paths(&corpus), vec!["tools/t.md"]);

        let corpus = load(dir.path(), CategoryFilter::Only(Category::Platforms)).unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("nope"), CategoryFilter::All).unwrap_err();
        assert!(matches!(err, LoadError::RepositoryNotFound { .. }));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let dir = tempdir().unwrap();
        write(dir.path(), "file.md", b"x");
        let err = load(&dir.path().join("file.md"), CategoryFilter::All).unwrap_err();
        assert!(matches!(err, LoadError::NotADirectory(_)));
    }

    #[test]
    fn test_invalid_utf8_is_a_warning() {
        let dir = tempdir().unwrap();
        write(dir.path(), "files/good.md", b"# Good");
        write(dir.path(), "files/bad.md", &[0xff, 0xfe, 0x00, 0x41]);

        let corpus = load(dir.path(), CategoryFilter::All).unwrap();
        assert_eq!(paths(&corpus), vec!["files/good.md"]);
        assert_eq!(corpus.warnings.len(), 1);
        assert!(matches!(
            &corpus.warnings[0],
            LoadWarning::DocumentDecode { path, .. } if path == "files/bad.md"
        ));
    }

    #[test]
    fn test_skips_hidden_and_configured_dirs() {
        let dir = tempdir().unwrap();
        write(dir.path(), ".git/HEAD.md", b"x");
        write(dir.path(), "node_modules/pkg/README.md", b"x");
        write(dir.path(), "files/a.md", b"x");

        let corpus = load(dir.path(), CategoryFilter::All).unwrap();
        assert_eq!(paths(&corpus), vec!["files/a.md"]);
    }

    #[test]
    fn test_empty_repository_is_valid() {
        let dir = tempdir().unwrap();
        let corpus = load(dir.path(), CategoryFilter::All).unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_cancelled_load_discards_results() {
        let dir = tempdir().unwrap();
        write(dir.path(), "files/a.md", b"# A");

        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = load_corpus(dir.path(), CategoryFilter::All, &SsotConfig::default(), &cancel)
            .unwrap_err();
        assert!(matches!(err, LoadError::Cancelled));
    }

    #[test]
    fn test_corpus_hash_tracks_content() {
        let dir = tempdir().unwrap();
        write(dir.path(), "files/a.md", b"# A");

        let first = load(dir.path(), CategoryFilter::All).unwrap();
        let again = load(dir.path(), CategoryFilter::All).unwrap();
        assert_eq!(first.corpus_hash, again.corpus_hash);

        write(dir.path(), "files/a.md", b"# A changed");
        let changed = load(dir.path(), CategoryFilter::All).unwrap();
        assert_ne!(first.corpus_hash, changed.corpus_hash);
    }

    #[test]
    fn test_single_worker_gives_same_order() {
        let dir = tempdir().unwrap();
        for name in ["c", "a", "b", "e", "d"] {
            write(dir.path(), &format!("files/{}.md", name), b"# x");
        }
        let config = SsotConfig {
            max_concurrency: 1,
            ..SsotConfig::default()
        };
        let serial = load_corpus(dir.path(), CategoryFilter::All, &config, &CancelFlag::new()).unwrap();
        let parallel = load(dir.path(), CategoryFilter::All).unwrap();
        assert_eq!(paths(&serial), paths(&parallel));
    }
}
