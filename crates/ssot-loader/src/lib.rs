//! SSOT Loader - Reads a repository into an immutable corpus
//!
//! Walks the repository root (or one category directory), reads every
//! markdown file on a bounded worker pool and parses each into a
//! [`ssot_core::Document`]. Reads complete before aggregation, so document
//! order is always sorted path order no matter which read finishes first.
//!
//! A missing or unreadable root is the only fatal condition. Files that
//! cannot be read or are not UTF-8 are skipped and reported as warnings.

mod cancel;
mod error;
mod loader;

pub use cancel::CancelFlag;
pub use error::LoadError;
pub use loader::{load_corpus, Corpus, LoadWarning};
