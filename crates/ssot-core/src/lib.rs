//! SSOT Core - Document model for the documentation knowledge base
//!
//! This crate holds the types every other SSOT Atlas crate shares and the
//! pure, I/O-free parsing of markdown text:
//!
//! - [`Document`] and [`Section`]: one file, split at its headings
//! - [`extract_links`]: markdown and bare-path links, classified as
//!   internal, external or anchor-only
//! - [`Reference`]: an internal link to a markdown file, the edge type of
//!   the reference graph
//! - [`SsotConfig`]: per-repository settings
//!
//! # Example
//!
//! ```
//! use ssot_core::{extract_references, Document};
//!
//! let doc = Document::parse("files/a.md", "# A\nSee [B](b.md).\n");
//! let refs = extract_references(&doc);
//! assert_eq!(refs[0].target, "files/b.md");
//! ```

mod category;
mod config;
mod document;
mod error;
mod frontmatter;
mod link;
mod markdown;
mod reference;

pub use category::{Category, CategoryFilter};
pub use config::{SsotConfig, CONFIG_DIR, CONFIG_FILE};
pub use document::{Document, Section};
pub use error::{CoreError, Result};
pub use frontmatter::extract_frontmatter;
pub use link::{classify, extract_links, extract_references, normalize_path, Classified, Link, LinkKind};
pub use reference::Reference;
