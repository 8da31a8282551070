//! Link extraction.
//!
//! Finds markdown links (`[text](target)`) and bare relative paths ending in
//! `.md`, tags each with the section it appears in, and resolves internal
//! targets to normalized repository-relative paths.

use crate::document::Document;
use crate::markdown::{code_spans, FenceState};
use crate::reference::Reference;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// How a link target relates to the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Resolves to a path inside the repository root.
    Internal,
    /// Has a scheme, is protocol-relative, or escapes the repository root.
    External,
    /// A fragment within the same file.
    AnchorOnly,
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Internal => "internal",
            Self::External => "external",
            Self::AnchorOnly => "anchor_only",
        };
        write!(f, "{}", s)
    }
}

/// A link found in a document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The target exactly as written.
    pub raw: String,

    /// Link text, `None` for bare paths.
    pub text: Option<String>,

    pub kind: LinkKind,

    /// Normalized repository-relative path for internal links, the URL for
    /// external ones, `None` for anchor-only links.
    pub target: Option<String>,

    /// Fragment after `#`, if any.
    pub anchor: Option<String>,

    /// Index of the originating section.
    pub section: usize,

    /// 1-based line number.
    pub line: usize,

    /// True for `![alt](src)` image links.
    pub image: bool,
}

impl Link {
    /// True for internal links that point at a markdown document.
    pub fn is_document_link(&self) -> bool {
        self.kind == LinkKind::Internal
            && self
                .target
                .as_deref()
                .is_some_and(|t| t.to_ascii_lowercase().ends_with(".md"))
    }

    /// Converts a document link into a graph reference.
    pub fn to_reference(&self, source: &str) -> Option<Reference> {
        if !self.is_document_link() {
            return None;
        }
        Some(Reference {
            source: source.to_string(),
            target: self.target.clone()?,
            anchor: self.anchor.clone(),
            section: self.section,
            line: self.line,
        })
    }
}

fn markdown_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(!?)\[([^\]]*)\]\(\s*(<[^>]*>|[^)\s]+)(?:\s+(?:"[^"]*"|'[^']*'))?\s*\)"#)
            .expect("markdown link pattern is valid")
    })
}

fn bare_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9_./\-]*[A-Za-z0-9_\-]\.md(?:#[A-Za-z0-9_\-]+)?")
            .expect("bare path pattern is valid")
    })
}

fn scheme_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("scheme pattern is valid"))
}

/// Extracts all links from a document in source order.
pub fn extract_links(document: &Document) -> Vec<Link> {
    let mut links = Vec::new();
    let mut fence = FenceState::default();

    for (line_no, line) in document.content_lines() {
        if fence.consume(line) {
            continue;
        }
        let section = document.section_at_line(line_no).unwrap_or(0);
        let code = code_spans(line);
        let in_code = |pos: usize| code.iter().any(|(s, e)| pos >= *s && pos < *e);
        let mut taken: Vec<(usize, usize)> = Vec::new();

        for caps in markdown_link_re().captures_iter(line) {
            let Some(whole) = caps.get(0) else { continue };
            if in_code(whole.start()) {
                continue;
            }
            taken.push((whole.start(), whole.end()));

            let raw = caps[3].trim_start_matches('<').trim_end_matches('>').to_string();
            let resolved = classify(&document.path, &raw);
            links.push(Link {
                raw,
                text: Some(caps[2].to_string()),
                kind: resolved.kind,
                target: resolved.target,
                anchor: resolved.anchor,
                section,
                line: line_no,
                image: !caps[1].is_empty(),
            });
        }

        for m in bare_path_re().find_iter(line) {
            let overlaps = taken.iter().any(|(s, e)| m.start() < *e && m.end() > *s);
            if overlaps || in_code(m.start()) || !is_bare_boundary(line, m.start(), m.end()) {
                continue;
            }
            let raw = m.as_str().to_string();
            let resolved = classify(&document.path, &raw);
            links.push(Link {
                raw,
                text: None,
                kind: resolved.kind,
                target: resolved.target,
                anchor: resolved.anchor,
                section,
                line: line_no,
                image: false,
            });
        }
    }

    links
}

/// Extracts the graph references of a document: its internal links to markdown files.
pub fn extract_references(document: &Document) -> Vec<Reference> {
    extract_links(document)
        .iter()
        .filter_map(|link| link.to_reference(&document.path))
        .collect()
}

/// Rejects bare-path matches that are fragments of URLs, e-mail addresses or longer names.
fn is_bare_boundary(line: &str, start: usize, end: usize) -> bool {
    let before = line[..start].chars().next_back();
    if matches!(before, Some(c) if c.is_alphanumeric() || matches!(c, ':' | '@' | '~' | '\\' | '%')) {
        return false;
    }
    let mut after = line[end..].chars();
    match after.next() {
        Some(c) if c.is_alphanumeric() || c == '_' || c == '/' => false,
        Some('.') => !after.next().is_some_and(|c| c.is_alphanumeric()),
        _ => true,
    }
}

/// Result of classifying a raw target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: LinkKind,
    pub target: Option<String>,
    pub anchor: Option<String>,
}

/// Classifies a raw link target found in the document at `source_path`.
pub fn classify(source_path: &str, raw: &str) -> Classified {
    let raw = raw.trim();
    let anchor_only = |anchor: Option<&str>| Classified {
        kind: LinkKind::AnchorOnly,
        target: None,
        anchor: anchor.filter(|a| !a.is_empty()).map(String::from),
    };

    if let Some(fragment) = raw.strip_prefix('#') {
        return anchor_only(Some(fragment));
    }
    if raw.starts_with("//") || scheme_re().is_match(raw) {
        return Classified {
            kind: LinkKind::External,
            target: Some(raw.to_string()),
            anchor: None,
        };
    }

    let (path_part, anchor) = match raw.split_once('#') {
        Some((p, a)) => (p, Some(a)),
        None => (raw, None),
    };
    let path_part = path_part.split('?').next().unwrap_or("");
    if path_part.is_empty() {
        return anchor_only(anchor);
    }

    let path_part = percent_decode(path_part).replace('\\', "/");
    let (base, relative) = match path_part.strip_prefix('/') {
        Some(rooted) => ("", rooted.to_string()),
        None => (parent_dir(source_path), path_part),
    };

    match normalize_path(base, &relative) {
        Some(target) => Classified {
            kind: LinkKind::Internal,
            target: Some(target),
            anchor: anchor.filter(|a| !a.is_empty()).map(String::from),
        },
        None => {
            tracing::debug!("Link '{}' in {} escapes the repository", raw, source_path);
            Classified {
                kind: LinkKind::External,
                target: Some(raw.to_string()),
                anchor: None,
            }
        }
    }
}

/// Decodes `%XX` escapes. Malformed escapes are kept as written.
fn percent_decode(input: &str) -> String {
    if !input.contains('%') {
        return input.to_string();
    }
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 3 <= bytes.len() {
            let hex = (
                (bytes[i + 1] as char).to_digit(16),
                (bytes[i + 2] as char).to_digit(16),
            );
            if let (Some(hi), Some(lo)) = hex {
                out.push(((hi << 4) | lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Joins `relative` onto `base` and resolves `.` and `..` segments.
///
/// Returns `None` if the result would climb above the repository root.
pub fn normalize_path(base: &str, relative: &str) -> Option<String> {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn targets(doc: &Document) -> Vec<(LinkKind, Option<String>)> {
        extract_links(doc)
            .into_iter()
            .map(|l| (l.kind, l.target))
            .collect()
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("files", "./docs/guide.md").unwrap(), "files/docs/guide.md");
        assert_eq!(normalize_path("files/a", "../b.md").unwrap(), "files/b.md");
        assert_eq!(normalize_path("", "x/./y/../z.md").unwrap(), "x/z.md");
        assert_eq!(normalize_path("files", "../../etc.md"), None);
    }

    #[test]
    fn test_classify() {
        let c = classify("files/source.md", "./docs/guide.md#setup");
        assert_eq!(c.kind, LinkKind::Internal);
        assert_eq!(c.target.as_deref(), Some("files/docs/guide.md"));
        assert_eq!(c.anchor.as_deref(), Some("setup"));

        let c = classify("files/source.md", "/files/intro.md");
        assert_eq!(c.target.as_deref(), Some("files/intro.md"));

        assert_eq!(classify("a.md", "https://example.com/x.md").kind, LinkKind::External);
        assert_eq!(classify("a.md", "mailto:me@example.com").kind, LinkKind::External);
        assert_eq!(classify("a.md", "//cdn.example.com/a.md").kind, LinkKind::External);
        assert_eq!(classify("a.md", "../outside.md").kind, LinkKind::External);

        let c = classify("a.md", "#usage");
        assert_eq!(c.kind, LinkKind::AnchorOnly);
        assert_eq!(c.anchor.as_deref(), Some("usage"));

        let c = classify("a.md", "b.md?plain=1");
        assert_eq!(c.target.as_deref(), Some("b.md"));
    }

    #[test]
    fn test_extracts_markdown_and_bare_links() {
        let doc = Document::parse(
            "files/a.md",
            "# A\nSee [B](b.md) and [site](https://x.io).\n\n## More\nAlso ../tools/git.md, and [top](#a).\n",
        );
        let links = extract_links(&doc);
        assert_eq!(
            targets(&doc),
            vec![
                (LinkKind::Internal, Some("files/b.md".to_string())),
                (LinkKind::External, Some("https://x.io".to_string())),
                (LinkKind::AnchorOnly, None),
                (LinkKind::Internal, Some("tools/git.md".to_string())),
            ]
        );
        assert_eq!(links[0].section, 0);
        assert_eq!(links[0].text.as_deref(), Some("B"));
        // Markdown links on a line come before bare paths on the same line.
        assert_eq!(links[3].section, 1);
        assert_eq!(links[3].line, 5);
        assert!(links[3].text.is_none());
    }

    #[test]
    fn test_ignores_code() {
        let doc = Document::parse(
            "a.md",
            "```\n[x](hidden.md)\n```\nInline `skip.md` but [y](shown.md)\n",
        );
        assert_eq!(
            targets(&doc),
            vec![(LinkKind::Internal, Some("shown.md".to_string()))]
        );
    }

    #[test]
    fn test_bare_path_boundaries() {
        let doc = Document::parse(
            "a.md",
            "https://host/path/x.md user@host.md b.mdx c.md.bak d.md. e.md\n",
        );
        let found: Vec<String> = extract_links(&doc)
            .into_iter()
            .filter_map(|l| l.target)
            .collect();
        assert_eq!(found, vec!["d.md".to_string(), "e.md".to_string()]);
    }

    #[test]
    fn test_titles_angles_and_images() {
        let doc = Document::parse(
            "files/a.md",
            "[t](b.md \"Title\") [u](<with space.md>) ![img](img/x.png)\n",
        );
        let links = extract_links(&doc);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].target.as_deref(), Some("files/b.md"));
        assert_eq!(links[1].target.as_deref(), Some("files/with space.md"));
        assert!(links[2].image);
        assert!(!links[2].is_document_link());
    }

    #[test]
    fn test_references_only_for_markdown_targets() {
        let doc = Document::parse(
            "files/a.md",
            "[b](b.md#sec) [c](c.png) [d](https://d.md) [self](#x)\n",
        );
        let refs = extract_references(&doc);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].source, "files/a.md");
        assert_eq!(refs[0].target, "files/b.md");
        assert_eq!(refs[0].anchor.as_deref(), Some("sec"));
    }

    #[test]
    fn test_percent_encoded_targets_are_decoded() {
        let c = classify("files/a.md", "my%20file.md#Part%201");
        assert_eq!(c.kind, LinkKind::Internal);
        assert_eq!(c.target.as_deref(), Some("files/my file.md"));
        assert_eq!(c.anchor.as_deref(), Some("Part%201"));

        let doc = Document::parse("a.md", "[x](my%20file.md) [y](caf%C3%A9.md) [z](100%.md)\n");
        let targets: Vec<String> = extract_references(&doc).into_iter().map(|r| r.target).collect();
        assert_eq!(targets, vec!["my file.md", "café.md", "100%.md"]);
    }

    #[test]
    fn test_no_links_no_references() {
        let doc = Document::parse("plain.md", "# Plain\nNothing here.\n");
        assert!(extract_references(&doc).is_empty());
    }
}
