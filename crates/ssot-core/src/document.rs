//! Documents and their sections.
//!
//! A [`Document`] is an immutable snapshot of one markdown file, identified
//! by its repository-relative path. Parsing splits the body into ordered
//! [`Section`]s at ATX headings; fenced code is never split.

use crate::category::Category;
use crate::frontmatter::{extract_frontmatter, tags_of};
use crate::markdown::{parse_heading, FenceState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A contiguous part of a document introduced by a heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text without the leading `#` markers.
    pub heading: String,

    /// Heading level 1-6, or 0 for text that precedes any heading.
    pub level: u8,

    /// Text between this heading and the next, trimmed.
    pub body: String,

    /// First line of the section (1-based, counted over the whole file).
    pub start_line: usize,

    /// Last line of the section (inclusive).
    pub end_line: usize,
}

impl Section {
    /// Returns true if the 1-based line falls within this section.
    pub fn contains_line(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }

    /// Heading rendered as markdown, e.g. `## Best Practices`.
    pub fn marker(&self) -> String {
        if self.level == 0 {
            self.heading.clone()
        } else {
            format!("{} {}", "#".repeat(self.level as usize), self.heading)
        }
    }
}

/// One markdown file of the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Repository-relative path with `/` separators. This is the identity.
    pub path: String,

    /// Category derived from the first path segment, if any.
    pub category: Option<Category>,

    /// Text of the first heading, or the file stem.
    pub title: String,

    /// Raw file contents.
    pub body: String,

    /// Sections in document order; never empty.
    pub sections: Vec<Section>,

    /// Parsed YAML front matter.
    pub front_matter: BTreeMap<String, Value>,

    /// Last line occupied by front matter (0 when there is none).
    pub front_matter_end: usize,

    /// SHA-256 of the raw contents, hex encoded.
    pub content_hash: String,
}

impl Document {
    /// Parses a document from its path and raw text.
    pub fn parse(path: impl Into<String>, body: impl Into<String>) -> Self {
        let path = path.into().replace('\\', "/");
        let body = body.into();

        let (front_matter, front_matter_end) = extract_frontmatter(&body).unwrap_or_default();
        let stem = file_stem(&path).to_string();
        let sections = split_sections(&body, front_matter_end, &stem);
        let title = sections
            .iter()
            .find(|s| s.level > 0)
            .map(|s| s.heading.clone())
            .unwrap_or(stem);
        let sections = sections
            .into_iter()
            .map(|mut s| {
                if s.level == 0 {
                    s.heading = title.clone();
                }
                s
            })
            .collect();

        let content_hash = hex::encode(Sha256::digest(body.as_bytes()));

        Self {
            category: Category::of_path(&path),
            path,
            title,
            body,
            sections,
            front_matter,
            front_matter_end,
            content_hash,
        }
    }

    /// The file name component of the path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// The directory containing the document ("" at the repository root).
    pub fn directory(&self) -> &str {
        self.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    /// Index of the section containing a 1-based line.
    pub fn section_at_line(&self, line: usize) -> Option<usize> {
        self.sections.iter().position(|s| s.contains_line(line))
    }

    /// Tags declared in front matter.
    pub fn tags(&self) -> Vec<String> {
        tags_of(&self.front_matter)
    }

    /// Lines of the body after front matter, paired with their 1-based line numbers.
    pub fn content_lines(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.body
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line))
            .skip(self.front_matter_end)
    }
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

struct PendingSection {
    heading: String,
    level: u8,
    start_line: usize,
    lines: Vec<String>,
}

impl PendingSection {
    fn finish(self, end_line: usize) -> Section {
        Section {
            heading: self.heading,
            level: self.level,
            body: self.lines.join("\n").trim().to_string(),
            start_line: self.start_line,
            end_line: end_line.max(self.start_line),
        }
    }
}

/// Splits a body into sections. Level-0 sections get a placeholder heading
/// that the caller replaces with the title.
fn split_sections(body: &str, front_matter_end: usize, placeholder: &str) -> Vec<Section> {
    let first_line = front_matter_end + 1;
    let mut sections = Vec::new();
    let mut fence = FenceState::default();
    let mut saw_heading = false;
    let mut current = PendingSection {
        heading: placeholder.to_string(),
        level: 0,
        start_line: first_line,
        lines: Vec::new(),
    };
    let mut last_line = front_matter_end;

    for (idx, line) in body.lines().enumerate().skip(front_matter_end) {
        let line_no = idx + 1;
        last_line = line_no;

        if !fence.consume(line) {
            if let Some((level, text)) = parse_heading(line) {
                let next = PendingSection {
                    heading: text.to_string(),
                    level,
                    start_line: line_no,
                    lines: Vec::new(),
                };
                let previous = std::mem::replace(&mut current, next);
                let is_preamble = !saw_heading;
                saw_heading = true;
                // Preamble survives only if it carries text.
                if !is_preamble || previous.lines.iter().any(|l| !l.trim().is_empty()) {
                    sections.push(previous.finish(line_no - 1));
                }
                continue;
            }
        }
        current.lines.push(line.to_string());
    }

    sections.push(current.finish(last_line));
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sections_split_on_headings() {
        let doc = Document::parse(
            "files/AGENTS.md",
            "# AGENTS\n\nIntro text.\n\n## Best Practices\n\nKeep it short.\n\n### Details\nMore.\n",
        );

        assert_eq!(doc.title, "AGENTS");
        assert_eq!(doc.category, Some(Category::Files));
        let headings: Vec<(&str, u8)> = doc
            .sections
            .iter()
            .map(|s| (s.heading.as_str(), s.level))
            .collect();
        assert_eq!(
            headings,
            vec![("AGENTS", 1), ("Best Practices", 2), ("Details", 3)]
        );
        assert_eq!(doc.sections[1].body, "Keep it short.");
        assert_eq!(doc.sections[1].start_line, 5);
        assert_eq!(doc.sections[1].end_line, 8);
        assert_eq!(doc.sections[1].marker(), "## Best Practices");
    }

    #[test]
    fn test_no_headings_gives_single_level_zero_section() {
        let doc = Document::parse("notes/plain.md", "just text\nmore text\n");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].level, 0);
        assert_eq!(doc.sections[0].heading, "plain");
        assert_eq!(doc.title, "plain");
        assert_eq!(doc.category, None);
    }

    #[test]
    fn test_empty_document_has_one_section() {
        let doc = Document::parse("empty.md", "");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].heading, "empty");
        assert_eq!(doc.sections[0].body, "");
    }

    #[test]
    fn test_preamble_kept_only_when_non_blank() {
        let doc = Document::parse("a.md", "\n\n# Title\nbody\n");
        assert_eq!(doc.sections.len(), 1);

        let doc = Document::parse("a.md", "lead-in\n# Title\nbody\n");
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].level, 0);
        assert_eq!(doc.sections[0].heading, "Title");
        assert_eq!(doc.sections[0].body, "lead-in");
    }

    #[test]
    fn test_fenced_headings_are_not_sections() {
        let doc = Document::parse("a.md", "# Real\n```\n# fake\n```\n## Also real\n");
        assert_eq!(doc.sections.len(), 2);
        assert!(doc.sections[0].body.contains("# fake"));
    }

    #[test]
    fn test_front_matter_excluded() {
        let doc = Document::parse("a.md", "---\ntags: [x]\n---\n# Heading\ntext\n");
        assert_eq!(doc.front_matter_end, 3);
        assert_eq!(doc.tags(), vec!["x".to_string()]);
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].start_line, 4);
        assert_eq!(doc.section_at_line(5), Some(0));
        assert_eq!(doc.section_at_line(2), None);
    }

    #[test]
    fn test_paths_and_hash_are_stable() {
        let a = Document::parse("tools\\git\\guide.md", "x");
        let b = Document::parse("tools/git/guide.md", "x");
        assert_eq!(a.path, "tools/git/guide.md");
        assert_eq!(a.directory(), "tools/git");
        assert_eq!(a.file_name(), "guide.md");
        assert_eq!(a.content_hash, b.content_hash);
    }
}
