//! YAML front matter.

use serde_json::Value;
use std::collections::BTreeMap;

/// Parsed front matter fields plus the 1-based line of the closing delimiter.
pub type FrontMatter = (BTreeMap<String, Value>, usize);

/// Extracts a leading `---` delimited YAML block.
///
/// Returns `None` when the document does not open with a complete block.
/// A block that is present but not a YAML mapping yields empty fields so the
/// delimiter lines are still excluded from the body.
pub fn extract_frontmatter(input: &str) -> Option<FrontMatter> {
    let mut lines = input.lines();

    let first = lines.next()?.trim_start_matches('\u{feff}').trim_end();
    if first != "---" {
        return None;
    }

    let mut yaml_lines: Vec<&str> = Vec::new();
    let mut end_line = 1usize;
    let mut closed = false;

    for line in lines {
        end_line += 1;
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            closed = true;
            break;
        }
        yaml_lines.push(line);
    }

    if !closed {
        return None;
    }

    let fields = parse_yaml_map(&yaml_lines.join("\n")).unwrap_or_default();
    Some((fields, end_line))
}

fn parse_yaml_map(yaml: &str) -> Option<BTreeMap<String, Value>> {
    let yaml_value: serde_yaml::Value = serde_yaml::from_str(yaml).ok()?;
    match serde_json::to_value(yaml_value).ok()? {
        Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    }
}

/// Reads the `tags` field as a list of strings.
///
/// Accepts a YAML list or a single scalar; blank entries are dropped.
pub fn tags_of(fields: &BTreeMap<String, Value>) -> Vec<String> {
    let scalar = |v: &Value| match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    match fields.get("tags") {
        Some(Value::Array(items)) => items.iter().filter_map(scalar).filter(|s| !s.is_empty()).collect(),
        Some(other) => scalar(other).into_iter().filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_frontmatter() {
        let input = "---\ntitle: Agents\ntags: [ai, workflow]\n---\n# Agents\n";
        let (fields, end) = extract_frontmatter(input).unwrap();
        assert_eq!(end, 4);
        assert_eq!(fields["title"], Value::String("Agents".into()));
        assert_eq!(tags_of(&fields), vec!["ai".to_string(), "workflow".to_string()]);
    }

    #[test]
    fn test_block_list_and_scalar_tags() {
        let input = "---\ntags:\n  - one\n  - two\n---\n";
        let (fields, _) = extract_frontmatter(input).unwrap();
        assert_eq!(tags_of(&fields).len(), 2);

        let input = "---\ntags: solo\n---\n";
        let (fields, _) = extract_frontmatter(input).unwrap();
        assert_eq!(tags_of(&fields), vec!["solo".to_string()]);
    }

    #[test]
    fn test_no_frontmatter() {
        assert!(extract_frontmatter("# Title\n---\n").is_none());
        assert!(extract_frontmatter("---\nnever closed\n").is_none());
    }

    #[test]
    fn test_non_mapping_block_is_still_skipped() {
        let (fields, end) = extract_frontmatter("---\n- a\n- b\n---\nbody").unwrap();
        assert!(fields.is_empty());
        assert_eq!(end, 4);
    }
}
