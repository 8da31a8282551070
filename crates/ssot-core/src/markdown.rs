//! Line-level markdown primitives shared by section splitting and link extraction.

/// Tracks whether the scanner is inside a fenced code block.
#[derive(Debug, Default)]
pub(crate) struct FenceState {
    open: Option<(char, usize)>,
}

impl FenceState {
    /// Feeds one line; returns true if the line is a fence delimiter or fenced content.
    pub(crate) fn consume(&mut self, line: &str) -> bool {
        let fence = fence_marker(line);
        match (self.open, fence) {
            (None, Some((ch, len, _))) => {
                self.open = Some((ch, len));
                true
            }
            (Some((open_ch, open_len)), Some((ch, len, rest)))
                if ch == open_ch && len >= open_len && rest.trim().is_empty() =>
            {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            (None, None) => false,
        }
    }
}

/// Returns (marker char, run length, remainder) for a fence line.
fn fence_marker(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = strip_indent(line)?;
    let ch = trimmed.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    if len < 3 {
        return None;
    }
    Some((ch, len, &trimmed[len..]))
}

/// Strips up to three spaces of indentation; four or more means an indented code block.
fn strip_indent(line: &str) -> Option<&str> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    Some(&line[indent..])
}

/// Parses an ATX heading (`#` .. `######`), returning its level and text.
pub(crate) fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let trimmed = strip_indent(line)?;
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }

    let mut text = rest.trim();
    // Optional closing sequence: "## Title ##"
    let without_closing = text.trim_end_matches('#');
    if without_closing.is_empty() || without_closing.ends_with([' ', '\t']) {
        text = without_closing.trim_end();
    }
    Some((level as u8, text))
}

/// Byte ranges of inline code spans on a single line.
pub(crate) fn code_spans(line: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let start = i;
        let run = bytes[i..].iter().take_while(|b| **b == b'`').count();
        i += run;
        // Find a closing run of the same length.
        let mut j = i;
        let mut closed = None;
        while j < bytes.len() {
            if bytes[j] == b'`' {
                let close = bytes[j..].iter().take_while(|b| **b == b'`').count();
                if close == run {
                    closed = Some(j + close);
                    break;
                }
                j += close;
            } else {
                j += 1;
            }
        }
        if let Some(end) = closed {
            spans.push((start, end));
            i = end;
        }
    }
    spans
}
