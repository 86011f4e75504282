//! Snapshot comparison: line-oriented diff of two payloads.
//!
//! Two rendering styles, selected by configuration:
//! - UNIFIED: classic unified-diff text (`.diff` attachment),
//! - HTML: self-contained markup for direct viewing (`.html` attachment).
//!
//! Output is deterministic: the same input pair always renders to the same
//! bytes. Equal payloads render to an empty string in both styles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::snapshot::Snapshot;

/// Rendering style of the snapshot difference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiffStyle {
    Unified,
    Html,
}

impl FromStr for DiffStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNIFIED" => Ok(DiffStyle::Unified),
            "HTML" => Ok(DiffStyle::Html),
            other => Err(format!(
                "unsupported diff style '{other}': use UNIFIED or HTML"
            )),
        }
    }
}

impl fmt::Display for DiffStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffStyle::Unified => f.write_str("UNIFIED"),
            DiffStyle::Html => f.write_str("HTML"),
        }
    }
}

/// Context lines around each hunk (both styles).
const CONTEXT_LINES: usize = 3;

/// Renders the difference between two snapshots in a fixed style.
#[derive(Clone, Copy, Debug)]
pub struct SnapshotComparator {
    style: DiffStyle,
}

impl SnapshotComparator {
    pub fn new(style: DiffStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> DiffStyle {
        self.style
    }

    /// File extension matching the configured style.
    pub fn file_type(&self) -> &'static str {
        match self.style {
            DiffStyle::Unified => ".diff",
            DiffStyle::Html => ".html",
        }
    }

    /// Difference between two payloads. Empty string when they are equal.
    pub fn diff(&self, previous: &Snapshot, current: &Snapshot) -> String {
        if previous.payload() == current.payload() {
            return String::new();
        }
        let text = TextDiff::from_lines(previous.payload(), current.payload());
        match self.style {
            DiffStyle::Unified => text
                .unified_diff()
                .context_radius(CONTEXT_LINES)
                .header("previous", "current")
                .to_string(),
            DiffStyle::Html => render_html(&text),
        }
    }
}

fn render_html(diff: &TextDiff<'_, '_, '_, str>) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");
    out.push_str("body { font-family: monospace; }\n");
    out.push_str("ol { list-style: none; padding: 0; }\n");
    out.push_str("li.del { background: #fdd; }\n");
    out.push_str("li.ins { background: #dfd; }\n");
    out.push_str("li.sep { color: #888; }\n");
    out.push_str("</style>\n</head>\n<body>\n<ol>\n");

    for (i, group) in diff.grouped_ops(CONTEXT_LINES).iter().enumerate() {
        if i > 0 {
            out.push_str("<li class=\"sep\">&hellip;</li>\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let (class, sign) = match change.tag() {
                    ChangeTag::Delete => ("del", '-'),
                    ChangeTag::Insert => ("ins", '+'),
                    ChangeTag::Equal => ("ctx", ' '),
                };
                let line = change.value().trim_end_matches('\n');
                out.push_str(&format!(
                    "<li class=\"{class}\">{sign}{}</li>\n",
                    escape_html(line)
                ));
            }
        }
    }

    out.push_str("</ol>\n</body>\n</html>\n");
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_parsing_is_case_insensitive_and_strict() {
        assert_eq!("unified".parse::<DiffStyle>().unwrap(), DiffStyle::Unified);
        assert_eq!("Html".parse::<DiffStyle>().unwrap(), DiffStyle::Html);
        assert!("side-by-side".parse::<DiffStyle>().is_err());
        assert!("".parse::<DiffStyle>().is_err());
    }

    #[test]
    fn html_escaping() {
        assert_eq!(escape_html("<a b=\"c\">&"), "&lt;a b=&quot;c&quot;&gt;&amp;");
    }
}
