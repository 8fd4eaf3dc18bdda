//! Line grammar for the configuration format.
//!
//! This module classifies one comment-stripped, trimmed physical line into
//! an event: empty, continuation fragment, assignment, or section header.
//! It knows nothing about the tree or the current section; the parsing
//! context decides what each event means.
//!
//! Patterns are compiled once per [`Grammar`] and reused for every line,
//! the same way stub patterns are compiled once per validation run.

use crate::config::AssignmentMode;
use crate::error::{MconfError, Result};
use regex::Regex;

/// A classified physical line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LineEvent {
    /// Blank after comment stripping; terminates any open continuation.
    Empty,
    /// A value fragment extending an open assignment.
    Continuation { fragment: String, continues: bool },
    /// `path OP value`, possibly continuing onto the next line.
    Assignment {
        path: String,
        mode: AssignmentMode,
        value: String,
        continues: bool,
    },
    /// `[path]`; an empty path denotes the default/root section.
    Section { path: String },
}

/// Compiled line patterns.
#[derive(Debug)]
pub(crate) struct Grammar {
    /// `$1`: path, `$2`: assignment operator, `$3`: value.
    assignment: Regex,
    /// `$1`: section path, surrounding whitespace excluded.
    section: Regex,
    /// Path grammar: dot-separated `*` or `[\w-]+` segments.
    path: Regex,
    /// `$1`: value body, `$2`: continuation backslash.
    value: Regex,
}

impl Grammar {
    pub(crate) fn new() -> Self {
        Self {
            assignment: Regex::new(r"^([^?!=+^\s]*)\s*(=|!=|\?=|\+=|\^=)\s*(.*)$")
                .expect("hard-coded assignment pattern"),
            section: Regex::new(r"^\[\s*(.*?)\s*\]$").expect("hard-coded section pattern"),
            path: Regex::new(r"^(?:\*|[\w-]+)(?:\.(?:[\w-]+|\*))*$")
                .expect("hard-coded path pattern"),
            value: Regex::new(r#"^((?:[^\\]|\\\\|\\\s|\\'|\\n|\\")*)(\\?)$"#)
                .expect("hard-coded value pattern"),
        }
    }

    /// Classify one line. `pending` selects the continuation branch: while
    /// an assignment is open, any non-empty line is a value fragment.
    ///
    /// Match order per the format: empty, continuation, assignment, section;
    /// anything else is a malformed line.
    pub(crate) fn classify(&self, line: &str, pending: bool) -> Result<LineEvent> {
        if line.is_empty() {
            return Ok(LineEvent::Empty);
        }

        if pending {
            let (fragment, continues) = self.match_value(line)?;
            return Ok(LineEvent::Continuation { fragment, continues });
        }

        if let Some(caps) = self.assignment.captures(line) {
            let path = &caps[1];
            let op = &caps[2];
            let mode = AssignmentMode::from_str(op)
                .ok_or_else(|| MconfError::UnknownOperator(op.to_string()))?;
            if !self.path.is_match(path) {
                return Err(MconfError::InvalidKey(path.to_string()));
            }
            let (value, continues) = self.match_value(&caps[3])?;
            return Ok(LineEvent::Assignment {
                path: path.to_string(),
                mode,
                value,
                continues,
            });
        }

        if let Some(caps) = self.section.captures(line) {
            let path = &caps[1];
            if !path.is_empty() && !self.path.is_match(path) {
                return Err(MconfError::InvalidSectionName(path.to_string()));
            }
            return Ok(LineEvent::Section {
                path: path.to_string(),
            });
        }

        Err(MconfError::MalformedLine)
    }

    /// Validate raw value text, splitting off the trailing continuation
    /// backslash. The body is trimmed; escapes stay intact for the
    /// explosion step.
    fn match_value(&self, raw: &str) -> Result<(String, bool)> {
        let caps = self.value.captures(raw).ok_or(MconfError::MalformedValue)?;
        Ok((caps[1].trim().to_string(), !caps[2].is_empty()))
    }
}

/// Cut the line at the first `#` not preceded by a backslash.
///
/// Done with a byte scan rather than the line pattern: the regex crate has
/// no lookbehind, and both `#` and `\` are single bytes in UTF-8.
pub(crate) fn strip_comment(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && (i == 0 || bytes[i - 1] != b'\\') {
            return &raw[..i];
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> Result<LineEvent> {
        Grammar::new().classify(line, false)
    }

    #[test]
    fn strip_comment_cuts_at_unescaped_hash() {
        assert_eq!(strip_comment("key = value # comment"), "key = value ");
        assert_eq!(strip_comment("# whole line"), "");
        assert_eq!(strip_comment("no comment"), "no comment");
        // An escaped hash is part of the line.
        assert_eq!(strip_comment(r"key = a\#b # real"), r"key = a\#b ");
    }

    #[test]
    fn empty_line_classifies_as_empty() {
        assert_eq!(classify("").unwrap(), LineEvent::Empty);
    }

    #[test]
    fn assignment_extracts_path_mode_and_value() {
        let event = classify("key = value").unwrap();
        assert_eq!(
            event,
            LineEvent::Assignment {
                path: "key".to_string(),
                mode: AssignmentMode::Set,
                value: "value".to_string(),
                continues: false,
            }
        );
    }

    #[test]
    fn assignment_recognizes_all_operators() {
        for (line, mode) in [
            ("k = v", AssignmentMode::Set),
            ("k != v", AssignmentMode::Replace),
            ("k ?= v", AssignmentMode::Fallback),
            ("k += v", AssignmentMode::Append),
            ("k ^= v", AssignmentMode::Union),
        ] {
            match classify(line).unwrap() {
                LineEvent::Assignment { mode: m, .. } => assert_eq!(m, mode, "line: {line}"),
                other => panic!("expected assignment for {line:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn assignment_trailing_backslash_marks_continuation() {
        let event = classify(r"key = a b \").unwrap();
        assert_eq!(
            event,
            LineEvent::Assignment {
                path: "key".to_string(),
                mode: AssignmentMode::Set,
                value: "a b".to_string(),
                continues: true,
            }
        );

        // An escaped backslash pair is value text, not a continuation.
        let event = classify(r"key = a\\").unwrap();
        assert_eq!(
            event,
            LineEvent::Assignment {
                path: "key".to_string(),
                mode: AssignmentMode::Set,
                value: r"a\\".to_string(),
                continues: false,
            }
        );
    }

    #[test]
    fn assignment_with_invalid_path_is_rejected() {
        for line in [".a.b.c = value", "a..b = value", "a. = value", "= value"] {
            let err = classify(line).unwrap_err();
            assert!(
                matches!(err, MconfError::InvalidKey(_)),
                "line {line:?} gave {err}"
            );
        }
        assert_eq!(
            classify(".a.b.c = value").unwrap_err().to_string(),
            "Invalid key: '.a.b.c'"
        );
    }

    #[test]
    fn assignment_with_bad_escape_is_malformed_value() {
        let err = classify(r"key = a\xb").unwrap_err();
        assert_eq!(err.to_string(), "Malformed value");
    }

    #[test]
    fn continuation_splits_fragment_and_marker() {
        let grammar = Grammar::new();
        assert_eq!(
            grammar.classify(r"c d \", true).unwrap(),
            LineEvent::Continuation {
                fragment: "c d".to_string(),
                continues: true,
            }
        );
        assert_eq!(
            grammar.classify("e", true).unwrap(),
            LineEvent::Continuation {
                fragment: "e".to_string(),
                continues: false,
            }
        );
        // While pending, even a header-looking line is value text.
        assert_eq!(
            grammar.classify("[section]", true).unwrap(),
            LineEvent::Continuation {
                fragment: "[section]".to_string(),
                continues: false,
            }
        );
    }

    #[test]
    fn section_header_extracts_path() {
        assert_eq!(
            classify("[section]").unwrap(),
            LineEvent::Section {
                path: "section".to_string()
            }
        );
        assert_eq!(
            classify("[ a.b ]").unwrap(),
            LineEvent::Section {
                path: "a.b".to_string()
            }
        );
        assert_eq!(
            classify("[]").unwrap(),
            LineEvent::Section {
                path: String::new()
            }
        );
    }

    #[test]
    fn section_header_allows_wildcard_segments() {
        for name in ["*", "*.*", "*.a.*.c"] {
            assert_eq!(
                classify(&format!("[{name}]")).unwrap(),
                LineEvent::Section {
                    path: name.to_string()
                }
            );
        }
    }

    #[test]
    fn section_header_with_invalid_name_is_rejected() {
        for name in ["*.", ".abc", "abc.", "a..b"] {
            let err = classify(&format!("[{name}]")).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid section name: '{name}'"));
        }
    }

    #[test]
    fn unmatched_line_is_malformed() {
        for line in ["just text", "[unclosed", "key"] {
            let err = classify(line).unwrap_err();
            assert!(
                matches!(err, MconfError::MalformedLine),
                "line {line:?} gave {err}"
            );
        }
    }
}
