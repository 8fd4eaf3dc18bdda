//! Per-source parsing context.
//!
//! A [`Context`] is the state machine between the line grammar and the
//! tree: it tracks the current section, the 1-based line number, and an
//! optional pending assignment accumulating across continuation lines.
//! It is rebuilt for every source; the tree it writes into is shared.
//!
//! The machine has two states. Idle: no pending assignment; section
//! headers and new assignments are legal. Pending: an assignment with an
//! open continuation; only value fragments and a forced commit (blank
//! line, end of input) are legal. Driving a method from the wrong state
//! yields [`MconfError::InvalidState`].

use crate::config::{AssignmentMode, Config, Value, shape_value};
use crate::error::{MconfError, Result};
use crate::parser::ParseOptions;

/// An assignment whose value may still be accumulating.
#[derive(Debug)]
struct Pending {
    path: String,
    value: String,
    mode: AssignmentMode,
    continuing: bool,
}

/// Ephemeral per-source parsing state, writing into a shared [`Config`].
#[derive(Debug)]
pub struct Context<'a> {
    cfg: &'a mut Config,
    options: ParseOptions,
    source_id: String,
    line: u32,
    /// Current section path; `Some("")` is the root, `None` means no
    /// section has been entered yet (only possible before the first
    /// header or assignment).
    section: Option<String>,
    /// Whether the root section was entered in this source, explicitly
    /// (`[]`) or by an assignment before any header. Used for duplicate
    /// detection, since the root is the tree itself and leaves no entry.
    root_entered: bool,
    pending: Option<Pending>,
}

impl<'a> Context<'a> {
    /// Create an Idle context for one named source.
    pub fn new(source_id: impl Into<String>, cfg: &'a mut Config, options: ParseOptions) -> Self {
        Self {
            cfg,
            options,
            source_id: source_id.into(),
            line: 0,
            section: None,
            root_entered: false,
            pending: None,
        }
    }

    /// The tree this context writes into.
    pub fn config(&self) -> &Config {
        self.cfg
    }

    /// Source identifier used in error locations.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// 1-based number of the line currently being processed; 0 before the
    /// first [`Context::advance_line`].
    pub fn line_number(&self) -> u32 {
        self.line
    }

    /// Current section path, if one has been entered.
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    /// Whether a pending assignment is waiting for continuation lines.
    pub fn continuing(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| p.continuing)
    }

    /// Count the next physical line; returns the new line number.
    pub fn advance_line(&mut self) -> u32 {
        self.line += 1;
        self.line
    }

    fn located(&self, err: MconfError) -> MconfError {
        err.at(&self.source_id, self.line)
    }

    /// Switch the current section. Legal only while Idle.
    ///
    /// An empty path enters the default/root section, gated by
    /// `enable_default_section`. Re-declaring an existing section is only
    /// legal with `allow_section_split`; a path already holding a value
    /// can never become a section. Missing sections (and intermediates)
    /// are created immediately, so `[section]` exists even when empty.
    pub fn enter_section(&mut self, path: &str) -> Result<()> {
        if self.pending.is_some() {
            return Err(MconfError::InvalidState);
        }

        if path.is_empty() {
            if !self.options.enable_default_section {
                return Err(self.located(MconfError::DefaultSectionNotAllowed));
            }
            if self.root_entered && !self.options.allow_section_split {
                return Err(self.located(MconfError::DuplicateSection(String::new())));
            }
            self.root_entered = true;
            self.section = Some(String::new());
            return Ok(());
        }

        match self.cfg.get(path) {
            Some(Value::Section(_)) => {
                if !self.options.allow_section_split {
                    return Err(self.located(MconfError::DuplicateSection(path.to_string())));
                }
            }
            Some(_) => {
                return Err(self.located(MconfError::PathAlreadyAssigned(path.to_string())));
            }
            None => {
                self.cfg
                    .ensure_section(path)
                    .map_err(|e| e.at(&self.source_id, self.line))?;
            }
        }
        self.section = Some(path.to_string());
        Ok(())
    }

    /// Open an assignment. Legal only while Idle.
    ///
    /// An assignment before any section header enters the root section,
    /// gated by `enable_default_section`. When `continues` is false the
    /// assignment commits immediately; otherwise it stays pending until a
    /// non-continuing fragment, a blank line, or end of input.
    pub fn assign(
        &mut self,
        path: &str,
        value: &str,
        mode: AssignmentMode,
        continues: bool,
    ) -> Result<()> {
        if self.pending.is_some() {
            return Err(MconfError::InvalidState);
        }

        if self.section.is_none() {
            if !self.options.enable_default_section {
                return Err(self.located(MconfError::ExpectedSection));
            }
            self.root_entered = true;
            self.section = Some(String::new());
        }

        self.pending = Some(Pending {
            path: path.to_string(),
            value: value.to_string(),
            mode,
            continuing: continues,
        });
        if !continues {
            self.apply()?;
        }
        Ok(())
    }

    /// Extend the pending value with one fragment. Legal only while
    /// Pending with an open continuation.
    ///
    /// Fragments join with a single space; an empty fragment adds nothing,
    /// so blank continuation lines do not inject separators.
    pub fn continue_value(&mut self, fragment: &str, continues: bool) -> Result<()> {
        match &mut self.pending {
            Some(pending) if pending.continuing => {
                let fragment = fragment.trim();
                if !fragment.is_empty() {
                    pending.value.push(' ');
                    pending.value.push_str(fragment);
                }
                pending.continuing = continues;
            }
            _ => return Err(MconfError::InvalidState),
        }
        if !continues {
            self.apply()?;
        }
        Ok(())
    }

    /// Commit the pending assignment into the tree and return to Idle.
    ///
    /// The write target is the pending path qualified by the current
    /// section; dotted segments of the pending path become sections
    /// relative to it. The accumulated value is shaped per the explosion
    /// policy and checked against `allow_empty_values` before the tree is
    /// touched. Errors carry the source and line location.
    pub fn apply(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Err(MconfError::InvalidState);
        };

        let section = self.section.as_deref().unwrap_or("");
        let path = if section.is_empty() {
            pending.path
        } else {
            format!("{section}.{}", pending.path)
        };

        let value = shape_value(&pending.value, self.options.explode)
            .map_err(|e| e.at(&self.source_id, self.line))?;

        if !self.options.allow_empty_values {
            match &value {
                Value::Scalar(s) if s.is_empty() => {
                    return Err(self.located(MconfError::EmptyValue));
                }
                Value::List(items) if items.is_empty() => {
                    return Err(self.located(MconfError::EmptyValue));
                }
                Value::List(items) => {
                    if let Some(index) = items.iter().position(String::is_empty) {
                        return Err(self.located(MconfError::EmptyElement(index)));
                    }
                }
                _ => {}
            }
        }

        self.cfg
            .assign(&path, value, pending.mode)
            .map_err(|e| e.at(&self.source_id, self.line))?;
        Ok(())
    }

    /// Force-commit any pending assignment; Idle is a no-op.
    ///
    /// Called on blank lines and at end of input: both terminate an open
    /// continuation unconditionally.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_some() {
            self.apply()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;
    use serde_json::json;

    fn permissive() -> ParseOptions {
        ParseOptions {
            enable_default_section: true,
            ..ParseOptions::default()
        }
    }

    fn as_json(cfg: &Config) -> serde_json::Value {
        serde_json::to_value(cfg).unwrap()
    }

    #[test]
    fn test_assign_commits_immediately() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());

        ctx.assign("key", "value", AssignmentMode::Set, false).unwrap();
        let err = ctx
            .assign("key", "value", AssignmentMode::Set, false)
            .unwrap_err();
        assert_eq!(err.to_string(), "ctx:0: Path 'key' is already assigned");

        assert_eq!(as_json(&cfg), json!({"key": "value"}));
    }

    #[test]
    fn test_section_assignment() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());

        ctx.enter_section("section1").unwrap();
        ctx.assign("key1", "value1", AssignmentMode::Set, false).unwrap();
        ctx.assign("key2", "value2", AssignmentMode::Set, false).unwrap();

        ctx.enter_section("section2").unwrap();
        ctx.assign("sub.key3", "value3", AssignmentMode::Set, false).unwrap();
        ctx.assign("sub.key4", "value4", AssignmentMode::Set, false).unwrap();
        ctx.assign("keyx", "valuex", AssignmentMode::Set, false).unwrap();

        ctx.enter_section("").unwrap();
        ctx.assign("another", "value", AssignmentMode::Set, false).unwrap();

        assert_eq!(
            as_json(&cfg),
            json!({
                "another": "value",
                "section1": {"key1": "value1", "key2": "value2"},
                "section2": {
                    "sub": {"key3": "value3", "key4": "value4"},
                    "keyx": "valuex"
                }
            })
        );
    }

    #[test]
    fn test_continuation_joins_with_single_space() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());

        ctx.assign("key", "value1", AssignmentMode::Set, true).unwrap();
        ctx.continue_value("value2", true).unwrap();
        ctx.continue_value("value3", false).unwrap();

        assert_eq!(as_json(&cfg), json!({"key": ["value1", "value2", "value3"]}));
    }

    #[test]
    fn test_empty_fragment_adds_no_separator() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());

        ctx.assign("key", "a", AssignmentMode::Set, true).unwrap();
        ctx.continue_value("", true).unwrap();
        ctx.continue_value("b", false).unwrap();

        assert_eq!(as_json(&cfg), json!({"key": ["a", "b"]}));
    }

    #[test]
    fn test_value_explosion_honors_quotes() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());
        ctx.assign("key", "value1 'value with spaces'", AssignmentMode::Set, false)
            .unwrap();
        assert_eq!(as_json(&cfg), json!({"key": ["value1", "value with spaces"]}));
    }

    #[test]
    fn test_value_escaping_collapses_to_scalar() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());
        ctx.assign("key", "value\\ with\\ spaces", AssignmentMode::Set, false)
            .unwrap();
        assert_eq!(as_json(&cfg), json!({"key": "value with spaces"}));
    }

    #[test]
    fn test_empty_value_requires_option() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());
        let err = ctx
            .assign("key", "", AssignmentMode::Set, false)
            .unwrap_err();
        assert_eq!(err.to_string(), "ctx:0: Empty value");

        let options = ParseOptions {
            allow_empty_values: true,
            ..permissive()
        };
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, options);
        ctx.assign("key", "", AssignmentMode::Set, false).unwrap();
        assert_eq!(as_json(&cfg), json!({"key": ""}));
    }

    #[test]
    fn test_apply_commits_pending_assignment() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());

        ctx.assign("a.b.c", "d", AssignmentMode::Set, true).unwrap();
        assert!(ctx.config().is_empty());

        ctx.apply().unwrap();
        assert_eq!(as_json(&cfg), json!({"a": {"b": {"c": "d"}}}));
    }

    #[test]
    fn test_apply_without_pending_is_invalid_state() {
        let mut cfg = Config::new();
        let err = Context::new("ctx", &mut cfg, permissive()).apply().unwrap_err();
        assert_eq!(err.to_string(), "Invalid state");
    }

    #[test]
    fn test_continue_without_pending_is_invalid_state() {
        let mut cfg = Config::new();
        let err = Context::new("ctx", &mut cfg, permissive())
            .continue_value("value", false)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid state");
    }

    #[test]
    fn test_assign_while_pending_is_invalid_state() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());
        ctx.assign("key", "v", AssignmentMode::Set, true).unwrap();
        let err = ctx
            .assign("other", "v", AssignmentMode::Set, false)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid state");
    }

    #[test]
    fn test_reentering_a_section_merges() {
        let mut cfg = Config::new();
        let options = ParseOptions {
            allow_section_split: true,
            ..permissive()
        };
        let mut ctx = Context::new("ctx", &mut cfg, options);

        ctx.enter_section("section1").unwrap();
        ctx.assign("key1", "value1", AssignmentMode::Set, false).unwrap();
        ctx.enter_section("section2").unwrap();
        ctx.assign("key2", "value2", AssignmentMode::Set, false).unwrap();
        ctx.enter_section("section1").unwrap();
        ctx.assign("key3", "value3", AssignmentMode::Set, false).unwrap();

        assert_eq!(
            as_json(&cfg),
            json!({
                "section1": {"key1": "value1", "key3": "value3"},
                "section2": {"key2": "value2"}
            })
        );
    }

    #[test]
    fn test_duplicate_section_without_split_option() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());

        ctx.enter_section("section1").unwrap();
        ctx.advance_line();
        let err = ctx.enter_section("section1").unwrap_err();
        assert_eq!(err.to_string(), "ctx:1: Duplicate section: 'section1'");
    }

    #[test]
    fn test_flush_commits_open_continuation() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());

        ctx.assign("key", "a", AssignmentMode::Set, true).unwrap();
        ctx.flush().unwrap();
        assert_eq!(as_json(&cfg), json!({"key": "a"}));

        // Idle flush is a no-op.
        let mut cfg = Config::new();
        Context::new("ctx", &mut cfg, permissive()).flush().unwrap();
        assert!(cfg.is_empty());
    }

    #[test]
    fn test_section_header_over_assigned_value() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());
        ctx.enter_section("section").unwrap();
        ctx.assign("key", "value", AssignmentMode::Set, false).unwrap();

        let err = ctx.enter_section("section.key").unwrap_err();
        assert_eq!(err.to_string(), "ctx:0: Path 'section.key' is already assigned");
    }

    #[test]
    fn test_declared_section_exists_even_when_empty() {
        let mut cfg = Config::new();
        let mut ctx = Context::new("ctx", &mut cfg, permissive());
        ctx.enter_section("section3").unwrap();
        assert_eq!(as_json(&cfg), json!({"section3": {}}));
    }
}
