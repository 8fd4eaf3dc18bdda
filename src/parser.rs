//! The configuration text parser.
//!
//! [`Parser`] drives the line grammar and a per-source [`Context`] over one
//! or more sources, merging everything into a single [`Config`] tree. All
//! the permissive/strict knobs live in [`ParseOptions`]; a `Parser` is
//! immutable once built and can be reused across sources.
//!
//! Batch loads (`load_files`, `load_strs`, `load_sources`) merge sources in
//! order into the same tree, so a later source can `!=`/`?=`/`+=`/`^=`
//! against keys from an earlier one. A failure partway through is prefixed
//! with the sources already merged, e.g.
//! `base.cfg > override.cfg:3: Empty value`.

use std::fs;
use std::path::Path;

use crate::config::{AssignmentMode, Config, ExplodePolicy};
use crate::context::Context;
use crate::error::{MconfError, Result};
use crate::grammar::{Grammar, LineEvent, strip_comment};

/// Strictness and shaping knobs for a [`Parser`].
///
/// The default is the strictest reading: assignments require an explicit
/// section, sections are declared once, `=` writes once, and a value that
/// tokenizes to nothing is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Permit the default/root section, both as an explicit `[]` header
    /// and implicitly for assignments before the first header.
    pub enable_default_section: bool,
    /// Permit re-declaring a section to add more entries to it.
    pub allow_section_split: bool,
    /// Treat `=` as `!=`, so plain assignments silently overwrite.
    pub set_is_replace: bool,
    /// Permit values that tokenize to nothing, and empty list elements.
    pub allow_empty_values: bool,
    /// How raw value text is tokenized into stored values.
    pub explode: ExplodePolicy,
}

/// Reusable parser for the sectioned key/value configuration format.
#[derive(Debug)]
pub struct Parser {
    options: ParseOptions,
    grammar: Grammar,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// A parser with default (strict) options.
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            grammar: Grammar::new(),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse one string into a fresh tree. The source is identified as
    /// `str` in error locations.
    pub fn parse_str(&self, text: &str) -> Result<Config> {
        let mut cfg = Config::new();
        self.load_str(text, "str", &mut cfg)?;
        Ok(cfg)
    }

    /// Parse one string into an existing tree under a caller-chosen
    /// source identifier.
    pub fn load_str(&self, text: &str, source_id: &str, cfg: &mut Config) -> Result<()> {
        self.load_lines(text, source_id, cfg)
    }

    /// Read and parse one file into a fresh tree. The path is the source
    /// identifier in error locations.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Config> {
        let mut cfg = Config::new();
        self.load_file_into(path, &mut cfg)?;
        Ok(cfg)
    }

    /// Read and parse one file into an existing tree.
    pub fn load_file_into(&self, path: impl AsRef<Path>, cfg: &mut Config) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MconfError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.load_lines(&text, &path.display().to_string(), cfg)
    }

    /// Parse several files in order into one merged tree.
    pub fn load_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Config> {
        if paths.is_empty() {
            return Err(MconfError::NoSources);
        }
        let mut cfg = Config::new();
        let mut parsed = Vec::new();
        for path in paths {
            let path = path.as_ref();
            self.load_file_into(path, &mut cfg)
                .map_err(|e| chain(&parsed, e))?;
            parsed.push(path.display().to_string());
        }
        Ok(cfg)
    }

    /// Parse several strings in order into one merged tree. Sources are
    /// identified as `str#1`, `str#2`, ... in error locations.
    pub fn load_strs(&self, texts: &[&str]) -> Result<Config> {
        let sources: Vec<(String, &str)> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| (format!("str#{}", i + 1), *text))
            .collect();
        let sources: Vec<(&str, &str)> = sources
            .iter()
            .map(|(id, text)| (id.as_str(), *text))
            .collect();
        self.load_sources(&sources)
    }

    /// Parse several `(source_id, text)` pairs in order into one merged
    /// tree.
    pub fn load_sources(&self, sources: &[(&str, &str)]) -> Result<Config> {
        if sources.is_empty() {
            return Err(MconfError::NoSources);
        }
        let mut cfg = Config::new();
        let mut parsed = Vec::new();
        for (source_id, text) in sources {
            self.load_lines(text, source_id, &mut cfg)
                .map_err(|e| chain(&parsed, e))?;
            parsed.push((*source_id).to_string());
        }
        Ok(cfg)
    }

    /// The line loop: strip comments, trim, classify, drive the context.
    fn load_lines(&self, text: &str, source_id: &str, cfg: &mut Config) -> Result<()> {
        let mut ctx = Context::new(source_id, cfg, self.options);
        for raw in text.lines() {
            ctx.advance_line();
            let line = strip_comment(raw).trim();
            let event = self
                .grammar
                .classify(line, ctx.continuing())
                .map_err(|e| e.at(source_id, ctx.line_number()))?;

            match event {
                LineEvent::Empty => ctx.flush()?,
                LineEvent::Continuation {
                    fragment,
                    continues,
                } => ctx.continue_value(&fragment, continues)?,
                LineEvent::Assignment {
                    path,
                    mode,
                    value,
                    continues,
                } => {
                    let mode = if self.options.set_is_replace && mode == AssignmentMode::Set {
                        AssignmentMode::Replace
                    } else {
                        mode
                    };
                    ctx.assign(&path, &value, mode, continues)?;
                }
                LineEvent::Section { path } => ctx.enter_section(&path)?,
            }
        }
        // EOF terminates an open continuation like a blank line does.
        ctx.flush()
    }
}

/// Prefix a batch failure with the sources already merged; a failure in
/// the first source passes through unwrapped.
fn chain(parsed: &[String], inner: MconfError) -> MconfError {
    if parsed.is_empty() {
        inner
    } else {
        MconfError::Chained {
            parsed: parsed.to_vec(),
            inner: Box::new(inner),
        }
    }
}
