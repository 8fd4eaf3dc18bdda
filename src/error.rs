//! Error types for the mconf library.
//!
//! Uses thiserror for derive macros. Every variant keeps the exact message
//! the parser reports to users; location and batch context are layered on
//! top with the [`MconfError::Located`] and [`MconfError::Chained`] wrappers
//! rather than baked into the inner messages.

use thiserror::Error;

/// Broad category of an [`MconfError`], independent of location wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty path, empty segment, or descent through a non-section.
    Path,
    /// A write conflicted with an existing entry under the active mode.
    Assignment,
    /// A line or one of its sub-fields failed the grammar.
    Syntax,
    /// The parsing context was driven through an illegal transition.
    State,
    /// A source could not be read.
    Io,
}

/// Main error type for mconf operations.
#[derive(Error, Debug)]
pub enum MconfError {
    /// The addressed path was empty.
    #[error("Empty path")]
    EmptyPath,

    /// The addressed path contains an empty segment (`a..b`, `.a`, `a.`).
    #[error("Invalid path: '{0}'")]
    InvalidPath(String),

    /// Traversal attempted to descend through an existing scalar/list.
    #[error("Path '{0}' is already assigned")]
    PathAlreadyAssigned(String),

    /// SET attempted to overwrite an existing value without a replace override.
    #[error("Path '{0}' is already assigned")]
    AlreadyAssigned(String),

    /// A non-REPLACE write attempted to overwrite an existing section.
    #[error("Cannot replace section '{0}' by a value")]
    ReplaceSection(String),

    /// APPEND/UNION targeted a section instead of a value.
    #[error("Cannot add a value to section '{0}' without a key")]
    SectionAppend(String),

    /// A section was declared twice without `allow_section_split`.
    #[error("Duplicate section: '{0}'")]
    DuplicateSection(String),

    /// `[]` was declared without `enable_default_section`.
    #[error("Default/Empty section not allowed")]
    DefaultSectionNotAllowed,

    /// An assignment appeared before any section header.
    #[error("Expected a section")]
    ExpectedSection,

    /// A value exploded to nothing without `allow_empty_values`.
    #[error("Empty value")]
    EmptyValue,

    /// A list element was empty without `allow_empty_values`.
    #[error("Empty element at index {0}")]
    EmptyElement(usize),

    /// An assignment path failed the path grammar.
    #[error("Invalid key: '{0}'")]
    InvalidKey(String),

    /// A section header path failed the path grammar.
    #[error("Invalid section name: '{0}'")]
    InvalidSectionName(String),

    /// The operator between path and value is not one of `= != ?= += ^=`.
    #[error("Unknown assignment operator: '{0}'")]
    UnknownOperator(String),

    /// A line matched none of empty/continuation/assignment/section.
    #[error("Malformed line")]
    MalformedLine,

    /// A value failed the value grammar (bad escape, unclosed quote).
    #[error("Malformed value")]
    MalformedValue,

    /// A context method was called from the wrong state.
    #[error("Invalid state")]
    InvalidState,

    /// No sources were given to a batch load.
    #[error("No sources to load")]
    NoSources,

    /// A source file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An inner error tagged with its source identifier and 1-based line.
    #[error("{source_id}:{line}: {inner}")]
    Located {
        source_id: String,
        line: u32,
        #[source]
        inner: Box<MconfError>,
    },

    /// An inner error prefixed with the sources already parsed in a batch.
    #[error("{} > {inner}", parsed.join(" > "))]
    Chained {
        parsed: Vec<String>,
        #[source]
        inner: Box<MconfError>,
    },
}

impl MconfError {
    /// Returns the category of this error, looking through location wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MconfError::EmptyPath
            | MconfError::InvalidPath(_)
            | MconfError::PathAlreadyAssigned(_) => ErrorKind::Path,
            MconfError::AlreadyAssigned(_)
            | MconfError::ReplaceSection(_)
            | MconfError::SectionAppend(_)
            | MconfError::DuplicateSection(_) => ErrorKind::Assignment,
            MconfError::DefaultSectionNotAllowed
            | MconfError::ExpectedSection
            | MconfError::EmptyValue
            | MconfError::EmptyElement(_)
            | MconfError::InvalidKey(_)
            | MconfError::InvalidSectionName(_)
            | MconfError::UnknownOperator(_)
            | MconfError::MalformedLine
            | MconfError::MalformedValue => ErrorKind::Syntax,
            MconfError::InvalidState | MconfError::NoSources => ErrorKind::State,
            MconfError::Io { .. } => ErrorKind::Io,
            MconfError::Located { inner, .. } | MconfError::Chained { inner, .. } => inner.kind(),
        }
    }

    /// Wrap this error with a source identifier and line number.
    ///
    /// Already-located errors are returned unchanged so a failure that
    /// bubbles through several layers is only tagged once, at the line
    /// that produced it.
    pub fn at(self, source_id: &str, line: u32) -> MconfError {
        match self {
            MconfError::Located { .. } | MconfError::Chained { .. } => self,
            inner => MconfError::Located {
                source_id: source_id.to_string(),
                line,
                inner: Box::new(inner),
            },
        }
    }
}

/// Result type alias for mconf operations.
pub type Result<T> = std::result::Result<T, MconfError>;
