//! The path-addressed configuration tree.
//!
//! A [`Config`] node maps keys to [`Value`] entries and keeps a parallel
//! side-table recording which [`AssignmentMode`] last wrote each key. The
//! two maps are always mutated together; the side-table is what lets a later
//! write know the applicable conflict rule and lets diagnostics distinguish
//! an explicitly written key from a section inferred from a child path.

use super::types::AssignmentMode;
use crate::error::{MconfError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// One entry in a [`Config`] node.
///
/// The tagged union makes the section-vs-value checks in the assignment
/// algebra exhaustive instead of runtime type probes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A single string value.
    Scalar(String),
    /// An ordered sequence of strings; duplicates allowed unless UNION
    /// deduplicated them.
    List(Vec<String>),
    /// A nested configuration node.
    Section(Config),
}

impl Value {
    /// Whether this entry is a nested section.
    pub fn is_section(&self) -> bool {
        matches!(self, Value::Section(_))
    }

    /// The scalar string, if this entry is one.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// The list elements, if this entry is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The nested node, if this entry is a section.
    pub fn as_section(&self) -> Option<&Config> {
        match self {
            Value::Section(cfg) => Some(cfg),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

/// A configuration tree node.
///
/// Keys are non-empty strings without dots; dotted paths passed to the
/// accessors navigate through nested [`Value::Section`] entries. Equality
/// compares values only; the assignment-mode side-table is bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub(super) entries: BTreeMap<String, Value>,
    pub(super) modes: BTreeMap<String, AssignmentMode>,
}

impl Config {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of direct entries in this node.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this node has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry (and its recorded mode) from this node.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.modes.clear();
    }

    /// Iterate over the direct entries of this node.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Direct keys of this node.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Look up a dotted path without mutating the tree.
    ///
    /// Returns `None` when the path is missing, empty, has an empty segment,
    /// or descends through an entry that is not a section.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let (parents, last) = split_path(path).ok()?;
        let mut node = self;
        for segment in parents {
            node = node.entries.get(segment)?.as_section()?;
        }
        node.entries.get(last)
    }

    /// Mutable variant of [`Config::get`].
    pub fn get_mut(&mut self, path: &str) -> Option<&mut Value> {
        let (parents, last) = split_path(path).ok()?;
        let mut node = self;
        for segment in parents {
            node = match node.entries.get_mut(segment)? {
                Value::Section(cfg) => cfg,
                _ => return None,
            };
        }
        node.entries.get_mut(last)
    }

    /// Whether a dotted path is present.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// The assignment mode that last wrote the entry at `path`, if any.
    ///
    /// Sections created implicitly while resolving a longer path report
    /// [`AssignmentMode::Union`].
    pub fn assignment_mode(&self, path: &str) -> Option<AssignmentMode> {
        let (parents, last) = split_path(path).ok()?;
        let mut node = self;
        for segment in parents {
            node = node.entries.get(segment)?.as_section()?;
        }
        node.modes.get(last).copied()
    }

    /// Remove the entry at a dotted path, returning it if it was present.
    ///
    /// Missing paths and paths blocked by a non-section entry are a no-op.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let (parents, last) = split_path(path).ok()?;
        let mut node = self;
        for segment in parents {
            node = match node.entries.get_mut(segment)? {
                Value::Section(cfg) => cfg,
                _ => return None,
            };
        }
        node.modes.remove(last);
        node.entries.remove(last)
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Config {
    /// Build a tree from a plain map.
    ///
    /// Scalar and list entries are recorded as mode SET, nested maps as
    /// UNION, matching what parsing the equivalent text would produce.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = BTreeMap::<String, Value>::deserialize(deserializer)?;
        for key in entries.keys() {
            if key.is_empty() || key.contains('.') {
                return Err(D::Error::custom(format!("invalid config key: '{key}'")));
            }
        }
        let modes = entries
            .iter()
            .map(|(k, v)| {
                let mode = match v {
                    Value::Section(_) => AssignmentMode::Union,
                    _ => AssignmentMode::Set,
                };
                (k.clone(), mode)
            })
            .collect();
        Ok(Config { entries, modes })
    }
}

/// Split a dotted path into its section segments and final key.
///
/// Rejects empty paths and empty segments before any caller mutates the
/// tree; character-level path grammar is the parser's concern, not the
/// tree's.
pub(super) fn split_path(path: &str) -> Result<(Vec<&str>, &str)> {
    if path.is_empty() {
        return Err(MconfError::EmptyPath);
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(MconfError::InvalidPath(path.to_string()));
    }
    match segments.split_last() {
        Some((last, parents)) => Ok((parents.to_vec(), last)),
        None => Err(MconfError::EmptyPath),
    }
}
