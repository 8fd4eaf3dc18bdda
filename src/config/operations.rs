//! Tree navigation, value explosion, and the assignment algebra.

use super::model::{Config, Value, split_path};
use super::types::{AssignmentMode, ExplodePolicy};
use crate::error::{MconfError, Result};

impl Config {
    /// Resolve `path` to a section node, creating missing intermediates.
    ///
    /// Every section created here was inferred from a child path rather than
    /// explicitly written, so it is recorded under [`AssignmentMode::Union`].
    /// An empty path addresses this node itself. Fails without mutating
    /// anything when the path has an empty segment; fails at the offending
    /// segment when an intermediate already holds a scalar or list.
    pub fn ensure_section(&mut self, path: &str) -> Result<&mut Config> {
        if path.is_empty() {
            return Ok(self);
        }
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(MconfError::InvalidPath(path.to_string()));
        }

        let mut node = self;
        let mut walked = String::new();
        for segment in segments {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);

            if !node.entries.contains_key(segment) {
                node.entries
                    .insert(segment.to_string(), Value::Section(Config::new()));
                node.modes
                    .insert(segment.to_string(), AssignmentMode::Union);
            }
            node = match node.entries.get_mut(segment) {
                Some(Value::Section(child)) => child,
                _ => return Err(MconfError::PathAlreadyAssigned(walked)),
            };
        }
        Ok(node)
    }

    /// Write `value` at `path` under the given assignment mode.
    ///
    /// Intermediate sections are resolved through [`Config::ensure_section`].
    /// Returns whether the tree actually changed: `false` for a FALLBACK
    /// that kept the existing value and for a UNION that added nothing new.
    ///
    /// List elements are trimmed on the way in. A [`Value::Section`] payload
    /// is only meaningful for SET/REPLACE/FALLBACK; APPEND and UNION reject
    /// it, since sections cannot be list elements.
    pub fn assign(&mut self, path: &str, value: Value, mode: AssignmentMode) -> Result<bool> {
        let value = match value {
            Value::List(items) => {
                Value::List(items.into_iter().map(|s| s.trim().to_string()).collect())
            }
            other => other,
        };

        match mode {
            AssignmentMode::Append => self.extend(path, value, false),
            AssignmentMode::Union => self.extend(path, value, true),
            AssignmentMode::Set | AssignmentMode::Replace | AssignmentMode::Fallback => {
                self.write(path, value, mode)
            }
        }
    }

    /// Explode `raw` per `policy`, then [`Config::assign`] the result.
    pub fn assign_str(
        &mut self,
        path: &str,
        raw: &str,
        mode: AssignmentMode,
        policy: ExplodePolicy,
    ) -> Result<bool> {
        self.assign(path, shape_value(raw, policy)?, mode)
    }

    /// Set-once sugar: `assign` under [`AssignmentMode::Set`].
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        self.assign(path, value.into(), AssignmentMode::Set)
            .map(|_| ())
    }

    /// SET/REPLACE/FALLBACK against a possibly-present key.
    fn write(&mut self, path: &str, value: Value, mode: AssignmentMode) -> Result<bool> {
        let (parents, key) = split_path(path)?;
        let node = self.ensure_section(&parents.join("."))?;

        if let Some(existing) = node.entries.get(key) {
            match mode {
                AssignmentMode::Set => {
                    return Err(if existing.is_section() {
                        MconfError::ReplaceSection(path.to_string())
                    } else {
                        MconfError::AlreadyAssigned(path.to_string())
                    });
                }
                AssignmentMode::Fallback => return Ok(false),
                // REPLACE discards the existing entry, whatever its kind.
                _ => {}
            }
        }
        node.entries.insert(key.to_string(), value);
        node.modes.insert(key.to_string(), mode);
        Ok(true)
    }

    /// APPEND/UNION: extend a list, promoting a scalar first.
    fn extend(&mut self, path: &str, value: Value, dedupe: bool) -> Result<bool> {
        let incoming = match value {
            Value::Scalar(s) => vec![s],
            Value::List(items) => items,
            Value::Section(_) => return Err(MconfError::SectionAppend(path.to_string())),
        };

        let (parents, key) = split_path(path)?;
        let node = self.ensure_section(&parents.join("."))?;

        let changed = match node.entries.get_mut(key) {
            None => {
                node.entries.insert(key.to_string(), Value::List(incoming));
                true
            }
            Some(existing) => {
                let mut items = match existing {
                    Value::Section(_) => {
                        return Err(MconfError::SectionAppend(path.to_string()));
                    }
                    Value::Scalar(s) => vec![std::mem::take(s)],
                    Value::List(items) => std::mem::take(items),
                };
                let before = items.len();
                if dedupe {
                    for element in incoming {
                        if !items.contains(&element) {
                            items.push(element);
                        }
                    }
                } else {
                    items.extend(incoming);
                }
                let changed = items.len() > before;
                *existing = Value::List(items);
                changed
            }
        };
        node.modes
            .insert(key.to_string(), if dedupe { AssignmentMode::Union } else { AssignmentMode::Append });
        Ok(changed)
    }
}

/// Tokenize a raw value string into trimmed, unescaped tokens.
///
/// Quoting and escapes follow shell rules; a mismatched quote is a
/// malformed value.
pub(crate) fn explode(raw: &str) -> Result<Vec<String>> {
    let tokens = shell_words::split(raw).map_err(|_| MconfError::MalformedValue)?;
    Ok(tokens.into_iter().map(|t| t.trim().to_string()).collect())
}

/// Shape a raw value string into a storable [`Value`] per the policy.
pub(crate) fn shape_value(raw: &str, policy: ExplodePolicy) -> Result<Value> {
    match policy {
        ExplodePolicy::Raw => Ok(Value::Scalar(raw.to_string())),
        ExplodePolicy::Collapse => {
            let mut tokens = explode(raw)?;
            Ok(match tokens.len() {
                0 => Value::Scalar(String::new()),
                1 => Value::Scalar(tokens.remove(0)),
                _ => Value::List(tokens),
            })
        }
        ExplodePolicy::List => Ok(Value::List(explode(raw)?)),
    }
}
