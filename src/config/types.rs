//! Assignment modes and value-explosion policy.
//!
//! These enums are shared by the tree, the parsing context, and the driver.

use serde::{Deserialize, Serialize};

/// How a write to an already-assigned path is reconciled with its current
/// value. Each mode corresponds to one assignment operator in the textual
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    /// `=` — write once; a second write to the same path is an error.
    Set,
    /// `!=` — discard whatever is there, including a whole section.
    Replace,
    /// `?=` — keep the existing value; write only if the path is unset.
    Fallback,
    /// `+=` — extend a list, promoting a scalar first; duplicates kept.
    Append,
    /// `^=` — extend a list with elements not already present.
    Union,
}

impl AssignmentMode {
    /// Parse an assignment operator token.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(op: &str) -> Option<Self> {
        match op {
            "=" => Some(Self::Set),
            "!=" => Some(Self::Replace),
            "?=" => Some(Self::Fallback),
            "+=" => Some(Self::Append),
            "^=" => Some(Self::Union),
            _ => None,
        }
    }

    /// The operator token for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "=",
            Self::Replace => "!=",
            Self::Fallback => "?=",
            Self::Append => "+=",
            Self::Union => "^=",
        }
    }
}

impl std::fmt::Display for AssignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to a raw value string before it is stored in the tree.
///
/// The textual format tokenizes values shell-style ("explosion"); whether a
/// zero- or one-token value collapses back to a scalar is a per-loader
/// policy, selected here once instead of inferred from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplodePolicy {
    /// Store the raw string as a single scalar, escapes and quotes intact.
    Raw,
    /// Tokenize; zero tokens become `""`, one token a scalar, more a list.
    #[default]
    Collapse,
    /// Tokenize; always store a list, even for zero or one token.
    List,
}
