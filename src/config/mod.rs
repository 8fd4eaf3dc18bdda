//! Path-addressed configuration tree for mconf.
//!
//! This module defines the [`Config`] tree the parser builds: a nested
//! mapping from dotted paths to scalars, lists, and sub-sections, with
//! per-key assignment-mode bookkeeping and the five-mode conflict
//! resolution algebra applied on every write.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::{Config, Value};
pub use types::{AssignmentMode, ExplodePolicy};

pub(crate) use operations::shape_value;
