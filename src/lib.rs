//! mconf — a sectioned key/value configuration language.
//!
//! The format is INI-derived: `[section]` headers, `key = value` entries,
//! `#` comments, and trailing-backslash line continuation. On top of that
//! it adds dotted paths that nest (`server.tls.cert = ...`), shell-style
//! value tokenization (`ports = 80 443` stores a list), and five
//! assignment operators that say how a write reconciles with an existing
//! value: `=` (set once), `!=` (replace), `?=` (fallback), `+=` (append),
//! `^=` (union).
//!
//! ```
//! use mconf::{Parser, Value};
//!
//! let cfg = Parser::new().parse_str(
//!     "[server]\n\
//!      host = 127.0.0.1\n\
//!      ports = 80 443\n",
//! )?;
//!
//! assert_eq!(cfg.get("server.host"), Some(&Value::from("127.0.0.1")));
//! assert_eq!(
//!     cfg.get("server.ports"),
//!     Some(&Value::from(vec!["80".to_string(), "443".to_string()]))
//! );
//! # Ok::<(), mconf::MconfError>(())
//! ```
//!
//! Several sources can be merged in order, so an override file can extend
//! or replace what a base file established:
//!
//! ```
//! use mconf::{ParseOptions, Parser};
//!
//! let parser = Parser::with_options(ParseOptions {
//!     allow_section_split: true,
//!     ..ParseOptions::default()
//! });
//! let cfg = parser.load_strs(&[
//!     "[server]\nhosts = alpha\n",
//!     "[server]\nhosts += beta\n",
//! ])?;
//!
//! assert_eq!(cfg.get("server.hosts").and_then(|v| v.as_list()).map(|l| l.len()), Some(2));
//! # Ok::<(), mconf::MconfError>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
mod grammar;
pub mod parser;

pub use config::{AssignmentMode, Config, ExplodePolicy, Value};
pub use context::Context;
pub use error::{ErrorKind, MconfError, Result};
pub use parser::{ParseOptions, Parser};
