//! Streamscrub is a boundary-safe secret scrubbing library for streaming
//! byte sinks.
//!
//! A [`Scrubber`] wraps any [`std::io::Write`] sink and redacts registered
//! byte sequences from the stream before the sink sees them, including
//! sequences that arrive split across writes, which per-chunk filters
//! miss. Detection is delegated to a [`SecretProvider`] capability, so the
//! scrubber itself never holds the secrets; the built-in
//! [`PatternProvider`] replaces literal patterns and can expand each one
//! into its hex, base-64, percent and separator-inserted variants.
//!
//! # Examples
//!
//! ```
//! use std::io::Write;
//!
//! use streamscrub::{patterns, PatternProvider, Scrubber};
//!
//! let mut output = Vec::new();
//!
//! {
//!     let provider = PatternProvider::new(patterns!["SECRET_TOKEN" => "***"]);
//!     let mut scrubber = Scrubber::new(&mut output).with_secret_provider(provider);
//!
//!     scrubber.write_all(b"abc SEC").unwrap();
//!     scrubber.write_all(b"RET_TOKEN xyz").unwrap();
//!     scrubber.close().unwrap();
//! }
//!
//! assert_eq!(output, b"abc *** xyz");
//! ```
#![deny(missing_docs, rust_2018_compatibility, rust_2018_idioms)]

#[macro_use]
extern crate log;

mod error;
mod pattern;
mod provider;
mod stream;
mod variant;

pub mod prelude;

pub use crate::error::{Error, Result};
pub use crate::pattern::{parse_patterns, source_fn, Pattern, PatternSource, Patterns, SourceFn, DEFAULT_PLACEHOLDER};
pub use crate::provider::{AuditProvider, FailFastProvider, NoopProvider, PatternProvider, SecretProvider};
pub use crate::stream::Scrubber;
pub use crate::variant::{expand_pattern, expand_patterns, VariantFlags, SEPARATORS};

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
