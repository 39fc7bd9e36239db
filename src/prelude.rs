//! The `streamscrub` prelude: everything needed for everyday scrubbing.
//!
//! ```
//! use streamscrub::prelude::*;
//! ```

pub use crate::{
    parse_patterns, source_fn, AuditProvider, Error, FailFastProvider, NoopProvider, Pattern, PatternProvider,
    PatternSource, Patterns, Result, Scrubber, SecretProvider, VariantFlags,
};
