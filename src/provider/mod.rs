//! Secret providers: the capability that decides what leaves a stream.
//!
//! The scrubber never holds the registered patterns itself; it hands every
//! chunk to a [`SecretProvider`] and forwards whatever comes back. Secret
//! material stays confined inside the provider, so a bug in the scrubber
//! cannot exfiltrate it through a log line or a panic message.

mod guard;
mod pattern;

pub use self::guard::{AuditProvider, FailFastProvider};
pub use self::pattern::PatternProvider;

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::Result;

/// A capability that sanitizes byte chunks.
///
/// Implementations must be thread-safe at the method level: both methods
/// may be called from multiple scrubbers concurrently, although a single
/// scrubber calls them serially. They must be longest-match greedy,
/// exhaustive within a chunk, and idempotent on input that contains no
/// secrets (clean input comes back byte-identical, typically as
/// [`Cow::Borrowed`]).
pub trait SecretProvider: Send + Sync {
    /// Sanitize `chunk`, returning the bytes safe to emit downstream.
    ///
    /// The result may be the same bytes, shorter, or longer than the input
    /// (placeholders are not bounded by the match length). An error means
    /// the chunk contains forbidden content; the scrubber propagates it
    /// and halts the stream.
    fn handle_chunk<'a>(&self, chunk: &'a [u8]) -> Result<Cow<'a, [u8]>>;

    /// Byte length of the longest secret currently registered, `0` when
    /// none. May change between calls; the scrubber re-reads it on every
    /// write.
    fn max_secret_len(&self) -> usize;
}

impl<'p, P: SecretProvider + ?Sized> SecretProvider for &'p P {
    fn handle_chunk<'a>(&self, chunk: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        (**self).handle_chunk(chunk)
    }

    fn max_secret_len(&self) -> usize {
        (**self).max_secret_len()
    }
}

impl<P: SecretProvider + ?Sized> SecretProvider for Box<P> {
    fn handle_chunk<'a>(&self, chunk: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        (**self).handle_chunk(chunk)
    }

    fn max_secret_len(&self) -> usize {
        (**self).max_secret_len()
    }
}

/// One provider may serve many scrubbers.
impl<P: SecretProvider + ?Sized> SecretProvider for Arc<P> {
    fn handle_chunk<'a>(&self, chunk: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        (**self).handle_chunk(chunk)
    }

    fn max_secret_len(&self) -> usize {
        (**self).max_secret_len()
    }
}

/// A provider that passes every chunk through unchanged.
///
/// This is what a [`Scrubber`](crate::Scrubber) uses until a real provider
/// is installed: no buffering, no rewriting, no rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProvider;

impl SecretProvider for NoopProvider {
    fn handle_chunk<'a>(&self, chunk: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        Ok(Cow::Borrowed(chunk))
    }

    fn max_secret_len(&self) -> usize {
        0
    }
}
