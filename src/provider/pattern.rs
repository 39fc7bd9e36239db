use std::borrow::Cow;

use crate::error::Result;
use crate::pattern::{Pattern, PatternSource, Patterns};
use crate::provider::SecretProvider;
use crate::variant::{expand_patterns, VariantFlags};

/// Replace-mode provider over a dynamic pattern list.
///
/// On each call the source is invoked afresh, so registered secrets may
/// rotate mid-stream; nothing is cached across calls. Matching is
/// longest-match greedy: patterns are stable-sorted by descending value
/// length, and a position consumed by a longer match is never re-examined
/// by shorter patterns. Patterns with empty values are silently skipped.
///
/// # Examples
///
/// ```
/// use streamscrub::{patterns, PatternProvider, SecretProvider};
///
/// let provider = PatternProvider::new(patterns!["SECRET" => "***"]);
///
/// let processed = provider.handle_chunk(b"a SECRET here").unwrap();
///
/// assert_eq!(&processed[..], b"a *** here");
/// assert_eq!(provider.max_secret_len(), 6);
/// ```
pub struct PatternProvider<S> {
    source: S,
    variants: VariantFlags,
}

impl<S: PatternSource> PatternProvider<S> {
    /// Construct a replace-mode provider over `source`.
    pub fn new(source: S) -> Self {
        PatternProvider {
            source,
            variants: VariantFlags::empty(),
        }
    }

    /// As [`new`](PatternProvider::new), but every pattern is expanded
    /// into all of its encoding variants on each call.
    pub fn with_variants(source: S) -> Self {
        Self::with_variant_flags(source, VariantFlags::all())
    }

    /// Restrict variant expansion to the given classes.
    pub fn with_variant_flags(source: S, variants: VariantFlags) -> Self {
        PatternProvider { source, variants }
    }

    fn current(&self) -> Patterns {
        let patterns = self.source.patterns();

        if self.variants.is_empty() {
            patterns
        } else {
            expand_patterns(&patterns, self.variants)
        }
    }
}

impl<S: PatternSource> SecretProvider for PatternProvider<S> {
    fn handle_chunk<'a>(&self, chunk: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        let mut patterns = self.current();

        patterns.retain(|p| !p.value.is_empty());
        // Stable sort: same-length patterns keep their source order.
        patterns.sort_by(|a, b| b.value.len().cmp(&a.value.len()));

        Ok(replace_all(&patterns, chunk))
    }

    fn max_secret_len(&self) -> usize {
        self.current().iter().map(|p| p.value.len()).max().unwrap_or(0)
    }
}

/// Replace every non-overlapping occurrence of any pattern value in
/// `chunk`, scanning left to right and trying the longest pattern first at
/// each position. `patterns` must already be sorted by descending value
/// length. Returns the input unchanged (borrowed) when nothing matched.
fn replace_all<'a>(patterns: &[Pattern], chunk: &'a [u8]) -> Cow<'a, [u8]> {
    let mut replaced: Option<Vec<u8>> = None;
    let mut at = 0;

    while at < chunk.len() {
        match patterns.iter().find(|p| chunk[at..].starts_with(&p.value)) {
            Some(hit) => {
                let out = replaced.get_or_insert_with(|| chunk[..at].to_vec());
                out.extend_from_slice(&hit.placeholder);
                at += hit.value.len();
            }
            None => {
                if let Some(out) = replaced.as_mut() {
                    out.push(chunk[at]);
                }
                at += 1;
            }
        }
    }

    match replaced {
        Some(out) => Cow::Owned(out),
        None => Cow::Borrowed(chunk),
    }
}
