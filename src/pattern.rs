use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

/// Placeholder substituted for a match when none is given explicitly.
pub const DEFAULT_PLACEHOLDER: &[u8] = b"<REDACTED>";

/// A literal byte sequence to detect, and the bytes that replace it.
///
/// `value` must be non-empty to ever match; providers silently skip empty
/// values. `placeholder` may be empty, which deletes matches outright.
///
/// # Examples
///
/// ```
/// use streamscrub::Pattern;
///
/// let p = Pattern::new("SECRET", "***");
///
/// assert_eq!(p.value, b"SECRET");
/// assert_eq!(p.placeholder, b"***");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Pattern {
    /// The literal sequence to detect.
    pub value: Vec<u8>,
    /// The bytes substituted for each match.
    pub placeholder: Vec<u8>,
}

impl Pattern {
    /// Construct a pattern with an explicit placeholder.
    pub fn new<V: Into<Vec<u8>>, P: Into<Vec<u8>>>(value: V, placeholder: P) -> Self {
        Pattern {
            value: value.into(),
            placeholder: placeholder.into(),
        }
    }

    /// Construct a pattern replaced by [`DEFAULT_PLACEHOLDER`].
    pub fn redact<V: Into<Vec<u8>>>(value: V) -> Self {
        Pattern::new(value, DEFAULT_PLACEHOLDER)
    }

    /// Construct a pattern whose matches are deleted from the stream.
    pub fn delete<V: Into<Vec<u8>>>(value: V) -> Self {
        Pattern::new(value, Vec::new())
    }
}

/// `Debug` never renders the value, only its length, so a pattern caught
/// in a log line or panic message does not leak the secret. There is no
/// `Display` impl for the same reason.
impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("value", &format_args!("[{} bytes]", self.value.len()))
            .field("placeholder", &String::from_utf8_lossy(&self.placeholder))
            .finish()
    }
}

impl FromStr for Pattern {
    type Err = Error;

    /// Parse `value=>placeholder`; without the arrow the default
    /// placeholder is used. Whitespace around either side of the arrow is
    /// trimmed.
    fn from_str(s: &str) -> Result<Self> {
        let (value, placeholder) = match s.rfind("=>") {
            Some(off) => (s[..off].trim(), Some(s[off + 2..].trim())),
            None => (s.trim(), None),
        };

        if value.is_empty() {
            return Err(Error::EmptyPattern);
        }

        Ok(match placeholder {
            Some(placeholder) => Pattern::new(value, placeholder),
            None => Pattern::redact(value),
        })
    }
}

/// Vec of `Pattern`
pub type Patterns = Vec<Pattern>;

/// Parse a newline-separated pattern list.
///
/// Each non-empty line is parsed as by [`Pattern::from_str`]; blank lines
/// and lines starting with `#` are skipped.
pub fn parse_patterns(s: &str) -> Result<Patterns> {
    s.lines()
        .flat_map(|line| {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                None
            } else {
                Some(line.parse())
            }
        })
        .collect()
}

/// A callable yielding the currently registered patterns.
///
/// Sources are re-invoked on every chunk, so the registered secrets may
/// rotate over the lifetime of a single stream. The source is owned by the
/// caller; providers only read from it. Implementations must be safe to
/// call from multiple scrubbers concurrently.
pub trait PatternSource: Send + Sync {
    /// Return the current pattern list.
    fn patterns(&self) -> Patterns;
}

/// Adapt a closure into a [`PatternSource`].
///
/// # Examples
///
/// ```
/// use streamscrub::{patterns, source_fn, PatternSource};
///
/// let source = source_fn(|| patterns!["SECRET"]);
///
/// assert_eq!(source.patterns().len(), 1);
/// ```
pub fn source_fn<F>(f: F) -> SourceFn<F>
where
    F: Fn() -> Patterns + Send + Sync,
{
    SourceFn(f)
}

/// A [`PatternSource`] backed by a closure; see [`source_fn`].
pub struct SourceFn<F>(F);

impl<F> PatternSource for SourceFn<F>
where
    F: Fn() -> Patterns + Send + Sync,
{
    fn patterns(&self) -> Patterns {
        (self.0)()
    }
}

/// A fixed pattern list is its own source.
impl PatternSource for Patterns {
    fn patterns(&self) -> Patterns {
        self.clone()
    }
}

/// A single fixed pattern is its own source.
impl PatternSource for Pattern {
    fn patterns(&self) -> Patterns {
        vec![self.clone()]
    }
}

/// A mutex-guarded list supports rotating secrets mid-stream.
impl PatternSource for Mutex<Patterns> {
    fn patterns(&self) -> Patterns {
        // A panicked writer leaves the last registered set in place; keep
        // scrubbing with it rather than silently dropping all patterns.
        self.lock().unwrap_or_else(|err| err.into_inner()).clone()
    }
}

impl<S: PatternSource + ?Sized> PatternSource for Arc<S> {
    fn patterns(&self) -> Patterns {
        (**self).patterns()
    }
}

/// Define a [`Pattern`], optionally with a placeholder.
///
/// # Examples
///
/// ```
/// use streamscrub::{pattern, Pattern, DEFAULT_PLACEHOLDER};
///
/// assert_eq!(pattern! { "token" }, Pattern::new("token", DEFAULT_PLACEHOLDER));
/// assert_eq!(pattern! { "token" => "***" }, Pattern::new("token", "***"));
/// ```
#[macro_export]
macro_rules! pattern {
    ( $value:expr ) => {
        $crate::Pattern::redact($value)
    };
    ( $value:expr => $placeholder:expr ) => {
        $crate::Pattern::new($value, $placeholder)
    };
}

/// Define multiple [`Pattern`]s, optionally with placeholders.
///
/// # Examples
///
/// ```
/// use streamscrub::patterns;
///
/// let set = patterns!["alpha" => "[A]", "beta" => "[B]"];
///
/// assert_eq!(set.len(), 2);
/// ```
#[macro_export]
macro_rules! patterns {
    ( $( $value:expr ),* $(,)? ) => {
        vec![ $( $crate::pattern! { $value } ),* ]
    };
    ( $( $value:expr => $placeholder:expr ),* $(,)? ) => {
        vec![ $( $crate::pattern! { $value => $placeholder } ),* ]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern() {
        let p: Pattern = "token".parse().unwrap();

        assert_eq!(p, pattern! { "token" });
        assert_eq!(p.value, b"token");
        assert_eq!(p.placeholder, DEFAULT_PLACEHOLDER);

        let p: Pattern = "token => ***".parse().unwrap();

        assert_eq!(p, pattern! { "token" => "***" });
        assert_eq!(p.value, b"token");
        assert_eq!(p.placeholder, b"***");

        let p: Pattern = "token =>".parse().unwrap();

        assert_eq!(p, Pattern::delete("token"));
        assert!(p.placeholder.is_empty());

        assert!("".parse::<Pattern>().is_err());
        assert!("   => ***".parse::<Pattern>().is_err());
    }

    #[test]
    fn test_parse_patterns() {
        let set = parse_patterns(
            "# rotated 2024-06\n\
             alpha => [A]\n\
             \n\
             beta\n",
        )
        .unwrap();

        assert_eq!(set, patterns!["alpha" => "[A]", "beta" => DEFAULT_PLACEHOLDER]);

        assert!(parse_patterns("alpha\n=> broken\n").is_err());
    }

    #[test]
    fn test_debug_redacts_value() {
        let p = pattern! { "hunter2" => "***" };
        let rendered = format!("{:?}", p);

        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[7 bytes]"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_sources() {
        let fixed: Patterns = patterns!["alpha", "beta"];
        assert_eq!(fixed.patterns().len(), 2);

        let single = pattern! { "alpha" };
        assert_eq!(single.patterns(), vec![single.clone()]);

        let rotating = Arc::new(Mutex::new(patterns!["alpha"]));
        let source = {
            let rotating = Arc::clone(&rotating);
            source_fn(move || rotating.lock().unwrap().clone())
        };
        assert_eq!(source.patterns().len(), 1);

        *rotating.lock().unwrap() = patterns!["alpha", "beta"];
        assert_eq!(source.patterns().len(), 2);

        let shared: Arc<Patterns> = Arc::new(patterns!["alpha"]);
        assert_eq!(shared.patterns().len(), 1);
    }
}
