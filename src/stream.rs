//! The streaming scrubber: a write-through filter over any byte sink.
//!
//! The subtlety lives at chunk boundaries. A filter that searches each
//! write independently leaks secrets that arrive split across writes, so
//! the scrubber withholds a short tail of the stream (the carry buffer)
//! until enough bytes have arrived to prove the tail does not begin a
//! secret. The length of that tail is one less than the longest registered
//! secret: a secret still awaiting completion can have at most that many
//! bytes in flight.

use std::io::{self, Write};

use crate::error::{Error, Result};
use crate::provider::{NoopProvider, SecretProvider};

/// Stream lifecycle. Poisoning carries the error so every later operation
/// re-returns it; a tagged variant rather than flags keeps that rule
/// structurally enforced.
enum State {
    Open,
    Closed,
    Poisoned(Error),
}

/// A write-through filter that redacts secrets before they reach the sink.
///
/// Construct with [`Scrubber::new`] and install a provider with
/// [`with_secret_provider`](Scrubber::with_secret_provider); without one,
/// writes pass through untouched. Bytes are accepted through the
/// [`io::Write`] impl and emitted to the sink in order, possibly delayed
/// by up to `max_secret_len() - 1` bytes. Call [`close`](Scrubber::close)
/// to drain that tail and finalize; dropping an unclosed scrubber
/// truncates the stream but never leaks withheld bytes.
///
/// A single scrubber is not safe for concurrent writes; serialize
/// externally to fan in multiple producers. The provider, in contrast, may
/// be shared between scrubbers freely.
///
/// Provider and sink errors are fatal: the scrubber becomes poisoned and
/// every later operation returns the stored error. The already-written
/// prefix remains valid up to the last successful write.
///
/// # Examples
///
/// ```
/// use std::io::Write;
///
/// use streamscrub::{patterns, PatternProvider, Scrubber};
///
/// let mut output = Vec::new();
///
/// {
///     let provider = PatternProvider::new(patterns!["SECRET_TOKEN" => "***"]);
///     let mut scrubber = Scrubber::new(&mut output).with_secret_provider(provider);
///
///     // The secret straddles the two writes; neither chunk contains it whole.
///     scrubber.write_all(b"abc SEC").unwrap();
///     scrubber.write_all(b"RET_TOKEN xyz").unwrap();
///     scrubber.close().unwrap();
/// }
///
/// assert_eq!(output, b"abc *** xyz");
/// ```
pub struct Scrubber<W, P = NoopProvider> {
    sink: W,
    provider: P,
    carry: Vec<u8>,
    state: State,
}

impl<W: Write> Scrubber<W> {
    /// Wrap `sink` with no secret provider installed.
    pub fn new(sink: W) -> Scrubber<W> {
        Scrubber {
            sink,
            provider: NoopProvider,
            carry: Vec::new(),
            state: State::Open,
        }
    }
}

impl<W: Write, P: SecretProvider> Scrubber<W, P> {
    /// Install `provider`, consuming the scrubber.
    pub fn with_secret_provider<Q: SecretProvider>(self, provider: Q) -> Scrubber<W, Q> {
        Scrubber {
            sink: self.sink,
            provider,
            carry: self.carry,
            state: self.state,
        }
    }

    /// Drain the carry buffer through the provider and finalize the
    /// stream.
    ///
    /// Idempotent: closing an already-closed scrubber is a no-op. Closing
    /// a poisoned scrubber returns the stored error.
    pub fn close(&mut self) -> Result<()> {
        match &self.state {
            State::Poisoned(err) => return Err(err.clone()),
            State::Closed => return Ok(()),
            State::Open => {}
        }

        let drained = self.carry.len();

        self.pump(0)?;

        if drained > 0 {
            debug!("drained {} carried bytes at close", drained);
        }

        self.state = State::Closed;

        Ok(())
    }

    /// Get a reference to the downstream sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Get a mutable reference to the downstream sink.
    ///
    /// Writing to the sink directly bypasses redaction.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Unwrap the scrubber, returning the downstream sink.
    ///
    /// Any withheld bytes are discarded; call [`close`](Scrubber::close)
    /// first to drain them.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn ensure_open(&self) -> Result<()> {
        match &self.state {
            State::Open => Ok(()),
            State::Closed => Err(Error::StreamClosed),
            State::Poisoned(err) => Err(err.clone()),
        }
    }

    fn feed(&mut self, input: &[u8]) -> Result<usize> {
        self.ensure_open()?;

        // Re-read on every write: the provider's registered set may have
        // rotated since the last one.
        let longest = self.provider.max_secret_len();

        self.carry.extend_from_slice(input);

        // Until the working buffer reaches the longest secret length,
        // every byte of it could still be inside a secret that a future
        // write completes.
        if longest > 1 && self.carry.len() < longest {
            return Ok(input.len());
        }

        self.pump(longest)?;

        // All input bytes were accepted into the pipeline, withheld or not.
        Ok(input.len())
    }

    /// Run the whole carry buffer through the provider, emit everything
    /// except the trailing `longest - 1` bytes of the result, and keep
    /// that tail as the new carry.
    ///
    /// Processing happens before the split: a secret already complete in
    /// the buffer must be replaced even if it crosses the emit boundary,
    /// while a secret still missing bytes is at most a `longest - 1` byte
    /// prefix and therefore lands entirely in the withheld tail. The tail
    /// is re-presented to the provider on the next call, which provider
    /// idempotence makes safe.
    fn pump(&mut self, longest: usize) -> Result<()> {
        if self.carry.is_empty() {
            return Ok(());
        }

        let step = match self.provider.handle_chunk(&self.carry) {
            Ok(processed) => {
                let hold = if longest <= 1 {
                    0
                } else {
                    (longest - 1).min(processed.len())
                };
                let emit = processed.len() - hold;

                match self.sink.write_all(&processed[..emit]) {
                    Ok(()) => Ok(processed[emit..].to_vec()),
                    Err(err) => Err(Error::from(err)),
                }
            }
            Err(err) => {
                // Rejected: nothing was emitted, nothing is worth keeping.
                self.carry.clear();
                debug!("scrubber poisoned: {}", err);
                self.state = State::Poisoned(err.clone());
                return Err(err);
            }
        };

        match step {
            Ok(tail) => {
                self.carry = tail;
                Ok(())
            }
            Err(err) => {
                // Sink failure: the carried bytes stay put for diagnostics.
                debug!("scrubber poisoned: {}", err);
                self.state = State::Poisoned(err.clone());
                Err(err)
            }
        }
    }
}

impl<W: Write, P: SecretProvider> Write for Scrubber<W, P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.feed(buf).map_err(io::Error::from)
    }

    /// Drains the carry buffer through the provider before flushing the
    /// sink. A secret straddling the flush point can no longer be
    /// detected; flushing trades straddle detection for prompt delivery.
    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        self.pump(0)?;
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use crate::patterns;
    use crate::provider::{FailFastProvider, PatternProvider};

    use super::*;

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn token_scrubber(output: &mut Vec<u8>) -> Scrubber<&mut Vec<u8>, PatternProvider<crate::Patterns>> {
        Scrubber::new(output).with_secret_provider(PatternProvider::new(patterns!["SECRET_TOKEN" => "***"]))
    }

    #[test]
    fn test_boundary_straddle() {
        let _ = pretty_env_logger::try_init();

        let mut output = Vec::new();
        let mut scrubber = token_scrubber(&mut output);

        scrubber.write_all(b"abc SEC").unwrap();
        scrubber.write_all(b"RET_TOKEN xyz").unwrap();
        scrubber.close().unwrap();

        drop(scrubber);
        assert_eq!(output, b"abc *** xyz");
    }

    #[test]
    fn test_write_reports_input_length() {
        let mut output = Vec::new();
        let mut scrubber = token_scrubber(&mut output);

        // Everything is withheld, yet all input bytes were accepted.
        assert_eq!(scrubber.write(b"SECRET_TOKE").unwrap(), 11);
    }

    #[test]
    fn test_carry_stays_bounded() {
        let mut output = Vec::new();
        let mut scrubber = token_scrubber(&mut output);

        for chunk in b"the SECRET_TOKEN hides in here somewhere".chunks(3) {
            scrubber.write_all(chunk).unwrap();
            assert!(scrubber.carry.len() <= "SECRET_TOKEN".len() - 1);
        }

        scrubber.close().unwrap();
        assert!(scrubber.carry.is_empty());

        drop(scrubber);
        assert_eq!(output, b"the *** hides in here somewhere");
    }

    #[test]
    fn test_no_provider_passes_through_immediately() {
        let mut output = Vec::new();
        let mut scrubber = Scrubber::new(&mut output);

        scrubber.write_all(b"anything").unwrap();
        assert!(scrubber.carry.is_empty());

        scrubber.close().unwrap();
        drop(scrubber);
        assert_eq!(output, b"anything");
    }

    #[test]
    fn test_empty_stream_close_writes_nothing() {
        let mut output = Vec::new();
        let mut scrubber = token_scrubber(&mut output);

        scrubber.close().unwrap();
        scrubber.close().unwrap();

        drop(scrubber);
        assert!(output.is_empty());
    }

    #[test]
    fn test_write_after_close() {
        let mut output = Vec::new();
        let mut scrubber = token_scrubber(&mut output);

        scrubber.close().unwrap();

        let err = scrubber.feed(b"late").unwrap_err();
        assert!(matches!(err, Error::StreamClosed));

        let err = scrubber.write(b"late").unwrap_err();
        assert_eq!(err.to_string(), "stream already closed");
    }

    #[test]
    fn test_provider_error_poisons() {
        let mut output = Vec::new();
        let provider = FailFastProvider::new(PatternProvider::new(patterns!["SECRET"]));
        let mut scrubber = Scrubber::new(&mut output).with_secret_provider(provider);

        scrubber.write_all(b"has a SECRET in a long enough chunk").unwrap_err();

        assert!(scrubber.carry.is_empty());
        assert!(matches!(scrubber.feed(b"more"), Err(Error::ForbiddenContent)));
        assert!(matches!(scrubber.close(), Err(Error::ForbiddenContent)));

        drop(scrubber);
        assert!(output.is_empty());
    }

    #[test]
    fn test_sink_error_poisons_and_preserves_carry() {
        let mut scrubber =
            Scrubber::new(FailingSink).with_secret_provider(PatternProvider::new(patterns!["SECRET_TOKEN"]));

        let err = scrubber.feed(b"a chunk long enough to emit").unwrap_err();
        assert!(matches!(err, Error::Sink(_)));

        // Carried bytes stay put for diagnostics.
        assert_eq!(scrubber.carry, b"a chunk long enough to emit");

        let err = scrubber.close().unwrap_err();
        match err {
            Error::Sink(err) => assert_eq!(err.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_flush_drains_carry() {
        let mut output = Vec::new();
        let mut scrubber = token_scrubber(&mut output);

        scrubber.write_all(b"abc SEC").unwrap();
        assert!(!scrubber.carry.is_empty());

        scrubber.flush().unwrap();
        assert!(scrubber.carry.is_empty());

        scrubber.write_all(b"RET_TOKEN").unwrap();
        scrubber.close().unwrap();

        drop(scrubber);
        // The flush point split the secret; both halves pass through raw.
        assert_eq!(output, b"abc SECRET_TOKEN");
    }

    #[test]
    fn test_single_byte_patterns_never_carry() {
        let mut output = Vec::new();
        let provider = PatternProvider::new(patterns!["x" => "_"]);
        let mut scrubber = Scrubber::new(&mut output).with_secret_provider(provider);

        scrubber.write_all(b"axbxc").unwrap();
        assert!(scrubber.carry.is_empty());

        scrubber.close().unwrap();
        drop(scrubber);
        assert_eq!(output, b"a_b_c");
    }

    #[test]
    fn test_accessors() {
        let mut scrubber = Scrubber::new(Vec::new());

        scrubber.write_all(b"direct").unwrap();
        assert_eq!(scrubber.get_ref(), b"direct");

        scrubber.get_mut().extend_from_slice(b"!");
        assert_eq!(scrubber.into_inner(), b"direct!");
    }
}
