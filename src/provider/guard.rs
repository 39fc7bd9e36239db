use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::provider::SecretProvider;

/// Rejects any chunk containing a registered secret instead of rewriting
/// it.
///
/// Wraps an inner provider; a chunk the inner provider would have altered
/// is treated as forbidden and the whole stream halts. The error is
/// generic and never reveals which secret matched.
///
/// # Examples
///
/// ```
/// use streamscrub::{patterns, FailFastProvider, PatternProvider, SecretProvider};
///
/// let provider = FailFastProvider::new(PatternProvider::new(patterns!["SECRET"]));
///
/// assert!(provider.handle_chunk(b"all clear").is_ok());
/// assert!(provider.handle_chunk(b"a SECRET here").is_err());
/// ```
pub struct FailFastProvider<P> {
    inner: P,
}

impl<P: SecretProvider> FailFastProvider<P> {
    /// Wrap `inner` in fail-fast mode.
    pub fn new(inner: P) -> Self {
        FailFastProvider { inner }
    }
}

impl<P: SecretProvider> SecretProvider for FailFastProvider<P> {
    fn handle_chunk<'a>(&self, chunk: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        let processed = self.inner.handle_chunk(chunk)?;

        if processed.as_ref() == chunk {
            Ok(processed)
        } else {
            Err(Error::ForbiddenContent)
        }
    }

    fn max_secret_len(&self) -> usize {
        self.inner.max_secret_len()
    }
}

/// Records an observation whenever the inner provider detects a secret,
/// then passes the sanitized chunk along.
///
/// Detections are counted per chunk, not per match. The optional hook runs
/// out of band with the running count; it receives no chunk contents and no
/// indication of which secret matched.
pub struct AuditProvider<P> {
    inner: P,
    detections: AtomicUsize,
    hook: Option<Box<dyn Fn(usize) + Send + Sync>>,
}

impl<P: SecretProvider> AuditProvider<P> {
    /// Wrap `inner`, counting detections.
    pub fn new(inner: P) -> Self {
        AuditProvider {
            inner,
            detections: AtomicUsize::new(0),
            hook: None,
        }
    }

    /// Wrap `inner`; `hook` is invoked with the running detection count
    /// each time a chunk is found to contain secret material.
    pub fn with_hook<F>(inner: P, hook: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        AuditProvider {
            inner,
            detections: AtomicUsize::new(0),
            hook: Some(Box::new(hook)),
        }
    }

    /// Number of chunks in which secret material was detected so far.
    pub fn detections(&self) -> usize {
        self.detections.load(Ordering::Relaxed)
    }
}

impl<P: SecretProvider> SecretProvider for AuditProvider<P> {
    fn handle_chunk<'a>(&self, chunk: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        let processed = self.inner.handle_chunk(chunk)?;

        if processed.as_ref() != chunk {
            let seen = self.detections.fetch_add(1, Ordering::Relaxed) + 1;

            warn!("secret material detected in stream");

            if let Some(hook) = &self.hook {
                hook(seen);
            }
        }

        Ok(processed)
    }

    fn max_secret_len(&self) -> usize {
        self.inner.max_secret_len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::patterns;
    use crate::provider::PatternProvider;

    use super::*;

    #[test]
    fn test_fail_fast() {
        let _ = pretty_env_logger::try_init();

        let provider = FailFastProvider::new(PatternProvider::new(patterns!["SECRET"]));

        assert_eq!(provider.max_secret_len(), 6);
        assert_eq!(provider.handle_chunk(b"clean").unwrap().as_ref(), b"clean");

        match provider.handle_chunk(b"a SECRET here") {
            Err(Error::ForbiddenContent) => {}
            other => panic!("unexpected result: {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_audit_counts_and_sanitizes() {
        let provider = AuditProvider::new(PatternProvider::new(patterns!["SECRET" => "***"]));

        assert_eq!(provider.handle_chunk(b"clean").unwrap().as_ref(), b"clean");
        assert_eq!(provider.detections(), 0);

        assert_eq!(provider.handle_chunk(b"a SECRET here").unwrap().as_ref(), b"a *** here");
        assert_eq!(provider.handle_chunk(b"SECRET again").unwrap().as_ref(), b"*** again");
        assert_eq!(provider.detections(), 2);
    }

    #[test]
    fn test_audit_hook_sees_running_count() {
        let counts = Arc::new(Mutex::new(Vec::new()));
        let provider = {
            let counts = Arc::clone(&counts);
            AuditProvider::with_hook(PatternProvider::new(patterns!["SECRET"]), move |seen| {
                counts.lock().unwrap().push(seen)
            })
        };

        provider.handle_chunk(b"SECRET").unwrap();
        provider.handle_chunk(b"clean").unwrap();
        provider.handle_chunk(b"SECRET").unwrap();

        assert_eq!(*counts.lock().unwrap(), vec![1, 2]);
    }
}
