use std::io;

use thiserror::Error;

/// Errors raised by scrubbers, providers and the pattern parsers.
///
/// Messages are deliberately generic: an error never identifies which
/// secret was implicated, so surfacing one in a log line or a panic
/// message cannot leak registered material.
#[derive(Debug, Error)]
pub enum Error {
    /// A provider rejected a chunk because it contained forbidden content.
    #[error("forbidden content detected")]
    ForbiddenContent,

    /// The stream was written to or flushed after it was closed.
    #[error("stream already closed")]
    StreamClosed,

    /// An unknown variant flag character was supplied.
    #[error("invalid variant flag: {0}")]
    InvalidFlag(char),

    /// A textual pattern had an empty value.
    #[error("pattern value must not be empty")]
    EmptyPattern,

    /// The downstream sink failed.
    #[error(transparent)]
    Sink(#[from] io::Error),
}

/// A specialized `Result` type for scrubbing operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Clone for Error {
    fn clone(&self) -> Self {
        match self {
            Error::ForbiddenContent => Error::ForbiddenContent,
            Error::StreamClosed => Error::StreamClosed,
            Error::InvalidFlag(c) => Error::InvalidFlag(*c),
            Error::EmptyPattern => Error::EmptyPattern,
            // `io::Error` is not `Clone`; keep the kind and message.
            Error::Sink(err) => Error::Sink(io::Error::new(err.kind(), err.to_string())),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Sink(err) => err,
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_keeps_sink_kind() {
        let err = Error::Sink(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));

        match err.clone() {
            Error::Sink(cloned) => {
                assert_eq!(cloned.kind(), io::ErrorKind::BrokenPipe);
                assert_eq!(cloned.to_string(), "sink closed");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_into_io_error() {
        let err: io::Error = Error::ForbiddenContent.into();

        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(err.to_string(), "forbidden content detected");

        let err: io::Error = Error::Sink(io::Error::new(io::ErrorKind::WouldBlock, "busy")).into();

        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }
}
