//! Error type shared by every part of the crate.

use std::fmt;

/// Errors produced while building signals and effects or while playing them.
///
/// Construction-time problems (`Precondition`, `UnsupportedFormat`) are
/// reported before any object becomes usable. Playback problems are reported
/// by the call that waits on the playback thread.
#[derive(Debug)]
pub enum Error {
    /// A constructor or setter was called with arguments that break its contract
    Precondition(String),
    /// An audio file uses an encoding that cannot be played
    UnsupportedFormat(String),
    /// An operation the concrete source does not provide was invoked
    Unimplemented(&'static str),
    /// The process-wide audio host is already live
    HostAlreadyInitialized,
    /// The host behind a stream has been terminated
    HostTerminated,
    /// The output device reported a failure
    Device(String),
    /// Audio data could not be decoded
    Decode(String),
    /// Underlying I/O failure
    Io(std::io::Error),
    /// Typed access asked for a source of the wrong type
    SourceMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// The playback thread panicked
    DriverPanicked,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Precondition(msg) => write!(f, "precondition failed: {}", msg),
            Error::UnsupportedFormat(msg) => write!(f, "unsupported audio format: {}", msg),
            Error::Unimplemented(op) => write!(f, "source does not implement '{}'", op),
            Error::HostAlreadyInitialized => write!(f, "audio host is already initialized"),
            Error::HostTerminated => write!(f, "audio host has been terminated"),
            Error::Device(msg) => write!(f, "audio device error: {}", msg),
            Error::Decode(msg) => write!(f, "decode error: {}", msg),
            Error::Io(err) => write!(f, "i/o error: {}", err),
            Error::SourceMismatch { expected, found } => {
                write!(f, "expected source '{}', found '{}'", expected, found)
            }
            Error::DriverPanicked => write!(f, "playback thread panicked"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

#[cfg(feature = "wav")]
impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => Error::Io(io),
            hound::Error::Unsupported => {
                Error::UnsupportedFormat("encoding not supported by the WAV reader".to_string())
            }
            other => Error::Decode(other.to_string()),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::Unimplemented("rewind").to_string(),
            "source does not implement 'rewind'"
        );
        assert_eq!(
            Error::Precondition("freq must be positive".into()).to_string(),
            "precondition failed: freq must be positive"
        );
        let mismatch = Error::SourceMismatch {
            expected: "a",
            found: "b",
        };
        assert_eq!(mismatch.to_string(), "expected source 'a', found 'b'");
    }

    #[test]
    fn test_io_error_is_source() {
        use std::error::Error as _;
        let err: Error = std::io::Error::other("boom").into();
        assert!(err.source().is_some());
        assert!(Error::HostTerminated.source().is_none());
    }
}
