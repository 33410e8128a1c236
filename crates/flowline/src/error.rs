//! Portable error taxonomy shared by every layer of the runtime.
//!
//! Every public fallible operation in this crate returns `Result<T, Error>`.
//! `ErrorKind` is the wire-stable, portable part: it is what crosses an RPC
//! response as a string (see [`ErrorKind::portable_name`]) so a peer that
//! does not share our type system can still recognize the failure class.

use std::fmt;

/// The closed set of error kinds that can cross the wire or surface from any
/// layer of the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// End of input reached unexpectedly.
    Eof,
    /// Any underlying OS I/O failure. Carries the raw `errno`.
    IoError(i32),
    /// Non-blocking operation would block; caller should re-arm and retry.
    TryAgain,
    /// Operation aborted because its connection was asked to disconnect.
    ShuttingDown,
    /// Operation aborted by thread-context cancellation.
    Cancelled,
    /// Precondition violated (empty descriptor, broken promise, double-set,
    /// disarmed usage lock).
    InvalidState,
    /// Lookup of a missing key (registry, map).
    KeyError,
    /// A configured size or numeric bound was exceeded.
    OutOfRange,
    /// Schema fingerprint mismatch or MAC verification failure.
    DataMismatch,
    /// A usage-locked target is not currently armed.
    Unavailable,
    /// Peer reported an error kind this side does not recognize.
    UnknownError,
}

impl ErrorKind {
    /// The short, portable name this kind crosses the wire as (see
    /// `spec`'s RPC response shape: `(error_class_name, message)`).
    pub fn portable_name(self) -> &'static str {
        match self {
            ErrorKind::Eof => "eof",
            ErrorKind::IoError(_) => "io-error",
            ErrorKind::TryAgain => "try-again",
            ErrorKind::ShuttingDown => "shutting-down",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::InvalidState => "invalid-state",
            ErrorKind::KeyError => "key-error",
            ErrorKind::OutOfRange => "out-of-range",
            ErrorKind::DataMismatch => "data-mismatch",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::UnknownError => "unknown-error",
        }
    }

    /// Parses a portable name received from a peer, defaulting to
    /// [`ErrorKind::UnknownError`] for anything unregistered.
    pub fn from_portable_name(name: &str) -> ErrorKind {
        match name {
            "eof" => ErrorKind::Eof,
            "io-error" => ErrorKind::IoError(0),
            "try-again" => ErrorKind::TryAgain,
            "shutting-down" => ErrorKind::ShuttingDown,
            "cancelled" => ErrorKind::Cancelled,
            "invalid-state" => ErrorKind::InvalidState,
            "key-error" => ErrorKind::KeyError,
            "out-of-range" => ErrorKind::OutOfRange,
            "data-mismatch" => ErrorKind::DataMismatch,
            "unavailable" => ErrorKind::Unavailable,
            _ => ErrorKind::UnknownError,
        }
    }
}

/// The runtime's single error type.
pub struct Error {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn eof(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Eof, message)
    }

    pub fn io_error(message: impl Into<String>, errno: i32) -> Self {
        Error::new(ErrorKind::IoError(errno), message)
    }

    pub fn try_again(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::TryAgain, message)
    }

    pub fn shutting_down(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::ShuttingDown, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Cancelled, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidState, message)
    }

    pub fn key_error(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::KeyError, message)
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::OutOfRange, message)
    }

    pub fn data_mismatch(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::DataMismatch, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Unavailable, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::UnknownError, message)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Maps the current `errno` the way the POSIX I/O layer does: `EAGAIN`
    /// / `EWOULDBLOCK` become [`ErrorKind::TryAgain`], everything else
    /// becomes an [`ErrorKind::IoError`] carrying the numeric code.
    pub fn from_errno(message: impl Into<String>) -> Self {
        let code = std::io::Error::last_os_error()
            .raw_os_error()
            .unwrap_or(0);
        if code == libc::EAGAIN || code == libc::EWOULDBLOCK {
            Error::try_again(message)
        } else {
            Error::io_error(message, code)
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind.portable_name())
            .field("message", &self.message)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.portable_name(), self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        let code = e.raw_os_error().unwrap_or(0);
        if code == libc::EAGAIN || code == libc::EWOULDBLOCK {
            Error::try_again(e.to_string())
        } else {
            Error::with_source(ErrorKind::IoError(code), "I/O error", e)
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
