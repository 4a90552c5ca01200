use std::io;

/// The error type for every fallible archive writing operation.
#[derive(Debug)]
pub struct Error {
    inner: ErrorInner,
}

impl Error {
    pub(crate) fn io(err: io::Error) -> Error {
        Error::from(ErrorKind::IO(err))
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Error {
        Error::from(ErrorKind::InvalidInput { msg: msg.into() })
    }

    pub(crate) fn size_limit(what: &'static str, value: u64) -> Error {
        Error::from(ErrorKind::SizeLimitExceeded { what, value })
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }

    /// Returns true when the caller drove the writer through an illegal
    /// state transition (writing with no entry open, closing an entry twice,
    /// opening an entry while another is open, using a finished archive).
    ///
    /// Protocol violations are rejected before any bytes reach the
    /// destination.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self.inner.kind,
            ErrorKind::EntryAlreadyOpen { .. }
                | ErrorKind::NoEntryOpen
                | ErrorKind::EntryAlreadyClosed
                | ErrorKind::ArchiveFinished
        )
    }

    /// Returns true if the error originated from the underlying destination.
    pub fn is_io(&self) -> bool {
        matches!(self.inner.kind, ErrorKind::IO(_))
    }
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
}

/// The specific kind of [`Error`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An entry was opened while `name` was still being written.
    EntryAlreadyOpen { name: String },

    /// Data was written or an entry closed while no entry was open.
    NoEntryOpen,

    /// The most recent entry was already closed.
    EntryAlreadyClosed,

    /// The archive has already been finalized.
    ArchiveFinished,

    /// A previous fault left the archive in an unusable state.
    Poisoned,

    /// The caller supplied an unusable value (eg: an empty entry name).
    InvalidInput { msg: String },

    /// A size, offset, or count does not fit the 32-bit (or 16-bit) field
    /// that records it.
    SizeLimitExceeded { what: &'static str, value: u64 },

    /// The destination rejected a write or flush.
    IO(io::Error),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.inner.kind {
            ErrorKind::IO(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.inner.kind)?;
        Ok(())
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ErrorKind::IO(ref err) => err.fmt(f),
            ErrorKind::EntryAlreadyOpen { ref name } => {
                write!(f, "Entry '{}' is still open", name)
            }
            ErrorKind::NoEntryOpen => {
                write!(f, "No entry is open")
            }
            ErrorKind::EntryAlreadyClosed => {
                write!(f, "Entry is already closed")
            }
            ErrorKind::ArchiveFinished => {
                write!(f, "Archive is already finished")
            }
            ErrorKind::Poisoned => {
                write!(f, "Archive is unusable after an earlier failure")
            }
            ErrorKind::InvalidInput { ref msg } => {
                write!(f, "Invalid input: {}", msg)
            }
            ErrorKind::SizeLimitExceeded { what, value } => {
                write!(f, "{} of {} exceeds the zip format limit", what, value)
            }
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: ErrorInner { kind },
        }
    }
}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> ErrorKind {
        ErrorKind::IO(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::io(err)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err.inner.kind {
            ErrorKind::IO(err) => err,
            kind @ ErrorKind::InvalidInput { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, Error::from(kind))
            }
            kind => io::Error::new(io::ErrorKind::Other, Error::from(kind)),
        }
    }
}
