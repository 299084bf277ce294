use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    NotFound,
    InvalidArgument,
    InvalidState,
    /// Analyzer rejected the input; only the document being added is aborted.
    Analysis,
    /// Another writer holds the index lock.
    LockHeld,
    /// Flush or publish failed; the previous manifest is still in effect.
    Commit,
    /// Malformed query text, `position` is a byte offset into the input.
    QueryParse { position: usize },
    /// Checksum or structural mismatch while opening index files.
    CorruptSegment,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn analysis(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Analysis, context.into())
    }

    pub fn lock_held(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::LockHeld, context.into())
    }

    pub fn commit(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Commit, context.into())
    }

    pub fn query_parse(position: usize, context: impl Into<String>) -> Self {
        Error::new(ErrorKind::QueryParse { position }, context.into())
    }

    pub fn corrupt_segment(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::CorruptSegment, context.into())
    }

    pub fn not_found(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::NotFound, context.into())
    }

    pub fn invalid_argument(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidArgument, context.into())
    }

    pub fn is_lock_held(&self) -> bool {
        self.kind == ErrorKind::LockHeld
    }

    pub fn is_commit(&self) -> bool {
        self.kind == ErrorKind::Commit
    }

    pub fn is_corrupt(&self) -> bool {
        self.kind == ErrorKind::CorruptSegment
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Byte offset of a query syntax error.
    pub fn parse_position(&self) -> Option<usize> {
        match self.kind {
            ErrorKind::QueryParse { position } => Some(position),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::QueryParse { position } => {
                write!(f, "QueryParse at {}: {}", position, self.context)
            }
            _ => write!(f, "{:?}: {}", self.kind, self.context),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            _ => ErrorKind::Io,
        };
        Error {
            kind,
            context: err.to_string(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<fst::Error> for Error {
    fn from(err: fst::Error) -> Self {
        Error {
            kind: ErrorKind::CorruptSegment,
            context: format!("FST error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
