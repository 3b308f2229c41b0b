use std::fmt;

/// Errors that can occur during blob storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested object was not found.
    NotFound(String),
    /// An object already exists at the path and the write mode forbids replacing it.
    DuplicatePath(String),
    /// The object key is not an acceptable storage path.
    InvalidPath(String),
    /// The object exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The remote object store rejected or failed the request.
    Backend(String),
}

impl StorageError {
    /// Whether the failure is a duplicate-path rejection.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicatePath(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "object not found: {path}"),
            Self::DuplicatePath(path) => write!(f, "object already exists: {path}"),
            Self::InvalidPath(msg) => write!(f, "invalid object path: {msg}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "object exceeds size limit ({actual} > {limit} bytes)")
            }
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::Backend(msg) => write!(f, "object store error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
