//! Error types for the hwpcorpus library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hwpcorpus operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hwpcorpus operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error against the backing store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input path does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exceeds the configured size ceiling.
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    /// The container is malformed or the HWP signature is absent.
    #[error("not an HWP document: {0}")]
    NotHwp(String),

    /// The encryption flag is set; encrypted documents are rejected.
    #[error("document is encrypted")]
    Encrypted,

    /// Truncated records, bad deflate, or otherwise unusable content.
    #[error("corrupt document data: {0}")]
    Corrupt(String),

    /// A batch worker exceeded its wall-clock limit.
    #[error("extraction timed out after {0}s")]
    Timeout(u64),

    /// The format is recognized but not processed here (HWP 3.x).
    #[error("unsupported format: {0}")]
    Unsupported(String),

    /// The file signature matches no supported format.
    #[error("unknown file format")]
    UnknownFormat,
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::NotHwp(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Corrupt(err.to_string())
    }
}
