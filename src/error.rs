//! Error types for archive writing.
//!
//! All archive operations return [`Result<T>`], an alias for
//! `Result<T, ArchiveError>`. Resolving a [`TarDirConfig`] into a source
//! directory can additionally fail with a [`ConfigError`].
//!
//! No error is retried. After [`ArchiveError::Io`] the output stream is in an
//! unknown state and the archive should be abandoned; after
//! [`ArchiveError::Corruption`] the archive has already been terminated.
//!
//! [`TarDirConfig`]: crate::config::TarDirConfig

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors raised while writing an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Writing to the sink or reading from an entry's content failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output file could not be created.
    #[error("could not open {path:?} for writing: {source}")]
    OpenSink {
        /// Path of the output file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// An entry's content could not be opened for reading.
    #[error("could not open {path:?} for reading: {source}")]
    OpenSource {
        /// Path of the source file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The content length differed from the size written into the header.
    ///
    /// The archive is closed before this error is returned.
    #[error("size of {name} changed while reading, archive corrupted: read {read} expected {expected}")]
    Corruption {
        /// Archive name of the entry.
        name: String,
        /// Size declared in the header.
        expected: u64,
        /// Bytes actually read from the content stream.
        read: u64,
    },

    /// An entry was added after the archive was closed.
    #[error("archive has been closed, files can no longer be added")]
    EntryAfterClose,

    /// A numeric value does not fit in its header field.
    #[error("value {value} does not fit in the {field} header field")]
    FieldOverflow {
        /// Header field name.
        field: &'static str,
        /// Offending value.
        value: i128,
    },
}

/// Errors raised while resolving the directory to archive.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No directory was requested and archiving the working directory is disabled.
    #[error("no directory given and archiving the working directory is not allowed")]
    RootNotAllowed,

    /// The requested directory is empty after sanitizing or does not exist.
    #[error("directory {0:?} not found or given in incorrect format")]
    DirectoryNotFound(String),

    /// The working directory could not be inspected.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
