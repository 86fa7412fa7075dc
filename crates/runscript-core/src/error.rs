//! Error types for script execution

use std::io;

use thiserror::Error;

/// Result type alias using runscript's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that stop a call before any process is launched.
///
/// Launch failures, non-zero exits and timeouts are not errors here; they
/// are outcomes of a run and live on [`crate::runner::ExitState`].
#[derive(Error, Debug)]
pub enum Error {
    /// `content` was absent from the request
    #[error("content must be provided")]
    MissingContent,

    /// An argument was present but not a string
    #[error("{0} must be a string")]
    NotAString(&'static str),

    /// `content` was an empty string
    #[error("content must not be empty")]
    EmptyContent,

    /// The scratch file could not be allocated
    #[error("Failed to create temporary file: {0}")]
    CreateTemp(#[source] io::Error),

    /// The script body could not be written out in full
    #[error("Failed to write to temporary file: {0}")]
    WriteTemp(#[source] io::Error),

    /// Flushing and closing the scratch file failed
    #[error("Failed to close temporary file: {0}")]
    CloseTemp(#[source] io::Error),

    /// Owner-only permissions could not be applied
    #[error("Failed to make script executable: {0}")]
    Permissions(#[source] io::Error),
}

impl Error {
    /// True for malformed requests, as opposed to local resource failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingContent | Self::NotAString(_) | Self::EmptyContent
        )
    }
}
