use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised while reading, validating or rewriting the inventory file.
#[derive(Debug, Error)]
pub enum Error {
    /// The store (or the scratch file next to it) could not be opened.
    #[error("unable to open `{}`: {source}", path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value typed by the user was rejected before anything was written.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A stored line does not have the `name quantity wholesale retail` shape.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The rewritten store could not be moved over the original.
    #[error("unable to replace the inventory file: {0}")]
    SwapFailed(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileUnavailable {
            path: path.into(),
            source,
        }
    }
}
