//! Error types for settings loading.

use std::{
    path::{Path, PathBuf},
    result::Result as StdResult,
};

use thiserror::Error;

#[derive(Debug, Error, Clone)]
/// Errors produced while loading the settings file.
pub enum Error {
    #[error("{message}")]
    /// I/O or filesystem read error.
    Read {
        /// Path that could not be read.
        path: PathBuf,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// The file exists but is not a valid settings record.
    Parse {
        /// Path of the malformed file.
        path: PathBuf,
        /// Parser message, including its location.
        message: String,
    },
}

impl Error {
    /// Render a human-friendly message that names the file.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => format!("Read error at {}: {}", path.display(), message),
            Self::Parse { path, message } => {
                format!("Settings parse error at {}\n{}", path.display(), message)
            }
        }
    }

    /// The file this error is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

/// Result alias for settings operations.
pub type Result<T> = StdResult<T, Error>;
