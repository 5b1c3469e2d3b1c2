use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Failures of the persistence layer.
///
/// None of these are fatal: the table logs them and keeps its in-memory
/// state.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure reading or writing a state file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a new entry was refused.
///
/// `Display` is the message shown to the user; [`AddEntryError::title`] is
/// the heading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddEntryError {
    /// The trigger is malformed or a legacy combo.
    #[error("The learned trigger format is not supported.")]
    InvalidTrigger,

    /// The trigger is, or contains, a primary or secondary click.
    #[error("Left and right click are reserved for safety and cannot be remapped.")]
    ReservedButton,

    /// Another entry already owns the trigger.
    #[error("{label} is already mapped as \"{name}\".")]
    Duplicate {
        /// Debug label of the rejected trigger.
        label: String,
        /// Name of the entry that owns it.
        name: String,
    },
}

impl AddEntryError {
    /// Short heading for an alert.
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidTrigger => "Invalid Trigger",
            Self::ReservedButton => "Reserved Buttons",
            Self::Duplicate { .. } => "Trigger Already Added",
        }
    }
}

/// Why an action could not be assigned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// No entry has this id or name.
    #[error("no entry named \"{0}\"")]
    UnknownEntry(String),

    /// The action types the entry's own shortcut through System Events, which
    /// the tap would read back as a fresh press.
    #[error("{action} presses {label}, which would trigger the entry again.")]
    SelfTriggering {
        /// Debug label of the entry's trigger.
        label: String,
        /// Title of the refused action.
        action: String,
    },
}

impl MapError {
    /// Short heading for an alert.
    pub fn title(&self) -> &'static str {
        match self {
            Self::UnknownEntry(_) => "Unknown Entry",
            Self::SelfTriggering { .. } => "Action Would Repeat Itself",
        }
    }
}

/// Why a learn session could not be committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// No capture session is open.
    #[error("no capture in progress")]
    NotCapturing,

    /// The session has not seen a trigger yet.
    #[error("press a button or shortcut first")]
    NothingCaptured,

    /// The table refused the entry. The session stays open.
    #[error(transparent)]
    Rejected(#[from] AddEntryError),
}
