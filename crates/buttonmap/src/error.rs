use std::{io, result::Result as StdResult};

use buttonmap_engine::MapError;
use buttonmap_protocol::UnknownAction;
use thiserror::Error;

/// Failures that end a command.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings could not be loaded.
    #[error("{}", .0.pretty())]
    Config(#[from] config::Error),
    /// The input hook could not be installed.
    #[error("event tap: {0}")]
    Tap(#[from] mac_eventtap::Error),
    /// No entry has this id or name.
    #[error("no entry with id or name \"{0}\"")]
    UnknownEntry(String),
    /// The entry refused the action.
    #[error(transparent)]
    Mapping(MapError),
    /// The action id is not recognised.
    #[error("{0} (see `buttonmap actions`)")]
    UnknownAction(#[from] UnknownAction),
    /// Terminal or runtime I/O.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias for commands.
pub type Result<T> = StdResult<T, Error>;
