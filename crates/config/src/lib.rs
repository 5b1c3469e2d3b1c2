//! Settings and on-disk locations for buttonmap.
//!
//! Everything lives under `~/.buttonmap/` unless told otherwise:
//! `config.ron` for settings, with the entry and mapping tables beside it.
#![warn(unsafe_op_in_unsafe_fn)]

use std::{
    env,
    path::{Path, PathBuf},
};

mod error;
mod settings;

pub use error::{Error, Result};
pub use settings::Settings;

/// Name of the per-user directory under `$HOME`.
const APP_DIR: &str = ".buttonmap";

/// The per-user directory (`~/.buttonmap`).
pub fn app_dir() -> PathBuf {
    let mut p = PathBuf::from(env::var_os("HOME").unwrap_or_default());
    p.push(APP_DIR);
    p
}

/// Determine the preferred settings path (`~/.buttonmap/config.ron`).
pub fn default_config_path() -> PathBuf {
    app_dir().join("config.ron")
}

/// Resolve the settings file to read, if any.
///
/// Policy:
/// 1) Use `explicit` when provided, even if it does not exist yet.
/// 2) Else use `~/.buttonmap/config.ron` when it exists.
/// 3) Else `None`: run on built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let preferred = default_config_path();
    preferred.exists().then_some(preferred)
}

/// Load settings following [`resolve_config_path`].
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    match resolve_config_path(explicit) {
        Some(path) => Settings::load(&path),
        None => Ok(Settings::default()),
    }
}

/// Pick the state directory: `explicit` > `settings.state_dir` > [`app_dir`].
pub fn resolve_state_dir(explicit: Option<&Path>, settings: &Settings) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| settings.state_dir.clone())
        .unwrap_or_else(app_dir)
}
