//! The `config.ron` settings record.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use buttonmap_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// User settings. Every field may be omitted from the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Where entries and mappings are stored. `None` means `~/.buttonmap/`.
    pub state_dir: Option<PathBuf>,
    /// Cross-trigger duplicate window, in milliseconds.
    pub duplicate_window_ms: u64,
    /// Ask for Accessibility access at startup when it is missing.
    pub prompt_accessibility: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_dir: None,
            duplicate_window_ms: 40,
            prompt_accessibility: true,
        }
    }
}

impl Settings {
    /// Parse settings from RON text read from `path`.
    pub fn from_ron(text: &str, path: &Path) -> Result<Self> {
        ron::from_str(text).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let s = Self::from_ron(&text, path)?;
                debug!(path = %path.display(), "settings_loaded");
                Ok(s)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "settings_missing_using_defaults");
                Ok(Self::default())
            }
            Err(e) => Err(Error::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// The duplicate-press window.
    pub fn duplicate_window(&self) -> Duration {
        Duration::from_millis(self.duplicate_window_ms)
    }

    /// Engine tuning derived from these settings.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            duplicate_window: self.duplicate_window(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_is_all_defaults() {
        let s = Settings::from_ron("()", Path::new("x.ron")).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.engine_config().duplicate_window, Duration::from_millis(40));
    }

    #[test]
    fn fields_override_defaults() {
        let s = Settings::from_ron(
            r#"(state_dir: Some("/tmp/bm"), duplicate_window_ms: 25, prompt_accessibility: false)"#,
            Path::new("x.ron"),
        )
        .unwrap();
        assert_eq!(s.state_dir, Some(PathBuf::from("/tmp/bm")));
        assert_eq!(s.duplicate_window(), Duration::from_millis(25));
        assert!(!s.prompt_accessibility);
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let err = Settings::from_ron("(colour: 3)", Path::new("bad.ron")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(err.path(), Path::new("bad.ron"));
        assert!(err.pretty().starts_with("Settings parse error at bad.ron"));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load(&dir.path().join("config.ron")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.ron");
        fs::write(&p, "(duplicate_window_ms: \"soon\")").unwrap();
        assert!(matches!(Settings::load(&p), Err(Error::Parse { .. })));
    }
}
