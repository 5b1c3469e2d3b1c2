//! Persistence for the entry list and the mapping table.
//!
//! Both records are whole-value overwrites. Loading never fails: a missing,
//! unreadable or malformed file reads as absent and the table starts empty.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{ButtonEntry, Result};

/// File holding the entry list.
pub const ENTRIES_FILE: &str = "ButtonEntries.json";
/// File holding the mapping table.
pub const MAPPINGS_FILE: &str = "ButtonMappings.json";

/// What a store had on disk, before any decoding of individual records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredState {
    /// Raw entry records, if an entry list was stored.
    pub entries: Option<Vec<Value>>,
    /// Mapping table, entry id (or legacy button number) to action id.
    pub mappings: Option<BTreeMap<String, String>>,
}

/// Key-value storage for the two records.
pub trait Store: Send {
    /// Read both records.
    fn load(&self) -> StoredState;
    /// Replace the entry list.
    fn save_entries(&self, entries: &[ButtonEntry]) -> Result<()>;
    /// Replace the mapping table.
    fn save_mappings(&self, mappings: &BTreeMap<String, String>) -> Result<()>;
}

/// JSON files in a state directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Directory holding both files.
    dir: PathBuf,
}

impl JsonFileStore {
    /// A store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The state directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Parse a state file, treating every failure as absence.
    fn read(&self, name: &str) -> Option<Value> {
        let path = self.dir.join(name);
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "state_file_unreadable");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "state_file_malformed");
                None
            }
        }
    }

    /// Write `value` to `name` through a sibling temp file and a rename.
    fn write(&self, name: &str, value: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!(".{name}.tmp"));
        {
            let mut f = fs::File::create(&tmp)?;
            serde_json::to_writer_pretty(&mut f, value)?;
            f.write_all(b"\n")?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "state_file_written");
        Ok(())
    }
}

/// Keep the string-valued members of a JSON object.
fn string_map(v: Value) -> Option<BTreeMap<String, String>> {
    let Value::Object(obj) = v else {
        warn!("mappings_not_an_object");
        return None;
    };
    Some(
        obj.into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect(),
    )
}

impl Store for JsonFileStore {
    fn load(&self) -> StoredState {
        let entries = self.read(ENTRIES_FILE).and_then(|v| match v {
            Value::Array(items) => Some(items),
            _ => {
                warn!("entries_not_an_array");
                None
            }
        });
        let mappings = self.read(MAPPINGS_FILE).and_then(string_map);
        StoredState { entries, mappings }
    }

    fn save_entries(&self, entries: &[ButtonEntry]) -> Result<()> {
        self.write(ENTRIES_FILE, &serde_json::to_value(entries)?)
    }

    fn save_mappings(&self, mappings: &BTreeMap<String, String>) -> Result<()> {
        self.write(MAPPINGS_FILE, &serde_json::to_value(mappings)?)
    }
}

/// In-memory store. Clones share state, so a test can keep a handle and
/// inspect what the table wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Current contents.
    state: Arc<Mutex<StoredState>>,
    /// Number of saves of each record, entries then mappings.
    saves: Arc<Mutex<(usize, usize)>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with `state`.
    pub fn with_state(state: StoredState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            saves: Arc::default(),
        }
    }

    /// Current contents.
    pub fn state(&self) -> StoredState {
        self.state.lock().clone()
    }

    /// How many times the entry list was saved.
    pub fn entry_saves(&self) -> usize {
        self.saves.lock().0
    }

    /// How many times the mapping table was saved.
    pub fn mapping_saves(&self) -> usize {
        self.saves.lock().1
    }
}

impl Store for MemoryStore {
    fn load(&self) -> StoredState {
        self.state()
    }

    fn save_entries(&self, entries: &[ButtonEntry]) -> Result<()> {
        let items = entries
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        self.state.lock().entries = Some(items);
        self.saves.lock().0 += 1;
        Ok(())
    }

    fn save_mappings(&self, mappings: &BTreeMap<String, String>) -> Result<()> {
        self.state.lock().mappings = Some(mappings.clone());
        self.saves.lock().1 += 1;
        Ok(())
    }
}
