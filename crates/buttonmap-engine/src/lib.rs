//! Buttonmap Engine
//!
//! Recognizes triggers in the raw input stream and decides, per event,
//! whether to pass it on, swallow it, or swallow it and run an action:
//! - [`classify`] turns a [`mac_eventtap::RawEvent`] into a [`Trigger`]
//! - [`MappingTable`] holds the learned [`ButtonEntry`]s and their actions,
//!   persisted through a [`Store`]
//! - [`DuplicateSuppressor`] damps double deliveries of one press
//! - [`LearnCapture`] is the add-a-new-entry session
//! - [`Engine`] ties them together behind [`Engine::route`]
//!
//! The engine never performs actions itself. [`EngineHandle`] routes under a
//! lock and hands the chosen action to an [`ActionExecutor`] once the lock
//! is released.

mod capture;
mod classify;
mod engine;
mod entry;
mod error;
mod executor;
mod notify;
mod store;
mod suppress;
mod table;
pub mod test_support;
pub mod trigger;

pub use capture::{CaptureStep, LearnCapture};
pub use classify::{Classified, Phase, Source, classify};
pub use engine::{Engine, EngineConfig, EngineHandle, Routed};
pub use entry::{ButtonEntry, MissingTrigger};
pub use error::{AddEntryError, CommitError, Error, MapError, Result};
pub use executor::ActionExecutor;
pub use notify::{NullSink, UiEvent, UiSink};
pub use store::{ENTRIES_FILE, JsonFileStore, MAPPINGS_FILE, MemoryStore, Store, StoredState};
pub use suppress::{DEFAULT_DUPLICATE_WINDOW, DuplicateSuppressor};
pub use table::{MappingTable, decode_entries, migrate_mappings, sanitize_entries};
pub use trigger::{LegacyCombo, Trigger};
