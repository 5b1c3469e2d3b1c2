//! The entry list and the action assigned to each entry.
//!
//! Loading repairs whatever the store holds: undecodable records and
//! entries that break the table invariants are dropped, mappings keyed by a
//! legacy button number are re-keyed to the matching entry, and the repaired
//! records are written back. Every mutation persists both records; a failed
//! save is logged and otherwise ignored.

use std::collections::{BTreeMap, HashSet};

use buttonmap_protocol::MappedAction;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{AddEntryError, ButtonEntry, Store, Trigger};

/// Decode entry records one at a time, skipping the ones that fail.
pub fn decode_entries(raw: &[Value]) -> Vec<ButtonEntry> {
    raw.iter()
        .filter_map(|v| match serde_json::from_value::<ButtonEntry>(v.clone()) {
            Ok(e) => Some(e),
            Err(e) => {
                debug!(error = %e, "entry_record_dropped");
                None
            }
        })
        .collect()
}

/// Drop entries with an empty id or name, an invalid trigger, or an id or
/// trigger already used by an earlier entry. Order is preserved.
pub fn sanitize_entries(entries: Vec<ButtonEntry>) -> Vec<ButtonEntry> {
    let mut ids = HashSet::new();
    let mut triggers = HashSet::new();
    let mut out = Vec::with_capacity(entries.len());
    for e in entries {
        let keep = !e.id().is_empty()
            && !e.name().is_empty()
            && e.trigger().is_valid()
            && !ids.contains(e.id())
            && !triggers.contains(&e.trigger().storage_key());
        if !keep {
            debug!(id = e.id(), trigger = %e.trigger().storage_key(), "entry_sanitized_away");
            continue;
        }
        ids.insert(e.id().to_string());
        triggers.insert(e.trigger().storage_key());
        out.push(e);
    }
    out
}

/// Resolve stored mappings against `entries`.
///
/// Unknown action ids are dropped. A key that is an entry id is kept. A key
/// that parses as an integer is moved to the entry bound to that mouse
/// button, unless that entry already has a mapping under its own id. Every
/// other key is dropped.
pub fn migrate_mappings(
    stored: &BTreeMap<String, String>,
    entries: &[ButtonEntry],
) -> BTreeMap<String, MappedAction> {
    let known: HashSet<&str> = entries.iter().map(ButtonEntry::id).collect();
    let mut out = BTreeMap::new();
    let mut legacy = Vec::new();
    for (key, value) in stored {
        let Some(action) = MappedAction::from_id(value) else {
            debug!(key = %key, value = %value, "mapping_unknown_action_dropped");
            continue;
        };
        if known.contains(key.as_str()) {
            out.insert(key.clone(), action);
        } else if let Ok(button) = key.parse::<i64>() {
            legacy.push((button, action));
        } else {
            debug!(key = %key, "mapping_unknown_key_dropped");
        }
    }
    for (button, action) in legacy {
        let target = entries
            .iter()
            .find(|e| e.trigger().mouse_button() == Some(button));
        match target {
            Some(e) if !out.contains_key(e.id()) => {
                debug!(button, entry = e.id(), "mapping_rekeyed_from_button");
                out.insert(e.id().to_string(), action);
            }
            _ => debug!(button, "legacy_mapping_dropped"),
        }
    }
    out
}

/// Wire form of a mapping table.
fn encode_mappings(m: &BTreeMap<String, MappedAction>) -> BTreeMap<String, String> {
    m.iter()
        .map(|(k, a)| (k.clone(), a.id().to_string()))
        .collect()
}

/// Entries, their actions, and the store they persist to.
pub struct MappingTable {
    /// Entries in creation order.
    entries: Vec<ButtonEntry>,
    /// Entry id to action. Absent means pass-through.
    mappings: BTreeMap<String, MappedAction>,
    /// Backing store.
    store: Box<dyn Store>,
}

impl MappingTable {
    /// Load and repair the table held by `store`.
    pub fn load(store: Box<dyn Store>) -> Self {
        let stored = store.load();

        let (entries, entries_dirty) = match &stored.entries {
            Some(raw) => {
                let sanitized = sanitize_entries(decode_entries(raw));
                let dirty = sanitized.len() != raw.len();
                (sanitized, dirty)
            }
            None => (Vec::new(), false),
        };

        let (mappings, mappings_dirty) = match &stored.mappings {
            Some(raw) => {
                let migrated = migrate_mappings(raw, &entries);
                let dirty = encode_mappings(&migrated) != *raw;
                (migrated, dirty)
            }
            None => (BTreeMap::new(), false),
        };

        let table = Self {
            entries,
            mappings,
            store,
        };
        if entries_dirty {
            info!(kept = table.entries.len(), "entries_repaired");
            table.save_entries();
        }
        if mappings_dirty {
            info!(kept = table.mappings.len(), "mappings_migrated");
            table.save_mappings();
        }
        table
    }

    /// Entries in creation order.
    pub fn entries(&self) -> &[ButtonEntry] {
        &self.entries
    }

    /// The stored mapping table, including pass-through assignments.
    pub fn mappings(&self) -> &BTreeMap<String, MappedAction> {
        &self.mappings
    }

    /// Entry with id `id`.
    pub fn entry(&self, id: &str) -> Option<&ButtonEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Entry bound to `trigger`.
    pub fn entry_for_trigger(&self, trigger: &Trigger) -> Option<&ButtonEntry> {
        let key = trigger.storage_key();
        self.entries
            .iter()
            .find(|e| e.trigger().storage_key() == key)
    }

    /// Entry whose id is `needle`, or failing that, whose name is.
    pub fn find(&self, needle: &str) -> Option<&ButtonEntry> {
        self.entry(needle)
            .or_else(|| self.entries.iter().find(|e| e.name() == needle))
    }

    /// Action assigned to entry `id`; pass-through when unassigned.
    pub fn action_for(&self, id: &str) -> MappedAction {
        self.mappings.get(id).copied().unwrap_or_default()
    }

    /// Validate and append a new entry mapped to pass-through.
    ///
    /// A blank `name` falls back to the trigger's suggested name.
    pub fn add_entry(&mut self, name: &str, trigger: Trigger) -> Result<ButtonEntry, AddEntryError> {
        if !trigger.is_valid() {
            return Err(AddEntryError::InvalidTrigger);
        }
        if trigger.contains_reserved_click() {
            return Err(AddEntryError::ReservedButton);
        }
        if let Some(existing) = self.entry_for_trigger(&trigger) {
            return Err(AddEntryError::Duplicate {
                label: trigger.debug_label(),
                name: existing.name().to_string(),
            });
        }
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            trigger.fallback_name()
        } else {
            trimmed.to_string()
        };
        let entry = ButtonEntry::new(name, trigger);
        info!(id = entry.id(), name = entry.name(), trigger = %entry.trigger(), "entry_added");
        self.entries.push(entry.clone());
        self.mappings
            .insert(entry.id().to_string(), MappedAction::PassThrough);
        self.save_entries();
        self.save_mappings();
        Ok(entry)
    }

    /// Delete entry `id` and its mapping.
    pub fn remove_entry(&mut self, id: &str) -> Option<ButtonEntry> {
        let idx = self.entries.iter().position(|e| e.id() == id)?;
        let removed = self.entries.remove(idx);
        self.mappings.remove(id);
        info!(id, name = removed.name(), "entry_removed");
        self.save_entries();
        self.save_mappings();
        Some(removed)
    }

    /// Assign `action` to entry `id`. Returns false for unknown ids.
    pub fn set_action(&mut self, id: &str, action: MappedAction) -> bool {
        if self.entry(id).is_none() {
            return false;
        }
        self.mappings.insert(id.to_string(), action);
        info!(id, %action, "mapping_changed");
        self.save_mappings();
        true
    }

    /// Persist the entry list, logging failure.
    fn save_entries(&self) {
        if let Err(e) = self.store.save_entries(&self.entries) {
            warn!(error = %e, "save_entries_failed");
        }
    }

    /// Persist mappings for current entries, logging failure.
    fn save_mappings(&self) {
        let payload: BTreeMap<String, String> = self
            .mappings
            .iter()
            .filter(|(id, _)| self.entry(id).is_some())
            .map(|(id, a)| (id.clone(), a.id().to_string()))
            .collect();
        if let Err(e) = self.store.save_mappings(&payload) {
            warn!(error = %e, "save_mappings_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use mac_keycode::Modifiers;
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::{MemoryStore, StoredState};

    fn entry(id: &str, name: &str, t: Trigger) -> ButtonEntry {
        ButtonEntry::with_id(id, name, t)
    }

    fn table_with(entries: Vec<Value>, mappings: Vec<(&str, &str)>) -> (MappingTable, MemoryStore) {
        let store = MemoryStore::with_state(StoredState {
            entries: Some(entries),
            mappings: Some(
                mappings
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        });
        (MappingTable::load(Box::new(store.clone())), store)
    }

    #[test]
    fn sanitize_drops_broken_and_duplicate_entries() {
        let input = vec![
            entry("a", "A", Trigger::mouse(3)),
            entry("", "Empty id", Trigger::mouse(4)),
            entry("b", "", Trigger::mouse(5)),
            entry("c", "Negative", Trigger::mouse(-2)),
            entry("a", "Same id", Trigger::mouse(6)),
            entry("d", "Same trigger", Trigger::mouse(3)),
            entry("e", "Far", Trigger::shortcut(60_000, Modifiers::COMMAND)),
            entry("f", "Ok", Trigger::shortcut(8, Modifiers::COMMAND)),
        ];
        let ids: Vec<_> = sanitize_entries(input)
            .iter()
            .map(|e| e.id().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "f"]);
    }

    #[test]
    fn load_writes_back_repaired_entries() {
        let (table, store) = table_with(
            vec![
                json!({"id": "a", "name": "Back", "rawButton": 3}),
                json!({"id": "b", "name": "Broken"}),
                json!({"id": "c", "name": "Combo", "trigger": {
                    "type": "combo",
                    "first": {"type": "mouse", "rawButton": 3},
                    "second": {"type": "mouse", "rawButton": 4},
                }}),
            ],
            vec![],
        );
        assert_eq!(table.entries().len(), 1);
        assert_eq!(store.entry_saves(), 1);
        let saved = store.state().entries.unwrap();
        assert_eq!(saved[0]["trigger"], json!({"type": "mouse", "rawButton": 3}));
    }

    #[test]
    fn clean_load_writes_nothing() {
        let (table, store) = table_with(
            vec![json!({"id": "a", "name": "Back", "trigger": {"type": "mouse", "rawButton": 3}})],
            vec![("a", "copy")],
        );
        assert_eq!(table.action_for("a"), MappedAction::Copy);
        assert_eq!(store.entry_saves(), 0);
        assert_eq!(store.mapping_saves(), 0);
    }

    #[test]
    fn legacy_button_keys_are_rekeyed() {
        let (table, store) = table_with(
            vec![
                json!({"id": "a", "name": "Back", "rawButton": 3}),
                json!({"id": "b", "name": "Fwd", "rawButton": 4}),
            ],
            vec![
                ("3", "navigateBack"),
                ("4", "copy"),
                ("b", "paste"),
                ("9", "copy"),
                ("ghost", "copy"),
                ("a", "noSuchAction"),
            ],
        );
        assert_eq!(table.action_for("a"), MappedAction::NavigateBack);
        assert_eq!(table.action_for("b"), MappedAction::Paste);
        assert_eq!(table.mappings().len(), 2);
        let saved = store.state().mappings.unwrap();
        assert_eq!(saved.get("a").map(String::as_str), Some("navigateBack"));
        assert_eq!(saved.get("b").map(String::as_str), Some("paste"));
        assert_eq!(saved.len(), 2);
    }

    #[test]
    fn add_entry_validates_in_order() {
        let (mut table, store) = table_with(vec![], vec![]);
        assert_eq!(
            table.add_entry("x", Trigger::mouse(-1)),
            Err(AddEntryError::InvalidTrigger)
        );
        assert_eq!(
            table.add_entry("x", Trigger::mouse(0)),
            Err(AddEntryError::ReservedButton)
        );
        assert_eq!(
            table.add_entry("x", Trigger::mouse(1)),
            Err(AddEntryError::ReservedButton)
        );
        let e = table.add_entry("  Back  ", Trigger::mouse(3)).unwrap();
        assert_eq!(e.name(), "Back");
        assert_eq!(table.action_for(e.id()), MappedAction::PassThrough);
        assert_eq!(
            table.add_entry("Other", Trigger::mouse(3)),
            Err(AddEntryError::Duplicate {
                label: "Mouse button 3".into(),
                name: "Back".into()
            })
        );
        assert_eq!(table.entries().len(), 1);
        let saved = store.state();
        assert_eq!(saved.entries.unwrap().len(), 1);
        assert_eq!(
            saved.mappings.unwrap().get(e.id()).map(String::as_str),
            Some("passThrough")
        );
    }

    #[test]
    fn blank_name_falls_back_to_trigger_name() {
        let (mut table, _) = table_with(vec![], vec![]);
        let e = table
            .add_entry("   ", Trigger::shortcut(8, Modifiers::COMMAND))
            .unwrap();
        assert_eq!(e.name(), "Button Cmd+C");
    }

    #[test]
    fn remove_and_reassign() {
        let (mut table, store) = table_with(vec![], vec![]);
        let e = table.add_entry("Back", Trigger::mouse(3)).unwrap();
        assert!(table.set_action(e.id(), MappedAction::Copy));
        assert!(!table.set_action("nope", MappedAction::Copy));
        assert_eq!(table.find("Back").map(ButtonEntry::id), Some(e.id()));
        assert_eq!(table.remove_entry(e.id()), Some(e.clone()));
        assert_eq!(table.remove_entry(e.id()), None);
        assert_eq!(table.action_for(e.id()), MappedAction::PassThrough);
        let saved = store.state();
        assert_eq!(saved.entries, Some(vec![]));
        assert_eq!(saved.mappings, Some(BTreeMap::new()));
    }

    fn arb_trigger() -> impl Strategy<Value = Trigger> {
        prop_oneof![
            (-2i64..8).prop_map(Trigger::mouse),
            (-5i64..60_000, 0u64..(1 << 24)).prop_map(|(key_code, modifier_flags)| {
                Trigger::Shortcut {
                    key_code,
                    modifier_flags,
                }
            }),
        ]
    }

    fn arb_entry() -> impl Strategy<Value = ButtonEntry> {
        ("[a-c]{0,2}", "[xy ]{0,2}", arb_trigger())
            .prop_map(|(id, name, t)| ButtonEntry::with_id(id, name, t))
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(entries in prop::collection::vec(arb_entry(), 0..12)) {
            let once = sanitize_entries(entries);
            let twice = sanitize_entries(once.clone());
            prop_assert_eq!(&once, &twice);
        }

        #[test]
        fn sanitized_entries_survive_a_round_trip(entries in prop::collection::vec(arb_entry(), 0..12)) {
            let clean = sanitize_entries(entries);
            let raw: Vec<Value> = clean.iter().map(|e| serde_json::to_value(e).unwrap()).collect();
            prop_assert_eq!(sanitize_entries(decode_entries(&raw)), clean);
        }
    }
}
