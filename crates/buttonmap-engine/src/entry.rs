//! Named bindings between a trigger and a stable id.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::Trigger;

/// One learned input the user can assign an action to.
///
/// The trigger is fixed for the life of the entry; pointing the same entry
/// at different hardware means removing it and learning a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub struct ButtonEntry {
    /// Opaque unique id.
    id: String,
    /// Display name.
    name: String,
    /// The input this entry stands for.
    trigger: Trigger,
}

impl ButtonEntry {
    /// A new entry with a freshly generated id.
    pub fn new(name: impl Into<String>, trigger: Trigger) -> Self {
        let id = Uuid::new_v4().to_string().to_uppercase();
        Self::with_id(id, name, trigger)
    }

    /// An entry with a known id.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            trigger,
        }
    }

    /// Stable id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound trigger.
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }
}

/// A record with neither `trigger` nor `rawButton`.
#[derive(Debug, Error)]
#[error("entry {0} has no trigger")]
pub struct MissingTrigger(pub String);

/// On-disk shape of an entry.
///
/// Old records carry only `rawButton`; mouse entries keep writing it so
/// those readers still see the button.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    /// Entry id.
    id: String,
    /// Entry name.
    name: String,
    /// Tagged trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trigger: Option<Trigger>,
    /// Legacy mouse button number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    raw_button: Option<i64>,
}

impl TryFrom<RawEntry> for ButtonEntry {
    type Error = MissingTrigger;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let trigger = match (raw.trigger, raw.raw_button) {
            (Some(t), _) => t,
            (None, Some(b)) => Trigger::mouse(b),
            (None, None) => return Err(MissingTrigger(raw.id)),
        };
        Ok(Self::with_id(raw.id, raw.name, trigger))
    }
}

impl From<ButtonEntry> for RawEntry {
    fn from(e: ButtonEntry) -> Self {
        let raw_button = e.trigger.mouse_button();
        Self {
            id: e.id,
            name: e.name,
            trigger: Some(e.trigger),
            raw_button,
        }
    }
}
