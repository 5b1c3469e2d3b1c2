//! Trigger identities and the rules for which inputs may become one.

use std::fmt;

use mac_keycode::{Key, Modifiers, SystemKey, code_label};
use serde::{Deserialize, Serialize};

/// Highest keycode a stored shortcut may carry. System pseudo codes live
/// well below it.
pub const MAX_SHORTCUT_KEY_CODE: i64 = 50_000;

/// Something the user did that an entry can be bound to.
///
/// The serialized form is internally tagged by `"type"`:
///
/// ```json
/// {"type":"mouse","rawButton":3}
/// {"type":"shortcut","keyCode":8,"modifierFlags":1048576}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Trigger {
    /// A hardware mouse button by ordinal (0 primary, 1 secondary).
    #[serde(rename = "mouse")]
    MouseButton {
        /// Button number as reported by the OS.
        #[serde(rename = "rawButton")]
        raw_button: i64,
    },

    /// A key plus normalized modifiers. System-defined media keys use their
    /// pseudo keycode.
    #[serde(rename = "shortcut", rename_all = "camelCase")]
    Shortcut {
        /// Virtual keycode or system pseudo code.
        key_code: i64,
        /// Normalized modifier bits (CGEventFlags layout).
        modifier_flags: u64,
    },

    /// A two-step chord from older state files. Decoded so those files load,
    /// never valid.
    #[serde(rename = "combo")]
    Combo(LegacyCombo),
}

/// The parts of a legacy combo trigger. Not constructible outside decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegacyCombo {
    /// First step.
    first: Box<Trigger>,
    /// Second step.
    second: Box<Trigger>,
}

impl LegacyCombo {
    /// First step.
    pub fn first(&self) -> &Trigger {
        &self.first
    }

    /// Second step.
    pub fn second(&self) -> &Trigger {
        &self.second
    }
}

/// True for the primary and secondary click buttons.
pub fn is_reserved_button(raw_button: i64) -> bool {
    raw_button == 0 || raw_button == 1
}

/// Modifier set recorded for a key event: the chord bits of `flags`, minus
/// Fn when the key is Fn itself.
pub fn normalize_modifiers(flags: u64, key_code: i64) -> Modifiers {
    let mut mods = Modifiers::from_cg_flags(flags);
    if key_code == i64::from(Key::Function.scancode()) {
        mods.remove(Modifiers::FUNCTION);
    }
    mods
}

/// Whether a key event may become a shortcut trigger.
///
/// Bare modifier keys never qualify. System pseudo codes, Fn and F1..F20
/// always do. Anything else needs Command, Control, Option or Fn held; Shift
/// alone is plain typing.
pub fn is_shortcut_eligible(key_code: i64, modifiers: Modifiers) -> bool {
    let key = u16::try_from(key_code).ok().and_then(Key::from_scancode);
    if key.is_some_and(Key::is_modifier) {
        return false;
    }
    if SystemKey::from_pseudo_code(key_code).is_some() {
        return true;
    }
    if key.is_some_and(|k| k == Key::Function || k.is_function_key()) {
        return true;
    }
    modifiers.has_chord_modifier()
}

/// "Ctrl+Cmd+C" style label for a keycode and modifier word.
fn shortcut_label(key_code: i64, modifier_flags: u64) -> String {
    let mut parts: Vec<String> = Modifiers::from_bits_truncate(modifier_flags)
        .labels()
        .into_iter()
        .map(str::to_string)
        .collect();
    parts.push(code_label(key_code));
    parts.join("+")
}

impl Trigger {
    /// A mouse button trigger.
    pub fn mouse(raw_button: i64) -> Self {
        Self::MouseButton { raw_button }
    }

    /// A shortcut trigger for `key_code` with `modifiers`.
    pub fn shortcut(key_code: i64, modifiers: Modifiers) -> Self {
        Self::Shortcut {
            key_code,
            modifier_flags: modifiers.bits(),
        }
    }

    /// A shortcut trigger for a system-defined media key.
    pub fn system(key: SystemKey, modifiers: Modifiers) -> Self {
        Self::shortcut(key.pseudo_code(), modifiers)
    }

    /// Canonical identity string. Two triggers are the same input exactly
    /// when their keys match.
    pub fn storage_key(&self) -> String {
        match self {
            Self::MouseButton { raw_button } => format!("mouse:{raw_button}"),
            Self::Shortcut {
                key_code,
                modifier_flags,
            } => format!("shortcut:{modifier_flags}:{key_code}"),
            Self::Combo(c) => format!("combo:{}+{}", c.first.storage_key(), c.second.storage_key()),
        }
    }

    /// Label used in messages, e.g. `Mouse button 3` or `Shortcut Cmd+C`.
    pub fn debug_label(&self) -> String {
        match self {
            Self::MouseButton { raw_button } => format!("Mouse button {raw_button}"),
            Self::Shortcut {
                key_code,
                modifier_flags,
            } => format!("Shortcut {}", shortcut_label(*key_code, *modifier_flags)),
            Self::Combo(c) => format!("{} then {}", c.first.debug_label(), c.second.debug_label()),
        }
    }

    /// Entry name suggested when the user leaves the name blank.
    pub fn fallback_name(&self) -> String {
        match self {
            Self::MouseButton { raw_button } => format!("Button {raw_button}"),
            Self::Shortcut {
                key_code,
                modifier_flags,
            } => format!("Button {}", shortcut_label(*key_code, *modifier_flags)),
            Self::Combo(c) => format!("{} + {}", c.first.fallback_name(), c.second.fallback_name()),
        }
    }

    /// Mouse or shortcut.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Combo(_))
    }

    /// Whether the trigger may identify an entry.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::MouseButton { raw_button } => *raw_button >= 0,
            Self::Shortcut { key_code, .. } => (0..=MAX_SHORTCUT_KEY_CODE).contains(key_code),
            Self::Combo(_) => false,
        }
    }

    /// True if the trigger is, or has a step that is, a primary or
    /// secondary click.
    pub fn contains_reserved_click(&self) -> bool {
        match self {
            Self::MouseButton { raw_button } => is_reserved_button(*raw_button),
            Self::Shortcut { .. } => false,
            Self::Combo(c) => c.first.contains_reserved_click() || c.second.contains_reserved_click(),
        }
    }

    /// The button number for mouse triggers.
    pub fn mouse_button(&self) -> Option<i64> {
        match self {
            Self::MouseButton { raw_button } => Some(*raw_button),
            _ => None,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_label())
    }
}
