//! Reading the user's system keyboard shortcuts.
//!
//! macOS keeps them in the `com.apple.symbolichotkeys` preferences domain,
//! under `AppleSymbolicHotKeys`:
//!
//! ```text
//! { "32": { enabled = 1; value = { parameters = (65535, 126, 8650752); type = standard; }; }, ... }
//! ```
//!
//! `parameters[1]` is the virtual keycode and `parameters[2]` the modifier
//! mask. The platform layer converts the property list into [`Plist`]; the
//! lookup below is plain Rust.

use std::collections::BTreeMap;

use mac_keycode::Modifiers;

use crate::recipe::Stroke;

/// The subset of property list values the lookup needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Plist {
    /// A dictionary with string keys.
    Dict(BTreeMap<String, Plist>),
    /// An array.
    Array(Vec<Plist>),
    /// An integer number.
    Int(i64),
    /// A boolean.
    Bool(bool),
    /// A string.
    Str(String),
    /// Anything else.
    Other,
}

impl Plist {
    /// Dictionary member `key`.
    fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Dict(d) => d.get(key),
            _ => None,
        }
    }

    /// Integer value; booleans count as 0 and 1.
    fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }
}

/// Find symbolic hot key `id` in the `AppleSymbolicHotKeys` dictionary.
///
/// Returns `None` when the id is missing, explicitly disabled, or its
/// parameters are malformed.
pub fn lookup(hotkeys: &Plist, id: u32) -> Option<Stroke> {
    let entry = hotkeys.get(&id.to_string())?;
    if entry.get("enabled").and_then(Plist::as_int) == Some(0) {
        return None;
    }
    let Plist::Array(params) = entry.get("value")?.get("parameters")? else {
        return None;
    };
    if params.len() < 3 {
        return None;
    }
    let code = u16::try_from(params[1].as_int()?).ok()?;
    let mask = params[2].as_int()?;
    Some(Stroke::new(code, Modifiers::from_symbolic_mask(mask)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(items: Vec<(&str, Plist)>) -> Plist {
        Plist::Dict(items.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn hotkey(enabled: Option<Plist>, params: Vec<i64>) -> Plist {
        let mut items = vec![(
            "value",
            dict(vec![(
                "parameters",
                Plist::Array(params.into_iter().map(Plist::Int).collect()),
            )]),
        )];
        if let Some(e) = enabled {
            items.push(("enabled", e));
        }
        dict(items)
    }

    #[test]
    fn finds_enabled_entry() {
        let all = dict(vec![(
            "32",
            hotkey(Some(Plist::Bool(true)), vec![65535, 126, 1 << 18]),
        )]);
        assert_eq!(
            lookup(&all, 32),
            Some(Stroke::new(126, Modifiers::CONTROL))
        );
        assert_eq!(lookup(&all, 33), None);
    }

    #[test]
    fn missing_enabled_counts_as_enabled() {
        let all = dict(vec![("79", hotkey(None, vec![65535, 123, 1 << 20]))]);
        assert_eq!(
            lookup(&all, 79),
            Some(Stroke::new(123, Modifiers::COMMAND))
        );
    }

    #[test]
    fn disabled_or_malformed_entries_are_skipped() {
        let all = dict(vec![
            ("27", hotkey(Some(Plist::Int(0)), vec![96, 50, 1 << 20])),
            ("33", hotkey(Some(Plist::Int(1)), vec![65535, 125])),
            ("80", hotkey(Some(Plist::Int(1)), vec![65535, -4, 0])),
        ]);
        assert_eq!(lookup(&all, 27), None);
        assert_eq!(lookup(&all, 33), None);
        assert_eq!(lookup(&all, 80), None);
        assert_eq!(lookup(&Plist::Other, 27), None);
    }
}
