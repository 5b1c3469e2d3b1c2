use std::fmt;

use crate::{Key, Modifiers};

/// A key chord: a set of modifiers plus a single key.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Chord {
    /// Modifier flags held down for this chord.
    pub modifiers: Modifiers,
    /// The non-modifier key for this chord.
    pub key: Key,
}

impl Chord {
    /// A chord with the given key and modifiers.
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { modifiers, key }
    }

    /// A bare key with no modifiers.
    pub const fn bare(key: Key) -> Self {
        Self::new(key, Modifiers::empty())
    }

    /// Returns a copy with `extra` modifiers added.
    pub fn with(self, extra: Modifiers) -> Self {
        Self::new(self.key, self.modifiers | extra)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.modifiers.labels();
        parts.push(self.key.label());
        write!(f, "{}", parts.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_orders_modifiers() {
        let c = Chord::new(Key::Z, Modifiers::SHIFT | Modifiers::COMMAND);
        assert_eq!(c.to_string(), "Shift+Cmd+Z");
        assert_eq!(Chord::bare(Key::Escape).to_string(), "Esc");
    }

    #[test]
    fn with_adds_flags() {
        let c = Chord::new(Key::Grave, Modifiers::COMMAND).with(Modifiers::SHIFT);
        assert_eq!(c.modifiers, Modifiers::COMMAND | Modifiers::SHIFT);
        assert_eq!(c.key, Key::Grave);
    }
}
