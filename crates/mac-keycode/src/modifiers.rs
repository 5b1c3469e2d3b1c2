use bitflags::bitflags;

use crate::Key;

bitflags! {
    /// Modifier state, laid out exactly like the matching CGEventFlags bits.
    ///
    /// Only the bits that participate in triggers are named; everything else
    /// in a raw flags word (caps lock, numeric pad, non-coalesced, device
    /// dependent bits) is dropped by [`Modifiers::from_cg_flags`].
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
    pub struct Modifiers: u64 {
        /// `kCGEventFlagMaskShift`
        const SHIFT = 1 << 17;
        /// `kCGEventFlagMaskControl`
        const CONTROL = 1 << 18;
        /// `kCGEventFlagMaskAlternate`
        const OPTION = 1 << 19;
        /// `kCGEventFlagMaskCommand`
        const COMMAND = 1 << 20;
        /// `kCGEventFlagMaskSecondaryFn`
        const FUNCTION = 1 << 23;
    }
}

/// Display order and label for each modifier.
const LABELS: [(Modifiers, &str); 5] = [
    (Modifiers::CONTROL, "Ctrl"),
    (Modifiers::OPTION, "Option"),
    (Modifiers::SHIFT, "Shift"),
    (Modifiers::COMMAND, "Cmd"),
    (Modifiers::FUNCTION, "Fn"),
];

impl Modifiers {
    /// Construct a modifier set from a raw macOS CGEventFlags word.
    pub fn from_cg_flags(flags: u64) -> Self {
        Self::from_bits_truncate(flags)
    }

    /// Construct a modifier set from the mask stored in the
    /// `com.apple.symbolichotkeys` preferences.
    ///
    /// That mask uses the same 17..=20 bit positions as CGEventFlags but never
    /// carries Fn.
    pub fn from_symbolic_mask(mask: i64) -> Self {
        let bits = u64::try_from(mask).unwrap_or(0);
        Self::from_bits_truncate(bits) - Self::FUNCTION
    }

    /// True when Command, Control, Option or Fn is held.
    pub fn has_chord_modifier(self) -> bool {
        self.intersects(Self::COMMAND | Self::CONTROL | Self::OPTION | Self::FUNCTION)
    }

    /// Labels in canonical order: Ctrl, Option, Shift, Cmd, Fn.
    pub fn labels(self) -> Vec<&'static str> {
        LABELS
            .iter()
            .filter(|(m, _)| self.contains(*m))
            .map(|(_, l)| *l)
            .collect()
    }

    /// Left-side modifier keys to press, in posting order, for this set.
    ///
    /// Fn has no posting key here; synthesized events carry it as a flag only.
    pub fn posting_keys(self) -> Vec<Key> {
        let mut out = Vec::new();
        if self.contains(Self::COMMAND) {
            out.push(Key::Command);
        }
        if self.contains(Self::SHIFT) {
            out.push(Key::Shift);
        }
        if self.contains(Self::OPTION) {
            out.push(Key::Option);
        }
        if self.contains(Self::CONTROL) {
            out.push(Key::Control);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cg_flags_drop_unrelated_bits() {
        // caps lock (16), numeric pad (21), non-coalesced (8)
        let raw = (1 << 16) | (1 << 21) | (1 << 8) | (1 << 20) | (1 << 17);
        let m = Modifiers::from_cg_flags(raw);
        assert_eq!(m, Modifiers::COMMAND | Modifiers::SHIFT);
    }

    #[test]
    fn symbolic_mask_maps_bits() {
        let m = Modifiers::from_symbolic_mask((1 << 18) | (1 << 23));
        assert_eq!(m, Modifiers::CONTROL);
        assert_eq!(Modifiers::from_symbolic_mask(-1), Modifiers::empty());
    }

    #[test]
    fn labels_use_canonical_order() {
        let m = Modifiers::FUNCTION | Modifiers::COMMAND | Modifiers::CONTROL;
        assert_eq!(m.labels(), vec!["Ctrl", "Cmd", "Fn"]);
    }

    #[test]
    fn shift_alone_is_not_a_chord_modifier() {
        assert!(!Modifiers::SHIFT.has_chord_modifier());
        assert!(!Modifiers::empty().has_chord_modifier());
        assert!(Modifiers::FUNCTION.has_chord_modifier());
        assert!((Modifiers::SHIFT | Modifiers::OPTION).has_chord_modifier());
    }

    #[test]
    fn posting_order_is_command_first() {
        let m = Modifiers::CONTROL | Modifiers::COMMAND | Modifiers::SHIFT;
        assert_eq!(m.posting_keys(), vec![Key::Command, Key::Shift, Key::Control]);
    }
}
