//! mac-keycode: Virtual keycodes, modifier flags, and media keys for macOS.
//!
//! - `Key`: Enum of the macOS virtual keycodes we name (`kVK_*` values from
//!   `HIToolbox/Events.h`). Values are the exact hardware codes and the enum
//!   is `repr(u16)`.
//! - `Modifiers`: Bitset over the CGEventFlags bits we care about (Control,
//!   Option, Shift, Command, Fn).
//! - `SystemKey`: "System-defined" auxiliary keys (volume, brightness,
//!   playback) and their packed event payload.
//! - `code_label`: Human-readable label for a keycode, including the pseudo
//!   codes that system keys occupy above [`SYSTEM_KEY_CODE_OFFSET`].

mod key;
pub use key::Key;

mod modifiers;
pub use modifiers::Modifiers;

mod chord;
pub use chord::Chord;

mod system;
pub use system::{SYSTEM_DEFINED_AUX_SUBTYPE, SYSTEM_KEY_CODE_OFFSET, SystemKey, SystemKeyEvent};

/// macOS hardware virtual keycode (`kVK_*`, `NSEvent.keyCode`).
pub type Scancode = u16;

/// Returns a display label for any keycode in the trigger address space.
///
/// System-defined pseudo codes render as their media key name, known
/// keycodes render via [`Key::label`], and everything else as `Key <n>`.
pub fn code_label(code: i64) -> String {
    if let Some(sys) = SystemKey::from_pseudo_code(code) {
        return sys.label();
    }
    match u16::try_from(code).ok().and_then(Key::from_scancode) {
        Some(k) => k.label().to_string(),
        None => format!("Key {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_known_unknown_and_system() {
        assert_eq!(code_label(Key::F5.scancode() as i64), "F5");
        assert_eq!(code_label(Key::Escape.scancode() as i64), "Esc");
        assert_eq!(code_label(0x7F), "Key 127");
        assert_eq!(code_label(-3), "Key -3");
        assert_eq!(code_label(10_016), "Play/Pause");
        assert_eq!(code_label(10_042), "System Key 42");
    }
}
