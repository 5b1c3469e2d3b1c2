//! The `Key` enum and its keycode table.
//!
//! Codes are the `kVK_*` constants from `HIToolbox/Events.h`. Variant names
//! are normalized the same way throughout: `ANSI_` is dropped and bare digits
//! become `Digit<n>`.

use serde::{Deserialize, Serialize};

use crate::Scancode;

macro_rules! key_table {
    ( $( $name:ident = $code:literal => $label:literal, )* ) => {
        /// A macOS virtual key, valued by its hardware keycode.
        #[repr(u16)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        #[allow(missing_docs)]
        pub enum Key {
            $( $name = $code, )*
        }

        impl Key {
            /// Every key in the table, in keycode order.
            pub const ALL: &'static [Self] = &[ $( Self::$name, )* ];

            /// Looks up a `Key` from a macOS scancode (hardware virtual keycode).
            pub fn from_scancode(sc: Scancode) -> Option<Self> {
                match sc {
                    $( $code => Some(Self::$name), )*
                    _ => None,
                }
            }

            /// The variant name, e.g. `LeftArrow`.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name), )*
                }
            }

            /// Short label used when rendering shortcuts, e.g. `Esc` or `C`.
            pub fn label(self) -> &'static str {
                match self {
                    $( Self::$name => $label, )*
                }
            }
        }
    };
}

key_table! {
    A = 0x00 => "A",
    S = 0x01 => "S",
    D = 0x02 => "D",
    F = 0x03 => "F",
    H = 0x04 => "H",
    G = 0x05 => "G",
    Z = 0x06 => "Z",
    X = 0x07 => "X",
    C = 0x08 => "C",
    V = 0x09 => "V",
    B = 0x0B => "B",
    Q = 0x0C => "Q",
    W = 0x0D => "W",
    E = 0x0E => "E",
    R = 0x0F => "R",
    Y = 0x10 => "Y",
    T = 0x11 => "T",
    Digit1 = 0x12 => "1",
    Digit2 = 0x13 => "2",
    Digit3 = 0x14 => "3",
    Digit4 = 0x15 => "4",
    Digit6 = 0x16 => "6",
    Digit5 = 0x17 => "5",
    Equal = 0x18 => "=",
    Digit9 = 0x19 => "9",
    Digit7 = 0x1A => "7",
    Minus = 0x1B => "-",
    Digit8 = 0x1C => "8",
    Digit0 = 0x1D => "0",
    RightBracket = 0x1E => "]",
    O = 0x1F => "O",
    U = 0x20 => "U",
    LeftBracket = 0x21 => "[",
    I = 0x22 => "I",
    P = 0x23 => "P",
    Return = 0x24 => "Return",
    L = 0x25 => "L",
    J = 0x26 => "J",
    Quote = 0x27 => "'",
    K = 0x28 => "K",
    Semicolon = 0x29 => ";",
    Backslash = 0x2A => "\\",
    Comma = 0x2B => ",",
    Slash = 0x2C => "/",
    N = 0x2D => "N",
    M = 0x2E => "M",
    Period = 0x2F => ".",
    Tab = 0x30 => "Tab",
    Space = 0x31 => "Space",
    Grave = 0x32 => "`",
    Delete = 0x33 => "Delete",
    Escape = 0x35 => "Esc",
    RightCommand = 0x36 => "Right Cmd",
    Command = 0x37 => "Cmd",
    Shift = 0x38 => "Shift",
    CapsLock = 0x39 => "Caps Lock",
    Option = 0x3A => "Option",
    Control = 0x3B => "Ctrl",
    RightShift = 0x3C => "Right Shift",
    RightOption = 0x3D => "Right Option",
    RightControl = 0x3E => "Right Ctrl",
    Function = 0x3F => "Fn",
    F17 = 0x40 => "F17",
    KeypadDecimal = 0x41 => "Keypad .",
    KeypadMultiply = 0x43 => "Keypad *",
    KeypadPlus = 0x45 => "Keypad +",
    KeypadClear = 0x47 => "Keypad Clear",
    VolumeUp = 0x48 => "Volume Up",
    VolumeDown = 0x49 => "Volume Down",
    Mute = 0x4A => "Mute",
    KeypadDivide = 0x4B => "Keypad /",
    KeypadEnter = 0x4C => "Keypad Enter",
    KeypadMinus = 0x4E => "Keypad -",
    F18 = 0x4F => "F18",
    F19 = 0x50 => "F19",
    KeypadEquals = 0x51 => "Keypad =",
    Keypad0 = 0x52 => "Keypad 0",
    Keypad1 = 0x53 => "Keypad 1",
    Keypad2 = 0x54 => "Keypad 2",
    Keypad3 = 0x55 => "Keypad 3",
    Keypad4 = 0x56 => "Keypad 4",
    Keypad5 = 0x57 => "Keypad 5",
    Keypad6 = 0x58 => "Keypad 6",
    Keypad7 = 0x59 => "Keypad 7",
    F20 = 0x5A => "F20",
    Keypad8 = 0x5B => "Keypad 8",
    Keypad9 = 0x5C => "Keypad 9",
    F5 = 0x60 => "F5",
    F6 = 0x61 => "F6",
    F7 = 0x62 => "F7",
    F3 = 0x63 => "F3",
    F8 = 0x64 => "F8",
    F9 = 0x65 => "F9",
    F11 = 0x67 => "F11",
    F13 = 0x69 => "F13",
    F16 = 0x6A => "F16",
    F14 = 0x6B => "F14",
    F10 = 0x6D => "F10",
    F12 = 0x6F => "F12",
    F15 = 0x71 => "F15",
    Help = 0x72 => "Help",
    Home = 0x73 => "Home",
    PageUp = 0x74 => "Page Up",
    ForwardDelete = 0x75 => "Forward Delete",
    F4 = 0x76 => "F4",
    End = 0x77 => "End",
    F2 = 0x78 => "F2",
    PageDown = 0x79 => "Page Down",
    F1 = 0x7A => "F1",
    LeftArrow = 0x7B => "Left",
    RightArrow = 0x7C => "Right",
    DownArrow = 0x7D => "Down",
    UpArrow = 0x7E => "Up",
}

impl Key {
    /// Returns the scancode (`kVK_*`) for this key.
    pub const fn scancode(self) -> Scancode {
        self as u16
    }

    /// True for Shift, Control, Option and Command on either side.
    ///
    /// Caps Lock and Fn are deliberately excluded: neither is a chord modifier
    /// in the sense the trigger rules use.
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::Shift
                | Self::RightShift
                | Self::Control
                | Self::RightControl
                | Self::Option
                | Self::RightOption
                | Self::Command
                | Self::RightCommand
        )
    }

    /// True for the function row keys F1 through F20.
    pub fn is_function_key(self) -> bool {
        matches!(
            self,
            Self::F1
                | Self::F2
                | Self::F3
                | Self::F4
                | Self::F5
                | Self::F6
                | Self::F7
                | Self::F8
                | Self::F9
                | Self::F10
                | Self::F11
                | Self::F12
                | Self::F13
                | Self::F14
                | Self::F15
                | Self::F16
                | Self::F17
                | Self::F18
                | Self::F19
                | Self::F20
        )
    }
}

impl TryFrom<Scancode> for Key {
    type Error = ();
    fn try_from(value: Scancode) -> Result<Self, Self::Error> {
        Self::from_scancode(value).ok_or(())
    }
}

impl From<Key> for Scancode {
    fn from(k: Key) -> Self {
        k as Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_roundtrips_every_code() {
        for &k in Key::ALL {
            assert_eq!(Key::from_scancode(k.scancode()), Some(k), "{}", k.name());
        }
        assert_eq!(Key::from_scancode(0x0A), None);
        assert_eq!(Key::from_scancode(0xFFFF), None);
    }

    #[test]
    fn hardware_codes_match_hitoolbox() {
        assert_eq!(Key::A.scancode(), 0);
        assert_eq!(Key::C.scancode(), 8);
        assert_eq!(Key::Escape.scancode(), 53);
        assert_eq!(Key::Function.scancode(), 63);
        assert_eq!(Key::F1.scancode(), 122);
        assert_eq!(Key::UpArrow.scancode(), 126);
    }

    #[test]
    fn modifier_and_function_classes() {
        assert!(Key::Shift.is_modifier());
        assert!(Key::RightCommand.is_modifier());
        assert!(!Key::Function.is_modifier());
        assert!(!Key::CapsLock.is_modifier());
        assert!(Key::F20.is_function_key());
        assert!(!Key::Function.is_function_key());
        let f_count = Key::ALL.iter().filter(|k| k.is_function_key()).count();
        assert_eq!(f_count, 20);
    }
}
