//! System-defined auxiliary keys (media, volume, brightness).
//!
//! macOS delivers these as `NSEventTypeSystemDefined` events with subtype 8.
//! The key type and its pressed/released state are packed into `data1`:
//!
//! ```text
//! data1 = (key_type << 16) | (state << 8)      state: 0xA down, 0xB up
//! ```
//!
//! To share one integer space with ordinary keycodes, a system key is
//! addressed by the pseudo code `SYSTEM_KEY_CODE_OFFSET + key_type`.

/// Offset added to a system key type to form its pseudo keycode.
pub const SYSTEM_KEY_CODE_OFFSET: i64 = 10_000;

/// `NX_SUBTYPE_AUX_CONTROL_BUTTONS`: the subtype carrying media keys.
pub const SYSTEM_DEFINED_AUX_SUBTYPE: i16 = 8;

/// Key state nibble for a press.
const STATE_DOWN: i64 = 0xA;
/// Key state nibble for a release.
const STATE_UP: i64 = 0xB;

/// An `NX_KEYTYPE_*` auxiliary key.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SystemKey(pub u16);

impl SystemKey {
    /// `NX_KEYTYPE_SOUND_UP`
    pub const VOLUME_UP: Self = Self(0);
    /// `NX_KEYTYPE_SOUND_DOWN`
    pub const VOLUME_DOWN: Self = Self(1);
    /// `NX_KEYTYPE_BRIGHTNESS_UP`
    pub const BRIGHTNESS_UP: Self = Self(2);
    /// `NX_KEYTYPE_BRIGHTNESS_DOWN`
    pub const BRIGHTNESS_DOWN: Self = Self(3);
    /// `NX_KEYTYPE_MUTE`
    pub const MUTE: Self = Self(7);
    /// `NX_KEYTYPE_VIDMIRROR`
    pub const MIRROR_DISPLAY: Self = Self(10);
    /// `NX_KEYTYPE_PLAY`
    pub const PLAY: Self = Self(16);
    /// `NX_KEYTYPE_NEXT`
    pub const NEXT: Self = Self(17);
    /// `NX_KEYTYPE_PREVIOUS`
    pub const PREVIOUS: Self = Self(18);
    /// `NX_KEYTYPE_FAST`
    pub const FAST: Self = Self(19);
    /// `NX_KEYTYPE_REWIND`
    pub const REWIND: Self = Self(20);

    /// The pseudo keycode this key occupies in the trigger code space.
    pub fn pseudo_code(self) -> i64 {
        SYSTEM_KEY_CODE_OFFSET + i64::from(self.0)
    }

    /// Inverse of [`SystemKey::pseudo_code`]; `None` below the offset.
    pub fn from_pseudo_code(code: i64) -> Option<Self> {
        if code < SYSTEM_KEY_CODE_OFFSET {
            return None;
        }
        u16::try_from(code - SYSTEM_KEY_CODE_OFFSET).ok().map(Self)
    }

    /// Human-readable label.
    pub fn label(self) -> String {
        let s = match self {
            Self::VOLUME_UP => "Volume Up",
            Self::VOLUME_DOWN => "Volume Down",
            Self::BRIGHTNESS_UP => "Brightness Up",
            Self::BRIGHTNESS_DOWN => "Brightness Down",
            Self::MUTE => "Mute",
            Self::MIRROR_DISPLAY => "Mirror Display",
            Self::PLAY => "Play/Pause",
            Self::NEXT => "Next Track",
            Self::PREVIOUS => "Previous Track",
            Self::FAST => "Fast Forward",
            Self::REWIND => "Rewind",
            Self(other) => return format!("System Key {other}"),
        };
        s.to_string()
    }

    /// Pack a press or release of this key into a `data1` payload.
    pub fn encode_payload(self, down: bool) -> i64 {
        let state = if down { STATE_DOWN } else { STATE_UP };
        (i64::from(self.0) << 16) | (state << 8)
    }
}

/// A decoded system-defined key transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SystemKeyEvent {
    /// Which auxiliary key.
    pub key: SystemKey,
    /// True for the press, false for the release.
    pub down: bool,
}

impl SystemKeyEvent {
    /// Decode a system-defined event payload.
    ///
    /// Returns `None` for other subtypes and for state values that are neither
    /// a press nor a release.
    pub fn decode(subtype: i16, data1: i64) -> Option<Self> {
        if subtype != SYSTEM_DEFINED_AUX_SUBTYPE {
            return None;
        }
        let key_type = (data1 & 0xFFFF_0000) >> 16;
        let state = (data1 & 0x0000_FF00) >> 8;
        let down = match state {
            STATE_DOWN => true,
            STATE_UP => false,
            _ => return None,
        };
        let key = SystemKey(u16::try_from(key_type).ok()?);
        Some(Self { key, down })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_play_press_and_release() {
        let down = SystemKeyEvent::decode(8, 0x0010_0A00).expect("down");
        assert_eq!(down.key, SystemKey::PLAY);
        assert!(down.down);
        let up = SystemKeyEvent::decode(8, 0x0010_0B00).expect("up");
        assert!(!up.down);
    }

    #[test]
    fn rejects_other_subtypes_and_states() {
        assert_eq!(SystemKeyEvent::decode(7, 0x0010_0A00), None);
        assert_eq!(SystemKeyEvent::decode(8, 0x0010_0C00), None);
    }

    #[test]
    fn low_byte_repeat_flag_is_ignored() {
        let ev = SystemKeyEvent::decode(8, 0x0000_0A01).expect("decode");
        assert_eq!(ev.key, SystemKey::VOLUME_UP);
        assert!(ev.down);
    }

    #[test]
    fn payload_encoding_decodes_back() {
        let data1 = SystemKey::MUTE.encode_payload(false);
        assert_eq!(data1, 0x0007_0B00);
        let ev = SystemKeyEvent::decode(SYSTEM_DEFINED_AUX_SUBTYPE, data1).expect("decode");
        assert_eq!(ev, SystemKeyEvent { key: SystemKey::MUTE, down: false });
    }

    #[test]
    fn pseudo_codes_sit_above_offset() {
        assert_eq!(SystemKey::NEXT.pseudo_code(), 10_017);
        assert_eq!(SystemKey::from_pseudo_code(10_017), Some(SystemKey::NEXT));
        assert_eq!(SystemKey::from_pseudo_code(9_999), None);
    }
}
