//! Platform-neutral event records handed to the tap handler.

use mac_keycode::SystemKeyEvent;

/// Raw `CGEventType` values the tap subscribes to or reports.
pub mod cg_type {
    /// `kCGEventLeftMouseDown`
    pub const LEFT_MOUSE_DOWN: u32 = 1;
    /// `kCGEventLeftMouseUp`
    pub const LEFT_MOUSE_UP: u32 = 2;
    /// `kCGEventRightMouseDown`
    pub const RIGHT_MOUSE_DOWN: u32 = 3;
    /// `kCGEventRightMouseUp`
    pub const RIGHT_MOUSE_UP: u32 = 4;
    /// `kCGEventLeftMouseDragged`
    pub const LEFT_MOUSE_DRAGGED: u32 = 6;
    /// `kCGEventRightMouseDragged`
    pub const RIGHT_MOUSE_DRAGGED: u32 = 7;
    /// `kCGEventKeyDown`
    pub const KEY_DOWN: u32 = 10;
    /// `kCGEventKeyUp`
    pub const KEY_UP: u32 = 11;
    /// `NSEventTypeSystemDefined`; CoreGraphics has no name for it.
    pub const SYSTEM_DEFINED: u32 = 14;
    /// `kCGEventOtherMouseDown`
    pub const OTHER_MOUSE_DOWN: u32 = 25;
    /// `kCGEventOtherMouseUp`
    pub const OTHER_MOUSE_UP: u32 = 26;
    /// `kCGEventOtherMouseDragged`
    pub const OTHER_MOUSE_DRAGGED: u32 = 27;
    /// `kCGEventTapDisabledByTimeout`
    pub const TAP_DISABLED_BY_TIMEOUT: u32 = 0xFFFF_FFFE;
    /// `kCGEventTapDisabledByUserInput`
    pub const TAP_DISABLED_BY_USER_INPUT: u32 = 0xFFFF_FFFF;

    /// Every event type the tap listens for.
    pub const SUBSCRIBED: [u32; 12] = [
        LEFT_MOUSE_DOWN,
        LEFT_MOUSE_UP,
        LEFT_MOUSE_DRAGGED,
        RIGHT_MOUSE_DOWN,
        RIGHT_MOUSE_UP,
        RIGHT_MOUSE_DRAGGED,
        OTHER_MOUSE_DOWN,
        OTHER_MOUSE_UP,
        OTHER_MOUSE_DRAGGED,
        KEY_DOWN,
        KEY_UP,
        SYSTEM_DEFINED,
    ];

    /// The `CGEventMask` for [`SUBSCRIBED`]. Tap-disabled notices arrive
    /// regardless of the mask.
    pub fn mask() -> u64 {
        SUBSCRIBED.iter().fold(0u64, |m, t| m | (1u64 << t))
    }
}

/// Why the OS disabled the tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableReason {
    /// The callback took too long.
    Timeout,
    /// Secure input or another external interference.
    UserInput,
}

/// What kind of input an event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A mouse button went down; `code` is the button number.
    MouseDown,
    /// A mouse button went up; `code` is the button number.
    MouseUp,
    /// The pointer moved with a button held; `code` is the button number.
    MouseDragged,
    /// A key went down; `code` is the virtual keycode.
    KeyDown,
    /// A key went up; `code` is the virtual keycode.
    KeyUp,
    /// An `NSEventTypeSystemDefined` event with its raw payload.
    SystemDefined {
        /// NSEvent subtype.
        subtype: i16,
        /// NSEvent `data1`.
        data1: i64,
    },
    /// The OS switched the tap off.
    TapDisabled(DisableReason),
    /// Anything else the tap happened to see.
    Other(u32),
}

impl EventKind {
    /// Map a raw `CGEventType` to a kind.
    ///
    /// `system` is only consulted for system-defined events; it should fetch
    /// the `(subtype, data1)` payload, or `None` if it cannot be read.
    pub fn from_cg_type(etype: u32, system: impl FnOnce() -> Option<(i16, i64)>) -> Self {
        use cg_type::*;
        match etype {
            LEFT_MOUSE_DOWN | RIGHT_MOUSE_DOWN | OTHER_MOUSE_DOWN => Self::MouseDown,
            LEFT_MOUSE_UP | RIGHT_MOUSE_UP | OTHER_MOUSE_UP => Self::MouseUp,
            LEFT_MOUSE_DRAGGED | RIGHT_MOUSE_DRAGGED | OTHER_MOUSE_DRAGGED => Self::MouseDragged,
            KEY_DOWN => Self::KeyDown,
            KEY_UP => Self::KeyUp,
            SYSTEM_DEFINED => match system() {
                Some((subtype, data1)) => Self::SystemDefined { subtype, data1 },
                None => Self::Other(etype),
            },
            TAP_DISABLED_BY_TIMEOUT => Self::TapDisabled(DisableReason::Timeout),
            TAP_DISABLED_BY_USER_INPUT => Self::TapDisabled(DisableReason::UserInput),
            other => Self::Other(other),
        }
    }
}

/// A screen location in global display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

/// An axis-aligned rectangle in global display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Half-open containment test: the right and bottom edges are outside.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }
}

/// One event as seen by the tap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEvent {
    /// What happened.
    pub kind: EventKind,
    /// Mouse button number or virtual keycode; zero for other kinds.
    pub code: i64,
    /// Raw CGEventFlags word.
    pub flags: u64,
    /// Monotonic event timestamp in nanoseconds.
    pub timestamp: u64,
    /// Pointer location when the event was generated, if known.
    pub location: Option<Point>,
}

impl RawEvent {
    /// A mouse event for `button`.
    pub fn mouse(kind: EventKind, button: i64, timestamp: u64) -> Self {
        Self {
            kind,
            code: button,
            flags: 0,
            timestamp,
            location: None,
        }
    }

    /// A keyboard event for `keycode` with raw `flags`.
    pub fn key(down: bool, keycode: i64, flags: u64, timestamp: u64) -> Self {
        Self {
            kind: if down {
                EventKind::KeyDown
            } else {
                EventKind::KeyUp
            },
            code: keycode,
            flags,
            timestamp,
            location: None,
        }
    }

    /// A system-defined event carrying `data1`.
    pub fn system(subtype: i16, data1: i64, flags: u64, timestamp: u64) -> Self {
        Self {
            kind: EventKind::SystemDefined { subtype, data1 },
            code: 0,
            flags,
            timestamp,
            location: None,
        }
    }

    /// Returns a copy with the pointer location set.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.location = Some(Point { x, y });
        self
    }

    /// Decoded media key transition, for system-defined events that carry one.
    pub fn system_key(&self) -> Option<SystemKeyEvent> {
        match self.kind {
            EventKind::SystemDefined { subtype, data1 } => SystemKeyEvent::decode(subtype, data1),
            _ => None,
        }
    }
}

/// The handler's decision for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Forward the event unchanged.
    Pass,
    /// Drop the event so no application sees it.
    Swallow,
    /// Re-enable the tap, then forward the event unchanged.
    Rearm,
}

#[cfg(test)]
mod tests {
    use mac_keycode::SystemKey;

    use super::*;

    #[test]
    fn mask_covers_system_defined_and_mice() {
        let m = cg_type::mask();
        assert_ne!(m & (1 << 14), 0);
        assert_ne!(m & (1 << 25), 0);
        assert_ne!(m & (1 << 27), 0);
        assert_eq!(m & (1 << 5), 0, "plain mouse moves are not subscribed");
    }

    #[test]
    fn maps_types() {
        let none = || None;
        assert_eq!(EventKind::from_cg_type(3, none), EventKind::MouseDown);
        assert_eq!(EventKind::from_cg_type(26, none), EventKind::MouseUp);
        assert_eq!(EventKind::from_cg_type(7, none), EventKind::MouseDragged);
        assert_eq!(
            EventKind::from_cg_type(0xFFFF_FFFE, none),
            EventKind::TapDisabled(DisableReason::Timeout)
        );
        assert_eq!(EventKind::from_cg_type(14, none), EventKind::Other(14));
        assert_eq!(
            EventKind::from_cg_type(14, || Some((8, 0x0010_0A00))),
            EventKind::SystemDefined {
                subtype: 8,
                data1: 0x0010_0A00
            }
        );
    }

    #[test]
    fn system_key_decodes_payload() {
        let ev = RawEvent::system(8, SystemKey::NEXT.encode_payload(true), 0, 1);
        let sk = ev.system_key().expect("media key");
        assert_eq!(sk.key, SystemKey::NEXT);
        assert!(sk.down);
        assert_eq!(RawEvent::key(true, 0, 0, 1).system_key(), None);
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect {
            x: 10.0,
            y: 10.0,
            width: 100.0,
            height: 50.0,
        };
        assert!(r.contains(Point { x: 10.0, y: 10.0 }));
        assert!(r.contains(Point { x: 109.9, y: 59.9 }));
        assert!(!r.contains(Point { x: 110.0, y: 20.0 }));
        assert!(!r.contains(Point { x: 5.0, y: 20.0 }));
    }
}
