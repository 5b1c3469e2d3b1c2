//! Raw event to trigger classification.

use mac_eventtap::{EventKind, RawEvent};

use crate::{
    Trigger,
    trigger::{is_shortcut_eligible, normalize_modifiers},
};

/// Which edge of the input an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Press.
    Down,
    /// Release.
    Up,
    /// Pointer moved with the button held.
    Dragged,
}

/// Where the trigger came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// A mouse button.
    Mouse,
    /// An ordinary key.
    Keyboard,
    /// A system-defined media key.
    System,
}

/// A raw event resolved to a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// The trigger identity.
    pub trigger: Trigger,
    /// Press, release or drag.
    pub phase: Phase,
    /// Input family.
    pub source: Source,
    /// False for key events that may not become shortcut triggers. Such
    /// events are never routed to the mapping table.
    pub eligible: bool,
}

impl Classified {
    /// True for presses.
    pub fn is_down(&self) -> bool {
        self.phase == Phase::Down
    }
}

/// Resolve `ev` to a trigger.
///
/// Returns `None` for events that carry no trigger identity at all: tap
/// notices, unknown types, and system-defined events that are not media key
/// transitions.
pub fn classify(ev: &RawEvent) -> Option<Classified> {
    let (trigger, phase, source, eligible) = match ev.kind {
        EventKind::MouseDown => (Trigger::mouse(ev.code), Phase::Down, Source::Mouse, true),
        EventKind::MouseUp => (Trigger::mouse(ev.code), Phase::Up, Source::Mouse, true),
        EventKind::MouseDragged => (Trigger::mouse(ev.code), Phase::Dragged, Source::Mouse, true),
        EventKind::KeyDown | EventKind::KeyUp => {
            let mods = normalize_modifiers(ev.flags, ev.code);
            let phase = if ev.kind == EventKind::KeyDown {
                Phase::Down
            } else {
                Phase::Up
            };
            let eligible = is_shortcut_eligible(ev.code, mods);
            (Trigger::shortcut(ev.code, mods), phase, Source::Keyboard, eligible)
        }
        EventKind::SystemDefined { .. } => {
            let sys = ev.system_key()?;
            let code = sys.key.pseudo_code();
            let mods = normalize_modifiers(ev.flags, code);
            let phase = if sys.down { Phase::Down } else { Phase::Up };
            (Trigger::shortcut(code, mods), phase, Source::System, true)
        }
        EventKind::TapDisabled(_) | EventKind::Other(_) => return None,
    };
    Some(Classified {
        trigger,
        phase,
        source,
        eligible,
    })
}

#[cfg(test)]
mod tests {
    use mac_eventtap::DisableReason;
    use mac_keycode::{Key, Modifiers, SystemKey};

    use super::*;

    fn key(down: bool, k: Key, mods: Modifiers) -> RawEvent {
        RawEvent::key(down, i64::from(k.scancode()), mods.bits(), 0)
    }

    #[test]
    fn mouse_events_map_to_buttons() {
        let c = classify(&RawEvent::mouse(EventKind::MouseDown, 3, 5)).unwrap();
        assert_eq!(c.trigger, Trigger::mouse(3));
        assert!(c.is_down());
        assert_eq!(c.source, Source::Mouse);
        let d = classify(&RawEvent::mouse(EventKind::MouseDragged, 4, 5)).unwrap();
        assert_eq!(d.phase, Phase::Dragged);
    }

    #[test]
    fn keys_carry_normalized_modifiers_and_eligibility() {
        let c = classify(&key(true, Key::C, Modifiers::COMMAND)).unwrap();
        assert_eq!(c.trigger, Trigger::shortcut(8, Modifiers::COMMAND));
        assert!(c.eligible);

        let a = classify(&key(true, Key::A, Modifiers::SHIFT)).unwrap();
        assert!(!a.eligible);

        let f = classify(&key(false, Key::Function, Modifiers::FUNCTION)).unwrap();
        assert_eq!(f.trigger, Trigger::shortcut(63, Modifiers::empty()));
        assert_eq!(f.phase, Phase::Up);
        assert!(f.eligible);
    }

    #[test]
    fn system_defined_media_keys() {
        let data1 = SystemKey::PLAY.encode_payload(true);
        let ev = RawEvent::system(8, data1, Modifiers::SHIFT.bits(), 0);
        let c = classify(&ev).unwrap();
        assert_eq!(c.trigger, Trigger::system(SystemKey::PLAY, Modifiers::SHIFT));
        assert_eq!(c.source, Source::System);
        assert!(c.is_down());

        assert!(classify(&RawEvent::system(7, data1, 0, 0)).is_none());
        assert!(classify(&RawEvent::system(8, 0x0010_0C00, 0, 0)).is_none());
    }

    #[test]
    fn notices_are_not_triggers() {
        let mut ev = RawEvent::mouse(EventKind::TapDisabled(DisableReason::Timeout), 0, 0);
        assert!(classify(&ev).is_none());
        ev.kind = EventKind::Other(22);
        assert!(classify(&ev).is_none());
    }
}
