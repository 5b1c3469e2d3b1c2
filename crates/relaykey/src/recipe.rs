//! How each [`MappedAction`] is synthesized.

use buttonmap_protocol::MappedAction;
use mac_keycode::{Chord, Key, Modifiers, Scancode, SystemKey};

/// A keycode plus the modifier flags to post it with.
///
/// Unlike [`Chord`] the code is not limited to keys we have names for;
/// symbolic hot keys read from the system preferences can name any code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    /// Virtual keycode.
    pub code: Scancode,
    /// Modifier flags.
    pub modifiers: Modifiers,
}

impl Stroke {
    /// A stroke for `code` with `modifiers`.
    pub fn new(code: Scancode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// Returns a copy with `extra` modifiers added.
    pub fn with(self, extra: Modifiers) -> Self {
        Self::new(self.code, self.modifiers | extra)
    }

    /// The `osascript` source that types this stroke through System Events.
    pub fn apple_script(&self) -> String {
        let mut using = Vec::new();
        if self.modifiers.contains(Modifiers::COMMAND) {
            using.push("command down");
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            using.push("shift down");
        }
        if self.modifiers.contains(Modifiers::CONTROL) {
            using.push("control down");
        }
        if self.modifiers.contains(Modifiers::OPTION) {
            using.push("option down");
        }
        let clause = if using.is_empty() {
            String::new()
        } else {
            format!(" using {{{}}}", using.join(", "))
        };
        format!(
            "tell application \"System Events\" to key code {}{}",
            self.code, clause
        )
    }
}

impl From<Chord> for Stroke {
    fn from(c: Chord) -> Self {
        Self::new(c.key.scancode(), c.modifiers)
    }
}

/// A synthesis plan for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipe {
    /// Press and release a chord by posting key events directly.
    KeyPress(Chord),
    /// Press a chord through System Events, falling back to direct posting.
    ScriptedKeyPress(Chord),
    /// Press the first enabled system shortcut among `ids`, with `extra`
    /// modifiers added; use `fallback` when none is configured.
    ///
    /// The press goes through System Events like [`Recipe::ScriptedKeyPress`].
    /// Those keystrokes are posted by another process and carry no tag, so
    /// the tap sees them as user input. See [`scripted_stroke`].
    Symbolic {
        /// Symbolic hot key ids, in preference order.
        ids: &'static [u32],
        /// Modifiers added to the configured shortcut.
        extra: Modifiers,
        /// Chord used when no id is configured.
        fallback: Chord,
    },
    /// Tap a media key.
    Media(SystemKey),
    /// Invoke Siri.
    Siri,
}

/// Symbolic hot key ids that may be bound to "Activate Siri".
pub const SIRI_SYMBOLIC_IDS: &[u32] = &[176, 177, 178, 179];

/// Shorthand for a chord.
const fn chord(key: Key, modifiers: Modifiers) -> Chord {
    Chord::new(key, modifiers)
}

/// Command.
const CMD: Modifiers = Modifiers::COMMAND;
/// Command+Shift.
const CMD_SHIFT: Modifiers = Modifiers::COMMAND.union(Modifiers::SHIFT);
/// Command+Control.
const CMD_CTRL: Modifiers = Modifiers::COMMAND.union(Modifiers::CONTROL);
/// No modifiers.
const NONE: Modifiers = Modifiers::empty();

/// The recipe for `action`; `None` for actions that post nothing.
pub fn recipe(action: MappedAction) -> Option<Recipe> {
    use MappedAction as A;
    use Recipe::{KeyPress, Media, ScriptedKeyPress, Symbolic};

    let r = match action {
        A::PassThrough | A::Disabled => return None,
        A::MissionControl => Symbolic {
            ids: &[32],
            extra: NONE,
            fallback: chord(Key::UpArrow, Modifiers::CONTROL),
        },
        A::AppExpose => Symbolic {
            ids: &[33],
            extra: NONE,
            fallback: chord(Key::DownArrow, Modifiers::CONTROL),
        },
        A::ShowDesktop => ScriptedKeyPress(chord(Key::F11, NONE)),
        A::MoveSpaceLeft => Symbolic {
            ids: &[79, 80],
            extra: NONE,
            fallback: chord(Key::LeftArrow, Modifiers::CONTROL),
        },
        A::MoveSpaceRight => Symbolic {
            ids: &[81, 82],
            extra: NONE,
            fallback: chord(Key::RightArrow, Modifiers::CONTROL),
        },
        A::AppSwitcherNext => KeyPress(chord(Key::Tab, CMD)),
        A::AppSwitcherPrevious => KeyPress(chord(Key::Tab, CMD_SHIFT)),
        A::NextWindow => Symbolic {
            ids: &[27],
            extra: NONE,
            fallback: chord(Key::Grave, CMD),
        },
        A::PreviousWindow => Symbolic {
            ids: &[27],
            extra: Modifiers::SHIFT,
            fallback: chord(Key::Grave, CMD_SHIFT),
        },
        A::HideApp => KeyPress(chord(Key::H, CMD)),
        A::MinimizeWindow => KeyPress(chord(Key::M, CMD)),
        A::CloseWindow | A::CloseTab => KeyPress(chord(Key::W, CMD)),
        A::LockScreen => KeyPress(chord(Key::Q, CMD_CTRL)),
        A::NavigateBack => KeyPress(chord(Key::LeftBracket, CMD)),
        A::NavigateForward => KeyPress(chord(Key::RightBracket, CMD)),
        A::ReloadPage => KeyPress(chord(Key::R, CMD)),
        A::NewTab => KeyPress(chord(Key::T, CMD)),
        A::ReopenClosedTab => KeyPress(chord(Key::T, CMD_SHIFT)),
        A::Copy => KeyPress(chord(Key::C, CMD)),
        A::Paste => KeyPress(chord(Key::V, CMD)),
        A::Cut => KeyPress(chord(Key::X, CMD)),
        A::Undo => KeyPress(chord(Key::Z, CMD)),
        A::Redo => KeyPress(chord(Key::Z, CMD_SHIFT)),
        A::SelectAll => KeyPress(chord(Key::A, CMD)),
        A::Find => KeyPress(chord(Key::F, CMD)),
        A::EmojiPicker => KeyPress(chord(Key::Space, CMD_CTRL)),
        A::Escape => KeyPress(chord(Key::Escape, NONE)),
        A::ReturnKey => KeyPress(chord(Key::Return, NONE)),
        A::TabKey => KeyPress(chord(Key::Tab, NONE)),
        A::PageUp => KeyPress(chord(Key::PageUp, NONE)),
        A::PageDown => KeyPress(chord(Key::PageDown, NONE)),
        A::Home => KeyPress(chord(Key::Home, NONE)),
        A::End => KeyPress(chord(Key::End, NONE)),
        A::DeleteBackward => KeyPress(chord(Key::Delete, NONE)),
        A::DeleteForward => KeyPress(chord(Key::ForwardDelete, NONE)),
        A::PlayPause => Media(SystemKey::PLAY),
        A::NextTrack => Media(SystemKey::NEXT),
        A::PreviousTrack => Media(SystemKey::PREVIOUS),
        A::Mute => Media(SystemKey::MUTE),
        A::VolumeUp => Media(SystemKey::VOLUME_UP),
        A::VolumeDown => Media(SystemKey::VOLUME_DOWN),
        A::ScreenshotFullscreen => KeyPress(chord(Key::Digit3, CMD_SHIFT)),
        A::ScreenshotSelection => KeyPress(chord(Key::Digit4, CMD_SHIFT)),
        A::Spotlight => KeyPress(chord(Key::Space, CMD)),
        A::Siri => Recipe::Siri,
    };
    Some(r)
}

/// The stroke `action` types through System Events when the system
/// shortcuts are at their stock bindings.
///
/// Such strokes re-enter the event tap untagged, so an entry triggered by the
/// same stroke would fire itself again on every dispatch.
pub fn scripted_stroke(action: MappedAction) -> Option<Stroke> {
    match recipe(action)? {
        Recipe::ScriptedKeyPress(chord) => Some(chord.into()),
        Recipe::Symbolic { fallback, .. } => Some(fallback.into()),
        Recipe::KeyPress(_) | Recipe::Media(_) | Recipe::Siri => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_performing_action_has_a_recipe() {
        for &a in MappedAction::ALL {
            assert_eq!(recipe(a).is_some(), a.performs(), "{a}");
        }
    }

    #[test]
    fn editing_recipes() {
        assert_eq!(
            recipe(MappedAction::Copy),
            Some(Recipe::KeyPress(Chord::new(Key::C, Modifiers::COMMAND)))
        );
        assert_eq!(
            recipe(MappedAction::Redo),
            Some(Recipe::KeyPress(Chord::new(
                Key::Z,
                Modifiers::COMMAND | Modifiers::SHIFT
            )))
        );
        assert_eq!(
            recipe(MappedAction::PlayPause),
            Some(Recipe::Media(SystemKey::PLAY))
        );
    }

    #[test]
    fn previous_window_adds_shift_to_configured_shortcut() {
        match recipe(MappedAction::PreviousWindow) {
            Some(Recipe::Symbolic { ids, extra, .. }) => {
                assert_eq!(ids, &[27]);
                assert_eq!(extra, Modifiers::SHIFT);
            }
            other => panic!("unexpected recipe {other:?}"),
        }
    }

    #[test]
    fn scripted_strokes_cover_system_events_recipes() {
        assert_eq!(
            scripted_stroke(MappedAction::MissionControl),
            Some(Stroke::new(Key::UpArrow.scancode(), Modifiers::CONTROL))
        );
        assert_eq!(
            scripted_stroke(MappedAction::PreviousWindow),
            Some(Stroke::new(Key::Grave.scancode(), CMD_SHIFT))
        );
        assert_eq!(
            scripted_stroke(MappedAction::ShowDesktop),
            Some(Stroke::new(Key::F11.scancode(), NONE))
        );
        assert_eq!(scripted_stroke(MappedAction::Copy), None);
        assert_eq!(scripted_stroke(MappedAction::PlayPause), None);
        assert_eq!(scripted_stroke(MappedAction::PassThrough), None);
    }

    #[test]
    fn apple_script_lists_modifiers_in_order() {
        let s = Stroke::new(103, Modifiers::CONTROL | Modifiers::COMMAND);
        assert_eq!(
            s.apple_script(),
            "tell application \"System Events\" to key code 103 using {command down, control down}"
        );
        assert_eq!(
            Stroke::new(103, Modifiers::empty()).apple_script(),
            "tell application \"System Events\" to key code 103"
        );
    }
}
