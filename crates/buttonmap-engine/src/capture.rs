//! The learn-a-new-trigger session.
//!
//! While a session is open every classified event is routed here instead of
//! to the mapping table. The session keeps at most one staged trigger; a
//! later qualifying press replaces it.

use mac_eventtap::{EventKind, Point, RawEvent, Rect, Verdict};
use mac_keycode::Key;

use crate::{
    Classified, Source, Trigger,
    trigger::{is_reserved_button, normalize_modifiers},
};

/// What a session did with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStep {
    /// Nothing changed.
    Unchanged,
    /// A new trigger was staged.
    Staged(Trigger),
    /// The user pressed Escape.
    Cancel,
}

/// State of an open learn session.
#[derive(Debug, Clone, Default)]
pub struct LearnCapture {
    /// Screen area of the capture surface; clicks inside it are not staged.
    bounds: Option<Rect>,
    /// The last trigger pressed.
    staged: Option<Trigger>,
    /// Name typed by the user.
    name: String,
}

/// True for a plain Escape press, which cancels the session.
fn is_cancel_key(ev: &RawEvent) -> bool {
    ev.kind == EventKind::KeyDown
        && ev.code == i64::from(Key::Escape.scancode())
        && !normalize_modifiers(ev.flags, ev.code).has_chord_modifier()
}

impl LearnCapture {
    /// A session whose surface occupies `bounds`.
    pub fn new(bounds: Option<Rect>) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    /// Surface bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Move or resize the surface.
    pub fn set_bounds(&mut self, bounds: Option<Rect>) {
        self.bounds = bounds;
    }

    /// The staged trigger.
    pub fn staged(&self) -> Option<&Trigger> {
        self.staged.as_ref()
    }

    /// The name as typed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the typed name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Stage `trigger`, replacing any earlier one. Non-leaf triggers are
    /// refused and leave the session untouched.
    pub fn stage(&mut self, trigger: Trigger) -> bool {
        if !trigger.is_leaf() {
            return false;
        }
        self.staged = Some(trigger);
        true
    }

    /// The name an entry would get now: the trimmed typed name, or the
    /// staged trigger's suggested name when that is blank.
    pub fn resolved_name(&self) -> Option<String> {
        let trimmed = self.name.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
        self.staged.as_ref().map(Trigger::fallback_name)
    }

    /// Whether a commit would reach the table.
    pub fn can_commit(&self) -> bool {
        self.staged.is_some() && self.resolved_name().is_some()
    }

    /// True if `at` lies within the surface.
    fn inside(&self, at: Option<Point>) -> bool {
        match (self.bounds, at) {
            (Some(b), Some(p)) => b.contains(p),
            _ => false,
        }
    }

    /// Feed one event to the session.
    ///
    /// Mouse and media key events are always swallowed. Key events are
    /// swallowed when they qualify as a shortcut or while nothing has been
    /// staged, so typing a name still works once a trigger is in hand.
    pub fn observe(&mut self, ev: &RawEvent, c: Option<&Classified>) -> (Verdict, CaptureStep) {
        if is_cancel_key(ev) {
            return (Verdict::Swallow, CaptureStep::Cancel);
        }
        let Some(c) = c else {
            return (Verdict::Pass, CaptureStep::Unchanged);
        };
        match c.source {
            Source::Mouse => {
                let step = match c.trigger.mouse_button() {
                    Some(b) if c.is_down() && !(is_reserved_button(b) && self.inside(ev.location)) => {
                        self.step(c.trigger.clone())
                    }
                    _ => CaptureStep::Unchanged,
                };
                (Verdict::Swallow, step)
            }
            Source::System => {
                let step = if c.is_down() {
                    self.step(c.trigger.clone())
                } else {
                    CaptureStep::Unchanged
                };
                (Verdict::Swallow, step)
            }
            Source::Keyboard => {
                let step = if c.eligible && c.is_down() {
                    self.step(c.trigger.clone())
                } else {
                    CaptureStep::Unchanged
                };
                let verdict = if c.eligible || self.staged.is_none() {
                    Verdict::Swallow
                } else {
                    Verdict::Pass
                };
                (verdict, step)
            }
        }
    }

    /// Stage and report.
    fn step(&mut self, t: Trigger) -> CaptureStep {
        if self.stage(t.clone()) {
            CaptureStep::Staged(t)
        } else {
            CaptureStep::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use mac_keycode::{Modifiers, SystemKey};

    use super::*;
    use crate::classify;

    fn feed(cap: &mut LearnCapture, ev: RawEvent) -> (Verdict, CaptureStep) {
        let c = classify(&ev);
        cap.observe(&ev, c.as_ref())
    }

    fn window() -> Option<Rect> {
        Some(Rect {
            x: 100.0,
            y: 100.0,
            width: 430.0,
            height: 220.0,
        })
    }

    #[test]
    fn primary_click_inside_surface_is_not_staged() {
        let mut cap = LearnCapture::new(window());
        let inside = RawEvent::mouse(EventKind::MouseDown, 0, 0).at(150.0, 150.0);
        assert_eq!(feed(&mut cap, inside), (Verdict::Swallow, CaptureStep::Unchanged));
        assert!(cap.staged().is_none());

        let outside = RawEvent::mouse(EventKind::MouseDown, 0, 0).at(10.0, 10.0);
        assert_eq!(
            feed(&mut cap, outside),
            (Verdict::Swallow, CaptureStep::Staged(Trigger::mouse(0)))
        );
    }

    #[test]
    fn aux_click_inside_surface_is_staged() {
        let mut cap = LearnCapture::new(window());
        let ev = RawEvent::mouse(EventKind::MouseDown, 3, 0).at(150.0, 150.0);
        assert_eq!(feed(&mut cap, ev).1, CaptureStep::Staged(Trigger::mouse(3)));
        let up = RawEvent::mouse(EventKind::MouseUp, 3, 0);
        assert_eq!(feed(&mut cap, up), (Verdict::Swallow, CaptureStep::Unchanged));
    }

    #[test]
    fn last_capture_wins() {
        let mut cap = LearnCapture::new(None);
        feed(&mut cap, RawEvent::mouse(EventKind::MouseDown, 3, 0));
        let play = RawEvent::system(8, SystemKey::PLAY.encode_payload(true), 0, 0);
        assert_eq!(feed(&mut cap, play).0, Verdict::Swallow);
        assert_eq!(
            cap.staged(),
            Some(&Trigger::system(SystemKey::PLAY, Modifiers::empty()))
        );
    }

    #[test]
    fn typing_passes_only_after_a_trigger_is_staged() {
        let mut cap = LearnCapture::new(None);
        let a = RawEvent::key(true, 0, 0, 0);
        assert_eq!(feed(&mut cap, a), (Verdict::Swallow, CaptureStep::Unchanged));

        let cmd_c = RawEvent::key(true, 8, Modifiers::COMMAND.bits(), 0);
        assert_eq!(
            feed(&mut cap, cmd_c),
            (
                Verdict::Swallow,
                CaptureStep::Staged(Trigger::shortcut(8, Modifiers::COMMAND))
            )
        );
        assert_eq!(feed(&mut cap, a), (Verdict::Pass, CaptureStep::Unchanged));
        let cmd_c_up = RawEvent::key(false, 8, Modifiers::COMMAND.bits(), 0);
        assert_eq!(feed(&mut cap, cmd_c_up), (Verdict::Swallow, CaptureStep::Unchanged));
    }

    #[test]
    fn escape_cancels_but_cmd_escape_is_a_trigger() {
        let mut cap = LearnCapture::new(None);
        let esc = i64::from(Key::Escape.scancode());
        assert_eq!(
            feed(&mut cap, RawEvent::key(true, esc, 0, 0)),
            (Verdict::Swallow, CaptureStep::Cancel)
        );
        let cmd_esc = RawEvent::key(true, esc, Modifiers::COMMAND.bits(), 0);
        assert_eq!(
            feed(&mut cap, cmd_esc).1,
            CaptureStep::Staged(Trigger::shortcut(esc, Modifiers::COMMAND))
        );
    }

    #[test]
    fn names_and_commit_readiness() {
        let mut cap = LearnCapture::new(None);
        assert!(!cap.can_commit());
        assert_eq!(cap.resolved_name(), None);
        cap.set_name("  ");
        assert!(cap.stage(Trigger::mouse(4)));
        assert_eq!(cap.resolved_name().as_deref(), Some("Button 4"));
        cap.set_name(" Forward ");
        assert_eq!(cap.resolved_name().as_deref(), Some("Forward"));
        assert!(cap.can_commit());
    }

    #[test]
    fn combos_are_never_staged() {
        let mut cap = LearnCapture::new(None);
        let combo: Trigger = serde_json::from_str(
            r#"{"type":"combo","first":{"type":"mouse","rawButton":3},"second":{"type":"mouse","rawButton":4}}"#,
        )
        .unwrap();
        assert!(!cap.stage(combo));
        assert!(cap.staged().is_none());
    }
}
