//! The event router and the user-facing operations around it.

use std::{sync::Arc, time::Duration};

use buttonmap_protocol::MappedAction;
use mac_eventtap::{EventKind, Handler, RawEvent, Rect, Verdict};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::{
    ActionExecutor, AddEntryError, ButtonEntry, CaptureStep, CommitError, DuplicateSuppressor,
    LearnCapture, MapError, MappingTable, Store, Trigger, UiEvent, UiSink, classify,
    suppress::DEFAULT_DUPLICATE_WINDOW,
};

/// Tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Window within which a second, different trigger is not dispatched.
    pub duplicate_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
        }
    }
}

/// The router's answer for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routed {
    /// What the tap should do with the event.
    pub verdict: Verdict,
    /// Action to perform, if any.
    pub dispatch: Option<MappedAction>,
}

impl Routed {
    /// Forward the event.
    const PASS: Self = Self {
        verdict: Verdict::Pass,
        dispatch: None,
    };

    /// Drop the event.
    const SWALLOW: Self = Self {
        verdict: Verdict::Swallow,
        dispatch: None,
    };

    /// A bare verdict.
    fn verdict(verdict: Verdict) -> Self {
        Self {
            verdict,
            dispatch: None,
        }
    }
}

/// Owns all mutable state: the table, duplicate tracking and the learn
/// session.
pub struct Engine {
    /// Entries and mappings.
    table: MappingTable,
    /// Last dispatch, for duplicate damping.
    suppressor: DuplicateSuppressor,
    /// The open learn session.
    capture: Option<LearnCapture>,
    /// UI notifications.
    ui: Arc<dyn UiSink>,
}

impl Engine {
    /// An engine over an already loaded table.
    pub fn new(table: MappingTable, ui: Arc<dyn UiSink>, config: EngineConfig) -> Self {
        Self {
            table,
            suppressor: DuplicateSuppressor::new(config.duplicate_window),
            capture: None,
            ui,
        }
    }

    /// Load the table from `store` and build an engine over it.
    pub fn load(store: Box<dyn Store>, ui: Arc<dyn UiSink>, config: EngineConfig) -> Self {
        let table = MappingTable::load(store);
        info!(entries = table.entries().len(), "engine_loaded");
        Self::new(table, ui, config)
    }

    /// Entries and mappings.
    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Decide what to do with one event.
    ///
    /// Never blocks and never performs an action itself; the caller runs
    /// [`Routed::dispatch`] after releasing whatever guards the engine.
    pub fn route(&mut self, ev: &RawEvent) -> Routed {
        if let EventKind::TapDisabled(reason) = ev.kind {
            warn!(?reason, "event_tap_disabled_rearming");
            return Routed::verdict(Verdict::Rearm);
        }
        let classified = classify(ev);
        trace!(
            kind = ?ev.kind,
            code = ev.code,
            flags = ev.flags,
            trigger = ?classified.as_ref().map(|c| c.trigger.storage_key()),
            "raw_event"
        );

        if let Some(capture) = self.capture.as_mut() {
            let (verdict, step) = capture.observe(ev, classified.as_ref());
            match step {
                CaptureStep::Unchanged => {}
                CaptureStep::Staged(trigger) => {
                    debug!(trigger = %trigger, "capture_staged");
                    self.ui.notify(UiEvent::CaptureUpdated { trigger });
                }
                CaptureStep::Cancel => self.close_capture(false),
            }
            return Routed::verdict(verdict);
        }

        let Some(c) = classified else {
            return Routed::PASS;
        };
        if !c.eligible || c.trigger.contains_reserved_click() {
            return Routed::PASS;
        }
        let Some(entry) = self.table.entry_for_trigger(&c.trigger) else {
            return Routed::PASS;
        };
        let down = c.is_down();
        if down {
            self.ui.notify(UiEvent::Highlight {
                id: entry.id().to_string(),
            });
        }
        if entry.trigger().contains_reserved_click() {
            return Routed::PASS;
        }

        let action = self.table.action_for(entry.id());
        match action {
            MappedAction::PassThrough => Routed::PASS,
            MappedAction::Disabled => Routed::SWALLOW,
            _ if !down => Routed::SWALLOW,
            _ => {
                let key = entry.trigger().storage_key();
                if self.suppressor.should_suppress(&key, ev.timestamp) {
                    debug!(trigger = %key, %action, "duplicate_press_suppressed");
                    return Routed::SWALLOW;
                }
                self.suppressor.record(&key, ev.timestamp);
                debug!(entry = entry.id(), trigger = %key, %action, "dispatch");
                Routed {
                    verdict: Verdict::Swallow,
                    dispatch: Some(action),
                }
            }
        }
    }

    /// Route `ev` and perform any resulting action on `executor`.
    pub fn handle(&mut self, ev: &RawEvent, executor: &dyn ActionExecutor) -> Verdict {
        let routed = self.route(ev);
        if let Some(action) = routed.dispatch {
            executor.perform(action);
        }
        routed.verdict
    }

    /// Open a learn session, replacing any open one.
    pub fn begin_capture(&mut self, bounds: Option<Rect>) {
        info!(?bounds, "capture_opened");
        self.capture = Some(LearnCapture::new(bounds));
    }

    /// The open learn session.
    pub fn capture(&self) -> Option<&LearnCapture> {
        self.capture.as_ref()
    }

    /// True while a learn session is open.
    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Update the surface bounds of the open session.
    pub fn set_capture_bounds(&mut self, bounds: Option<Rect>) {
        if let Some(c) = self.capture.as_mut() {
            c.set_bounds(bounds);
        }
    }

    /// Update the typed name of the open session.
    pub fn set_capture_name(&mut self, name: &str) {
        if let Some(c) = self.capture.as_mut() {
            c.set_name(name);
        }
    }

    /// Close the open session without touching the table.
    pub fn cancel_capture(&mut self) {
        if self.capture.is_some() {
            self.close_capture(false);
        }
    }

    /// Add the staged trigger as a new entry.
    ///
    /// A rejection raises an alert and leaves the session open so the user
    /// can try another input.
    pub fn commit_capture(&mut self) -> Result<ButtonEntry, CommitError> {
        let capture = self.capture.as_ref().ok_or(CommitError::NotCapturing)?;
        let trigger = capture.staged().cloned().ok_or(CommitError::NothingCaptured)?;
        let name = capture.resolved_name().unwrap_or_default();
        let entry = self.add_entry(&name, trigger)?;
        self.close_capture(true);
        Ok(entry)
    }

    /// Validate and add an entry, raising an alert on rejection.
    pub fn add_entry(&mut self, name: &str, trigger: Trigger) -> Result<ButtonEntry, AddEntryError> {
        match self.table.add_entry(name, trigger) {
            Ok(entry) => {
                self.ui.notify(UiEvent::EntriesChanged);
                Ok(entry)
            }
            Err(e) => {
                info!(reason = %e, "entry_rejected");
                self.ui.notify(UiEvent::Alert {
                    title: e.title().to_string(),
                    text: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Remove the entry whose id or name is `needle`.
    pub fn remove_entry(&mut self, needle: &str) -> Option<ButtonEntry> {
        let id = self.table.find(needle)?.id().to_string();
        let removed = self.table.remove_entry(&id)?;
        self.ui.notify(UiEvent::EntriesChanged);
        Some(removed)
    }

    /// Assign `action` to the entry whose id or name is `needle`.
    ///
    /// Refuses an action whose System Events keystroke is the entry's own
    /// shortcut, raising an alert.
    pub fn set_action(
        &mut self,
        needle: &str,
        action: MappedAction,
    ) -> Result<ButtonEntry, MapError> {
        let unknown = || MapError::UnknownEntry(needle.to_string());
        let entry = self.table.find(needle).ok_or_else(unknown)?.clone();
        if let Some(stroke) = relaykey::scripted_stroke(action)
            && *entry.trigger() == Trigger::shortcut(i64::from(stroke.code), stroke.modifiers)
        {
            let e = MapError::SelfTriggering {
                label: entry.trigger().debug_label(),
                action: action.title().to_string(),
            };
            info!(id = entry.id(), %action, "mapping_rejected_self_triggering");
            self.ui.notify(UiEvent::Alert {
                title: e.title().to_string(),
                text: e.to_string(),
            });
            return Err(e);
        }
        if !self.table.set_action(entry.id(), action) {
            return Err(unknown());
        }
        self.ui.notify(UiEvent::MappingChanged {
            id: entry.id().to_string(),
            action,
        });
        Ok(entry)
    }

    /// End the session and tell the UI.
    fn close_capture(&mut self, committed: bool) {
        self.capture = None;
        info!(committed, "capture_closed");
        self.ui.notify(UiEvent::CaptureClosed { committed });
    }
}

/// Shared handle for driving an engine from the tap thread and from UI
/// code at the same time.
///
/// One mutex guards the engine. It is held while routing and released
/// before the executor is called.
#[derive(Clone)]
pub struct EngineHandle {
    /// The engine.
    engine: Arc<Mutex<Engine>>,
    /// Where dispatched actions go.
    executor: Arc<dyn ActionExecutor>,
}

impl EngineHandle {
    /// Wrap `engine`, sending actions to `executor`.
    pub fn new(engine: Engine, executor: Arc<dyn ActionExecutor>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            executor,
        }
    }

    /// Route one event and perform its action, if any.
    pub fn route(&self, ev: &RawEvent) -> Verdict {
        let routed = self.engine.lock().route(ev);
        if let Some(action) = routed.dispatch {
            self.executor.perform(action);
        }
        routed.verdict
    }

    /// Run `f` with exclusive access to the engine.
    ///
    /// Entry and mapping edits made in `f` write the state files before
    /// returning, and the tap thread blocks on the lock until then. Hold it
    /// for one edit at a time.
    pub fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.engine.lock())
    }

    /// A tap handler that routes through this handle.
    pub fn tap_handler(&self) -> Handler {
        let h = self.clone();
        Arc::new(move |ev: &RawEvent| h.route(ev))
    }
}

#[cfg(test)]
mod tests {
    use mac_eventtap::DisableReason;
    use mac_keycode::{Key, Modifiers, SystemKey};

    use super::*;
    use crate::{
        MemoryStore,
        test_support::{RecordingExecutor, RecordingSink},
    };

    const MS: u64 = 1_000_000;

    fn engine() -> (Engine, RecordingSink) {
        let sink = RecordingSink::default();
        let e = Engine::load(
            Box::new(MemoryStore::new()),
            Arc::new(sink.clone()),
            EngineConfig::default(),
        );
        (e, sink)
    }

    fn down(button: i64, ts: u64) -> RawEvent {
        RawEvent::mouse(EventKind::MouseDown, button, ts)
    }

    fn up(button: i64, ts: u64) -> RawEvent {
        RawEvent::mouse(EventKind::MouseUp, button, ts)
    }

    #[test]
    fn tap_disabled_rearms() {
        let (mut e, _) = engine();
        let ev = RawEvent::mouse(EventKind::TapDisabled(DisableReason::UserInput), 0, 0);
        assert_eq!(e.route(&ev).verdict, Verdict::Rearm);
    }

    #[test]
    fn unknown_and_ineligible_inputs_pass() {
        let (mut e, sink) = engine();
        assert_eq!(e.route(&down(5, 0)), Routed::PASS);
        assert_eq!(e.route(&RawEvent::key(true, 0, 0, 0)), Routed::PASS);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn actions_swallow_both_edges_and_dispatch_on_down() {
        let (mut e, sink) = engine();
        let entry = e.add_entry("Back", Trigger::mouse(3)).unwrap();
        e.set_action(entry.id(), MappedAction::NavigateBack).unwrap();

        let r = e.route(&down(3, MS));
        assert_eq!(r.verdict, Verdict::Swallow);
        assert_eq!(r.dispatch, Some(MappedAction::NavigateBack));
        assert_eq!(e.route(&up(3, 2 * MS)), Routed::SWALLOW);
        let drag = RawEvent::mouse(EventKind::MouseDragged, 3, 3 * MS);
        assert_eq!(e.route(&drag), Routed::SWALLOW);
        assert!(sink.events().contains(&UiEvent::Highlight {
            id: entry.id().to_string()
        }));
    }

    #[test]
    fn pass_through_and_disabled() {
        let (mut e, sink) = engine();
        let entry = e.add_entry("Fwd", Trigger::mouse(4)).unwrap();
        sink.clear();
        assert_eq!(e.route(&down(4, 0)), Routed::PASS);
        assert_eq!(
            sink.events(),
            vec![UiEvent::Highlight {
                id: entry.id().to_string()
            }]
        );
        assert_eq!(e.route(&up(4, 0)), Routed::PASS);

        e.set_action("Fwd", MappedAction::Disabled).unwrap();
        assert_eq!(e.route(&down(4, 0)), Routed::SWALLOW);
        assert_eq!(e.route(&up(4, 0)), Routed::SWALLOW);
    }

    #[test]
    fn action_typing_its_own_trigger_is_refused() {
        let (mut e, sink) = engine();
        let ctrl_up = Trigger::shortcut(i64::from(Key::UpArrow.scancode()), Modifiers::CONTROL);
        let entry = e.add_entry("Spaces", ctrl_up).unwrap();
        sink.clear();

        assert_eq!(
            e.set_action("Spaces", MappedAction::MissionControl),
            Err(MapError::SelfTriggering {
                label: "Shortcut Ctrl+Up".into(),
                action: MappedAction::MissionControl.title().into(),
            })
        );
        assert_eq!(e.table().action_for(entry.id()), MappedAction::PassThrough);
        assert!(matches!(
            sink.events().as_slice(),
            [UiEvent::Alert { title, .. }] if title == "Action Would Repeat Itself"
        ));

        e.set_action("Spaces", MappedAction::AppExpose).unwrap();
        assert_eq!(e.table().action_for(entry.id()), MappedAction::AppExpose);
        assert_eq!(
            e.set_action("Nope", MappedAction::Copy),
            Err(MapError::UnknownEntry("Nope".into()))
        );
    }

    #[test]
    fn second_trigger_inside_window_is_suppressed() {
        let (mut e, _) = engine();
        let a = e.add_entry("A", Trigger::mouse(3)).unwrap();
        let play = Trigger::system(SystemKey::PLAY, Modifiers::empty());
        let b = e.add_entry("B", play).unwrap();
        e.set_action(a.id(), MappedAction::Copy).unwrap();
        e.set_action(b.id(), MappedAction::PlayPause).unwrap();

        let play_down = |ts| RawEvent::system(8, SystemKey::PLAY.encode_payload(true), 0, ts);
        assert!(e.route(&down(3, 0)).dispatch.is_some());
        let r = e.route(&play_down(30 * MS));
        assert_eq!(r, Routed::SWALLOW);
        assert_eq!(e.route(&play_down(41 * MS)).dispatch, Some(MappedAction::PlayPause));
        // Repeats of the same trigger are not damped.
        assert_eq!(e.route(&play_down(42 * MS)).dispatch, Some(MappedAction::PlayPause));
    }

    #[test]
    fn shortcuts_route_by_normalized_modifiers() {
        let (mut e, _) = engine();
        let c = i64::from(Key::C.scancode());
        let entry = e.add_entry("", Trigger::shortcut(c, Modifiers::COMMAND)).unwrap();
        e.set_action(entry.id(), MappedAction::Copy).unwrap();
        let noisy = Modifiers::COMMAND.bits() | (1 << 16);
        let r = e.route(&RawEvent::key(true, c, noisy, 0));
        assert_eq!(r.dispatch, Some(MappedAction::Copy));
        let shifted = (Modifiers::COMMAND | Modifiers::SHIFT).bits();
        assert_eq!(e.route(&RawEvent::key(true, c, shifted, 0)), Routed::PASS);
    }

    #[test]
    fn capture_commit_and_reject() {
        let (mut e, sink) = engine();
        e.begin_capture(None);
        assert_eq!(e.commit_capture(), Err(CommitError::NothingCaptured));
        assert_eq!(e.route(&down(0, 0)), Routed::SWALLOW);
        assert_eq!(
            e.commit_capture(),
            Err(CommitError::Rejected(AddEntryError::ReservedButton))
        );
        assert!(e.is_capturing());
        assert!(sink.events().contains(&UiEvent::Alert {
            title: "Reserved Buttons".into(),
            text: "Left and right click are reserved for safety and cannot be remapped.".into(),
        }));

        e.route(&down(3, 0));
        e.set_capture_name("Back");
        let entry = e.commit_capture().unwrap();
        assert_eq!(entry.name(), "Back");
        assert!(!e.is_capturing());
        assert_eq!(e.commit_capture(), Err(CommitError::NotCapturing));
        assert_eq!(
            sink.events().last(),
            Some(&UiEvent::CaptureClosed { committed: true })
        );
    }

    #[test]
    fn escape_cancels_capture_without_touching_table() {
        let (mut e, sink) = engine();
        e.begin_capture(None);
        e.route(&down(3, 0));
        let esc = RawEvent::key(true, i64::from(Key::Escape.scancode()), 0, 0);
        assert_eq!(e.route(&esc), Routed::SWALLOW);
        assert!(!e.is_capturing());
        assert!(e.table().entries().is_empty());
        assert_eq!(
            sink.events().last(),
            Some(&UiEvent::CaptureClosed { committed: false })
        );
    }

    #[test]
    fn capture_preempts_mapped_triggers() {
        let (mut e, _) = engine();
        let entry = e.add_entry("Back", Trigger::mouse(3)).unwrap();
        e.set_action(entry.id(), MappedAction::Copy).unwrap();
        e.begin_capture(None);
        assert_eq!(e.route(&down(3, 0)), Routed::SWALLOW);
        e.cancel_capture();
        assert_eq!(e.route(&down(3, 0)).dispatch, Some(MappedAction::Copy));
    }

    #[test]
    fn handle_runs_executor_outside_the_lock() {
        let (mut e, _) = engine();
        let entry = e.add_entry("Back", Trigger::mouse(3)).unwrap();
        e.set_action(entry.id(), MappedAction::Copy).unwrap();
        let exec = Arc::new(RecordingExecutor::default());
        let handle = EngineHandle::new(e, exec.clone());
        let tap = handle.tap_handler();
        assert_eq!(tap(&down(3, 0)), Verdict::Swallow);
        assert_eq!(tap(&up(3, 1)), Verdict::Swallow);
        assert_eq!(exec.performed(), vec![MappedAction::Copy]);
        assert_eq!(handle.with(|e| e.table().entries().len()), 1);
    }
}
