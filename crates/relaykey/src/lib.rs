//! Synthesizes the keystrokes, media keys and app launches behind each
//! [`MappedAction`].
//!
//! A [`Relay`] owns a worker thread. [`Relay::perform`] only enqueues the
//! action, so callers on the event tap thread never wait on posting, on an
//! `osascript` child, or on the deliberate key hold Siri needs.
//!
//! The actual OS work goes through the [`Poster`] trait. [`MacPoster`] posts
//! CoreGraphics events tagged with [`eventtag::BUTTONMAP_TAG`]; tests use a
//! recording poster.
#![warn(unsafe_op_in_unsafe_fn)]
use std::{sync::Arc, thread, time::Duration};

use buttonmap_protocol::MappedAction;
use crossbeam_channel::{Sender, unbounded};
use mac_keycode::{Key, Modifiers, SystemKey};
use tracing::{debug, trace, warn};

mod error;
#[cfg(target_os = "macos")]
mod mac;
mod recipe;
mod symbolic;

pub use error::{Error, Result};
#[cfg(target_os = "macos")]
pub use mac::MacPoster;
pub use recipe::{Recipe, SIRI_SYMBOLIC_IDS, Stroke, recipe, scripted_stroke};
pub use symbolic::{Plist, lookup as lookup_symbolic};

/// How long Fn is held to summon Siri when no shortcut is configured.
const SIRI_HOLD: Duration = Duration::from_millis(450);
/// Pause between releasing Fn and launching the Siri app.
const SIRI_LAUNCH_DELAY: Duration = Duration::from_millis(200);

/// Low-level event synthesis.
pub trait Poster: Send + Sync {
    /// Post one key transition with `flags` set on the event.
    fn post_key(&self, code: u16, down: bool, flags: Modifiers) -> Result<()>;
    /// Post one media key transition.
    fn post_media(&self, key: SystemKey, down: bool) -> Result<()>;
    /// Type `stroke` via System Events.
    fn post_scripted(&self, stroke: Stroke) -> Result<()>;
    /// The user's binding for symbolic hot key `id`, if enabled.
    fn symbolic_hotkey(&self, id: u32) -> Option<Stroke>;
    /// Launch the Siri application.
    fn open_siri(&self) -> Result<()>;
    /// Block the worker for `d`.
    fn sleep(&self, d: Duration) {
        thread::sleep(d);
    }
}

/// Post a full press of `stroke`: modifier downs, key down and up, modifier
/// ups in reverse order.
pub fn press(poster: &dyn Poster, stroke: Stroke) -> Result<()> {
    press_held(poster, stroke, Duration::ZERO)
}

/// Like [`press`], but keep the key down for `hold`.
pub fn press_held(poster: &dyn Poster, stroke: Stroke, hold: Duration) -> Result<()> {
    let mut held = Vec::new();
    for m in stroke.modifiers.posting_keys() {
        if poster.post_key(m.scancode(), true, stroke.modifiers).is_ok() {
            held.push(m);
        }
    }
    let res = poster
        .post_key(stroke.code, true, stroke.modifiers)
        .and_then(|()| {
            if !hold.is_zero() {
                poster.sleep(hold);
            }
            poster.post_key(stroke.code, false, stroke.modifiers)
        });
    for m in held.iter().rev() {
        let _ignored = poster.post_key(m.scancode(), false, Modifiers::empty());
    }
    res
}

/// Press `stroke` through System Events, or directly if scripting fails.
fn press_scripted(poster: &dyn Poster, stroke: Stroke) -> Result<()> {
    match poster.post_scripted(stroke) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(error = %e, "scripted_press_failed_posting_directly");
            press(poster, stroke)
        }
    }
}

/// First configured symbolic hot key among `ids`.
fn first_symbolic(poster: &dyn Poster, ids: &[u32]) -> Option<Stroke> {
    ids.iter().find_map(|id| poster.symbolic_hotkey(*id))
}

/// Run `action` synchronously on the calling thread.
pub fn execute(poster: &dyn Poster, action: MappedAction) -> Result<()> {
    let Some(r) = recipe(action) else {
        return Ok(());
    };
    trace!(%action, recipe = ?r, "execute_action");
    match r {
        Recipe::KeyPress(chord) => press(poster, chord.into()),
        Recipe::ScriptedKeyPress(chord) => press_scripted(poster, chord.into()),
        Recipe::Symbolic {
            ids,
            extra,
            fallback,
        } => {
            let stroke = first_symbolic(poster, ids)
                .map(|s| s.with(extra))
                .unwrap_or_else(|| fallback.into());
            press_scripted(poster, stroke)
        }
        Recipe::Media(key) => {
            poster.post_media(key, true)?;
            poster.post_media(key, false)
        }
        Recipe::Siri => {
            if let Some(stroke) = first_symbolic(poster, SIRI_SYMBOLIC_IDS) {
                return press_scripted(poster, stroke);
            }
            let fn_key = Stroke::new(Key::Function.scancode(), Modifiers::empty());
            let held = press_held(poster, fn_key, SIRI_HOLD);
            poster.sleep(SIRI_LAUNCH_DELAY);
            let opened = poster.open_siri();
            held.and(opened)
        }
    }
}

/// Poster used where event synthesis is unavailable. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPoster;

impl Poster for NullPoster {
    fn post_key(&self, _code: u16, _down: bool, _flags: Modifiers) -> Result<()> {
        Err(Error::Unsupported)
    }
    fn post_media(&self, _key: SystemKey, _down: bool) -> Result<()> {
        Err(Error::Unsupported)
    }
    fn post_scripted(&self, _stroke: Stroke) -> Result<()> {
        Err(Error::Unsupported)
    }
    fn symbolic_hotkey(&self, _id: u32) -> Option<Stroke> {
        None
    }
    fn open_siri(&self) -> Result<()> {
        Err(Error::Unsupported)
    }
    fn sleep(&self, _d: Duration) {}
}

/// The platform poster: [`MacPoster`] on macOS, [`NullPoster`] elsewhere.
pub fn system_poster() -> Arc<dyn Poster> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(MacPoster::new())
    }
    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(NullPoster)
    }
}

/// Background action executor.
///
/// Actions are queued and run in order on a dedicated thread. Failures are
/// logged and otherwise ignored.
pub struct Relay {
    /// Queue into the worker; `None` once shut down.
    tx: Option<Sender<MappedAction>>,
    /// Worker thread.
    worker: Option<thread::JoinHandle<()>>,
}

impl Relay {
    /// Start a relay backed by the platform poster.
    pub fn new() -> Self {
        Self::with_poster(system_poster())
    }

    /// Start a relay backed by `poster`.
    pub fn with_poster(poster: Arc<dyn Poster>) -> Self {
        let (tx, rx) = unbounded::<MappedAction>();
        let worker = thread::Builder::new()
            .name("relaykey".into())
            .spawn(move || {
                for action in rx {
                    if let Err(e) = execute(poster.as_ref(), action) {
                        warn!(%action, error = %e, "action_failed");
                    }
                }
                debug!("relay_worker_exited");
            });
        let worker = match worker {
            Ok(w) => Some(w),
            Err(e) => {
                warn!(error = %e, "relay_worker_spawn_failed");
                None
            }
        };
        Self {
            tx: Some(tx),
            worker,
        }
    }

    /// Queue `action`. Never blocks.
    pub fn perform(&self, action: MappedAction) {
        if !action.performs() {
            return;
        }
        match &self.tx {
            Some(tx) if tx.send(action).is_ok() => trace!(%action, "action_queued"),
            _ => warn!(%action, "relay_closed_dropping_action"),
        }
    }

    /// Stop accepting actions and wait for queued ones to finish.
    pub fn shutdown(&mut self) {
        self.tx = None;
        if let Some(w) = self.worker.take()
            && w.join().is_err()
        {
            warn!("relay_worker_panicked");
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.shutdown();
    }
}
