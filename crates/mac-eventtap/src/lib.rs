//! mac-eventtap: a session-wide CoreGraphics event tap for mouse buttons,
//! keyboard keys and system-defined (media) keys.
//!
//! The tap runs its own CFRunLoop on a dedicated thread. Every event it sees
//! is turned into a [`RawEvent`] and handed to a single handler closure, which
//! answers synchronously with a [`Verdict`]:
//!
//! - [`Verdict::Pass`] forwards the event unchanged.
//! - [`Verdict::Swallow`] returns NULL to CoreGraphics so no application sees it.
//! - [`Verdict::Rearm`] re-enables the tap (after the OS disabled it for a slow
//!   callback or secure input) and forwards the event.
//!
//! Events stamped with [`eventtag::BUTTONMAP_TAG`], or posted by this process,
//! never reach the handler.
//!
//! Only macOS has an implementation. Elsewhere [`EventTap::start`] returns
//! [`Error::Unsupported`], while the event types stay usable so the code that
//! routes events can be built and tested anywhere.

use std::{sync::Arc, thread};

use crossbeam_channel::bounded;
use tracing::{debug, warn};

mod error;
mod event;
#[cfg(target_os = "macos")]
mod sys;

pub use error::{Error, Result};
pub use event::{DisableReason, EventKind, Point, RawEvent, Rect, Verdict, cg_type};

/// Callback invoked for every event the tap observes.
pub type Handler = Arc<dyn Fn(&RawEvent) -> Verdict + Send + Sync>;

#[cfg(target_os = "macos")]
use sys::SysControl;

/// Placeholder control block on platforms without an event tap.
#[cfg(not(target_os = "macos"))]
struct SysControl;

#[cfg(not(target_os = "macos"))]
impl SysControl {
    /// No tap, nothing to stop.
    fn new() -> Self {
        Self
    }

    /// No tap, nothing to stop.
    fn stop(&self) {}
}

/// A running event tap.
///
/// Dropping the tap stops its run loop and joins the thread.
pub struct EventTap {
    /// Handler shared with the tap thread; kept for restarts.
    handler: Handler,
    /// Run loop control shared with the tap thread.
    ctrl: Arc<SysControl>,
    /// Tap thread, present while running.
    thread: Option<thread::JoinHandle<()>>,
}

impl EventTap {
    /// Create the tap and start delivering events to `handler`.
    ///
    /// Blocks until the tap is installed or has failed to install.
    pub fn start(handler: Handler) -> Result<Self> {
        let mut tap = Self {
            handler,
            ctrl: Arc::new(SysControl::new()),
            thread: None,
        };
        tap.spawn()?;
        Ok(tap)
    }

    /// Tear down the tap and install a fresh one with the same handler.
    pub fn restart(&mut self) -> Result<()> {
        debug!("event_tap_restart");
        self.stop();
        self.spawn()
    }

    /// Stop the run loop and wait for the tap thread to exit.
    pub fn stop(&mut self) {
        self.ctrl.stop();
        if let Some(t) = self.thread.take()
            && t.join().is_err()
        {
            warn!("event_tap_thread_panicked");
        }
    }

    /// Spawn the tap thread and wait for its ready signal.
    fn spawn(&mut self) -> Result<()> {
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
        let handler = self.handler.clone();
        let ctrl = self.ctrl.clone();
        let handle = thread::Builder::new()
            .name("mac-eventtap".into())
            .spawn(move || run_tap(handler, ready_tx, ctrl))
            .map_err(|e| Error::OsError(e.to_string()))?;
        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.thread = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ignored = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ignored = handle.join();
                Err(Error::EventTapStart)
            }
        }
    }
}

impl Drop for EventTap {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(target_os = "macos")]
/// Thread body: run the CoreGraphics tap until stopped.
fn run_tap(handler: Handler, ready: crossbeam_channel::Sender<Result<()>>, ctrl: Arc<SysControl>) {
    if let Err(e) = sys::run_event_loop(handler, &ready, &ctrl) {
        warn!(error = %e, "event_tap_loop_failed");
    }
}

#[cfg(not(target_os = "macos"))]
/// Thread body on unsupported platforms: report failure immediately.
fn run_tap(_handler: Handler, ready: crossbeam_channel::Sender<Result<()>>, _ctrl: Arc<SysControl>) {
    let _ignored = ready.send(Err(Error::Unsupported));
}
