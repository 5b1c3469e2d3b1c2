//! macOS event tap (CoreGraphics) integration.
//!
//! We create the tap through `CGEventTapCreate` directly instead of the
//! `core-graphics` `CGEventTap` wrapper. The wrapper hands the callback a
//! `CGEventType` enum, and system-defined events (type 14) have no variant in
//! it; receiving one would be undefined behaviour. Here the type stays a raw
//! `u32` until [`EventKind::from_cg_type`] maps it.
//!
//! Swallowing works by returning NULL from the callback. Any non-NULL return
//! (including the original event) is delivered by the OS.

use std::{
    ffi::c_void,
    panic::{AssertUnwindSafe, catch_unwind},
    process, ptr,
    sync::atomic::{AtomicPtr, Ordering},
};

use core_foundation::{
    base::TCFType,
    mach_port::{CFMachPort, CFMachPortRef},
    runloop::{CFRunLoop, kCFRunLoopCommonModes},
};
use core_graphics::{
    event::{CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement},
    geometry::CGPoint,
};
use crossbeam_channel::Sender;
use objc2::{
    Encoding, RefEncode, msg_send,
    rc::{Retained, autoreleasepool},
};
use objc2_app_kit::NSEvent;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{Error, EventKind, Handler, Point, RawEvent, Result, Verdict};

/// Opaque `CGEventRef`.
type CGEventRef = *mut c_void;
/// Opaque `CGEventTapProxy`.
type CGEventTapProxy = *mut c_void;
/// `CGEventTapCallBack`.
type TapCallback =
    unsafe extern "C" fn(CGEventTapProxy, u32, CGEventRef, *mut c_void) -> CGEventRef;

#[link(name = "CoreGraphics", kind = "framework")]
unsafe extern "C" {
    fn CGEventTapCreate(
        tap: u32,
        place: u32,
        options: u32,
        events_of_interest: u64,
        callback: TapCallback,
        user_info: *mut c_void,
    ) -> CFMachPortRef;
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
    fn CGEventGetIntegerValueField(event: CGEventRef, field: u32) -> i64;
    fn CGEventGetFlags(event: CGEventRef) -> u64;
    fn CGEventGetTimestamp(event: CGEventRef) -> u64;
    fn CGEventGetLocation(event: CGEventRef) -> CGPoint;
    fn CFMachPortInvalidate(port: CFMachPortRef);
}

// Minimal subset of CGEventField constants used by this module.
const FIELD_MOUSE_EVENT_BUTTON_NUMBER: u32 = 3;
const FIELD_KEYBOARD_EVENT_KEYCODE: u32 = 9;
const FIELD_EVENT_SOURCE_UNIX_PROCESS_ID: u32 = 41;

/// Opaque struct behind `CGEventRef`, so it can be passed through `msg_send!`.
#[repr(C)]
struct OpaqueCGEvent {
    /// Zero-sized, never constructed.
    _private: [u8; 0],
}

unsafe impl RefEncode for OpaqueCGEvent {
    const ENCODING_REF: Encoding = Encoding::Pointer(&Encoding::Struct("__CGEvent", &[]));
}

/// Shared control handle to stop the run loop from other threads.
pub struct SysControl {
    /// Run loop of the tap thread while it is running.
    rl: Mutex<Option<CFRunLoop>>,
}

impl SysControl {
    /// A control block with no run loop attached yet.
    pub fn new() -> Self {
        Self {
            rl: Mutex::new(None),
        }
    }

    /// Record the run loop of the tap thread.
    fn set_rl(&self, rl: CFRunLoop) {
        *self.rl.lock() = Some(rl);
    }

    /// Stop the tap's run loop if it is running.
    pub fn stop(&self) {
        if let Some(rl) = self.rl.lock().take() {
            rl.stop();
        }
    }
}

/// State reachable from the C callback through `user_info`.
struct TapContext {
    /// Event handler.
    handler: Handler,
    /// The tap's mach port, for re-enabling from inside the callback.
    port: AtomicPtr<c_void>,
    /// Our own pid; events from it are ignored.
    pid: i64,
}

impl TapContext {
    /// Re-enable the tap after the OS disabled it.
    fn rearm(&self) {
        let p = self.port.load(Ordering::SeqCst) as CFMachPortRef;
        if !p.is_null() {
            warn!("tap_disabled_by_os_reenabling");
            unsafe { CGEventTapEnable(p, true) };
        }
    }
}

/// Read `(subtype, data1)` of a system-defined event through NSEvent.
fn system_payload(event: CGEventRef) -> Option<(i16, i64)> {
    autoreleasepool(|_| {
        let cg = event.cast::<OpaqueCGEvent>();
        let ns: Option<Retained<NSEvent>> =
            unsafe { msg_send![NSEvent::class(), eventWithCGEvent: cg] };
        let ns = ns?;
        let (subtype, data1) = unsafe { (ns.subtype().0, ns.data1()) };
        Some((subtype, i64::try_from(data1).ok()?))
    })
}

/// Build the platform-neutral record for `event`.
fn raw_event(etype: u32, event: CGEventRef) -> RawEvent {
    let kind = EventKind::from_cg_type(etype, || system_payload(event));
    let code = match kind {
        EventKind::MouseDown | EventKind::MouseUp | EventKind::MouseDragged => unsafe {
            CGEventGetIntegerValueField(event, FIELD_MOUSE_EVENT_BUTTON_NUMBER)
        },
        EventKind::KeyDown | EventKind::KeyUp => unsafe {
            CGEventGetIntegerValueField(event, FIELD_KEYBOARD_EVENT_KEYCODE)
        },
        _ => 0,
    };
    let (flags, timestamp, loc) = unsafe {
        (
            CGEventGetFlags(event),
            CGEventGetTimestamp(event),
            CGEventGetLocation(event),
        )
    };
    RawEvent {
        kind,
        code,
        flags,
        timestamp,
        location: Some(Point { x: loc.x, y: loc.y }),
    }
}

/// The C entry point CoreGraphics calls for every event.
unsafe extern "C" fn tap_callback(
    _proxy: CGEventTapProxy,
    etype: u32,
    event: CGEventRef,
    user_info: *mut c_void,
) -> CGEventRef {
    if user_info.is_null() || event.is_null() {
        return event;
    }
    let ctx = unsafe { &*(user_info as *const TapContext) };

    // Tap-disabled notices carry no usable event fields.
    let disabled = matches!(
        EventKind::from_cg_type(etype, || None),
        EventKind::TapDisabled(_)
    );
    if !disabled {
        // Ignore events we injected ourselves either by PID or by custom tag.
        let src_pid =
            unsafe { CGEventGetIntegerValueField(event, FIELD_EVENT_SOURCE_UNIX_PROCESS_ID) };
        let user_tag = unsafe {
            CGEventGetIntegerValueField(event, eventtag::EVENT_SOURCE_USER_DATA_FIELD)
        };
        if eventtag::is_tagged(user_tag) || src_pid == ctx.pid {
            trace!(src_pid, user_tag, "ignoring_synthetic_event");
            return event;
        }
    }

    let raw = if disabled {
        RawEvent {
            kind: EventKind::from_cg_type(etype, || None),
            code: 0,
            flags: 0,
            timestamp: 0,
            location: None,
        }
    } else {
        raw_event(etype, event)
    };
    trace!(kind = ?raw.kind, code = raw.code, flags = raw.flags, "tap_event");

    // A panic must not unwind across the C boundary; degrade to pass-through.
    let verdict = catch_unwind(AssertUnwindSafe(|| (ctx.handler)(&raw))).unwrap_or_else(|_| {
        warn!("event_handler_panicked");
        Verdict::Pass
    });
    match verdict {
        Verdict::Pass => event,
        Verdict::Swallow => {
            trace!("intercepting_event");
            ptr::null_mut()
        }
        Verdict::Rearm => {
            ctx.rearm();
            event
        }
    }
}

/// Install the tap on the current thread and run its loop until stopped.
pub fn run_event_loop(handler: Handler, ready: &Sender<Result<()>>, ctrl: &SysControl) -> Result<()> {
    // Preflight Input Monitoring permission.
    if !permissions::input_monitoring_ok() {
        warn!("input_monitoring_permission_missing");
        let _ignored = ready.send(Err(Error::PermissionDenied("Input Monitoring")));
        return Err(Error::PermissionDenied("Input Monitoring"));
    }

    let ctx = Box::into_raw(Box::new(TapContext {
        handler,
        port: AtomicPtr::new(ptr::null_mut()),
        pid: i64::from(process::id()),
    }));

    debug!("creating_event_tap");
    let port_ref = unsafe {
        CGEventTapCreate(
            CGEventTapLocation::Session as u32,
            CGEventTapPlacement::HeadInsertEventTap as u32,
            CGEventTapOptions::Default as u32,
            crate::cg_type::mask(),
            tap_callback,
            ctx.cast(),
        )
    };
    if port_ref.is_null() {
        warn!("event_tap_create_failed");
        drop(unsafe { Box::from_raw(ctx) });
        let _ignored = ready.send(Err(Error::EventTapStart));
        return Err(Error::EventTapStart);
    }
    let port = unsafe { CFMachPort::wrap_under_create_rule(port_ref) };
    unsafe { &*ctx }
        .port
        .store(port_ref as *mut c_void, Ordering::SeqCst);

    // Create a runloop source and start the tap on this thread's runloop.
    let source = match port.create_runloop_source(0) {
        Ok(s) => s,
        Err(_) => {
            warn!("run_loop_source_create_failed");
            unsafe { CFMachPortInvalidate(port_ref) };
            drop(unsafe { Box::from_raw(ctx) });
            let _ignored = ready.send(Err(Error::EventTapStart));
            return Err(Error::EventTapStart);
        }
    };

    let rl = CFRunLoop::get_current();
    ctrl.set_rl(rl.clone());
    rl.add_source(&source, unsafe { kCFRunLoopCommonModes });
    unsafe { CGEventTapEnable(port_ref, true) };

    let _ignored = ready.send(Ok(()));
    debug!("event_tap_started_run_loop");

    CFRunLoop::run_current();

    // The loop has exited, so no callback is in flight. Invalidate the port
    // before freeing the context it points at.
    rl.remove_source(&source, unsafe { kCFRunLoopCommonModes });
    unsafe {
        CGEventTapEnable(port_ref, false);
        CFMachPortInvalidate(port.as_concrete_TypeRef());
        drop(Box::from_raw(ctx));
    }
    debug!("event_tap_exited");
    Ok(())
}
