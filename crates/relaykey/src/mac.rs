//! CoreGraphics / AppKit implementation of [`Poster`].

use std::{collections::BTreeMap, process::Command, ptr};

use core_foundation::{
    array::CFArray,
    base::{CFType, CFTypeRef, TCFType},
    boolean::CFBoolean,
    dictionary::CFDictionary,
    number::CFNumber,
    string::{CFString, CFStringRef},
};
use core_graphics::{
    event as cge,
    event_source::{CGEventSource, CGEventSourceStateID},
};
use mac_keycode::{Modifiers, SystemKey};
use objc2::{
    Encoding, RefEncode, msg_send,
    rc::{Retained, autoreleasepool},
    runtime::AnyObject,
};
use objc2_app_kit::NSEvent;
use objc2_foundation::NSPoint;
use tracing::{info, trace, warn};

use crate::{Error, Poster, Result, Stroke, symbolic::Plist};

#[link(name = "CoreFoundation", kind = "framework")]
unsafe extern "C" {
    fn CFPreferencesCopyAppValue(key: CFStringRef, application_id: CFStringRef) -> CFTypeRef;
}

#[link(name = "CoreGraphics", kind = "framework")]
unsafe extern "C" {
    fn CGEventSetIntegerValueField(event: *mut OpaqueCGEvent, field: u32, value: i64);
    fn CGEventPost(tap: u32, event: *mut OpaqueCGEvent);
}

/// `NSEventTypeSystemDefined`.
const NS_SYSTEM_DEFINED: usize = 14;
/// Modifier flags AppKit itself puts on media key events.
const MEDIA_EVENT_FLAGS: usize = 0xA00;
/// `kCGHIDEventTap`.
const HID_EVENT_TAP: u32 = 0;

/// Opaque struct behind `CGEventRef`, so it can be passed through `msg_send!`.
#[repr(C)]
struct OpaqueCGEvent {
    /// Zero-sized, never constructed.
    _private: [u8; 0],
}

unsafe impl RefEncode for OpaqueCGEvent {
    const ENCODING_REF: Encoding = Encoding::Pointer(&Encoding::Struct("__CGEvent", &[]));
}

/// Posts real events into the HID event stream, each stamped with
/// [`eventtag::BUTTONMAP_TAG`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MacPoster;

impl MacPoster {
    /// A poster that tags every event it creates.
    pub fn new() -> Self {
        Self
    }

    /// A tagged keyboard event for `code` carrying `flags`.
    fn build_key_event(code: u16, down: bool, flags: Modifiers) -> Result<cge::CGEvent> {
        let source = match CGEventSource::new(CGEventSourceStateID::HIDSystemState) {
            Ok(s) => s,
            Err(_) => {
                if !permissions::accessibility_ok() {
                    warn!("accessibility_permission_missing_for_event_source");
                    return Err(Error::PermissionDenied("Accessibility"));
                }
                return Err(Error::EventSource);
            }
        };
        let e = match cge::CGEvent::new_keyboard_event(source, cge::CGKeyCode::from(code), down) {
            Ok(e) => e,
            Err(_) => {
                if !permissions::accessibility_ok() {
                    warn!("accessibility_permission_missing_for_event_create");
                    return Err(Error::PermissionDenied("Accessibility"));
                }
                return Err(Error::EventCreate);
            }
        };
        e.set_flags(cge::CGEventFlags::from_bits_retain(flags.bits()));
        e.set_integer_value_field(
            cge::EventField::EVENT_SOURCE_USER_DATA,
            eventtag::BUTTONMAP_TAG,
        );
        Ok(e)
    }

    /// Read `AppleSymbolicHotKeys` from the symbolic hot key preferences.
    fn symbolic_hotkeys() -> Option<Plist> {
        let key = CFString::from_static_string("AppleSymbolicHotKeys");
        let app = CFString::from_static_string("com.apple.symbolichotkeys");
        let raw = unsafe {
            CFPreferencesCopyAppValue(key.as_concrete_TypeRef(), app.as_concrete_TypeRef())
        };
        if raw.is_null() {
            return None;
        }
        let value = unsafe { CFType::wrap_under_create_rule(raw) };
        Some(to_plist(&value))
    }
}

/// Convert a CoreFoundation property list into [`Plist`].
fn to_plist(value: &CFType) -> Plist {
    if let Some(d) = value.downcast::<CFDictionary>() {
        let (keys, values) = d.get_keys_and_values();
        let mut out = BTreeMap::new();
        for (k, v) in keys.into_iter().zip(values) {
            let k = unsafe { CFType::wrap_under_get_rule(k as CFTypeRef) };
            let v = unsafe { CFType::wrap_under_get_rule(v as CFTypeRef) };
            if let Some(ks) = k.downcast::<CFString>() {
                out.insert(ks.to_string(), to_plist(&v));
            }
        }
        return Plist::Dict(out);
    }
    if let Some(a) = value.downcast::<CFArray>() {
        let items = a
            .get_all_values()
            .into_iter()
            .map(|p| to_plist(&unsafe { CFType::wrap_under_get_rule(p as CFTypeRef) }))
            .collect();
        return Plist::Array(items);
    }
    if let Some(b) = value.downcast::<CFBoolean>() {
        return Plist::Bool(bool::from(b));
    }
    if let Some(n) = value.downcast::<CFNumber>() {
        return n.to_i64().map_or(Plist::Other, Plist::Int);
    }
    if let Some(s) = value.downcast::<CFString>() {
        return Plist::Str(s.to_string());
    }
    Plist::Other
}

/// Run a helper command to completion, mapping failure to [`Error::Command`].
fn run(cmd: &mut Command) -> Result<()> {
    let status = cmd.status().map_err(|e| Error::Command(e.to_string()))?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::Command(format!("{cmd:?} exited with {status}")))
    }
}

impl Poster for MacPoster {
    fn post_key(&self, code: u16, down: bool, flags: Modifiers) -> Result<()> {
        let e = Self::build_key_event(code, down, flags)?;
        e.post(cge::CGEventTapLocation::HID);
        trace!(code, down, flags = flags.bits(), "posted_key");
        Ok(())
    }

    fn post_media(&self, key: SystemKey, down: bool) -> Result<()> {
        let data1 = isize::try_from(key.encode_payload(down)).map_err(|_| Error::EventCreate)?;
        autoreleasepool(|_| {
            let ev: Option<Retained<NSEvent>> = unsafe {
                msg_send![
                    NSEvent::class(),
                    otherEventWithType: NS_SYSTEM_DEFINED,
                    location: NSPoint::new(0.0, 0.0),
                    modifierFlags: MEDIA_EVENT_FLAGS,
                    timestamp: 0.0f64,
                    windowNumber: 0isize,
                    context: ptr::null_mut::<AnyObject>(),
                    subtype: mac_keycode::SYSTEM_DEFINED_AUX_SUBTYPE,
                    data1: data1,
                    data2: -1isize
                ]
            };
            let ev = ev.ok_or(Error::EventCreate)?;
            let cg: *mut OpaqueCGEvent = unsafe { msg_send![&*ev, CGEvent] };
            if cg.is_null() {
                return Err(Error::EventCreate);
            }
            unsafe {
                CGEventSetIntegerValueField(
                    cg,
                    eventtag::EVENT_SOURCE_USER_DATA_FIELD,
                    eventtag::BUTTONMAP_TAG,
                );
                CGEventPost(HID_EVENT_TAP, cg);
            }
            trace!(key = key.0, down, "posted_media_key");
            Ok(())
        })
    }

    fn post_scripted(&self, stroke: Stroke) -> Result<()> {
        let script = stroke.apple_script();
        run(Command::new("/usr/bin/osascript").arg("-e").arg(&script))?;
        info!(%script, "posted_via_system_events");
        Ok(())
    }

    fn symbolic_hotkey(&self, id: u32) -> Option<Stroke> {
        let all = Self::symbolic_hotkeys()?;
        crate::symbolic::lookup(&all, id)
    }

    fn open_siri(&self) -> Result<()> {
        run(Command::new("/usr/bin/open").args(["-b", "com.apple.Siri"]))
            .or_else(|_| run(Command::new("/usr/bin/open").arg("/System/Applications/Siri.app")))
    }
}
