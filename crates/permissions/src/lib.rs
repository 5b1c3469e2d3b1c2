//! Permission checks for buttonmap.
//!
//! Observing and swallowing mouse and keyboard events needs two grants:
//! Accessibility (to create an active event tap and post events) and Input
//! Monitoring (to listen to the keyboard). This crate answers whether they are
//! present and can ask the system to show the Accessibility prompt.
//!
//! On platforms other than macOS every check reports `false`.

use serde::Serialize;

#[cfg(target_os = "macos")]
mod sys {
    use core_foundation::{
        base::TCFType,
        boolean::CFBoolean,
        dictionary::{CFDictionary, CFDictionaryRef},
        string::{CFString, CFStringRef},
    };

    #[link(name = "ApplicationServices", kind = "framework")]
    unsafe extern "C" {
        fn AXIsProcessTrusted() -> bool;
        fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
        fn CGPreflightListenEventAccess() -> bool;
        static kAXTrustedCheckOptionPrompt: CFStringRef;
    }

    pub fn accessibility() -> bool {
        unsafe { AXIsProcessTrusted() }
    }

    pub fn input_monitoring() -> bool {
        unsafe { CGPreflightListenEventAccess() }
    }

    pub fn prompt() -> bool {
        let key = unsafe { CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt) };
        let opts = CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);
        unsafe { AXIsProcessTrustedWithOptions(opts.as_concrete_TypeRef()) }
    }
}

#[cfg(not(target_os = "macos"))]
mod sys {
    pub fn accessibility() -> bool {
        false
    }

    pub fn input_monitoring() -> bool {
        false
    }

    pub fn prompt() -> bool {
        false
    }
}

/// Check the global Accessibility permission.
pub fn accessibility_ok() -> bool {
    sys::accessibility()
}

/// Check if the application has the "Input Monitoring" permission.
///
/// Returns `true` when the process is allowed to listen for keyboard events
/// (CGEvent tap), and `false` otherwise.
pub fn input_monitoring_ok() -> bool {
    sys::input_monitoring()
}

/// Ask macOS to show the Accessibility prompt if the grant is missing.
///
/// Returns the current trust state. The prompt is asynchronous: a `false`
/// return does not mean the user declined.
pub fn prompt_accessibility() -> bool {
    sys::prompt()
}

/// Current permission status for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionsStatus {
    /// Accessibility (AX) permission; `true` if granted.
    pub accessibility_ok: bool,
    /// Input Monitoring permission; `true` if granted.
    pub input_ok: bool,
}

impl PermissionsStatus {
    /// True when both grants needed for the input tap are present.
    pub fn all_ok(&self) -> bool {
        self.accessibility_ok && self.input_ok
    }
}

/// Query both Accessibility and Input Monitoring permissions.
///
/// The function performs no prompting and has no side effects.
pub fn check_permissions() -> PermissionsStatus {
    PermissionsStatus {
        accessibility_ok: accessibility_ok(),
        input_ok: input_monitoring_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_ok_needs_both() {
        let mut st = PermissionsStatus {
            accessibility_ok: true,
            input_ok: false,
        };
        assert!(!st.all_ok());
        st.input_ok = true;
        assert!(st.all_ok());
    }
}
