//! Marker for events synthesized by buttonmap.
//!
//! Every event we post carries [`BUTTONMAP_TAG`] in the
//! `EventSourceUserData` field (CGEventField 42). The input tap compares that
//! field against the tag and lets matching events through untouched, so an
//! action that posts a keystroke can never re-trigger its own mapping.

/// CGEventField index of `kCGEventSourceUserData`.
pub const EVENT_SOURCE_USER_DATA_FIELD: u32 = 42;

/// 'bmap' in ASCII bytes: 0x62 0x6d 0x61 0x70 -> 1651335536
pub const BUTTONMAP_TAG: i64 = 1_651_335_536;

/// True when `user_data` was stamped by this process family.
pub fn is_tagged(user_data: i64) -> bool {
    user_data == BUTTONMAP_TAG
}
