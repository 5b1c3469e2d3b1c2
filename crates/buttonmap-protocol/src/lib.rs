//! Shared action identifiers for buttonmap.
//!
//! [`MappedAction`] is the vocabulary the mapping table stores, the executor
//! performs and the CLI prints. Its wire form is the camelCase identifier
//! (`"copy"`, `"moveSpaceLeft"`), which is also what the state files hold.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An action id that does not name any [`MappedAction`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

macro_rules! mapped_actions {
    ( $( $variant:ident => $id:literal, $title:literal; )* ) => {
        /// What a mapped trigger does when it fires.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        #[allow(missing_docs)]
        pub enum MappedAction {
            $( $variant, )*
        }

        impl MappedAction {
            /// Every action, in declaration order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )* ];

            /// Stable identifier used on disk and on the command line.
            pub fn id(self) -> &'static str {
                match self {
                    $( Self::$variant => $id, )*
                }
            }

            /// Human-readable title.
            pub fn title(self) -> &'static str {
                match self {
                    $( Self::$variant => $title, )*
                }
            }

            /// Look up an action by identifier.
            pub fn from_id(id: &str) -> Option<Self> {
                match id {
                    $( $id => Some(Self::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

mapped_actions! {
    PassThrough => "passThrough", "Pass Through (Default)";
    Disabled => "disabled", "Disabled";

    MissionControl => "missionControl", "Mission Control";
    AppExpose => "appExpose", "App Expose";
    ShowDesktop => "showDesktop", "Show Desktop";
    MoveSpaceLeft => "moveSpaceLeft", "Move Space Left";
    MoveSpaceRight => "moveSpaceRight", "Move Space Right";
    AppSwitcherNext => "appSwitcherNext", "Switch App Next";
    AppSwitcherPrevious => "appSwitcherPrevious", "Switch App Previous";
    NextWindow => "nextWindow", "Next Window";
    PreviousWindow => "previousWindow", "Previous Window";
    HideApp => "hideApp", "Hide App";
    MinimizeWindow => "minimizeWindow", "Minimize Window";
    CloseWindow => "closeWindow", "Close Window";
    LockScreen => "lockScreen", "Lock Screen";

    NavigateBack => "navigateBack", "Navigate Back";
    NavigateForward => "navigateForward", "Navigate Forward";
    ReloadPage => "reloadPage", "Reload Page";
    NewTab => "newTab", "New Tab";
    CloseTab => "closeTab", "Close Tab";
    ReopenClosedTab => "reopenClosedTab", "Reopen Closed Tab";

    Copy => "copy", "Copy";
    Paste => "paste", "Paste";
    Cut => "cut", "Cut";
    Undo => "undo", "Undo";
    Redo => "redo", "Redo";
    SelectAll => "selectAll", "Select All";
    Find => "find", "Find";
    EmojiPicker => "emojiPicker", "Emoji Picker";
    Escape => "escape", "Escape";
    ReturnKey => "returnKey", "Return";
    TabKey => "tabKey", "Tab";
    PageUp => "pageUp", "Page Up";
    PageDown => "pageDown", "Page Down";
    Home => "home", "Home";
    End => "end", "End";
    DeleteBackward => "deleteBackward", "Delete Backward";
    DeleteForward => "deleteForward", "Delete Forward";

    PlayPause => "playPause", "Play / Pause";
    NextTrack => "nextTrack", "Next Track";
    PreviousTrack => "previousTrack", "Previous Track";
    Mute => "mute", "Mute";
    VolumeUp => "volumeUp", "Volume Up";
    VolumeDown => "volumeDown", "Volume Down";

    ScreenshotFullscreen => "screenshotFullscreen", "Screenshot Fullscreen";
    ScreenshotSelection => "screenshotSelection", "Screenshot Selection";
    Spotlight => "spotlight", "Spotlight Search";
    Siri => "siri", "Siri";
}

impl MappedAction {
    /// True for actions that let the triggering event through.
    pub fn is_pass_through(self) -> bool {
        self == Self::PassThrough
    }

    /// True for actions that perform something (neither pass-through nor disabled).
    pub fn performs(self) -> bool {
        !matches!(self, Self::PassThrough | Self::Disabled)
    }
}

impl Default for MappedAction {
    fn default() -> Self {
        Self::PassThrough
    }
}

impl fmt::Display for MappedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for MappedAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// A titled group of actions, in menu order.
#[derive(Debug, Clone, Copy)]
pub struct ActionSection {
    /// Section heading.
    pub title: &'static str,
    /// Actions listed under the heading.
    pub actions: &'static [MappedAction],
}

/// All actions grouped the way they are presented to the user.
pub const SECTIONS: &[ActionSection] = {
    use MappedAction::*;
    &[
        ActionSection {
            title: "Basic",
            actions: &[PassThrough, Disabled],
        },
        ActionSection {
            title: "Desktop & Windows",
            actions: &[
                MissionControl,
                AppExpose,
                ShowDesktop,
                MoveSpaceLeft,
                MoveSpaceRight,
                AppSwitcherNext,
                AppSwitcherPrevious,
                NextWindow,
                PreviousWindow,
                HideApp,
                MinimizeWindow,
                CloseWindow,
                LockScreen,
            ],
        },
        ActionSection {
            title: "Navigation & Tabs",
            actions: &[
                NavigateBack,
                NavigateForward,
                ReloadPage,
                NewTab,
                CloseTab,
                ReopenClosedTab,
            ],
        },
        ActionSection {
            title: "Editing & Keys",
            actions: &[
                Copy,
                Paste,
                Cut,
                Undo,
                Redo,
                SelectAll,
                Find,
                EmojiPicker,
                Escape,
                ReturnKey,
                TabKey,
                PageUp,
                PageDown,
                Home,
                End,
                DeleteBackward,
                DeleteForward,
            ],
        },
        ActionSection {
            title: "Media",
            actions: &[PlayPause, NextTrack, PreviousTrack, Mute, VolumeUp, VolumeDown],
        },
        ActionSection {
            title: "System",
            actions: &[ScreenshotFullscreen, ScreenshotSelection, Spotlight, Siri],
        },
    ]
};
