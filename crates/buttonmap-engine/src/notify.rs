use std::fmt;

use buttonmap_protocol::MappedAction;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

use crate::Trigger;

/// Fire-and-forget messages for whatever presents the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// An input bound to entry `id` was just pressed.
    Highlight {
        /// Entry id.
        id: String,
    },
    /// The open learn session staged a new trigger.
    CaptureUpdated {
        /// The staged trigger.
        trigger: Trigger,
    },
    /// The learn session ended.
    CaptureClosed {
        /// True if an entry was added.
        committed: bool,
    },
    /// Entries were added or removed.
    EntriesChanged,
    /// An entry's action changed.
    MappingChanged {
        /// Entry id.
        id: String,
        /// New action.
        action: MappedAction,
    },
    /// Something the user should be told.
    Alert {
        /// Heading.
        title: String,
        /// Body.
        text: String,
    },
}

impl fmt::Display for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Highlight { id } => write!(f, "pressed {id}"),
            Self::CaptureUpdated { trigger } => write!(f, "Pressed event: {trigger}"),
            Self::CaptureClosed { committed: true } => f.write_str("entry added"),
            Self::CaptureClosed { committed: false } => f.write_str("learn cancelled"),
            Self::EntriesChanged => f.write_str("entries changed"),
            Self::MappingChanged { id, action } => write!(f, "{id} -> {action}"),
            Self::Alert { title, text } => write!(f, "{title}: {text}"),
        }
    }
}

/// Receiver side of [`UiEvent`]s. Implementations must never block.
pub trait UiSink: Send + Sync {
    /// Deliver one event. Delivery is best effort.
    fn notify(&self, event: UiEvent);
}

impl UiSink for UnboundedSender<UiEvent> {
    fn notify(&self, event: UiEvent) {
        if self.send(event).is_err() {
            trace!("ui_channel_closed");
        }
    }
}

impl UiSink for crossbeam_channel::Sender<UiEvent> {
    fn notify(&self, event: UiEvent) {
        if self.try_send(event).is_err() {
            trace!("ui_channel_full_or_closed");
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl UiSink for NullSink {
    fn notify(&self, _event: UiEvent) {}
}
