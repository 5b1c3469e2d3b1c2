//! Test doubles for driving the engine without a tap or an executor.
//! Public so integration tests and downstream crates can use them.

use std::sync::Arc;

use buttonmap_protocol::MappedAction;
use parking_lot::Mutex;

use crate::{ActionExecutor, UiEvent, UiSink};

/// Records every action instead of performing it.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    /// Actions in call order.
    performed: Mutex<Vec<MappedAction>>,
}

impl RecordingExecutor {
    /// Actions performed so far.
    pub fn performed(&self) -> Vec<MappedAction> {
        self.performed.lock().clone()
    }
}

impl ActionExecutor for RecordingExecutor {
    fn perform(&self, action: MappedAction) {
        self.performed.lock().push(action);
    }
}

/// Collects UI events. Clones share the buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    /// Events in delivery order.
    events: Arc<Mutex<Vec<UiEvent>>>,
}

impl RecordingSink {
    /// Events delivered so far.
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().clone()
    }

    /// Forget everything delivered so far.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl UiSink for RecordingSink {
    fn notify(&self, event: UiEvent) {
        self.events.lock().push(event);
    }
}
