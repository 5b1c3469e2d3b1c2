use buttonmap_protocol::MappedAction;
use relaykey::Relay;

/// Performs actions chosen by the engine.
///
/// Called with the engine lock released. Implementations must return
/// promptly; anything slow belongs on another thread.
pub trait ActionExecutor: Send + Sync {
    /// Perform `action`. Failures are the executor's business.
    fn perform(&self, action: MappedAction);
}

impl ActionExecutor for Relay {
    fn perform(&self, action: MappedAction) {
        Self::perform(self, action);
    }
}
