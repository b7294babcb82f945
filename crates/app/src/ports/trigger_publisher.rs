//! Trigger publisher port: hands board events to the automation pipeline.

use kanban_domain::automation::TriggerEvent;

/// Submits trigger events for background processing.
///
/// Implementations must return immediately and must never fail the caller:
/// the card mutation that fired the event has already committed.
pub trait TriggerPublisher {
    fn publish(&self, event: TriggerEvent);
}

impl<T: TriggerPublisher + Send + Sync> TriggerPublisher for std::sync::Arc<T> {
    fn publish(&self, event: TriggerEvent) {
        (**self).publish(event);
    }
}
