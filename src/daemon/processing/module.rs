use anyhow::Result;

use crate::daemon::collection::events::InputEvent;

/// Represents an event processor. The processing module feeds it events one by one and calls
/// [EventProcessor::finalize] exactly once when the event stream ends.
pub trait EventProcessor {
    fn process_next(&mut self, event: InputEvent) -> Result<()>;

    fn finalize(&mut self) -> Result<()>;
}
