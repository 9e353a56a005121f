use anyhow::Result;
use module::EventProcessor;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::collection::{events::InputEvent, listener::InputListener};

pub mod aggregator;
pub mod geometry;
pub mod module;

/// Upper bound of events taken from the channel in one go.
const DRAIN_LIMIT: usize = 512;

/// Represents the consumer side of the daemon. It drains everything the listener has buffered,
/// hands it to the processor, and on shutdown makes sure the processor is finalized exactly once.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<InputEvent>,
    processor: Processor,
    shutdown: CancellationToken,
}

impl<P: EventProcessor> ProcessingModule<P> {
    pub fn new(receiver: Receiver<InputEvent>, processor: P, shutdown: CancellationToken) -> Self {
        Self {
            receiver,
            processor,
            shutdown,
        }
    }

    fn process_all(&mut self, events: &mut Vec<InputEvent>) {
        for event in events.drain(..) {
            if let Err(e) = self.processor.process_next(event) {
                error!("Error processing event {e:?}")
            }
        }
    }

    /// Runs until shutdown is requested or the listener goes away, then stops the listener,
    /// processes what was already buffered and finalizes the processor.
    pub async fn run(mut self, mut listener: InputListener) -> Result<P> {
        let mut events = Vec::with_capacity(DRAIN_LIMIT);
        loop {
            let received = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                received = self.receiver.recv_many(&mut events, DRAIN_LIMIT) => received,
            };
            if received == 0 {
                info!("Input listener closed the channel");
                break;
            }
            debug!("Processing {received} events");
            self.process_all(&mut events);
        }

        self.receiver.close();
        listener.stop();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        if !events.is_empty() {
            debug!("Processing {} events buffered before shutdown", events.len());
        }
        self.process_all(&mut events);

        self.processor
            .finalize()
            .inspect_err(|e| error!("Final flush failed {e:?}"))?;
        info!("Final flush completed");
        Ok(self.processor)
    }
}
