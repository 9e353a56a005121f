use std::{iter, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeDelta};
use tracing::{debug, info, warn};

use crate::{
    daemon::{
        collection::events::{InputEvent, Position},
        storage::{
            entities::{RecordValue, UsageRecord},
            record_storage::RecordStore,
        },
    },
    utils::clock::Clock,
    window_api::WindowManager,
};

use super::{geometry::distance, module::EventProcessor};

/// Name used until the window manager reports something.
pub const UNKNOWN_WINDOW: &str = "Unknown window";

/// Turns input events into records and writes them out in batches.
///
/// All of the state lives here and is touched only from the processing task. A flush writes the
/// buffered records and the movement aggregate in one transaction and resets both buffers only
/// once that transaction is committed.
///
/// The flush interval is counted from the last flush attempt, not from the last successful
/// flush. After a failed flush the buffers are kept and the next attempt happens one interval
/// later instead of on the very next event.
pub struct ActivityAggregator<S: RecordStore> {
    store: S,
    window_manager: Box<dyn WindowManager>,
    clock: Box<dyn Clock>,
    flush_interval: TimeDelta,
    last_position: Position,
    accumulated_distance: f64,
    pending: Vec<UsageRecord>,
    last_flush: DateTime<Local>,
    /// Moment of the last flush attempt, successful or not. Drives the timer so a failing store
    /// is retried once per interval instead of on every event.
    last_attempt: DateTime<Local>,
    current_window: Arc<str>,
}

impl<S: RecordStore> ActivityAggregator<S> {
    pub fn new(
        store: S,
        window_manager: Box<dyn WindowManager>,
        clock: Box<dyn Clock>,
        flush_interval: Duration,
    ) -> Self {
        let now = clock.time();
        let mut aggregator = Self {
            store,
            window_manager,
            clock,
            flush_interval: TimeDelta::from_std(flush_interval).unwrap_or(TimeDelta::MAX),
            last_position: Position::default(),
            accumulated_distance: 0.,
            pending: vec![],
            last_flush: now,
            last_attempt: now,
            current_window: UNKNOWN_WINDOW.into(),
        };
        aggregator.refresh_window();
        aggregator
    }

    /// Updates the window name. A missing window or a failed query keeps the previous name.
    fn refresh_window(&mut self) {
        if let Err(e) = self.window_manager.refresh() {
            warn!("Failed to refresh window state {e:?}");
        }
        match self.window_manager.get_active_window_name() {
            Ok(Some(name)) => self.current_window = name,
            Ok(None) => debug!("No active window, keeping {}", self.current_window),
            Err(e) => warn!("Failed to query active window {e:?}"),
        }
    }

    /// Records one event and flushes if the flush interval has passed. Only flush errors are
    /// returned.
    pub fn process(&mut self, event: InputEvent) -> Result<()> {
        match event {
            InputEvent::Key {
                code,
                scancode,
                value,
            } => {
                self.refresh_window();
                self.pending.push(UsageRecord {
                    moment: self.clock.time(),
                    app_name: self.current_window.clone(),
                    code,
                    scancode,
                    value: RecordValue::Int(value),
                });
            }
            InputEvent::Move(position) => {
                self.refresh_window();
                let moved = distance(position, self.last_position);
                if moved.is_finite() {
                    self.accumulated_distance += moved;
                    self.last_position = position;
                } else {
                    warn!("Ignoring pointer sample {position:?}");
                }
            }
        }

        if self.flush_due() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush_due(&self) -> bool {
        self.clock.time() - self.last_attempt > self.flush_interval
    }

    /// Writes the buffered records that pass [UsageRecord::is_persisted] together with the
    /// movement aggregate. On failure nothing is cleared, so the next flush writes the same data.
    pub fn flush(&mut self) -> Result<()> {
        let now = self.clock.time();
        self.last_attempt = now;

        let aggregate = UsageRecord::movement(now, self.accumulated_distance);
        let batch = self
            .pending
            .iter()
            .chain(iter::once(&aggregate))
            .filter(|record| record.is_persisted())
            .cloned()
            .collect::<Vec<_>>();

        self.store
            .append(&batch)
            .with_context(|| format!("failed to persist {} records", batch.len()))?;

        info!(
            "Flushed {} rows from {} buffered key records, pointer moved {:.1}",
            batch.len(),
            self.pending.len(),
            self.accumulated_distance
        );
        self.pending.clear();
        self.accumulated_distance = 0.;
        self.last_flush = now;
        Ok(())
    }

    pub fn accumulated_distance(&self) -> f64 {
        self.accumulated_distance
    }

    pub fn pending_records(&self) -> &[UsageRecord] {
        &self.pending
    }

    pub fn current_window(&self) -> &str {
        &self.current_window
    }

    pub fn last_flush(&self) -> DateTime<Local> {
        self.last_flush
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: RecordStore> EventProcessor for ActivityAggregator<S> {
    fn process_next(&mut self, event: InputEvent) -> Result<()> {
        self.process(event)
    }

    fn finalize(&mut self) -> Result<()> {
        self.flush()
    }
}
