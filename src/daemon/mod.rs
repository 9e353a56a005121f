use std::time::Duration;

use anyhow::Result;
use args::DaemonConfig;
use collection::{events::InputEvent, listener::InputListener};
use processing::{aggregator::ActivityAggregator, ProcessingModule};
use storage::record_storage::{RecordStore, SqliteRecordStore, StoreLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    input_api::GenericInputSource,
    utils::clock::{Clock, DefaultClock},
    window_api::{GenericWindowManager, WindowManager},
};

pub mod args;
pub mod collection;
pub mod processing;
pub mod shutdown;
pub mod storage;

pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// Events the listener may get ahead of processing. A full buffer makes the listener wait.
const EVENT_BUFFER: usize = 4096;

/// Represents the starting point for the daemon
pub async fn start_daemon(config: DaemonConfig) -> Result<()> {
    std::env::set_current_dir("/")?;

    let lock = StoreLock::acquire(&config.store_path)?;
    info!("Holding {}", lock.path().display());
    let store = SqliteRecordStore::open(&config.store_path)?;
    let manager = GenericWindowManager::new()?;

    let (sender, receiver) = mpsc::channel::<InputEvent>(EVENT_BUFFER);
    let listener = InputListener::start(GenericInputSource::new()?, sender).await?;

    let shutdown_token = CancellationToken::new();
    let watcher = tokio::spawn(shutdown::detect_shutdown(shutdown_token.clone()));

    let processor = create_processor(store, manager, DefaultClock, config.flush_interval);
    let processing_result = ProcessingModule::new(receiver, processor, shutdown_token.clone())
        .run(listener)
        .await;

    shutdown_token.cancel();
    if let Err(e) = watcher.await {
        error!("Shutdown watcher failed {e:?}");
    }

    processing_result
        .inspect_err(|e| error!("Processing module got an error {e:?}"))?;
    info!("Daemon stopped");
    Ok(())
}

fn create_processor<S: RecordStore>(
    store: S,
    manager: impl WindowManager + 'static,
    clock: impl Clock,
    flush_interval: Duration,
) -> ActivityAggregator<S> {
    ActivityAggregator::new(store, Box::new(manager), Box::new(clock), flush_interval)
}

#[cfg(test)]
mod daemon_tests {
    use std::{collections::VecDeque, thread, time::Duration};

    use anyhow::{bail, Result};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::{
        daemon::{
            collection::{
                events::{InputEvent, Position, RawEvent},
                listener::InputListener,
            },
            create_processor,
            processing::{
                aggregator::tests::{FocusedWindow, TestClock},
                ProcessingModule,
            },
            storage::record_storage::SqliteRecordStore,
            DEFAULT_FLUSH_INTERVAL,
        },
        input_api::InputSource,
        utils::logging::TEST_LOGGING,
    };

    /// Replays events, then either idles or fails like a lost X connection.
    struct ScriptedSource {
        events: VecDeque<RawEvent>,
        fail_when_empty: bool,
    }

    impl InputSource for ScriptedSource {
        fn open(&mut self) -> Result<()> {
            Ok(())
        }

        fn next_event(&mut self, timeout: Duration) -> Result<Option<RawEvent>> {
            if let Some(event) = self.events.pop_front() {
                return Ok(Some(event));
            }
            if self.fail_when_empty {
                bail!("connection lost");
            }
            thread::sleep(timeout.min(Duration::from_millis(10)));
            Ok(None)
        }
    }

    fn key(value: i32) -> RawEvent {
        RawEvent::Key {
            code: "KEY_ENTER".into(),
            scancode: 36,
            value,
        }
    }

    fn scripted(fail_when_empty: bool) -> ScriptedSource {
        ScriptedSource {
            events: VecDeque::from([
                key(1),
                key(0),
                RawEvent::Other("button"),
                RawEvent::Motion(Position::new(3., 4.)),
                key(1),
                key(0),
                RawEvent::Motion(Position::new(0., 0.)),
            ]),
            fail_when_empty,
        }
    }

    async fn run_daemon(
        source: ScriptedSource,
        shutdown_after: Option<Duration>,
    ) -> Result<SqliteRecordStore> {
        *TEST_LOGGING;
        let window = FocusedWindow::default();
        window.focus(Some("Alacritty"));

        let (sender, receiver) = mpsc::channel::<InputEvent>(4);
        let listener = InputListener::start(source, sender).await?;
        let shutdown_token = CancellationToken::new();

        let processor = create_processor(
            SqliteRecordStore::open_in_memory()?,
            window,
            TestClock::new(),
            DEFAULT_FLUSH_INTERVAL,
        );
        let module = ProcessingModule::new(receiver, processor, shutdown_token.clone());

        let (processor, _) = tokio::join!(module.run(listener), async {
            if let Some(delay) = shutdown_after {
                tokio::time::sleep(delay).await;
                shutdown_token.cancel();
            }
        });
        Ok(processor?.into_store())
    }

    /// Very simple smoke test: events go in through the listener, shutdown flushes them.
    #[tokio::test]
    async fn smoke_test_daemon() -> Result<()> {
        let store = run_daemon(scripted(false), Some(Duration::from_millis(300))).await?;

        let rows = store.read_all()?;
        assert_eq!(rows.len(), 3);
        assert!(rows[..2]
            .iter()
            .all(|row| row.app_name == "Alacritty" && row.value == "0"));
        assert_eq!(rows[2].code, "EV_MOV");
        assert_eq!(rows[2].value, "10.0");
        Ok(())
    }

    #[tokio::test]
    async fn test_lost_source_still_flushes() -> Result<()> {
        let store = run_daemon(scripted(true), None).await?;

        let rows = store.read_all()?;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].value, "10.0");
        Ok(())
    }
}
