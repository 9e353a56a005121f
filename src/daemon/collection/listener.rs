use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::input_api::InputSource;

use super::events::InputEvent;

/// How long the listener thread blocks on the source before checking whether it should stop.
const RECEIVE_TIMEOUT: Duration = Duration::from_millis(100);

/// Lifecycle of [InputListener]. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ListenerState {
    Starting = 0,
    Listening = 1,
    Stopped = 2,
}

impl From<u8> for ListenerState {
    fn from(value: u8) -> Self {
        match value {
            0 => ListenerState::Starting,
            1 => ListenerState::Listening,
            _ => ListenerState::Stopped,
        }
    }
}

/// Owns the thread that reads an [InputSource] and forwards key and move events into a channel.
/// Nothing but [InputEvent] values crosses from that thread to the processing side.
pub struct InputListener {
    state: Arc<AtomicU8>,
    handle: Option<JoinHandle<()>>,
}

impl InputListener {
    /// Spawns the listener thread and waits until the source reports that it's open. A source
    /// that fails to open is a startup error.
    pub async fn start(
        source: impl InputSource + 'static,
        sender: mpsc::Sender<InputEvent>,
    ) -> Result<Self> {
        let state = Arc::new(AtomicU8::new(ListenerState::Starting as u8));
        let (ready_sender, ready_receiver) = oneshot::channel::<Result<()>>();

        let thread_state = state.clone();
        let handle = thread::Builder::new()
            .name("kbdcounter-input".into())
            .spawn(move || listen(source, sender, thread_state, ready_sender))
            .context("failed to spawn input listener thread")?;

        let mut listener = Self {
            state,
            handle: Some(handle),
        };

        match ready_receiver.await {
            Ok(Ok(())) => {
                info!("Input listener is ready");
                Ok(listener)
            }
            Ok(Err(e)) => {
                listener.stop();
                Err(e.context("input source failed to start"))
            }
            Err(_) => {
                listener.stop();
                Err(anyhow!("input listener exited before reporting readiness"))
            }
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state.load(Ordering::SeqCst).into()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == ListenerState::Listening
    }

    /// Stops the thread and waits for it to exit. The receiving side has to be closed or drained
    /// beforehand, a thread blocked on a full channel only notices once it's closed.
    pub fn stop(&mut self) {
        self.state
            .store(ListenerState::Stopped as u8, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Input listener thread panicked");
            }
        }
    }
}

impl Drop for InputListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn listen(
    mut source: impl InputSource,
    sender: mpsc::Sender<InputEvent>,
    state: Arc<AtomicU8>,
    ready: oneshot::Sender<Result<()>>,
) {
    if let Err(e) = source.open() {
        state.store(ListenerState::Stopped as u8, Ordering::SeqCst);
        let _ = ready.send(Err(e));
        return;
    }

    // Stop may have been requested while the source was opening.
    if state
        .compare_exchange(
            ListenerState::Starting as u8,
            ListenerState::Listening as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        )
        .is_err()
    {
        return;
    }

    if ready.send(Ok(())).is_err() {
        warn!("Nobody is waiting for the input listener anymore");
        state.store(ListenerState::Stopped as u8, Ordering::SeqCst);
        return;
    }

    while ListenerState::from(state.load(Ordering::SeqCst)) == ListenerState::Listening {
        match source.next_event(RECEIVE_TIMEOUT) {
            Ok(Some(raw)) => {
                let Some(event) = raw.into_input() else {
                    continue;
                };
                if sender.blocking_send(event).is_err() {
                    debug!("Event receiver is closed");
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!("Input source failed {e:?}");
                break;
            }
        }
    }

    state.store(ListenerState::Stopped as u8, Ordering::SeqCst);
    info!("Input listener stopped");
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, thread, time::Duration};

    use anyhow::{anyhow, Result};
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        daemon::collection::events::{InputEvent, Position, RawEvent},
        input_api::{InputSource, MockInputSource},
    };

    /// Replays a fixed list of events, then stays quiet.
    struct ScriptedSource {
        events: VecDeque<RawEvent>,
    }

    impl InputSource for ScriptedSource {
        fn open(&mut self) -> Result<()> {
            Ok(())
        }

        fn next_event(&mut self, timeout: Duration) -> Result<Option<RawEvent>> {
            match self.events.pop_front() {
                Some(event) => Ok(Some(event)),
                None => {
                    thread::sleep(timeout.min(Duration::from_millis(10)));
                    Ok(None)
                }
            }
        }
    }

    #[tokio::test]
    async fn test_listener_forwards_keys_and_moves_only() -> Result<()> {
        let source = ScriptedSource {
            events: VecDeque::from([
                RawEvent::Key {
                    code: "KEY_A".into(),
                    scancode: 38,
                    value: 1,
                },
                RawEvent::Other("button"),
                RawEvent::Motion(Position::new(3., 4.)),
            ]),
        };
        let (sender, mut receiver) = mpsc::channel(16);

        let mut listener = InputListener::start(source, sender).await?;
        assert!(listener.is_listening());

        assert_eq!(
            receiver.recv().await,
            Some(InputEvent::Key {
                code: "KEY_A".into(),
                scancode: 38,
                value: 1
            })
        );
        assert_eq!(
            receiver.recv().await,
            Some(InputEvent::Move(Position::new(3., 4.)))
        );

        receiver.close();
        listener.stop();
        assert_eq!(listener.state(), ListenerState::Stopped);
        assert_eq!(receiver.recv().await, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_open_is_a_startup_error() {
        let mut source = MockInputSource::new();
        source
            .expect_open()
            .returning(|| Err(anyhow!("no display")));
        source.expect_next_event().never();
        let (sender, _receiver) = mpsc::channel(16);

        let result = InputListener::start(source, sender).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_source_error_closes_channel() -> Result<()> {
        let mut source = MockInputSource::new();
        source.expect_open().returning(|| Ok(()));
        source
            .expect_next_event()
            .returning(|_| Err(anyhow!("connection lost")));
        let (sender, mut receiver) = mpsc::channel(16);

        let listener = InputListener::start(source, sender).await?;

        assert_eq!(receiver.recv().await, None);
        assert_eq!(listener.state(), ListenerState::Stopped);
        Ok(())
    }

    #[tokio::test]
    async fn test_stop_releases_a_blocked_sender() -> Result<()> {
        let source = ScriptedSource {
            events: (0..10)
                .map(|i| RawEvent::Motion(Position::new(i as f64, 0.)))
                .collect(),
        };
        let (sender, mut receiver) = mpsc::channel(1);

        let mut listener = InputListener::start(source, sender).await?;
        tokio::time::sleep(Duration::from_millis(50)).await;

        receiver.close();
        listener.stop();

        let mut drained = 0;
        while receiver.try_recv().is_ok() {
            drained += 1;
        }
        assert_eq!(drained, 1);
        Ok(())
    }
}
