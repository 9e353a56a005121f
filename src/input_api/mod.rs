//! Contains logic for reading raw input from different environments.
//! [GenericInputSource] is the main artifact of this module that abstracts
//! the operations.

pub mod keys;
#[cfg(feature = "x11")]
pub mod x11;

use std::time::Duration;

use anyhow::Result;

use crate::daemon::collection::events::RawEvent;

/// Contract an input backend must implement. Every method is called from the listener thread,
/// so implementations may hold thread-bound handles once [InputSource::open] succeeds.
#[cfg_attr(test, mockall::automock)]
pub trait InputSource: Send {
    /// Connects to the underlying input system and subscribes to events.
    fn open(&mut self) -> Result<()>;

    /// Waits up to `timeout` for the next event. `None` means nothing arrived in time.
    fn next_event(&mut self, timeout: Duration) -> Result<Option<RawEvent>>;
}

/// Serves as a cross-compatible InputSource implementation.
pub struct GenericInputSource {
    inner: Box<dyn InputSource>,
}

impl GenericInputSource {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "x11")] {
                use x11::XInputSource;
                Ok(Self {
                    inner: Box::new(XInputSource::new()),
                })
            } else {
                anyhow::bail!("No input backend was enabled at build time")
            }
        }
    }
}

impl InputSource for GenericInputSource {
    fn open(&mut self) -> Result<()> {
        self.inner.open()
    }

    fn next_event(&mut self, timeout: Duration) -> Result<Option<RawEvent>> {
        self.inner.next_event(timeout)
    }
}
