//! Contains logic for finding out which application has focus in different environments.
//! [GenericWindowManager] is the main artifact of this module that abstracts
//! the operations.

#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "x11")]
extern crate xcb;

use std::sync::Arc;

use anyhow::Result;

/// Intended to serve as a contract window systems must implement.
#[cfg_attr(test, mockall::automock)]
pub trait WindowManager {
    /// Processes focus notifications that arrived since the last call. Without this the next
    /// query may describe the window that was active before the last switch.
    fn refresh(&mut self) -> Result<()>;

    /// Application name of the focused window, for example `Firefox` or `Alacritty`. `None` when
    /// nothing has focus, which briefly happens while switching windows.
    fn get_active_window_name(&mut self) -> Result<Option<Arc<str>>>;
}

/// Serves as a cross-compatible WindowManager implementation.
pub struct GenericWindowManager {
    inner: Box<dyn WindowManager>,
}

impl GenericWindowManager {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "x11")] {
                use x11::LinuxWindowManager;
                Ok(Self {
                    inner: Box::new(LinuxWindowManager::new()?),
                })
            }
            else {
                anyhow::bail!("No window manager was enabled at build time")
            }
        }
    }
}

impl WindowManager for GenericWindowManager {
    fn refresh(&mut self) -> Result<()> {
        self.inner.refresh()
    }

    fn get_active_window_name(&mut self) -> Result<Option<Arc<str>>> {
        self.inner.get_active_window_name()
    }
}
