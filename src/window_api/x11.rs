use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, instrument};
use xcb::{
    x::{self, Atom, GetProperty, InternAtom, Window},
    Connection, Xid,
};

use super::WindowManager;

fn get_active_window_atom(conn: &Connection) -> Result<Atom> {
    let active_window_atom = conn.wait_for_reply(conn.send_request(&InternAtom {
        only_if_exists: false,
        name: b"_NET_ACTIVE_WINDOW",
    }))?;
    Ok(active_window_atom.atom())
}

fn get_active_window(conn: &Connection, root: Window, active_window_atom: Atom) -> Result<Option<Window>> {
    let result = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window: root,
        property: active_window_atom,
        r#type: x::ATOM_WINDOW,
        long_offset: 0,
        long_length: 1,
    }))?;
    Ok(result
        .value::<Window>()
        .first()
        .copied()
        .filter(|window| window.resource_id() != 0))
}

/// Reads the class part of `WM_CLASS`, which is stored as `instance\0class\0`.
fn get_class_name(conn: &Connection, window: Window) -> Result<Option<String>> {
    let wm_class = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window,
        property: x::ATOM_WM_CLASS,
        r#type: x::ATOM_STRING,
        long_offset: 0,
        long_length: 1024,
    }))?;
    Ok(parse_wm_class(wm_class.value::<u8>()))
}

fn parse_wm_class(value: &[u8]) -> Option<String> {
    let mut parts = value
        .split(|byte| *byte == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned());
    let instance = parts.next();
    parts.next().or(instance)
}

pub struct LinuxWindowManager {
    connection: Connection,
    root: Window,
    active_window_atom: Atom,
    /// Focused window as of the last query. Cleared when the root window reports a change of
    /// `_NET_ACTIVE_WINDOW`.
    active_window: Option<Window>,
}

impl LinuxWindowManager {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) =
            xcb::Connection::connect(None).context("failed to connect to the X server")?;
        let root = connection
            .get_setup()
            .roots()
            .nth(preferred_screen.max(0) as usize)
            .map(|screen| screen.root())
            .ok_or_else(|| anyhow!("X screen {preferred_screen} doesn't exist"))?;
        let active_window_atom = get_active_window_atom(&connection)?;

        connection
            .send_and_check_request(&x::ChangeWindowAttributes {
                window: root,
                value_list: &[x::Cw::EventMask(x::EventMask::PROPERTY_CHANGE)],
            })
            .context("failed to subscribe to focus changes")?;

        Ok(Self {
            connection,
            root,
            active_window_atom,
            active_window: None,
        })
    }
}

impl WindowManager for LinuxWindowManager {
    #[instrument(skip(self))]
    fn refresh(&mut self) -> Result<()> {
        while let Some(event) = self.connection.poll_for_event()? {
            if let xcb::Event::X(x::Event::PropertyNotify(event)) = event {
                if event.atom() == self.active_window_atom {
                    self.active_window = None;
                }
            }
        }
        Ok(())
    }

    fn get_active_window_name(&mut self) -> Result<Option<Arc<str>>> {
        let window = match self.active_window {
            Some(window) => window,
            None => {
                let Some(window) =
                    get_active_window(&self.connection, self.root, self.active_window_atom)?
                else {
                    return Ok(None);
                };
                debug!("Focus moved to window {}", window.resource_id());
                self.active_window = Some(window);
                window
            }
        };

        match get_class_name(&self.connection, window) {
            Ok(name) => Ok(name.map(Arc::from)),
            Err(e) => {
                // Most likely the window is already gone. Ask again next time.
                self.active_window = None;
                Err(e)
            }
        }
    }
}
