use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{info, instrument};
use xcb::{x, xinput, Connection};

use crate::daemon::collection::events::{Position, RawEvent};

use super::{keys::x_keycode_name, InputSource};

/// xcb has no timed wait, so the queue is polled with this pause in between.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

struct OpenedSource {
    connection: Connection,
    root: x::Window,
}

/// Reads raw key and motion events of all master devices through XInput2.
pub struct XInputSource {
    opened: Option<OpenedSource>,
}

impl XInputSource {
    pub fn new() -> Self {
        Self { opened: None }
    }
}

impl Default for XInputSource {
    fn default() -> Self {
        Self::new()
    }
}

fn root_window(connection: &Connection, screen: i32) -> Result<x::Window> {
    connection
        .get_setup()
        .roots()
        .nth(screen.max(0) as usize)
        .map(|screen| screen.root())
        .ok_or_else(|| anyhow!("X screen {screen} doesn't exist"))
}

fn pointer_position(connection: &Connection, root: x::Window) -> Result<Position> {
    let reply = connection.wait_for_reply(connection.send_request(&x::QueryPointer { window: root }))?;
    Ok(Position::new(reply.root_x() as f64, reply.root_y() as f64))
}

fn translate(opened: &OpenedSource, event: xcb::Event) -> Result<RawEvent> {
    let event = match event {
        xcb::Event::Input(xinput::Event::RawKeyPress(event)) => RawEvent::Key {
            code: x_keycode_name(event.detail()),
            scancode: event.detail(),
            value: 1,
        },
        xcb::Event::Input(xinput::Event::RawKeyRelease(event)) => RawEvent::Key {
            code: x_keycode_name(event.detail()),
            scancode: event.detail(),
            value: 0,
        },
        // Raw motion only has device deltas. The absolute position is what gets recorded.
        xcb::Event::Input(xinput::Event::RawMotion(_)) => {
            RawEvent::Motion(pointer_position(&opened.connection, opened.root)?)
        }
        xcb::Event::Input(_) => RawEvent::Other("xinput"),
        _ => RawEvent::Other("x11"),
    };
    Ok(event)
}

impl InputSource for XInputSource {
    #[instrument(skip(self))]
    fn open(&mut self) -> Result<()> {
        let (connection, screen) =
            Connection::connect_with_extensions(None, &[xcb::Extension::Input], &[])
                .context("failed to connect to the X server")?;

        let version = connection.wait_for_reply(connection.send_request(
            &xinput::XiQueryVersion {
                major_version: 2,
                minor_version: 0,
            },
        ))?;
        if version.major_version() < 2 {
            bail!(
                "XInput {}.{} is too old, 2.0 is required",
                version.major_version(),
                version.minor_version()
            );
        }

        let root = root_window(&connection, screen)?;
        connection
            .send_and_check_request(&xinput::XiSelectEvents {
                window: root,
                masks: &[xinput::EventMaskBuf::new(
                    xinput::Device::AllMaster,
                    &[xinput::XiEventMask::RAW_KEY_PRESS
                        | xinput::XiEventMask::RAW_KEY_RELEASE
                        | xinput::XiEventMask::RAW_MOTION],
                )],
            })
            .context("failed to select XInput events")?;

        info!("Listening to XInput events on screen {screen}");
        self.opened = Some(OpenedSource { connection, root });
        Ok(())
    }

    fn next_event(&mut self, timeout: Duration) -> Result<Option<RawEvent>> {
        let Some(opened) = self.opened.as_ref() else {
            bail!("XInput source was polled before it was opened");
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(event) = opened.connection.poll_for_event()? {
                return translate(opened, event).map(Some);
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
