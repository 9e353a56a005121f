use std::sync::Arc;

/// Absolute pointer position in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Everything an input source can report. Only keys and pointer motion are of interest to the
/// daemon, the rest is filtered out before it reaches the processing side.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    Key {
        code: Arc<str>,
        scancode: u32,
        value: i32,
    },
    Motion(Position),
    /// Buttons, scrolling, hierarchy changes and so on. Carries the kind for logging.
    Other(&'static str),
}

/// Event that crossed the thread boundary and is going to be processed.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        code: Arc<str>,
        scancode: u32,
        value: i32,
    },
    Move(Position),
}

impl RawEvent {
    /// Keeps the two event kinds the daemon records.
    pub fn into_input(self) -> Option<InputEvent> {
        match self {
            RawEvent::Key {
                code,
                scancode,
                value,
            } => Some(InputEvent::Key {
                code,
                scancode,
                value,
            }),
            RawEvent::Motion(position) => Some(InputEvent::Move(position)),
            RawEvent::Other(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_events_are_dropped() {
        assert_eq!(RawEvent::Other("button").into_input(), None);
        assert_eq!(
            RawEvent::Motion(Position::new(1., 2.)).into_input(),
            Some(InputEvent::Move(Position::new(1., 2.)))
        );
        assert_eq!(
            RawEvent::Key {
                code: "KEY_A".into(),
                scancode: 38,
                value: 1
            }
            .into_input(),
            Some(InputEvent::Key {
                code: "KEY_A".into(),
                scancode: 38,
                value: 1
            })
        );
    }
}
