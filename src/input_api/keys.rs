//! Naming of key codes. X keycodes are evdev codes shifted by 8, and records use the evdev names
//! so rows look the same regardless of which backend produced them.

use std::sync::Arc;

const X_KEYCODE_OFFSET: u32 = 8;

/// Evdev names indexed by evdev code, starting at `KEY_ESC` = 1.
const EVDEV_NAMES: [&str; 88] = [
    "KEY_RESERVED",
    "KEY_ESC",
    "KEY_1",
    "KEY_2",
    "KEY_3",
    "KEY_4",
    "KEY_5",
    "KEY_6",
    "KEY_7",
    "KEY_8",
    "KEY_9",
    "KEY_0",
    "KEY_MINUS",
    "KEY_EQUAL",
    "KEY_BACKSPACE",
    "KEY_TAB",
    "KEY_Q",
    "KEY_W",
    "KEY_E",
    "KEY_R",
    "KEY_T",
    "KEY_Y",
    "KEY_U",
    "KEY_I",
    "KEY_O",
    "KEY_P",
    "KEY_LEFTBRACE",
    "KEY_RIGHTBRACE",
    "KEY_ENTER",
    "KEY_LEFTCTRL",
    "KEY_A",
    "KEY_S",
    "KEY_D",
    "KEY_F",
    "KEY_G",
    "KEY_H",
    "KEY_J",
    "KEY_K",
    "KEY_L",
    "KEY_SEMICOLON",
    "KEY_APOSTROPHE",
    "KEY_GRAVE",
    "KEY_LEFTSHIFT",
    "KEY_BACKSLASH",
    "KEY_Z",
    "KEY_X",
    "KEY_C",
    "KEY_V",
    "KEY_B",
    "KEY_N",
    "KEY_M",
    "KEY_COMMA",
    "KEY_DOT",
    "KEY_SLASH",
    "KEY_RIGHTSHIFT",
    "KEY_KPASTERISK",
    "KEY_LEFTALT",
    "KEY_SPACE",
    "KEY_CAPSLOCK",
    "KEY_F1",
    "KEY_F2",
    "KEY_F3",
    "KEY_F4",
    "KEY_F5",
    "KEY_F6",
    "KEY_F7",
    "KEY_F8",
    "KEY_F9",
    "KEY_F10",
    "KEY_NUMLOCK",
    "KEY_SCROLLLOCK",
    "KEY_KP7",
    "KEY_KP8",
    "KEY_KP9",
    "KEY_KPMINUS",
    "KEY_KP4",
    "KEY_KP5",
    "KEY_KP6",
    "KEY_KPPLUS",
    "KEY_KP1",
    "KEY_KP2",
    "KEY_KP3",
    "KEY_KP0",
    "KEY_KPDOT",
    "KEY_UNKNOWN_84",
    "KEY_ZENKAKUHANKAKU",
    "KEY_102ND",
    "KEY_F11",
];

/// Evdev names of the navigation block, which is not contiguous with the table above.
fn extended_name(evdev_code: u32) -> Option<&'static str> {
    Some(match evdev_code {
        88 => "KEY_F12",
        96 => "KEY_KPENTER",
        97 => "KEY_RIGHTCTRL",
        98 => "KEY_KPSLASH",
        99 => "KEY_SYSRQ",
        100 => "KEY_RIGHTALT",
        102 => "KEY_HOME",
        103 => "KEY_UP",
        104 => "KEY_PAGEUP",
        105 => "KEY_LEFT",
        106 => "KEY_RIGHT",
        107 => "KEY_END",
        108 => "KEY_DOWN",
        109 => "KEY_PAGEDOWN",
        110 => "KEY_INSERT",
        111 => "KEY_DELETE",
        119 => "KEY_PAUSE",
        125 => "KEY_LEFTMETA",
        126 => "KEY_RIGHTMETA",
        127 => "KEY_COMPOSE",
        _ => return None,
    })
}

/// Returns the evdev name of an X keycode, or `KEY_UNKNOWN_<evdev code>` if it has none.
pub fn x_keycode_name(keycode: u32) -> Arc<str> {
    let Some(evdev_code) = keycode.checked_sub(X_KEYCODE_OFFSET) else {
        return format!("KEY_UNKNOWN_X{keycode}").into();
    };
    EVDEV_NAMES
        .get(evdev_code as usize)
        .copied()
        .or_else(|| extended_name(evdev_code))
        .map(Arc::from)
        .unwrap_or_else(|| format!("KEY_UNKNOWN_{evdev_code}").into())
}
