#![forbid(unsafe_code)]

//! Raw payloads delivered by the platform windowing backend.
//!
//! One [`RawEvent`] corresponds to one platform callback. The payload shapes
//! mirror what backends actually report: cursor coordinates, a button mask
//! plus tablet samples, key codes with their text, wheel deltas and trackpad
//! gesture deltas.

use crate::event::TimerId;
use crate::keys::PlatformKey;

/// Mouse button as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformButton {
    Left,
    Middle,
    Right,
    Button4,
    Button5,
    Button6,
    Button7,
}

/// Tablet pen sample as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTablet {
    pub mode: RawTabletMode,
    /// Raw pressure, before the preference curve.
    pub pressure: f32,
    pub x_tilt: f32,
    pub y_tilt: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawTabletMode {
    None,
    Stylus,
    Eraser,
}

/// Trackpad gesture kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackpadGesture {
    Scroll,
    Magnify,
    SmartMagnify,
    Rotate,
}

/// One raw platform callback.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    CursorMove {
        x: i32,
        y: i32,
    },
    Trackpad {
        gesture: TrackpadGesture,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
        is_direction_inverted: bool,
    },
    ButtonDown {
        button: PlatformButton,
        tablet: Option<RawTablet>,
    },
    ButtonUp {
        button: PlatformButton,
        tablet: Option<RawTablet>,
    },
    KeyDown {
        key: PlatformKey,
        ascii: u8,
        /// NUL-terminated UTF-8 bytes of the produced character.
        utf8: [u8; 6],
        is_repeat: bool,
    },
    KeyUp {
        key: PlatformKey,
        ascii: u8,
        utf8: [u8; 6],
        is_repeat: bool,
    },
    Wheel {
        z: i32,
    },
    Timer {
        timer: TimerId,
    },
    WindowDeactivate,
    /// Anything the backend could not classify.
    Unknown,
}

impl RawEvent {
    /// Key press carrying `text` as its produced character (may be empty).
    #[must_use]
    pub fn key_down(key: PlatformKey, text: &str) -> Self {
        let (ascii, utf8) = text_payload(text);
        Self::KeyDown {
            key,
            ascii,
            utf8,
            is_repeat: false,
        }
    }

    /// Key release with no text payload.
    #[must_use]
    pub fn key_up(key: PlatformKey) -> Self {
        Self::KeyUp {
            key,
            ascii: 0,
            utf8: [0; 6],
            is_repeat: false,
        }
    }

    /// Button press without tablet data.
    #[must_use]
    pub fn button_down(button: PlatformButton) -> Self {
        Self::ButtonDown {
            button,
            tablet: None,
        }
    }

    /// Button release without tablet data.
    #[must_use]
    pub fn button_up(button: PlatformButton) -> Self {
        Self::ButtonUp {
            button,
            tablet: None,
        }
    }
}

/// Encode the first character of `text` the way backends fill key payloads.
fn text_payload(text: &str) -> (u8, [u8; 6]) {
    let mut utf8 = [0u8; 6];
    let Some(c) = text.chars().next() else {
        return (0, utf8);
    };
    c.encode_utf8(&mut utf8);
    let ascii = if c.is_ascii() { c as u8 } else { 0 };
    (ascii, utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_down_payload_from_text() {
        let RawEvent::KeyDown { ascii, utf8, .. } = RawEvent::key_down(PlatformKey::KEY_A, "a")
        else {
            unreachable!()
        };
        assert_eq!(ascii, b'a');
        assert_eq!(utf8[0], b'a');
        assert_eq!(utf8[1], 0);
    }

    #[test]
    fn non_ascii_text_has_no_ascii_byte() {
        let RawEvent::KeyDown { ascii, utf8, .. } = RawEvent::key_down(PlatformKey::letter('e'), "é")
        else {
            unreachable!()
        };
        assert_eq!(ascii, 0);
        assert_eq!(&utf8[..2], "é".as_bytes());
    }

    #[test]
    fn empty_text_is_empty_payload() {
        assert_eq!(
            RawEvent::key_down(PlatformKey::ESC, ""),
            RawEvent::KeyDown {
                key: PlatformKey::ESC,
                ascii: 0,
                utf8: [0; 6],
                is_repeat: false,
            }
        );
    }
}
