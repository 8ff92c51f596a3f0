#![forbid(unsafe_code)]

//! Canonical key codes and the platform key-code translation table.
//!
//! Platform backends report keys as [`PlatformKey`] codes: ASCII values for
//! printable keys, then contiguous blocks above `0x100` for modifiers,
//! navigation, numpad, function and media keys. [`convert_key`] maps those
//! codes onto [`Key`], using range arithmetic for the contiguous blocks
//! (letters, digits, numpad digits, F1-F24) and a table for everything else.
//!
//! Keys that have no canonical equivalent (Clear, NumLock, ScrollLock,
//! PrintScreen) convert to `None` and never become events.

/// Canonical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Key {
    /// Letter key, stored as the uppercase ASCII byte `b'A'..=b'Z'`.
    Letter(u8),
    /// Top-row digit `0..=9`.
    Digit(u8),
    /// Numpad digit `0..=9`.
    Numpad(u8),
    /// Function key `1..=24`.
    F(u8),
    PadPeriod,
    PadEnter,
    PadPlus,
    PadMinus,
    PadAsterisk,
    PadSlash,
    Backspace,
    Tab,
    Linefeed,
    Enter,
    Esc,
    Space,
    Quote,
    Comma,
    Minus,
    Plus,
    Period,
    Slash,
    Semicolon,
    Equal,
    LeftBracket,
    RightBracket,
    Backslash,
    AccentGrave,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
    OsKey,
    GrLess,
    App,
    CapsLock,
    LeftArrow,
    RightArrow,
    UpArrow,
    DownArrow,
    Pause,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    MediaPlay,
    MediaStop,
    MediaFirst,
    MediaLast,
    /// A key the platform reported but that has no canonical mapping.
    Unknown,
}

impl Key {
    /// Shift, Ctrl, Alt or the OS key (either side).
    #[must_use]
    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::LeftShift
                | Self::RightShift
                | Self::LeftCtrl
                | Self::RightCtrl
                | Self::LeftAlt
                | Self::RightAlt
                | Self::OsKey
        )
    }

    /// Keys usable as hotkeys: everything except modifiers and `Unknown`.
    #[must_use]
    pub const fn is_hotkey(self) -> bool {
        !self.is_modifier() && !matches!(self, Self::Unknown)
    }

    /// Remap a top-row key to its numpad equivalent for keyboards without one.
    ///
    /// Digits become numpad digits, `-` becomes pad-minus, `=` becomes
    /// pad-plus and `\` becomes pad-slash. Other keys are returned unchanged.
    #[must_use]
    pub const fn numpad_emulated(self) -> Self {
        match self {
            Self::Digit(n) => Self::Numpad(n),
            Self::Minus => Self::PadMinus,
            Self::Equal => Self::PadPlus,
            Self::Backslash => Self::PadSlash,
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Platform key codes
// ---------------------------------------------------------------------------

/// Raw key code as delivered by the platform backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformKey(pub i32);

impl PlatformKey {
    pub const UNKNOWN: Self = Self(-1);
    pub const BACKSPACE: Self = Self(0);
    pub const TAB: Self = Self(1);
    pub const LINEFEED: Self = Self(2);
    pub const CLEAR: Self = Self(3);
    pub const ENTER: Self = Self(0x0D);
    pub const ESC: Self = Self(0x1B);
    pub const SPACE: Self = Self(b' ' as i32);
    pub const QUOTE: Self = Self(0x27);
    pub const COMMA: Self = Self(b',' as i32);
    pub const MINUS: Self = Self(b'-' as i32);
    pub const PLUS: Self = Self(b'+' as i32);
    pub const PERIOD: Self = Self(b'.' as i32);
    pub const SLASH: Self = Self(b'/' as i32);
    pub const KEY_0: Self = Self(b'0' as i32);
    pub const KEY_9: Self = Self(b'9' as i32);
    pub const SEMICOLON: Self = Self(b';' as i32);
    pub const EQUAL: Self = Self(b'=' as i32);
    pub const KEY_A: Self = Self(b'A' as i32);
    pub const KEY_Z: Self = Self(b'Z' as i32);
    pub const LEFT_BRACKET: Self = Self(b'[' as i32);
    pub const RIGHT_BRACKET: Self = Self(b']' as i32);
    pub const BACKSLASH: Self = Self(0x5C);
    pub const ACCENT_GRAVE: Self = Self(b'`' as i32);

    pub const LEFT_SHIFT: Self = Self(0x100);
    pub const RIGHT_SHIFT: Self = Self(0x101);
    pub const LEFT_CTRL: Self = Self(0x102);
    pub const RIGHT_CTRL: Self = Self(0x103);
    pub const LEFT_ALT: Self = Self(0x104);
    pub const RIGHT_ALT: Self = Self(0x105);
    pub const OS: Self = Self(0x106);
    pub const GR_LESS: Self = Self(0x107);
    pub const APP: Self = Self(0x108);
    pub const CAPS_LOCK: Self = Self(0x109);
    pub const NUM_LOCK: Self = Self(0x10A);
    pub const SCROLL_LOCK: Self = Self(0x10B);
    pub const LEFT_ARROW: Self = Self(0x10C);
    pub const RIGHT_ARROW: Self = Self(0x10D);
    pub const UP_ARROW: Self = Self(0x10E);
    pub const DOWN_ARROW: Self = Self(0x10F);
    pub const PRINT_SCREEN: Self = Self(0x110);
    pub const PAUSE: Self = Self(0x111);
    pub const INSERT: Self = Self(0x112);
    pub const DELETE: Self = Self(0x113);
    pub const HOME: Self = Self(0x114);
    pub const END: Self = Self(0x115);
    pub const PAGE_UP: Self = Self(0x116);
    pub const PAGE_DOWN: Self = Self(0x117);
    pub const NUMPAD_0: Self = Self(0x118);
    pub const NUMPAD_9: Self = Self(0x121);
    pub const NUMPAD_PERIOD: Self = Self(0x122);
    pub const NUMPAD_ENTER: Self = Self(0x123);
    pub const NUMPAD_PLUS: Self = Self(0x124);
    pub const NUMPAD_MINUS: Self = Self(0x125);
    pub const NUMPAD_ASTERISK: Self = Self(0x126);
    pub const NUMPAD_SLASH: Self = Self(0x127);
    pub const F1: Self = Self(0x128);
    pub const F24: Self = Self(0x13F);
    pub const MEDIA_PLAY: Self = Self(0x140);
    pub const MEDIA_STOP: Self = Self(0x141);
    pub const MEDIA_FIRST: Self = Self(0x142);
    pub const MEDIA_LAST: Self = Self(0x143);

    /// Letter key for `c` (case-insensitive). Non-letters map to `UNKNOWN`.
    #[must_use]
    pub const fn letter(c: char) -> Self {
        let upper = c.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Self(upper as i32)
        } else {
            Self::UNKNOWN
        }
    }

    /// Top-row digit key. Values above 9 map to `UNKNOWN`.
    #[must_use]
    pub const fn digit(n: u8) -> Self {
        if n <= 9 {
            Self(Self::KEY_0.0 + n as i32)
        } else {
            Self::UNKNOWN
        }
    }

    /// Function key `F<n>`. Values outside `1..=24` map to `UNKNOWN`.
    #[must_use]
    pub const fn function(n: u8) -> Self {
        if n >= 1 && n <= 24 {
            Self(Self::F1.0 + n as i32 - 1)
        } else {
            Self::UNKNOWN
        }
    }
}

/// Translate a platform key code into a canonical [`Key`].
///
/// Returns `None` for keys deliberately left unmapped (Clear, NumLock,
/// ScrollLock, PrintScreen). Codes outside the table become [`Key::Unknown`].
#[must_use]
pub fn convert_key(key: PlatformKey) -> Option<Key> {
    let code = key.0;
    if (PlatformKey::KEY_A.0..=PlatformKey::KEY_Z.0).contains(&code) {
        return Some(Key::Letter(code as u8));
    }
    if (PlatformKey::KEY_0.0..=PlatformKey::KEY_9.0).contains(&code) {
        return Some(Key::Digit((code - PlatformKey::KEY_0.0) as u8));
    }
    if (PlatformKey::NUMPAD_0.0..=PlatformKey::NUMPAD_9.0).contains(&code) {
        return Some(Key::Numpad((code - PlatformKey::NUMPAD_0.0) as u8));
    }
    if (PlatformKey::F1.0..=PlatformKey::F24.0).contains(&code) {
        return Some(Key::F((code - PlatformKey::F1.0 + 1) as u8));
    }

    let mapped = match key {
        PlatformKey::BACKSPACE => Key::Backspace,
        PlatformKey::TAB => Key::Tab,
        PlatformKey::LINEFEED => Key::Linefeed,
        PlatformKey::ENTER => Key::Enter,
        PlatformKey::ESC => Key::Esc,
        PlatformKey::SPACE => Key::Space,
        PlatformKey::QUOTE => Key::Quote,
        PlatformKey::COMMA => Key::Comma,
        PlatformKey::MINUS => Key::Minus,
        PlatformKey::PLUS => Key::Plus,
        PlatformKey::PERIOD => Key::Period,
        PlatformKey::SLASH => Key::Slash,
        PlatformKey::SEMICOLON => Key::Semicolon,
        PlatformKey::EQUAL => Key::Equal,
        PlatformKey::LEFT_BRACKET => Key::LeftBracket,
        PlatformKey::RIGHT_BRACKET => Key::RightBracket,
        PlatformKey::BACKSLASH => Key::Backslash,
        PlatformKey::ACCENT_GRAVE => Key::AccentGrave,
        PlatformKey::LEFT_SHIFT => Key::LeftShift,
        PlatformKey::RIGHT_SHIFT => Key::RightShift,
        PlatformKey::LEFT_CTRL => Key::LeftCtrl,
        PlatformKey::RIGHT_CTRL => Key::RightCtrl,
        PlatformKey::OS => Key::OsKey,
        PlatformKey::LEFT_ALT => Key::LeftAlt,
        PlatformKey::RIGHT_ALT => Key::RightAlt,
        PlatformKey::APP => Key::App,
        PlatformKey::CAPS_LOCK => Key::CapsLock,
        PlatformKey::LEFT_ARROW => Key::LeftArrow,
        PlatformKey::RIGHT_ARROW => Key::RightArrow,
        PlatformKey::UP_ARROW => Key::UpArrow,
        PlatformKey::DOWN_ARROW => Key::DownArrow,
        PlatformKey::PAUSE => Key::Pause,
        PlatformKey::INSERT => Key::Insert,
        PlatformKey::DELETE => Key::Delete,
        PlatformKey::HOME => Key::Home,
        PlatformKey::END => Key::End,
        PlatformKey::PAGE_UP => Key::PageUp,
        PlatformKey::PAGE_DOWN => Key::PageDown,
        PlatformKey::NUMPAD_PERIOD => Key::PadPeriod,
        PlatformKey::NUMPAD_ENTER => Key::PadEnter,
        PlatformKey::NUMPAD_PLUS => Key::PadPlus,
        PlatformKey::NUMPAD_MINUS => Key::PadMinus,
        PlatformKey::NUMPAD_ASTERISK => Key::PadAsterisk,
        PlatformKey::NUMPAD_SLASH => Key::PadSlash,
        PlatformKey::GR_LESS => Key::GrLess,
        PlatformKey::MEDIA_PLAY => Key::MediaPlay,
        PlatformKey::MEDIA_STOP => Key::MediaStop,
        PlatformKey::MEDIA_FIRST => Key::MediaFirst,
        PlatformKey::MEDIA_LAST => Key::MediaLast,
        PlatformKey::CLEAR
        | PlatformKey::NUM_LOCK
        | PlatformKey::SCROLL_LOCK
        | PlatformKey::PRINT_SCREEN => return None,
        _ => Key::Unknown,
    };
    Some(mapped)
}
