#![forbid(unsafe_code)]

//! Canonical input events.
//!
//! An [`Event`] is the normalized form of every platform callback: mouse
//! motion and buttons, keys, wheel, trackpad gestures, timers and window
//! deactivation all share one record. Each window keeps a resting copy of the
//! last known input state (its *event state*) and new events are synthesized
//! from it, so modifier and click bookkeeping carry over from one event to
//! the next.
//!
//! # Invariants
//!
//! - `prev_kind`/`prev_value` always describe the state *before* the current
//!   `kind`/`value` were assigned.
//! - Modifier fields hold [`ModState::FIRST`] for a plain press and
//!   `FIRST | SECOND` when the modifier went down while another one was
//!   already held.

use bitflags::bitflags;
use web_time::Instant;

use crate::keys::Key;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in window space (pixels, origin bottom-left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle with inclusive bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl Rect {
    #[must_use]
    pub const fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Inclusive containment test.
    #[must_use]
    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }
}

// ---------------------------------------------------------------------------
// Event type and value
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventType {
    #[default]
    None,
    LeftMouse,
    MiddleMouse,
    RightMouse,
    Button4Mouse,
    Button5Mouse,
    Button6Mouse,
    Button7Mouse,
    MouseMove,
    /// A move sample superseded by a later one before dispatch.
    InbetweenMouseMove,
    TrackpadPan,
    TrackpadZoom,
    TrackpadRotate,
    TrackpadSmartZoom,
    WheelUp,
    WheelDown,
    WheelIn,
    WheelOut,
    Key(Key),
    Timer,
    WindowDeactivate,
    /// Sent to UI handlers when a modal operator takes over input.
    UiCancel,
    /// Drag-and-drop payload released over a window.
    Drop,
}

impl EventType {
    #[must_use]
    pub const fn is_mouse_motion(self) -> bool {
        matches!(self, Self::MouseMove | Self::InbetweenMouseMove)
    }

    #[must_use]
    pub const fn is_mouse_button(self) -> bool {
        matches!(
            self,
            Self::LeftMouse
                | Self::MiddleMouse
                | Self::RightMouse
                | Self::Button4Mouse
                | Self::Button5Mouse
                | Self::Button6Mouse
                | Self::Button7Mouse
        )
    }

    #[must_use]
    pub const fn is_wheel(self) -> bool {
        matches!(
            self,
            Self::WheelUp | Self::WheelDown | Self::WheelIn | Self::WheelOut
        )
    }

    #[must_use]
    pub const fn is_gesture(self) -> bool {
        matches!(
            self,
            Self::TrackpadPan | Self::TrackpadZoom | Self::TrackpadRotate | Self::TrackpadSmartZoom
        )
    }

    /// Any pointer-device event: motion, buttons, wheel or trackpad.
    #[must_use]
    pub const fn is_mouse(self) -> bool {
        self.is_mouse_motion() || self.is_mouse_button() || self.is_wheel() || self.is_gesture()
    }

    #[must_use]
    pub const fn is_keyboard(self) -> bool {
        matches!(self, Self::Key(_))
    }

    #[must_use]
    pub const fn is_key_modifier(self) -> bool {
        match self {
            Self::Key(k) => k.is_modifier(),
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_hotkey(self) -> bool {
        match self {
            Self::Key(k) => k.is_hotkey(),
            _ => false,
        }
    }

    #[must_use]
    pub const fn key(self) -> Option<Key> {
        match self {
            Self::Key(k) => Some(k),
            _ => None,
        }
    }
}

/// Press state carried by an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyValue {
    #[default]
    Nothing,
    Press,
    Release,
    Click,
    DoubleClick,
    ClickDrag,
}

bitflags! {
    /// Per-modifier state: plain press or pressed while another was held.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ModState: u8 {
        const FIRST = 1 << 0;
        const SECOND = 1 << 1;
    }
}

impl ModState {
    #[must_use]
    pub const fn is_held(self) -> bool {
        !self.is_empty()
    }
}

bitflags! {
    /// Summary of held modifiers, for display and coarse matching.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE = 0;
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const OSKEY = 1 << 3;
    }
}

bitflags! {
    /// Out-of-band event markers.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct EventFlags: u8 {
        /// Treat this move as having crossed the drag threshold.
        const FORCE_DRAG_THRESHOLD = 1 << 0;
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Tablet pen state attached to pointer events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabletData {
    pub active: TabletMode,
    /// Pressure after the preference curve, `0.0..=1.0`.
    pub pressure: f32,
    pub x_tilt: f32,
    pub y_tilt: f32,
    pub is_motion_absolute: bool,
}

impl Default for TabletData {
    fn default() -> Self {
        Self {
            active: TabletMode::None,
            pressure: 1.0,
            x_tilt: 0.0,
            y_tilt: 0.0,
            is_motion_absolute: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TabletMode {
    #[default]
    None,
    Stylus,
    Eraser,
}

/// Identifies a window timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Opaque data carried by timer and drag-drop events.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CustomData {
    #[default]
    None,
    Timer(TimerId),
    DragDrop(Vec<DragItem>),
}

/// One dragged item. The payload is opaque to the window manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragItem {
    pub kind: String,
    pub payload: String,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A canonical input event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventType,
    pub value: KeyValue,
    pub mouse_pos: Point,
    pub prev_mouse_pos: Point,
    pub shift: ModState,
    pub ctrl: ModState,
    pub alt: ModState,
    pub oskey: ModState,
    /// A non-modifier key held down that acts as an extra modifier.
    pub keymodifier: Option<Key>,
    pub is_repeat: bool,
    /// Trackpad deltas are inverted by the platform ("natural" scrolling).
    pub is_direction_inverted: bool,
    pub ascii: Option<u8>,
    pub utf8: Option<char>,
    pub tablet: TabletData,
    pub custom: CustomData,
    pub flags: EventFlags,
    pub prev_kind: EventType,
    pub prev_value: KeyValue,
    pub prev_click_time: Option<Instant>,
    pub prev_click_pos: Point,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            kind: EventType::None,
            value: KeyValue::Nothing,
            mouse_pos: Point::default(),
            prev_mouse_pos: Point::default(),
            shift: ModState::empty(),
            ctrl: ModState::empty(),
            alt: ModState::empty(),
            oskey: ModState::empty(),
            keymodifier: None,
            is_repeat: false,
            is_direction_inverted: false,
            ascii: None,
            utf8: None,
            tablet: TabletData::default(),
            custom: CustomData::None,
            flags: EventFlags::empty(),
            prev_kind: EventType::None,
            prev_value: KeyValue::Nothing,
            prev_click_time: None,
            prev_click_pos: Point::default(),
        }
    }
}

impl Event {
    /// Create an event of `kind` with `value` and default state.
    #[must_use]
    pub fn new(kind: EventType, value: KeyValue) -> Self {
        Self {
            kind,
            value,
            ..Self::default()
        }
    }

    /// Set the mouse position.
    #[must_use]
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.mouse_pos = Point::new(x, y);
        self
    }

    /// Mark shift as held.
    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.shift = ModState::FIRST;
        self
    }

    /// Mark ctrl as held.
    #[must_use]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = ModState::FIRST;
        self
    }

    /// Mark alt as held.
    #[must_use]
    pub fn with_alt(mut self) -> Self {
        self.alt = ModState::FIRST;
        self
    }

    /// Mark the OS key as held.
    #[must_use]
    pub fn with_oskey(mut self) -> Self {
        self.oskey = ModState::FIRST;
        self
    }

    /// Held modifiers as a flag set.
    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        let mut m = Modifiers::NONE;
        if self.shift.is_held() {
            m |= Modifiers::SHIFT;
        }
        if self.ctrl.is_held() {
            m |= Modifiers::CTRL;
        }
        if self.alt.is_held() {
            m |= Modifiers::ALT;
        }
        if self.oskey.is_held() {
            m |= Modifiers::OSKEY;
        }
        m
    }

    #[must_use]
    pub fn is_tablet(&self) -> bool {
        self.tablet.active != TabletMode::None
    }

    /// Timer that produced this event, if any.
    #[must_use]
    pub fn timer(&self) -> Option<TimerId> {
        match self.custom {
            CustomData::Timer(id) => Some(id),
            _ => None,
        }
    }

    /// Clear every held modifier and the key modifier slot.
    pub fn clear_modifiers(&mut self) {
        self.shift = ModState::empty();
        self.ctrl = ModState::empty();
        self.alt = ModState::empty();
        self.oskey = ModState::empty();
        self.keymodifier = None;
    }
}
