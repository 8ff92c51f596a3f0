#![forbid(unsafe_code)]

//! Device event normalizer: raw platform callbacks to canonical events.
//!
//! [`EventNormalizer::process`] takes one [`RawEvent`] for a window, builds
//! a canonical [`Event`] from that window's event state, updates the event
//! state, and queues the result. One raw callback produces at most one event
//! per window; cursor moves that leave the window may additionally produce a
//! move in the window now under the cursor.
//!
//! # Design
//!
//! - The current time is passed in explicitly so click timing is
//!   deterministic under test.
//! - Middle-button emulation remembers that it is emulating in a single
//!   slot, so the release is remapped even if the modifier was let go
//!   mid-click.
//! - `prev_kind`/`prev_value` are copied from the event state *before* the
//!   state takes the new type and value.
//!
//! # Failure Modes
//!
//! - Unknown raw events and keys without a canonical mapping queue nothing.
//! - Text on key release is discarded with a warning.
//! - UTF-8 payloads with an invalid length or encoding are discarded with a
//!   warning.

use web_time::Instant;

use crate::break_flag::BreakFlag;
use crate::config::{EmulationModifier, InputConfig};
use crate::drag::{is_double_click, tablet_from_raw};
use crate::event::{CustomData, Event, EventFlags, EventType, KeyValue, ModState, Point};
use crate::input::{InputTargets, WindowId, WindowInput};
use crate::keys::{Key, PlatformKey, convert_key};
use crate::platform::{PlatformButton, RawEvent, TrackpadGesture};

/// Stateful translator from platform callbacks to queued events.
#[derive(Debug, Clone, Default)]
pub struct EventNormalizer {
    config: InputConfig,
    emulating: Option<EventType>,
    break_flag: BreakFlag,
}

impl EventNormalizer {
    #[must_use]
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Share `flag` instead of an internal break flag.
    #[must_use]
    pub fn with_break_flag(mut self, flag: BreakFlag) -> Self {
        self.break_flag = flag;
        self
    }

    #[must_use]
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: InputConfig) {
        self.config = config;
    }

    #[must_use]
    pub fn break_flag(&self) -> &BreakFlag {
        &self.break_flag
    }

    /// Normalize `raw` for `window` and queue the result.
    ///
    /// Returns the number of events queued across all windows.
    pub fn process<T: InputTargets + ?Sized>(
        &mut self,
        targets: &mut T,
        window: WindowId,
        raw: &RawEvent,
        now: Instant,
    ) -> usize {
        let Some(win) = targets.input(window) else {
            tracing::debug!(target: "kwm.input", %window, "event for unknown window dropped");
            return 0;
        };

        let mut event = win.eventstate.clone();
        event.is_repeat = false;
        event.flags = EventFlags::empty();
        event.custom = CustomData::None;
        event.prev_kind = event.kind;
        event.prev_value = event.value;

        match raw {
            RawEvent::CursorMove { x, y } => {
                event.mouse_pos = Point::new(*x, *y);
                event.kind = EventType::MouseMove;
                let state_pos = win.eventstate.mouse_pos;
                let (_, pos) = win.queue.add_mousemove(event.clone(), state_pos);
                win.eventstate.mouse_pos = pos;
                let outside = win.is_outside(event.mouse_pos);

                let mut queued = 1;
                if outside
                    && let Some((other, other_pos)) = self.other_window(targets, window, &event)
                    && let Some(other_win) = targets.input(other)
                {
                    let mut moved = other_win.eventstate.clone();
                    moved.prev_kind = moved.kind;
                    moved.prev_value = moved.value;
                    moved.mouse_pos = other_pos;
                    moved.kind = EventType::MouseMove;
                    let state_pos = other_win.eventstate.mouse_pos;
                    let (_, pos) = other_win.queue.add_mousemove(moved.clone(), state_pos);
                    other_win.eventstate.mouse_pos = pos;
                    other_win.eventstate.tablet.is_motion_absolute =
                        moved.tablet.is_motion_absolute;
                    queued += 1;
                }
                queued
            }

            RawEvent::Trackpad {
                gesture,
                x,
                y,
                dx,
                dy,
                is_direction_inverted,
            } => {
                let (kind, dx, dy) = match gesture {
                    TrackpadGesture::Magnify => (EventType::TrackpadZoom, -dx, -dy),
                    TrackpadGesture::SmartMagnify => (EventType::TrackpadSmartZoom, *dx, *dy),
                    TrackpadGesture::Rotate => (EventType::TrackpadRotate, *dx, *dy),
                    TrackpadGesture::Scroll => (EventType::TrackpadPan, *dx, *dy),
                };
                event.kind = kind;
                event.mouse_pos = Point::new(*x, *y);
                win.eventstate.mouse_pos = event.mouse_pos;
                event.value = KeyValue::Nothing;
                event.is_direction_inverted = *is_direction_inverted;
                win.queue.add_trackpad(event, Point::new(dx, -dy));
                1
            }

            RawEvent::ButtonDown { button, tablet } | RawEvent::ButtonUp { button, tablet } => {
                event.value = if matches!(raw, RawEvent::ButtonDown { .. }) {
                    KeyValue::Press
                } else {
                    KeyValue::Release
                };
                event.kind = button_type(*button);
                event.tablet = tablet_from_raw(tablet.as_ref(), &self.config);

                self.emulate(&mut event);
                prev_values_set(&mut event, &mut win.eventstate);
                win.eventstate.value = event.value;
                win.eventstate.kind = event.kind;

                if is_double_click(&event, now, &self.config) {
                    tracing::debug!(target: "kwm.input", kind = ?event.kind, "double click");
                    event.value = KeyValue::DoubleClick;
                }
                if event.value == KeyValue::Press {
                    prev_click_set(&mut event, &mut win.eventstate, now);
                }

                let outside = win.is_outside(event.mouse_pos);
                if outside
                    && let Some((other, other_pos)) = self.other_window(targets, window, &event)
                    && let Some(other_win) = targets.input(other)
                {
                    let mut routed = other_win.eventstate.clone();
                    routed.prev_kind = routed.kind;
                    routed.prev_value = routed.value;
                    routed.mouse_pos = other_pos;
                    routed.kind = event.kind;
                    routed.value = event.value;
                    routed.tablet = event.tablet;
                    other_win.queue.push_back(routed);
                } else if let Some(win) = targets.input(window) {
                    win.queue.push_back(event);
                }
                1
            }

            RawEvent::KeyDown {
                key,
                ascii,
                utf8,
                is_repeat,
            }
            | RawEvent::KeyUp {
                key,
                ascii,
                utf8,
                is_repeat,
            } => {
                let is_down = matches!(raw, RawEvent::KeyDown { .. });
                let Some(canonical) = convert_key(*key) else {
                    tracing::trace!(target: "kwm.input", code = key.0, "unmapped key ignored");
                    return 0;
                };
                self.key_event(
                    &mut event,
                    win,
                    KeyInput {
                        key: canonical,
                        raw_key: *key,
                        ascii: *ascii,
                        utf8,
                        is_repeat: *is_repeat,
                        is_down,
                    },
                    now,
                );
                win.queue.push_back(event);
                1
            }

            RawEvent::Wheel { z } => {
                event.kind = if *z > 0 {
                    EventType::WheelUp
                } else {
                    EventType::WheelDown
                };
                event.value = KeyValue::Press;
                win.queue.push_back(event);
                1
            }

            RawEvent::Timer { timer } => {
                event.kind = EventType::Timer;
                event.custom = CustomData::Timer(*timer);
                event.value = KeyValue::Nothing;
                event.keymodifier = None;
                win.queue.push_back(event);
                1
            }

            RawEvent::WindowDeactivate => {
                event.kind = EventType::WindowDeactivate;
                win.queue.push_back(event);
                win.eventstate.clear_modifiers();
                1
            }

            RawEvent::Unknown => 0,
        }
    }

    fn other_window<T: InputTargets + ?Sized>(
        &self,
        targets: &T,
        window: WindowId,
        event: &Event,
    ) -> Option<(WindowId, Point)> {
        if targets.window_count() <= 1 {
            return None;
        }
        targets.other_window_at(window, event.mouse_pos)
    }

    /// Middle-button and numpad emulation.
    fn emulate(&mut self, event: &mut Event) {
        if self.config.emulate_3_button && event.kind == EventType::LeftMouse {
            let modifier = match self.config.emulate_3_button_modifier {
                EmulationModifier::Alt => &mut event.alt,
                EmulationModifier::OsKey => &mut event.oskey,
            };
            match event.value {
                KeyValue::Press => {
                    if modifier.is_held() {
                        *modifier = ModState::empty();
                        event.kind = EventType::MiddleMouse;
                        self.emulating = Some(EventType::MiddleMouse);
                    }
                }
                KeyValue::Release => {
                    if self.emulating == Some(EventType::MiddleMouse) {
                        event.kind = EventType::MiddleMouse;
                        *modifier = ModState::empty();
                    }
                    self.emulating = None;
                }
                _ => {}
            }
        }

        if self.config.emulate_numpad
            && let EventType::Key(k) = event.kind
        {
            event.kind = EventType::Key(k.numpad_emulated());
        }
    }

    fn key_event(
        &mut self,
        event: &mut Event,
        win: &mut WindowInput,
        input: KeyInput<'_>,
        now: Instant,
    ) {
        let state = &mut win.eventstate;
        event.kind = EventType::Key(input.key);
        event.is_repeat = input.is_repeat;
        event.value = if input.is_down {
            KeyValue::Press
        } else {
            KeyValue::Release
        };

        self.emulate(event);
        prev_values_set(event, state);
        state.value = event.value;
        state.kind = event.kind;
        state.is_repeat = event.is_repeat;

        let (ascii, utf8) = text_payload(input);
        event.ascii = ascii;
        event.utf8 = utf8;

        let key = event.kind.key().unwrap_or(input.key);
        let press = event.value == KeyValue::Press;
        match key {
            Key::LeftShift | Key::RightShift => {
                let m = chord(press, state.ctrl | state.alt | state.oskey);
                event.shift = m;
                state.shift = m;
            }
            Key::LeftCtrl | Key::RightCtrl => {
                let m = chord(press, state.shift | state.alt | state.oskey);
                event.ctrl = m;
                state.ctrl = m;
            }
            Key::LeftAlt | Key::RightAlt => {
                let m = chord(press, state.ctrl | state.shift | state.oskey);
                event.alt = m;
                state.alt = m;
            }
            Key::OsKey => {
                let m = chord(press, state.ctrl | state.alt | state.shift);
                event.oskey = m;
                state.oskey = m;
            }
            _ => {
                if press && event.keymodifier.is_none() {
                    // Takes effect from the next event on.
                    state.keymodifier = Some(key);
                } else if event.value == KeyValue::Release && event.keymodifier == Some(key) {
                    event.keymodifier = None;
                    state.keymodifier = None;
                }
            }
        }

        if is_double_click(event, now, &self.config) {
            tracing::debug!(target: "kwm.input", ?key, "double click");
            event.value = KeyValue::DoubleClick;
        }

        // Holding a key must not report itself as its own modifier.
        if event.keymodifier == Some(key) {
            event.keymodifier = None;
        }
        if event.keymodifier == Some(Key::Unknown) {
            event.keymodifier = None;
            state.keymodifier = None;
        }

        if key == Key::Esc
            && event.value == KeyValue::Press
            && event.shift.is_empty()
            && event.ctrl.is_empty()
            && event.alt.is_empty()
        {
            tracing::debug!(target: "kwm.input", "break requested");
            self.break_flag.raise();
        }

        if event.value == KeyValue::Press && !event.is_repeat {
            prev_click_set(event, state, now);
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
struct KeyInput<'a> {
    key: Key,
    raw_key: PlatformKey,
    ascii: u8,
    utf8: &'a [u8; 6],
    is_repeat: bool,
    is_down: bool,
}

fn button_type(button: PlatformButton) -> EventType {
    match button {
        PlatformButton::Left => EventType::LeftMouse,
        PlatformButton::Middle => EventType::MiddleMouse,
        PlatformButton::Right => EventType::RightMouse,
        PlatformButton::Button4 => EventType::Button4Mouse,
        PlatformButton::Button5 => EventType::Button5Mouse,
        PlatformButton::Button6 => EventType::Button6Mouse,
        PlatformButton::Button7 => EventType::Button7Mouse,
    }
}

/// Modifier state for a press (`FIRST`, or `FIRST | SECOND` when another
/// modifier is already held) or a release (empty).
fn chord(press: bool, others: ModState) -> ModState {
    match (press, others.is_held()) {
        (false, _) => ModState::empty(),
        (true, false) => ModState::FIRST,
        (true, true) => ModState::FIRST | ModState::SECOND,
    }
}

fn prev_values_set(event: &mut Event, state: &mut Event) {
    state.prev_value = state.value;
    event.prev_value = state.value;
    state.prev_kind = state.kind;
    event.prev_kind = state.kind;
}

fn prev_click_set(event: &mut Event, state: &mut Event, now: Instant) {
    state.prev_click_time = Some(now);
    event.prev_click_time = Some(now);
    state.prev_click_pos = state.mouse_pos;
    event.prev_click_pos = state.mouse_pos;
}

/// Length of a UTF-8 sequence from its lead byte, `None` for invalid leads.
fn utf8_size(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        0xF8..=0xFB => Some(5),
        0xFC..=0xFD => Some(6),
        _ => None,
    }
}

fn text_payload(input: KeyInput<'_>) -> (Option<u8>, Option<char>) {
    let lead = input.utf8[0];
    if !input.is_down {
        if lead != 0 {
            tracing::warn!(
                target: "kwm.input",
                code = input.raw_key.0,
                "platform sent text on key release"
            );
        }
        return (None, None);
    }

    let ascii = match input.ascii {
        0 => None,
        c if c < 32 => None,
        c => Some(c),
    };
    if lead < 32 {
        return (ascii, None);
    }

    let decoded = utf8_size(lead)
        .and_then(|n| std::str::from_utf8(&input.utf8[..n]).ok())
        .and_then(|s| s.chars().next());
    if decoded.is_none() {
        tracing::warn!(target: "kwm.input", lead, "invalid unicode character dropped");
    }
    (ascii, decoded)
}
