#![forbid(unsafe_code)]

//! Drag-threshold promotion.
//!
//! While a mouse button press is waiting to cross the drag threshold,
//! pressing a keyboard key commits the drag early: a synthetic mouse move flagged
//! [`EventFlags::FORCE_DRAG_THRESHOLD`] is queued ahead of the key so the
//! click-drag fires before the key is handled. Tablet strokes rely on this,
//! their threshold being large enough that a key often arrives first.

use kwm_core::event::{Event, EventFlags, EventType, KeyValue};
use kwm_core::queue::EventQueue;

/// Whether `event` commits the drag pending on `drag_start`.
///
/// The pending press must be a mouse button and `event` a fresh,
/// non-modifier keyboard press. Other buttons, releases and modifiers keep
/// the drag pending.
#[must_use]
pub fn forces_drag(event: &Event, drag_start: Option<EventType>) -> bool {
    drag_start.is_some_and(|kind| kind.is_mouse_button())
        && event.value == KeyValue::Press
        && !event.is_repeat
        && event.kind.is_keyboard()
        && !event.kind.is_key_modifier()
}

/// The synthetic move built from the window's event state.
#[must_use]
pub fn forced_move(state: &Event) -> Event {
    let mut event = state.clone();
    event.kind = EventType::MouseMove;
    event.value = KeyValue::Nothing;
    event.prev_mouse_pos = state.mouse_pos;
    event.is_repeat = false;
    event.flags = EventFlags::FORCE_DRAG_THRESHOLD;
    event
}

/// Re-queue `key` at the front of `queue`, preceded by a forced move.
pub fn requeue_with_forced_move(queue: &mut EventQueue, key: Event, state: &Event) {
    let anchor = queue.push_front(forced_move(state));
    queue.insert_after(anchor, key);
}
