#![forbid(unsafe_code)]

//! Per-window input state and the lookup seam used by the normalizer.
//!
//! [`WindowInput`] bundles what the normalizer touches on a window: the
//! event queue, the resting event state, the window size (for the
//! "cursor left the window" test) and the deferred mouse-move flag.
//! [`InputTargets`] lets the normalizer reach sibling windows without
//! knowing how the window manager stores them.

use crate::config::MoveCoalescing;
use crate::event::{Event, EventFlags, EventType, KeyValue, Point};
use crate::queue::{EventId, EventQueue};

/// Extra height above a window still counted as inside it (title bar).
pub const TITLE_BAR_MARGIN: i32 = 30;

/// Identifies a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "win{}", self.0)
    }
}

/// Input-side state of one window.
#[derive(Debug, Clone, Default)]
pub struct WindowInput {
    pub queue: EventQueue,
    /// Last known input state; the template for every new event.
    pub eventstate: Event,
    pub width: i32,
    pub height: i32,
    addmousemove: bool,
}

impl WindowInput {
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: MoveCoalescing) -> Self {
        self.queue.set_policy(policy);
        self
    }

    /// Whether `p` lies outside the window (the title bar counts as inside).
    #[must_use]
    pub fn is_outside(&self, p: Point) -> bool {
        p.x < 0 || p.y < 0 || p.x > self.width || p.y > self.height + TITLE_BAR_MARGIN
    }

    /// Request one synthetic mouse move after the current batch.
    pub fn defer_mousemove(&mut self) {
        self.addmousemove = true;
    }

    #[must_use]
    pub fn has_deferred_mousemove(&self) -> bool {
        self.addmousemove
    }

    /// Enqueue the deferred mouse move, if one was requested.
    ///
    /// The move is built from the event state and carries no delta.
    pub fn flush_deferred_mousemove(&mut self) -> Option<EventId> {
        if !std::mem::take(&mut self.addmousemove) {
            return None;
        }
        let mut event = self.eventstate.clone();
        event.kind = EventType::MouseMove;
        event.value = KeyValue::Nothing;
        event.prev_mouse_pos = event.mouse_pos;
        event.flags = EventFlags::empty();
        Some(self.queue.push_back(event))
    }
}

/// Window lookup for the normalizer.
pub trait InputTargets {
    /// Mutable input state of `window`, if it exists.
    fn input(&mut self, window: WindowId) -> Option<&mut WindowInput>;

    fn window_count(&self) -> usize;

    /// A window other than `from` containing `pos` (given in `from`'s space)
    /// that is not running a modal handler, with `pos` converted into that
    /// window's space.
    fn other_window_at(&self, from: WindowId, pos: Point) -> Option<(WindowId, Point)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_test_includes_title_bar() {
        let w = WindowInput::new(100, 50);
        assert!(!w.is_outside(Point::new(0, 0)));
        assert!(!w.is_outside(Point::new(100, 80)));
        assert!(w.is_outside(Point::new(100, 81)));
        assert!(w.is_outside(Point::new(-1, 10)));
        assert!(w.is_outside(Point::new(101, 10)));
    }

    #[test]
    fn deferred_move_is_emitted_once() {
        let mut w = WindowInput::new(100, 100);
        w.eventstate.mouse_pos = Point::new(7, 8);
        w.eventstate.value = KeyValue::Press;
        assert_eq!(w.flush_deferred_mousemove(), None);

        w.defer_mousemove();
        w.defer_mousemove();
        assert!(w.has_deferred_mousemove());
        assert!(w.flush_deferred_mousemove().is_some());
        assert_eq!(w.flush_deferred_mousemove(), None);
        assert_eq!(w.queue.len(), 1);

        let e = w.queue.front().cloned().unwrap_or_default();
        assert_eq!(e.kind, EventType::MouseMove);
        assert_eq!(e.value, KeyValue::Nothing);
        assert_eq!(e.mouse_pos, Point::new(7, 8));
        assert_eq!(e.prev_mouse_pos, Point::new(7, 8));
    }
}
