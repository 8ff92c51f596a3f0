#![forbid(unsafe_code)]

//! Per-window event queue.
//!
//! [`EventQueue`] is an ordered FIFO of canonical events. Every queued event
//! gets an [`EventId`] so callers can address it later (e.g. to insert a
//! synthesized event right after it).
//!
//! # Coalescing
//!
//! Mouse moves go through [`EventQueue::add_mousemove`]. When the tail of the
//! queue is already a `MouseMove` the policy decides what happens to it:
//!
//! - [`MoveCoalescing::KeepInbetween`]: the tail is demoted to
//!   `InbetweenMouseMove`; the sample is kept for operators that want every
//!   point, but only the newest entry is a real `MouseMove`.
//! - [`MoveCoalescing::LatestOnly`]: the tail is removed and the new move
//!   inherits its `prev_mouse_pos`, so K consecutive moves leave one entry
//!   holding the last position. Intermediate positions are lost.
//!
//! Trackpad gestures merge with a tail of the same type by accumulating the
//! tail's delta into the new event.
//!
//! # Invariants
//!
//! 1. Dequeue order equals enqueue order for every sequence without two
//!    consecutive `MouseMove`s.
//! 2. Nothing is dropped except the collapsed move (`LatestOnly`) or the
//!    merged trackpad tail.
//! 3. `EventId`s are unique for the lifetime of the queue.

use std::collections::VecDeque;

use crate::config::MoveCoalescing;
use crate::event::{Event, EventType, Point};

/// Identity of a queued event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

/// Ordered queue of pending events for one window.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<(EventId, Event)>,
    next_id: u64,
    policy: MoveCoalescing,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(policy: MoveCoalescing) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn policy(&self) -> MoveCoalescing {
        self.policy
    }

    pub fn set_policy(&mut self, policy: MoveCoalescing) {
        self.policy = policy;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in dequeue order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().map(|(_, e)| e)
    }

    #[must_use]
    pub fn front(&self) -> Option<&Event> {
        self.events.front().map(|(_, e)| e)
    }

    #[must_use]
    pub fn back(&self) -> Option<&Event> {
        self.events.back().map(|(_, e)| e)
    }

    #[must_use]
    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.position(id).map(|i| &self.events[i].1)
    }

    fn alloc_id(&mut self) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        id
    }

    fn position(&self, id: EventId) -> Option<usize> {
        self.events.iter().position(|(eid, _)| *eid == id)
    }

    /// Append `event`.
    pub fn push_back(&mut self, event: Event) -> EventId {
        let id = self.alloc_id();
        self.events.push_back((id, event));
        id
    }

    /// Prepend `event` so it is dequeued next.
    pub fn push_front(&mut self, event: Event) -> EventId {
        let id = self.alloc_id();
        self.events.push_front((id, event));
        id
    }

    /// Insert `event` immediately after the event identified by `anchor`.
    ///
    /// If `anchor` is no longer queued the event is appended instead.
    pub fn insert_after(&mut self, anchor: EventId, event: Event) -> EventId {
        let id = self.alloc_id();
        match self.position(anchor) {
            Some(i) => self.events.insert(i + 1, (id, event)),
            None => {
                tracing::debug!(target: "kwm.queue", ?anchor, "anchor not queued, appending");
                self.events.push_back((id, event));
            }
        }
        id
    }

    pub fn pop_front(&mut self) -> Option<Event> {
        self.events.pop_front().map(|(_, e)| e)
    }

    /// Dequeue the next event together with its id.
    pub fn pop_front_with_id(&mut self) -> Option<(EventId, Event)> {
        self.events.pop_front()
    }

    pub fn pop_back(&mut self) -> Option<Event> {
        self.events.pop_back().map(|(_, e)| e)
    }

    /// Drop every queued event, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let n = self.events.len();
        self.events.clear();
        n
    }

    /// Enqueue a mouse move, coalescing with a `MouseMove` tail.
    ///
    /// `state_pos` is the window's resting cursor position, used as the
    /// previous position when the queue is empty. Returns the id and the
    /// stored position of the new entry.
    pub fn add_mousemove(&mut self, mut event: Event, state_pos: Point) -> (EventId, Point) {
        let policy = self.policy;
        event.prev_mouse_pos = match self.events.back_mut() {
            Some((_, tail)) if tail.kind == EventType::MouseMove => match policy {
                MoveCoalescing::KeepInbetween => {
                    tail.kind = EventType::InbetweenMouseMove;
                    tail.mouse_pos
                }
                MoveCoalescing::LatestOnly => {
                    let prev = tail.prev_mouse_pos;
                    self.events.pop_back();
                    prev
                }
            },
            Some((_, tail)) => tail.mouse_pos,
            None => state_pos,
        };

        let pos = event.mouse_pos;
        (self.push_back(event), pos)
    }

    /// Enqueue a trackpad gesture, merging with a tail of the same type.
    ///
    /// `delta` is this sample's motion; the merged entry's
    /// `prev_mouse_pos` is `mouse_pos - accumulated delta`.
    pub fn add_trackpad(&mut self, mut event: Event, mut delta: Point) -> EventId {
        if let Some((_, tail)) = self.events.back()
            && tail.kind == event.kind
        {
            let tail_delta = tail.mouse_pos - tail.prev_mouse_pos;
            delta.x += tail_delta.x;
            delta.y += tail_delta.y;
            self.events.pop_back();
        }
        event.prev_mouse_pos = event.mouse_pos - delta;
        self.push_back(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::KeyValue;
    use crate::keys::Key;

    fn mv(x: i32, y: i32) -> Event {
        Event::new(EventType::MouseMove, KeyValue::Nothing).at(x, y)
    }

    fn key(c: u8) -> Event {
        Event::new(EventType::Key(Key::Letter(c)), KeyValue::Press)
    }

    fn kinds(q: &EventQueue) -> Vec<EventType> {
        q.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn fifo_order() {
        let mut q = EventQueue::new();
        q.push_back(key(b'A'));
        q.push_back(key(b'B'));
        q.push_back(key(b'C'));
        assert_eq!(q.pop_front().map(|e| e.kind), Some(EventType::Key(Key::Letter(b'A'))));
        assert_eq!(q.pop_front().map(|e| e.kind), Some(EventType::Key(Key::Letter(b'B'))));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn insert_after_anchor() {
        let mut q = EventQueue::new();
        let a = q.push_back(key(b'A'));
        q.push_back(key(b'C'));
        let b = q.insert_after(a, key(b'B'));
        assert_eq!(
            kinds(&q),
            vec![
                EventType::Key(Key::Letter(b'A')),
                EventType::Key(Key::Letter(b'B')),
                EventType::Key(Key::Letter(b'C')),
            ]
        );
        assert_eq!(q.get(b).map(|e| e.kind), Some(EventType::Key(Key::Letter(b'B'))));
    }

    #[test]
    fn insert_after_missing_anchor_appends() {
        let mut q = EventQueue::new();
        let a = q.push_back(key(b'A'));
        q.pop_front();
        q.push_back(key(b'B'));
        q.insert_after(a, key(b'C'));
        assert_eq!(
            kinds(&q),
            vec![EventType::Key(Key::Letter(b'B')), EventType::Key(Key::Letter(b'C'))]
        );
    }

    #[test]
    fn push_front_jumps_the_queue() {
        let mut q = EventQueue::new();
        q.push_back(key(b'B'));
        q.push_front(key(b'A'));
        assert_eq!(q.front().map(|e| e.kind), Some(EventType::Key(Key::Letter(b'A'))));
    }

    #[test]
    fn mousemove_demotes_tail() {
        let mut q = EventQueue::new();
        q.add_mousemove(mv(1, 1), Point::new(0, 0));
        q.add_mousemove(mv(2, 2), Point::new(0, 0));
        q.add_mousemove(mv(3, 3), Point::new(0, 0));
        assert_eq!(
            kinds(&q),
            vec![
                EventType::InbetweenMouseMove,
                EventType::InbetweenMouseMove,
                EventType::MouseMove
            ]
        );
        let last = q.back().cloned().unwrap_or_default();
        assert_eq!(last.mouse_pos, Point::new(3, 3));
        assert_eq!(last.prev_mouse_pos, Point::new(2, 2));
    }

    #[test]
    fn mousemove_prev_from_state_when_empty() {
        let mut q = EventQueue::new();
        let (_, pos) = q.add_mousemove(mv(5, 6), Point::new(1, 2));
        assert_eq!(pos, Point::new(5, 6));
        assert_eq!(q.back().map(|e| e.prev_mouse_pos), Some(Point::new(1, 2)));
    }

    #[test]
    fn mousemove_prev_from_non_move_tail() {
        let mut q = EventQueue::new();
        q.push_back(key(b'A').at(9, 9));
        q.add_mousemove(mv(10, 10), Point::new(0, 0));
        assert_eq!(q.back().map(|e| e.prev_mouse_pos), Some(Point::new(9, 9)));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn latest_only_keeps_single_entry() {
        let mut q = EventQueue::with_policy(MoveCoalescing::LatestOnly);
        for i in 1..=5 {
            q.add_mousemove(mv(i, i * 2), Point::new(0, 0));
        }
        assert_eq!(q.len(), 1);
        let only = q.front().cloned().unwrap_or_default();
        assert_eq!(only.kind, EventType::MouseMove);
        assert_eq!(only.mouse_pos, Point::new(5, 10));
        assert_eq!(only.prev_mouse_pos, Point::new(0, 0));
    }

    #[test]
    fn trackpad_merges_same_type_tail() {
        let mut q = EventQueue::new();
        let pan = |x, y| Event::new(EventType::TrackpadPan, KeyValue::Nothing).at(x, y);
        q.add_trackpad(pan(100, 100), Point::new(3, -2));
        q.add_trackpad(pan(100, 100), Point::new(4, 1));
        assert_eq!(q.len(), 1);
        let e = q.front().cloned().unwrap_or_default();
        assert_eq!(e.mouse_pos - e.prev_mouse_pos, Point::new(7, -1));
    }

    #[test]
    fn trackpad_different_type_does_not_merge() {
        let mut q = EventQueue::new();
        q.add_trackpad(
            Event::new(EventType::TrackpadPan, KeyValue::Nothing),
            Point::new(1, 1),
        );
        q.add_trackpad(
            Event::new(EventType::TrackpadZoom, KeyValue::Nothing),
            Point::new(1, 1),
        );
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn clear_reports_count() {
        let mut q = EventQueue::new();
        q.push_back(key(b'A'));
        q.push_back(key(b'B'));
        assert_eq!(q.clear(), 2);
        assert!(q.is_empty());
    }
}
