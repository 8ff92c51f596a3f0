//! Property-based invariant tests for the per-window event queue.
//!
//! 1. FIFO: without consecutive moves, dequeue order equals enqueue order
//! 2. `KeepInbetween`: a run of moves leaves exactly one `MouseMove`
//! 3. `LatestOnly`: a run of moves leaves one entry at the last position
//! 4. Event ids are unique
//! 5. `insert_after` lands directly behind its anchor

use kwm_core::config::MoveCoalescing;
use kwm_core::event::{Event, EventType, KeyValue, Point};
use kwm_core::keys::Key;
use kwm_core::queue::EventQueue;
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Entry {
    Key(u8),
    Button,
    Move(i32, i32),
}

fn entry_strategy() -> impl Strategy<Value = Entry> {
    prop_oneof![
        (b'A'..=b'Z').prop_map(Entry::Key),
        Just(Entry::Button),
        (-500i32..500, -500i32..500).prop_map(|(x, y)| Entry::Move(x, y)),
    ]
}

/// Sequences with no two adjacent moves.
fn no_adjacent_moves() -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec(entry_strategy(), 0..64).prop_map(|entries| {
        let mut out: Vec<Entry> = Vec::with_capacity(entries.len());
        for e in entries {
            let prev_is_move = matches!(out.last(), Some(Entry::Move(..)));
            if prev_is_move && matches!(e, Entry::Move(..)) {
                continue;
            }
            out.push(e);
        }
        out
    })
}

fn to_event(entry: &Entry) -> Event {
    match entry {
        Entry::Key(c) => Event::new(EventType::Key(Key::Letter(*c)), KeyValue::Press),
        Entry::Button => Event::new(EventType::LeftMouse, KeyValue::Press),
        Entry::Move(x, y) => Event::new(EventType::MouseMove, KeyValue::Nothing).at(*x, *y),
    }
}

fn enqueue(q: &mut EventQueue, entry: &Entry) {
    let event = to_event(entry);
    if event.kind == EventType::MouseMove {
        q.add_mousemove(event, Point::default());
    } else {
        q.push_back(event);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 1. FIFO order
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fifo_without_adjacent_moves(entries in no_adjacent_moves()) {
        for policy in [MoveCoalescing::KeepInbetween, MoveCoalescing::LatestOnly] {
            let mut q = EventQueue::with_policy(policy);
            for e in &entries {
                enqueue(&mut q, e);
            }
            prop_assert_eq!(q.len(), entries.len());
            for e in &entries {
                let expected = to_event(e);
                let got = q.pop_front();
                prop_assert_eq!(got.as_ref().map(|g| g.kind), Some(expected.kind));
                prop_assert_eq!(got.map(|g| g.mouse_pos), Some(expected.mouse_pos));
            }
            prop_assert!(q.is_empty());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 2-3. Move coalescing
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn keep_inbetween_leaves_one_real_move(
        moves in prop::collection::vec((-500i32..500, -500i32..500), 1..40),
    ) {
        let mut q = EventQueue::with_policy(MoveCoalescing::KeepInbetween);
        for (x, y) in &moves {
            q.add_mousemove(Event::new(EventType::MouseMove, KeyValue::Nothing).at(*x, *y), Point::default());
        }
        let real = q.iter().filter(|e| e.kind == EventType::MouseMove).count();
        prop_assert_eq!(real, 1);
        prop_assert_eq!(q.len(), moves.len());
        let (lx, ly) = moves[moves.len() - 1];
        prop_assert_eq!(q.back().map(|e| e.mouse_pos), Some(Point::new(lx, ly)));
    }

    #[test]
    fn latest_only_collapses_to_last_position(
        start in (-100i32..100, -100i32..100),
        moves in prop::collection::vec((-500i32..500, -500i32..500), 1..40),
    ) {
        let state = Point::new(start.0, start.1);
        let mut q = EventQueue::with_policy(MoveCoalescing::LatestOnly);
        for (x, y) in &moves {
            q.add_mousemove(Event::new(EventType::MouseMove, KeyValue::Nothing).at(*x, *y), state);
        }
        prop_assert_eq!(q.len(), 1);
        let only = q.front().cloned().unwrap();
        let (lx, ly) = moves[moves.len() - 1];
        prop_assert_eq!(only.kind, EventType::MouseMove);
        prop_assert_eq!(only.mouse_pos, Point::new(lx, ly));
        prop_assert_eq!(only.prev_mouse_pos, state);
    }

    #[test]
    fn latest_only_is_idempotent_on_repeated_position(
        pos in (-500i32..500, -500i32..500),
        repeats in 1usize..20,
    ) {
        let mut q = EventQueue::with_policy(MoveCoalescing::LatestOnly);
        for _ in 0..repeats {
            q.add_mousemove(Event::new(EventType::MouseMove, KeyValue::Nothing).at(pos.0, pos.1), Point::default());
        }
        prop_assert_eq!(q.len(), 1);
        prop_assert_eq!(q.front().map(|e| e.mouse_pos), Some(Point::new(pos.0, pos.1)));
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4-5. Ids and anchored insertion
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn ids_are_unique(entries in prop::collection::vec(entry_strategy(), 1..64)) {
        let mut q = EventQueue::new();
        let mut ids = Vec::new();
        for e in &entries {
            ids.push(q.push_back(to_event(e)));
            if ids.len() % 3 == 0 {
                q.pop_front();
            }
        }
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn insert_after_follows_anchor(len in 1usize..20, anchor_idx in 0usize..20) {
        let anchor_idx = anchor_idx % len;
        let mut q = EventQueue::new();
        let ids: Vec<_> = (0..len)
            .map(|i| q.push_back(Event::new(EventType::Key(Key::Digit((i % 10) as u8)), KeyValue::Press)))
            .collect();
        let marker = Event::new(EventType::Key(Key::Esc), KeyValue::Press);
        q.insert_after(ids[anchor_idx], marker);
        let kinds: Vec<_> = q.iter().map(|e| e.kind).collect();
        prop_assert_eq!(kinds.len(), len + 1);
        prop_assert_eq!(kinds[anchor_idx + 1], EventType::Key(Key::Esc));
    }
}
