//! Property-based invariant tests for the notifier bus.
//!
//! 1. No two queued notices share a `(value, reference)` key
//! 2. Queued notices keep first-insertion order
//! 3. `add` reports `true` exactly once per distinct key
//! 4. Draining empties the bus and resets deduplication
//!
//! Run:
//!   cargo test -p kwm-runtime --test proptest_notifier_dedup

use std::collections::HashSet;

use kwm_core::input::WindowId;
use kwm_runtime::notifier::{
    NC_OBJECT, NC_SCENE, NC_SPACE, NC_WM, ND_DRAW, ND_FRAME, ND_OB_SELECT, ND_SPACE_VIEW3D,
    ND_TRANSFORM, NotifierBus, NotifierRef,
};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

type Request = (u32, Option<NotifierRef>, Option<WindowId>);

fn value_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        Just(NC_WM),
        Just(NC_SCENE | ND_FRAME),
        Just(NC_SCENE | ND_OB_SELECT),
        Just(NC_OBJECT | ND_TRANSFORM),
        Just(NC_OBJECT | ND_DRAW),
        Just(NC_SPACE | ND_SPACE_VIEW3D),
    ]
}

fn request_strategy() -> impl Strategy<Value = Request> {
    (
        value_strategy(),
        prop::option::of((0u64..4).prop_map(NotifierRef)),
        prop::option::of((1u32..4).prop_map(WindowId)),
    )
}

fn requests() -> impl Strategy<Value = Vec<Request>> {
    prop::collection::vec(request_strategy(), 0..128)
}

fn fill(bus: &mut NotifierBus, reqs: &[Request]) -> Vec<bool> {
    reqs.iter()
        .map(|&(value, reference, window)| bus.add(value, reference, window))
        .collect()
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn queued_keys_are_unique(reqs in requests()) {
        let mut bus = NotifierBus::new();
        fill(&mut bus, &reqs);

        let mut keys = HashSet::new();
        for n in bus.iter() {
            prop_assert!(keys.insert((n.value, n.reference)));
        }
        let distinct: HashSet<_> = reqs.iter().map(|r| (r.0, r.1)).collect();
        prop_assert_eq!(bus.len(), distinct.len());
    }

    #[test]
    fn order_is_first_insertion(reqs in requests()) {
        let mut bus = NotifierBus::new();
        fill(&mut bus, &reqs);

        let mut expected = Vec::new();
        let mut seen = HashSet::new();
        for &(value, reference, window) in &reqs {
            if seen.insert((value, reference)) {
                expected.push((value, reference, window));
            }
        }
        let got: Vec<_> = bus.iter().map(|n| (n.value, n.reference, n.window)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn add_accepts_each_key_once(reqs in requests()) {
        let mut bus = NotifierBus::new();
        let accepted = fill(&mut bus, &reqs);

        let mut seen = HashSet::new();
        for (req, ok) in reqs.iter().zip(accepted) {
            prop_assert_eq!(ok, seen.insert((req.0, req.1)));
        }
    }

    #[test]
    fn drain_empties_and_resets(reqs in requests()) {
        let mut bus = NotifierBus::new();
        fill(&mut bus, &reqs);
        let before = bus.len();

        let mut visited = 0usize;
        prop_assert_eq!(bus.drain(|_| visited += 1), before);
        prop_assert_eq!(visited, before);
        prop_assert!(bus.is_empty());

        for &(value, reference, _) in &reqs {
            prop_assert!(!bus.contains(value, reference));
        }
        let again = fill(&mut bus, &reqs);
        prop_assert_eq!(again.iter().filter(|ok| **ok).count(), before);
    }
}
