//! Benchmarks for notifier deduplication and delivery.
//!
//! Measures the cost of queueing a burst of mostly-duplicate notices and of
//! delivering a drained bus to a screen of listening areas.
//!
//! Run with: cargo bench -p kwm-runtime --bench notifier_bench

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use kwm_core::event::{Point, Rect};
use kwm_runtime::notifier::{
    NC_OBJECT, NC_SCENE, NC_SPACE, ND_DRAW, ND_FRAME, ND_SPACE_VIEW3D, ND_TRANSFORM,
    NotifierBus, NotifierFilter, NotifierRef,
};
use kwm_runtime::{RegionKind, Screen, WindowManager};

// ============================================================================
// Setup helpers
// ============================================================================

const VALUES: [u32; 4] = [
    NC_SCENE | ND_FRAME,
    NC_OBJECT | ND_TRANSFORM,
    NC_OBJECT | ND_DRAW,
    NC_SPACE | ND_SPACE_VIEW3D,
];

/// `n` requests over `distinct` references; most are duplicates.
fn requests(n: usize, distinct: u64) -> Vec<(u32, Option<NotifierRef>)> {
    (0..n)
        .map(|i| {
            let value = VALUES[i % VALUES.len()];
            (value, Some(NotifierRef(i as u64 % distinct)))
        })
        .collect()
}

/// One window with `areas` areas, each with a listening main region.
fn setup_wm(areas: i32) -> WindowManager {
    let mut wm = WindowManager::new();
    let win = wm.add_window(Point::new(0, 0), areas * 100, 300);
    let mut screen = Screen::new();
    for i in 0..areas {
        let rect = Rect::new(i * 100, 0, i * 100 + 99, 299);
        let area = screen.add_area(rect);
        screen.area_mut(area).unwrap().listens.push(NotifierFilter::category(NC_SCENE));
        let main = screen.add_region(area, RegionKind::Window, rect).unwrap();
        screen
            .region_mut(main)
            .unwrap()
            .listens
            .push(NotifierFilter::category(NC_OBJECT).with_data(ND_TRANSFORM));
    }
    wm.window_mut(win).unwrap().set_screen(screen);
    wm
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_add_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("notifier/add");
    for &n in &[100usize, 1_000, 10_000] {
        let reqs = requests(n, 16);
        group.bench_with_input(BenchmarkId::new("mostly_duplicate", n), &reqs, |b, reqs| {
            b.iter(|| {
                let mut bus = NotifierBus::new();
                for &(value, reference) in reqs {
                    bus.add(value, reference, None);
                }
                black_box(bus.len())
            });
        });
    }
    group.finish();
}

fn bench_do_notifiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("notifier/deliver");
    for &areas in &[4i32, 16, 64] {
        let mut wm = setup_wm(areas);
        let reqs = requests(64, 64);
        group.bench_with_input(BenchmarkId::new("areas", areas), &reqs, |b, reqs| {
            b.iter(|| {
                for &(value, reference) in reqs {
                    wm.add_notifier(value, reference, None);
                }
                black_box(wm.do_notifiers())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add_dedup, bench_do_notifiers);
criterion_main!(benches);
