#![forbid(unsafe_code)]

//! Click and drag thresholds.
//!
//! The drag threshold depends on what started the gesture: a mouse button,
//! a tablet pen (larger, pens wobble) or anything else such as a keyboard
//! key (largest). The threshold is scaled by the UI scale factor.
//!
//! Double clicks compare an incoming press against the window's previous
//! press stamp: same event type, previous value was a release, elapsed time
//! within the double-click window, and for pointer events the cursor has not
//! moved beyond the drag threshold since that press.

use web_time::Instant;

use crate::config::InputConfig;
use crate::event::{Event, KeyValue, Point, TabletData, TabletMode};
use crate::platform::{RawTablet, RawTabletMode};

/// Drag threshold in pixels for the gesture `event` belongs to.
#[must_use]
pub fn drag_threshold(event: &Event, config: &InputConfig) -> i32 {
    let base = if event.prev_kind.is_mouse() {
        if event.is_tablet() {
            config.drag_threshold_tablet
        } else {
            config.drag_threshold_mouse
        }
    } else {
        config.drag_threshold
    };
    (base as f32 * config.ui_scale) as i32
}

/// True when either component of `delta` exceeds the drag threshold.
#[must_use]
pub fn drag_test_with_delta(event: &Event, delta: Point, config: &InputConfig) -> bool {
    let threshold = drag_threshold(event, config);
    delta.x.abs() > threshold || delta.y.abs() > threshold
}

/// True when the cursor moved beyond the drag threshold since `prev`.
#[must_use]
pub fn drag_test(event: &Event, prev: Point, config: &InputConfig) -> bool {
    drag_test_with_delta(event, prev - event.mouse_pos, config)
}

/// Whether `event` (already carrying its `prev_*` fields) is a double click.
#[must_use]
pub fn is_double_click(event: &Event, now: Instant, config: &InputConfig) -> bool {
    if event.kind != event.prev_kind
        || event.prev_value != KeyValue::Release
        || event.value != KeyValue::Press
    {
        return false;
    }
    if event.kind.is_mouse() && drag_test(event, event.prev_click_pos, config) {
        return false;
    }
    event
        .prev_click_time
        .is_some_and(|t| now.saturating_duration_since(t) < config.double_click_time())
}

/// Map raw pen pressure through the preference curve into `0.0..=1.0`.
#[must_use]
pub fn pressure_curve(pressure: f32, config: &InputConfig) -> f32 {
    let mut p = pressure;
    if config.pressure_threshold_max != 0.0 {
        p /= config.pressure_threshold_max;
    }
    p = p.clamp(0.0, 1.0);
    if config.pressure_softness != 0.0 {
        p = p.powf(4.0_f32.powf(-config.pressure_softness));
    }
    p
}

/// Convert a raw tablet sample into event tablet data.
///
/// Inactive or missing samples produce the default (mouse) tablet state.
#[must_use]
pub fn tablet_from_raw(raw: Option<&RawTablet>, config: &InputConfig) -> TabletData {
    let Some(raw) = raw else {
        return TabletData::default();
    };
    let active = match raw.mode {
        RawTabletMode::None => return TabletData::default(),
        RawTabletMode::Stylus => TabletMode::Stylus,
        RawTabletMode::Eraser => TabletMode::Eraser,
    };
    TabletData {
        active,
        pressure: pressure_curve(raw.pressure, config),
        x_tilt: raw.x_tilt,
        y_tilt: raw.y_tilt,
        is_motion_absolute: true,
    }
}
