#![forbid(unsafe_code)]

//! Per-window tooltip state.
//!
//! A tooltip is opened in two stages: [`timer_init`] arms a window timer,
//! and when that timer's event reaches the dispatch loop [`init`] calls the
//! tooltip's init callback to build it. The callback may ask for another
//! pass (a larger tooltip after a further delay) by changing the pass
//! number, and may mark the tooltip as closing on cursor motion.

use std::fmt;
use std::rc::Rc;

use kwm_core::event::{Point, TimerId};
use kwm_core::input::WindowId;
use web_time::Duration;

use crate::context::Context;
use crate::screen::{AreaId, RegionId};

/// In/out parameters of a tooltip init callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TooltipPass {
    /// Current pass; changing it schedules another init after `delay`.
    pub pass: u32,
    pub delay: Duration,
    /// Close the tooltip when the cursor moves past the motion threshold.
    pub exit_on_event: bool,
}

/// Builds the tooltip text, or `None` when there is nothing to show.
pub type TooltipInitFn = Rc<dyn Fn(&mut Context<'_>, &mut TooltipPass) -> Option<String>>;

pub struct TooltipState {
    pub(crate) timer: Option<TimerId>,
    area_from: Option<AreaId>,
    region_from: Option<RegionId>,
    init: TooltipInitFn,
    pass: u32,
    exit_on_event: bool,
    event_xy: Point,
    text: Option<String>,
}

impl fmt::Debug for TooltipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TooltipState")
            .field("timer", &self.timer)
            .field("area_from", &self.area_from)
            .field("region_from", &self.region_from)
            .field("pass", &self.pass)
            .field("exit_on_event", &self.exit_on_event)
            .field("event_xy", &self.event_xy)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl TooltipState {
    fn new(area_from: Option<AreaId>, region_from: Option<RegionId>, init: TooltipInitFn) -> Self {
        Self {
            timer: None,
            area_from,
            region_from,
            init,
            pass: 0,
            exit_on_event: false,
            event_xy: Point::default(),
            text: None,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.text.is_some()
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[must_use]
    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    #[must_use]
    pub fn pass(&self) -> u32 {
        self.pass
    }

    #[must_use]
    pub fn exit_on_event(&self) -> bool {
        self.exit_on_event
    }

    /// Cursor position when the tooltip was opened.
    #[must_use]
    pub fn event_xy(&self) -> Point {
        self.event_xy
    }
}

/// Remove the pending tooltip timer of `window`, if any.
pub fn timer_clear(ctx: &mut Context<'_>, window: WindowId) {
    let Some(timer) = ctx
        .wm_mut()
        .window_mut(window)
        .and_then(|w| w.tooltip.as_mut())
        .and_then(|t| t.timer.take())
    else {
        return;
    };
    ctx.wm_mut().remove_timer(timer);
}

/// Arm a tooltip that opens after `delay`.
pub fn timer_init_with_delay(
    ctx: &mut Context<'_>,
    window: WindowId,
    area: Option<AreaId>,
    region: Option<RegionId>,
    init: TooltipInitFn,
    delay: Duration,
) {
    timer_clear(ctx, window);
    let now = ctx.now();
    let timer = ctx.wm_mut().add_timer(Some(window), delay, now);
    let Some(win) = ctx.wm_mut().window_mut(window) else {
        ctx.wm_mut().remove_timer(timer);
        return;
    };
    let state = win
        .tooltip
        .get_or_insert_with(|| TooltipState::new(area, region, Rc::clone(&init)));
    state.area_from = area;
    state.region_from = region;
    state.init = init;
    state.timer = Some(timer);
    tracing::trace!(target: "kwm.tooltip", %window, ?delay, "tooltip timer armed");
}

/// Arm a tooltip with the configured delay.
pub fn timer_init(
    ctx: &mut Context<'_>,
    window: WindowId,
    area: Option<AreaId>,
    region: Option<RegionId>,
    init: TooltipInitFn,
) {
    let delay = ctx.wm().prefs().dispatch.tooltip_delay();
    timer_init_with_delay(ctx, window, area, region, init, delay);
}

/// Open a tooltip right away.
pub fn immediate_init(
    ctx: &mut Context<'_>,
    window: WindowId,
    area: Option<AreaId>,
    region: Option<RegionId>,
    init: TooltipInitFn,
) {
    timer_clear(ctx, window);
    let Some(win) = ctx.wm_mut().window_mut(window) else {
        return;
    };
    let state = win
        .tooltip
        .get_or_insert_with(|| TooltipState::new(area, region, Rc::clone(&init)));
    state.area_from = area;
    state.region_from = region;
    state.init = init;
    self::init(ctx, window);
}

/// Build the tooltip of `window` through its init callback.
///
/// The callback runs with the area/region the tooltip was armed from. A
/// changed pass arms a timer for the next pass; no text closes the tooltip.
pub fn init(ctx: &mut Context<'_>, window: WindowId) {
    timer_clear(ctx, window);
    let Some((init_fn, area_from, region_from, pass_prev)) = ctx
        .wm_mut()
        .window_mut(window)
        .and_then(|w| w.tooltip.as_mut())
        .map(|t| {
            t.text = None;
            (Rc::clone(&t.init), t.area_from, t.region_from, t.pass)
        })
    else {
        return;
    };

    let mut pass = TooltipPass {
        pass: pass_prev,
        delay: Duration::ZERO,
        exit_on_event: false,
    };
    let saved = (ctx.area(), ctx.region());
    ctx.set_area(area_from);
    ctx.set_region(region_from);
    let text = init_fn(ctx, &mut pass);
    ctx.set_area(saved.0);
    ctx.set_region(saved.1);

    let now = ctx.now();
    let next_timer = (pass.pass != pass_prev)
        .then(|| ctx.wm_mut().add_timer(Some(window), pass.delay, now));

    let Some(win) = ctx.wm_mut().window_mut(window) else {
        return;
    };
    let mouse = win.input.eventstate.mouse_pos;
    let opened = match win.tooltip.as_mut() {
        Some(state) => {
            state.pass = pass.pass;
            state.exit_on_event = pass.exit_on_event;
            state.event_xy = mouse;
            state.timer = next_timer;
            state.text = text;
            state.is_open()
        }
        None => false,
    };
    if opened {
        tracing::debug!(target: "kwm.tooltip", %window, pass = pass.pass, "tooltip opened");
    } else {
        clear(ctx, window);
    }
}

/// Close the tooltip of `window` and forget its state.
pub fn clear(ctx: &mut Context<'_>, window: WindowId) {
    timer_clear(ctx, window);
    let now = ctx.now();
    let Some(state) = ctx.wm_mut().window_mut(window).and_then(|w| w.tooltip.take()) else {
        return;
    };
    if state.is_open() {
        ctx.wm_mut().tooltip_time_closed = Some(now);
        tracing::debug!(target: "kwm.tooltip", %window, "tooltip closed");
    }
}

/// Rebuild an open or pending tooltip in place.
pub fn refresh(ctx: &mut Context<'_>, window: WindowId) {
    timer_clear(ctx, window);
    let has_state = ctx
        .wm()
        .window(window)
        .is_some_and(|w| w.tooltip.is_some());
    if has_state {
        init(ctx, window);
    }
}
