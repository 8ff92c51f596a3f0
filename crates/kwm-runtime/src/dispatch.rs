#![forbid(unsafe_code)]

//! The per-window event dispatch loop.
//!
//! Every queued event of a window is routed, in order, through:
//!
//! 1. the window's modal handlers (running operators first),
//! 2. the tooltip motion check, tooltip timer and drag-and-drop hooks,
//! 3. the handlers of the region under the cursor,
//! 4. the handlers of the area under the cursor,
//! 5. the window's own handlers,
//!
//! stopping at the first handler that breaks. Afterwards presses, releases
//! and moves drive click and click-drag synthesis, and the synthetic events
//! take the same route.
//!
//! Modal handlers are taken out of the window while they run, so a handler
//! may add new modal handlers (they go in front of the survivors) or close
//! the window. A closed window stops its dispatch for this pass; handlers
//! taken out of it at that moment are cancelled.

use std::mem;
use std::rc::Rc;

use kwm_core::drag::drag_test;
use kwm_core::event::{CustomData, Event, EventFlags, EventType, KeyValue, Point};
use kwm_core::input::WindowId;
use kwm_core::keys::Key;

use crate::context::Context;
use crate::drag_policy;
use crate::handler::{Handler, HandlerAction, OperatorHandler, UiAction, UiHandler};
use crate::operator::invoke::{
    cancel_operator, checked_result, invoke, operator_finished, with_undo_depth,
};
use crate::operator::{OperatorResult, OperatorTypeFlags};
use crate::screen::{AreaId, RegionId};
use crate::tooltip;

/// Non-modal handler lists of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Window,
    Area(AreaId),
    Region(RegionId),
}

/// A non-modal handler copied out of its list for one event.
enum Pending {
    Ui(UiHandler),
    Keymap(String),
}

fn window_alive(ctx: &Context<'_>, window: WindowId) -> bool {
    ctx.wm().window(window).is_some()
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Dispatch every queued event of every window. Returns the number of
/// events routed.
pub(crate) fn do_handlers(ctx: &mut Context<'_>) -> usize {
    let mut routed = 0;
    for window in ctx.wm().window_ids() {
        let span = tracing::debug_span!(target: "kwm.dispatch", "kwm.dispatch.window", %window);
        let _guard = span.enter();
        routed += do_window(ctx, window);
    }
    ctx.set_window(None);
    ctx.set_area(None);
    ctx.set_region(None);
    routed
}

fn do_window(ctx: &mut Context<'_>, window: WindowId) -> usize {
    let Some(win) = ctx.wm_mut().window_mut(window) else {
        return 0;
    };
    if win.screen.is_none() {
        let dropped = win.input.queue.clear();
        if dropped > 0 {
            tracing::trace!(target: "kwm.dispatch", dropped, "no screen, queue dropped");
        }
        return 0;
    }

    let mut routed = 0;
    loop {
        let Some(win) = ctx.wm_mut().window_mut(window) else {
            return routed;
        };
        let pending = win.drag_start.filter(|_| win.check_drag).map(|(kind, _)| kind);
        let Some(event) = win.input.queue.pop_front() else {
            break;
        };
        if drag_policy::forces_drag(&event, pending) {
            let state = win.input.eventstate.clone();
            drag_policy::requeue_with_forced_move(&mut win.input.queue, event, &state);
            continue;
        }
        routed += 1;
        if handle_event(ctx, window, event).is_none() {
            tracing::debug!(target: "kwm.dispatch", "window closed during dispatch");
            return routed;
        }
    }

    if let Some(win) = ctx.wm_mut().window_mut(window) {
        win.input.flush_deferred_mousemove();
    }
    routed
}

/// Route one event and its click/drag follow-ups. `None` when the window
/// was closed on the way.
fn handle_event(ctx: &mut Context<'_>, window: WindowId, mut event: Event) -> Option<()> {
    ctx.set_window(Some(window));

    let action = route(ctx, window, &mut event)?;
    click_and_drag(ctx, window, &event, action)?;

    let win = ctx.wm_mut().window_mut(window)?;
    win.input.eventstate.prev_mouse_pos = event.mouse_pos;
    ctx.set_area(None);
    ctx.set_region(None);
    Some(())
}

/// Modal handlers, hooks, then region, area and window handlers.
fn route(ctx: &mut Context<'_>, window: WindowId, event: &mut Event) -> Option<HandlerAction> {
    let (area, region) = ctx
        .screen()
        .map_or((None, None), |s| s.hit_test(event.mouse_pos));
    ctx.set_area(area);
    ctx.set_region(region);

    let mut action = modal_handlers_do(ctx, window, event)?;
    tooltip_motion_check(ctx, window, event);

    if !action.contains(HandlerAction::BREAK) && is_tooltip_timer(ctx, window, event) {
        tooltip::init(ctx, window);
        if !window_alive(ctx, window) {
            return None;
        }
        action |= HandlerAction::BREAK;
    }

    if !action.contains(HandlerAction::BREAK) {
        action |= drag_drop_test(ctx, window, event);
    }

    if !action.contains(HandlerAction::BREAK)
        && let Some(region) = region
    {
        action |= list_handlers_do(ctx, window, ListKind::Region(region), event)?;
    }
    if !action.contains(HandlerAction::BREAK)
        && let Some(area) = area
    {
        ctx.set_region(None);
        action |= list_handlers_do(ctx, window, ListKind::Area(area), event)?;
        ctx.set_region(region);
    }
    if !action.contains(HandlerAction::BREAK) {
        action |= list_handlers_do(ctx, window, ListKind::Window, event)?;
    }

    if action.contains(HandlerAction::HANDLED) && !event.kind.is_mouse_motion() {
        tracing::debug!(target: "kwm.dispatch", kind = ?event.kind, value = ?event.value, "event handled");
    }
    Some(action)
}

// ---------------------------------------------------------------------------
// Click and drag synthesis
// ---------------------------------------------------------------------------

/// Follow-up events for presses, releases and moves.
fn click_and_drag(
    ctx: &mut Context<'_>,
    window: WindowId,
    event: &Event,
    action: HandlerAction,
) -> Option<()> {
    let input = ctx.wm().prefs().input.clone();
    let win = ctx.wm_mut().window_mut(window)?;

    if event.kind.is_mouse_motion() {
        let Some((kind, start)) = win.drag_start.filter(|_| win.check_drag) else {
            return Some(());
        };
        let mut candidate = event.clone();
        candidate.prev_kind = kind;
        if !(drag_test(&candidate, start, &input)
            || event.flags.contains(EventFlags::FORCE_DRAG_THRESHOLD))
        {
            return Some(());
        }
        win.check_drag = false;
        win.check_click = false;
        let mut drag = synthesized(event, kind, KeyValue::ClickDrag, start);
        drag.prev_mouse_pos = event.mouse_pos;
        tracing::debug!(target: "kwm.dispatch", ?kind, "click-drag");
        route(ctx, window, &mut drag)?;
        return Some(());
    }

    if !(event.kind.is_mouse_button() || event.kind.is_keyboard()) || event.kind.is_key_modifier() {
        return Some(());
    }

    match event.value {
        KeyValue::Press | KeyValue::DoubleClick if !event.is_repeat => {
            win.check_drag = true;
            win.check_click = action.is_not_handled();
            win.drag_start = Some((event.kind, event.mouse_pos));
        }
        KeyValue::Release => {
            let Some((kind, start)) = win.drag_start.filter(|(k, _)| *k == event.kind) else {
                return Some(());
            };
            win.check_drag = false;
            win.drag_start = None;
            let mut candidate = event.clone();
            candidate.prev_kind = kind;
            if mem::take(&mut win.check_click) && !drag_test(&candidate, start, &input) {
                let mut click = synthesized(event, kind, KeyValue::Click, start);
                tracing::debug!(target: "kwm.dispatch", ?kind, "click");
                route(ctx, window, &mut click)?;
            }
        }
        _ => {}
    }

    if event.value == KeyValue::DoubleClick && action.is_not_handled() {
        let mut press = event.clone();
        press.value = KeyValue::Press;
        route(ctx, window, &mut press)?;
    }
    Some(())
}

fn synthesized(event: &Event, kind: EventType, value: KeyValue, at: Point) -> Event {
    let mut out = event.clone();
    out.kind = kind;
    out.value = value;
    out.mouse_pos = at;
    out.is_repeat = false;
    out.flags.remove(EventFlags::FORCE_DRAG_THRESHOLD);
    out
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Close an exit-on-event tooltip once the cursor leaves its neighbourhood.
fn tooltip_motion_check(ctx: &mut Context<'_>, window: WindowId, event: &Event) {
    if !event.kind.is_mouse_motion() {
        return;
    }
    let Some(tip) = ctx.wm().window(window).and_then(|w| w.tooltip()) else {
        return;
    };
    if !(tip.is_open() && tip.exit_on_event()) {
        return;
    }
    let prefs = ctx.wm().prefs();
    let threshold =
        (prefs.dispatch.tooltip_motion_threshold as f32 * prefs.input.ui_scale) as i32;
    if event.mouse_pos.manhattan(tip.event_xy()) > threshold {
        tooltip::clear(ctx, window);
    }
}

fn is_tooltip_timer(ctx: &Context<'_>, window: WindowId, event: &Event) -> bool {
    let Some(timer) = event.timer().filter(|_| event.kind == EventType::Timer) else {
        return false;
    };
    ctx.wm()
        .window(window)
        .and_then(|w| w.tooltip())
        .and_then(|t| t.timer())
        == Some(timer)
}

/// Escape cancels a drag; a left release turns into a drop event.
fn drag_drop_test(ctx: &mut Context<'_>, window: WindowId, event: &mut Event) -> HandlerAction {
    if ctx.wm().drags.is_empty() {
        return HandlerAction::CONTINUE;
    }
    if event.kind == EventType::Key(Key::Esc) && event.value == KeyValue::Press {
        ctx.wm_mut().drags.clear();
        tracing::debug!(target: "kwm.dispatch", "drag cancelled");
        return HandlerAction::BREAK;
    }
    if event.kind == EventType::LeftMouse && event.value == KeyValue::Release {
        let items = mem::take(&mut ctx.wm_mut().drags);
        tracing::debug!(target: "kwm.dispatch", items = items.len(), "drop");
        event.kind = EventType::Drop;
        event.value = KeyValue::Nothing;
        event.custom = CustomData::DragDrop(items);
        if let Some(win) = ctx.wm_mut().window_mut(window) {
            win.check_click = false;
            win.check_drag = false;
            win.drag_start = None;
        }
    }
    HandlerAction::CONTINUE
}

// ---------------------------------------------------------------------------
// Handler lists
// ---------------------------------------------------------------------------

fn modal_handlers_do(
    ctx: &mut Context<'_>,
    window: WindowId,
    event: &Event,
) -> Option<HandlerAction> {
    let taken = mem::take(&mut ctx.wm_mut().window_mut(window)?.modal_handlers);
    if taken.is_empty() {
        return Some(HandlerAction::CONTINUE);
    }
    let hit = (ctx.area(), ctx.region());
    let mut kept = Vec::with_capacity(taken.len());
    let mut action = HandlerAction::CONTINUE;
    let mut pending = taken.into_iter();

    while let Some(handler) = pending.next() {
        if action.contains(HandlerAction::BREAK) {
            kept.push(handler);
            continue;
        }
        let (result, survivor) = match handler {
            Handler::Operator(mut h) => {
                let (result, running) = modal_operator_call(ctx, window, &mut h, event);
                (result, running.then_some(Handler::Operator(h)))
            }
            Handler::Ui(ui) => (ui_call(ctx, &ui, event), Some(Handler::Ui(ui))),
            Handler::Keymap(k) => (keymap_call(ctx, window, &k.keymap, event), Some(Handler::Keymap(k))),
        };
        ctx.set_area(hit.0);
        ctx.set_region(hit.1);

        if !window_alive(ctx, window) {
            let mut orphans = kept;
            orphans.extend(survivor);
            orphans.extend(pending);
            ctx.set_window(None);
            remove_handlers(ctx, orphans);
            return None;
        }
        action |= result;
        kept.extend(survivor);
    }

    let win = ctx.wm_mut().window_mut(window)?;
    win.modal_handlers.extend(kept);
    Some(action)
}

/// Run one modal operator handler. Returns the handler action and whether
/// the operator is still running.
fn modal_operator_call(
    ctx: &mut Context<'_>,
    window: WindowId,
    handler: &mut OperatorHandler,
    event: &Event,
) -> (HandlerAction, bool) {
    let Some(mut op) = handler.op.take() else {
        return (HandlerAction::CONTINUE, false);
    };
    let ty = Rc::clone(op.ty());
    let Some(modal) = ty.modal.clone() else {
        tracing::error!(target: "kwm.operator", idname = %ty.idname, "modal handler without a modal callback");
        cancel_operator(ctx, &mut op);
        ctx.wm_mut().ungrab(window);
        return (HandlerAction::CONTINUE, false);
    };

    ctx.set_area(handler.area);
    ctx.set_region(handler.region);
    let span = tracing::debug_span!(target: "kwm.operator", "kwm.operator.modal", idname = %ty.idname);
    let result = {
        let _guard = span.enter();
        let undo = ty.flag.contains(OperatorTypeFlags::UNDO);
        let result = with_undo_depth(ctx, undo, |ctx| modal(ctx, &mut op, event));
        checked_result(&ty.idname, result)
    };

    let ended = result.intersects(OperatorResult::FINISHED | OperatorResult::CANCELLED);
    if result.contains(OperatorResult::FINISHED) {
        operator_finished(ctx, op);
    } else if !ended {
        handler.op = Some(op);
    }
    if ended {
        tracing::debug!(target: "kwm.operator", idname = %ty.idname, ?result, "modal operator ended");
        ctx.wm_mut().ungrab(window);
    }
    (HandlerAction::from_operator(result), !ended)
}

fn ui_call(ctx: &mut Context<'_>, ui: &UiHandler, event: &Event) -> HandlerAction {
    if ui.area.is_some() {
        ctx.set_area(ui.area);
    }
    if ui.region.is_some() {
        ctx.set_region(ui.region);
    }
    match (ui.handle)(ctx, event) {
        UiAction::Break => HandlerAction::BREAK,
        UiAction::Continue => HandlerAction::CONTINUE,
    }
}

/// Invoke the operators of the first matching items of keymap `name`
/// until one breaks.
fn keymap_call(ctx: &mut Context<'_>, window: WindowId, name: &str, event: &Event) -> HandlerAction {
    let Some(keymap) = ctx.wm().keymap(name) else {
        tracing::debug!(target: "kwm.dispatch", keymap = name, "keymap not found");
        return HandlerAction::CONTINUE;
    };
    if !keymap.poll(ctx) {
        return HandlerAction::CONTINUE;
    }
    let mut action = HandlerAction::CONTINUE;
    for item in keymap.matching(event) {
        let Some(ty) = ctx.wm().operators().find(&item.idname) else {
            continue;
        };
        let result = invoke(ctx, &ty, Some(event), Some(&item.properties), None);
        action |= HandlerAction::from_operator(result);
        if action.contains(HandlerAction::BREAK) {
            tracing::debug!(target: "kwm.dispatch", keymap = name, idname = %item.idname, "handled by keymap item");
            break;
        }
        if !window_alive(ctx, window) {
            break;
        }
    }
    action
}

fn snapshot(ctx: &Context<'_>, window: WindowId, list: ListKind) -> Vec<Pending> {
    let Some(win) = ctx.wm().window(window) else {
        return Vec::new();
    };
    let screen = win.screen.as_ref();
    let handlers: &[Handler] = match list {
        ListKind::Window => win.handlers(),
        ListKind::Area(id) => screen
            .and_then(|s| s.area(id))
            .map(|a| a.handlers())
            .unwrap_or_default(),
        ListKind::Region(id) => screen
            .and_then(|s| s.region(id))
            .map(|r| r.handlers())
            .unwrap_or_default(),
    };
    handlers
        .iter()
        .filter_map(|h| match h {
            Handler::Ui(ui) => Some(Pending::Ui(ui.clone())),
            Handler::Keymap(k) => Some(Pending::Keymap(k.keymap.clone())),
            Handler::Operator(_) => None,
        })
        .collect()
}

fn list_handlers_do(
    ctx: &mut Context<'_>,
    window: WindowId,
    list: ListKind,
    event: &Event,
) -> Option<HandlerAction> {
    let pending = snapshot(ctx, window, list);
    let hit = (ctx.area(), ctx.region());
    let mut action = HandlerAction::CONTINUE;
    for handler in &pending {
        action |= match handler {
            Pending::Ui(ui) => ui_call(ctx, ui, event),
            Pending::Keymap(name) => keymap_call(ctx, window, name, event),
        };
        ctx.set_area(hit.0);
        ctx.set_region(hit.1);
        if !window_alive(ctx, window) {
            return None;
        }
        if action.contains(HandlerAction::BREAK) {
            break;
        }
    }
    Some(action)
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

/// Tear down `handlers`: cancel running operators and release their grab,
/// and let UI handlers clean up.
pub(crate) fn remove_handlers(ctx: &mut Context<'_>, handlers: Vec<Handler>) {
    let saved = (ctx.area(), ctx.region());
    for handler in handlers {
        match handler {
            Handler::Operator(mut h) => {
                let Some(mut op) = h.op.take() else {
                    continue;
                };
                ctx.set_area(h.area);
                ctx.set_region(h.region);
                tracing::debug!(target: "kwm.operator", idname = %op.idname(), "cancelling modal operator");
                cancel_operator(ctx, &mut op);
                if let Some(window) = ctx.window() {
                    ctx.wm_mut().ungrab(window);
                }
            }
            Handler::Ui(ui) => {
                let Some(remove) = ui.remove else {
                    continue;
                };
                ctx.set_area(ui.area);
                ctx.set_region(ui.region);
                remove(ctx);
            }
            Handler::Keymap(_) => {}
        }
        ctx.set_area(saved.0);
        ctx.set_region(saved.1);
    }
}
