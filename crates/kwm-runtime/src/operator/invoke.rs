#![forbid(unsafe_code)]

//! Polling, invoking and calling operators.
//!
//! [`invoke`] runs one operator type against an optional event and applies
//! the result protocol: finished operators push undo and enter history,
//! modal operators become modal handlers of the active window, and anything
//! else is dropped. [`call`] wraps it with a [`CallContext`] that moves the
//! active area/region for the duration of the call.

use std::rc::Rc;

use kwm_core::event::{Event, EventType, KeyValue};

use super::{Operator, OperatorFlags, OperatorResult, OperatorType, OperatorTypeFlags};
use crate::context::Context;
use crate::cursor_grab::{compute_grab, is_blocking};
use crate::handler::{Handler, OperatorHandler};
use crate::properties::Properties;
use crate::reports::{ReportFlags, SharedReports};
use crate::screen::RegionKind;
use crate::wm::OperatorRecord;

/// Where and how an operator is called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CallContext {
    /// Invoke in the current area/region.
    #[default]
    InvokeDefault,
    /// Invoke in the main region of the current area.
    InvokeRegionWin,
    InvokeRegionChannels,
    InvokeRegionPreview,
    /// Invoke with no active region.
    InvokeArea,
    /// Invoke with no active area or region.
    InvokeScreen,
    ExecDefault,
    ExecRegionWin,
    ExecRegionChannels,
    ExecRegionPreview,
    ExecArea,
    ExecScreen,
}

impl CallContext {
    /// Invoke contexts run with the window's event state as the event.
    #[must_use]
    pub const fn is_invoke(self) -> bool {
        matches!(
            self,
            Self::InvokeDefault
                | Self::InvokeRegionWin
                | Self::InvokeRegionChannels
                | Self::InvokeRegionPreview
                | Self::InvokeArea
                | Self::InvokeScreen
        )
    }

    const fn target_region(self) -> Option<RegionKind> {
        match self {
            Self::InvokeRegionWin | Self::ExecRegionWin => Some(RegionKind::Window),
            Self::InvokeRegionChannels | Self::ExecRegionChannels => Some(RegionKind::Channels),
            Self::InvokeRegionPreview | Self::ExecRegionPreview => Some(RegionKind::Preview),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Poll
// ---------------------------------------------------------------------------

/// Whether `ty` can run in `ctx`.
///
/// A macro polls every step type before its own poll. Types without a poll
/// callback always pass.
#[must_use]
pub fn poll(ctx: &Context<'_>, ty: &OperatorType) -> bool {
    for step in ty.macro_steps() {
        let Some(step_ty) = ctx.wm().operators().find(&step.idname) else {
            return false;
        };
        if !poll(ctx, &step_ty) {
            return false;
        }
    }
    ty.poll.as_ref().is_none_or(|poll| poll(ctx))
}

// ---------------------------------------------------------------------------
// Invoke
// ---------------------------------------------------------------------------

/// Keep the undo depth raised around `f` for UNDO types.
///
/// A session replaced inside `f` resets the depth, so the decrement only
/// applies within the same session.
pub(crate) fn with_undo_depth<'a, R>(
    ctx: &mut Context<'a>,
    enabled: bool,
    f: impl FnOnce(&mut Context<'a>) -> R,
) -> R {
    if !enabled {
        return f(ctx);
    }
    let generation = ctx.wm_mut().undo_enter();
    let out = f(ctx);
    ctx.wm_mut().undo_leave(generation);
    out
}

pub(crate) fn checked_result(idname: &str, result: OperatorResult) -> OperatorResult {
    if result.is_valid() {
        return result;
    }
    tracing::error!(
        target: "kwm.operator",
        idname,
        bits = result.bits(),
        "operator returned an invalid result"
    );
    OperatorResult::PASS_THROUGH
}

/// Run `ty` once: invoke with `event` if it has an invoke callback and an
/// event is given, exec otherwise.
///
/// A failed poll passes through without creating an instance.
pub fn invoke(
    ctx: &mut Context<'_>,
    ty: &Rc<OperatorType>,
    event: Option<&Event>,
    properties: Option<&Properties>,
    reports: Option<SharedReports>,
) -> OperatorResult {
    if !poll(ctx, ty) {
        tracing::debug!(target: "kwm.operator", idname = %ty.idname, "poll failed");
        return OperatorResult::PASS_THROUGH;
    }

    let mut op = ctx.wm().operators().create_instance(ty, properties, reports);
    if event.is_some() {
        op.flag |= OperatorFlags::IS_INVOKE;
    }

    let span = tracing::debug_span!(
        target: "kwm.operator",
        "kwm.operator.invoke",
        idname = %ty.idname,
        instance = op.id().0
    );
    let _guard = span.enter();

    if event.is_none_or(|e| e.kind != EventType::MouseMove) {
        tracing::debug!(
            target: "kwm.operator",
            event = ?event.map(|e| e.kind),
            window = ?ctx.window(),
            "handle event"
        );
    }

    let undo = ty.flag.contains(OperatorTypeFlags::UNDO);
    let result = match (&ty.invoke, &ty.exec, event) {
        (Some(invoke), _, Some(event)) => {
            let invoke = Rc::clone(invoke);
            with_undo_depth(ctx, undo, |ctx| invoke(ctx, &mut op, event))
        }
        (_, Some(exec), _) => {
            let exec = Rc::clone(exec);
            with_undo_depth(ctx, undo, |ctx| exec(ctx, &mut op))
        }
        _ => {
            tracing::error!(target: "kwm.operator", idname = %ty.idname, "invalid operator call");
            OperatorResult::PASS_THROUGH
        }
    };
    let result = checked_result(&ty.idname, result);

    if result.contains(OperatorResult::HANDLED) {
        // The callback already ran the operator through another path.
    } else if result.contains(OperatorResult::FINISHED) {
        operator_finished(ctx, op);
    } else if result.contains(OperatorResult::RUNNING_MODAL) {
        start_modal(ctx, op, event);
    }
    result
}

/// Undo push and history registration for a finished instance.
pub(crate) fn operator_finished(ctx: &mut Context<'_>, mut op: Operator) {
    op.customdata = None;
    let ty = Rc::clone(op.ty());
    if ctx.wm().undo_depth() == 0 && ty.wants_undo() {
        tracing::debug!(target: "kwm.operator", idname = %ty.idname, "undo push");
        ctx.wm_mut().host.undo_push(&ty.name);
    }
    if ty.flag.contains(OperatorTypeFlags::REGISTER) {
        ctx.wm_mut().push_history(OperatorRecord {
            idname: ty.idname.clone(),
            properties: op.properties.clone(),
        });
    }
}

/// Cancel an instance that can no longer run, keeping the undo depth raised
/// around its cancel callback.
pub(crate) fn cancel_operator(ctx: &mut Context<'_>, op: &mut Operator) {
    let ty = Rc::clone(op.ty());
    let Some(cancel) = ty.cancel.clone() else {
        return;
    };
    let undo = ty.flag.contains(OperatorTypeFlags::UNDO);
    with_undo_depth(ctx, undo, |ctx| cancel(ctx, op));
}

/// Park a modal instance at the front of the active window's modal list.
fn start_modal(ctx: &mut Context<'_>, mut op: Operator, event: Option<&Event>) {
    op.reports().borrow_mut().flag |= ReportFlags::FREE;

    let Some(window) = ctx.window().filter(|&w| ctx.wm().window(w).is_some()) else {
        tracing::error!(
            target: "kwm.operator",
            idname = %op.idname(),
            "modal operator started without a window"
        );
        cancel_operator(ctx, &mut op);
        return;
    };

    if is_blocking(&op) {
        let continuous = ctx.wm().prefs().dispatch.continuous_mouse;
        let grab = compute_grab(&op, event, continuous, ctx.area_data(), ctx.region_data());
        if let Some(win) = ctx.wm_mut().window_mut(window) {
            win.grab = Some(grab);
        }
        ctx.wm_mut().host.cursor_grab(window, &grab);
    }

    tracing::debug!(target: "kwm.operator", idname = %op.idname(), %window, "operator running modal");
    let handler = Handler::Operator(OperatorHandler {
        op: Some(op),
        area: ctx.area(),
        region: ctx.region(),
    });
    if let Some(win) = ctx.wm_mut().window_mut(window) {
        win.modal_handlers.insert(0, handler);
    }
    ui_cancel(ctx);
}

/// Send a cancel event to the UI handlers of the active region.
pub(crate) fn ui_cancel(ctx: &mut Context<'_>) {
    let Some(mut event) = ctx.eventstate().cloned() else {
        return;
    };
    let handles: Vec<_> = ctx
        .region_data()
        .map(|region| {
            region
                .handlers()
                .iter()
                .filter_map(|h| match h {
                    Handler::Ui(ui) => Some(Rc::clone(&ui.handle)),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    event.kind = EventType::UiCancel;
    event.value = KeyValue::Nothing;
    event.is_repeat = false;
    for handle in handles {
        handle(ctx, &event);
    }
}

// ---------------------------------------------------------------------------
// Call
// ---------------------------------------------------------------------------

/// Call `ty` in `call_context`, restoring the active area/region afterwards.
///
/// Invoke contexts need an active window; without one nothing runs.
pub fn call(
    ctx: &mut Context<'_>,
    ty: &Rc<OperatorType>,
    call_context: CallContext,
    properties: Option<&Properties>,
    reports: Option<SharedReports>,
) -> OperatorResult {
    let event = if call_context.is_invoke() {
        let Some(event) = ctx.eventstate().cloned() else {
            tracing::debug!(
                target: "kwm.operator",
                idname = %ty.idname,
                ?call_context,
                "missing window for invoke"
            );
            return OperatorResult::PASS_THROUGH;
        };
        Some(event)
    } else {
        None
    };

    let saved = (ctx.area(), ctx.region());
    match call_context {
        CallContext::InvokeArea | CallContext::ExecArea => ctx.set_region(None),
        CallContext::InvokeScreen | CallContext::ExecScreen => {
            ctx.set_region(None);
            ctx.set_area(None);
        }
        _ => {
            if let Some(kind) = call_context.target_region() {
                let in_kind = ctx.region_data().is_some_and(|r| r.kind == kind);
                if !in_kind
                    && let Some(other) = ctx
                        .area_data()
                        .and_then(|a| a.region_of_kind(kind))
                        .map(|r| r.id())
                {
                    ctx.set_region(Some(other));
                }
            }
        }
    }

    let result = invoke(ctx, ty, event.as_ref(), properties, reports);
    ctx.set_area(saved.0);
    ctx.set_region(saved.1);
    result
}

/// [`call`] by idname; unknown operators pass through.
pub fn call_by_name(
    ctx: &mut Context<'_>,
    idname: &str,
    call_context: CallContext,
    properties: Option<&Properties>,
    reports: Option<SharedReports>,
) -> OperatorResult {
    match ctx.wm().operators().find(idname) {
        Some(ty) => call(ctx, &ty, call_context, properties, reports),
        None => OperatorResult::PASS_THROUGH,
    }
}
