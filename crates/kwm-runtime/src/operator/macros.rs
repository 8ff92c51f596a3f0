#![forbid(unsafe_code)]

//! Built-in callbacks that drive a macro root through its flattened
//! children.
//!
//! Children run in order until one does not finish. A child that goes modal
//! becomes the active step: the root stays modal and forwards every modal
//! event to it, resuming the remaining children once it finishes. A macro
//! that is cancelled after at least one child finished reports `FINISHED`,
//! so the completed part still gets an undo step.

use std::rc::Rc;

use kwm_core::event::Event;

use super::{Operator, OperatorResult};
use crate::context::Context;

fn macro_end(op: &mut Operator, mut result: OperatorResult) -> OperatorResult {
    if result.contains(OperatorResult::CANCELLED) && op.macro_state.any_finished {
        result.remove(OperatorResult::CANCELLED);
        result.insert(OperatorResult::FINISHED);
    }
    if result.intersects(OperatorResult::FINISHED | OperatorResult::CANCELLED) {
        op.macro_state = Default::default();
    }
    result
}

fn collect_child_reports(op: &Operator, idx: usize) {
    let child = &op.macro_ops[idx];
    if Rc::ptr_eq(op.reports(), child.reports()) {
        return;
    }
    op.reports()
        .borrow_mut()
        .append(&mut child.reports().borrow_mut());
}

/// Run children from `start` through invoke (or exec) until one does not
/// finish.
fn invoke_from(
    ctx: &mut Context<'_>,
    op: &mut Operator,
    event: &Event,
    start: usize,
) -> OperatorResult {
    let mut result = OperatorResult::FINISHED;
    op.macro_state.active = None;
    for idx in start..op.macro_ops.len() {
        let child = &mut op.macro_ops[idx];
        let ty = Rc::clone(child.ty());
        if let Some(invoke) = &ty.invoke {
            result = invoke(ctx, child, event);
        } else if let Some(exec) = &ty.exec {
            result = exec(ctx, child);
        }
        collect_child_reports(op, idx);
        if result.contains(OperatorResult::FINISHED) {
            op.macro_state.any_finished = true;
        } else {
            if result.contains(OperatorResult::RUNNING_MODAL) {
                op.macro_state.active = Some(idx);
            }
            break;
        }
    }
    macro_end(op, result)
}

pub(crate) fn macro_exec(ctx: &mut Context<'_>, op: &mut Operator) -> OperatorResult {
    op.macro_state = Default::default();
    let mut result = OperatorResult::FINISHED;
    for idx in 0..op.macro_ops.len() {
        let child = &mut op.macro_ops[idx];
        let ty = Rc::clone(child.ty());
        let Some(exec) = &ty.exec else {
            tracing::warn!(target: "kwm.operator", idname = %ty.idname, "macro step can't exec");
            continue;
        };
        result = exec(ctx, child);
        collect_child_reports(op, idx);
        if result.contains(OperatorResult::FINISHED) {
            op.macro_state.any_finished = true;
        } else {
            break;
        }
    }
    macro_end(op, result)
}

pub(crate) fn macro_invoke(ctx: &mut Context<'_>, op: &mut Operator, event: &Event) -> OperatorResult {
    op.macro_state = Default::default();
    invoke_from(ctx, op, event, 0)
}

pub(crate) fn macro_modal(ctx: &mut Context<'_>, op: &mut Operator, event: &Event) -> OperatorResult {
    let Some(idx) = op.macro_state.active else {
        tracing::error!(target: "kwm.operator", idname = %op.idname(), "macro modal without an active step");
        return macro_end(op, OperatorResult::FINISHED);
    };
    let child = &mut op.macro_ops[idx];
    let ty = Rc::clone(child.ty());
    let Some(modal) = &ty.modal else {
        tracing::error!(target: "kwm.operator", idname = %ty.idname, "macro step has no modal callback");
        return macro_end(op, OperatorResult::CANCELLED);
    };
    let mut result = modal(ctx, child, event);
    if result.contains(OperatorResult::CANCELLED) {
        // Cancelled steps restart from their defaults.
        child.properties = ty.properties.clone();
    }
    collect_child_reports(op, idx);
    if result.contains(OperatorResult::FINISHED) && idx + 1 < op.macro_ops.len() {
        op.macro_state.any_finished = true;
        result = invoke_from(ctx, op, event, idx + 1);
        return result;
    }
    macro_end(op, result)
}

pub(crate) fn macro_cancel(ctx: &mut Context<'_>, op: &mut Operator) {
    if let Some(idx) = op.macro_state.active {
        let child = &mut op.macro_ops[idx];
        let ty = Rc::clone(child.ty());
        if let Some(cancel) = &ty.cancel {
            cancel(ctx, child);
        }
    }
    macro_end(op, OperatorResult::CANCELLED);
}
