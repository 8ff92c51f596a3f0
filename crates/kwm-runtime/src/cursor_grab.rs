#![forbid(unsafe_code)]

//! Cursor grab parameters for blocking modal operators.
//!
//! A blocking operator that goes modal grabs the cursor for its window. With
//! continuous mouse input enabled the cursor also wraps around, along the
//! axes the operator type asks for, within the bounds of the region (or
//! area) it was started in.

use kwm_core::event::{Event, Rect};

use crate::operator::{Operator, OperatorFlags, OperatorTypeFlags};
use crate::screen::{Area, Region, RegionKind};

/// Axes the grabbed cursor wraps along.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CursorWrap {
    #[default]
    None,
    X,
    Y,
    XY,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorGrab {
    pub wrap: CursorWrap,
    /// Wrap bounds in window space; `None` wraps at the window edges.
    pub bounds: Option<Rect>,
}

/// Whether `op` grabs the cursor while modal.
#[must_use]
pub fn is_blocking(op: &Operator) -> bool {
    op.ty().flag.contains(OperatorTypeFlags::BLOCKING)
        || op.grab_type().flag.contains(OperatorTypeFlags::BLOCKING)
}

/// Grab for `op`, which was just started modal from `region` in `area`.
///
/// Wrapping needs both an event and continuous mouse input. Header-like
/// regions only wrap horizontally.
#[must_use]
pub fn compute_grab(
    op: &Operator,
    event: Option<&Event>,
    continuous_mouse: bool,
    area: Option<&Area>,
    region: Option<&Region>,
) -> CursorGrab {
    let mut grab = CursorGrab::default();
    let Some(event) = event else {
        return grab;
    };
    if !continuous_mouse {
        return grab;
    }

    let flag = op.grab_type().flag;
    grab.wrap = if flag.contains(OperatorTypeFlags::GRAB_CURSOR_XY)
        || op.flag.contains(OperatorFlags::IS_MODAL_GRAB_CURSOR)
    {
        CursorWrap::XY
    } else if flag.contains(OperatorTypeFlags::GRAB_CURSOR_X) {
        CursorWrap::X
    } else if flag.contains(OperatorTypeFlags::GRAB_CURSOR_Y) {
        CursorWrap::Y
    } else {
        CursorWrap::None
    };

    if grab.wrap == CursorWrap::None {
        return grab;
    }

    if let Some(region) = region {
        if region.kind.is_header() {
            grab.wrap = CursorWrap::X;
        }
        if region.kind == RegionKind::Window && region.rect.contains(event.mouse_pos) {
            grab.bounds = Some(region.rect);
            return grab;
        }
    }
    if let Some(area) = area
        && area.rect.contains(event.mouse_pos)
    {
        grab.bounds = Some(area.rect);
    }
    grab
}
