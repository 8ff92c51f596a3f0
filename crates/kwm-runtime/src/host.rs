#![forbid(unsafe_code)]

//! Boundary to the application embedding the window manager.
//!
//! The dispatch loop never touches the platform or the document directly.
//! Everything that leaves the window manager goes through [`Host`]: undo
//! pushes when operators finish, cursor grabs for blocking modal operators
//! and redraw requests from notifier delivery. Every method has a no-op
//! default, so a host only implements what it cares about.

use kwm_core::input::WindowId;

use crate::cursor_grab::CursorGrab;
use crate::screen::{AreaId, RegionId};

pub trait Host {
    /// Record an undo step named after the finished operator.
    fn undo_push(&mut self, _name: &str) {}

    /// Start grabbing the cursor in `window`.
    fn cursor_grab(&mut self, _window: WindowId, _grab: &CursorGrab) {}

    /// Release a grab started with [`cursor_grab`](Self::cursor_grab).
    fn cursor_ungrab(&mut self, _window: WindowId) {}

    /// An area listening to a delivered notifier must be redrawn.
    fn redraw_area(&mut self, _window: WindowId, _area: AreaId) {}

    /// A region listening to a delivered notifier must be redrawn.
    fn redraw_region(&mut self, _window: WindowId, _region: RegionId) {}
}

/// Host that ignores every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl Host for NullHost {}
