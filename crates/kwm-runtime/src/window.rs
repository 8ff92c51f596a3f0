#![forbid(unsafe_code)]

//! Windows: input state, layout and the window-level handler lists.

use kwm_core::event::{EventType, Point};
use kwm_core::input::{WindowId, WindowInput};

use crate::cursor_grab::CursorGrab;
use crate::handler::Handler;
use crate::screen::Screen;
use crate::tooltip::TooltipState;

#[derive(Debug)]
pub struct Window {
    id: WindowId,
    /// Position of the window's origin on the desktop.
    pub origin: Point,
    pub input: WindowInput,
    pub screen: Option<Screen>,
    pub(crate) modal_handlers: Vec<Handler>,
    pub(crate) handlers: Vec<Handler>,
    /// A press is waiting for its release to become a click.
    pub(crate) check_click: bool,
    /// A press is waiting to cross the drag threshold.
    pub(crate) check_drag: bool,
    /// Type and position of the press being watched for click or drag.
    pub(crate) drag_start: Option<(EventType, Point)>,
    pub(crate) grab: Option<CursorGrab>,
    pub(crate) tooltip: Option<TooltipState>,
}

impl Window {
    pub(crate) fn new(id: WindowId, origin: Point, input: WindowInput) -> Self {
        Self {
            id,
            origin,
            input,
            screen: None,
            modal_handlers: Vec::new(),
            handlers: Vec::new(),
            check_click: false,
            check_drag: false,
            drag_start: None,
            grab: None,
            tooltip: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> WindowId {
        self.id
    }

    #[must_use]
    pub fn size(&self) -> (i32, i32) {
        (self.input.width, self.input.height)
    }

    /// Window-space point in desktop space.
    #[must_use]
    pub fn to_desktop(&self, p: Point) -> Point {
        Point::new(self.origin.x + p.x, self.origin.y + p.y)
    }

    /// Desktop-space point in window space.
    #[must_use]
    pub fn from_desktop(&self, p: Point) -> Point {
        p - self.origin
    }

    #[must_use]
    pub fn contains_desktop(&self, p: Point) -> bool {
        let local = self.from_desktop(p);
        local.x >= 0 && local.y >= 0 && local.x <= self.input.width && local.y <= self.input.height
    }

    pub fn set_screen(&mut self, screen: Screen) {
        self.screen = Some(screen);
    }

    #[must_use]
    pub fn modal_handlers(&self) -> &[Handler] {
        &self.modal_handlers
    }

    #[must_use]
    pub fn has_modal_handlers(&self) -> bool {
        !self.modal_handlers.is_empty()
    }

    #[must_use]
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    /// Append a window-level handler, consulted after region and area
    /// handlers.
    pub fn add_handler(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    /// Active cursor grab, if a blocking modal operator holds one.
    #[must_use]
    pub fn cursor_grab(&self) -> Option<&CursorGrab> {
        self.grab.as_ref()
    }

    #[must_use]
    pub fn tooltip(&self) -> Option<&TooltipState> {
        self.tooltip.as_ref()
    }

    #[must_use]
    pub fn is_checking_click(&self) -> bool {
        self.check_click
    }

    #[must_use]
    pub fn is_checking_drag(&self) -> bool {
        self.check_drag
    }
}
