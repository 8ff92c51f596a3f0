#![forbid(unsafe_code)]

//! Explicit call context handed to every operator, handler and keymap
//! callback.
//!
//! A [`Context`] borrows the window manager for the duration of one
//! dispatch pass and carries the active window, area and region. Dispatch
//! and the operator-calling helpers move the active area/region around a
//! call and restore them afterwards.

use std::rc::Rc;

use kwm_core::event::Event;
use kwm_core::input::WindowId;
use web_time::Instant;

use crate::dispatch;
use crate::notifier::NotifierRef;
use crate::operator::{self, CallContext, OperatorResult};
use crate::properties::Properties;
use crate::reports::SharedReports;
use crate::screen::{Area, AreaId, Region, RegionId, Screen};
use crate::window::Window;
use crate::wm::WindowManager;

pub struct Context<'a> {
    wm: &'a mut WindowManager,
    window: Option<WindowId>,
    area: Option<AreaId>,
    region: Option<RegionId>,
    now: Instant,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("window", &self.window)
            .field("area", &self.area)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl<'a> Context<'a> {
    #[must_use]
    pub fn new(wm: &'a mut WindowManager, now: Instant) -> Self {
        Self {
            wm,
            window: None,
            area: None,
            region: None,
            now,
        }
    }

    /// Context with `window` active and no area or region.
    #[must_use]
    pub fn for_window(wm: &'a mut WindowManager, window: WindowId, now: Instant) -> Self {
        let mut ctx = Self::new(wm, now);
        ctx.window = Some(window);
        ctx
    }

    #[must_use]
    pub fn wm(&self) -> &WindowManager {
        self.wm
    }

    pub fn wm_mut(&mut self) -> &mut WindowManager {
        self.wm
    }

    /// Time of the current dispatch pass.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.now
    }

    // -- active window, area, region ---------------------------------------

    #[must_use]
    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    pub fn set_window(&mut self, window: Option<WindowId>) {
        self.window = window;
    }

    #[must_use]
    pub fn area(&self) -> Option<AreaId> {
        self.area
    }

    pub fn set_area(&mut self, area: Option<AreaId>) {
        self.area = area;
    }

    #[must_use]
    pub fn region(&self) -> Option<RegionId> {
        self.region
    }

    pub fn set_region(&mut self, region: Option<RegionId>) {
        self.region = region;
    }

    /// The active window, if it still exists.
    #[must_use]
    pub fn win(&self) -> Option<&Window> {
        self.wm.window(self.window?)
    }

    pub fn win_mut(&mut self) -> Option<&mut Window> {
        self.wm.window_mut(self.window?)
    }

    #[must_use]
    pub fn screen(&self) -> Option<&Screen> {
        self.win()?.screen.as_ref()
    }

    #[must_use]
    pub fn area_data(&self) -> Option<&Area> {
        self.screen()?.area(self.area?)
    }

    #[must_use]
    pub fn region_data(&self) -> Option<&Region> {
        self.screen()?.region(self.region?)
    }

    /// Last known input state of the active window.
    #[must_use]
    pub fn eventstate(&self) -> Option<&Event> {
        self.win().map(|w| &w.input.eventstate)
    }

    // -- operations ---------------------------------------------------------

    /// Queue a notifier raised from the active window.
    pub fn add_notifier(&mut self, value: u32, reference: Option<NotifierRef>) -> bool {
        let window = self.window;
        self.wm.add_notifier(value, reference, window)
    }

    /// Ask for a mouse move on the active window after the current batch.
    pub fn defer_mousemove(&mut self) -> bool {
        match self.window {
            Some(window) => self.wm.defer_mousemove(window),
            None => false,
        }
    }

    /// Close `window`, tearing down every handler it holds.
    ///
    /// Returns `false` if the window did not exist. A closed active window
    /// leaves the context without a window.
    pub fn close_window(&mut self, window: WindowId) -> bool {
        if self.wm.window(window).is_none() {
            return false;
        }
        let saved = (self.window, self.area, self.region);
        self.window = Some(window);
        self.area = None;
        self.region = None;

        let mut handlers = Vec::new();
        if let Some(win) = self.wm.window_mut(window) {
            handlers.append(&mut win.handlers);
            handlers.append(&mut win.modal_handlers);
            if let Some(screen) = win.screen.as_mut() {
                for area in screen.areas_mut() {
                    for region in area.regions_mut() {
                        handlers.append(&mut region.handlers);
                    }
                    handlers.append(&mut area.handlers);
                }
            }
        }
        dispatch::remove_handlers(self, handlers);
        crate::tooltip::clear(self, window);
        self.wm.ungrab(window);
        self.wm.take_window(window);
        tracing::debug!(target: "kwm.wm", %window, "window closed");

        if saved.0 == Some(window) {
            self.window = None;
            self.area = None;
            self.region = None;
        } else {
            (self.window, self.area, self.region) = saved;
        }
        true
    }

    /// Look up `idname` and call it in `call_context`.
    pub fn call_operator(
        &mut self,
        idname: &str,
        call_context: CallContext,
        properties: Option<&Properties>,
    ) -> OperatorResult {
        operator::call_by_name(self, idname, call_context, properties, None)
    }

    /// Like [`call_operator`](Self::call_operator), collecting reports into
    /// `reports`.
    pub fn call_operator_with_reports(
        &mut self,
        idname: &str,
        call_context: CallContext,
        properties: Option<&Properties>,
        reports: &SharedReports,
    ) -> OperatorResult {
        operator::call_by_name(self, idname, call_context, properties, Some(Rc::clone(reports)))
    }
}
