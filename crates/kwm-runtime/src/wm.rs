#![forbid(unsafe_code)]

//! The window manager: windows, operators, keymaps, notifiers and timers.
//!
//! [`WindowManager`] owns every piece of state the event pipeline needs and
//! exposes one main-loop entry point, [`WindowManager::step`]:
//!
//! 1. drain the remote hand-off channel,
//! 2. fire due timers,
//! 3. dispatch every queued event of every window,
//! 4. deliver queued notifiers to listening areas and regions.
//!
//! Raw platform input enters through [`WindowManager::process_raw`] at any
//! time between steps.

use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use ahash::AHashMap;
use kwm_core::break_flag::BreakFlag;
use kwm_core::event::{DragItem, Point, TimerId};
use kwm_core::input::{InputTargets, WindowId, WindowInput};
use kwm_core::normalizer::EventNormalizer;
use kwm_core::platform::RawEvent;
use web_time::{Duration, Instant};

use crate::context::Context;
use crate::dispatch;
use crate::host::{Host, NullHost};
use crate::keymap::KeyMap;
use crate::notifier::{NC_WM, ND_FILEREAD, NotifierBus, NotifierRef};
use crate::operator::{OperatorRegistry, OperatorType, RegistryError};
use crate::prefs::{Preferences, SharedPreferences};
use crate::properties::Properties;
use crate::remote::{RemoteInbox, RemoteMessage, RemoteSender};
use crate::timer::TimerQueue;
use crate::window::Window;

/// A finished REGISTER operator kept for redo and repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorRecord {
    pub idname: String,
    pub properties: Properties,
}

/// Counts from one [`WindowManager::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    pub remote: usize,
    pub timers: usize,
    pub events: usize,
    pub notifiers: usize,
}

// ---------------------------------------------------------------------------
// Window list
// ---------------------------------------------------------------------------

/// Windows in creation order; the normalizer's view of them.
#[derive(Debug, Default)]
pub(crate) struct WindowList {
    pub(crate) windows: Vec<Window>,
}

impl WindowList {
    pub(crate) fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.iter().find(|w| w.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }
}

impl InputTargets for WindowList {
    fn input(&mut self, window: WindowId) -> Option<&mut WindowInput> {
        self.get_mut(window).map(|w| &mut w.input)
    }

    fn window_count(&self) -> usize {
        self.windows.len()
    }

    fn other_window_at(&self, from: WindowId, pos: Point) -> Option<(WindowId, Point)> {
        let source = self.get(from)?;
        if source.has_modal_handlers() {
            return None;
        }
        let desktop = source.to_desktop(pos);
        self.windows
            .iter()
            .filter(|w| w.id() != from && !w.has_modal_handlers())
            .find(|w| w.contains_desktop(desktop))
            .map(|w| (w.id(), w.from_desktop(desktop)))
    }
}

// ---------------------------------------------------------------------------
// WindowManager
// ---------------------------------------------------------------------------

pub struct WindowManager {
    pub(crate) windows: WindowList,
    next_window: u32,
    operators: OperatorRegistry,
    keymaps: AHashMap<String, Rc<KeyMap>>,
    notifiers: NotifierBus,
    normalizer: EventNormalizer,
    prefs: Preferences,
    shared_prefs: Option<(SharedPreferences, Arc<Preferences>)>,
    timers: TimerQueue,
    remote: RemoteInbox,
    pub(crate) host: Box<dyn Host>,
    pub(crate) undo_depth: u32,
    generation: u64,
    pub(crate) drags: Vec<DragItem>,
    history: VecDeque<OperatorRecord>,
    pub(crate) tooltip_time_closed: Option<Instant>,
}

impl std::fmt::Debug for WindowManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowManager")
            .field("windows", &self.windows.windows.len())
            .field("operators", &self.operators.len())
            .field("keymaps", &self.keymaps.len())
            .field("notifiers", &self.notifiers.len())
            .field("undo_depth", &self.undo_depth)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowManager {
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefs(Preferences::default())
    }

    #[must_use]
    pub fn with_prefs(prefs: Preferences) -> Self {
        Self {
            windows: WindowList::default(),
            next_window: 0,
            operators: OperatorRegistry::new(),
            keymaps: AHashMap::new(),
            notifiers: NotifierBus::new(),
            normalizer: EventNormalizer::new(prefs.input.clone()),
            prefs,
            shared_prefs: None,
            timers: TimerQueue::new(),
            remote: RemoteInbox::default(),
            host: Box::new(NullHost),
            undo_depth: 0,
            generation: 0,
            drags: Vec::new(),
            history: VecDeque::new(),
            tooltip_time_closed: None,
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: Box<dyn Host>) -> Self {
        self.host = host;
        self
    }

    /// Follow `shared`: every step applies the latest published set.
    #[must_use]
    pub fn with_shared_prefs(mut self, shared: SharedPreferences) -> Self {
        let current = shared.load();
        self.set_prefs((*current).clone());
        self.shared_prefs = Some((shared, current));
        self
    }

    // -- preferences --------------------------------------------------------

    #[must_use]
    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn set_prefs(&mut self, prefs: Preferences) {
        self.normalizer.set_config(prefs.input.clone());
        for w in &mut self.windows.windows {
            w.input.queue.set_policy(prefs.input.move_coalescing);
        }
        self.prefs = prefs;
    }

    fn reload_shared_prefs(&mut self) {
        let Some((shared, seen)) = &self.shared_prefs else {
            return;
        };
        let latest = shared.load();
        if Arc::ptr_eq(seen, &latest) {
            return;
        }
        tracing::debug!(target: "kwm.prefs", "applying updated preferences");
        let shared = shared.clone();
        self.set_prefs((*latest).clone());
        self.shared_prefs = Some((shared, latest));
    }

    // -- windows ------------------------------------------------------------

    /// Open a window at desktop position `origin`.
    pub fn add_window(&mut self, origin: Point, width: i32, height: i32) -> WindowId {
        let id = WindowId(self.next_window);
        self.next_window += 1;
        let input = WindowInput::new(width, height).with_policy(self.prefs.input.move_coalescing);
        self.windows.windows.push(Window::new(id, origin, input));
        tracing::debug!(target: "kwm.wm", window = %id, width, height, "window added");
        id
    }

    #[must_use]
    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(id)
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.windows.iter()
    }

    #[must_use]
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.windows.iter().map(Window::id).collect()
    }

    /// Close `id`, cancelling its modal operators and removing its UI
    /// handlers.
    pub fn close_window(&mut self, id: WindowId, now: Instant) -> bool {
        let mut ctx = Context::new(self, now);
        ctx.close_window(id)
    }

    /// Detach a window without running any handler teardown.
    pub(crate) fn take_window(&mut self, id: WindowId) -> Option<Window> {
        let idx = self.windows.windows.iter().position(|w| w.id() == id)?;
        self.timers.remove_window(id);
        Some(self.windows.windows.remove(idx))
    }

    /// Load a new session: close every window, reset the undo depth and
    /// announce the file read.
    pub fn replace_session(&mut self, now: Instant) {
        self.generation += 1;
        for id in self.window_ids() {
            self.close_window(id, now);
        }
        self.undo_depth = 0;
        self.history.clear();
        self.drags.clear();
        self.notifiers.add(NC_WM | ND_FILEREAD, None, None);
        tracing::debug!(target: "kwm.wm", generation = self.generation, "session replaced");
    }

    /// Bumped on every session replacement.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // -- operators and keymaps ---------------------------------------------

    #[must_use]
    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn operators_mut(&mut self) -> &mut OperatorRegistry {
        &mut self.operators
    }

    pub fn register_operator(&mut self, ty: OperatorType) -> Result<Rc<OperatorType>, RegistryError> {
        self.operators.register(ty)
    }

    /// Register `keymap` under its name, replacing an earlier one.
    pub fn add_keymap(&mut self, keymap: KeyMap) -> Rc<KeyMap> {
        let keymap = Rc::new(keymap);
        self.keymaps.insert(keymap.name.clone(), Rc::clone(&keymap));
        keymap
    }

    #[must_use]
    pub fn keymap(&self, name: &str) -> Option<Rc<KeyMap>> {
        self.keymaps.get(name).cloned()
    }

    #[must_use]
    pub fn undo_depth(&self) -> u32 {
        self.undo_depth
    }

    /// Raise the undo depth; returns the session it was raised in.
    pub(crate) fn undo_enter(&mut self) -> u64 {
        self.undo_depth += 1;
        self.generation
    }

    pub(crate) fn undo_leave(&mut self, generation: u64) {
        if generation == self.generation {
            self.undo_depth = self.undo_depth.saturating_sub(1);
        }
    }

    /// Release the cursor grab of `window`, if any.
    pub(crate) fn ungrab(&mut self, window: WindowId) {
        let grabbed = self
            .windows
            .get_mut(window)
            .and_then(|w| w.grab.take())
            .is_some();
        if grabbed {
            self.host.cursor_ungrab(window);
        }
    }

    /// Finished REGISTER operators, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &OperatorRecord> {
        self.history.iter()
    }

    pub(crate) fn push_history(&mut self, record: OperatorRecord) {
        let cap = self.prefs.dispatch.max_registered_operators;
        if cap == 0 {
            return;
        }
        while self.history.len() >= cap {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    pub fn host_mut(&mut self) -> &mut dyn Host {
        self.host.as_mut()
    }

    // -- notifiers ----------------------------------------------------------

    #[must_use]
    pub fn notifiers(&self) -> &NotifierBus {
        &self.notifiers
    }

    /// Queue a notifier; `false` when it was a duplicate or invalid.
    pub fn add_notifier(
        &mut self,
        value: u32,
        reference: Option<NotifierRef>,
        window: Option<WindowId>,
    ) -> bool {
        self.notifiers.add(value, reference, window)
    }

    /// Deliver every queued notifier to listening areas and regions.
    ///
    /// Window-bound notices only reach that window; global ones reach all.
    /// Returns the number of notices drained.
    pub fn do_notifiers(&mut self) -> usize {
        let notes = self.notifiers.take();
        if notes.is_empty() {
            return 0;
        }
        for win in &mut self.windows.windows {
            let id = win.id();
            let Some(screen) = win.screen.as_mut() else {
                continue;
            };
            for note in notes.iter().filter(|n| n.window.is_none_or(|w| w == id)) {
                for area in screen.areas_mut() {
                    if area.listens_to(note) {
                        area.needs_redraw = true;
                        self.host.redraw_area(id, area.id());
                    }
                    for region in area.regions_mut() {
                        if region.listens_to(note) {
                            region.needs_redraw = true;
                            self.host.redraw_region(id, region.id());
                        }
                    }
                }
            }
        }
        tracing::trace!(target: "kwm.notifier", count = notes.len(), "notifiers delivered");
        notes.len()
    }

    // -- input --------------------------------------------------------------

    /// Normalize one raw platform event for `window` and queue the result.
    pub fn process_raw(&mut self, window: WindowId, raw: &RawEvent, now: Instant) -> usize {
        self.normalizer.process(&mut self.windows, window, raw, now)
    }

    /// Queue one synthetic mouse move for `window` once its current batch
    /// has been dispatched, so handlers re-test what lies under the cursor.
    ///
    /// Returns `false` if the window does not exist.
    pub fn defer_mousemove(&mut self, window: WindowId) -> bool {
        let Some(win) = self.window_mut(window) else {
            return false;
        };
        win.input.defer_mousemove();
        true
    }

    #[must_use]
    pub fn break_flag(&self) -> &BreakFlag {
        self.normalizer.break_flag()
    }

    // -- drag and drop ------------------------------------------------------

    /// Start dragging `item`; it drops on the next left-button release.
    pub fn start_drag(&mut self, item: DragItem) {
        self.drags.push(item);
    }

    #[must_use]
    pub fn drags(&self) -> &[DragItem] {
        &self.drags
    }

    // -- timers -------------------------------------------------------------

    pub fn add_timer(&mut self, window: Option<WindowId>, interval: Duration, now: Instant) -> TimerId {
        self.timers.add(window, interval, now)
    }

    pub fn remove_timer(&mut self, id: TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    #[must_use]
    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut TimerQueue {
        &mut self.timers
    }

    /// Queue a TIMER event for every due window timer.
    pub fn process_timers(&mut self, now: Instant) -> usize {
        let due = self.timers.due(now);
        let mut fired = 0;
        for (timer, window) in due {
            let Some(window) = window else {
                continue;
            };
            fired += self.process_raw(window, &RawEvent::Timer { timer }, now);
        }
        fired
    }

    /// Time the last open tooltip was closed.
    #[must_use]
    pub fn tooltip_time_closed(&self) -> Option<Instant> {
        self.tooltip_time_closed
    }

    // -- remote -------------------------------------------------------------

    /// Handle for posting from worker threads.
    #[must_use]
    pub fn remote_sender(&self) -> RemoteSender {
        self.remote.sender()
    }

    /// Apply every message posted through a [`RemoteSender`].
    pub fn pump_remote(&mut self) -> usize {
        let messages = self.remote.drain();
        let count = messages.len();
        let now = Instant::now();
        for msg in messages {
            match msg {
                RemoteMessage::Notifier {
                    value,
                    reference,
                    window,
                } => {
                    self.notifiers.add(value, reference, window);
                }
                RemoteMessage::TimerFire { window, timer } => {
                    self.process_raw(window, &RawEvent::Timer { timer }, now);
                }
                RemoteMessage::Break => self.break_flag().raise(),
            }
        }
        count
    }

    // -- main loop ----------------------------------------------------------

    /// Dispatch every queued event of every window.
    pub fn handle_events(&mut self, now: Instant) -> usize {
        let mut ctx = Context::new(self, now);
        dispatch::do_handlers(&mut ctx)
    }

    /// One main-loop iteration.
    pub fn step(&mut self, now: Instant) -> StepSummary {
        self.reload_shared_prefs();
        let remote = self.pump_remote();
        let timers = self.process_timers(now);
        let events = self.handle_events(now);
        let notifiers = self.do_notifiers();
        StepSummary {
            remote,
            timers,
            events,
            notifiers,
        }
    }
}
