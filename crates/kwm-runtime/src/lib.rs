#![forbid(unsafe_code)]

//! Runtime: notifiers, operators, handlers and the dispatch loop.
//!
//! # Role in kwm
//! `kwm-runtime` sits on top of `kwm-core`. It owns the windows, their
//! screens and handler stacks, and routes every queued event to modal
//! operators, UI handlers and keymaps.
//!
//! # Primary responsibilities
//! - **WindowManager**: windows, operator registry, keymaps, timers,
//!   undo bookkeeping and the per-tick [`step`](WindowManager::step).
//! - **NotifierBus**: deduplicated change notifications delivered to
//!   listening areas and regions after dispatch.
//! - **Operators**: registration, instance creation, macro expansion,
//!   invoke/exec/modal/cancel with undo and history bookkeeping.
//! - **Dispatch**: modal handlers first, then region, area and window
//!   handler lists; click, double-click and click-drag synthesis;
//!   tooltips and drag-and-drop.
//! - **RemoteSender**: thread-safe inbox for notifiers, timer fires and
//!   break requests raised off the main thread.
//!
//! # How it fits in the system
//! The host feeds [`RawEvent`](kwm_core::RawEvent)s through
//! [`WindowManager::process_raw`] and calls [`WindowManager::step`] once
//! per tick. Side effects that leave the window manager (cursor grabs,
//! redraws, undo pushes) go through the [`Host`] trait.
//!
//! ```rust,ignore
//! use kwm_runtime::{WindowManager, operator::{OperatorResult, OperatorType}};
//!
//! let mut wm = WindowManager::new();
//! wm.register_operator(
//!     OperatorType::new("SCREEN_OT_redo").with_exec(|_, _| OperatorResult::FINISHED),
//! )?;
//! let win = wm.add_window(Point::new(0, 0), 800, 600);
//! wm.step(Instant::now());
//! ```

pub mod context;
pub mod cursor_grab;
mod dispatch;
pub mod drag_policy;
pub mod handler;
pub mod host;
pub mod keymap;
#[cfg(feature = "subscriber")]
pub mod logging;
pub mod notifier;
pub mod operator;
pub mod prefs;
pub mod properties;
pub mod remote;
pub mod reports;
pub mod screen;
pub mod timer;
pub mod tooltip;
pub mod window;
pub mod wm;

pub use context::Context;
pub use cursor_grab::{CursorGrab, CursorWrap};
pub use handler::{Handler, HandlerAction, UiAction};
pub use host::{Host, NullHost};
pub use keymap::{KeyMap, KeyMapItem, ModMatch};
pub use notifier::{Notifier, NotifierBus, NotifierRef};
pub use operator::{
    CallContext, Operator, OperatorFlags, OperatorRegistry, OperatorResult, OperatorType,
    OperatorTypeFlags, RegistryError,
};
pub use prefs::{DispatchConfig, Preferences, PrefsError, SharedPreferences};
pub use properties::{Properties, PropertyValue};
pub use remote::{RemoteError, RemoteMessage, RemoteSender};
pub use reports::{Report, ReportKind, ReportList, SharedReports, shared_reports};
pub use screen::{Area, AreaId, Region, RegionId, RegionKind, Screen};
pub use timer::{Timer, TimerQueue};
pub use tooltip::TooltipState;
pub use window::Window;
pub use wm::{OperatorRecord, StepSummary, WindowManager};
