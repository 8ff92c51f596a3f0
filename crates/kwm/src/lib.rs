#![forbid(unsafe_code)]

//! kwm public facade crate.
//!
//! Re-exports the types an embedding application needs from `kwm-core` and
//! `kwm-runtime`, plus a prelude for day-to-day use. The usual loop is:
//!
//! ```rust,ignore
//! use kwm::prelude::*;
//!
//! let mut wm = WindowManager::new();
//! let win = wm.add_window(Point::new(0, 0), 1280, 720);
//! loop {
//!     for raw in platform.poll() {
//!         wm.process_raw(win, &raw, Instant::now());
//!     }
//!     wm.step(Instant::now());
//! }
//! ```

// --- Core re-exports -------------------------------------------------------

pub use kwm_core::{
    BreakFlag, CustomData, DragItem, EmulationModifier, Event, EventFlags, EventNormalizer,
    EventQueue, EventType, InputConfig, Key, KeyValue, Modifiers, MoveCoalescing, PlatformButton,
    PlatformKey, Point, RawEvent, Rect, TimerId, WindowId,
};

// --- Runtime re-exports ----------------------------------------------------

pub use kwm_runtime::{
    CallContext, Context, DispatchConfig, Handler, HandlerAction, Host, KeyMap, KeyMapItem,
    ModMatch, Notifier, NotifierBus, NotifierRef, NullHost, Operator, OperatorRegistry,
    OperatorResult, OperatorType, OperatorTypeFlags, Preferences, PrefsError, Properties,
    PropertyValue, RegionKind, RegistryError, RemoteError, RemoteSender, Report, ReportKind,
    Screen, SharedPreferences, StepSummary, UiAction, Window, WindowManager,
};

#[cfg(feature = "subscriber")]
pub use kwm_runtime::logging::{LogFormat, LoggingError};

// --- Errors ---------------------------------------------------------------

/// Top-level error for applications embedding kwm.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Prefs(#[from] PrefsError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[cfg(feature = "subscriber")]
    #[error(transparent)]
    Logging(#[from] LoggingError),
}

pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CallContext, Context, Error, Event, EventType, Handler, Key, KeyMap, KeyMapItem, KeyValue,
        OperatorResult, OperatorType, OperatorTypeFlags, Point, Preferences, RawEvent, Rect,
        RegionKind, Result, Screen, UiAction, WindowId, WindowManager,
    };

    pub use crate::{core, runtime};
}

pub use kwm_core as core;
pub use kwm_runtime as runtime;
