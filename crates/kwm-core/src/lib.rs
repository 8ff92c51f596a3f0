#![forbid(unsafe_code)]

//! Core: canonical input events, per-window queues, and device normalization.
//!
//! # Role in kwm
//! `kwm-core` is the input layer. It turns raw platform callbacks into
//! canonical [`Event`](event::Event)s, keeps each window's event state and
//! queue, and owns the click/drag/double-click arithmetic that the dispatch
//! loop in `kwm-runtime` relies on.
//!
//! # Primary responsibilities
//! - **EventNormalizer**: raw callback to canonical event, modifier and
//!   key-modifier bookkeeping, button/numpad emulation, double clicks.
//! - **EventQueue**: ordered per-window FIFO with mouse-move coalescing and
//!   trackpad delta merging.
//! - **InputConfig**: every tunable input constant, env overrides and
//!   validation.
//! - **BreakFlag**: the cooperative "stop" request raised by Escape.
//!
//! # How it fits in the system
//! The runtime owns windows and implements [`InputTargets`](input::InputTargets)
//! so the normalizer can reach every window's [`WindowInput`](input::WindowInput).
//! Nothing in this crate knows about operators, handlers or notifiers.

pub mod break_flag;
pub mod config;
pub mod drag;
pub mod event;
pub mod input;
pub mod keys;
pub mod normalizer;
pub mod platform;
pub mod queue;

pub use break_flag::BreakFlag;
pub use config::{EmulationModifier, InputConfig, MoveCoalescing};
pub use event::{
    CustomData, DragItem, Event, EventFlags, EventType, KeyValue, ModState, Modifiers, Point,
    Rect, TabletData, TabletMode, TimerId,
};
pub use input::{InputTargets, WindowId, WindowInput};
pub use keys::{Key, PlatformKey, convert_key};
pub use normalizer::EventNormalizer;
pub use platform::{PlatformButton, RawEvent, RawTablet, RawTabletMode, TrackpadGesture};
pub use queue::{EventId, EventQueue};
