#![forbid(unsafe_code)]

//! Operators: named, registered, invokable actions.
//!
//! An [`OperatorType`] is the registered definition: an idname, type flags,
//! default properties and up to five callbacks (poll, invoke, exec, modal,
//! cancel). An [`Operator`] is one running instance of a type with its own
//! property copy and report list.
//!
//! # Result protocol
//!
//! Every invoke, exec and modal callback returns an [`OperatorResult`]:
//!
//! | Result | Meaning |
//! |--------|---------|
//! | `FINISHED` | Done; undo push and history registration follow |
//! | `CANCELLED` | Done without effect |
//! | `RUNNING_MODAL` | Keep the instance alive as a modal handler |
//! | `PASS_THROUGH` | Let the event continue to other handlers |
//! | `HANDLED` | Event consumed, instance discarded |
//!
//! `RUNNING_MODAL | PASS_THROUGH` keeps the operator running while letting
//! the event through.
//!
//! # Macros
//!
//! A type flagged [`OperatorTypeFlags::MACRO`] is a sequence of steps
//! naming other operator types. Creating an instance flattens every step
//! (depth-first) into the root's child list, and the built-in macro
//! callbacks in [`macros`] drive the children in order.

mod instance;
pub mod invoke;
pub mod macros;
mod registry;

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use kwm_core::event::Event;

use crate::context::Context;
use crate::properties::{Properties, PropertyValue};

pub use instance::{MacroParent, Operator, OperatorId};
pub use invoke::{CallContext, call, call_by_name, invoke as invoke_operator, poll};
pub use registry::{OperatorRegistry, RegistryError};

bitflags! {
    /// Outcome of an operator callback.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct OperatorResult: u8 {
        const RUNNING_MODAL = 1 << 0;
        const CANCELLED = 1 << 1;
        const FINISHED = 1 << 2;
        const PASS_THROUGH = 1 << 3;
        const HANDLED = 1 << 4;
    }
}

impl OperatorResult {
    /// A result is valid when it is non-empty and uses only known bits.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !self.is_empty() && Self::all().contains(self)
    }
}

bitflags! {
    /// Registration-time behavior of an operator type.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct OperatorTypeFlags: u16 {
        /// Keep finished instances in the window manager's history.
        const REGISTER = 1 << 0;
        /// Push an undo step when the operator finishes.
        const UNDO = 1 << 1;
        /// Grab the cursor while running modal.
        const BLOCKING = 1 << 2;
        /// The type is a macro of other operator types.
        const MACRO = 1 << 3;
        /// Wrap the grabbed cursor on both axes.
        const GRAB_CURSOR_XY = 1 << 4;
        const GRAB_CURSOR_X = 1 << 5;
        const GRAB_CURSOR_Y = 1 << 6;
        const PRESET = 1 << 7;
        /// Hidden from search menus.
        const INTERNAL = 1 << 8;
        /// Allowed to run while the interface is locked.
        const LOCK_BYPASS = 1 << 9;
        /// Undo pushes of consecutive runs collapse into one step.
        const UNDO_GROUPED = 1 << 10;
    }
}

bitflags! {
    /// Per-instance state flags.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct OperatorFlags: u8 {
        /// Started through invoke (an event was available).
        const IS_INVOKE = 1 << 0;
        /// Running again from the redo/repeat path.
        const IS_REPEAT = 1 << 1;
        /// Set by a modal operator to request cursor wrapping at runtime.
        const IS_MODAL_GRAB_CURSOR = 1 << 2;
        /// Modal input is relative to the handler's region.
        const IS_MODAL_CURSOR_REGION = 1 << 3;
    }
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

pub type PollFn = Rc<dyn Fn(&Context<'_>) -> bool>;
pub type InvokeFn = Rc<dyn Fn(&mut Context<'_>, &mut Operator, &Event) -> OperatorResult>;
pub type ExecFn = Rc<dyn Fn(&mut Context<'_>, &mut Operator) -> OperatorResult>;
pub type ModalFn = Rc<dyn Fn(&mut Context<'_>, &mut Operator, &Event) -> OperatorResult>;
pub type CancelFn = Rc<dyn Fn(&mut Context<'_>, &mut Operator)>;

/// One step of a macro type.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroStep {
    pub idname: String,
    /// Overrides applied on top of the step type's defaults.
    pub properties: Properties,
}

// ---------------------------------------------------------------------------
// OperatorType
// ---------------------------------------------------------------------------

/// Registered operator definition.
#[derive(Clone)]
pub struct OperatorType {
    pub idname: String,
    /// Human-readable name, used for undo steps.
    pub name: String,
    pub description: String,
    pub flag: OperatorTypeFlags,
    /// Defaults copied into every new instance.
    pub properties: Properties,
    pub(crate) poll: Option<PollFn>,
    pub(crate) invoke: Option<InvokeFn>,
    pub(crate) exec: Option<ExecFn>,
    pub(crate) modal: Option<ModalFn>,
    pub(crate) cancel: Option<CancelFn>,
    pub(crate) macro_steps: Vec<MacroStep>,
}

impl fmt::Debug for OperatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorType")
            .field("idname", &self.idname)
            .field("flag", &self.flag)
            .field("poll", &self.poll.is_some())
            .field("invoke", &self.invoke.is_some())
            .field("exec", &self.exec.is_some())
            .field("modal", &self.modal.is_some())
            .field("cancel", &self.cancel.is_some())
            .field("macro_steps", &self.macro_steps.len())
            .finish()
    }
}

impl OperatorType {
    #[must_use]
    pub fn new(idname: impl Into<String>) -> Self {
        let idname = idname.into();
        Self {
            name: idname.clone(),
            idname,
            description: String::new(),
            flag: OperatorTypeFlags::empty(),
            properties: Properties::new(),
            poll: None,
            invoke: None,
            exec: None,
            modal: None,
            cancel: None,
            macro_steps: Vec::new(),
        }
    }

    /// A macro type driven by the built-in step callbacks.
    ///
    /// Flags given later through [`with_flags`](Self::with_flags) are added
    /// to [`OperatorTypeFlags::MACRO`].
    #[must_use]
    pub fn new_macro(idname: impl Into<String>) -> Self {
        let mut ty = Self::new(idname);
        ty.flag = OperatorTypeFlags::MACRO;
        ty.invoke = Some(Rc::new(macros::macro_invoke));
        ty.exec = Some(Rc::new(macros::macro_exec));
        ty.modal = Some(Rc::new(macros::macro_modal));
        ty.cancel = Some(Rc::new(macros::macro_cancel));
        ty
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flag: OperatorTypeFlags) -> Self {
        self.flag |= flag;
        self
    }

    /// Add a default property value.
    #[must_use]
    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.set(name, value);
        self
    }

    #[must_use]
    pub fn with_poll(mut self, f: impl Fn(&Context<'_>) -> bool + 'static) -> Self {
        self.poll = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn with_invoke(
        mut self,
        f: impl Fn(&mut Context<'_>, &mut Operator, &Event) -> OperatorResult + 'static,
    ) -> Self {
        self.invoke = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn with_exec(
        mut self,
        f: impl Fn(&mut Context<'_>, &mut Operator) -> OperatorResult + 'static,
    ) -> Self {
        self.exec = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn with_modal(
        mut self,
        f: impl Fn(&mut Context<'_>, &mut Operator, &Event) -> OperatorResult + 'static,
    ) -> Self {
        self.modal = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, f: impl Fn(&mut Context<'_>, &mut Operator) + 'static) -> Self {
        self.cancel = Some(Rc::new(f));
        self
    }

    /// Append a macro step running `idname` with its defaults.
    #[must_use]
    pub fn with_step(self, idname: impl Into<String>) -> Self {
        self.with_step_properties(idname, Properties::new())
    }

    /// Append a macro step running `idname` with `properties` applied over
    /// its defaults.
    #[must_use]
    pub fn with_step_properties(mut self, idname: impl Into<String>, properties: Properties) -> Self {
        self.macro_steps.push(MacroStep {
            idname: idname.into(),
            properties,
        });
        self
    }

    #[must_use]
    pub fn is_macro(&self) -> bool {
        self.flag.contains(OperatorTypeFlags::MACRO)
    }

    #[must_use]
    pub fn macro_steps(&self) -> &[MacroStep] {
        &self.macro_steps
    }

    #[must_use]
    pub fn has_invoke(&self) -> bool {
        self.invoke.is_some()
    }

    #[must_use]
    pub fn has_exec(&self) -> bool {
        self.exec.is_some()
    }

    #[must_use]
    pub fn has_modal(&self) -> bool {
        self.modal.is_some()
    }

    /// Whether a finished run should push an undo step.
    #[must_use]
    pub fn wants_undo(&self) -> bool {
        self.flag
            .intersects(OperatorTypeFlags::UNDO | OperatorTypeFlags::UNDO_GROUPED)
    }
}
