#![forbid(unsafe_code)]

//! Event handlers attached to windows, areas and regions.
//!
//! A handler list is walked front to back for every event. Each handler
//! answers with a [`HandlerAction`]; the walk stops at the first answer
//! containing [`HandlerAction::BREAK`].

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use kwm_core::event::Event;

use crate::context::Context;
use crate::operator::{Operator, OperatorResult};
use crate::screen::{AreaId, RegionId};

bitflags! {
    /// What a handler did with an event. The empty set means "continue".
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct HandlerAction: u8 {
        const BREAK = 1 << 0;
        const HANDLED = 1 << 1;
        const MODAL = 1 << 2;
    }
}

impl HandlerAction {
    pub const CONTINUE: Self = Self::empty();

    /// Nothing consumed the event: plain continue, or a modal handler that
    /// passed it through.
    #[must_use]
    pub fn is_not_handled(self) -> bool {
        self == Self::CONTINUE || self == (Self::BREAK | Self::MODAL)
    }

    /// Map an operator result onto handler flow.
    #[must_use]
    pub fn from_operator(result: OperatorResult) -> Self {
        if result == OperatorResult::FINISHED | OperatorResult::PASS_THROUGH {
            Self::HANDLED
        } else if result == OperatorResult::RUNNING_MODAL | OperatorResult::PASS_THROUGH {
            Self::BREAK | Self::MODAL
        } else if result.contains(OperatorResult::PASS_THROUGH) {
            Self::CONTINUE
        } else {
            Self::BREAK
        }
    }
}

/// Answer of a UI handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Continue,
    Break,
}

pub type UiHandleFn = Rc<dyn Fn(&mut Context<'_>, &Event) -> UiAction>;
pub type UiRemoveFn = Rc<dyn Fn(&mut Context<'_>)>;

/// A running modal operator.
#[derive(Debug)]
pub struct OperatorHandler {
    /// Taken while the operator's modal callback runs.
    pub(crate) op: Option<Operator>,
    pub area: Option<AreaId>,
    pub region: Option<RegionId>,
}

impl OperatorHandler {
    #[must_use]
    pub fn operator(&self) -> Option<&Operator> {
        self.op.as_ref()
    }
}

/// Interface-toolkit callback pair.
#[derive(Clone)]
pub struct UiHandler {
    pub handle: UiHandleFn,
    /// Called when the handler is removed without finishing.
    pub remove: Option<UiRemoveFn>,
    pub area: Option<AreaId>,
    pub region: Option<RegionId>,
}

impl fmt::Debug for UiHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiHandler")
            .field("area", &self.area)
            .field("region", &self.region)
            .field("remove", &self.remove.is_some())
            .finish_non_exhaustive()
    }
}

/// Routes events through a named keymap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeymapHandler {
    pub keymap: String,
}

#[derive(Debug)]
pub enum Handler {
    Operator(OperatorHandler),
    Ui(UiHandler),
    Keymap(KeymapHandler),
}

impl Handler {
    #[must_use]
    pub fn keymap(name: impl Into<String>) -> Self {
        Self::Keymap(KeymapHandler {
            keymap: name.into(),
        })
    }

    #[must_use]
    pub fn ui(handle: impl Fn(&mut Context<'_>, &Event) -> UiAction + 'static) -> Self {
        Self::Ui(UiHandler {
            handle: Rc::new(handle),
            remove: None,
            area: None,
            region: None,
        })
    }

    /// Idname of the modal operator this handler runs.
    #[must_use]
    pub fn operator_idname(&self) -> Option<&str> {
        match self {
            Self::Operator(h) => h.op.as_ref().map(Operator::idname),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_modal_operator(&self) -> bool {
        matches!(self, Self::Operator(_))
    }
}
