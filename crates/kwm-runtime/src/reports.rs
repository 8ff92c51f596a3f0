#![forbid(unsafe_code)]

//! Operator report lists.
//!
//! Operators surface errors and messages to the user through a
//! [`ReportList`]. A list is either owned by the operator instance or
//! borrowed from the caller; [`SharedReports`] makes both cases the same
//! handle. When an operator goes modal it takes the [`ReportFlags::FREE`]
//! flag, marking that the instance now owns the list.

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;

/// Severity of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportKind {
    Debug,
    Info,
    Operator,
    Property,
    Warning,
    Error,
    ErrorInvalidInput,
    ErrorInvalidContext,
    ErrorOutOfMemory,
}

impl ReportKind {
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            Self::Error
                | Self::ErrorInvalidInput
                | Self::ErrorInvalidContext
                | Self::ErrorOutOfMemory
        )
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ReportFlags: u8 {
        /// The operator instance owns the list.
        const FREE = 1 << 0;
        /// Reports are also written to the log as they arrive.
        const PRINT = 1 << 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: ReportKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportList {
    pub flag: ReportFlags,
    reports: Vec<Report>,
}

impl ReportList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: ReportKind, message: impl Into<String>) {
        let message = message.into();
        if self.flag.contains(ReportFlags::PRINT) {
            if kind.is_error() {
                tracing::warn!(target: "kwm.operator", ?kind, %message, "report");
            } else {
                tracing::info!(target: "kwm.operator", ?kind, %message, "report");
            }
        }
        self.reports.push(Report { kind, message });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|r| r.kind.is_error())
    }

    /// Move every report of `other` to the end of this list.
    pub fn append(&mut self, other: &mut Self) {
        self.reports.append(&mut other.reports);
    }

    pub fn clear(&mut self) {
        self.reports.clear();
    }
}

/// Report list handle shared between an operator and its caller.
pub type SharedReports = Rc<RefCell<ReportList>>;

#[must_use]
pub fn shared_reports() -> SharedReports {
    Rc::new(RefCell::new(ReportList::new()))
}
