#![forbid(unsafe_code)]

//! Cooperative "break" request.
//!
//! Pressing Escape with no Shift/Ctrl/Alt held raises the window manager's
//! break flag. Long-running operators poll it and stop early. The flag is
//! never acted on preemptively; it is only a request.
//!
//! [`BreakFlag`] is a cloneable handle to one shared flag, so the normalizer,
//! the window manager and any worker thread observe the same state.
//!
//! ```
//! use kwm_core::break_flag::BreakFlag;
//!
//! let flag = BreakFlag::new();
//! let worker_view = flag.clone();
//!
//! flag.raise();
//! assert!(worker_view.is_raised());
//! assert!(worker_view.take());
//! assert!(!flag.is_raised());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared, cloneable break request.
#[derive(Debug, Clone, Default)]
pub struct BreakFlag {
    inner: Arc<AtomicBool>,
}

impl BreakFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that running work stops.
    pub fn raise(&self) {
        self.inner.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }

    /// Clear the request.
    pub fn clear(&self) {
        self.inner.store(false, Ordering::Release);
    }

    /// Return the current state and clear it.
    pub fn take(&self) -> bool {
        self.inner.swap(false, Ordering::AcqRel)
    }
}
