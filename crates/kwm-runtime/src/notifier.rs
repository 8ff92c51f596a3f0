#![forbid(unsafe_code)]

//! Deduplicating notifier bus.
//!
//! A notifier is a "something changed" notice packed into one `u32`:
//!
//! ```text
//!   0xFF000000  category   (NC_*)
//!   0x00FF0000  data       (ND_*)
//!   0x0000FF00  subtype    (NS_*)
//!   0x000000FF  action     (NA_*)
//! ```
//!
//! plus an optional opaque [`NotifierRef`] naming the changed object, and
//! the window it was raised from.
//!
//! # Deduplication
//!
//! Two notifiers are duplicates iff their packed value and reference are
//! equal; the window is not part of the key. The same "scene changed" notice
//! may be requested hundreds of times per frame, so [`NotifierBus::add`]
//! rejects duplicates with one hash lookup before anything is queued.
//!
//! # Draining
//!
//! [`NotifierBus::drain`] visits every queued notice exactly once in
//! insertion order and leaves the bus empty (queue and dedup set).
//!
//! ```
//! use kwm_runtime::notifier::{NotifierBus, NC_SCENE, ND_FRAME};
//!
//! let mut bus = NotifierBus::new();
//! assert!(bus.add(NC_SCENE | ND_FRAME, None, None));
//! assert!(!bus.add(NC_SCENE | ND_FRAME, None, None));
//! let mut seen = Vec::new();
//! bus.drain(|n| seen.push(n.value));
//! assert_eq!(seen, vec![NC_SCENE | ND_FRAME]);
//! assert!(bus.is_empty());
//! ```

use ahash::AHashSet;
use kwm_core::input::WindowId;

// ---------------------------------------------------------------------------
// Bit ranges
// ---------------------------------------------------------------------------

pub const NOTE_CATEGORY: u32 = 0xFF00_0000;
/// Category value marking a cleared notifier. Never valid on the bus.
pub const NOTE_CATEGORY_TAG_CLEARED: u32 = NOTE_CATEGORY;
pub const NOTE_DATA: u32 = 0x00FF_0000;
pub const NOTE_SUBTYPE: u32 = 0x0000_FF00;
pub const NOTE_ACTION: u32 = 0x0000_00FF;

// Categories.
pub const NC_WM: u32 = 1 << 24;
pub const NC_WINDOW: u32 = 2 << 24;
pub const NC_WORKSPACE: u32 = 3 << 24;
pub const NC_SCREEN: u32 = 4 << 24;
pub const NC_SCENE: u32 = 5 << 24;
pub const NC_OBJECT: u32 = 6 << 24;
pub const NC_MATERIAL: u32 = 7 << 24;
pub const NC_TEXTURE: u32 = 8 << 24;
pub const NC_LAMP: u32 = 9 << 24;
pub const NC_GROUP: u32 = 10 << 24;
pub const NC_IMAGE: u32 = 11 << 24;
pub const NC_BRUSH: u32 = 12 << 24;
pub const NC_TEXT: u32 = 13 << 24;
pub const NC_WORLD: u32 = 14 << 24;
pub const NC_ANIMATION: u32 = 15 << 24;
pub const NC_SPACE: u32 = 16 << 24;
pub const NC_GEOM: u32 = 17 << 24;
pub const NC_NODE: u32 = 18 << 24;
pub const NC_ID: u32 = 19 << 24;
pub const NC_CAMERA: u32 = 25 << 24;
pub const NC_ASSET: u32 = 27 << 24;

// Data, NC_WM.
pub const ND_FILEREAD: u32 = 1 << 16;
pub const ND_FILESAVE: u32 = 2 << 16;
pub const ND_DATACHANGED: u32 = 3 << 16;
pub const ND_HISTORY: u32 = 4 << 16;
pub const ND_JOB: u32 = 5 << 16;
pub const ND_UNDO: u32 = 6 << 16;

// Data, NC_SCREEN.
pub const ND_LAYOUTBROWSE: u32 = 1 << 16;
pub const ND_LAYOUTDELETE: u32 = 2 << 16;
pub const ND_ANIMPLAY: u32 = 4 << 16;
pub const ND_LAYOUTSET: u32 = 6 << 16;

// Data, NC_SCENE.
pub const ND_SCENEBROWSE: u32 = 1 << 16;
pub const ND_MARKERS: u32 = 2 << 16;
pub const ND_FRAME: u32 = 3 << 16;
pub const ND_RENDER_OPTIONS: u32 = 4 << 16;
pub const ND_OB_ACTIVE: u32 = 7 << 16;
pub const ND_OB_SELECT: u32 = 8 << 16;
pub const ND_OB_VISIBLE: u32 = 9 << 16;
pub const ND_MODE: u32 = 11 << 16;
pub const ND_TOOLSETTINGS: u32 = 15 << 16;
pub const ND_LAYER: u32 = 16 << 16;

// Data, NC_OBJECT.
pub const ND_TRANSFORM: u32 = 18 << 16;
pub const ND_OB_SHADING: u32 = 19 << 16;
pub const ND_DRAW: u32 = 23 << 16;
pub const ND_MODIFIER: u32 = 24 << 16;

// Data, NC_SPACE.
pub const ND_SPACE_CONSOLE: u32 = 1 << 16;
pub const ND_SPACE_INFO_REPORT: u32 = 2 << 16;
pub const ND_SPACE_INFO: u32 = 3 << 16;
pub const ND_SPACE_OUTLINER: u32 = 9 << 16;
pub const ND_SPACE_VIEW3D: u32 = 10 << 16;
pub const ND_SPACE_PROPERTIES: u32 = 11 << 16;
pub const ND_SPACE_CHANGED: u32 = 19 << 16;

// Subtypes.
pub const NS_MODE_OBJECT: u32 = 1 << 8;
pub const NS_EDITMODE_MESH: u32 = 2 << 8;
pub const NS_MODE_POSE: u32 = 9 << 8;
pub const NS_VIEW3D_GPU: u32 = 16 << 8;
pub const NS_VIEW3D_SHADING: u32 = 17 << 8;
pub const NS_LAYER_COLLECTION: u32 = 24 << 8;

// Actions.
pub const NA_EDITED: u32 = 1;
pub const NA_EVALUATED: u32 = 2;
pub const NA_ADDED: u32 = 3;
pub const NA_REMOVED: u32 = 4;
pub const NA_RENAME: u32 = 5;
pub const NA_SELECTED: u32 = 6;
pub const NA_ACTIVATED: u32 = 7;
pub const NA_PAINTING: u32 = 8;
pub const NA_JOB_FINISHED: u32 = 9;

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Opaque identity of the object a notifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotifierRef(pub u64);

/// One queued change notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notifier {
    /// Window the notice was raised from; `None` for global notices.
    pub window: Option<WindowId>,
    /// Packed `category | data | subtype | action`.
    pub value: u32,
    pub reference: Option<NotifierRef>,
}

impl Notifier {
    #[must_use]
    pub const fn category(&self) -> u32 {
        self.value & NOTE_CATEGORY
    }

    #[must_use]
    pub const fn data(&self) -> u32 {
        self.value & NOTE_DATA
    }

    #[must_use]
    pub const fn subtype(&self) -> u32 {
        self.value & NOTE_SUBTYPE
    }

    #[must_use]
    pub const fn action(&self) -> u32 {
        self.value & NOTE_ACTION
    }
}

/// Whether `value` may be queued: non-zero and not tagged as cleared.
#[must_use]
pub const fn is_valid_notifier(value: u32) -> bool {
    value != 0 && (value & NOTE_CATEGORY) != NOTE_CATEGORY_TAG_CLEARED
}

// ---------------------------------------------------------------------------
// Listener filter
// ---------------------------------------------------------------------------

/// Category/data mask an area or region listens to.
///
/// A filter with only a category matches every notice of that category;
/// adding data narrows it to that data value. A zero category matches all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotifierFilter {
    category: u32,
    data: Option<u32>,
}

impl NotifierFilter {
    /// Match every notifier.
    pub const ANY: Self = Self {
        category: 0,
        data: None,
    };

    #[must_use]
    pub const fn category(category: u32) -> Self {
        Self {
            category: category & NOTE_CATEGORY,
            data: None,
        }
    }

    #[must_use]
    pub const fn with_data(mut self, data: u32) -> Self {
        self.data = Some(data & NOTE_DATA);
        self
    }

    #[must_use]
    pub const fn matches(&self, notifier: &Notifier) -> bool {
        if self.category != 0 && notifier.category() != self.category {
            return false;
        }
        match self.data {
            Some(data) => notifier.data() == data,
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

/// Insertion-ordered queue of notifiers with O(1) duplicate rejection.
#[derive(Debug, Clone, Default)]
pub struct NotifierBus {
    queue: Vec<Notifier>,
    seen: AHashSet<(u32, Option<NotifierRef>)>,
}

impl NotifierBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued notices in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Notifier> {
        self.queue.iter()
    }

    #[must_use]
    pub fn contains(&self, value: u32, reference: Option<NotifierRef>) -> bool {
        self.seen.contains(&(value, reference))
    }

    /// Queue a notice unless an equal `(value, reference)` is already queued.
    ///
    /// Returns `true` if the notice was queued. Zero and cleared values are
    /// programmer errors.
    pub fn add(
        &mut self,
        value: u32,
        reference: Option<NotifierRef>,
        window: Option<WindowId>,
    ) -> bool {
        debug_assert!(
            is_valid_notifier(value),
            "invalid notifier value {value:#010x}"
        );
        if !is_valid_notifier(value) {
            tracing::error!(target: "kwm.notifier", value = %format_args!("{value:#010x}"), "invalid notifier dropped");
            return false;
        }
        if !self.seen.insert((value, reference)) {
            return false;
        }
        self.queue.push(Notifier {
            window,
            value,
            reference,
        });
        tracing::trace!(
            target: "kwm.notifier",
            value = %format_args!("{value:#010x}"),
            queued = self.queue.len(),
            "notifier added"
        );
        true
    }

    /// Remove and return every queued notice, leaving the bus empty.
    pub fn take(&mut self) -> Vec<Notifier> {
        self.seen.clear();
        std::mem::take(&mut self.queue)
    }

    /// Visit every queued notice once, in insertion order, then clear.
    ///
    /// Returns the number of notices visited. Notices added by `visit`
    /// itself are not visited in this pass.
    pub fn drain(&mut self, mut visit: impl FnMut(&Notifier)) -> usize {
        let notices = self.take();
        for n in &notices {
            visit(n);
        }
        notices.len()
    }
}
