#![forbid(unsafe_code)]

//! Screen layout: areas split into regions, each with its own handlers.
//!
//! The window manager only needs enough layout to route events: rectangles
//! for hit testing, a region kind for call-context lookups and cursor
//! wrapping, handler lists, and the notifier filters each area or region
//! listens to.

use kwm_core::event::{Point, Rect};

use crate::handler::Handler;
use crate::notifier::{Notifier, NotifierFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u32);

/// What a region is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// The main editing region of an area.
    Window,
    Header,
    ToolHeader,
    Footer,
    Channels,
    Preview,
    Tools,
    Ui,
    Temporary,
}

impl RegionKind {
    /// Bars along an area edge, where cursor wrapping is horizontal only.
    #[must_use]
    pub const fn is_header(self) -> bool {
        matches!(self, Self::Header | Self::ToolHeader | Self::Footer)
    }
}

#[derive(Debug)]
pub struct Region {
    id: RegionId,
    pub kind: RegionKind,
    pub rect: Rect,
    pub(crate) handlers: Vec<Handler>,
    pub listens: Vec<NotifierFilter>,
    pub needs_redraw: bool,
}

impl Region {
    #[must_use]
    pub fn id(&self) -> RegionId {
        self.id
    }

    #[must_use]
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    pub fn add_handler(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    #[must_use]
    pub fn listens_to(&self, notifier: &Notifier) -> bool {
        self.listens.iter().any(|f| f.matches(notifier))
    }
}

#[derive(Debug)]
pub struct Area {
    id: AreaId,
    pub rect: Rect,
    regions: Vec<Region>,
    pub(crate) handlers: Vec<Handler>,
    pub listens: Vec<NotifierFilter>,
    pub needs_redraw: bool,
}

impl Area {
    #[must_use]
    pub fn id(&self) -> AreaId {
        self.id
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn regions_mut(&mut self) -> impl Iterator<Item = &mut Region> {
        self.regions.iter_mut()
    }

    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    /// First region of `kind`.
    #[must_use]
    pub fn region_of_kind(&self, kind: RegionKind) -> Option<&Region> {
        self.regions.iter().find(|r| r.kind == kind)
    }

    /// Topmost region containing `p`; later regions overlap earlier ones.
    #[must_use]
    pub fn region_at(&self, p: Point) -> Option<&Region> {
        self.regions.iter().rev().find(|r| r.rect.contains(p))
    }

    #[must_use]
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    pub fn add_handler(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    #[must_use]
    pub fn listens_to(&self, notifier: &Notifier) -> bool {
        self.listens.iter().any(|f| f.matches(notifier))
    }
}

/// A window's layout.
#[derive(Debug, Default)]
pub struct Screen {
    areas: Vec<Area>,
    next_id: u32,
}

impl Screen {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_area(&mut self, rect: Rect) -> AreaId {
        let id = AreaId(self.bump());
        self.areas.push(Area {
            id,
            rect,
            regions: Vec::new(),
            handlers: Vec::new(),
            listens: Vec::new(),
            needs_redraw: false,
        });
        id
    }

    /// Add a region to `area`; `None` when the area does not exist.
    pub fn add_region(&mut self, area: AreaId, kind: RegionKind, rect: Rect) -> Option<RegionId> {
        let id = RegionId(self.next_id);
        let target = self.areas.iter_mut().find(|a| a.id == area)?;
        target.regions.push(Region {
            id,
            kind,
            rect,
            handlers: Vec::new(),
            listens: Vec::new(),
            needs_redraw: false,
        });
        self.next_id += 1;
        Some(id)
    }

    fn bump(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[must_use]
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn areas_mut(&mut self) -> impl Iterator<Item = &mut Area> {
        self.areas.iter_mut()
    }

    #[must_use]
    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.iter().find(|a| a.id == id)
    }

    pub fn area_mut(&mut self, id: AreaId) -> Option<&mut Area> {
        self.areas.iter_mut().find(|a| a.id == id)
    }

    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.areas.iter().find_map(|a| a.region(id))
    }

    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.areas.iter_mut().find_map(|a| a.region_mut(id))
    }

    /// Area owning region `id`.
    #[must_use]
    pub fn area_of_region(&self, id: RegionId) -> Option<AreaId> {
        self.areas
            .iter()
            .find(|a| a.region(id).is_some())
            .map(|a| a.id)
    }

    #[must_use]
    pub fn area_at(&self, p: Point) -> Option<&Area> {
        self.areas.iter().find(|a| a.rect.contains(p))
    }

    /// Area and region under `p`.
    #[must_use]
    pub fn hit_test(&self, p: Point) -> (Option<AreaId>, Option<RegionId>) {
        match self.area_at(p) {
            Some(area) => (Some(area.id), area.region_at(p).map(Region::id)),
            None => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::{NC_SCENE, ND_FRAME, NC_OBJECT};

    fn layout() -> (Screen, AreaId, RegionId, RegionId) {
        let mut screen = Screen::new();
        let area = screen.add_area(Rect::new(0, 0, 399, 299));
        let header = screen
            .add_region(area, RegionKind::Header, Rect::new(0, 280, 399, 299))
            .unwrap_or(RegionId(u32::MAX));
        let main = screen
            .add_region(area, RegionKind::Window, Rect::new(0, 0, 399, 279))
            .unwrap_or(RegionId(u32::MAX));
        (screen, area, header, main)
    }

    #[test]
    fn hit_test_finds_area_and_region() {
        let (screen, area, header, main) = layout();
        assert_eq!(screen.hit_test(Point::new(10, 290)), (Some(area), Some(header)));
        assert_eq!(screen.hit_test(Point::new(10, 10)), (Some(area), Some(main)));
        assert_eq!(screen.hit_test(Point::new(500, 10)), (None, None));
    }

    #[test]
    fn lookups() {
        let (screen, area, header, _) = layout();
        assert_eq!(screen.area_of_region(header), Some(area));
        assert_eq!(
            screen.area(area).and_then(|a| a.region_of_kind(RegionKind::Window)).map(|r| r.kind),
            Some(RegionKind::Window)
        );
        assert!(screen.region(header).is_some_and(|r| r.kind.is_header()));
    }

    #[test]
    fn region_for_missing_area() {
        let mut screen = Screen::new();
        assert_eq!(screen.add_region(AreaId(7), RegionKind::Window, Rect::default()), None);
    }

    #[test]
    fn listen_filters() {
        let (mut screen, area, _, _) = layout();
        if let Some(a) = screen.area_mut(area) {
            a.listens.push(NotifierFilter::category(NC_SCENE).with_data(ND_FRAME));
        }
        let a = screen.area(area);
        let frame = Notifier { window: None, value: NC_SCENE | ND_FRAME, reference: None };
        let object = Notifier { window: None, value: NC_OBJECT, reference: None };
        assert!(a.is_some_and(|a| a.listens_to(&frame)));
        assert!(!a.is_some_and(|a| a.listens_to(&object)));
    }
}
