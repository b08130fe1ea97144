use {
    crate::rect::Rect,
    std::{
        fmt::{Debug, Formatter},
        mem,
        ops::Deref,
    },
    xvirt_algorithms::rect::{
        Container, RectRaw,
        region::{contains, contains_rect, extents},
    },
};

/// A canonical set of non-overlapping rectangles sorted in row-major band
/// order.
///
/// Regions are checked out of a [`RegionPool`](super::RegionPool) and handed
/// back to it when they are no longer needed. They are never shared: copies
/// are made explicitly through the pool.
#[derive(Default)]
pub struct Region {
    pub(super) rects: Container,
    pub(super) extents: Rect,
}

impl Debug for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.deref()).finish()
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.rects == other.rects
    }
}

impl Eq for Region {}

impl Region {
    /// Creates a region outside of any pool.
    pub fn new(rect: Rect) -> Self {
        let mut res = Self::default();
        res.set_rect(rect);
        res
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn extents(&self) -> Rect {
        self.extents
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        if !self.extents.contains(x, y) {
            return false;
        }
        contains(&self.rects, x, y)
    }

    pub fn contains_rect(&self, rect: &Rect) -> bool {
        if rect.is_empty() {
            return true;
        }
        if !self.extents.contains_rect(rect) {
            return false;
        }
        contains_rect(&self.rects, &rect.raw())
    }

    /// Replaces the contents with a single rectangle.
    pub fn set_rect(&mut self, rect: Rect) {
        self.rects.clear();
        if !rect.is_empty() {
            self.rects.push(rect.raw());
            self.extents = rect;
        } else {
            self.extents = Rect::default();
        }
    }

    pub fn clear(&mut self) {
        self.rects.clear();
        self.extents = Rect::default();
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        for rect in &mut self.rects {
            rect.x1 += dx;
            rect.y1 += dy;
            rect.x2 += dx;
            rect.y2 += dy;
        }
        self.extents = self.extents.move_(dx, dy);
    }

    pub(super) fn copy_from(&mut self, other: &Region) {
        self.rects.clear();
        self.rects.extend_from_slice(&other.rects);
        self.extents = other.extents;
    }

    pub(super) fn update_extents(&mut self) {
        self.extents = Rect {
            raw: extents(&self.rects),
        };
    }

    pub(super) fn raw_rects(&self) -> &[RectRaw] {
        &self.rects
    }

    pub(super) fn swap_rects(&mut self, other: &mut Container) {
        mem::swap(&mut self.rects, other);
        self.update_extents();
    }
}

impl Deref for Region {
    type Target = [Rect];

    fn deref(&self) -> &Self::Target {
        // SAFETY: Rect is repr(transparent) over RectRaw.
        unsafe { mem::transmute::<&[RectRaw], &[Rect]>(&self.rects) }
    }
}
