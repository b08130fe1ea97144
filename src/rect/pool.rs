use {
    crate::rect::{Rect, Region},
    xvirt_algorithms::rect::{
        Container, RectRaw,
        region::{intersect, rects_to_bands, subtract, union},
    },
};

/// Free list of regions.
///
/// Released regions are emptied but keep their allocation. The boolean
/// operators compute into a scratch buffer owned by the pool and swap it with
/// the destination, so steady-state region arithmetic does not allocate.
#[derive(Default)]
pub struct RegionPool {
    free: Vec<Region>,
    scratch: Container,
    tmp: Vec<RectRaw>,
}

impl RegionPool {
    pub fn acquire(&mut self) -> Region {
        self.free.pop().unwrap_or_default()
    }

    pub fn acquire_rect(&mut self, rect: Rect) -> Region {
        let mut region = self.acquire();
        region.set_rect(rect);
        region
    }

    pub fn copy(&mut self, region: &Region) -> Region {
        let mut res = self.acquire();
        res.copy_from(region);
        res
    }

    pub fn acquire_rects(&mut self, rects: &[Rect]) -> Region {
        let mut region = self.acquire();
        self.set_rects(&mut region, rects);
        region
    }

    pub fn release(&mut self, mut region: Region) {
        region.clear();
        self.free.push(region);
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Replaces the contents of `dst` with the union of `rects`.
    pub fn set_rects(&mut self, dst: &mut Region, rects: &[Rect]) {
        self.tmp.clear();
        self.tmp.extend(rects.iter().map(|r| r.raw()));
        rects_to_bands(&self.tmp, &mut self.scratch);
        dst.swap_rects(&mut self.scratch);
    }

    /// `dst = dst ∪ other`
    pub fn union(&mut self, dst: &mut Region, other: &Region) {
        if other.is_empty() {
            return;
        }
        if dst.is_empty() {
            dst.copy_from(other);
            return;
        }
        union(dst.raw_rects(), other.raw_rects(), &mut self.scratch);
        dst.swap_rects(&mut self.scratch);
    }

    /// `dst = dst ∩ other`
    pub fn intersect(&mut self, dst: &mut Region, other: &Region) {
        if dst.is_empty() {
            return;
        }
        if other.is_empty() || !dst.extents().intersects(&other.extents()) {
            dst.clear();
            return;
        }
        intersect(dst.raw_rects(), other.raw_rects(), &mut self.scratch);
        dst.swap_rects(&mut self.scratch);
    }

    /// `dst = dst − other`
    pub fn subtract(&mut self, dst: &mut Region, other: &Region) {
        if dst.is_empty() || other.is_empty() || !dst.extents().intersects(&other.extents()) {
            return;
        }
        subtract(dst.raw_rects(), other.raw_rects(), &mut self.scratch);
        dst.swap_rects(&mut self.scratch);
    }

    pub fn union_rect(&mut self, dst: &mut Region, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        if dst.is_empty() {
            dst.set_rect(rect);
            return;
        }
        union(dst.raw_rects(), &[rect.raw()], &mut self.scratch);
        dst.swap_rects(&mut self.scratch);
    }

    pub fn intersect_rect(&mut self, dst: &mut Region, rect: Rect) {
        if dst.is_empty() {
            return;
        }
        if !dst.extents().intersects(&rect) {
            dst.clear();
            return;
        }
        if rect.contains_rect(&dst.extents()) {
            return;
        }
        intersect(dst.raw_rects(), &[rect.raw()], &mut self.scratch);
        dst.swap_rects(&mut self.scratch);
    }

    pub fn subtract_rect(&mut self, dst: &mut Region, rect: Rect) {
        if dst.is_empty() || !dst.extents().intersects(&rect) {
            return;
        }
        subtract(dst.raw_rects(), &[rect.raw()], &mut self.scratch);
        dst.swap_rects(&mut self.scratch);
    }
}
