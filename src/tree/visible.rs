//! Visible-region computation.
//!
//! All regions are kept in root coordinates.
//!
//! - `visible_in_parent(w)` is the outer rectangle of `w` clipped to the
//!   child clip of its parent, minus the outer rectangles of the mapped
//!   InputOutput siblings stacked above `w`.
//! - The child clip of `w` is `visible_in_parent(w)` clipped to the interior
//!   of `w`.
//! - `visible(w)` is the child clip of `w` minus the outer rectangles of its
//!   mapped InputOutput children.
//!
//! Windows that are not viewable have empty regions. InputOnly windows never
//! obscure anything and their `visible` region is always empty.

use {
    crate::{
        event::{EventKind, EventMask},
        rect::{Rect, Region},
        tree::{WindowClass, WindowId, WindowTree},
    },
    std::mem,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Scope {
    /// Recompute the window's own `visible` region and its descendants. Used
    /// when only the children of the window changed.
    Subtree,
    /// Recompute starting at the parent of the window. Used when the
    /// geometry, stacking or map state of the window changed, which affects
    /// its siblings and its parent.
    Parent,
}

impl WindowTree {
    pub(crate) fn recompute(&mut self, idx: u32, scope: Scope) {
        let start = match scope {
            Scope::Subtree => idx,
            Scope::Parent => self.w(idx).parent.unwrap_or(idx),
        };
        if start == self.root {
            let screen = self.screen_rect();
            let w = self.w_mut(start);
            w.visible_in_parent.set_rect(screen);
        }
        let viewable = self.viewable(start);
        let (ox, oy) = self.interior_origin(start);
        let mut clip = self.pool.acquire();
        if viewable {
            let w = self.w(start);
            let interior = Rect::new_sized(ox, oy, w.width, w.height);
            let vip = mem::take(&mut self.w_mut(start).visible_in_parent);
            self.pool.union(&mut clip, &vip);
            self.w_mut(start).visible_in_parent = vip;
            self.pool.intersect_rect(&mut clip, interior);
        }
        self.update_visible(start, &clip, (ox, oy));
        self.recompute_children(start, &clip, (ox, oy), viewable);
        self.pool.release(clip);
    }

    /// Recomputes the `visible` region of `idx` from its child clip and
    /// queues exposures for pixels that became visible.
    fn update_visible(&mut self, idx: u32, clip: &Region, origin: (i32, i32)) {
        let mut visible = self.pool.acquire();
        if self.w(idx).class == WindowClass::InputOutput {
            self.pool.union(&mut visible, clip);
            let mut cur = self.w(idx).first_child;
            while let Some(c) = cur {
                let child = self.w(c);
                cur = child.next_sibling;
                if child.occludes() {
                    let rect = child.outer_rect().move_(origin.0, origin.1);
                    self.pool.subtract_rect(&mut visible, rect);
                }
            }
        }
        let w = self.w_mut(idx);
        let moved = w.abs_origin != Some(origin);
        w.abs_origin = Some(origin);
        let old = mem::replace(&mut w.visible, visible);
        let mut exposed = self.copy_visible(idx);
        if !moved {
            self.pool.subtract(&mut exposed, &old);
        }
        self.pool.release(old);
        self.expose(idx, exposed, origin);
    }

    fn recompute_children(&mut self, parent: u32, clip: &Region, origin: (i32, i32), viewable: bool) {
        let mut above = self.pool.acquire();
        let mut cur = self.w(parent).first_child;
        while let Some(c) = cur {
            let (next, mapped, occludes, outer, bw, width, height) = {
                let w = self.w(c);
                (
                    w.next_sibling,
                    w.mapped,
                    w.occludes(),
                    w.outer_rect().move_(origin.0, origin.1),
                    w.border_width,
                    w.width,
                    w.height,
                )
            };
            cur = next;
            let child_viewable = viewable && mapped;
            let mut vip = self.pool.acquire();
            if child_viewable {
                self.pool.union(&mut vip, clip);
                self.pool.intersect_rect(&mut vip, outer);
                self.pool.subtract(&mut vip, &above);
            }
            if child_viewable && occludes {
                self.pool.union_rect(&mut above, outer);
            }
            let child_origin = (outer.x1() + bw, outer.y1() + bw);
            let mut child_clip = self.pool.copy(&vip);
            self.pool
                .intersect_rect(&mut child_clip, Rect::new_sized(child_origin.0, child_origin.1, width, height));
            let old = mem::replace(&mut self.w_mut(c).visible_in_parent, vip);
            self.pool.release(old);
            self.update_visible(c, &child_clip, child_origin);
            self.recompute_children(c, &child_clip, child_origin, child_viewable);
            self.pool.release(child_clip);
        }
        self.pool.release(above);
    }

    /// Queues one Expose event per rectangle of `exposed` for the displays
    /// that selected exposures, with `count` counting down to zero, and
    /// hands the region to the server for background painting.
    fn expose(&mut self, idx: u32, exposed: Region, origin: (i32, i32)) {
        if exposed.is_empty() {
            self.pool.release(exposed);
            return;
        }
        let n = exposed.len() as u32;
        for (i, rect) in exposed.iter().enumerate() {
            let kind = EventKind::Expose {
                rect: rect.move_(-origin.0, -origin.1),
                count: n - 1 - i as u32,
            };
            self.deliver(idx, EventMask::EXPOSURE, &kind);
        }
        self.push_exposure(idx, exposed);
    }

    /// Marks the whole visible region of `idx` as exposed, for example after
    /// a frame title changed.
    pub(crate) fn expose_all(&mut self, idx: u32) {
        let origin = self.interior_origin(idx);
        let exposed = self.copy_visible(idx);
        self.expose(idx, exposed, origin);
    }

    pub(crate) fn copy_visible(&mut self, idx: u32) -> Region {
        let Self { slots, pool, .. } = self;
        match &slots[idx as usize].window {
            Some(w) => pool.copy(&w.visible),
            _ => pool.acquire(),
        }
    }

    /// Queues exposures for the part of `rect` (window coordinates) that is
    /// visible.
    pub fn expose_rect(&mut self, id: WindowId, rect: Rect) {
        let Some(idx) = self.idx(id) else {
            return;
        };
        let origin = self.interior_origin(idx);
        let mut exposed = self.copy_visible(idx);
        self.pool
            .intersect_rect(&mut exposed, rect.move_(origin.0, origin.1));
        self.expose(idx, exposed, origin);
    }

    /// The pixels a draw call into the window may touch, in root
    /// coordinates. With `include_inferiors` mapped children do not clip.
    pub(crate) fn drawable_region(&mut self, id: WindowId, include_inferiors: bool) -> Option<Region> {
        let idx = self.idx(id)?;
        if !include_inferiors {
            return Some(self.copy_visible(idx));
        }
        let (ox, oy) = self.interior_origin(idx);
        let w = self.w(idx);
        let interior = Rect::new_sized(ox, oy, w.width, w.height);
        let Self { slots, pool, .. } = self;
        let mut region = match &slots[idx as usize].window {
            Some(w) => pool.copy(&w.visible_in_parent),
            None => pool.acquire(),
        };
        pool.intersect_rect(&mut region, interior);
        Some(region)
    }
}
