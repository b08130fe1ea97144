use crate::{
    display::DisplayId,
    event::{EventKind, EventMask, FocusMode},
    tree::{
        AttributeChanges, FrameState, ReparentError, StackMode, Window, WindowAttributes,
        WindowChanges, WindowClass, WindowId, WindowTree, clamp_border, clamp_coord, clamp_size,
        visible::Scope,
    },
};

impl WindowTree {
    #[allow(clippy::too_many_arguments)]
    pub fn create_window(
        &mut self,
        owner: DisplayId,
        parent: WindowId,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        border_width: i32,
        class: WindowClass,
        attributes: &WindowAttributes,
    ) -> Option<WindowId> {
        let Some(parent_idx) = self.idx(parent) else {
            log::debug!("create_window: parent {} does not exist", parent);
            return None;
        };
        if class == WindowClass::InputOutput && self.w(parent_idx).class == WindowClass::InputOnly {
            log::debug!("create_window: InputOnly parent {} cannot have InputOutput children", parent);
            return None;
        }
        let mut window = Window::new(x, y, width, height, border_width, &mut self.pool);
        window.class = class;
        if class == WindowClass::InputOnly {
            window.border_width = 0;
        }
        window.owner = Some(owner);
        window.override_redirect = attributes.override_redirect;
        window.background = attributes.background;
        if !attributes.event_mask.is_empty() {
            window.listeners.push((owner, attributes.event_mask));
        }
        let idx = self.alloc(window);
        self.link_first(parent_idx, idx);
        let id = self.id_of(idx);
        let w = self.w(idx);
        let kind = EventKind::CreateNotify {
            parent,
            window: id,
            rect: w.outer_rect(),
            border_width: w.border_width,
            override_redirect: w.override_redirect,
        };
        self.deliver(parent_idx, EventMask::SUBSTRUCTURE_NOTIFY, &kind);
        let parent_owner = self.w(parent_idx).owner;
        if parent_owner != Some(owner) && self.w(idx).mask_of(owner).contains(EventMask::STRUCTURE_NOTIFY) {
            self.deliver(idx, EventMask::STRUCTURE_NOTIFY, &kind);
        }
        log::trace!("Created window {} in {}", id, parent);
        Some(id)
    }

    /// Destroys the window and all of its descendants. Destroying a window
    /// that does not exist or the root window is a no-op.
    pub fn destroy_window(&mut self, id: WindowId) {
        let Some(idx) = self.idx(id) else {
            log::trace!("destroy_window: {} is already destroyed", id);
            return;
        };
        if idx == self.root {
            return;
        }
        self.unmap_idx(idx);
        let parent = self.w(idx).parent;
        self.destroy_rec(idx);
        if let Some(parent) = parent {
            self.destroy_empty_frame(parent);
        }
    }

    pub fn destroy_subwindows(&mut self, id: WindowId) {
        let Some(idx) = self.idx(id) else {
            return;
        };
        let children: Vec<_> = self.children(idx).map(|c| self.id_of(c)).collect();
        for child in children {
            self.destroy_window(child);
        }
    }

    fn destroy_rec(&mut self, idx: u32) {
        while let Some(child) = self.w(idx).first_child {
            self.destroy_rec(child);
        }
        let id = self.id_of(idx);
        self.deliver_structure(idx, EventKind::DestroyNotify { window: id });
        if self.focus == idx {
            let parent = self.w(idx).parent.unwrap_or(self.root);
            self.focus = parent;
        }
        if let Some(wrapper) = self.w(idx).frame_of {
            if self.slots[wrapper as usize].window.is_some() {
                self.w_mut(wrapper).frame = FrameState::NoFrame;
            }
        }
        if let FrameState::Framed(frame) | FrameState::Pending(frame) = self.w(idx).frame {
            if self.slots[frame as usize].window.is_some() {
                self.w_mut(frame).frame_of = None;
            }
        }
        self.unlink(idx);
        self.recycle(idx);
        log::trace!("Destroyed window {}", id);
    }

    /// Destroys `idx` if it is a decorative frame without children.
    pub(crate) fn destroy_empty_frame(&mut self, idx: u32) {
        if self.slots[idx as usize].window.is_none() {
            return;
        }
        let w = self.w(idx);
        if w.is_frame && w.first_child.is_none() {
            let id = self.id_of(idx);
            log::debug!("Destroying empty frame {}", id);
            self.destroy_window(id);
        }
    }

    pub fn reparent_window(
        &mut self,
        id: WindowId,
        new_parent: WindowId,
        x: i32,
        y: i32,
    ) -> Result<(), ReparentError> {
        let idx = self.idx(id).ok_or(ReparentError::InvalidWindow(id))?;
        let parent_idx = self
            .idx(new_parent)
            .ok_or(ReparentError::InvalidWindow(new_parent))?;
        if idx == self.root {
            return Err(ReparentError::Root);
        }
        if self.is_ancestor_or_self(idx, parent_idx) {
            log::warn!("Rejecting reparent of {} into its descendant {}", id, new_parent);
            return Err(ReparentError::Cycle(id, new_parent));
        }
        if self.w(idx).class == WindowClass::InputOutput
            && self.w(parent_idx).class == WindowClass::InputOnly
        {
            return Err(ReparentError::InputOnlyParent);
        }
        let was_mapped = self.w(idx).mapped;
        if was_mapped {
            self.unmap_idx(idx);
        }
        let old_parent = self.w(idx).parent;
        self.move_into(idx, parent_idx, x, y);
        if let FrameState::Framed(frame) | FrameState::Pending(frame) = self.w(idx).frame {
            if frame != parent_idx {
                self.w_mut(frame).frame_of = None;
                self.w_mut(idx).frame = FrameState::NoFrame;
            }
        }
        if was_mapped {
            self.map_raw(idx);
        }
        if let Some(old_parent) = old_parent {
            if old_parent != parent_idx {
                self.destroy_empty_frame(old_parent);
            }
        }
        Ok(())
    }

    /// Moves `idx` to the top of `parent`'s children without changing its
    /// map state.
    pub(crate) fn move_into(&mut self, idx: u32, parent: u32, x: i32, y: i32) {
        let old_parent = self.w(idx).parent;
        self.unlink(idx);
        self.link_first(parent, idx);
        {
            let w = self.w_mut(idx);
            w.x = clamp_coord(x);
            w.y = clamp_coord(y);
        }
        let id = self.id_of(idx);
        let w = self.w(idx);
        let kind = EventKind::ReparentNotify {
            window: id,
            parent: self.id_of(parent),
            x,
            y,
            override_redirect: w.override_redirect,
        };
        self.deliver(idx, EventMask::STRUCTURE_NOTIFY, &kind);
        if let Some(old_parent) = old_parent {
            self.deliver(old_parent, EventMask::SUBSTRUCTURE_NOTIFY, &kind);
        }
        if old_parent != Some(parent) {
            self.deliver(parent, EventMask::SUBSTRUCTURE_NOTIFY, &kind);
        }
        if let Some(old_parent) = old_parent {
            self.recompute(old_parent, Scope::Subtree);
        }
        self.recompute(idx, Scope::Parent);
    }

    pub fn restack_window(&mut self, id: WindowId, sibling: Option<WindowId>, mode: StackMode) {
        self.configure_window(
            id,
            &WindowChanges {
                sibling,
                stack_mode: Some(mode),
                ..Default::default()
            },
        );
    }

    pub fn raise_window(&mut self, id: WindowId) {
        self.restack_window(id, None, StackMode::Above);
    }

    pub fn lower_window(&mut self, id: WindowId) {
        self.restack_window(id, None, StackMode::Below);
    }

    pub fn configure_window(&mut self, id: WindowId, changes: &WindowChanges) {
        let Some(idx) = self.idx(id) else {
            return;
        };
        if idx == self.root {
            return;
        }
        if let FrameState::Framed(frame) = self.w(idx).frame {
            self.configure_framed(idx, frame, changes);
            return;
        }
        self.configure_idx(idx, changes);
    }

    /// Applies `changes` and returns whether anything changed.
    pub(crate) fn configure_idx(&mut self, idx: u32, changes: &WindowChanges) -> bool {
        let sibling = match changes.sibling {
            Some(s) => match self.idx(s) {
                Some(s) if s != idx && self.w(s).parent == self.w(idx).parent => Some(s),
                _ => {
                    log::debug!("configure_window: {} is not a sibling", s);
                    return false;
                }
            },
            None => None,
        };
        let mut changed = false;
        {
            let w = self.w_mut(idx);
            macro_rules! apply {
                ($field:ident, $map:expr) => {
                    if let Some(v) = changes.$field {
                        let v = $map(v);
                        if w.$field != v {
                            w.$field = v;
                            changed = true;
                        }
                    }
                };
            }
            apply!(x, clamp_coord);
            apply!(y, clamp_coord);
            apply!(width, clamp_size);
            apply!(height, clamp_size);
            if w.class == WindowClass::InputOutput {
                apply!(border_width, clamp_border);
            }
        }
        if let Some(mode) = changes.stack_mode {
            changed |= self.restack_idx(idx, sibling, mode);
        }
        if changed {
            self.send_configure_notify(idx);
            if self.w(idx).mapped {
                self.recompute(idx, Scope::Parent);
            }
        }
        changed
    }

    pub(crate) fn send_configure_notify(&mut self, idx: u32) {
        let id = self.id_of(idx);
        let w = self.w(idx);
        let above_sibling = w.next_sibling.map(|s| self.id_of(s));
        let kind = EventKind::ConfigureNotify {
            window: id,
            rect: w.outer_rect(),
            border_width: w.border_width,
            above_sibling,
            override_redirect: w.override_redirect,
        };
        self.deliver_structure(idx, kind);
    }

    /// Whether `a` is stacked above `b` and overlaps it. Both must be
    /// siblings.
    fn occludes_sibling(&self, a: u32, b: u32) -> bool {
        let wa = self.w(a);
        let wb = self.w(b);
        if !wa.mapped || !wb.mapped || !wa.outer_rect().intersects(&wb.outer_rect()) {
            return false;
        }
        let mut cur = wa.next_sibling;
        while let Some(c) = cur {
            if c == b {
                return true;
            }
            cur = self.w(c).next_sibling;
        }
        false
    }

    fn siblings(&self, idx: u32) -> Vec<u32> {
        match self.w(idx).parent {
            Some(p) => self.children(p).filter(|&c| c != idx).collect(),
            None => vec![],
        }
    }

    /// Changes the position of `idx` in its parent's stacking order and
    /// returns whether the order changed.
    fn restack_idx(&mut self, idx: u32, sibling: Option<u32>, mode: StackMode) -> bool {
        let Some(parent) = self.w(idx).parent else {
            return false;
        };
        enum Target {
            Top,
            Bottom,
            AboveOf(u32),
            BelowOf(u32),
        }
        let occluded_by = |slf: &Self, s: Option<u32>| match s {
            Some(s) => slf.occludes_sibling(s, idx),
            None => slf.siblings(idx).into_iter().any(|s| slf.occludes_sibling(s, idx)),
        };
        let occludes = |slf: &Self, s: Option<u32>| match s {
            Some(s) => slf.occludes_sibling(idx, s),
            None => slf.siblings(idx).into_iter().any(|s| slf.occludes_sibling(idx, s)),
        };
        let target = match (mode, sibling) {
            (StackMode::Above, Some(s)) => Target::AboveOf(s),
            (StackMode::Above, None) => Target::Top,
            (StackMode::Below, Some(s)) => Target::BelowOf(s),
            (StackMode::Below, None) => Target::Bottom,
            (StackMode::TopIf, s) => match occluded_by(self, s) {
                true => Target::Top,
                false => return false,
            },
            (StackMode::BottomIf, s) => match occludes(self, s) {
                true => Target::Bottom,
                false => return false,
            },
            (StackMode::Opposite, s) => {
                if occluded_by(self, s) {
                    Target::Top
                } else if occludes(self, s) {
                    Target::Bottom
                } else {
                    return false;
                }
            }
        };
        let (prev, next) = {
            let w = self.w(idx);
            (w.prev_sibling, w.next_sibling)
        };
        let unchanged = match target {
            Target::Top => prev.is_none(),
            Target::Bottom => next.is_none(),
            Target::AboveOf(s) => next == Some(s),
            Target::BelowOf(s) => prev == Some(s),
        };
        if unchanged {
            return false;
        }
        self.unlink(idx);
        match target {
            Target::Top => self.link_first(parent, idx),
            Target::Bottom => self.link_last(parent, idx),
            Target::AboveOf(s) => self.link_above(s, idx),
            Target::BelowOf(s) => self.link_below(s, idx),
        }
        true
    }

    /// Maps the window. Mapping a mapped window is a no-op.
    pub fn map_window(&mut self, id: WindowId) {
        let Some(idx) = self.idx(id) else {
            return;
        };
        if self.w(idx).mapped {
            log::trace!("map_window: {} is already mapped", id);
            return;
        }
        if self.wants_frame(idx) {
            self.synthesize_frame(idx);
            if self.fullscreen_frames {
                self.set_fullscreen(id, true);
            }
        } else {
            self.map_raw(idx);
            if let Some(parent) = self.w(idx).parent {
                if self.w(parent).frame_of == Some(idx) && !self.w(parent).mapped {
                    self.map_raw(parent);
                }
            }
        }
        self.raise_transients(idx);
    }

    pub(crate) fn map_raw(&mut self, idx: u32) {
        if self.w(idx).mapped {
            return;
        }
        self.w_mut(idx).mapped = true;
        let id = self.id_of(idx);
        let override_redirect = self.w(idx).override_redirect;
        self.deliver_structure(
            idx,
            EventKind::MapNotify {
                window: id,
                override_redirect,
            },
        );
        self.recompute(idx, Scope::Parent);
    }

    pub fn map_subwindows(&mut self, id: WindowId) {
        let Some(idx) = self.idx(id) else {
            return;
        };
        let mut children: Vec<_> = self.children(idx).map(|c| self.id_of(c)).collect();
        children.reverse();
        for child in children {
            self.map_window(child);
        }
    }

    /// Unmaps the window. Unmapping an unmapped window is a no-op.
    pub fn unmap_window(&mut self, id: WindowId) {
        let Some(idx) = self.idx(id) else {
            return;
        };
        if idx == self.root {
            return;
        }
        if !self.w(idx).mapped {
            log::trace!("unmap_window: {} is not mapped", id);
            return;
        }
        self.unmap_idx(idx);
        if let Some(parent) = self.w(idx).parent {
            if self.w(parent).frame_of == Some(idx) {
                self.unmap_idx(parent);
            }
        }
    }

    pub fn unmap_subwindows(&mut self, id: WindowId) {
        let Some(idx) = self.idx(id) else {
            return;
        };
        let children: Vec<_> = self.children(idx).map(|c| self.id_of(c)).collect();
        for child in children {
            self.unmap_window(child);
        }
    }

    pub(crate) fn unmap_idx(&mut self, idx: u32) {
        if !self.w(idx).mapped {
            return;
        }
        let was_viewable = self.viewable(idx);
        self.w_mut(idx).mapped = false;
        let id = self.id_of(idx);
        self.deliver_structure(idx, EventKind::UnmapNotify { window: id });
        self.recompute(idx, Scope::Parent);
        if was_viewable && self.is_ancestor_or_self(idx, self.focus) {
            let mut revert = self.w(idx).parent.unwrap_or(self.root);
            while !self.viewable(revert) {
                revert = self.w(revert).parent.unwrap_or(self.root);
            }
            self.move_focus(revert, FocusMode::Revert);
        }
    }

    pub fn change_window_attributes(
        &mut self,
        display: DisplayId,
        id: WindowId,
        changes: &AttributeChanges,
    ) {
        let Some(idx) = self.idx(id) else {
            return;
        };
        let w = self.w_mut(idx);
        if let Some(bg) = changes.background {
            w.background = bg;
        }
        if let Some(or) = changes.override_redirect {
            w.override_redirect = or;
        }
        if let Some(mask) = changes.event_mask {
            self.select_input(display, id, mask);
        }
    }

    /// Replaces the event selection of `display` on the window.
    pub fn select_input(&mut self, display: DisplayId, id: WindowId, mask: EventMask) {
        let Some(idx) = self.idx(id) else {
            return;
        };
        let w = self.w_mut(idx);
        if mask.is_empty() {
            w.listeners.retain(|(d, _)| *d != display);
            return;
        }
        match w.listeners.iter_mut().find(|(d, _)| *d == display) {
            Some(entry) => entry.1 = mask,
            None => w.listeners.push((display, mask)),
        }
    }

    /// Marks the window as bound to a toplevel widget. Such windows receive
    /// a decorative frame when they are mapped as children of the root.
    pub fn set_wrapper(&mut self, id: WindowId, wrapper: bool) {
        if let Some(idx) = self.idx(id) {
            self.w_mut(idx).wrapper = wrapper;
        }
    }

    pub fn set_transient_for(&mut self, id: WindowId, owner: Option<WindowId>) {
        if let Some(idx) = self.idx(id) {
            self.w_mut(idx).transient_for = owner;
        }
    }

    /// Raises every mapped transient of `idx` directly above it.
    fn raise_transients(&mut self, idx: u32) {
        let Some(top) = self.toplevel_of(idx) else {
            return;
        };
        let owner = match self.w(top).frame_of {
            Some(wrapper) => self.id_of(wrapper),
            None => self.id_of(top),
        };
        let transients: Vec<u32> = self
            .children(self.root)
            .filter(|&t| t != top)
            .filter(|&t| {
                let w = self.w(t);
                let wrapper = match w.frame_of {
                    Some(wrapper) => self.w(wrapper),
                    None => w,
                };
                w.mapped && wrapper.transient_for == Some(owner)
            })
            .collect();
        for transient in transients.into_iter().rev() {
            if self.restack_idx(transient, Some(top), StackMode::Above) {
                self.send_configure_notify(transient);
                self.recompute(transient, Scope::Parent);
            }
        }
    }

    pub fn set_input_focus(&mut self, id: WindowId) {
        let Some(idx) = self.idx(id) else {
            return;
        };
        if !self.viewable(idx) || idx == self.focus {
            return;
        }
        self.move_focus(idx, FocusMode::Normal);
    }

    fn move_focus(&mut self, idx: u32, mode: FocusMode) {
        let old = self.focus;
        self.focus = idx;
        if self.slots[old as usize].window.is_some() {
            self.deliver(old, EventMask::FOCUS_CHANGE, &EventKind::FocusOut { mode });
        }
        self.deliver(idx, EventMask::FOCUS_CHANGE, &EventKind::FocusIn { mode });
    }

    /// Resizes the root window, for example because the platform window
    /// changed size.
    pub fn resize_root(&mut self, width: i32, height: i32) {
        let root = self.root;
        {
            let w = self.w_mut(root);
            w.width = clamp_size(width);
            w.height = clamp_size(height);
        }
        self.send_configure_notify(root);
        self.refullscreen_all();
        self.recompute(root, Scope::Subtree);
    }
}
