//! The window tree.
//!
//! Windows live in an arena of slots indexed by [`WindowId`]. Parent, child
//! and sibling relations are plain indices. The sibling list is ordered front
//! to back: the first child of a window is the topmost one.
//!
//! Every operation in this module runs under the server's global lock. The
//! events generated by an operation are collected in an outbox and handed to
//! the displays by the server before the lock is released.

mod atoms;
mod frame;
mod fullscreen;
mod ops;
mod props;
#[cfg(test)]
mod tests;
mod visible;

pub use {
    atoms::{Atom, AtomTable},
    frame::FrameHit,
    props::{Property, PropertyError, PropertyMode},
};
use {
    crate::{
        config::ServerConfig,
        display::DisplayId,
        event::{EventKind, EventMask},
        rect::{Rect, Region, RegionPool},
    },
    ahash::AHashMap,
    bstr::BString,
    frame::FrameState,
    smallvec::SmallVec,
    std::fmt::{Debug, Display, Formatter},
    thiserror::Error,
};

/// Handle of a window.
///
/// The generation distinguishes a window from later windows that reuse the
/// same slot, so a stale handle never refers to a recycled record.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct WindowId {
    index: u32,
    generation: u32,
}

impl Debug for WindowId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "WindowId({}:{})", self.index, self.generation)
    }
}

impl Display for WindowId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", ((self.generation as u64) << 32) | self.index as u64)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum WindowClass {
    #[default]
    InputOutput,
    InputOnly,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MapState {
    Unmapped,
    /// Mapped, but an ancestor is unmapped.
    Unviewable,
    Viewable,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Background {
    #[default]
    None,
    Pixel(u32),
    /// Use the background of the parent.
    ParentRelative,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StackMode {
    Above,
    Below,
    TopIf,
    BottomIf,
    Opposite,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct WindowAttributes {
    pub background: Background,
    pub override_redirect: bool,
    /// Event selection of the creating display.
    pub event_mask: EventMask,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct AttributeChanges {
    pub background: Option<Background>,
    pub override_redirect: Option<bool>,
    pub event_mask: Option<EventMask>,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct WindowChanges {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub border_width: Option<i32>,
    pub sibling: Option<WindowId>,
    pub stack_mode: Option<StackMode>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub border_width: i32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WindowInfo {
    pub class: WindowClass,
    pub map_state: MapState,
    pub override_redirect: bool,
    pub background: Background,
    pub owner: Option<DisplayId>,
    pub your_event_mask: EventMask,
    pub all_event_masks: EventMask,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeInfo {
    pub root: WindowId,
    pub parent: Option<WindowId>,
    /// Children in bottom-to-top stacking order.
    pub children: Vec<WindowId>,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ReparentError {
    #[error("Window {0} does not exist")]
    InvalidWindow(WindowId),
    #[error("The root window cannot be reparented")]
    Root,
    #[error("Reparenting {0} into {1} would create a cycle")]
    Cycle(WindowId, WindowId),
    #[error("An InputOnly window cannot be the parent of an InputOutput window")]
    InputOnlyParent,
}

/// An event produced by a tree operation, addressed to one display.
#[derive(Debug)]
pub struct Notification {
    pub display: DisplayId,
    pub window: WindowId,
    pub send_event: bool,
    pub kind: EventKind,
}

/// Newly exposed pixels of a window in root coordinates.
#[derive(Debug)]
pub struct Exposure {
    pub window: WindowId,
    pub region: Region,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct SavedGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub border_width: i32,
}

pub(crate) struct Window {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub border_width: i32,
    pub class: WindowClass,
    pub mapped: bool,
    pub override_redirect: bool,
    pub background: Background,
    pub owner: Option<DisplayId>,
    pub listeners: SmallVec<[(DisplayId, EventMask); 1]>,

    pub parent: Option<u32>,
    pub first_child: Option<u32>,
    /// The sibling directly below.
    pub next_sibling: Option<u32>,
    /// The sibling directly above.
    pub prev_sibling: Option<u32>,

    pub visible_in_parent: Region,
    pub visible: Region,
    /// Root coordinates of the interior origin at the last recompute.
    pub abs_origin: Option<(i32, i32)>,

    /// Bound to a toplevel widget and eligible for a decorative frame.
    pub wrapper: bool,
    pub frame: FrameState,
    /// Server-owned decoration window.
    pub is_frame: bool,
    /// Set on frame windows: the wrapper they decorate.
    pub frame_of: Option<u32>,
    pub fullscreen: bool,
    pub saved_geometry: Option<SavedGeometry>,
    pub transient_for: Option<WindowId>,
    pub properties: AHashMap<Atom, props::Property>,
    pub title: BString,
}

impl Window {
    fn new(x: i32, y: i32, width: i32, height: i32, border_width: i32, pool: &mut RegionPool) -> Self {
        Self {
            x: clamp_coord(x),
            y: clamp_coord(y),
            width: clamp_size(width),
            height: clamp_size(height),
            border_width: clamp_border(border_width),
            class: WindowClass::InputOutput,
            mapped: false,
            override_redirect: false,
            background: Background::None,
            owner: None,
            listeners: Default::default(),
            parent: None,
            first_child: None,
            next_sibling: None,
            prev_sibling: None,
            visible_in_parent: pool.acquire(),
            visible: pool.acquire(),
            abs_origin: None,
            wrapper: false,
            frame: FrameState::NoFrame,
            is_frame: false,
            frame_of: None,
            fullscreen: false,
            saved_geometry: None,
            transient_for: None,
            properties: Default::default(),
            title: Default::default(),
        }
    }

    /// The rectangle including the border, in parent interior coordinates.
    pub fn outer_rect(&self) -> Rect {
        let bw = self.border_width;
        Rect::new_sized(self.x, self.y, self.width + 2 * bw, self.height + 2 * bw)
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            border_width: self.border_width,
        }
    }

    pub fn mask_of(&self, display: DisplayId) -> EventMask {
        self.listeners
            .iter()
            .find(|(d, _)| *d == display)
            .map(|(_, m)| *m)
            .unwrap_or_default()
    }

    pub fn all_masks(&self) -> EventMask {
        let mut res = EventMask::NONE;
        for (_, mask) in &self.listeners {
            res |= *mask;
        }
        res
    }

    fn occludes(&self) -> bool {
        self.mapped && self.class == WindowClass::InputOutput
    }
}

struct Slot {
    generation: u32,
    window: Option<Window>,
}

pub struct WindowTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: u32,
    pub(crate) pool: RegionPool,
    pub(crate) atoms: AtomTable,
    focus: u32,
    pub(crate) frame_width: i32,
    pub(crate) title_height: i32,
    pub(crate) frames_enabled: bool,
    fullscreen_frames: bool,
    time: u32,
    outbox: Vec<Notification>,
    exposures: Vec<Exposure>,
}

const ROOT: u32 = 0;

/// Largest width, height or border width a window can have.
pub const MAX_SIZE: i32 = i16::MAX as i32;

pub(crate) fn clamp_size(v: i32) -> i32 {
    v.clamp(1, MAX_SIZE)
}

pub(crate) fn clamp_border(v: i32) -> i32 {
    v.clamp(0, MAX_SIZE)
}

pub(crate) fn clamp_coord(v: i32) -> i32 {
    v.clamp(i16::MIN as i32, i16::MAX as i32)
}

impl WindowTree {
    pub fn new(config: &ServerConfig) -> Self {
        let mut pool = RegionPool::default();
        let mut root = Window::new(0, 0, config.width, config.height, 0, &mut pool);
        root.mapped = true;
        root.background = Background::Pixel(config.root_background);
        let mut slf = Self {
            slots: vec![Slot {
                generation: 0,
                window: Some(root),
            }],
            free: vec![],
            root: ROOT,
            pool,
            atoms: AtomTable::default(),
            focus: ROOT,
            frame_width: config.frame_width(),
            title_height: config.title_height(),
            frames_enabled: config.frames,
            fullscreen_frames: config.fullscreen,
            time: 0,
            outbox: vec![],
            exposures: vec![],
        };
        slf.recompute(ROOT, visible::Scope::Subtree);
        slf
    }

    pub fn root(&self) -> WindowId {
        self.id_of(self.root)
    }

    pub fn screen_rect(&self) -> Rect {
        self.w(self.root).outer_rect()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.idx(id).is_some()
    }

    pub fn focus(&self) -> WindowId {
        self.id_of(self.focus)
    }

    /// Sets the server timestamp in milliseconds.
    pub fn set_time(&mut self, time: u32) {
        self.time = time;
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    pub fn take_exposures(&mut self) -> Vec<Exposure> {
        std::mem::take(&mut self.exposures)
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn id_of(&self, idx: u32) -> WindowId {
        WindowId {
            index: idx,
            generation: self.slots[idx as usize].generation,
        }
    }

    fn idx(&self, id: WindowId) -> Option<u32> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation || slot.window.is_none() {
            return None;
        }
        Some(id.index)
    }

    pub(crate) fn window(&self, id: WindowId) -> Option<&Window> {
        self.idx(id).map(|idx| self.w(idx))
    }

    fn w(&self, idx: u32) -> &Window {
        match &self.slots[idx as usize].window {
            Some(w) => w,
            _ => unreachable!("window slot {} is empty", idx),
        }
    }

    fn w_mut(&mut self, idx: u32) -> &mut Window {
        match &mut self.slots[idx as usize].window {
            Some(w) => w,
            _ => unreachable!("window slot {} is empty", idx),
        }
    }

    fn alloc(&mut self, window: Window) -> u32 {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx as usize].window = Some(window);
                idx
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    window: Some(window),
                });
                (self.slots.len() - 1) as u32
            }
        }
    }

    fn recycle(&mut self, idx: u32) {
        let slot = &mut self.slots[idx as usize];
        if let Some(w) = slot.window.take() {
            slot.generation = slot.generation.wrapping_add(1);
            self.pool.release(w.visible_in_parent);
            self.pool.release(w.visible);
        }
        self.free.push(idx);
    }

    // Links

    fn children(&self, idx: u32) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            next: self.w(idx).first_child,
        }
    }

    fn last_child(&self, idx: u32) -> Option<u32> {
        self.children(idx).last()
    }

    fn unlink(&mut self, idx: u32) {
        let (parent, prev, next) = {
            let w = self.w(idx);
            (w.parent, w.prev_sibling, w.next_sibling)
        };
        match prev {
            Some(prev) => self.w_mut(prev).next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self.w_mut(parent).first_child = next;
                }
            }
        }
        if let Some(next) = next {
            self.w_mut(next).prev_sibling = prev;
        }
        let w = self.w_mut(idx);
        w.parent = None;
        w.prev_sibling = None;
        w.next_sibling = None;
    }

    fn link_first(&mut self, parent: u32, idx: u32) {
        let old_first = self.w(parent).first_child;
        {
            let w = self.w_mut(idx);
            w.parent = Some(parent);
            w.prev_sibling = None;
            w.next_sibling = old_first;
        }
        if let Some(first) = old_first {
            self.w_mut(first).prev_sibling = Some(idx);
        }
        self.w_mut(parent).first_child = Some(idx);
    }

    fn link_last(&mut self, parent: u32, idx: u32) {
        match self.last_child(parent) {
            Some(last) => self.link_below(last, idx),
            None => self.link_first(parent, idx),
        }
    }

    /// Links `idx` directly above `sibling`.
    fn link_above(&mut self, sibling: u32, idx: u32) {
        let (parent, prev) = {
            let s = self.w(sibling);
            (s.parent, s.prev_sibling)
        };
        {
            let w = self.w_mut(idx);
            w.parent = parent;
            w.prev_sibling = prev;
            w.next_sibling = Some(sibling);
        }
        self.w_mut(sibling).prev_sibling = Some(idx);
        match prev {
            Some(prev) => self.w_mut(prev).next_sibling = Some(idx),
            None => {
                if let Some(parent) = parent {
                    self.w_mut(parent).first_child = Some(idx);
                }
            }
        }
    }

    /// Links `idx` directly below `sibling`.
    fn link_below(&mut self, sibling: u32, idx: u32) {
        let (parent, next) = {
            let s = self.w(sibling);
            (s.parent, s.next_sibling)
        };
        {
            let w = self.w_mut(idx);
            w.parent = parent;
            w.prev_sibling = Some(sibling);
            w.next_sibling = next;
        }
        self.w_mut(sibling).next_sibling = Some(idx);
        if let Some(next) = next {
            self.w_mut(next).prev_sibling = Some(idx);
        }
    }

    fn is_ancestor_or_self(&self, ancestor: u32, mut idx: u32) -> bool {
        loop {
            if idx == ancestor {
                return true;
            }
            match self.w(idx).parent {
                Some(p) => idx = p,
                None => return false,
            }
        }
    }

    fn viewable(&self, mut idx: u32) -> bool {
        loop {
            let w = self.w(idx);
            if !w.mapped {
                return false;
            }
            match w.parent {
                Some(p) => idx = p,
                None => return true,
            }
        }
    }

    /// Root coordinates of the interior origin of `idx`.
    fn interior_origin(&self, idx: u32) -> (i32, i32) {
        let mut x = 0;
        let mut y = 0;
        let mut cur = Some(idx);
        while let Some(c) = cur {
            let w = self.w(c);
            x += w.x + w.border_width;
            y += w.y + w.border_width;
            cur = w.parent;
        }
        (x, y)
    }

    /// The window of `idx` that is a direct child of the root, if any.
    fn toplevel_of(&self, mut idx: u32) -> Option<u32> {
        loop {
            let parent = self.w(idx).parent?;
            if parent == self.root {
                return Some(idx);
            }
            idx = parent;
        }
    }

    // Delivery

    /// Queues `kind` for every display that selected any of `mask` on
    /// `event_window`.
    fn deliver(&mut self, event_window: u32, mask: EventMask, kind: &EventKind) {
        let window = self.id_of(event_window);
        let w = match &self.slots[event_window as usize].window {
            Some(w) => w,
            _ => return,
        };
        for &(display, selected) in &w.listeners {
            if selected.intersects(mask) {
                self.outbox.push(Notification {
                    display,
                    window,
                    send_event: false,
                    kind: kind.clone(),
                });
            }
        }
    }

    /// Structure events go to the window itself (StructureNotify) and to its
    /// parent (SubstructureNotify).
    fn deliver_structure(&mut self, idx: u32, kind: EventKind) {
        self.deliver(idx, EventMask::STRUCTURE_NOTIFY, &kind);
        if let Some(parent) = self.w(idx).parent {
            self.deliver(parent, EventMask::SUBSTRUCTURE_NOTIFY, &kind);
        }
    }

    /// The displays that selected any of `mask` on the window.
    pub(crate) fn selecting(&self, id: WindowId, mask: EventMask) -> SmallVec<[DisplayId; 1]> {
        match self.window(id) {
            Some(w) => w
                .listeners
                .iter()
                .filter(|(_, m)| m.intersects(mask))
                .map(|(d, _)| *d)
                .collect(),
            None => SmallVec::new(),
        }
    }

    /// Queues an event for a specific display regardless of its selection.
    pub(crate) fn push_notification(&mut self, notification: Notification) {
        self.outbox.push(notification);
    }

    pub(crate) fn push_exposure(&mut self, idx: u32, region: Region) {
        if region.is_empty() {
            self.pool.release(region);
            return;
        }
        let window = self.id_of(idx);
        self.exposures.push(Exposure { window, region });
    }

    // Queries

    pub fn query_tree(&self, id: WindowId) -> Option<TreeInfo> {
        let idx = self.idx(id)?;
        let mut children: Vec<_> = self.children(idx).map(|c| self.id_of(c)).collect();
        children.reverse();
        Some(TreeInfo {
            root: self.root(),
            parent: self.w(idx).parent.map(|p| self.id_of(p)),
            children,
        })
    }

    pub fn parent(&self, id: WindowId) -> Option<WindowId> {
        let idx = self.idx(id)?;
        self.w(idx).parent.map(|p| self.id_of(p))
    }

    pub fn get_geometry(&self, id: WindowId) -> Option<Geometry> {
        self.window(id).map(|w| w.geometry())
    }

    pub fn get_window_attributes(&self, id: WindowId, display: DisplayId) -> Option<WindowInfo> {
        let idx = self.idx(id)?;
        let w = self.w(idx);
        let map_state = match (w.mapped, self.viewable(idx)) {
            (false, _) => MapState::Unmapped,
            (true, false) => MapState::Unviewable,
            (true, true) => MapState::Viewable,
        };
        Some(WindowInfo {
            class: w.class,
            map_state,
            override_redirect: w.override_redirect,
            background: w.background,
            owner: w.owner,
            your_event_mask: w.mask_of(display),
            all_event_masks: w.all_masks(),
        })
    }

    pub fn is_viewable(&self, id: WindowId) -> bool {
        self.idx(id).is_some_and(|idx| self.viewable(idx))
    }

    pub fn is_mapped(&self, id: WindowId) -> bool {
        self.window(id).is_some_and(|w| w.mapped)
    }

    /// The region of the window that may currently be drawn to, in root
    /// coordinates.
    pub fn visible_region(&self, id: WindowId) -> Option<&Region> {
        self.window(id).map(|w| &w.visible)
    }

    /// The area of the window, including its border and its children, that
    /// is not obscured by ancestors or siblings, in root coordinates.
    pub fn visible_in_parent(&self, id: WindowId) -> Option<&Region> {
        self.window(id).map(|w| &w.visible_in_parent)
    }

    /// Root coordinates of the window's interior origin.
    pub fn origin(&self, id: WindowId) -> Option<(i32, i32)> {
        self.idx(id).map(|idx| self.interior_origin(idx))
    }

    /// Translates `(x, y)` from the coordinate space of `src` to that of
    /// `dst` and returns the child of `dst` containing the point.
    pub fn translate_coordinates(
        &self,
        src: WindowId,
        dst: WindowId,
        x: i32,
        y: i32,
    ) -> Option<(i32, i32, Option<WindowId>)> {
        let src = self.idx(src)?;
        let dst = self.idx(dst)?;
        let (sx, sy) = self.interior_origin(src);
        let (dx, dy) = self.interior_origin(dst);
        let (x, y) = (x + sx - dx, y + sy - dy);
        let child = self
            .children(dst)
            .find(|&c| {
                let w = self.w(c);
                w.mapped && w.outer_rect().contains(x, y)
            })
            .map(|c| self.id_of(c));
        Some((x, y, child))
    }

    /// The deepest viewable window containing the root coordinates.
    pub fn window_at(&self, x: i32, y: i32) -> WindowId {
        let mut cur = self.root;
        let (mut ox, mut oy) = (0, 0);
        'outer: loop {
            for child in self.children(cur) {
                let w = self.w(child);
                if w.mapped && w.outer_rect().contains(x - ox, y - oy) {
                    ox += w.x + w.border_width;
                    oy += w.y + w.border_width;
                    cur = child;
                    continue 'outer;
                }
            }
            return self.id_of(cur);
        }
    }

    /// The chain of ancestors of `id`, starting with `id` itself.
    pub fn ancestors(&self, id: WindowId) -> Vec<WindowId> {
        let mut res = vec![];
        let mut cur = self.idx(id);
        while let Some(idx) = cur {
            res.push(self.id_of(idx));
            cur = self.w(idx).parent;
        }
        res
    }

    pub fn is_ancestor(&self, ancestor: WindowId, id: WindowId) -> bool {
        match (self.idx(ancestor), self.idx(id)) {
            (Some(a), Some(i)) => self.is_ancestor_or_self(a, i),
            _ => false,
        }
    }

    pub(crate) fn frame_window_of(&self, id: WindowId) -> Option<WindowId> {
        match self.window(id)?.frame {
            FrameState::Framed(f) | FrameState::Pending(f) => Some(self.id_of(f)),
            FrameState::NoFrame => None,
        }
    }

    pub(crate) fn wrapper_of_frame(&self, id: WindowId) -> Option<WindowId> {
        self.window(id)?.frame_of.map(|w| self.id_of(w))
    }

    pub fn background_of(&self, id: WindowId) -> Option<Background> {
        let mut idx = self.idx(id)?;
        loop {
            let w = self.w(idx);
            match w.background {
                Background::ParentRelative => idx = w.parent?,
                bg => return Some(bg),
            }
        }
    }

    pub fn title(&self, id: WindowId) -> Option<&BString> {
        self.window(id).map(|w| &w.title)
    }

    pub fn owner(&self, id: WindowId) -> Option<DisplayId> {
        self.window(id)?.owner
    }

    /// Removes every selection and ownership of a display that went away.
    pub fn forget_display(&mut self, display: DisplayId) {
        for slot in &mut self.slots {
            if let Some(w) = &mut slot.window {
                w.listeners.retain(|(d, _)| *d != display);
                if w.owner == Some(display) {
                    w.owner = None;
                }
            }
        }
        self.outbox.retain(|n| n.display != display);
    }
}

struct ChildIter<'a> {
    tree: &'a WindowTree,
    next: Option<u32>,
}

impl Iterator for ChildIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = self.tree.w(cur).next_sibling;
        Some(cur)
    }
}
