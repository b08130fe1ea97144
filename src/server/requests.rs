//! Requests a display makes to the server. Every request increments the
//! display's request counter and runs under the global lock.

use {
    crate::{
        display::{Display, DisplayId},
        drawable::{Drawable, Pixmap, PixmapId},
        event::{EventKind, EventMask},
        gc::{Gc, GcError, GcId, GcMask, GcValues},
        rect::Rect,
        render::{Clip, DrawTarget, EllipseArc, FontService, Point, Rasterizer, Segment},
        server::{DrawError, ServerState, log_draw_error},
        tree::{
            Atom, AttributeChanges, Geometry, Notification, Property, PropertyError, PropertyMode,
            ReparentError, StackMode, TreeInfo, WindowAttributes, WindowChanges, WindowClass,
            WindowId, WindowInfo,
        },
    },
    bstr::BString,
    smallvec::SmallVec,
};

impl Display {
    fn request<T>(&self, f: impl FnOnce(&mut ServerState) -> T) -> T {
        self.queue.bump_request();
        self.server.with_state(f)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_window(
        &self,
        parent: WindowId,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        border_width: i32,
        class: WindowClass,
        attributes: &WindowAttributes,
    ) -> Option<WindowId> {
        let id = self.id();
        self.request(|s| {
            s.tree
                .create_window(id, parent, x, y, width, height, border_width, class, attributes)
        })
    }

    pub fn destroy_window(&self, window: WindowId) {
        self.request(|s| s.tree.destroy_window(window))
    }

    pub fn destroy_subwindows(&self, window: WindowId) {
        self.request(|s| s.tree.destroy_subwindows(window))
    }

    pub fn reparent_window(
        &self,
        window: WindowId,
        parent: WindowId,
        x: i32,
        y: i32,
    ) -> Result<(), ReparentError> {
        self.request(|s| s.tree.reparent_window(window, parent, x, y))
    }

    pub fn map_window(&self, window: WindowId) {
        self.request(|s| s.tree.map_window(window))
    }

    pub fn unmap_window(&self, window: WindowId) {
        self.request(|s| s.tree.unmap_window(window))
    }

    pub fn map_subwindows(&self, window: WindowId) {
        self.request(|s| s.tree.map_subwindows(window))
    }

    pub fn unmap_subwindows(&self, window: WindowId) {
        self.request(|s| s.tree.unmap_subwindows(window))
    }

    pub fn configure_window(&self, window: WindowId, changes: &WindowChanges) {
        self.request(|s| s.tree.configure_window(window, changes))
    }

    pub fn move_resize_window(&self, window: WindowId, x: i32, y: i32, width: i32, height: i32) {
        let changes = WindowChanges {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            ..Default::default()
        };
        self.configure_window(window, &changes);
    }

    pub fn restack_window(&self, window: WindowId, sibling: Option<WindowId>, mode: StackMode) {
        self.request(|s| s.tree.restack_window(window, sibling, mode))
    }

    pub fn raise_window(&self, window: WindowId) {
        self.request(|s| s.tree.raise_window(window))
    }

    pub fn lower_window(&self, window: WindowId) {
        self.request(|s| s.tree.lower_window(window))
    }

    pub fn change_window_attributes(&self, window: WindowId, changes: &AttributeChanges) {
        let id = self.id();
        self.request(|s| s.tree.change_window_attributes(id, window, changes))
    }

    pub fn select_input(&self, window: WindowId, mask: EventMask) {
        let id = self.id();
        self.request(|s| s.tree.select_input(id, window, mask))
    }

    /// Binds the window to a toplevel widget, making it eligible for a
    /// decorative frame.
    pub fn set_wrapper(&self, window: WindowId, wrapper: bool) {
        self.request(|s| s.tree.set_wrapper(window, wrapper))
    }

    pub fn set_transient_for(&self, window: WindowId, owner: Option<WindowId>) {
        self.request(|s| s.tree.set_transient_for(window, owner))
    }

    pub fn set_fullscreen(&self, window: WindowId, fullscreen: bool) {
        self.request(|s| s.tree.set_fullscreen(window, fullscreen))
    }

    pub fn is_fullscreen(&self, window: WindowId) -> bool {
        self.request(|s| s.tree.is_fullscreen(window))
    }

    pub fn set_input_focus(&self, window: WindowId) {
        self.request(|s| s.tree.set_input_focus(window))
    }

    pub fn input_focus(&self) -> WindowId {
        self.request(|s| s.tree.focus())
    }

    pub fn query_tree(&self, window: WindowId) -> Option<TreeInfo> {
        self.request(|s| s.tree.query_tree(window))
    }

    pub fn get_geometry(&self, window: WindowId) -> Option<Geometry> {
        self.request(|s| s.tree.get_geometry(window))
    }

    pub fn get_window_attributes(&self, window: WindowId) -> Option<WindowInfo> {
        let id = self.id();
        self.request(|s| s.tree.get_window_attributes(window, id))
    }

    pub fn translate_coordinates(
        &self,
        src: WindowId,
        dst: WindowId,
        x: i32,
        y: i32,
    ) -> Option<(i32, i32, Option<WindowId>)> {
        self.request(|s| s.tree.translate_coordinates(src, dst, x, y))
    }

    /// The visible region of the window in window coordinates.
    pub fn visible_region(&self, window: WindowId) -> Vec<Rect> {
        self.request(|s| {
            let (Some(region), Some((ox, oy))) = (s.tree.visible_region(window), s.tree.origin(window))
            else {
                return vec![];
            };
            region.iter().map(|r| r.move_(-ox, -oy)).collect()
        })
    }

    /// The frame the server synthesized around the window, if any.
    pub fn frame_of(&self, window: WindowId) -> Option<WindowId> {
        self.request(|s| s.tree.frame_window_of(window))
    }

    /// The pointer position in root coordinates and the deepest window
    /// containing it.
    pub fn query_pointer(&self) -> (i32, i32, WindowId) {
        self.request(|s| {
            let (x, y) = (s.pointer.x, s.pointer.y);
            (x, y, s.tree.window_at(x, y))
        })
    }

    pub fn intern_atom(&self, name: &[u8], only_if_exists: bool) -> Option<Atom> {
        self.request(|s| s.tree.atoms.intern(name, only_if_exists))
    }

    pub fn atom_name(&self, atom: Atom) -> Option<BString> {
        self.request(|s| s.tree.atoms.name(atom).map(|n| n.to_owned()))
    }

    pub fn change_property(
        &self,
        window: WindowId,
        atom: Atom,
        ty: Atom,
        format: u8,
        mode: PropertyMode,
        data: &[u8],
    ) -> Result<(), PropertyError> {
        self.request(|s| s.tree.change_property(window, atom, ty, format, mode, data))
    }

    pub fn get_property(&self, window: WindowId, atom: Atom, delete: bool) -> Option<Property> {
        self.request(|s| s.tree.get_property(window, atom, delete))
    }

    pub fn delete_property(&self, window: WindowId, atom: Atom) {
        self.request(|s| s.tree.delete_property(window, atom))
    }

    pub fn list_properties(&self, window: WindowId) -> Vec<Atom> {
        self.request(|s| s.tree.list_properties(window))
    }

    /// Sets the window title. Framed windows show it in their title bar.
    pub fn set_title(&self, window: WindowId, title: &[u8]) -> Result<(), PropertyError> {
        self.change_property(window, Atom::WM_NAME, Atom::UTF8_STRING, 8, PropertyMode::Replace, title)
    }

    /// Sends a synthetic event. With an empty mask the event goes to the
    /// owner of the window, otherwise to every display that selected any of
    /// `mask` on it.
    pub fn send_event(&self, window: WindowId, mask: EventMask, kind: EventKind) {
        self.request(|s| {
            let displays: SmallVec<[DisplayId; 1]> = match mask.is_empty() {
                true => s.tree.owner(window).into_iter().collect(),
                false => s.tree.selecting(window, mask),
            };
            for display in displays {
                s.tree.push_notification(Notification {
                    display,
                    window,
                    send_event: true,
                    kind: kind.clone(),
                });
            }
        })
    }

    /// Blocks until the server thread has translated all native input sent
    /// before this call.
    pub fn sync(&self) {
        self.queue.bump_request();
        self.server.sync();
    }

    pub fn create_gc(&self, values: &GcValues) -> GcId {
        self.request(|s| {
            let id = s.gc_ids.next();
            let gc = Gc::new(&mut s.tree.pool, values);
            s.gcs.insert(id, gc);
            id
        })
    }

    fn with_gc<T>(
        &self,
        gc: GcId,
        f: impl FnOnce(&mut Gc, &mut ServerState) -> T,
    ) -> Result<T, GcError> {
        self.request(|s| {
            let mut g = s.gcs.remove(&gc).ok_or(GcError::InvalidGc(gc))?;
            let res = f(&mut g, s);
            s.gcs.insert(gc, g);
            Ok(res)
        })
    }

    pub fn change_gc(&self, gc: GcId, mask: GcMask, values: &GcValues) -> Result<(), GcError> {
        self.with_gc(gc, |g, s| {
            if let Some(p) = values.clip_mask.filter(|_| mask.contains(GcMask::CLIP_MASK)) {
                s.check_pixmap(p)?;
            }
            g.change(&mut s.tree.pool, mask, values);
            Ok::<_, GcError>(())
        })?
    }

    pub fn copy_gc(&self, src: GcId, mask: GcMask, dst: GcId) -> Result<(), GcError> {
        if src == dst {
            return match self.gc_values(src) {
                Some(_) => Ok(()),
                None => Err(GcError::InvalidGc(src)),
            };
        }
        self.with_gc(dst, |g, s| {
            let src = s.gcs.get(&src).ok_or(GcError::InvalidGc(src))?;
            g.copy_from(&mut s.tree.pool, src, mask);
            Ok::<_, GcError>(())
        })?
    }

    /// Installs the union of `rects` as the clip region.
    pub fn set_clip_region(&self, gc: GcId, rects: &[Rect]) -> Result<(), GcError> {
        self.with_gc(gc, |g, s| {
            let region = s.tree.pool.acquire_rects(rects);
            g.set_clip_region(&mut s.tree.pool, &region);
            s.tree.pool.release(region);
        })
    }

    pub fn set_clip_rectangles(&self, gc: GcId, x: i32, y: i32, rects: &[Rect]) -> Result<(), GcError> {
        self.with_gc(gc, |g, s| g.set_clip_rectangles(&mut s.tree.pool, x, y, rects))
    }

    pub fn set_clip_pixmap(&self, gc: GcId, pixmap: Option<PixmapId>) -> Result<(), GcError> {
        self.with_gc(gc, |g, s| {
            if let Some(p) = pixmap {
                s.check_pixmap(p)?;
            }
            g.set_clip_pixmap(&mut s.tree.pool, pixmap);
            Ok::<_, GcError>(())
        })?
    }

    pub fn set_clip_origin(&self, gc: GcId, x: i32, y: i32) -> Result<(), GcError> {
        self.with_gc(gc, |g, _| g.set_clip_origin(x, y))
    }

    pub fn set_dashes(&self, gc: GcId, offset: u16, dashes: &[u8]) -> Result<(), GcError> {
        self.with_gc(gc, |g, _| g.set_dashes(offset, dashes))?
    }

    pub fn gc_values(&self, gc: GcId) -> Option<GcValues> {
        self.request(|s| s.gcs.get(&gc).map(|g| g.values.clone()))
    }

    pub fn free_gc(&self, gc: GcId) {
        self.request(|s| s.free_gc(gc))
    }

    pub fn create_pixmap(&self, width: i32, height: i32, depth: u8) -> PixmapId {
        self.request(|s| {
            let id = s.pixmap_ids.next();
            s.pixmaps.insert(id, Pixmap::new(width, height, depth));
            id
        })
    }

    pub fn free_pixmap(&self, pixmap: PixmapId) {
        self.request(|s| {
            if s.pixmaps.remove(&pixmap).is_some() {
                s.forget_pixmap_clips(pixmap);
            }
        })
    }

    /// Reads a pixel of a pixmap.
    pub fn pixmap_pixel(&self, pixmap: PixmapId, x: i32, y: i32) -> Option<u32> {
        self.request(|s| s.pixmaps.get(&pixmap)?.pixel(x, y))
    }

    fn draw(
        &self,
        drawable: Drawable,
        gc: GcId,
        f: impl FnOnce(&mut dyn Rasterizer, &mut dyn FontService, &mut DrawTarget<'_>, &GcValues, &Clip<'_>),
    ) -> Result<(), DrawError> {
        let res = self.request(|s| s.draw(drawable, gc, f));
        if let Err(e) = &res {
            log_draw_error(e);
        }
        res
    }

    pub fn fill_rectangles(&self, drawable: impl Into<Drawable>, gc: GcId, rects: &[Rect]) -> Result<(), DrawError> {
        self.draw(drawable.into(), gc, |r, _, t, v, c| r.fill_rects(t, v, c, rects))
    }

    pub fn draw_points(&self, drawable: impl Into<Drawable>, gc: GcId, points: &[Point]) -> Result<(), DrawError> {
        self.draw(drawable.into(), gc, |r, _, t, v, c| r.draw_points(t, v, c, points))
    }

    pub fn draw_lines(&self, drawable: impl Into<Drawable>, gc: GcId, points: &[Point]) -> Result<(), DrawError> {
        self.draw(drawable.into(), gc, |r, _, t, v, c| r.draw_lines(t, v, c, points))
    }

    pub fn draw_segments(
        &self,
        drawable: impl Into<Drawable>,
        gc: GcId,
        segments: &[Segment],
    ) -> Result<(), DrawError> {
        self.draw(drawable.into(), gc, |r, _, t, v, c| r.draw_segments(t, v, c, segments))
    }

    pub fn fill_polygon(&self, drawable: impl Into<Drawable>, gc: GcId, points: &[Point]) -> Result<(), DrawError> {
        self.draw(drawable.into(), gc, |r, _, t, v, c| r.fill_polygon(t, v, c, points))
    }

    pub fn draw_arcs(&self, drawable: impl Into<Drawable>, gc: GcId, arcs: &[EllipseArc]) -> Result<(), DrawError> {
        self.draw(drawable.into(), gc, |r, _, t, v, c| r.draw_arcs(t, v, c, arcs))
    }

    pub fn fill_arcs(&self, drawable: impl Into<Drawable>, gc: GcId, arcs: &[EllipseArc]) -> Result<(), DrawError> {
        self.draw(drawable.into(), gc, |r, _, t, v, c| r.fill_arcs(t, v, c, arcs))
    }

    pub fn draw_text(
        &self,
        drawable: impl Into<Drawable>,
        gc: GcId,
        x: i32,
        y: i32,
        text: &[u8],
    ) -> Result<(), DrawError> {
        self.draw(drawable.into(), gc, |r, f, t, v, c| r.draw_text(t, v, c, f, x, y, text))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn put_bitmap(
        &self,
        drawable: impl Into<Drawable>,
        gc: GcId,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        bits: &[u8],
    ) -> Result<(), DrawError> {
        self.draw(drawable.into(), gc, |r, _, t, v, c| {
            r.blit_bitmap(t, v, c, x, y, width, height, bits)
        })
    }

    pub fn text_width(&self, gc: GcId, text: &[u8]) -> Result<i32, DrawError> {
        self.request(|s| s.text_width(gc, text))
    }

    pub fn clear_area(&self, window: WindowId, x: i32, y: i32, width: i32, height: i32, exposures: bool) {
        self.request(|s| s.clear_area(window, x, y, width, height, exposures))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_area(
        &self,
        src: impl Into<Drawable>,
        dst: impl Into<Drawable>,
        gc: GcId,
        src_x: i32,
        src_y: i32,
        width: i32,
        height: i32,
        dst_x: i32,
        dst_y: i32,
    ) -> Result<(), DrawError> {
        let (src, dst) = (src.into(), dst.into());
        self.request(|s| s.copy_area(src, dst, gc, src_x, src_y, width, height, dst_x, dst_y))
    }
}
