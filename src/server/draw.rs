use {
    crate::{
        drawable::{Drawable, PixmapId},
        gc::{ClipMask, GcError, GcId, GcValues, SubwindowMode},
        rect::{Rect, Region},
        render::{BoxFont, Clip, ClipStencil, DrawTarget, FontService, Rasterizer, Segment},
        server::ServerState,
        tree::{Background, WindowId},
    },
    thiserror::Error,
};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum DrawError {
    #[error("Drawable {0:?} does not exist")]
    InvalidDrawable(Drawable),
    #[error("GC {0} does not exist")]
    InvalidGc(GcId),
}

impl ServerState {
    /// Resolves the drawable and the GC of a draw call, computes the
    /// effective clip and runs `f` with the rasterizer. Touched window
    /// pixels are added to the surface damage.
    pub fn draw(
        &mut self,
        drawable: Drawable,
        gc: GcId,
        f: impl FnOnce(&mut dyn Rasterizer, &mut dyn FontService, &mut DrawTarget<'_>, &GcValues, &Clip<'_>),
    ) -> Result<(), DrawError> {
        let Self {
            tree,
            gcs,
            pixmaps,
            surface,
            rasterizer,
            fonts,
            ..
        } = self;
        let gc = gcs.get(&gc).ok_or(DrawError::InvalidGc(gc))?;
        match drawable {
            Drawable::Window(id) => {
                let include_inferiors = gc.values.subwindow_mode == SubwindowMode::IncludeInferiors;
                let base = tree
                    .drawable_region(id, include_inferiors)
                    .ok_or(DrawError::InvalidDrawable(drawable))?;
                let origin = tree.origin(id).ok_or(DrawError::InvalidDrawable(drawable))?;
                let clip_region = gc.effective_clip(&mut tree.pool, &base, origin);
                tree.pool.release(base);
                if !clip_region.is_empty() {
                    let stencil = gc.clip_pixmap().and_then(|p| pixmaps.get(&p)).map(|pixmap| ClipStencil {
                        pixmap,
                        x: origin.0 + gc.values.clip_x_origin,
                        y: origin.1 + gc.values.clip_y_origin,
                    });
                    let clip = Clip {
                        region: &clip_region,
                        stencil,
                    };
                    let mut target = surface.target(origin);
                    f(&mut **rasterizer, &mut **fonts, &mut target, &gc.values, &clip);
                    surface.damage(&mut tree.pool, &clip_region);
                }
                tree.pool.release(clip_region);
            }
            Drawable::Pixmap(id) => {
                let mut pixmap = pixmaps.remove(&id).ok_or(DrawError::InvalidDrawable(drawable))?;
                let bounds = tree.pool.acquire_rect(pixmap.bounds());
                let clip_region = gc.effective_clip(&mut tree.pool, &bounds, (0, 0));
                tree.pool.release(bounds);
                // A pixmap clipped by itself is masked by its contents before the draw.
                let own_mask = (gc.clip_pixmap() == Some(id)).then(|| pixmap.clone());
                {
                    let stencil = own_mask
                        .as_ref()
                        .or_else(|| gc.clip_pixmap().and_then(|p| pixmaps.get(&p)))
                        .map(|pixmap| ClipStencil {
                            pixmap,
                            x: gc.values.clip_x_origin,
                            y: gc.values.clip_y_origin,
                        });
                    let clip = Clip {
                        region: &clip_region,
                        stencil,
                    };
                    let mut target = pixmap.target();
                    f(&mut **rasterizer, &mut **fonts, &mut target, &gc.values, &clip);
                }
                tree.pool.release(clip_region);
                pixmaps.insert(id, pixmap);
            }
        }
        Ok(())
    }

    /// Paints newly exposed pixels of a window with its background, or with
    /// the decoration if the window is a frame. `region` is in root
    /// coordinates.
    pub fn paint_exposure(&mut self, window: WindowId, region: &Region) {
        if self.tree.is_frame(window) {
            self.paint_frame(window, region);
            return;
        }
        let Some(Background::Pixel(pixel)) = self.tree.background_of(window) else {
            return;
        };
        self.fill_region(region, pixel);
    }

    /// Fills a root-coordinate region of the surface.
    fn fill_region(&mut self, region: &Region, pixel: u32) {
        let values = GcValues {
            foreground: pixel,
            ..Default::default()
        };
        let clip = Clip {
            region,
            stencil: None,
        };
        let extents = region.extents();
        let mut target = self.surface.target((0, 0));
        self.rasterizer.fill_rects(&mut target, &values, &clip, &[extents]);
        self.surface.damage(&mut self.tree.pool, region);
    }

    fn paint_frame(&mut self, frame: WindowId, region: &Region) {
        let (Some(geometry), Some(origin)) = (self.tree.get_geometry(frame), self.tree.origin(frame)) else {
            return;
        };
        let fw = self.config.frame_width();
        let th = self.config.title_height();
        let (w, h) = (geometry.width, geometry.height);
        let clip = Clip {
            region,
            stencil: None,
        };
        let mut values = GcValues {
            foreground: self.config.border_color,
            ..Default::default()
        };
        let title = self.tree.title(frame).cloned().unwrap_or_default();
        let close = Rect::new_sized(w - fw - th, 0, th, th);
        let room = close.x1() - fw - 2;
        let mut text = &title[..];
        while !text.is_empty() && self.fonts.measure_text(values.font, text) > room {
            text = &text[..text.len() - 1];
        }
        let mut target = self.surface.target(origin);
        self.rasterizer
            .fill_rects(&mut target, &values, &clip, &[Rect::new_sized(0, 0, w, h)]);
        values.foreground = self.config.title_color;
        self.rasterizer
            .fill_rects(&mut target, &values, &clip, &[Rect::new_sized(0, 0, w, th)]);
        values.foreground = self.config.title_text_color;
        let inset = th / 4;
        let segments = [
            Segment {
                x1: close.x1() + inset,
                y1: close.y1() + inset,
                x2: close.x2() - inset - 1,
                y2: close.y2() - inset - 1,
            },
            Segment {
                x1: close.x1() + inset,
                y1: close.y2() - inset - 1,
                x2: close.x2() - inset - 1,
                y2: close.y1() + inset,
            },
        ];
        self.rasterizer
            .draw_segments(&mut target, &values, &clip, &segments);
        if !text.is_empty() {
            let baseline = (th + BoxFont::ASCENT) / 2;
            self.rasterizer.draw_text(
                &mut target,
                &values,
                &clip,
                &mut *self.fonts,
                fw + 2,
                baseline,
                text,
            );
        }
        self.surface.damage(&mut self.tree.pool, region);
    }

    /// Paints a rectangle of a window with its background. A width or
    /// height of 0 extends the rectangle to the window's edge. With
    /// `exposures` Expose events are generated instead and the painting
    /// happens when they are flushed.
    pub fn clear_area(&mut self, window: WindowId, x: i32, y: i32, width: i32, height: i32, exposures: bool) {
        let Some(geometry) = self.tree.get_geometry(window) else {
            return;
        };
        let width = if width == 0 { geometry.width - x } else { width };
        let height = if height == 0 { geometry.height - y } else { height };
        let rect = Rect::new_sized(x, y, width, height);
        if exposures {
            self.tree.expose_rect(window, rect);
            return;
        }
        let Some((ox, oy)) = self.tree.origin(window) else {
            return;
        };
        let Some(mut region) = self.tree.drawable_region(window, false) else {
            return;
        };
        self.tree.pool.intersect_rect(&mut region, rect.move_(ox, oy));
        self.paint_exposure(window, &region);
        self.tree.pool.release(region);
    }

    /// Copies a rectangle between drawables, honoring the destination clip
    /// and the GC function.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_area(
        &mut self,
        src: Drawable,
        dst: Drawable,
        gc: GcId,
        src_x: i32,
        src_y: i32,
        width: i32,
        height: i32,
        dst_x: i32,
        dst_y: i32,
    ) -> Result<(), DrawError> {
        let width = width.max(0);
        let height = height.max(0);
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        let read = |x: i32, y: i32| -> Option<u32> {
            match src {
                Drawable::Window(id) => {
                    let (ox, oy) = self.tree.origin(id)?;
                    self.surface.pixel(x + ox, y + oy)
                }
                Drawable::Pixmap(id) => self.pixmaps.get(&id)?.pixel(x, y),
            }
        };
        match src {
            Drawable::Window(id) if !self.tree.contains(id) => return Err(DrawError::InvalidDrawable(src)),
            Drawable::Pixmap(id) if !self.pixmaps.contains_key(&id) => return Err(DrawError::InvalidDrawable(src)),
            _ => {}
        }
        for y in 0..height {
            for x in 0..width {
                pixels.push(read(src_x + x, src_y + y));
            }
        }
        self.draw(dst, gc, |_, _, target, values, clip| {
            let (ox, oy) = target.origin;
            for y in 0..height {
                for x in 0..width {
                    if let Some(p) = pixels[(y * width + x) as usize] {
                        target.put(values, clip, dst_x + x + ox, dst_y + y + oy, p);
                    }
                }
            }
        })
    }

    pub fn text_width(&self, gc: GcId, text: &[u8]) -> Result<i32, DrawError> {
        let gc = self.gcs.get(&gc).ok_or(DrawError::InvalidGc(gc))?;
        Ok(self.fonts.measure_text(gc.values.font, text))
    }

    pub fn check_pixmap(&self, pixmap: PixmapId) -> Result<(), GcError> {
        match self.pixmaps.contains_key(&pixmap) {
            true => Ok(()),
            false => Err(GcError::InvalidPixmap(pixmap)),
        }
    }

    pub fn free_gc(&mut self, gc: GcId) {
        if let Some(gc) = self.gcs.remove(&gc) {
            gc.release(&mut self.tree.pool);
        }
    }

    /// Removes the clip of every GC that references the pixmap.
    pub fn forget_pixmap_clips(&mut self, id: PixmapId) {
        for gc in self.gcs.values_mut() {
            if matches!(gc.clip, ClipMask::Pixmap(p) if p == id) {
                gc.set_clip_pixmap(&mut self.tree.pool, None);
            }
        }
    }
}
