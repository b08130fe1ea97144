//! The boundary between the server and the code that produces pixels.
//!
//! The server computes which pixels a draw call may touch and hands a
//! [`DrawTarget`] and a [`Clip`] to a [`Rasterizer`]. Rasterizers are only
//! invoked while the server's global lock is held.


use {
    crate::{
        drawable::Pixmap,
        gc::{ArcMode, FillRule, FontId, GcValues},
        rect::{Rect, Region, RegionPool},
    },
    std::f64::consts::PI,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Segment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// An elliptical arc inside the bounding box `(x, y, width, height)`.
/// Angles are in 1/64 degree, counterclockwise from three o'clock.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EllipseArc {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub angle1: i32,
    pub angle2: i32,
}

/// A pixel buffer plus the position of the drawable's origin in it.
pub struct DrawTarget<'a> {
    pub pixels: &'a mut [u32],
    pub stride: usize,
    pub width: i32,
    pub height: i32,
    /// Buffer coordinates of the drawable's `(0, 0)`.
    pub origin: (i32, i32),
}

/// A clip pixmap. Pixels whose stencil value is 0 are left untouched.
pub struct ClipStencil<'a> {
    pub pixmap: &'a Pixmap,
    /// Buffer coordinates of the stencil's `(0, 0)`.
    pub x: i32,
    pub y: i32,
}

/// The pixels a draw call may touch.
pub struct Clip<'a> {
    /// Buffer coordinates.
    pub region: &'a Region,
    pub stencil: Option<ClipStencil<'a>>,
}

impl Clip<'_> {
    /// Whether the buffer pixel `(x, y)` may be touched.
    pub fn allows(&self, x: i32, y: i32) -> bool {
        if !self.region.contains(x, y) {
            return false;
        }
        match &self.stencil {
            Some(s) => s.pixmap.pixel(x - s.x, y - s.y).is_some_and(|p| p != 0),
            None => true,
        }
    }
}

impl DrawTarget<'_> {
    pub fn bounds(&self) -> Rect {
        Rect::new_sized(0, 0, self.width, self.height)
    }

    /// Combines `pixel` into the buffer pixel `(x, y)` if the clip allows
    /// it.
    pub fn put(&mut self, gc: &GcValues, clip: &Clip<'_>, x: i32, y: i32, pixel: u32) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height || !clip.allows(x, y) {
            return;
        }
        let dst = &mut self.pixels[y as usize * self.stride + x as usize];
        *dst = gc.function.apply(pixel, *dst, gc.plane_mask);
    }

    /// Fills a rectangle given in buffer coordinates.
    pub fn fill(&mut self, gc: &GcValues, clip: &Clip<'_>, rect: Rect, pixel: u32) {
        let rect = rect.intersect(self.bounds());
        for clip_rect in clip.region.iter() {
            let r = rect.intersect(*clip_rect);
            if r.is_empty() {
                continue;
            }
            for y in r.y1()..r.y2() {
                let row = y as usize * self.stride;
                for x in r.x1()..r.x2() {
                    if let Some(s) = &clip.stencil {
                        if s.pixmap.pixel(x - s.x, y - s.y).is_none_or(|p| p == 0) {
                            continue;
                        }
                    }
                    let dst = &mut self.pixels[row + x as usize];
                    *dst = gc.function.apply(pixel, *dst, gc.plane_mask);
                }
            }
        }
    }
}

/// Consumer of the primitive draw calls. Geometry is in drawable
/// coordinates.
pub trait Rasterizer: Send {
    fn fill_rects(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, rects: &[Rect]);

    fn draw_points(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, points: &[Point]);

    /// Draws a connected line through `points`.
    fn draw_lines(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, points: &[Point]);

    fn draw_segments(
        &mut self,
        target: &mut DrawTarget<'_>,
        gc: &GcValues,
        clip: &Clip<'_>,
        segments: &[Segment],
    );

    fn fill_polygon(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, points: &[Point]);

    fn draw_arcs(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, arcs: &[EllipseArc]);

    fn fill_arcs(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, arcs: &[EllipseArc]);

    /// Paints the set bits of a 1-bit bitmap with the foreground. Rows are
    /// padded to whole bytes, the least significant bit comes first.
    #[allow(clippy::too_many_arguments)]
    fn blit_bitmap(
        &mut self,
        target: &mut DrawTarget<'_>,
        gc: &GcValues,
        clip: &Clip<'_>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        bits: &[u8],
    );

    /// Draws `text` with its baseline starting at `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        target: &mut DrawTarget<'_>,
        gc: &GcValues,
        clip: &Clip<'_>,
        fonts: &mut dyn FontService,
        x: i32,
        y: i32,
        text: &[u8],
    ) {
        fonts.draw_glyph_run(target, gc, clip, x, y, text);
    }
}

/// Glyph measurement and rendering.
pub trait FontService: Send {
    fn measure_text(&self, font: FontId, text: &[u8]) -> i32;

    #[allow(clippy::too_many_arguments)]
    fn draw_glyph_run(
        &mut self,
        target: &mut DrawTarget<'_>,
        gc: &GcValues,
        clip: &Clip<'_>,
        x: i32,
        y: i32,
        text: &[u8],
    );
}

/// Receives the composited surface whenever the frame timer fires and
/// something changed.
pub trait Presenter: Send {
    fn present(&mut self, surface: &Surface, damage: &Region);
}

impl<F> Presenter for F
where
    F: FnMut(&Surface, &Region) + Send,
{
    fn present(&mut self, surface: &Surface, damage: &Region) {
        self(surface, damage)
    }
}

/// The single composited pixel buffer.
pub struct Surface {
    width: i32,
    height: i32,
    pixels: Vec<u32>,
    damage: Region,
}

impl Surface {
    pub fn new(pool: &mut RegionPool, width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            damage: pool.acquire(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new_sized(0, 0, self.width, self.height)
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Resizes the buffer, keeping the overlapping pixels, and damages
    /// everything.
    pub fn resize(&mut self, pool: &mut RegionPool, width: i32, height: i32) {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = vec![0; width as usize * height as usize];
        let copy_w = width.min(self.width) as usize;
        for y in 0..height.min(self.height) as usize {
            let src = y * self.width as usize;
            let dst = y * width as usize;
            pixels[dst..dst + copy_w].copy_from_slice(&self.pixels[src..src + copy_w]);
        }
        self.pixels = pixels;
        self.width = width;
        self.height = height;
        let bounds = self.bounds();
        pool.union_rect(&mut self.damage, bounds);
        pool.intersect_rect(&mut self.damage, bounds);
    }

    pub fn target(&mut self, origin: (i32, i32)) -> DrawTarget<'_> {
        DrawTarget {
            pixels: &mut self.pixels,
            stride: self.width as usize,
            width: self.width,
            height: self.height,
            origin,
        }
    }

    pub fn damage(&mut self, pool: &mut RegionPool, region: &Region) {
        pool.union(&mut self.damage, region);
    }

    pub fn damage_rect(&mut self, pool: &mut RegionPool, rect: Rect) {
        let bounds = self.bounds();
        pool.union_rect(&mut self.damage, rect.intersect(bounds));
    }

    pub fn is_damaged(&self) -> bool {
        !self.damage.is_empty()
    }

    /// Returns the accumulated damage and resets it.
    pub fn take_damage(&mut self, pool: &mut RegionPool) -> Region {
        let empty = pool.acquire();
        std::mem::replace(&mut self.damage, empty)
    }
}

impl Pixmap {
    pub fn target(&mut self) -> DrawTarget<'_> {
        DrawTarget {
            stride: self.width as usize,
            pixels: &mut self.pixels,
            width: self.width,
            height: self.height,
            origin: (0, 0),
        }
    }
}

/// A portable rasterizer drawing thin, solid primitives.
///
/// Lines are one pixel wide regardless of the line width and dashes are
/// drawn solid. Tiles and stipples are filled with the foreground.
#[derive(Default)]
pub struct SoftRasterizer;

impl SoftRasterizer {
    fn line(target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, a: Point, b: Point) {
        let (ox, oy) = target.origin;
        let (mut x, mut y) = (a.x + ox, a.y + oy);
        let (x2, y2) = (b.x + ox, b.y + oy);
        let dx = (x2 - x).abs();
        let dy = -(y2 - y).abs();
        let sx = if x < x2 { 1 } else { -1 };
        let sy = if y < y2 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            target.put(gc, clip, x, y, gc.foreground);
            if x == x2 && y == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn polygon(target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, points: &[Point]) {
        if points.len() < 3 {
            return;
        }
        let (ox, oy) = target.origin;
        let y_min = points.iter().map(|p| p.y).min().unwrap_or(0);
        let y_max = points.iter().map(|p| p.y).max().unwrap_or(0);
        let mut crossings: Vec<(f64, i32)> = vec![];
        for y in y_min..y_max {
            let sy = y as f64 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let a = points[i];
                let b = points[(i + 1) % points.len()];
                if a.y == b.y {
                    continue;
                }
                let (lo, hi, dir) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };
                if sy < lo.y as f64 || sy >= hi.y as f64 {
                    continue;
                }
                let t = (sy - lo.y as f64) / (hi.y - lo.y) as f64;
                crossings.push((lo.x as f64 + t * (hi.x - lo.x) as f64, dir));
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut winding = 0;
            for i in 0..crossings.len().saturating_sub(1) {
                winding += crossings[i].1;
                let inside = match gc.fill_rule {
                    FillRule::EvenOdd => i % 2 == 0,
                    FillRule::Winding => winding != 0,
                };
                if !inside {
                    continue;
                }
                let x1 = (crossings[i].0 - 0.5).ceil() as i32;
                let x2 = (crossings[i + 1].0 - 0.5).ceil() as i32;
                let span = Rect::new_sized(x1 + ox, y + oy, x2 - x1, 1);
                target.fill(gc, clip, span, gc.foreground);
            }
        }
    }

    fn arc_points(arc: &EllipseArc) -> Vec<Point> {
        let rx = arc.width as f64 / 2.0;
        let ry = arc.height as f64 / 2.0;
        let cx = arc.x as f64 + rx;
        let cy = arc.y as f64 + ry;
        let start = arc.angle1 as f64 / 64.0 * PI / 180.0;
        let extent = (arc.angle2.clamp(-360 * 64, 360 * 64)) as f64 / 64.0 * PI / 180.0;
        let steps = ((rx + ry) as usize).max(8);
        (0..=steps)
            .map(|i| {
                let a = start + extent * i as f64 / steps as f64;
                Point::new(
                    (cx + rx * a.cos()).round() as i32,
                    (cy - ry * a.sin()).round() as i32,
                )
            })
            .collect()
    }
}

impl Rasterizer for SoftRasterizer {
    fn fill_rects(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, rects: &[Rect]) {
        let (ox, oy) = target.origin;
        for rect in rects {
            target.fill(gc, clip, rect.move_(ox, oy), gc.foreground);
        }
    }

    fn draw_points(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, points: &[Point]) {
        let (ox, oy) = target.origin;
        for p in points {
            target.put(gc, clip, p.x + ox, p.y + oy, gc.foreground);
        }
    }

    fn draw_lines(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, points: &[Point]) {
        for pair in points.windows(2) {
            Self::line(target, gc, clip, pair[0], pair[1]);
        }
    }

    fn draw_segments(
        &mut self,
        target: &mut DrawTarget<'_>,
        gc: &GcValues,
        clip: &Clip<'_>,
        segments: &[Segment],
    ) {
        for s in segments {
            Self::line(target, gc, clip, Point::new(s.x1, s.y1), Point::new(s.x2, s.y2));
        }
    }

    fn fill_polygon(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, points: &[Point]) {
        Self::polygon(target, gc, clip, points);
    }

    fn draw_arcs(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, arcs: &[EllipseArc]) {
        for arc in arcs {
            let points = Self::arc_points(arc);
            self.draw_lines(target, gc, clip, &points);
        }
    }

    fn fill_arcs(&mut self, target: &mut DrawTarget<'_>, gc: &GcValues, clip: &Clip<'_>, arcs: &[EllipseArc]) {
        for arc in arcs {
            let mut points = Self::arc_points(arc);
            if gc.arc_mode == ArcMode::PieSlice && arc.angle2.abs() < 360 * 64 {
                points.push(Point::new(arc.x + arc.width / 2, arc.y + arc.height / 2));
            }
            Self::polygon(target, gc, clip, &points);
        }
    }

    fn blit_bitmap(
        &mut self,
        target: &mut DrawTarget<'_>,
        gc: &GcValues,
        clip: &Clip<'_>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        bits: &[u8],
    ) {
        let (ox, oy) = target.origin;
        let row_len = (width.max(0) as usize).div_ceil(8);
        for row in 0..height.max(0) {
            for col in 0..width.max(0) {
                let idx = row as usize * row_len + col as usize / 8;
                let Some(byte) = bits.get(idx) else {
                    return;
                };
                if byte & (1 << (col % 8)) != 0 {
                    target.put(gc, clip, x + col + ox, y + row + oy, gc.foreground);
                }
            }
        }
    }
}

/// A font service without glyph data. Every printable character is drawn
/// as a hollow box in a fixed 6x13 cell.
#[derive(Default)]
pub struct BoxFont;

impl BoxFont {
    pub const CELL_WIDTH: i32 = 6;
    pub const ASCENT: i32 = 10;
}

impl FontService for BoxFont {
    fn measure_text(&self, _font: FontId, text: &[u8]) -> i32 {
        text.len() as i32 * Self::CELL_WIDTH
    }

    fn draw_glyph_run(
        &mut self,
        target: &mut DrawTarget<'_>,
        gc: &GcValues,
        clip: &Clip<'_>,
        x: i32,
        y: i32,
        text: &[u8],
    ) {
        let (ox, oy) = target.origin;
        for (i, c) in text.iter().enumerate() {
            if c.is_ascii_whitespace() || c.is_ascii_control() {
                continue;
            }
            let x1 = x + ox + i as i32 * Self::CELL_WIDTH + 1;
            let y1 = y + oy - Self::ASCENT + 2;
            let (x2, y2) = (x1 + Self::CELL_WIDTH - 3, y1 + Self::ASCENT - 3);
            for px in x1..=x2 {
                target.put(gc, clip, px, y1, gc.foreground);
                target.put(gc, clip, px, y2, gc.foreground);
            }
            for py in y1..=y2 {
                target.put(gc, clip, x1, py, gc.foreground);
                target.put(gc, clip, x2, py, gc.foreground);
            }
        }
    }
}
