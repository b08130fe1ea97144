
use {
    crate::{
        drawable::PixmapId,
        rect::{Rect, Region, RegionPool},
    },
    arrayvec::ArrayVec,
    thiserror::Error,
};

linear_ids!(GcIds, GcId, u64);

pub const MAX_DASHES: usize = 32;

bitflags! {
    /// Selects the fields of a GC that a change or copy overwrites.
    GcMask: u32;
    FUNCTION = 1 << 0,
    PLANE_MASK = 1 << 1,
    FOREGROUND = 1 << 2,
    BACKGROUND = 1 << 3,
    LINE_WIDTH = 1 << 4,
    LINE_STYLE = 1 << 5,
    CAP_STYLE = 1 << 6,
    JOIN_STYLE = 1 << 7,
    FILL_STYLE = 1 << 8,
    FILL_RULE = 1 << 9,
    TILE = 1 << 10,
    STIPPLE = 1 << 11,
    TILE_STIPPLE_X_ORIGIN = 1 << 12,
    TILE_STIPPLE_Y_ORIGIN = 1 << 13,
    FONT = 1 << 14,
    SUBWINDOW_MODE = 1 << 15,
    GRAPHICS_EXPOSURES = 1 << 16,
    CLIP_X_ORIGIN = 1 << 17,
    CLIP_Y_ORIGIN = 1 << 18,
    CLIP_MASK = 1 << 19,
    DASH_OFFSET = 1 << 20,
    DASH_LIST = 1 << 21,
    ARC_MODE = 1 << 22,
}

/// Raster operation combining a source pixel with the destination.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Function {
    Clear,
    And,
    AndReverse,
    #[default]
    Copy,
    AndInverted,
    NoOp,
    Xor,
    Or,
    Nor,
    Equiv,
    Invert,
    OrReverse,
    CopyInverted,
    OrInverted,
    Nand,
    Set,
}

impl Function {
    /// Combines `src` with `dst`, touching only the bits in `plane_mask`.
    pub fn apply(self, src: u32, dst: u32, plane_mask: u32) -> u32 {
        let res = match self {
            Function::Clear => 0,
            Function::And => src & dst,
            Function::AndReverse => src & !dst,
            Function::Copy => src,
            Function::AndInverted => !src & dst,
            Function::NoOp => dst,
            Function::Xor => src ^ dst,
            Function::Or => src | dst,
            Function::Nor => !(src | dst),
            Function::Equiv => !src ^ dst,
            Function::Invert => !dst,
            Function::OrReverse => src | !dst,
            Function::CopyInverted => !src,
            Function::OrInverted => !src | dst,
            Function::Nand => !(src & dst),
            Function::Set => !0,
        };
        (res & plane_mask) | (dst & !plane_mask)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    OnOffDash,
    DoubleDash,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum CapStyle {
    NotLast,
    #[default]
    Butt,
    Round,
    Projecting,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum JoinStyle {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum FillStyle {
    #[default]
    Solid,
    Tiled,
    Stippled,
    OpaqueStippled,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum FillRule {
    #[default]
    EvenOdd,
    Winding,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum ArcMode {
    Chord,
    #[default]
    PieSlice,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum SubwindowMode {
    /// Drawing into a window is clipped by its mapped children.
    #[default]
    ClipByChildren,
    IncludeInferiors,
}

/// Identifies a font known to the font service.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct FontId(pub u32);

/// Values of a GC. Which of them take effect in [`Gc::change`] is selected
/// by a [`GcMask`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GcValues {
    pub function: Function,
    pub plane_mask: u32,
    pub foreground: u32,
    pub background: u32,
    pub line_width: u16,
    pub line_style: LineStyle,
    pub cap_style: CapStyle,
    pub join_style: JoinStyle,
    pub fill_style: FillStyle,
    pub fill_rule: FillRule,
    pub tile: Option<PixmapId>,
    pub stipple: Option<PixmapId>,
    pub tile_stipple_x_origin: i32,
    pub tile_stipple_y_origin: i32,
    pub font: FontId,
    pub subwindow_mode: SubwindowMode,
    pub graphics_exposures: bool,
    pub clip_x_origin: i32,
    pub clip_y_origin: i32,
    /// `Some` installs a pixmap clip, `None` removes any clip.
    pub clip_mask: Option<PixmapId>,
    pub dash_offset: u16,
    /// Sets the dash list to `[dashes, dashes]`.
    pub dashes: u8,
    pub arc_mode: ArcMode,
}

impl Default for GcValues {
    fn default() -> Self {
        Self {
            function: Function::Copy,
            plane_mask: !0,
            foreground: 0,
            background: 1,
            line_width: 0,
            line_style: LineStyle::Solid,
            cap_style: CapStyle::Butt,
            join_style: JoinStyle::Miter,
            fill_style: FillStyle::Solid,
            fill_rule: FillRule::EvenOdd,
            tile: None,
            stipple: None,
            tile_stipple_x_origin: 0,
            tile_stipple_y_origin: 0,
            font: FontId::default(),
            subwindow_mode: SubwindowMode::ClipByChildren,
            graphics_exposures: true,
            clip_x_origin: 0,
            clip_y_origin: 0,
            clip_mask: None,
            dash_offset: 0,
            dashes: 4,
            arc_mode: ArcMode::PieSlice,
        }
    }
}

#[derive(Debug, Default)]
pub enum ClipMask {
    #[default]
    None,
    /// Relative to the clip origin.
    Region(Region),
    Pixmap(PixmapId),
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum GcError {
    #[error("GC {0} does not exist")]
    InvalidGc(GcId),
    #[error("Pixmap {0} does not exist")]
    InvalidPixmap(PixmapId),
    #[error("The dash list is empty")]
    EmptyDashes,
    #[error("The dash list contains a zero element")]
    ZeroDash,
    #[error("The dash list has more than {} elements", MAX_DASHES)]
    TooManyDashes,
}

/// A graphics context.
#[derive(Debug)]
pub struct Gc {
    pub values: GcValues,
    pub clip: ClipMask,
    pub dashes: ArrayVec<u8, MAX_DASHES>,
}

impl Gc {
    pub fn new(pool: &mut RegionPool, values: &GcValues) -> Self {
        let mut slf = Self {
            values: GcValues::default(),
            clip: ClipMask::None,
            dashes: ArrayVec::new(),
        };
        slf.dashes.push(4);
        slf.dashes.push(4);
        slf.change(pool, GcMask::all(), values);
        slf
    }

    /// Overwrites the fields selected by `mask` with those of `values`.
    pub fn change(&mut self, pool: &mut RegionPool, mask: GcMask, values: &GcValues) {
        let v = &mut self.values;
        macro_rules! apply {
            ($($flag:ident => $field:ident,)*) => {
                $(
                    if mask.contains(GcMask::$flag) {
                        v.$field = values.$field;
                    }
                )*
            };
        }
        apply! {
            FUNCTION => function,
            PLANE_MASK => plane_mask,
            FOREGROUND => foreground,
            BACKGROUND => background,
            LINE_WIDTH => line_width,
            LINE_STYLE => line_style,
            CAP_STYLE => cap_style,
            JOIN_STYLE => join_style,
            FILL_STYLE => fill_style,
            FILL_RULE => fill_rule,
            TILE => tile,
            STIPPLE => stipple,
            TILE_STIPPLE_X_ORIGIN => tile_stipple_x_origin,
            TILE_STIPPLE_Y_ORIGIN => tile_stipple_y_origin,
            FONT => font,
            SUBWINDOW_MODE => subwindow_mode,
            GRAPHICS_EXPOSURES => graphics_exposures,
            CLIP_X_ORIGIN => clip_x_origin,
            CLIP_Y_ORIGIN => clip_y_origin,
            DASH_OFFSET => dash_offset,
            ARC_MODE => arc_mode,
        }
        if mask.contains(GcMask::DASH_LIST) {
            v.dashes = values.dashes.max(1);
            self.dashes.clear();
            self.dashes.push(v.dashes);
            self.dashes.push(v.dashes);
        }
        if mask.contains(GcMask::CLIP_MASK) {
            v.clip_mask = values.clip_mask;
            let clip = match values.clip_mask {
                Some(pixmap) => ClipMask::Pixmap(pixmap),
                None => ClipMask::None,
            };
            self.set_clip(pool, clip);
        }
    }

    /// Copies the fields selected by `mask` from `src`. A region clip is
    /// copied into a new pooled region.
    pub fn copy_from(&mut self, pool: &mut RegionPool, src: &Gc, mask: GcMask) {
        self.change(pool, mask & !(GcMask::CLIP_MASK | GcMask::DASH_LIST), &src.values);
        if mask.contains(GcMask::DASH_LIST) {
            self.values.dashes = src.values.dashes;
            self.dashes = src.dashes.clone();
        }
        if mask.contains(GcMask::CLIP_MASK) {
            self.values.clip_mask = src.values.clip_mask;
            let clip = match &src.clip {
                ClipMask::None => ClipMask::None,
                ClipMask::Region(r) => ClipMask::Region(pool.copy(r)),
                ClipMask::Pixmap(p) => ClipMask::Pixmap(*p),
            };
            self.set_clip(pool, clip);
        }
    }

    fn set_clip(&mut self, pool: &mut RegionPool, clip: ClipMask) {
        if let ClipMask::Region(old) = std::mem::replace(&mut self.clip, clip) {
            pool.release(old);
        }
    }

    /// Installs a pooled copy of `region` as the clip, replacing any prior
    /// clip.
    pub fn set_clip_region(&mut self, pool: &mut RegionPool, region: &Region) {
        let copy = pool.copy(region);
        self.values.clip_mask = None;
        self.set_clip(pool, ClipMask::Region(copy));
    }

    /// Installs the union of `rects` as the clip and sets the clip origin.
    pub fn set_clip_rectangles(&mut self, pool: &mut RegionPool, x: i32, y: i32, rects: &[Rect]) {
        let region = pool.acquire_rects(rects);
        self.values.clip_x_origin = x;
        self.values.clip_y_origin = y;
        self.values.clip_mask = None;
        self.set_clip(pool, ClipMask::Region(region));
    }

    pub fn set_clip_pixmap(&mut self, pool: &mut RegionPool, pixmap: Option<PixmapId>) {
        self.values.clip_mask = pixmap;
        let clip = match pixmap {
            Some(p) => ClipMask::Pixmap(p),
            None => ClipMask::None,
        };
        self.set_clip(pool, clip);
    }

    pub fn set_clip_origin(&mut self, x: i32, y: i32) {
        self.values.clip_x_origin = x;
        self.values.clip_y_origin = y;
    }

    pub fn set_dashes(&mut self, offset: u16, dashes: &[u8]) -> Result<(), GcError> {
        if dashes.is_empty() {
            return Err(GcError::EmptyDashes);
        }
        if dashes.contains(&0) {
            return Err(GcError::ZeroDash);
        }
        let list =
            ArrayVec::<u8, MAX_DASHES>::try_from(dashes).map_err(|_| GcError::TooManyDashes)?;
        self.values.dash_offset = offset;
        self.dashes = list;
        Ok(())
    }

    pub fn clip_pixmap(&self) -> Option<PixmapId> {
        match self.clip {
            ClipMask::Pixmap(p) => Some(p),
            _ => None,
        }
    }

    /// Computes the region a draw call through this GC may touch.
    ///
    /// `base` is the drawable's drawable area in buffer coordinates, i.e. the
    /// visible region for windows and the bounds for pixmaps. `origin` is the
    /// buffer position of the drawable's coordinate origin. The result is in
    /// buffer coordinates.
    pub fn effective_clip(&self, pool: &mut RegionPool, base: &Region, origin: (i32, i32)) -> Region {
        let mut clip = pool.copy(base);
        if let ClipMask::Region(r) = &self.clip {
            let mut gc_clip = pool.copy(r);
            gc_clip.translate(
                origin.0 + self.values.clip_x_origin,
                origin.1 + self.values.clip_y_origin,
            );
            pool.intersect(&mut clip, &gc_clip);
            pool.release(gc_clip);
        }
        clip
    }

    /// Returns pooled regions to the pool.
    pub fn release(self, pool: &mut RegionPool) {
        if let ClipMask::Region(r) = self.clip {
            pool.release(r);
        }
    }
}
