use crate::{rect::Rect, tree::WindowId};

linear_ids!(PixmapIds, PixmapId, u64);

/// Anything drawing primitives can target.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Drawable {
    Window(WindowId),
    Pixmap(PixmapId),
}

impl From<WindowId> for Drawable {
    fn from(value: WindowId) -> Self {
        Self::Window(value)
    }
}

impl From<PixmapId> for Drawable {
    fn from(value: PixmapId) -> Self {
        Self::Pixmap(value)
    }
}

/// A server-side pixel buffer in ARGB8888.
#[derive(Clone)]
pub struct Pixmap {
    pub width: i32,
    pub height: i32,
    pub depth: u8,
    pub pixels: Vec<u32>,
}

impl Pixmap {
    pub fn new(width: i32, height: i32, depth: u8) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            depth,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new_sized(0, 0, self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.width as usize
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        Some(self.pixels[y as usize * self.stride() + x as usize])
    }
}
