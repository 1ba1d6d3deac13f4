//! Paint buffers delivered by the engine.

/// Which layer a paint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaintLayer {
    /// The page itself.
    #[default]
    Main,
    /// Transient widgets such as `<select>` dropdowns.
    Popup,
}

/// A dirty rectangle region that needs updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub layer: PaintLayer,
}

impl DirtyRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32, layer: PaintLayer) -> Self {
        Self {
            x,
            y,
            width,
            height,
            layer,
        }
    }

    /// Check if this rect is valid (non-zero size).
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Whether this rect overlaps the popup area.
    pub fn intersects(&self, popup: &PopupGeometry) -> bool {
        let (x, y) = (self.x as i64, self.y as i64);
        let (px, py) = (popup.x as i64, popup.y as i64);
        x < px + popup.width as i64
            && px < x + self.width as i64
            && y < py + popup.height as i64
            && py < y + self.height as i64
    }
}

/// Placement of an open popup in browser pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopupGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// One paint callback: the full layer bitmap plus what changed in it.
#[derive(Debug, Clone)]
pub struct PaintFrame<'a> {
    pub layer: PaintLayer,
    /// Raw pixel data in BGRA format (CEF native format), `width * height * 4` bytes.
    pub buffer: &'a [u8],
    /// Width in pixels; also the row length of `buffer`.
    pub width: u32,
    pub height: u32,
    pub dirty_rects: Vec<DirtyRect>,
}

impl PaintFrame<'_> {
    /// Whether the buffer holds as many bytes as its dimensions claim.
    pub fn is_complete(&self) -> bool {
        self.buffer.len() >= self.width as usize * self.height as usize * 4
    }

    /// Whether one of the dirty rects covers the whole layer.
    pub fn is_full_frame(&self) -> bool {
        self.dirty_rects
            .iter()
            .any(|r| r.x == 0 && r.y == 0 && r.width >= self.width && r.height >= self.height)
    }
}
