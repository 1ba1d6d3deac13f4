//! Dirty-rectangle compositing into the panel texture.
//!
//! The engine paints two layers: the page and, while a dropdown is open, a
//! popup layer whose bitmap is positioned at [`PopupGeometry`]. Both are
//! blitted into the top-left `browser_width x browser_height` region of a
//! power-of-two texture. Source rows are always `frame.width` pixels long,
//! even when the dirty rect is narrower.

use crate::frame::{DirtyRect, PaintFrame, PaintLayer, PopupGeometry};
use crate::geometry::SurfaceDescriptor;

/// Number of paints logged at debug level before going quiet.
const LOGGED_PAINTS: usize = 5;

/// A clipped copy from a paint buffer into the texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitRegion {
    pub dst_x: u32,
    pub dst_y: u32,
    pub width: u32,
    pub height: u32,
    pub src_x: u32,
    pub src_y: u32,
}

impl BlitRegion {
    fn source_offset(&self, row_pixels: u32) -> usize {
        (self.src_y as usize * row_pixels as usize + self.src_x as usize) * 4
    }
}

/// Something that BGRA pixel rows can be uploaded into.
pub trait TextureTarget {
    /// Texture size in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Copy `region.width x region.height` pixels to `(dst_x, dst_y)`.
    /// `pixels` starts at the region's first source pixel and its rows are
    /// `row_pixels` wide.
    fn write_region(&mut self, region: &BlitRegion, pixels: &[u8], row_pixels: u32);
}

/// Summary of one [`SurfaceCompositor::apply_paint`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaintOutcome {
    /// The whole layer was uploaded in one blit.
    pub full_upload: bool,
    /// Number of blits issued.
    pub blits: usize,
    /// A main-layer blit overwrote part of the open popup.
    pub popup_damaged: bool,
}

pub struct SurfaceCompositor {
    surface: SurfaceDescriptor,
    popup_shown: bool,
    popup: PopupGeometry,
    force_full_upload: bool,
    paint_count: usize,
}

impl SurfaceCompositor {
    pub fn new(surface: SurfaceDescriptor) -> Self {
        Self {
            surface,
            popup_shown: false,
            popup: PopupGeometry::default(),
            force_full_upload: false,
            paint_count: 0,
        }
    }

    pub fn surface(&self) -> &SurfaceDescriptor {
        &self.surface
    }

    pub fn is_popup_shown(&self) -> bool {
        self.popup_shown
    }

    pub fn popup_geometry(&self) -> PopupGeometry {
        self.popup
    }

    pub fn needs_full_upload(&self) -> bool {
        self.force_full_upload
    }

    /// A popup opened. The caller should ask the engine to repaint the popup layer.
    pub fn popup_shown(&mut self) {
        self.popup_shown = true;
    }

    /// A popup closed. Its pixels were drawn over the page, so the next main
    /// paint is uploaded in full to restore what was underneath. Popup-layer
    /// paints in between are skipped and leave the pending upload in place.
    pub fn popup_hidden(&mut self) {
        self.popup_shown = false;
        self.force_full_upload = true;
    }

    pub fn set_popup_geometry(&mut self, popup: PopupGeometry) {
        self.popup = popup;
    }

    pub fn apply_paint<T: TextureTarget + ?Sized>(
        &mut self,
        frame: &PaintFrame<'_>,
        target: &mut T,
    ) -> PaintOutcome {
        let mut outcome = PaintOutcome::default();

        if !frame.is_complete() {
            log::warn!(
                "dropping {:?} paint: {} bytes for {}x{}",
                frame.layer,
                frame.buffer.len(),
                frame.width,
                frame.height
            );
            return outcome;
        }

        self.paint_count += 1;
        if self.paint_count <= LOGGED_PAINTS {
            log::debug!(
                "paint #{} {:?} ({}x{}) rects={}",
                self.paint_count,
                frame.layer,
                frame.width,
                frame.height,
                frame.dirty_rects.len()
            );
        }

        // Blits stay inside the browser region even when the texture is padded.
        let (tex_w, tex_h) = target.dimensions();
        let (max_w, max_h) = (
            tex_w.min(self.surface.browser_width),
            tex_h.min(self.surface.browser_height),
        );

        if self.force_full_upload && frame.layer == PaintLayer::Main {
            self.force_full_upload = false;
            let full = DirtyRect::new(0, 0, frame.width, frame.height, PaintLayer::Main);
            if let Some(region) = clip(&full, 0, 0, frame, max_w, max_h) {
                target.write_region(&region, &frame.buffer[region.source_offset(frame.width)..], frame.width);
                outcome.blits = 1;
            }
            outcome.full_upload = true;
            return outcome;
        }

        for rect in frame.dirty_rects.iter().filter(|r| r.is_valid()) {
            let (dst_x, dst_y) = match rect.layer {
                PaintLayer::Popup => {
                    if !self.popup_shown {
                        continue;
                    }
                    (
                        self.popup.x as i64 + rect.x as i64,
                        self.popup.y as i64 + rect.y as i64,
                    )
                }
                PaintLayer::Main => {
                    if self.popup_shown && rect.intersects(&self.popup) {
                        outcome.popup_damaged = true;
                    }
                    (rect.x as i64, rect.y as i64)
                }
            };

            if let Some(region) = clip(rect, dst_x, dst_y, frame, max_w, max_h) {
                target.write_region(&region, &frame.buffer[region.source_offset(frame.width)..], frame.width);
                outcome.blits += 1;
            }
        }

        outcome.full_upload = frame.layer == PaintLayer::Main && frame.is_full_frame();
        outcome
    }
}

/// Clip `rect` to the source frame and, placed at `(dst_x, dst_y)`, to a
/// `max_w x max_h` destination.
fn clip(
    rect: &DirtyRect,
    dst_x: i64,
    dst_y: i64,
    frame: &PaintFrame<'_>,
    max_w: u32,
    max_h: u32,
) -> Option<BlitRegion> {
    let src_x0 = rect.x as i64;
    let src_y0 = rect.y as i64;
    let src_x1 = (src_x0 + rect.width as i64).min(frame.width as i64);
    let src_y1 = (src_y0 + rect.height as i64).min(frame.height as i64);

    // Skip source pixels that would land left of / above the texture.
    let skip_x = (-dst_x).max(0);
    let skip_y = (-dst_y).max(0);
    let src_x0 = src_x0 + skip_x;
    let src_y0 = src_y0 + skip_y;
    let dst_x = dst_x + skip_x;
    let dst_y = dst_y + skip_y;

    let width = (src_x1 - src_x0).min(max_w as i64 - dst_x);
    let height = (src_y1 - src_y0).min(max_h as i64 - dst_y);
    if width <= 0 || height <= 0 {
        return None;
    }

    Some(BlitRegion {
        dst_x: dst_x as u32,
        dst_y: dst_y as u32,
        width: width as u32,
        height: height as u32,
        src_x: src_x0 as u32,
        src_y: src_y0 as u32,
    })
}

/// A texture kept in memory, for software hosts and tests.
#[derive(Debug, Clone)]
pub struct CpuTexture {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl CpuTexture {
    /// A white texture, as shown before the first paint.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0xFF; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    pub fn for_surface(surface: &SurfaceDescriptor) -> Self {
        Self::new(surface.texture_width, surface.texture_height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[offset..offset + 4]);
        px
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

impl TextureTarget for CpuTexture {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn write_region(&mut self, region: &BlitRegion, pixels: &[u8], row_pixels: u32) {
        let row_len = region.width as usize * 4;
        for row in 0..region.height as usize {
            let src = row * row_pixels as usize * 4;
            let dst = ((region.dst_y as usize + row) * self.width as usize + region.dst_x as usize) * 4;
            if src + row_len > pixels.len() || dst + row_len > self.pixels.len() {
                break;
            }
            self.pixels[dst..dst + row_len].copy_from_slice(&pixels[src..src + row_len]);
        }
    }
}
