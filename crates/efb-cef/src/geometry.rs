//! Panel geometry and the normalized ⇄ browser pixel mapping.
//!
//! Host input arrives in normalized panel coordinates: `x` runs left to right
//! and `y` runs bottom to top over the whole device panel. The browser only
//! occupies a vertical slice of that panel (the [`PanelBand`]), and renders
//! into a surface whose pixel rows grow downward.

use crate::error::{BrowserError, Result};
use bytemuck::{Pod, Zeroable};

/// Height/width ratio of an 800x480 tablet.
pub const FIXED_ASPECT_RATIO: f32 = 0.6;

/// Vertical slice of the panel that the browser occupies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelBand {
    offset_start: f32,
    offset_end: f32,
}

impl PanelBand {
    /// The browser covers the whole panel.
    pub const FULL: PanelBand = PanelBand {
        offset_start: 0.0,
        offset_end: 1.0,
    };

    /// Create a band. Some device skins place the screen slightly outside the
    /// panel, so only `offset_end > offset_start` is enforced.
    pub fn new(offset_start: f32, offset_end: f32) -> Result<Self> {
        if !offset_start.is_finite() || !offset_end.is_finite() || offset_end <= offset_start {
            return Err(BrowserError::InvalidGeometry(format!(
                "band end {offset_end} must be greater than start {offset_start}"
            )));
        }
        Ok(Self {
            offset_start,
            offset_end,
        })
    }

    pub fn offset_start(&self) -> f32 {
        self.offset_start
    }

    pub fn offset_end(&self) -> f32 {
        self.offset_end
    }

    pub fn span(&self) -> f32 {
        self.offset_end - self.offset_start
    }
}

impl Default for PanelBand {
    fn default() -> Self {
        Self::FULL
    }
}

/// True iff `0 ≤ x ≤ 1` and `y` lies within the band.
pub fn is_inside_band(norm_x: f32, norm_y: f32, band: &PanelBand) -> bool {
    (0.0..=1.0).contains(&norm_x) && (band.offset_start..=band.offset_end).contains(&norm_y)
}

/// Map normalized panel coordinates to browser pixels.
pub fn to_browser_pixels(
    norm_x: f32,
    norm_y: f32,
    band: &PanelBand,
    surface: &SurfaceDescriptor,
) -> (f32, f32) {
    let px = surface.browser_width as f32 * norm_x;
    let py = surface.browser_height as f32 * (1.0 - (norm_y - band.offset_start) / band.span());
    (px, py)
}

/// Inverse of [`to_browser_pixels`].
pub fn from_browser_pixels(
    px: f32,
    py: f32,
    band: &PanelBand,
    surface: &SurfaceDescriptor,
) -> (f32, f32) {
    let norm_x = px / surface.browser_width as f32;
    let norm_y = band.offset_start + (1.0 - py / surface.browser_height as f32) * band.span();
    (norm_x, norm_y)
}

/// Logical browser size and the power-of-two texture backing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    pub texture_width: u32,
    pub texture_height: u32,
    pub browser_width: u32,
    pub browser_height: u32,
}

impl SurfaceDescriptor {
    /// Surface for a browser rendering at exactly `width` x `height`.
    pub fn new(browser_width: u32, browser_height: u32) -> Result<Self> {
        if browser_width == 0 || browser_height == 0 {
            return Err(BrowserError::InvalidGeometry(format!(
                "surface {browser_width}x{browser_height} is empty"
            )));
        }
        Ok(Self {
            texture_width: browser_width.next_power_of_two(),
            texture_height: browser_height.next_power_of_two(),
            browser_width,
            browser_height,
        })
    }

    /// Surface for a panel of `width` x `height` host pixels. Panels narrower
    /// than `minimum_width` are upscaled proportionally (0 disables this).
    pub fn from_panel(width: f32, height: f32, minimum_width: u32) -> Result<Self> {
        if !(width >= 1.0 && height >= 1.0) {
            return Err(BrowserError::InvalidGeometry(format!(
                "panel {width}x{height} is too small"
            )));
        }
        let multiplier = if width < minimum_width as f32 {
            minimum_width as f32 / width
        } else {
            1.0
        };
        let surface = Self::new(
            (width * multiplier).ceil() as u32,
            (height * multiplier).ceil() as u32,
        )?;
        if multiplier > 1.0 {
            log::debug!(
                "panel narrower than {}px, upscaling browser to {}x{}",
                minimum_width,
                surface.browser_width,
                surface.browser_height
            );
        }
        Ok(surface)
    }

    /// Fraction of the texture covered by the browser, as `(u, v)`.
    pub fn texture_extent(&self) -> (f32, f32) {
        (
            self.browser_width as f32 / self.texture_width as f32,
            self.browser_height as f32 / self.texture_height as f32,
        )
    }
}

/// Panel placement in host pixels, origin at the bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PanelGeometry {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink the height to [`FIXED_ASPECT_RATIO`] of the width, keeping the
    /// panel vertically centred.
    pub fn with_fixed_aspect(self) -> Self {
        let aspect_height = self.width * FIXED_ASPECT_RATIO;
        Self {
            y: self.y + (self.height - aspect_height) / 2.0,
            height: aspect_height,
            ..self
        }
    }
}

/// One corner of the panel quad.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

/// Where and how to draw the browser texture in host pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawQuad {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub u: f32,
    pub v: f32,
    pub brightness: f32,
}

impl DrawQuad {
    pub fn new(
        panel: &PanelGeometry,
        band: &PanelBand,
        surface: &SurfaceDescriptor,
        brightness: f32,
    ) -> Self {
        let x1 = panel.x;
        let y1 = panel.y + panel.height * band.offset_start;
        let (u, v) = surface.texture_extent();
        Self {
            x1,
            y1,
            x2: x1 + panel.width,
            y2: y1 + panel.height * band.span(),
            u,
            v,
            brightness: brightness.clamp(0.0, 1.0),
        }
    }

    /// Triangle-strip corners: bottom-left, top-left, bottom-right, top-right.
    /// Texture rows are stored top-down, so the bottom edge samples `v`.
    pub fn vertices(&self) -> [QuadVertex; 4] {
        [
            QuadVertex {
                position: [self.x1, self.y1],
                tex_coords: [0.0, self.v],
            },
            QuadVertex {
                position: [self.x1, self.y2],
                tex_coords: [0.0, 0.0],
            },
            QuadVertex {
                position: [self.x2, self.y1],
                tex_coords: [self.u, self.v],
            },
            QuadVertex {
                position: [self.x2, self.y2],
                tex_coords: [self.u, 0.0],
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn device_bands() -> Vec<PanelBand> {
        [(0.0, 0.935), (0.022, 0.977), (0.05, 1.0), (-0.11, 1.06), (0.0, 1.0)]
            .into_iter()
            .map(|(s, e)| PanelBand::new(s, e).unwrap())
            .collect()
    }

    #[test]
    fn band_rejects_inverted_range() {
        assert!(PanelBand::new(0.5, 0.5).is_err());
        assert!(PanelBand::new(0.9, 0.1).is_err());
        assert!(PanelBand::new(f32::NAN, 1.0).is_err());
    }

    #[test]
    fn band_edges_map_to_surface_edges() {
        let band = PanelBand::new(0.2, 0.8).unwrap();
        let surface = SurfaceDescriptor::new(800, 600).unwrap();
        assert_eq!(to_browser_pixels(0.0, 0.8, &band, &surface), (0.0, 0.0));
        let (px, py) = to_browser_pixels(1.0, 0.2, &band, &surface);
        assert_eq!(px, 800.0);
        assert!((py - 600.0).abs() < 1e-3);
    }

    #[test]
    fn surface_uses_next_power_of_two() {
        let surface = SurfaceDescriptor::from_panel(800.0, 480.0, 0).unwrap();
        assert_eq!((surface.browser_width, surface.browser_height), (800, 480));
        assert_eq!((surface.texture_width, surface.texture_height), (1024, 512));

        let exact = SurfaceDescriptor::new(512, 256).unwrap();
        assert_eq!((exact.texture_width, exact.texture_height), (512, 256));
    }

    #[test]
    fn narrow_panel_is_upscaled() {
        let surface = SurfaceDescriptor::from_panel(400.0, 240.0, 800).unwrap();
        assert_eq!((surface.browser_width, surface.browser_height), (800, 480));
        assert_eq!((surface.texture_width, surface.texture_height), (1024, 512));
    }

    #[test]
    fn empty_panel_is_rejected() {
        assert!(SurfaceDescriptor::from_panel(0.0, 480.0, 0).is_err());
        assert!(SurfaceDescriptor::new(800, 0).is_err());
    }

    #[test]
    fn fixed_aspect_recentres_vertically() {
        let panel = PanelGeometry::new(100.0, 50.0, 1000.0, 800.0).with_fixed_aspect();
        assert_eq!(panel.height, 600.0);
        assert_eq!(panel.y, 150.0);
        assert_eq!(panel.x, 100.0);
    }

    #[test]
    fn draw_quad_covers_band_and_flips_v() {
        let panel = PanelGeometry::new(10.0, 20.0, 800.0, 480.0);
        let band = PanelBand::new(0.0, 0.935).unwrap();
        let surface = SurfaceDescriptor::new(800, 480).unwrap();
        let quad = DrawQuad::new(&panel, &band, &surface, 1.5);

        assert_eq!((quad.x1, quad.y1, quad.x2), (10.0, 20.0, 810.0));
        assert!((quad.y2 - (20.0 + 480.0 * 0.935)).abs() < 1e-3);
        assert_eq!(quad.u, 800.0 / 1024.0);
        assert_eq!(quad.v, 480.0 / 512.0);
        assert_eq!(quad.brightness, 1.0);

        let verts = quad.vertices();
        assert_eq!(verts[0].tex_coords, [0.0, quad.v]);
        assert_eq!(verts[1].tex_coords, [0.0, 0.0]);
    }

    proptest! {
        #[test]
        fn coordinate_round_trip(t in 0.001f32..0.999, x in 0.0f32..=1.0, idx in 0usize..5) {
            let band = device_bands()[idx];
            let surface = SurfaceDescriptor::new(800, 480).unwrap();
            let norm_y = band.offset_start() + t * band.span();

            let (px, py) = to_browser_pixels(x, norm_y, &band, &surface);
            let (back_x, back_y) = from_browser_pixels(px, py, &band, &surface);

            prop_assert!((back_x - x).abs() < 1e-4);
            prop_assert!((back_y - norm_y).abs() < 1e-4);
        }

        #[test]
        fn outside_band_is_rejected(x in -2.0f32..3.0, y in -2.0f32..3.0, idx in 0usize..5) {
            let band = device_bands()[idx];
            let inside = is_inside_band(x, y, &band);
            if y < band.offset_start() || y > band.offset_end() || !(0.0..=1.0).contains(&x) {
                prop_assert!(!inside);
            } else {
                prop_assert!(inside);
            }
        }
    }
}
