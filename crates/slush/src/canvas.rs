//! # Track Canvas — Paintable Terrain Mask
//!
//! A mutable pixel buffer mapped onto the ground plane. The buffer starts as
//! a decoded mask image; while the vehicle drives, track lines are painted
//! into it, and the renderer re-uploads the buffer whenever it is dirty.
//!
//! The same buffer doubles as level data: decoration markers are encoded in
//! the blue channel of the source image, and [`TrackCanvas::blue_markers`]
//! reads them back out as world positions during setup.
//!
//! ## World ↔ Pixel Mapping
//!
//! The canvas covers a plane of `plane_size` world units centred on the
//! origin. The mapping is a uniform affine scale:
//!
//! ```text
//! pixel = (world + plane_size / 2) * (texture_size / plane_size)
//! ```
//!
//! with the inverse used when scanning markers back into world space. A
//! round-trip through both directions lands within one pixel of the input.

use std::path::Path;

use crate::math::{IVec2, Mat4, Vec2};

/// Color painted into the mask where the vehicle has driven (green channel).
pub const TRACK_COLOR: [u8; 4] = [0, 255, 0, 0];

/// Forward offsets (in pixels) of the three painted track lines. Three
/// overlapping lines cover the swath even at high per-tick displacement or
/// during sharp turns.
const TRACK_BAND: [f32; 3] = [8.0, 9.0, 10.0];

/// Half-width (in pixels) of each painted track line.
const TRACK_HALF_WIDTH: f32 = 10.0;

/// A paintable terrain-mask texture.
///
/// Starts empty; until [`load_image`](Self::load_image) (or
/// [`from_pixels`](Self::from_pixels)) succeeds, every paint operation is a
/// silent no-op. This mirrors how a missing mask degrades at runtime: the
/// level renders without track effects instead of crashing.
pub struct TrackCanvas {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    components: usize,
    plane_size: Vec2,
    dirty: bool,
}

impl TrackCanvas {
    /// Create an empty, unloaded canvas.
    pub fn new() -> Self {
        Self {
            pixels: Vec::new(),
            width: 0,
            height: 0,
            components: 3,
            plane_size: Vec2::ZERO,
            dirty: false,
        }
    }

    /// Create a canvas from raw pixel data (procedural masks, tests).
    ///
    /// `components` must be 3 (RGB) or 4 (RGBA) and `data` must hold
    /// `width * height * components` bytes.
    pub fn from_pixels(width: u32, height: u32, components: usize, data: Vec<u8>) -> Self {
        debug_assert!(components == 3 || components == 4);
        debug_assert_eq!(data.len(), (width * height) as usize * components);
        Self {
            pixels: data,
            width,
            height,
            components,
            plane_size: Vec2::ZERO,
            dirty: false,
        }
    }

    /// Decode an 8-bit image file into the canvas buffer.
    ///
    /// Returns `false` (leaving the canvas unloaded) if the file cannot be
    /// decoded; the failure is logged, not propagated.
    pub fn load_image(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let img = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Failed to load mask image '{}': {e}", path.display());
                return false;
            }
        };

        match img {
            image::DynamicImage::ImageRgba8(img) => {
                self.width = img.width();
                self.height = img.height();
                self.components = 4;
                self.pixels = img.into_raw();
            }
            other => {
                let rgb = other.to_rgb8();
                self.width = rgb.width();
                self.height = rgb.height();
                self.components = 3;
                self.pixels = rgb.into_raw();
            }
        }

        self.dirty = true;
        log::info!(
            "Loaded {}x{} mask ({} components) from '{}'",
            self.width,
            self.height,
            self.components,
            path.display()
        );
        true
    }

    /// Record the world-space size of the plane this canvas is mapped onto.
    ///
    /// Must be set before [`paint_at`](Self::paint_at) or any coordinate
    /// mapping is meaningful.
    pub fn set_plane_size(&mut self, plane_size: Vec2) {
        self.plane_size = plane_size;
    }

    /// `true` once an image (or raw pixel data) backs the canvas.
    pub fn is_loaded(&self) -> bool {
        !self.pixels.is_empty()
    }

    /// The world-space size of the mapped plane.
    pub fn plane_world_size(&self) -> Vec2 {
        self.plane_size
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// The raw pixel buffer, for texture upload.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns `true` once per mutation batch; the caller re-uploads the
    /// buffer to the rendering backend when it sees `true`.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // ── Coordinate mapping ──────────────────────────────────────────────

    /// Map a world-space position on the plane to a pixel coordinate.
    pub fn world_to_pixel(&self, world: Vec2) -> IVec2 {
        let tex = Vec2::new(self.width as f32, self.height as f32);
        ((world + self.plane_size / 2.0) * (tex / self.plane_size)).as_ivec2()
    }

    /// Map a pixel coordinate back to the world-space position of its
    /// corner. Inverse of [`world_to_pixel`](Self::world_to_pixel) up to
    /// one pixel of truncation.
    pub fn pixel_to_world(&self, pixel: IVec2) -> Vec2 {
        let tex = Vec2::new(self.width as f32, self.height as f32);
        -self.plane_size / 2.0 + pixel.as_vec2() / tex * self.plane_size
    }

    // ── Painting ────────────────────────────────────────────────────────

    /// Write one pixel. Out-of-bounds coordinates are silently ignored;
    /// painting routinely clips at the canvas edges.
    pub fn paint_pixel(&mut self, at: IVec2, color: &[u8]) {
        if self.pixels.is_empty() {
            return;
        }
        if at.x < 0 || at.x >= self.width as i32 || at.y < 0 || at.y >= self.height as i32 {
            return;
        }

        let offset = (at.y as usize * self.width as usize + at.x as usize) * self.components;
        let n = color.len().min(self.components);
        self.pixels[offset..offset + n].copy_from_slice(&color[..n]);
    }

    /// Rasterize a line of pixels between two canvas coordinates.
    ///
    /// Integer Bresenham stepping: the walk is normalized to the major axis
    /// in increasing order, so reversing the endpoints touches the same set
    /// of pixels. The interval is half-open; the final pixel belongs to the
    /// next segment.
    pub fn paint_line(&mut self, from: IVec2, to: IVec2, color: &[u8]) {
        let (mut x1, mut y1) = (from.x, from.y);
        let (mut x2, mut y2) = (to.x, to.y);

        let steep = (y2 - y1).abs() > (x2 - x1).abs();
        if steep {
            std::mem::swap(&mut x1, &mut y1);
            std::mem::swap(&mut x2, &mut y2);
        }
        if x1 > x2 {
            std::mem::swap(&mut x1, &mut x2);
            std::mem::swap(&mut y1, &mut y2);
        }

        let dx = x2 - x1;
        let dy = (y2 - y1).abs();
        let y_step = if y1 < y2 { 1 } else { -1 };

        let mut error = dx / 2;
        let mut y = y1;
        for x in x1..x2 {
            if steep {
                self.paint_pixel(IVec2::new(y, x), color);
            } else {
                self.paint_pixel(IVec2::new(x, y), color);
            }

            error -= dy;
            if error < 0 {
                y += y_step;
                error += dx;
            }
        }
    }

    /// Paint the track swath under a vehicle model matrix.
    ///
    /// The translation column gives the position; columns 0 and 1 projected
    /// to the ground plane give the right and forward directions. Three
    /// parallel lines ahead of the position over-paint the swath so no
    /// pixels are skipped between ticks.
    pub fn paint_at(&mut self, model: &Mat4) {
        if self.pixels.is_empty() || self.plane_size.x <= 0.0 || self.plane_size.y <= 0.0 {
            return;
        }

        let pos = self
            .world_to_pixel(Vec2::new(model.w_axis.x, model.w_axis.y))
            .as_vec2();
        let forward = Vec2::new(model.y_axis.x, model.y_axis.y);
        let right = Vec2::new(model.x_axis.x, model.x_axis.y);

        for offset in TRACK_BAND {
            let center = pos + forward * offset;
            self.paint_line(
                (center + right * TRACK_HALF_WIDTH).as_ivec2(),
                (center - right * TRACK_HALF_WIDTH).as_ivec2(),
                &TRACK_COLOR,
            );
        }

        self.dirty = true;
    }

    // ── Marker scan ─────────────────────────────────────────────────────

    /// Scan every pixel with `pred` and return the world positions of the
    /// matches. Computed once at level setup; the result is a plain list.
    pub fn scan_markers<F>(&self, pred: F) -> Vec<Vec2>
    where
        F: Fn(&[u8]) -> bool,
    {
        let mut result = Vec::new();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let offset = (y as usize * self.width as usize + x as usize) * self.components;
                if pred(&self.pixels[offset..offset + self.components]) {
                    result.push(self.pixel_to_world(IVec2::new(x, y)));
                }
            }
        }
        result
    }

    /// World positions of the decoration markers: pixels whose blue channel
    /// exceeds a low threshold.
    pub fn blue_markers(&self) -> Vec<Vec2> {
        self.scan_markers(|px| px[2] > 1)
    }
}

impl Default for TrackCanvas {
    fn default() -> Self {
        Self::new()
    }
}
