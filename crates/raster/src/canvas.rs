//! Minimal RGBA canvas with deterministic scanline fills.

use glam::Vec2;

/// One RGBA pixel, 8 bits per channel.
pub type Rgba = [u8; 4];

/// Heap-backed RGBA raster with top-left origin.
pub struct Canvas {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Canvas {
    /// Creates a canvas cleared to transparent black.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 4],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw interleaved RGBA bytes, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn pixels_mut(&mut self) -> &mut [Rgba] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Fills the whole canvas with one color.
    pub fn clear(&mut self, color: Rgba) {
        for px in self.pixels_mut() {
            *px = color;
        }
    }

    /// Fills a polygon using even-odd scanline coverage.
    ///
    /// A pixel is covered when its center lies inside the polygon, so the
    /// result is independent of vertex order and winding.
    pub fn fill_polygon(&mut self, pts: &[Vec2], color: Rgba) {
        if pts.len() < 3 {
            return;
        }
        let min_y = pts.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = pts.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        let row_start = min_y.floor().max(0.0) as usize;
        let row_end = max_y.ceil().clamp(0.0, self.height as f32) as usize;

        let mut crossings: Vec<f32> = Vec::with_capacity(pts.len());
        for row in row_start..row_end {
            let sample_y = row as f32 + 0.5;
            crossings.clear();
            for i in 0..pts.len() {
                let a = pts[i];
                let b = pts[(i + 1) % pts.len()];
                // Half-open edge rule so shared vertices count once.
                if (a.y <= sample_y) != (b.y <= sample_y) {
                    let t = (sample_y - a.y) / (b.y - a.y);
                    crossings.push(a.x + t * (b.x - a.x));
                }
            }
            crossings.sort_by(f32::total_cmp);
            for pair in crossings.chunks_exact(2) {
                self.fill_span(row, pair[0], pair[1], color);
            }
        }
    }

    /// Fills a disc; a pixel is covered when its center is within `radius`.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        let row_start = (center.y - radius).floor().max(0.0) as usize;
        let row_end = (center.y + radius).ceil().clamp(0.0, self.height as f32) as usize;
        let r2 = radius * radius;
        for row in row_start..row_end {
            let dy = row as f32 + 0.5 - center.y;
            let rem = r2 - dy * dy;
            if rem < 0.0 {
                continue;
            }
            let half = rem.sqrt();
            self.fill_span(row, center.x - half, center.x + half, color);
        }
    }

    /// Fills one pixel row across the full width, a 1px horizontal rule.
    pub fn fill_row(&mut self, y: f32, color: Rgba) {
        if y < 0.0 || y >= self.height as f32 {
            return;
        }
        self.fill_span(y.floor() as usize, 0.0, self.width as f32, color);
    }

    fn fill_span(&mut self, row: usize, x0: f32, x1: f32, color: Rgba) {
        if row >= self.height {
            return;
        }
        // Pixel centers sit at k + 0.5; cover those in [x0, x1).
        let start = ((x0 - 0.5).ceil().max(0.0) as usize).min(self.width);
        let end = ((x1 - 0.5).ceil().clamp(0.0, self.width as f32) as usize).min(self.width);
        let base = row * self.width;
        let pixels = self.pixels_mut();
        for px in &mut pixels[base + start..base + end.max(start)] {
            *px = color;
        }
    }
}
