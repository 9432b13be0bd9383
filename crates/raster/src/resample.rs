//! Area-average downsampling.
//!
//! Each output pixel is the integral of the source image over its
//! footprint rectangle divided by the footprint area, with fractional
//! source pixels weighted by their overlap. This is the smooth filter the
//! observation contract requires; nearest-neighbor sampling would alias
//! the thin pole and ground line away.

use crate::canvas::Canvas;

/// Downsamples `src` to `dst_w` × `dst_h` RGBA bytes with a box filter.
#[must_use]
pub fn downsample_area(src: &Canvas, dst_w: usize, dst_h: usize) -> Vec<u8> {
    let (sw, sh) = (src.width(), src.height());
    let data = src.data();
    let scale_x = sw as f64 / dst_w as f64;
    let scale_y = sh as f64 / dst_h as f64;
    let inv_area = 1.0 / (scale_x * scale_y);

    let mut out = vec![0u8; dst_w * dst_h * 4];
    for oy in 0..dst_h {
        let y0 = oy as f64 * scale_y;
        let y1 = y0 + scale_y;
        let sy_start = y0.floor() as usize;
        let sy_end = (y1.ceil() as usize).min(sh);

        for ox in 0..dst_w {
            let x0 = ox as f64 * scale_x;
            let x1 = x0 + scale_x;
            let sx_start = x0.floor() as usize;
            let sx_end = (x1.ceil() as usize).min(sw);

            let mut acc = [0.0f64; 4];
            for sy in sy_start..sy_end {
                let wy = overlap(sy as f64, y0, y1);
                let row = sy * sw * 4;
                for sx in sx_start..sx_end {
                    let w = wy * overlap(sx as f64, x0, x1);
                    let px = row + sx * 4;
                    for c in 0..4 {
                        acc[c] += w * f64::from(data[px + c]);
                    }
                }
            }

            let dst = (oy * dst_w + ox) * 4;
            for c in 0..4 {
                out[dst + c] = (acc[c] * inv_area).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

/// Length of the intersection of the unit interval at `lo` with `[a, b]`.
fn overlap(lo: f64, a: f64, b: f64) -> f64 {
    (b.min(lo + 1.0) - a.max(lo)).max(0.0)
}
