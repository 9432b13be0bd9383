//! The cartpole scene.
//!
//! Geometry, colors and coordinate conventions follow the classic gym
//! rendering of this environment: the scene is drawn y-up and flipped
//! vertically into raster space, the cart slides along a ground line at
//! mid-height, and the pole rotates by the negative of the state angle
//! around an axle anchored above the cart center.

use crate::canvas::{Canvas, Rgba};
use crate::observation::{Observation, IMG_H, IMG_W};
use crate::resample::downsample_area;
use glam::{Mat2, Vec2};

/// Intermediate canvas width in pixels.
pub const CANVAS_W: usize = 600;
/// Intermediate canvas height in pixels.
pub const CANVAS_H: usize = 400;

/// Half of the world width in meters; the visible track spans ±2.4.
const X_THRESHOLD: f32 = 2.4;

const CART_W: f32 = 50.0;
const CART_H: f32 = 30.0;
const POLE_W: f32 = 10.0;

const BACKGROUND: Rgba = [255, 255, 255, 255];
const CART_COLOR: Rgba = [0, 0, 0, 255];
const POLE_COLOR: Rgba = [202, 152, 101, 255];
const AXLE_COLOR: Rgba = [129, 132, 203, 255];
const GROUND_COLOR: Rgba = [0, 0, 0, 255];

/// Renders a cartpole state to a fresh 96×96 observation.
#[must_use]
pub fn render(position: f32, angle: f32) -> Observation {
    let mut canvas = Canvas::new(CANVAS_W, CANVAS_H);
    render_into(&mut canvas, position, angle)
}

/// Renders into a caller-provided 600×400 canvas and downsamples.
///
/// Reusing the canvas across frames avoids reallocating the intermediate
/// raster; its previous contents are cleared.
pub fn render_into(canvas: &mut Canvas, position: f32, angle: f32) -> Observation {
    canvas.clear(BACKGROUND);

    let world_width = X_THRESHOLD * 2.0;
    let scale = CANVAS_W as f32 / world_width;
    let pole_len = scale * 2.0 * dynamics::CartPoleParams::default().half_length;

    let cart_x = position * scale + CANVAS_W as f32 / 2.0;
    let cart_y = CANVAS_H as f32 / 2.0;
    let axle_offset = CART_H / 4.0;

    // Drawing happens y-up; flip into the raster's top-left convention.
    let flip = |p: Vec2| Vec2::new(p.x, CANVAS_H as f32 - p.y);

    let (l, r) = (-CART_W / 2.0, CART_W / 2.0);
    let (t, b) = (CART_H / 2.0, -CART_H / 2.0);
    let cart = [
        flip(Vec2::new(l + cart_x, b + cart_y)),
        flip(Vec2::new(l + cart_x, t + cart_y)),
        flip(Vec2::new(r + cart_x, t + cart_y)),
        flip(Vec2::new(r + cart_x, b + cart_y)),
    ];
    canvas.fill_polygon(&cart, CART_COLOR);

    // Pole rectangle in its local frame, rotated by -angle about the axle.
    let anchor = Vec2::new(cart_x, cart_y + axle_offset);
    let rot = Mat2::from_angle(-angle);
    let (pl, pr) = (-POLE_W / 2.0, POLE_W / 2.0);
    let (pt, pb) = (pole_len - POLE_W / 2.0, -POLE_W / 2.0);
    let pole = [
        flip(rot * Vec2::new(pl, pb) + anchor),
        flip(rot * Vec2::new(pl, pt) + anchor),
        flip(rot * Vec2::new(pr, pt) + anchor),
        flip(rot * Vec2::new(pr, pb) + anchor),
    ];
    canvas.fill_polygon(&pole, POLE_COLOR);

    canvas.fill_circle(flip(anchor), POLE_W / 2.0, AXLE_COLOR);

    canvas.fill_row(flip(Vec2::new(0.0, cart_y)).y, GROUND_COLOR);

    let data = downsample_area(canvas, IMG_W, IMG_H);
    Observation::from_resampled(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render(0.0, 0.0), render(0.0, 0.0));
        assert_eq!(render(1.0, 0.3), render(1.0, 0.3));
    }

    #[test]
    fn distinct_states_render_distinct_frames() {
        assert_ne!(render(0.0, 0.0), render(1.0, 0.3));
        assert_ne!(render(0.0, 0.0), render(0.0, 0.2));
    }

    #[test]
    fn corners_stay_background_white() {
        let obs = render(0.0, 0.0);
        for (x, y) in [(0, 0), (IMG_W - 1, 0), (0, 5), (IMG_W - 1, 5)] {
            for c in 0..3 {
                assert_eq!(obs.channel(x, y, c), 255, "corner ({x},{y}) not white");
            }
        }
    }

    #[test]
    fn cart_is_dark_at_the_frame_center() {
        let obs = render(0.0, 0.0);
        // Mid-height maps to the cart body; the cart is black.
        let y = IMG_H / 2;
        let x = IMG_W / 2;
        assert!(obs.channel(x, y, 0) < 100, "cart not dark at center");
    }

    #[test]
    fn positive_position_moves_the_cart_right() {
        let centered = render(0.0, 0.0);
        let shifted = render(1.0, 0.0);

        let darkest_col = |obs: &Observation| {
            (0..IMG_W)
                .min_by_key(|&x| {
                    (0..IMG_H)
                        .map(|y| u32::from(obs.channel(x, y, 0)))
                        .sum::<u32>()
                })
                .unwrap()
        };
        assert!(darkest_col(&shifted) > darkest_col(&centered));
    }

    #[test]
    fn upright_pole_rises_above_the_cart() {
        let obs = render(0.0, 0.0);
        // A third of the way down the frame the only non-white pixels are
        // the pole; check the column at the center is pole-colored-ish.
        let y = IMG_H / 3;
        let x = IMG_W / 2;
        let r = obs.channel(x, y, 0);
        let b = obs.channel(x, y, 2);
        assert!(r < 255 && r > b, "expected pole tint at ({x},{y})");
    }

    #[test]
    fn out_of_range_position_renders_without_panicking() {
        let far = render(100.0, 7.0);
        // Cart fully off-frame: the frame is background plus ground line.
        assert_ne!(far, render(0.0, 0.0));
    }
}
