#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Cartpole Raster Renderer
//!
//! Draws a cartpole state into a fixed-size raster image on the CPU,
//! deterministically: the same `(position, angle)` pair always produces the
//! same bytes. The scene is drawn at 600×400 with hard-edged scanline
//! fills, then reduced to the 96×96 [`Observation`] resolution with an
//! exact area-average filter, which is what smooths the edges.
//!
//! The renderer is pure apart from writing into caller-provided buffers and
//! has no failure modes; out-of-range positions or angles simply draw the
//! cart partly or fully outside the frame.

pub mod canvas;
pub mod observation;
pub mod resample;
pub mod scene;

pub use canvas::{Canvas, Rgba};
pub use observation::{Observation, IMG_H, IMG_W};
pub use scene::{render, render_into, CANVAS_H, CANVAS_W};
