//! Raster ↔ tensor marshaling.
//!
//! Observations are interleaved RGBA8; model inputs and outputs are planar
//! normalized floats shaped (1, 3, H, W). Quantization back to 8 bits is
//! the only lossy step, so converting an observation to a tensor and back
//! reproduces it exactly.

use crate::tensor::Tensor;
use crate::ModelError;
use raster::{Observation, IMG_H, IMG_W};

/// Shape of every image tensor crossing the model boundary.
pub const IMAGE_SHAPE: [usize; 4] = [1, 3, IMG_H, IMG_W];

/// Converts an observation to a planar normalized tensor, dropping alpha.
#[must_use]
pub fn image_to_tensor(obs: &Observation) -> Tensor {
    let plane = IMG_W * IMG_H;
    let mut data = vec![0.0f32; 3 * plane];
    let raw = obs.as_raw();
    for i in 0..plane {
        let px = i * 4;
        data[i] = f32::from(raw[px]) / 255.0;
        data[plane + i] = f32::from(raw[px + 1]) / 255.0;
        data[2 * plane + i] = f32::from(raw[px + 2]) / 255.0;
    }
    Tensor::from_vec(IMAGE_SHAPE.to_vec(), data)
}

/// Converts a planar image tensor back to an interleaved observation.
///
/// Channel values are scaled by 255, rounded to nearest and clamped to
/// [0, 255]; model outputs outside [0, 1] therefore saturate instead of
/// failing. Alpha is fixed at fully opaque.
///
/// # Errors
///
/// Returns [`ModelError::ShapeMismatch`] when `t` is not (1, 3, 96, 96).
pub fn tensor_to_image(t: &Tensor) -> Result<Observation, ModelError> {
    if t.shape() != IMAGE_SHAPE.as_slice() {
        return Err(ModelError::ShapeMismatch {
            name: "image",
            got: t.shape().to_vec(),
            want: IMAGE_SHAPE.to_vec(),
        });
    }
    let plane = IMG_W * IMG_H;
    let data = t.data();
    let mut raw = vec![0u8; plane * 4];
    for i in 0..plane {
        let px = i * 4;
        raw[px] = quantize(data[i]);
        raw[px + 1] = quantize(data[plane + i]);
        raw[px + 2] = quantize(data[2 * plane + i]);
        raw[px + 3] = 255;
    }
    Observation::from_raw(raw).map_err(|e| ModelError::Runtime(e.to_string()))
}

fn quantize(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
