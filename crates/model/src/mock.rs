//! Deterministic stand-in for the external inference runtime.
//!
//! The real encoder, decoder and recurrent-step networks live outside this
//! workspace. The mock implements the same named-tensor contracts with
//! cheap closed-form arithmetic: the latent space is 16 horizontal band
//! means of the image, the reduced-state encoder reads cart position and
//! pole lean out of the pixels, and the reduced-state decoder re-renders
//! through the raster crate. Every output is a pure function of the
//! inputs, which is what the idempotence and staleness tests rely on.

use crate::marshal::{image_to_tensor, IMAGE_SHAPE};
use crate::{
    expect_input, ModelError, ModelKind, ModelRuntime, Tensor, TensorMap, HIDDEN_DIM, LATENT_DIM,
    NUM_LAYERS,
};
use raster::{IMG_H, IMG_W};

const MEMORY_SHAPE: [usize; 3] = [NUM_LAYERS, 1, HIDDEN_DIM];

/// Pure-arithmetic runtime used by tests and the demo driver.
#[derive(Default)]
pub struct MockRuntime;

impl ModelRuntime for MockRuntime {
    fn run(&self, model: ModelKind, inputs: &TensorMap) -> Result<TensorMap, ModelError> {
        match model {
            ModelKind::LatentEncoder => {
                let x = expect_input(inputs, "x", &IMAGE_SHAPE)?;
                let mut out = TensorMap::new();
                out.insert(
                    "mu".to_owned(),
                    Tensor::from_vec(vec![1, LATENT_DIM], encode_bands(x)),
                );
                Ok(out)
            }
            ModelKind::LatentDecoder => {
                let z = expect_input(inputs, "z", &[1, LATENT_DIM])?;
                let mut out = TensorMap::new();
                out.insert("x_recon".to_owned(), decode_bands(z));
                Ok(out)
            }
            ModelKind::RecurrentStep => {
                let z = expect_input(inputs, "latent", &[1, LATENT_DIM])?;
                let action = expect_input(inputs, "action", &[1, 1])?;
                let h0 = expect_input(inputs, "h0", &MEMORY_SHAPE)?;
                let c0 = expect_input(inputs, "c0", &MEMORY_SHAPE)?;
                Ok(recurrent_step(z, action.data()[0], h0, c0))
            }
            ModelKind::StateEncoder => {
                let x = expect_input(inputs, "x", &IMAGE_SHAPE)?;
                let (pos, angle) = estimate_state(x);
                let mut out = TensorMap::new();
                out.insert(
                    "state".to_owned(),
                    Tensor::from_vec(vec![1, 2], vec![pos, angle]),
                );
                Ok(out)
            }
            ModelKind::StateDecoder => {
                let state = expect_input(inputs, "state", &[1, 2])?;
                let obs = raster::render(state.data()[0], state.data()[1]);
                let mut out = TensorMap::new();
                out.insert("image".to_owned(), image_to_tensor(&obs));
                Ok(out)
            }
        }
    }
}

/// Mean gray value of each of 16 horizontal bands, recentered to [-1, 1].
fn encode_bands(x: &Tensor) -> Vec<f32> {
    let plane = IMG_W * IMG_H;
    let data = x.data();
    let rows_per_band = IMG_H / LATENT_DIM;
    let mut mu = vec![0.0f32; LATENT_DIM];
    for (band, slot) in mu.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for row in band * rows_per_band..(band + 1) * rows_per_band {
            for col in 0..IMG_W {
                let i = row * IMG_W + col;
                acc += (data[i] + data[plane + i] + data[2 * plane + i]) / 3.0;
            }
        }
        let mean = acc / (rows_per_band * IMG_W) as f32;
        *slot = (mean - 0.5) * 2.0;
    }
    mu
}

/// Inverse of [`encode_bands`]: paint each band with its stored mean.
fn decode_bands(z: &Tensor) -> Tensor {
    let plane = IMG_W * IMG_H;
    let rows_per_band = IMG_H / LATENT_DIM;
    let mut data = vec![0.0f32; 3 * plane];
    for (band, &v) in z.data().iter().enumerate() {
        let gray = v / 2.0 + 0.5;
        for row in band * rows_per_band..(band + 1) * rows_per_band {
            for col in 0..IMG_W {
                let i = row * IMG_W + col;
                data[i] = gray;
                data[plane + i] = gray;
                data[2 * plane + i] = gray;
            }
        }
    }
    Tensor::from_vec(IMAGE_SHAPE.to_vec(), data)
}

/// Damped affine update of latent and memory; action 0 pushes one way,
/// action 1 the other.
fn recurrent_step(z: &Tensor, action: f32, h0: &Tensor, c0: &Tensor) -> TensorMap {
    let drive = (2.0 * action - 1.0) * 0.05;

    let mut next = vec![0.0f32; LATENT_DIM];
    for (i, slot) in next.iter_mut().enumerate() {
        *slot = 0.9 * z.data()[i] + 0.1 * h0.data()[i].tanh() + drive;
    }

    let mut h1 = vec![0.0f32; NUM_LAYERS * HIDDEN_DIM];
    let mut c1 = vec![0.0f32; NUM_LAYERS * HIDDEN_DIM];
    for i in 0..NUM_LAYERS * HIDDEN_DIM {
        let feed = z.data()[i % LATENT_DIM];
        h1[i] = (0.7 * h0.data()[i] + 0.2 * feed + 0.1 * action).tanh();
        c1[i] = 0.85 * c0.data()[i] + 0.15 * feed;
    }

    let mut out = TensorMap::new();
    out.insert(
        "next_latent".to_owned(),
        Tensor::from_vec(vec![1, LATENT_DIM], next),
    );
    out.insert("h1".to_owned(), Tensor::from_vec(MEMORY_SHAPE.to_vec(), h1));
    out.insert("c1".to_owned(), Tensor::from_vec(MEMORY_SHAPE.to_vec(), c1));
    out
}

/// Reads an approximate (position, angle) straight out of the pixels.
///
/// Cart position comes from the darkness centroid of the cart band at
/// mid-height; pole lean from the tinted-pixel centroid above it. Crude,
/// but deterministic and monotone in the true state, which is all the
/// session needs from a stand-in.
fn estimate_state(x: &Tensor) -> (f32, f32) {
    let plane = IMG_W * IMG_H;
    let data = x.data();
    let scale = 600.0 / IMG_W as f32;
    let world_per_px = 125.0;

    // Darkness centroid over the cart band. The ground rule crosses every
    // column at mid-height and would drag the centroid to the center, so
    // its row is skipped.
    let ground_row = IMG_H / 2;
    let mut dark_sum = 0.0f32;
    let mut dark_col = 0.0f32;
    for row in (42..54).filter(|&r| r != ground_row) {
        for col in 0..IMG_W {
            let i = row * IMG_W + col;
            let gray = (data[i] + data[plane + i] + data[2 * plane + i]) / 3.0;
            let d = (1.0 - gray).max(0.0);
            dark_sum += d;
            dark_col += d * col as f32;
        }
    }
    if dark_sum <= f32::EPSILON {
        return (0.0, 0.0);
    }
    let cart_px = (dark_col / dark_sum + 0.5) * scale;
    let pos = (cart_px - 300.0) / world_per_px;

    // Pole tint (red over blue) centroid above the cart.
    let mut tint_sum = 0.0f32;
    let mut tint_col = 0.0f32;
    let mut tint_row = 0.0f32;
    for row in 0..42 {
        for col in 0..IMG_W {
            let i = row * IMG_W + col;
            let tint = (data[i] - data[2 * plane + i]).max(0.0);
            tint_sum += tint;
            tint_col += tint * col as f32;
            tint_row += tint * row as f32;
        }
    }
    if tint_sum <= f32::EPSILON {
        return (pos, 0.0);
    }
    let tip_px = (tint_col / tint_sum + 0.5) * scale;
    let tip_up = 400.0 - (tint_row / tint_sum + 0.5) * (400.0 / IMG_H as f32);
    let angle = (tip_px - cart_px).atan2(tip_up - 207.5);

    (pos, angle)
}
