//! Fixed-resolution observation images.

use anyhow::{ensure, Context, Result};
use image::{ImageBuffer, Rgba};
use std::path::Path;

/// Observation width in pixels.
pub const IMG_W: usize = 96;
/// Observation height in pixels.
pub const IMG_H: usize = 96;

/// A 96×96 interleaved RGBA8 image, the only image type exchanged with the
/// model boundary and the presentation layer.
#[derive(Clone, PartialEq, Eq)]
pub struct Observation {
    data: Vec<u8>,
}

impl Default for Observation {
    fn default() -> Self {
        Self::filled([0, 0, 0, 255])
    }
}

impl Observation {
    /// Builds an observation filled with a single color.
    #[must_use]
    pub fn filled(color: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(IMG_W * IMG_H * 4);
        for _ in 0..IMG_W * IMG_H {
            data.extend_from_slice(&color);
        }
        Self { data }
    }

    /// Wraps raw interleaved RGBA bytes.
    ///
    /// # Errors
    ///
    /// Fails when `data` is not exactly `IMG_W * IMG_H * 4` bytes.
    pub fn from_raw(data: Vec<u8>) -> Result<Self> {
        ensure!(
            data.len() == IMG_W * IMG_H * 4,
            "observation buffer is {} bytes, expected {}",
            data.len(),
            IMG_W * IMG_H * 4
        );
        Ok(Self { data })
    }

    /// Constructor for buffers whose size is guaranteed by construction.
    pub(crate) fn from_resampled(data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), IMG_W * IMG_H * 4);
        Self { data }
    }

    /// Raw interleaved RGBA bytes, row-major.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// RGB channel value at `(x, y)`; `c` is 0, 1 or 2.
    #[must_use]
    pub fn channel(&self, x: usize, y: usize, c: usize) -> u8 {
        self.data[(y * IMG_W + x) * 4 + c]
    }

    /// Writes the observation as a PNG, for fixtures and frame dumps.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let img: ImageBuffer<Rgba<u8>, _> =
            ImageBuffer::from_raw(IMG_W as u32, IMG_H as u32, self.data.clone())
                .context("observation buffer has the wrong size for an image")?;
        img.save(path)
            .with_context(|| format!("writing {}", path.display()))
    }

    /// Reads a PNG written by [`Observation::save_png`].
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not 96×96.
    pub fn load_png(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("reading {}", path.display()))?
            .to_rgba8();
        ensure!(
            img.width() as usize == IMG_W && img.height() as usize == IMG_H,
            "{} is {}x{}, expected {IMG_W}x{IMG_H}",
            path.display(),
            img.width(),
            img.height()
        );
        Ok(Self {
            data: img.into_raw(),
        })
    }
}

impl std::fmt::Debug for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observation")
            .field("width", &IMG_W)
            .field("height", &IMG_H)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_wrong_sizes() {
        assert!(Observation::from_raw(vec![0; 16]).is_err());
        assert!(Observation::from_raw(vec![0; IMG_W * IMG_H * 4]).is_ok());
    }

    #[test]
    fn png_round_trip_preserves_bytes() {
        let mut data = vec![0u8; IMG_W * IMG_H * 4];
        for (i, b) in data.iter_mut().enumerate() {
            *b = if i % 4 == 3 { 255 } else { (i % 251) as u8 };
        }
        let obs = Observation::from_raw(data).unwrap();

        let dir = std::env::temp_dir().join("raster_obs_png_round_trip");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("obs.png");
        obs.save_png(&path).unwrap();
        let back = Observation::load_png(&path).unwrap();
        assert_eq!(obs, back);
    }
}
