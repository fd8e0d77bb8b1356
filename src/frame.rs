use ndarray::prelude::*;

use crate::error::Error;

/// Single grayscale video frame, `image[(row, col)]` holds luma in `0.0..=255.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub image: Array2<f32>,
}

impl Frame {
    #[inline]
    pub fn new(image: Array2<f32>) -> Self {
        Self { image }
    }

    pub fn from_luma(width: u32, height: u32, luma: &[u8]) -> Result<Self, Error> {
        let shape = (height as usize, width as usize);
        let image = Array2::from_shape_vec(shape, luma.iter().map(|&v| v as f32).collect())
            .map_err(|err| Error::InvalidConfig(format!("frame buffer: {}", err)))?;

        Ok(Self { image })
    }

    /// (width, height) in px
    #[inline]
    pub fn dims(&self) -> (u32, u32) {
        let (h, w) = self.image.dim();
        (w as u32, h as u32)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.image.ncols()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.image.nrows()
    }
}
