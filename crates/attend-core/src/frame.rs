//! Borrowed view over one raw video frame.
//!
//! The caller owns the pixel buffer; the engine only reads it for the duration
//! of a single scoring call. Samples are row-major, 8 bits per channel.

use crate::error::AttendError;

/// Channel layout of a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Four bytes per pixel; alpha is ignored.
    Rgba,
    /// Three bytes per pixel.
    Rgb,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            Self::Rgba => 4,
            Self::Rgb => 3,
        }
    }
}

/// Immutable width × height grid of RGB(A) samples.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl<'a> Frame<'a> {
    /// Wrap a buffer, rejecting zero-sized frames and buffers whose length does
    /// not match `width × height × channels`.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, AttendError> {
        let expected = (width as usize) * (height as usize) * format.channels();
        if width == 0 || height == 0 || data.len() != expected {
            return Err(AttendError::InvalidFrame {
                width,
                height,
                len: data.len(),
                expected,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    pub fn rgba(data: &'a [u8], width: u32, height: u32) -> Result<Self, AttendError> {
        Self::new(data, width, height, PixelFormat::Rgba)
    }

    pub fn rgb(data: &'a [u8], width: u32, height: u32) -> Result<Self, AttendError> {
        Self::new(data, width, height, PixelFormat::Rgb)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// RGB triple at `(x, y)`. Coordinates must be in bounds.
    #[inline]
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let i = ((y as usize) * (self.width as usize) + x as usize) * self.format.channels();
        (self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Mean of the three colour channels at `(x, y)`, in `0.0..=255.0`.
    #[inline]
    pub fn brightness(&self, x: u32, y: u32) -> f32 {
        let (r, g, b) = self.rgb_at(x, y);
        (r as f32 + g as f32 + b as f32) / 3.0
    }

    /// Row-major brightness plane, used as the motion detector's snapshot.
    pub fn brightness_plane(&self) -> Vec<f32> {
        self.data
            .chunks_exact(self.format.channels())
            .map(|px| (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0)
            .collect()
    }
}
