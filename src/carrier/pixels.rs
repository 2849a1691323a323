// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Row-major 8-bit pixel buffer.
//!
//! Only the R, G and B samples of each pixel are addressable for embedding.
//! Alpha, when present, rides along untouched.

use crate::carrier::error::CarrierError;

/// Number of colour samples per pixel that carry one embedded bit each.
pub const COLOR_CHANNELS: usize = 3;

/// Channel layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Rgb,
    Rgba,
}

impl ChannelLayout {
    /// Bytes per pixel.
    pub fn stride(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Decoded carrier: `height` rows of `width` pixels, 8 bits per sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples, checking that the length matches the geometry.
    pub fn new(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        data: Vec<u8>,
    ) -> Result<Self, CarrierError> {
        if width == 0 || height == 0 {
            return Err(CarrierError::EmptyImage);
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|p| p.checked_mul(layout.stride()))
            .ok_or(CarrierError::TooLarge { width, height })?;
        if data.len() != expected {
            return Err(CarrierError::BufferMismatch { expected, actual: data.len() });
        }
        Ok(Self { width, height, layout, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw interleaved samples in row-major order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Byte offset of colour channel `channel` (0 = R, 1 = G, 2 = B) of the
    /// pixel at row-major index `pixel`.
    #[inline]
    pub fn sample_index(&self, pixel: usize, channel: usize) -> usize {
        debug_assert!(channel < COLOR_CHANNELS);
        pixel * self.layout.stride() + channel
    }
}
