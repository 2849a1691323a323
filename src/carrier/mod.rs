// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! PNG carrier container.
//!
//! LSB embedding needs a lossless, directly addressable pixel format, so the
//! carrier is always PNG. Decoding normalizes every PNG colour type to 8-bit
//! RGB or RGBA:
//!
//! - palette images are expanded (to RGBA when they carry transparency)
//! - greyscale is replicated into R, G and B
//! - 16-bit samples are stripped to 8 bits
//!
//! Output is always written in the normalized layout. Any lossy re-encoding
//! of the output destroys the hidden bits; that is outside this crate.

pub mod error;
pub mod pixels;

use std::io::Cursor;

pub use error::CarrierError;
pub use pixels::{ChannelLayout, PixelBuffer};

use crate::config::CodecConfig;

/// Validate carrier dimensions against the configured limits.
pub fn validate_dimensions(width: u32, height: u32, config: &CodecConfig) -> Result<(), CarrierError> {
    if width == 0 || height == 0 {
        return Err(CarrierError::EmptyImage);
    }
    if width > config.max_dimension
        || height > config.max_dimension
        || (width as u64) * (height as u64) > config.max_pixels
    {
        return Err(CarrierError::TooLarge { width, height });
    }
    Ok(())
}

/// Decode PNG bytes into a [`PixelBuffer`].
///
/// The caller is expected to have bounded `bytes.len()` already; the decoder
/// additionally caps its own allocations from `config.max_pixels`.
pub fn decode_png(bytes: &[u8], config: &CodecConfig) -> Result<PixelBuffer, CarrierError> {
    let mut limits = png::Limits::default();
    limits.bytes = usize::try_from(config.max_pixels.saturating_mul(8)).unwrap_or(usize::MAX);

    let mut decoder = png::Decoder::new_with_limits(Cursor::new(bytes), limits);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let (width, height) = {
        let info = reader.info();
        (info.width, info.height)
    };
    validate_dimensions(width, height, config)?;

    let mut raw = vec![0u8; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut raw)?;
    raw.truncate(frame.buffer_size());

    if frame.bit_depth != png::BitDepth::Eight {
        return Err(CarrierError::UnsupportedLayout("sample depth other than 8 bits"));
    }

    let (layout, data) = match frame.color_type {
        png::ColorType::Rgb => (ChannelLayout::Rgb, raw),
        png::ColorType::Rgba => (ChannelLayout::Rgba, raw),
        png::ColorType::Grayscale => {
            (ChannelLayout::Rgb, raw.iter().flat_map(|&y| [y, y, y]).collect())
        }
        png::ColorType::GrayscaleAlpha => (
            ChannelLayout::Rgba,
            raw.chunks_exact(2).flat_map(|ya| [ya[0], ya[0], ya[0], ya[1]]).collect(),
        ),
        png::ColorType::Indexed => {
            return Err(CarrierError::UnsupportedLayout("unexpanded palette"));
        }
    };

    PixelBuffer::new(width, height, layout, data)
}

/// Encode a [`PixelBuffer`] as an 8-bit PNG.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, CarrierError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, buffer.width(), buffer.height());
        encoder.set_color(match buffer.layout() {
            ChannelLayout::Rgb => png::ColorType::Rgb,
            ChannelLayout::Rgba => png::ColorType::Rgba,
        });
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(buffer.as_bytes())?;
        writer.finish()?;
    }
    Ok(out)
}
