// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! LSB capacity planning.
//!
//! Every pixel contributes one bit per colour sample (R, G, B), so a carrier
//! of `P` pixels holds `3P` bits. A frame around an `L`-byte envelope needs
//! `48 + 8L` of them.

use crate::carrier::pixels::COLOR_CHANNELS;
use crate::carrier::PixelBuffer;
use crate::stego::envelope::Envelope;
use crate::stego::error::SealError;
use crate::stego::frame::{self, FRAME_OVERHEAD_BITS};

/// Embeddable bits in a carrier of `pixels` pixels.
pub fn capacity_bits(pixels: usize) -> u64 {
    pixels as u64 * COLOR_CHANNELS as u64
}

/// Largest envelope (in bytes) that fits a carrier of `pixels` pixels.
pub fn max_envelope_bytes(pixels: usize) -> usize {
    let bits = capacity_bits(pixels);
    if bits < FRAME_OVERHEAD_BITS as u64 {
        return 0;
    }
    ((bits - FRAME_OVERHEAD_BITS as u64) / 8).min(u32::MAX as u64) as usize
}

/// Smallest pixel count that can hold an `envelope_len`-byte envelope.
pub fn min_pixels_for(envelope_len: usize) -> u64 {
    frame::required_bits(envelope_len).div_ceil(COLOR_CHANNELS as u64)
}

/// Whether `envelope` fits `carrier`.
pub fn envelope_fits(carrier: &PixelBuffer, envelope: &Envelope) -> Result<bool, SealError> {
    let len = envelope.to_bytes()?.len();
    Ok(frame::required_bits(len) <= capacity_bits(carrier.pixel_count()))
}
