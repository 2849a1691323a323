// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! LSB embedding.
//!
//! The frame bits are written one per colour sample, walking pixels in
//! row-major order and R, G, B within each pixel:
//!
//! ```text
//! sample' = (sample & !1) | bit
//! ```
//!
//! Alpha is never touched and samples past the end of the frame keep their
//! original value. The input carrier is borrowed immutably; the result is a
//! new buffer.

use tracing::debug;

use crate::carrier::pixels::COLOR_CHANNELS;
use crate::carrier::PixelBuffer;
use crate::stego::budget::{Budget, CHECK_INTERVAL_PIXELS};
use crate::stego::capacity;
use crate::stego::envelope::Envelope;
use crate::stego::error::SealError;
use crate::stego::frame;

/// Frame `data` and embed it into a copy of `carrier`.
///
/// # Errors
/// - [`SealError::CapacityExceeded`] if the frame needs more bits than the
///   carrier has colour samples. Checked before any sample is written.
/// - [`SealError::TimedOut`] / [`SealError::Cancelled`] from `budget`.
pub fn embed_frame(carrier: &PixelBuffer, data: &[u8], budget: &Budget) -> Result<PixelBuffer, SealError> {
    let frame_bytes = frame::build_frame(data)?;
    let required_bits = frame::required_bits(data.len());
    let capacity_bits = capacity::capacity_bits(carrier.pixel_count());
    debug!(required_bits, capacity_bits, "embedding frame");
    if required_bits > capacity_bits {
        return Err(SealError::CapacityExceeded { required_bits, capacity_bits });
    }

    let bits = frame::bytes_to_bits(&frame_bytes);
    let mut out = carrier.clone();
    for (pixel, chunk) in bits.chunks(COLOR_CHANNELS).enumerate() {
        if pixel % CHECK_INTERVAL_PIXELS == 0 {
            budget.check()?;
        }
        for (channel, &bit) in chunk.iter().enumerate() {
            let idx = out.sample_index(pixel, channel);
            let samples = out.as_bytes_mut();
            samples[idx] = (samples[idx] & !1) | bit;
        }
    }
    Ok(out)
}

/// Serialize `envelope` and embed it into a copy of `carrier`.
pub fn embed_envelope(carrier: &PixelBuffer, envelope: &Envelope, budget: &Budget) -> Result<PixelBuffer, SealError> {
    embed_frame(carrier, &envelope.to_bytes()?, budget)
}
