// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Bit framing for embedded envelopes.
//!
//! The frame wraps the serialized envelope before it is spread over the
//! carrier's low-order bits:
//!
//! ```text
//! [32 bits ] envelope length L in bytes (big-endian u32)
//! [8L bits ] envelope bytes, MSB first
//! [16 bits ] end marker 0xFFFE
//! ```
//!
//! Total frame size = 48 + 8L bits, which is always a whole number of bytes,
//! so the frame is built as a byte string and expanded to bits afterwards.
//!
//! The marker is fifteen ones followed by a zero. Valid UTF-8 never contains
//! the bytes 0xFE or 0xFF, so an envelope holds at most eleven consecutive
//! one bits, and the trailing zero rules out a match that starts inside the
//! last data bits. In an intact frame the first marker match is therefore
//! exactly at the end of the frame.

use crate::stego::error::SealError;
use crate::stego::extract::Malformation;

/// Width of the length prefix.
pub const LENGTH_PREFIX_BITS: usize = 32;

/// End-of-frame sentinel.
pub const END_MARKER: u16 = 0xFFFE;

/// Width of the end marker.
pub const END_MARKER_BITS: usize = 16;

/// Fixed overhead: length prefix + end marker = 48 bits.
pub const FRAME_OVERHEAD_BITS: usize = LENGTH_PREFIX_BITS + END_MARKER_BITS;

/// Number of carrier bits needed to embed `data_len` envelope bytes.
pub fn required_bits(data_len: usize) -> u64 {
    FRAME_OVERHEAD_BITS as u64 + 8 * data_len as u64
}

/// Build a frame around `data`.
///
/// Fails with [`SealError::CapacityExceeded`] if `data` is longer than the
/// u32 length prefix can describe.
pub fn build_frame(data: &[u8]) -> Result<Vec<u8>, SealError> {
    let len = u32::try_from(data.len()).map_err(|_| SealError::CapacityExceeded {
        required_bits: required_bits(data.len()),
        capacity_bits: required_bits(u32::MAX as usize),
    })?;

    let mut frame = Vec::with_capacity(4 + data.len() + 2);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(data);
    frame.extend_from_slice(&END_MARKER.to_be_bytes());
    Ok(frame)
}

/// Running accumulator for bits read back from a carrier.
///
/// Bits are packed MSB-first so the envelope bytes (which start at bit 32)
/// stay byte-aligned, and a 16-bit window tracks the most recent bits for
/// marker detection.
#[derive(Debug, Default)]
pub struct BitAccumulator {
    bytes: Vec<u8>,
    bit_len: usize,
    window: u16,
}

impl BitAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one bit. Returns `true` when the end marker has just been
    /// completed and at least a full (possibly empty) frame is held.
    #[inline]
    pub fn push(&mut self, bit: u8) -> bool {
        let bit = bit & 1;
        if self.bit_len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit == 1 {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 1 << (7 - self.bit_len % 8);
        }
        self.bit_len += 1;
        self.window = (self.window << 1) | bit as u16;
        self.bit_len >= FRAME_OVERHEAD_BITS && self.window == END_MARKER
    }

    /// Number of bits held.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Drop the marker and parse the frame, returning the envelope bytes.
    ///
    /// Must only be called after [`push`](Self::push) reported the marker.
    pub fn into_frame_data(mut self) -> Result<Vec<u8>, Malformation> {
        debug_assert!(self.bit_len >= FRAME_OVERHEAD_BITS);
        let payload_bits = self.bit_len - END_MARKER_BITS;
        self.bytes.truncate(payload_bits.div_ceil(8));

        let declared = u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]]);
        let expected_bits = LENGTH_PREFIX_BITS as u64 + 8 * declared as u64;
        if payload_bits as u64 != expected_bits {
            return Err(Malformation::LengthMismatch {
                declared_bytes: declared,
                available_bits: payload_bits - LENGTH_PREFIX_BITS,
            });
        }

        self.bytes.drain(..4);
        Ok(self.bytes)
    }
}

/// Convert bytes to a bit vector (MSB first within each byte).
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}
