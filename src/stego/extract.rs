// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! LSB extraction and disambiguation.
//!
//! Reads colour-sample LSBs in embedding order until the end marker shows up
//! (at or after bit 48), then parses the frame and the envelope inside it.
//! The outcome is always one of three things:
//!
//! - [`ExtractionResult::Recovered`]: the single authentic record
//! - [`ExtractionResult::NotFound`]: no marker anywhere in the carrier
//! - [`ExtractionResult::Malformed`]: a marker was found but the frame, the
//!   envelope or its real-entry count is inconsistent
//!
//! Only budget expiry or cancellation produce an `Err`.

use core::fmt;

use tracing::{debug, warn};

use crate::carrier::pixels::COLOR_CHANNELS;
use crate::carrier::PixelBuffer;
use crate::stego::budget::{Budget, CHECK_INTERVAL_PIXELS};
use crate::stego::envelope::Envelope;
use crate::stego::error::SealError;
use crate::stego::frame::BitAccumulator;
use crate::stego::payload::CanonicalPayload;

/// Why an embedded frame was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformation {
    /// The length prefix disagrees with the number of bits before the marker.
    LengthMismatch { declared_bytes: u32, available_bits: usize },
    /// The framed bytes are not valid UTF-8.
    InvalidUtf8,
    /// The framed text is not a well-formed envelope.
    InvalidEnvelope(String),
    /// The envelope content does not match its seal.
    SealMismatch,
    /// Mode and payload fields disagree (e.g. plain without `data`).
    ShapeMismatch(&'static str),
    /// A noise envelope with other than exactly one `real` entry.
    RealEntryCount(usize),
}

impl fmt::Display for Malformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { declared_bytes, available_bits } => write!(
                f,
                "length prefix declares {declared_bytes} bytes but {available_bits} bits precede the marker"
            ),
            Self::InvalidUtf8 => write!(f, "embedded envelope is not valid UTF-8"),
            Self::InvalidEnvelope(msg) => write!(f, "embedded envelope does not parse: {msg}"),
            Self::SealMismatch => write!(f, "embedded envelope does not match its seal"),
            Self::ShapeMismatch(msg) => write!(f, "{msg}"),
            Self::RealEntryCount(n) => write!(f, "noise envelope has {n} real entries, expected exactly 1"),
        }
    }
}

/// Raw frame scan result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameScan {
    /// Envelope bytes from a frame whose length prefix checks out.
    Found(Vec<u8>),
    NotFound,
    Malformed(Malformation),
}

/// Result of a full extraction. Produced fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Recovered(CanonicalPayload),
    NotFound,
    Malformed(Malformation),
}

/// Read the frame out of `carrier` without interpreting its contents.
pub fn scan_frame(carrier: &PixelBuffer, budget: &Budget) -> Result<FrameScan, SealError> {
    let samples = carrier.as_bytes();
    let mut acc = BitAccumulator::new();

    for pixel in 0..carrier.pixel_count() {
        if pixel % CHECK_INTERVAL_PIXELS == 0 {
            budget.check()?;
        }
        for channel in 0..COLOR_CHANNELS {
            if acc.push(samples[carrier.sample_index(pixel, channel)] & 1) {
                debug!(bits = acc.bit_len(), "end marker found");
                return Ok(match acc.into_frame_data() {
                    Ok(data) => FrameScan::Found(data),
                    Err(m) => FrameScan::Malformed(m),
                });
            }
        }
    }
    Ok(FrameScan::NotFound)
}

/// Extract and disambiguate the canonical payload from `carrier`.
pub fn extract(carrier: &PixelBuffer, budget: &Budget) -> Result<ExtractionResult, SealError> {
    let data = match scan_frame(carrier, budget)? {
        FrameScan::Found(data) => data,
        FrameScan::NotFound => return Ok(ExtractionResult::NotFound),
        FrameScan::Malformed(m) => return Ok(malformed(m)),
    };

    let result = Envelope::from_bytes(&data).and_then(Envelope::into_real);
    Ok(match result {
        Ok(payload) => ExtractionResult::Recovered(payload),
        Err(m) => malformed(m),
    })
}

fn malformed(m: Malformation) -> ExtractionResult {
    warn!(reason = %m, "malformed embedded frame");
    ExtractionResult::Malformed(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::ChannelLayout;
    use crate::stego::embed::{embed_envelope, embed_frame};
    use crate::stego::envelope::tests::{sample_payload, tagged};
    use crate::stego::envelope::{EntryTag, EnvelopeBuilder, Mode};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn noisy_carrier(width: u32, height: u32, seed: u8) -> PixelBuffer {
        let mut data = vec![0u8; width as usize * height as usize * 4];
        ChaCha20Rng::from_seed([seed; 32]).fill_bytes(&mut data);
        PixelBuffer::new(width, height, ChannelLayout::Rgba, data).unwrap()
    }

    #[test]
    fn plain_roundtrip() {
        let carrier = noisy_carrier(64, 64, 1);
        let env = EnvelopeBuilder::plain().build(sample_payload(), &mut ChaCha20Rng::from_seed([0; 32])).unwrap();
        let sealed = embed_envelope(&carrier, &env, &Budget::unbounded()).unwrap();
        assert_eq!(
            extract(&sealed, &Budget::unbounded()).unwrap(),
            ExtractionResult::Recovered(sample_payload())
        );
    }

    #[test]
    fn frame_bytes_roundtrip() {
        let carrier = noisy_carrier(10, 10, 2);
        let sealed = embed_frame(&carrier, b"hello", &Budget::unbounded()).unwrap();
        assert_eq!(
            scan_frame(&sealed, &Budget::unbounded()).unwrap(),
            FrameScan::Found(b"hello".to_vec())
        );
    }

    #[test]
    fn zeroed_lsbs_are_not_found() {
        let carrier = PixelBuffer::new(32, 32, ChannelLayout::Rgb, vec![0x80; 32 * 32 * 3]).unwrap();
        assert_eq!(extract(&carrier, &Budget::unbounded()).unwrap(), ExtractionResult::NotFound);
    }

    #[test]
    fn non_envelope_frame_is_malformed() {
        let carrier = noisy_carrier(10, 10, 3);
        let sealed = embed_frame(&carrier, b"not json", &Budget::unbounded()).unwrap();
        assert!(matches!(
            extract(&sealed, &Budget::unbounded()).unwrap(),
            ExtractionResult::Malformed(Malformation::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn ambiguous_noise_envelope_is_malformed() {
        let carrier = noisy_carrier(64, 64, 4);
        let entries = vec![tagged(EntryTag::Real, sample_payload()), tagged(EntryTag::Real, sample_payload())];
        let env = Envelope::assemble(Mode::Noise, None, Some(entries)).unwrap();
        let sealed = embed_envelope(&carrier, &env, &Budget::unbounded()).unwrap();
        assert_eq!(
            extract(&sealed, &Budget::unbounded()).unwrap(),
            ExtractionResult::Malformed(Malformation::RealEntryCount(2))
        );
    }

    #[test]
    fn cancelled_scan_is_an_error() {
        let flag = crate::stego::budget::CancelFlag::new();
        flag.cancel();
        let budget = Budget::unbounded().with_cancel(flag);
        assert!(matches!(extract(&noisy_carrier(4, 4, 5), &budget), Err(SealError::Cancelled)));
    }
}
