// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for carrier decoding and encoding.

use std::fmt;

/// Errors that can occur while decoding or encoding a carrier image.
#[derive(Debug)]
pub enum CarrierError {
    /// The container could not be decoded as PNG.
    Decode(png::DecodingError),
    /// The pixel buffer could not be written back as PNG.
    Encode(png::EncodingError),
    /// The decoded image uses a colour layout the codec cannot address.
    UnsupportedLayout(&'static str),
    /// Width or height is zero.
    EmptyImage,
    /// Width, height or total pixel count exceeds the configured limits.
    TooLarge { width: u32, height: u32 },
    /// The raw sample buffer does not match `width * height * channels`.
    BufferMismatch { expected: usize, actual: usize },
}

impl fmt::Display for CarrierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "carrier decode failed: {e}"),
            Self::Encode(e) => write!(f, "carrier encode failed: {e}"),
            Self::UnsupportedLayout(what) => write!(f, "unsupported carrier layout: {what}"),
            Self::EmptyImage => write!(f, "carrier has zero width or height"),
            Self::TooLarge { width, height } => {
                write!(f, "carrier dimensions {width}x{height} exceed the configured limit")
            }
            Self::BufferMismatch { expected, actual } => {
                write!(f, "pixel buffer holds {actual} bytes, expected {expected}")
            }
        }
    }
}

impl std::error::Error for CarrierError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<png::DecodingError> for CarrierError {
    fn from(e: png::DecodingError) -> Self {
        Self::Decode(e)
    }
}

impl From<png::EncodingError> for CarrierError {
    fn from(e: png::EncodingError) -> Self {
        Self::Encode(e)
    }
}
