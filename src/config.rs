// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Codec configuration.
//!
//! Every field has a default, so a JSON document only needs the keys it
//! wants to override:
//!
//! ```json
//! { "noise_defense": true, "decoy_count": 8, "max_carrier_bytes": 5242880 }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::stego::error::SealError;

/// Default number of decoys placed around the real entry in noise mode.
pub const DEFAULT_DECOY_COUNT: usize = 4;

/// Upper bound on decoys; each one costs roughly 420 bytes of envelope.
pub const MAX_DECOY_COUNT: usize = 64;

/// Default accepted upload size (10 MiB).
pub const DEFAULT_MAX_CARRIER_BYTES: usize = 10 * 1024 * 1024;

/// Maximum pixel dimension (width or height).
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

/// Maximum total pixel count (width × height).
pub const DEFAULT_MAX_PIXELS: u64 = 16_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Wrap the canonical payload among decoys when issuing.
    pub noise_defense: bool,
    /// Number of decoys generated in noise mode.
    pub decoy_count: usize,
    /// Largest carrier accepted, checked before any decoding.
    pub max_carrier_bytes: usize,
    pub max_dimension: u32,
    pub max_pixels: u64,
    /// Fixed part of the per-call embedding/extraction time budget.
    pub budget_base_ms: u64,
    /// Additional budget granted per started megapixel.
    pub budget_per_megapixel_ms: u64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            noise_defense: false,
            decoy_count: DEFAULT_DECOY_COUNT,
            max_carrier_bytes: DEFAULT_MAX_CARRIER_BYTES,
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_pixels: DEFAULT_MAX_PIXELS,
            budget_base_ms: 2_000,
            budget_per_megapixel_ms: 1_000,
        }
    }
}

impl CodecConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(text: &str) -> Result<Self, SealError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| SealError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency of the limits.
    pub fn validate(&self) -> Result<(), SealError> {
        if self.decoy_count > MAX_DECOY_COUNT {
            return Err(SealError::Config(format!(
                "decoy_count {} exceeds maximum {MAX_DECOY_COUNT}",
                self.decoy_count
            )));
        }
        if self.max_carrier_bytes == 0 {
            return Err(SealError::Config("max_carrier_bytes must be non-zero".into()));
        }
        if self.max_dimension == 0 || self.max_pixels == 0 {
            return Err(SealError::Config("dimension limits must be non-zero".into()));
        }
        Ok(())
    }

    /// Time allowed for one embedding or extraction over `pixels` pixels.
    ///
    /// Work is linear in pixel count, so the budget scales the same way.
    pub fn time_budget(&self, pixels: usize) -> Duration {
        let megapixels = (pixels as u64).div_ceil(1_000_000);
        Duration::from_millis(
            self.budget_base_ms
                .saturating_add(self.budget_per_megapixel_ms.saturating_mul(megapixels)),
        )
    }
}
