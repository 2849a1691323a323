// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Issuance pipeline.
//!
//! Seals a carrier in one pass:
//! 1. Bound the upload size, decode the PNG and check its dimensions
//! 2. Compute the carrier digest (LSB plane masked)
//! 3. Sign the digest with the issuer's private key
//! 4. Size the envelope with the longest reference the anchor store hands
//!    out and reject carriers it does not fit
//! 5. Record `SHA-256(digest ‖ signature)` at the anchor store
//! 6. Compose the canonical payload and wrap it in an envelope
//! 7. Embed the envelope into a copy of the pixels and re-encode as PNG
//!
//! Any failure aborts the whole issuance. Capacity is settled before the
//! anchor write, so only a collaborator fault or budget expiry after step 5
//! leaves an anchor record that no carrier points to. Verification never
//! consults such records.

use rand::Rng;
use tracing::{debug, info};

use crate::anchor::{AnchorRecord, AnchorStore};
use crate::carrier::{self, PixelBuffer};
use crate::config::CodecConfig;
use crate::registry::KeyStore;
use crate::stego::budget::Budget;
use crate::stego::capacity;
use crate::stego::crypto;
use crate::stego::embed;
use crate::stego::envelope::EnvelopeBuilder;
use crate::stego::error::SealError;
use crate::stego::frame;
use crate::stego::payload::{CanonicalPayload, PayloadComposer};

/// A sealed carrier and the record embedded in it.
#[derive(Debug, Clone)]
pub struct Issuance {
    /// PNG bytes of the sealed carrier. Must be stored losslessly.
    pub carrier: Vec<u8>,
    pub payload: CanonicalPayload,
}

/// Seals carriers on behalf of registered issuers.
pub struct Issuer<'a> {
    keys: &'a dyn KeyStore,
    anchors: &'a dyn AnchorStore,
    config: CodecConfig,
}

impl<'a> Issuer<'a> {
    pub fn new(keys: &'a dyn KeyStore, anchors: &'a dyn AnchorStore, config: CodecConfig) -> Self {
        Self { keys, anchors, config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Seal `carrier_bytes` for `issuer_id`, drawing decoys and the entry
    /// permutation from the thread-local CSPRNG.
    pub fn issue(&self, carrier_bytes: &[u8], issuer_id: &str, issued_at: u64) -> Result<Issuance, SealError> {
        self.issue_with_rng(carrier_bytes, issuer_id, issued_at, &mut rand::thread_rng())
    }

    /// Seal `carrier_bytes` for `issuer_id` with an explicit entropy source.
    ///
    /// # Errors
    /// - [`SealError::CarrierTooLarge`] / [`SealError::Carrier`] for uploads
    ///   that are oversized or not decodable.
    /// - [`SealError::UnknownIssuer`] / [`SealError::MissingSigningKey`] if
    ///   the issuer cannot sign.
    /// - [`SealError::Anchor`] / [`SealError::Registry`] from collaborators.
    /// - [`SealError::CapacityExceeded`] if the envelope does not fit.
    pub fn issue_with_rng<R: Rng + ?Sized>(
        &self,
        carrier_bytes: &[u8],
        issuer_id: &str,
        issued_at: u64,
        rng: &mut R,
    ) -> Result<Issuance, SealError> {
        if carrier_bytes.len() > self.config.max_carrier_bytes {
            return Err(SealError::CarrierTooLarge {
                size: carrier_bytes.len(),
                limit: self.config.max_carrier_bytes,
            });
        }
        let pixels = carrier::decode_png(carrier_bytes, &self.config)?;

        let keys = self
            .keys
            .get(issuer_id)?
            .ok_or_else(|| SealError::UnknownIssuer(issuer_id.to_owned()))?;
        let signing_key = keys
            .signing_key()
            .ok_or_else(|| SealError::MissingSigningKey(issuer_id.to_owned()))?;

        let digest = crypto::carrier_digest(&pixels);
        let signature = crypto::sign_digest(signing_key, &digest);
        let combined = crypto::combined_digest(&digest, &signature.to_bytes());
        let compose = |anchor_reference: &str| {
            PayloadComposer::new()
                .file_digest(digest)
                .signature(signature)
                .issuer_id(issuer_id)
                .anchor_reference(anchor_reference)
                .issued_at(issued_at)
                .compose()
        };

        let placeholder = "0".repeat(self.anchors.max_reference_len());
        self.check_capacity(&pixels, compose(&placeholder)?, rng)?;

        let anchor_reference = self
            .anchors
            .write(AnchorRecord { digest: combined, issuer_id: issuer_id.to_owned() })?;
        debug!(%anchor_reference, "anchored combined digest");

        let payload = compose(&anchor_reference)?;

        let envelope = EnvelopeBuilder::from_config(&self.config).build(payload.clone(), rng)?;
        let budget = Budget::with_limit(self.config.time_budget(pixels.pixel_count()));
        let sealed = embed::embed_envelope(&pixels, &envelope, &budget)?;
        let carrier = carrier::encode_png(&sealed)?;

        info!(
            issuer = issuer_id,
            mode = ?envelope.mode(),
            width = sealed.width(),
            height = sealed.height(),
            "carrier sealed"
        );
        Ok(Issuance { carrier, payload })
    }

    /// Reject `pixels` if an envelope around `provisional` cannot fit.
    /// Decoys mimic the real record's length, so the provisional envelope is
    /// as long as the final one whenever the real reference is no longer.
    fn check_capacity<R: Rng + ?Sized>(
        &self,
        pixels: &PixelBuffer,
        provisional: CanonicalPayload,
        rng: &mut R,
    ) -> Result<(), SealError> {
        let envelope = EnvelopeBuilder::from_config(&self.config).build(provisional, rng)?;
        let envelope_len = envelope.to_bytes()?.len();
        let pixel_count = pixels.pixel_count();
        if capacity::min_pixels_for(envelope_len) > pixel_count as u64 {
            return Err(SealError::CapacityExceeded {
                required_bits: frame::required_bits(envelope_len),
                capacity_bits: capacity::capacity_bits(pixel_count),
            });
        }
        Ok(())
    }
}
