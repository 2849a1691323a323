// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Canonical payload composition.
//!
//! The canonical payload is the single authentic tamper-binding record:
//!
//! ```text
//! fileDigest       64 hex   SHA-256 carrier digest
//! signature       128 hex   Ed25519 signature over the raw carrier digest
//! combinedDigest   64 hex   SHA-256(fileDigest ‖ signature), recorded at the anchor
//! issuerId         string
//! anchorReference  string
//! issuedAt         u64      Unix seconds
//! ```
//!
//! Field order and presence never vary, so the serialized size of a payload
//! only depends on the lengths of `issuerId` and `anchorReference` and the
//! digit count of `issuedAt`.

use ed25519_dalek::Signature;
use serde::{Deserialize, Serialize};

use crate::carrier::PixelBuffer;
use crate::stego::crypto::{self, DIGEST_LEN};
use crate::stego::error::SealError;

/// The authentic record embedded in a carrier. Immutable once composed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPayload {
    file_digest: String,
    signature: String,
    combined_digest: String,
    issuer_id: String,
    anchor_reference: String,
    issued_at: u64,
}

impl CanonicalPayload {
    pub fn file_digest(&self) -> &str {
        &self.file_digest
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn combined_digest(&self) -> &str {
        &self.combined_digest
    }

    pub fn issuer_id(&self) -> &str {
        &self.issuer_id
    }

    pub fn anchor_reference(&self) -> &str {
        &self.anchor_reference
    }

    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    /// Build a record with arbitrary field values. Used for decoys, whose
    /// contents are random by construction.
    pub(crate) fn from_parts(
        file_digest: String,
        signature: String,
        combined_digest: String,
        issuer_id: String,
        anchor_reference: String,
        issued_at: u64,
    ) -> Self {
        Self { file_digest, signature, combined_digest, issuer_id, anchor_reference, issued_at }
    }
}

/// Builder for [`CanonicalPayload`].
///
/// Every input is required; [`compose`](Self::compose) names the first one
/// that is missing.
#[derive(Debug, Default, Clone)]
pub struct PayloadComposer<'a> {
    carrier: Option<&'a PixelBuffer>,
    file_digest: Option<[u8; DIGEST_LEN]>,
    signature: Option<Signature>,
    issuer_id: Option<&'a str>,
    anchor_reference: Option<&'a str>,
    issued_at: Option<u64>,
}

impl<'a> PayloadComposer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The decoded carrier the digest is computed over.
    pub fn carrier(mut self, carrier: &'a PixelBuffer) -> Self {
        self.carrier = Some(carrier);
        self
    }

    /// A carrier digest the caller already computed. Takes precedence over
    /// [`carrier`](Self::carrier).
    pub fn file_digest(mut self, digest: [u8; DIGEST_LEN]) -> Self {
        self.file_digest = Some(digest);
        self
    }

    /// Signature over the carrier digest.
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn issuer_id(mut self, issuer_id: &'a str) -> Self {
        self.issuer_id = Some(issuer_id);
        self
    }

    pub fn anchor_reference(mut self, anchor_reference: &'a str) -> Self {
        self.anchor_reference = Some(anchor_reference);
        self
    }

    /// Issuance time in Unix seconds.
    pub fn issued_at(mut self, issued_at: u64) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    /// Produce the canonical payload. Deterministic for identical inputs.
    ///
    /// # Errors
    /// [`SealError::Composition`] if any input is absent, or if a string input
    /// is empty.
    pub fn compose(self) -> Result<CanonicalPayload, SealError> {
        let file_digest = match (self.file_digest, self.carrier) {
            (Some(digest), _) => digest,
            (None, Some(carrier)) => crypto::carrier_digest(carrier),
            (None, None) => return Err(SealError::Composition("carrier")),
        };
        let signature = self.signature.ok_or(SealError::Composition("signature"))?;
        let issuer_id = non_empty(self.issuer_id, "issuerId")?;
        let anchor_reference = non_empty(self.anchor_reference, "anchorReference")?;
        let issued_at = self.issued_at.ok_or(SealError::Composition("issuedAt"))?;

        let signature = signature.to_bytes();
        let combined = crypto::combined_digest(&file_digest, &signature);

        Ok(CanonicalPayload {
            file_digest: hex::encode(file_digest),
            signature: hex::encode(signature),
            combined_digest: hex::encode(combined),
            issuer_id: issuer_id.to_owned(),
            anchor_reference: anchor_reference.to_owned(),
            issued_at,
        })
    }
}

fn non_empty<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, SealError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SealError::Composition(field)),
    }
}
