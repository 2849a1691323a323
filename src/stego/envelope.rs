// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Envelope construction, serialization and disambiguation.
//!
//! The envelope is what actually gets framed and embedded. Wire format is
//! compact UTF-8 JSON in one of two shapes:
//!
//! ```text
//! {"mode":"plain","data":{…payload…},"seal":"<64 hex>"}
//! {"mode":"noise","entries":[{"tag":"decoy",…},{"tag":"real",…},…],"seal":"<64 hex>"}
//! ```
//!
//! Noise-mode entries carry the payload fields inline next to their tag.
//! `seal` is the SHA-256 of the same JSON without the `seal` key. It is an
//! integrity check over the whole envelope (decoys included), not an
//! authenticator: trust still comes from the signature and the anchor.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CodecConfig;
use crate::stego::crypto;
use crate::stego::decoy;
use crate::stego::error::SealError;
use crate::stego::extract::Malformation;
use crate::stego::payload::CanonicalPayload;
use crate::stego::permute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Plain,
    Noise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryTag {
    Real,
    Decoy,
}

/// A tagged noise-mode entry. Real and decoy entries differ only by tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    tag: EntryTag,
    #[serde(flatten)]
    record: CanonicalPayload,
}

impl Entry {
    pub fn tag(&self) -> EntryTag {
        self.tag
    }

    pub fn record(&self) -> &CanonicalPayload {
        &self.record
    }
}

/// Sealed envelope. Built once, serialized once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<CanonicalPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entries: Option<Vec<Entry>>,
    seal: String,
}

/// The envelope as hashed for its seal: identical to the wire form minus
/// the `seal` key.
#[derive(Serialize)]
struct Unsealed<'a> {
    mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a CanonicalPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<&'a [Entry]>,
}

fn compute_seal(
    mode: Mode,
    data: Option<&CanonicalPayload>,
    entries: Option<&[Entry]>,
) -> Result<String, serde_json::Error> {
    let body = serde_json::to_vec(&Unsealed { mode, data, entries })?;
    Ok(hex::encode(crypto::sha256(&body)))
}

impl Envelope {
    /// Assemble and seal an envelope without checking the mode invariants.
    pub(crate) fn assemble(
        mode: Mode,
        data: Option<CanonicalPayload>,
        entries: Option<Vec<Entry>>,
    ) -> Result<Self, SealError> {
        let seal = compute_seal(mode, data.as_ref(), entries.as_deref())?;
        Ok(Self { mode, data, entries, seal })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The payload of a plain envelope.
    pub fn data(&self) -> Option<&CanonicalPayload> {
        self.data.as_ref()
    }

    /// The entries of a noise envelope, in embedded order.
    pub fn entries(&self) -> Option<&[Entry]> {
        self.entries.as_deref()
    }

    /// Serialize to the UTF-8 JSON wire form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SealError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse the wire form and check the seal.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Malformation> {
        let text = std::str::from_utf8(bytes).map_err(|_| Malformation::InvalidUtf8)?;
        let envelope: Self =
            serde_json::from_str(text).map_err(|e| Malformation::InvalidEnvelope(e.to_string()))?;
        let expected = compute_seal(envelope.mode, envelope.data.as_ref(), envelope.entries.as_deref())
            .map_err(|e| Malformation::InvalidEnvelope(e.to_string()))?;
        if expected != envelope.seal {
            return Err(Malformation::SealMismatch);
        }
        Ok(envelope)
    }

    /// Pick the single authentic record out of the envelope.
    ///
    /// Plain mode yields `data`. Noise mode yields the one entry tagged
    /// `real`; zero or several real entries is malformed, never a guess.
    pub fn into_real(self) -> Result<CanonicalPayload, Malformation> {
        match (self.mode, self.data, self.entries) {
            (Mode::Plain, Some(data), None) => Ok(data),
            (Mode::Plain, _, _) => Err(Malformation::ShapeMismatch("plain envelope must carry data only")),
            (Mode::Noise, None, Some(entries)) => {
                let real_count = entries.iter().filter(|e| e.tag == EntryTag::Real).count();
                if real_count != 1 {
                    return Err(Malformation::RealEntryCount(real_count));
                }
                entries
                    .into_iter()
                    .find(|e| e.tag == EntryTag::Real)
                    .map(|e| e.record)
                    .ok_or(Malformation::RealEntryCount(0))
            }
            (Mode::Noise, _, _) => Err(Malformation::ShapeMismatch("noise envelope must carry entries only")),
        }
    }
}

/// Builds plain or noise envelopes around a canonical payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeBuilder {
    noise_defense: bool,
    decoy_count: usize,
}

impl EnvelopeBuilder {
    /// Payload alone, no decoys.
    pub fn plain() -> Self {
        Self { noise_defense: false, decoy_count: 0 }
    }

    /// Payload hidden among `decoy_count` decoys.
    pub fn noise(decoy_count: usize) -> Self {
        Self { noise_defense: true, decoy_count }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self { noise_defense: config.noise_defense, decoy_count: config.decoy_count }
    }

    /// Wrap `payload`. In noise mode the decoys and the permutation are drawn
    /// fresh from `rng` on every call.
    pub fn build<R: Rng + ?Sized>(&self, payload: CanonicalPayload, rng: &mut R) -> Result<Envelope, SealError> {
        if !self.noise_defense {
            return Envelope::assemble(Mode::Plain, Some(payload), None);
        }

        let mut entries = Vec::with_capacity(self.decoy_count + 1);
        for _ in 0..self.decoy_count {
            entries.push(Entry { tag: EntryTag::Decoy, record: decoy::decoy_like(&payload, rng) });
        }
        entries.push(Entry { tag: EntryTag::Real, record: payload });
        permute::shuffle(&mut entries, rng);

        debug!(entries = entries.len(), "built noise envelope");
        Envelope::assemble(Mode::Noise, None, Some(entries))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    pub(crate) fn sample_payload() -> CanonicalPayload {
        CanonicalPayload::from_parts(
            "1f".repeat(32),
            "2e".repeat(64),
            "3d".repeat(32),
            "univ-1".into(),
            format!("0x{}", "4c".repeat(32)),
            1_700_000_000,
        )
    }

    pub(crate) fn tagged(tag: EntryTag, record: CanonicalPayload) -> Entry {
        Entry { tag, record }
    }

    #[test]
    fn plain_wire_shape() {
        let env = EnvelopeBuilder::plain().build(sample_payload(), &mut ChaCha20Rng::from_seed([0; 32])).unwrap();
        let json = String::from_utf8(env.to_bytes().unwrap()).unwrap();
        assert!(json.starts_with(r#"{"mode":"plain","data":{"fileDigest":"#), "{json}");
        assert!(!json.contains("entries"));
        assert!(json.contains(r#","seal":""#));
    }

    #[test]
    fn noise_wire_shape() {
        let env = EnvelopeBuilder::noise(2).build(sample_payload(), &mut ChaCha20Rng::from_seed([0; 32])).unwrap();
        let json = String::from_utf8(env.to_bytes().unwrap()).unwrap();
        assert!(json.starts_with(r#"{"mode":"noise","entries":[{"tag":"#), "{json}");
        assert!(!json.contains(r#""data""#));
        assert_eq!(json.matches(r#""tag":"real""#).count(), 1);
        assert_eq!(json.matches(r#""tag":"decoy""#).count(), 2);
    }

    #[test]
    fn bytes_roundtrip_and_disambiguate() {
        let mut rng = ChaCha20Rng::from_seed([1; 32]);
        for builder in [EnvelopeBuilder::plain(), EnvelopeBuilder::noise(5)] {
            let env = builder.build(sample_payload(), &mut rng).unwrap();
            let parsed = Envelope::from_bytes(&env.to_bytes().unwrap()).unwrap();
            assert_eq!(parsed, env);
            assert_eq!(parsed.into_real().unwrap(), sample_payload());
        }
    }

    #[test]
    fn real_position_varies_between_calls() {
        let mut rng = ChaCha20Rng::from_seed([2; 32]);
        let builder = EnvelopeBuilder::noise(4);
        let mut positions = std::collections::HashSet::new();
        for _ in 0..40 {
            let env = builder.build(sample_payload(), &mut rng).unwrap();
            let pos = env.entries().unwrap().iter().position(|e| e.tag() == EntryTag::Real).unwrap();
            positions.insert(pos);
        }
        assert_eq!(positions.len(), 5, "real entry confined to {positions:?}");
    }

    #[test]
    fn entries_have_equal_serialized_length() {
        let env = EnvelopeBuilder::noise(6).build(sample_payload(), &mut ChaCha20Rng::from_seed([3; 32])).unwrap();
        let lens: Vec<usize> = env
            .entries()
            .unwrap()
            .iter()
            .map(|e| serde_json::to_vec(e.record()).unwrap().len())
            .collect();
        assert!(lens.windows(2).all(|w| w[0] == w[1]), "{lens:?}");
    }

    #[test]
    fn zero_real_entries_rejected() {
        let entries = vec![tagged(EntryTag::Decoy, sample_payload()), tagged(EntryTag::Decoy, sample_payload())];
        let env = Envelope::assemble(Mode::Noise, None, Some(entries)).unwrap();
        assert!(matches!(env.into_real(), Err(Malformation::RealEntryCount(0))));
    }

    #[test]
    fn two_real_entries_rejected() {
        let entries = vec![
            tagged(EntryTag::Real, sample_payload()),
            tagged(EntryTag::Decoy, sample_payload()),
            tagged(EntryTag::Real, sample_payload()),
        ];
        let env = Envelope::assemble(Mode::Noise, None, Some(entries)).unwrap();
        assert!(matches!(env.into_real(), Err(Malformation::RealEntryCount(2))));
    }

    #[test]
    fn shape_violations_rejected() {
        let no_data = Envelope::assemble(Mode::Plain, None, None).unwrap();
        assert!(matches!(no_data.into_real(), Err(Malformation::ShapeMismatch(_))));

        let both = Envelope::assemble(
            Mode::Noise,
            Some(sample_payload()),
            Some(vec![tagged(EntryTag::Real, sample_payload())]),
        )
        .unwrap();
        assert!(matches!(both.into_real(), Err(Malformation::ShapeMismatch(_))));
    }

    #[test]
    fn seal_mismatch_detected() {
        let env = EnvelopeBuilder::plain().build(sample_payload(), &mut ChaCha20Rng::from_seed([4; 32])).unwrap();
        let json = String::from_utf8(env.to_bytes().unwrap()).unwrap();
        let tampered = json.replace("1700000000", "1700000001");
        assert!(matches!(Envelope::from_bytes(tampered.as_bytes()), Err(Malformation::SealMismatch)));
    }

    #[test]
    fn seal_is_case_sensitive() {
        let env = EnvelopeBuilder::plain().build(sample_payload(), &mut ChaCha20Rng::from_seed([6; 32])).unwrap();
        let json = String::from_utf8(env.to_bytes().unwrap()).unwrap();
        let seal_at = json.rfind(r#""seal":""#).unwrap() + 8;
        let tampered = format!("{}{}", &json[..seal_at], json[seal_at..].to_ascii_uppercase());
        assert_ne!(tampered, json);
        assert!(matches!(Envelope::from_bytes(tampered.as_bytes()), Err(Malformation::SealMismatch)));
    }

    #[test]
    fn unknown_tag_rejected() {
        let env = EnvelopeBuilder::noise(1).build(sample_payload(), &mut ChaCha20Rng::from_seed([5; 32])).unwrap();
        let json = String::from_utf8(env.to_bytes().unwrap()).unwrap();
        let tampered = json.replacen(r#""tag":"real""#, r#""tag":"reaL""#, 1);
        assert!(matches!(Envelope::from_bytes(tampered.as_bytes()), Err(Malformation::InvalidEnvelope(_))));
    }

    #[test]
    fn invalid_utf8_rejected() {
        assert!(matches!(Envelope::from_bytes(&[0x7B, 0xFF, 0x7D]), Err(Malformation::InvalidUtf8)));
    }
}
