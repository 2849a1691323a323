// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! End-to-end verification scenarios: the happy path, fail-closed handling
//! of unsealed carriers, issuer and anchor mismatches, and faults.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tamperseal_core::{
    encode_png, AnchorError, AnchorRecord, AnchorStore, CancelFlag, ChannelLayout, Check, CodecConfig, IssuerKeys,
    Issuer, KeyStore, MemoryAnchorStore, MemoryKeyStore, PixelBuffer, RegistryError, SealError, Stage,
    TerminalState, Verifier,
};

const ISSUED_AT: u64 = 1_700_000_000;

fn carrier_png(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let mut data = vec![0u8; width as usize * height as usize * 3];
    ChaCha20Rng::from_seed([seed; 32]).fill_bytes(&mut data);
    encode_png(&PixelBuffer::new(width, height, ChannelLayout::Rgb, data).unwrap()).unwrap()
}

fn registry(issuers: &[&str]) -> MemoryKeyStore {
    let keys = MemoryKeyStore::new();
    for (i, issuer) in issuers.iter().enumerate() {
        keys.put(issuer, IssuerKeys::generate(&mut ChaCha20Rng::seed_from_u64(i as u64))).unwrap();
    }
    keys
}

/// Anchor store whose backend is down.
struct UnreachableAnchors;

impl AnchorStore for UnreachableAnchors {
    fn write(&self, _record: AnchorRecord) -> Result<String, AnchorError> {
        Err(AnchorError::Unavailable("connection refused".into()))
    }

    fn read(&self, _reference: &str) -> Result<Option<AnchorRecord>, AnchorError> {
        Err(AnchorError::Unavailable("connection refused".into()))
    }
}

/// Key store whose backend is down.
struct UnreachableKeys;

impl KeyStore for UnreachableKeys {
    fn get(&self, _issuer_id: &str) -> Result<Option<IssuerKeys>, RegistryError> {
        Err(RegistryError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "registry timeout")))
    }

    fn put(&self, _issuer_id: &str, _keys: IssuerKeys) -> Result<(), RegistryError> {
        Err(RegistryError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "registry timeout")))
    }
}

#[test]
fn diploma_example() {
    // 64×64 RGB carrier, issuer "univ-1", plain mode.
    let keys = registry(&["univ-1"]);
    let anchors = MemoryAnchorStore::new();
    let original = carrier_png(64, 64, 1);

    let issued = Issuer::new(&keys, &anchors, CodecConfig::default())
        .issue(&original, "univ-1", ISSUED_AT)
        .unwrap();
    assert_eq!(anchors.len(), 1);
    let payload = &issued.payload;
    assert_eq!(payload.issuer_id(), "univ-1");
    assert_eq!(payload.issued_at(), ISSUED_AT);
    assert_eq!(payload.file_digest().len(), 64);
    assert_eq!(payload.signature().len(), 128);
    assert_eq!(payload.combined_digest().len(), 64);
    assert!(payload.anchor_reference().starts_with("0x"));

    let verifier = Verifier::new(&keys, &anchors, CodecConfig::default());
    let outcome = verifier.verify(&issued.carrier);
    assert_eq!(outcome.state, TerminalState::Valid);
    assert!(outcome.signature_valid() && outcome.anchor_valid());
    assert_eq!(outcome.reason, None);

    // The unsealed original carries nothing.
    let outcome = verifier.verify(&original);
    assert_eq!(outcome.state, TerminalState::Invalid);
    assert_eq!(outcome.failed_at, Some(Stage::Extraction));
    assert_eq!(outcome.signature, Check::NotAttempted);
    assert_eq!(outcome.anchor, Check::NotAttempted);
    assert!(outcome.recovered.is_none());
}

#[test]
fn verification_is_repeatable() {
    let keys = registry(&["univ-1"]);
    let anchors = MemoryAnchorStore::new();
    let issued = Issuer::new(&keys, &anchors, CodecConfig::default())
        .issue(&carrier_png(64, 64, 2), "univ-1", ISSUED_AT)
        .unwrap();

    let verifier = Verifier::new(&keys, &anchors, CodecConfig::default());
    let first = verifier.verify(&issued.carrier);
    let second = verifier.verify(&issued.carrier);
    assert_eq!(first, second);
    assert!(first.is_valid());
}

#[test]
fn unknown_issuer_cannot_issue() {
    let keys = registry(&["univ-1"]);
    let anchors = MemoryAnchorStore::new();
    let result = Issuer::new(&keys, &anchors, CodecConfig::default()).issue(&carrier_png(64, 64, 3), "univ-2", ISSUED_AT);
    assert!(matches!(result, Err(SealError::UnknownIssuer(ref id)) if id == "univ-2"), "{result:?}");
    assert!(anchors.is_empty());
}

#[test]
fn public_only_issuer_cannot_issue() {
    let keys = MemoryKeyStore::new();
    let pair = IssuerKeys::generate(&mut ChaCha20Rng::from_seed([4; 32]));
    keys.put("univ-1", pair.to_public()).unwrap();
    let anchors = MemoryAnchorStore::new();
    let result = Issuer::new(&keys, &anchors, CodecConfig::default()).issue(&carrier_png(64, 64, 4), "univ-1", ISSUED_AT);
    assert!(matches!(result, Err(SealError::MissingSigningKey(_))), "{result:?}");
}

#[test]
fn unregistered_issuer_fails_signature() {
    let issuing_keys = registry(&["univ-1"]);
    let anchors = MemoryAnchorStore::new();
    let issued = Issuer::new(&issuing_keys, &anchors, CodecConfig::default())
        .issue(&carrier_png(64, 64, 5), "univ-1", ISSUED_AT)
        .unwrap();

    let empty = MemoryKeyStore::new();
    let outcome = Verifier::new(&empty, &anchors, CodecConfig::default()).verify(&issued.carrier);
    assert_eq!(outcome.state, TerminalState::Invalid);
    assert_eq!(outcome.failed_at, Some(Stage::Signature));
    assert_eq!(outcome.signature, Check::Failed);
    // The anchor still matches; both checks are reported.
    assert_eq!(outcome.anchor, Check::Passed);
}

#[test]
fn rotated_key_fails_signature() {
    let keys = registry(&["univ-1"]);
    let anchors = MemoryAnchorStore::new();
    let issued = Issuer::new(&keys, &anchors, CodecConfig::default())
        .issue(&carrier_png(64, 64, 6), "univ-1", ISSUED_AT)
        .unwrap();

    keys.put("univ-1", IssuerKeys::generate(&mut ChaCha20Rng::from_seed([99; 32]))).unwrap();
    let outcome = Verifier::new(&keys, &anchors, CodecConfig::default()).verify(&issued.carrier);
    assert_eq!(outcome.failed_at, Some(Stage::Signature));
    assert!(!outcome.signature_valid());
    assert!(outcome.anchor_valid());
}

#[test]
fn missing_anchor_fails_anchor_check() {
    let keys = registry(&["univ-1"]);
    let issuing_anchors = MemoryAnchorStore::new();
    let issued = Issuer::new(&keys, &issuing_anchors, CodecConfig::default())
        .issue(&carrier_png(64, 64, 7), "univ-1", ISSUED_AT)
        .unwrap();

    let other_anchors = MemoryAnchorStore::new();
    let outcome = Verifier::new(&keys, &other_anchors, CodecConfig::default()).verify(&issued.carrier);
    assert_eq!(outcome.state, TerminalState::Invalid);
    assert_eq!(outcome.failed_at, Some(Stage::Anchor));
    assert!(outcome.signature_valid());
    assert_eq!(outcome.anchor, Check::Failed);
    assert!(outcome.reason.unwrap().contains("not found"));
}

/// Anchor store that serves a fixed record for every reference.
struct FixedAnchor(AnchorRecord);

impl AnchorStore for FixedAnchor {
    fn write(&self, _record: AnchorRecord) -> Result<String, AnchorError> {
        Err(AnchorError::Unavailable("read-only".into()))
    }

    fn read(&self, _reference: &str) -> Result<Option<AnchorRecord>, AnchorError> {
        Ok(Some(self.0.clone()))
    }
}

#[test]
fn anchor_for_another_issuer_is_rejected() {
    let keys = registry(&["univ-1"]);
    let anchors = MemoryAnchorStore::new();
    let issued = Issuer::new(&keys, &anchors, CodecConfig::default())
        .issue(&carrier_png(64, 64, 8), "univ-1", ISSUED_AT)
        .unwrap();
    let genuine = anchors.read(issued.payload.anchor_reference()).unwrap().unwrap();
    assert_eq!(genuine.issuer_id, "univ-1");

    // Same digest, different issuer on record.
    let borrowed = FixedAnchor(AnchorRecord { issuer_id: "univ-2".into(), ..genuine.clone() });
    let outcome = Verifier::new(&keys, &borrowed, CodecConfig::default()).verify(&issued.carrier);
    assert_eq!(outcome.failed_at, Some(Stage::Anchor));
    assert!(outcome.signature_valid());
    assert!(!outcome.anchor_valid());

    // Right issuer, wrong digest.
    let mut digest = genuine.digest;
    digest[0] ^= 1;
    let forged = FixedAnchor(AnchorRecord { digest, ..genuine });
    let outcome = Verifier::new(&keys, &forged, CodecConfig::default()).verify(&issued.carrier);
    assert_eq!(outcome.failed_at, Some(Stage::Anchor));
    assert!(outcome.reason.unwrap().contains("digest"));
}

#[test]
fn corrupt_upload_is_a_fault() {
    let keys = registry(&["univ-1"]);
    let anchors = MemoryAnchorStore::new();
    let outcome = Verifier::new(&keys, &anchors, CodecConfig::default()).verify(b"\x89PNG\r\n\x1a\nnot really");
    assert_eq!(outcome.state, TerminalState::Faulted);
    assert_eq!(outcome.failed_at, Some(Stage::Extraction));
    assert!(!outcome.is_valid());
}

#[test]
fn oversize_upload_is_a_fault() {
    let keys = registry(&["univ-1"]);
    let anchors = MemoryAnchorStore::new();
    let config = CodecConfig { max_carrier_bytes: 1024, ..CodecConfig::default() };
    let png = carrier_png(64, 64, 9);
    assert!(png.len() > 1024);

    let outcome = Verifier::new(&keys, &anchors, config.clone()).verify(&png);
    assert_eq!(outcome.state, TerminalState::Faulted);
    assert_eq!(outcome.failed_at, Some(Stage::Extraction));

    let result = Issuer::new(&keys, &anchors, config).issue(&png, "univ-1", ISSUED_AT);
    assert!(matches!(result, Err(SealError::CarrierTooLarge { limit: 1024, .. })), "{result:?}");
}

#[test]
fn collaborator_outages_are_faults() {
    let keys = registry(&["univ-1"]);
    let anchors = MemoryAnchorStore::new();
    let issued = Issuer::new(&keys, &anchors, CodecConfig::default())
        .issue(&carrier_png(64, 64, 10), "univ-1", ISSUED_AT)
        .unwrap();

    let outcome = Verifier::new(&UnreachableKeys, &anchors, CodecConfig::default()).verify(&issued.carrier);
    assert_eq!(outcome.state, TerminalState::Faulted);
    assert_eq!(outcome.failed_at, Some(Stage::Signature));
    assert!(outcome.recovered.is_some());

    let outcome = Verifier::new(&keys, &UnreachableAnchors, CodecConfig::default()).verify(&issued.carrier);
    assert_eq!(outcome.state, TerminalState::Faulted);
    assert_eq!(outcome.failed_at, Some(Stage::Anchor));
    assert!(outcome.signature_valid());

    let result = Issuer::new(&keys, &UnreachableAnchors, CodecConfig::default()).issue(
        &carrier_png(64, 64, 11),
        "univ-1",
        ISSUED_AT,
    );
    assert!(matches!(result, Err(SealError::Anchor(_))), "{result:?}");
}

#[test]
fn cancelled_verification_is_a_fault() {
    let keys = registry(&["univ-1"]);
    let anchors = MemoryAnchorStore::new();
    let issued = Issuer::new(&keys, &anchors, CodecConfig::default())
        .issue(&carrier_png(64, 64, 12), "univ-1", ISSUED_AT)
        .unwrap();

    let cancel = CancelFlag::new();
    cancel.cancel();
    let outcome = Verifier::new(&keys, &anchors, CodecConfig::default()).verify_cancellable(&issued.carrier, &cancel);
    assert_eq!(outcome.state, TerminalState::Faulted);
    assert_eq!(outcome.failed_at, Some(Stage::Extraction));
}

#[test]
fn exhausted_budget_is_a_fault() {
    let keys = registry(&["univ-1"]);
    let anchors = MemoryAnchorStore::new();
    let issued = Issuer::new(&keys, &anchors, CodecConfig::default())
        .issue(&carrier_png(64, 64, 13), "univ-1", ISSUED_AT)
        .unwrap();

    let config = CodecConfig { budget_base_ms: 0, budget_per_megapixel_ms: 0, ..CodecConfig::default() };
    let outcome = Verifier::new(&keys, &anchors, config).verify(&issued.carrier);
    assert_eq!(outcome.state, TerminalState::Faulted);
    assert!(outcome.reason.unwrap().contains("time"));
}
