// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Decoy generation.
//!
//! A decoy is a [`CanonicalPayload`]-shaped record filled with random values
//! drawn from the same alphabets as the real entry, with every field exactly
//! as long (in bytes and after JSON escaping) as its real counterpart. Length
//! or alphabet analysis of an envelope therefore cannot single out the real
//! entry.
//!
//! - file digest and signature: random bytes, lowercase hex
//! - combined digest: `SHA-256(fileDigest ‖ signature)` over the decoy's own
//!   random values, so every entry passes the same consistency check
//! - issuer id and anchor reference: mimicked character by character
//!   (lowercase → lowercase, uppercase → uppercase, digit → digit, anything
//!   else kept), with hex strings and `0x` prefixes preserved as such
//! - issuance time: copied from the real entry

use rand::{Rng, RngCore};

use crate::stego::crypto::{self, DIGEST_LEN, SIGNATURE_LEN};
use crate::stego::payload::CanonicalPayload;

const HEX_LOWER: &[u8; 16] = b"0123456789abcdef";
const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Generate one decoy shaped like `real`.
pub fn decoy_like<R: Rng + ?Sized>(real: &CanonicalPayload, rng: &mut R) -> CanonicalPayload {
    let mut file_digest = [0u8; DIGEST_LEN];
    rng.fill_bytes(&mut file_digest);
    let mut signature = [0u8; SIGNATURE_LEN];
    rng.fill_bytes(&mut signature);
    let combined = crypto::combined_digest(&file_digest, &signature);

    CanonicalPayload::from_parts(
        hex::encode(file_digest),
        hex::encode(signature),
        hex::encode(combined),
        mimic(real.issuer_id(), rng),
        mimic(real.anchor_reference(), rng),
        real.issued_at(),
    )
}

fn random_from<R: Rng + ?Sized>(alphabet: &[u8], len: usize, rng: &mut R) -> String {
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len() as u32) as usize] as char)
        .collect()
}

/// Hex with at least one letter, all letters in one case.
fn hex_case(s: &str) -> Option<&'static [u8; 16]> {
    let digits_only = s.bytes().all(|b| b.is_ascii_digit());
    if s.is_empty() || digits_only {
        return None;
    }
    if s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
        Some(HEX_LOWER)
    } else if s.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)) {
        Some(HEX_UPPER)
    } else {
        None
    }
}

/// Produce a random string with the same byte length and character classes
/// as `template`.
pub(crate) fn mimic<R: Rng + ?Sized>(template: &str, rng: &mut R) -> String {
    if let Some(rest) = template.strip_prefix("0x") {
        return format!("0x{}", mimic(rest, rng));
    }
    if let Some(alphabet) = hex_case(template) {
        return random_from(alphabet, template.len(), rng);
    }
    template
        .chars()
        .map(|c| match c {
            'a'..='z' => rng.gen_range(b'a'..=b'z') as char,
            'A'..='Z' => rng.gen_range(b'A'..=b'Z') as char,
            '0'..='9' => rng.gen_range(b'0'..=b'9') as char,
            other => other,
        })
        .collect()
}
