// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Cryptographic primitives for sealing and verification.
//!
//! - **Carrier digest**: SHA-256 over the decoded carrier with the LSB plane
//!   of R, G and B masked out. It survives embedding unchanged, so the digest
//!   signed at issuance can be recomputed from the sealed output.
//! - **Combined digest**: SHA-256 over `carrier_digest ‖ signature`, the
//!   value recorded at the anchor.
//! - **Signatures**: Ed25519 over the raw 32-byte carrier digest, verified
//!   with `verify_strict`.
//! - **Key sealing**: issuer private keys at rest are encrypted with
//!   AES-256-GCM-SIV under an Argon2id key derived from a store passphrase and
//!   a random per-record salt.

use aes_gcm_siv::aead::Aead;
use aes_gcm_siv::{Aes256GcmSiv, KeyInit, Nonce};
use argon2::Argon2;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::carrier::pixels::COLOR_CHANNELS;
use crate::carrier::PixelBuffer;

/// Length of a SHA-256 digest in bytes.
pub const DIGEST_LEN: usize = 32;
/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;
/// AES-GCM-SIV nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// Argon2 salt length in bytes.
pub const SALT_LEN: usize = 16;

/// SHA-256 of the carrier content, ignoring the embedding plane.
///
/// Layout fed to the hash:
///
/// ```text
/// [4 bytes] width  (BE u32)
/// [4 bytes] height (BE u32)
/// [1 byte ] bytes per pixel (3 or 4)
/// [N bytes] samples; R, G, B with bit 0 cleared, alpha verbatim
/// ```
pub fn carrier_digest(buffer: &PixelBuffer) -> [u8; DIGEST_LEN] {
    let stride = buffer.layout().stride();
    let mut hasher = Sha256::new();
    hasher.update(buffer.width().to_be_bytes());
    hasher.update(buffer.height().to_be_bytes());
    hasher.update([stride as u8]);

    let mut row = Vec::with_capacity(buffer.width() as usize * stride);
    for chunk in buffer.as_bytes().chunks(buffer.width() as usize * stride) {
        row.clear();
        row.extend(chunk.iter().enumerate().map(|(i, &s)| {
            if i % stride < COLOR_CHANNELS { s & !1 } else { s }
        }));
        hasher.update(&row);
    }
    hasher.finalize().into()
}

/// SHA-256 of `file_digest ‖ signature`.
pub fn combined_digest(file_digest: &[u8; DIGEST_LEN], signature: &[u8; SIGNATURE_LEN]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(file_digest);
    hasher.update(signature);
    hasher.finalize().into()
}

/// SHA-256 of arbitrary bytes.
pub fn sha256(data: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(data).into()
}

/// Sign a carrier digest.
pub fn sign_digest(key: &SigningKey, digest: &[u8; DIGEST_LEN]) -> Signature {
    key.sign(digest)
}

/// Verify a signature over a carrier digest. Returns `false` on any mismatch.
pub fn verify_digest(key: &VerifyingKey, digest: &[u8; DIGEST_LEN], signature: &[u8; SIGNATURE_LEN]) -> bool {
    let signature = Signature::from_bytes(signature);
    key.verify_strict(digest, &signature).is_ok()
}

/// Decode a lowercase or uppercase hex string into exactly `N` bytes.
pub fn decode_hex_array<const N: usize>(text: &str) -> Option<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(text, &mut out).ok()?;
    Some(out)
}

/// Derive the AES-256 key protecting a private key record.
fn derive_sealing_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>, argon2::Error> {
    let mut key = Zeroizing::new([0u8; 32]);
    Argon2::default().hash_password_into(passphrase.as_bytes(), salt, &mut *key)?;
    Ok(key)
}

/// Encrypted secret together with the parameters needed to open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext including the 16-byte authentication tag.
    pub ciphertext: Vec<u8>,
}

/// Encrypt `secret` under `passphrase` with a fresh random salt and nonce.
///
/// Returns `None` only if key derivation or the cipher rejects its inputs.
pub fn seal_secret(secret: &[u8], passphrase: &str) -> Option<SealedSecret> {
    let mut rng = rand::rngs::OsRng;
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let key = derive_sealing_key(passphrase, &salt).ok()?;
    let cipher = Aes256GcmSiv::new_from_slice(&*key).ok()?;
    let ciphertext = cipher.encrypt(Nonce::from_slice(&nonce), secret).ok()?;
    Some(SealedSecret { salt, nonce, ciphertext })
}

/// Decrypt a [`SealedSecret`]. Returns `None` for a wrong passphrase or
/// corrupted record.
pub fn open_secret(sealed: &SealedSecret, passphrase: &str) -> Option<Zeroizing<Vec<u8>>> {
    let key = derive_sealing_key(passphrase, &sealed.salt).ok()?;
    let cipher = Aes256GcmSiv::new_from_slice(&*key).ok()?;
    cipher
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .ok()
        .map(Zeroizing::new)
}
