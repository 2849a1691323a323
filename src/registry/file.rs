// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Directory-backed key store.
//!
//! One JSON record per issuer, named `<issuer_id>.json`:
//!
//! ```json
//! {
//!   "issuer_id": "univ-1",
//!   "public_key": "<64 hex>",
//!   "sealed_private": { "salt": "<32 hex>", "nonce": "<24 hex>", "ciphertext": "<96 hex>" }
//! }
//! ```
//!
//! The private key is sealed with AES-256-GCM-SIV under an Argon2id key
//! derived from the store passphrase and the record's own random salt.
//! `sealed_private` is absent for verification-only issuers. Public key
//! lookups never touch it, so a store opened without the passphrase still
//! serves verification.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{IssuerKeys, KeyStore, RegistryError};
use crate::stego::crypto::{self, SealedSecret, NONCE_LEN, SALT_LEN};

/// Longest issuer id accepted as a file name.
const MAX_ISSUER_ID_LEN: usize = 128;

#[derive(Serialize, Deserialize)]
struct KeyRecord {
    issuer_id: String,
    public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sealed_private: Option<SealedRecord>,
}

#[derive(Serialize, Deserialize)]
struct SealedRecord {
    salt: String,
    nonce: String,
    ciphertext: String,
}

/// Key store persisting sealed records under a directory.
pub struct FileKeyStore {
    dir: PathBuf,
    passphrase: Zeroizing<String>,
}

impl std::fmt::Debug for FileKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKeyStore").field("dir", &self.dir).finish_non_exhaustive()
    }
}

impl FileKeyStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>, passphrase: &str) -> Result<Self, RegistryError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, passphrase: Zeroizing::new(passphrase.to_owned()) })
    }

    fn record_path(&self, issuer_id: &str) -> Result<PathBuf, RegistryError> {
        let valid = !issuer_id.is_empty()
            && issuer_id.len() <= MAX_ISSUER_ID_LEN
            && !issuer_id.starts_with('.')
            && issuer_id.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
        if !valid {
            return Err(RegistryError::InvalidIssuerId(issuer_id.to_owned()));
        }
        Ok(self.dir.join(format!("{issuer_id}.json")))
    }

    fn seal(&self, key: &SigningKey) -> Result<SealedRecord, RegistryError> {
        let secret = Zeroizing::new(key.to_bytes());
        let sealed = crypto::seal_secret(&*secret, &self.passphrase).ok_or(RegistryError::Sealing)?;
        Ok(SealedRecord {
            salt: hex::encode(sealed.salt),
            nonce: hex::encode(sealed.nonce),
            ciphertext: hex::encode(sealed.ciphertext),
        })
    }

    /// Parsed record and its public key, or `None` if no record exists.
    fn read_record(&self, issuer_id: &str) -> Result<Option<(KeyRecord, VerifyingKey)>, RegistryError> {
        let path = self.record_path(issuer_id)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: KeyRecord =
            serde_json::from_str(&text).map_err(|e| RegistryError::Corrupt(e.to_string()))?;
        if record.issuer_id != issuer_id {
            return Err(RegistryError::Corrupt(format!("record names issuer {:?}", record.issuer_id)));
        }

        let public_bytes: [u8; 32] = crypto::decode_hex_array(&record.public_key)
            .ok_or_else(|| RegistryError::Corrupt("public key".into()))?;
        let public = VerifyingKey::from_bytes(&public_bytes)
            .map_err(|_| RegistryError::Corrupt("public key is not a curve point".into()))?;
        Ok(Some((record, public)))
    }

    fn unseal(&self, record: &SealedRecord) -> Result<SigningKey, RegistryError> {
        let salt: [u8; SALT_LEN] = crypto::decode_hex_array(&record.salt)
            .ok_or_else(|| RegistryError::Corrupt("salt".into()))?;
        let nonce: [u8; NONCE_LEN] = crypto::decode_hex_array(&record.nonce)
            .ok_or_else(|| RegistryError::Corrupt("nonce".into()))?;
        let ciphertext =
            hex::decode(&record.ciphertext).map_err(|_| RegistryError::Corrupt("ciphertext".into()))?;

        let secret = crypto::open_secret(&SealedSecret { salt, nonce, ciphertext }, &self.passphrase)
            .ok_or(RegistryError::Sealing)?;
        let seed: Zeroizing<[u8; 32]> = Zeroizing::new(
            secret
                .as_slice()
                .try_into()
                .map_err(|_| RegistryError::Corrupt("private key length".into()))?,
        );
        Ok(SigningKey::from_bytes(&seed))
    }
}

impl KeyStore for FileKeyStore {
    fn get(&self, issuer_id: &str) -> Result<Option<IssuerKeys>, RegistryError> {
        let Some((record, public)) = self.read_record(issuer_id)? else {
            return Ok(None);
        };
        match record.sealed_private {
            None => Ok(Some(IssuerKeys::public_only(public))),
            Some(sealed) => {
                let private = self.unseal(&sealed)?;
                if private.verifying_key() != public {
                    return Err(RegistryError::Corrupt("private key does not match public key".into()));
                }
                Ok(Some(IssuerKeys::from_signing_key(private)))
            }
        }
    }

    fn get_public(&self, issuer_id: &str) -> Result<Option<VerifyingKey>, RegistryError> {
        Ok(self.read_record(issuer_id)?.map(|(_, public)| public))
    }

    fn put(&self, issuer_id: &str, keys: IssuerKeys) -> Result<(), RegistryError> {
        let path = self.record_path(issuer_id)?;
        let sealed_private = keys.signing_key().map(|k| self.seal(k)).transpose()?;
        let record = KeyRecord {
            issuer_id: issuer_id.to_owned(),
            public_key: hex::encode(keys.verifying_key().as_bytes()),
            sealed_private,
        };
        let json = serde_json::to_vec_pretty(&record).map_err(|e| RegistryError::Corrupt(e.to_string()))?;

        // Unique temp file per writer, renamed over the record atomically.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&path).map_err(|e| RegistryError::Io(e.error))?;
        Ok(())
    }
}
