// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Issuer key registry.
//!
//! The codec never knows where keys live. It asks a [`KeyStore`] for the key
//! material registered under an issuer id: issuance needs the private half,
//! verification only the public half. Implementations must be safe for
//! concurrent reads.

mod file;

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

pub use file::FileKeyStore;

/// Key material registered for one issuer.
#[derive(Debug, Clone)]
pub struct IssuerKeys {
    public: VerifyingKey,
    private: Option<SigningKey>,
}

impl IssuerKeys {
    /// Fresh Ed25519 key pair.
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let mut seed = Zeroizing::new([0u8; 32]);
        rng.fill_bytes(&mut *seed);
        Self::from_signing_key(SigningKey::from_bytes(&seed))
    }

    pub fn from_signing_key(private: SigningKey) -> Self {
        Self { public: private.verifying_key(), private: Some(private) }
    }

    /// Verification-only key material.
    pub fn public_only(public: VerifyingKey) -> Self {
        Self { public, private: None }
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.public
    }

    pub fn signing_key(&self) -> Option<&SigningKey> {
        self.private.as_ref()
    }

    /// Copy with the private half dropped.
    pub fn to_public(&self) -> Self {
        Self::public_only(self.public)
    }
}

/// Errors raised by key store implementations.
#[derive(Debug)]
pub enum RegistryError {
    /// Underlying storage failed.
    Io(std::io::Error),
    /// A stored record could not be parsed or is internally inconsistent.
    Corrupt(String),
    /// The issuer id cannot be used as a storage key.
    InvalidIssuerId(String),
    /// The private key could not be sealed or unsealed.
    Sealing,
    /// A writer panicked while holding the store lock.
    Poisoned,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "key store I/O: {e}"),
            Self::Corrupt(msg) => write!(f, "corrupt key record: {msg}"),
            Self::InvalidIssuerId(id) => write!(f, "invalid issuer id {id:?}"),
            Self::Sealing => write!(f, "private key sealing failed (wrong passphrase?)"),
            Self::Poisoned => write!(f, "key store lock poisoned"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Lookup of issuer id → key material.
pub trait KeyStore: Send + Sync {
    /// Key material for `issuer_id`, or `None` if the issuer is unknown.
    fn get(&self, issuer_id: &str) -> Result<Option<IssuerKeys>, RegistryError>;

    /// Public key for `issuer_id`, or `None` if the issuer is unknown.
    ///
    /// Verification only goes through this lookup. Stores that keep private
    /// keys sealed override it so no unsealing happens.
    fn get_public(&self, issuer_id: &str) -> Result<Option<VerifyingKey>, RegistryError> {
        Ok(self.get(issuer_id)?.map(|keys| keys.public))
    }

    /// Register or replace the key material for `issuer_id`.
    fn put(&self, issuer_id: &str, keys: IssuerKeys) -> Result<(), RegistryError>;
}

/// In-process key store.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, IssuerKeys>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, issuer_id: &str) -> Result<Option<IssuerKeys>, RegistryError> {
        let keys = self.keys.read().map_err(|_| RegistryError::Poisoned)?;
        Ok(keys.get(issuer_id).cloned())
    }

    fn put(&self, issuer_id: &str, keys: IssuerKeys) -> Result<(), RegistryError> {
        let mut map = self.keys.write().map_err(|_| RegistryError::Poisoned)?;
        map.insert(issuer_id.to_owned(), keys);
        Ok(())
    }
}
