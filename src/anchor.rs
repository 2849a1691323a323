// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Immutable anchor store.
//!
//! At issuance the combined digest is written to an external append-only
//! store and the returned reference travels inside the payload. At
//! verification the reference is looked up again and the stored digest is
//! compared against a freshly recomputed one. How the store reaches
//! consensus is its own business; the codec only needs `write` and `read`.
//!
//! Records also name the issuer that wrote them, so a payload cannot borrow
//! an anchor written for somebody else.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use rand::RngCore;

use crate::stego::crypto::DIGEST_LEN;

/// Length of a `0x`-prefixed 64-hex reference.
pub const HEX_REFERENCE_LEN: usize = 2 + 2 * 32;

/// What the anchor store holds for one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorRecord {
    pub digest: [u8; DIGEST_LEN],
    pub issuer_id: String,
}

/// Errors raised by anchor store implementations.
#[derive(Debug)]
pub enum AnchorError {
    /// The store could not be reached or refused the request.
    Unavailable(String),
    /// A writer panicked while holding the store lock.
    Poisoned,
}

impl fmt::Display for AnchorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "anchor store unavailable: {msg}"),
            Self::Poisoned => write!(f, "anchor store lock poisoned"),
        }
    }
}

impl std::error::Error for AnchorError {}

/// Append-only reference → record store.
pub trait AnchorStore: Send + Sync {
    /// Record `record` and return the reference it can be read back under.
    fn write(&self, record: AnchorRecord) -> Result<String, AnchorError>;

    /// The record stored under `reference`, or `None` if there is none.
    fn read(&self, reference: &str) -> Result<Option<AnchorRecord>, AnchorError>;

    /// Longest reference `write` returns. Issuance sizes the payload with it
    /// before anything is written.
    fn max_reference_len(&self) -> usize {
        HEX_REFERENCE_LEN
    }
}

/// In-process anchor store issuing `0x`-prefixed 64-hex references.
#[derive(Debug, Default)]
pub struct MemoryAnchorStore {
    records: RwLock<HashMap<String, AnchorRecord>>,
}

impl MemoryAnchorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnchorStore for MemoryAnchorStore {
    fn write(&self, record: AnchorRecord) -> Result<String, AnchorError> {
        let mut records = self.records.write().map_err(|_| AnchorError::Poisoned)?;
        loop {
            let mut id = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut id);
            let reference = format!("0x{}", hex::encode(id));
            if !records.contains_key(&reference) {
                records.insert(reference.clone(), record);
                return Ok(reference);
            }
        }
    }

    fn read(&self, reference: &str) -> Result<Option<AnchorRecord>, AnchorError> {
        let records = self.records.read().map_err(|_| AnchorError::Poisoned)?;
        Ok(records.get(reference).cloned())
    }
}
