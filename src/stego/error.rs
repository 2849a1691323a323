// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the sealing codec.
//!
//! [`SealError`] covers every failure that aborts an operation: missing
//! composer input, insufficient carrier capacity, container faults, budget
//! expiry and collaborator failures. Extraction outcomes (`NotFound`,
//! `Malformed`) and failed verification checks are *results*, not errors,
//! and never appear here.

use core::fmt;

use crate::anchor::AnchorError;
use crate::carrier::CarrierError;
use crate::registry::RegistryError;

/// Errors that abort issuance or a codec operation.
#[derive(Debug)]
pub enum SealError {
    /// A required composer input is absent or empty. Names the field.
    Composition(&'static str),
    /// The framed envelope does not fit the carrier's LSB capacity.
    CapacityExceeded { required_bits: u64, capacity_bits: u64 },
    /// The carrier container could not be decoded or encoded.
    Carrier(CarrierError),
    /// The upload exceeds the configured size limit; nothing was decoded.
    CarrierTooLarge { size: usize, limit: usize },
    /// The per-call time budget ran out.
    TimedOut,
    /// The operation was cancelled by the caller.
    Cancelled,
    /// No key material is registered for the issuer.
    UnknownIssuer(String),
    /// The issuer is registered with a public key only and cannot sign.
    MissingSigningKey(String),
    /// The key registry failed.
    Registry(RegistryError),
    /// The anchor store failed.
    Anchor(AnchorError),
    /// Envelope serialization failed.
    Serialize(serde_json::Error),
    /// Configuration is malformed or inconsistent.
    Config(String),
}

impl fmt::Display for SealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Composition(field) => write!(f, "cannot compose payload: missing {field}"),
            Self::CapacityExceeded { required_bits, capacity_bits } => write!(
                f,
                "payload needs {required_bits} bits but carrier holds {capacity_bits}"
            ),
            Self::Carrier(e) => write!(f, "{e}"),
            Self::CarrierTooLarge { size, limit } => {
                write!(f, "carrier is {size} bytes, limit is {limit}")
            }
            Self::TimedOut => write!(f, "operation exceeded its time budget"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::UnknownIssuer(id) => write!(f, "issuer {id:?} is not registered"),
            Self::MissingSigningKey(id) => write!(f, "issuer {id:?} has no private key"),
            Self::Registry(e) => write!(f, "key registry: {e}"),
            Self::Anchor(e) => write!(f, "anchor store: {e}"),
            Self::Serialize(e) => write!(f, "envelope serialization failed: {e}"),
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for SealError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Carrier(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::Anchor(e) => Some(e),
            Self::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CarrierError> for SealError {
    fn from(e: CarrierError) -> Self {
        Self::Carrier(e)
    }
}

impl From<RegistryError> for SealError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<AnchorError> for SealError {
    fn from(e: AnchorError) -> Self {
        Self::Anchor(e)
    }
}

impl From<serde_json::Error> for SealError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e)
    }
}
