// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # tamperseal-core
//!
//! Pure-Rust sealing codec for issued documents carried as PNG images. An
//! issuer signs the carrier's pixel content, anchors the combined digest in an
//! append-only store, and hides the resulting record in the least-significant
//! bits of the image itself. Anyone holding the sealed file can later verify
//! it against the key registry and the anchor store.
//!
//! Two envelope modes:
//!
//! - **Plain**: the record alone.
//! - **Noise**: the record shuffled among same-shaped decoys, so a reader
//!   of the raw bits cannot tell which entry is real without the tag.
//!
//! Verification is fail-closed: every call ends in `Valid`, `Invalid` or
//! `Faulted`, and only an intact seal whose signature and anchor both match
//! the presented pixels yields `Valid`.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use tamperseal_core::{CodecConfig, IssuerKeys, Issuer, KeyStore, MemoryAnchorStore, MemoryKeyStore, Verifier};
//!
//! let keys = MemoryKeyStore::new();
//! keys.put("univ-1", IssuerKeys::generate(&mut rand::rngs::OsRng)).unwrap();
//! let anchors = MemoryAnchorStore::new();
//!
//! let png = std::fs::read("diploma.png").unwrap();
//! let issued = Issuer::new(&keys, &anchors, CodecConfig::default())
//!     .issue(&png, "univ-1", 1_700_000_000)
//!     .unwrap();
//! let outcome = Verifier::new(&keys, &anchors, CodecConfig::default()).verify(&issued.carrier);
//! assert!(outcome.is_valid());
//! ```

pub mod anchor;
pub mod carrier;
pub mod config;
pub mod issue;
pub mod registry;
pub mod stego;
pub mod verify;

pub use anchor::{AnchorError, AnchorRecord, AnchorStore, MemoryAnchorStore};
pub use carrier::{decode_png, encode_png, CarrierError, ChannelLayout, PixelBuffer};
pub use config::CodecConfig;
pub use issue::{Issuance, Issuer};
pub use registry::{FileKeyStore, IssuerKeys, KeyStore, MemoryKeyStore, RegistryError};
pub use stego::{Budget, CancelFlag, CanonicalPayload, EnvelopeBuilder, ExtractionResult, Malformation, Mode, SealError};
pub use verify::{Check, Stage, TerminalState, VerificationOutcome, Verifier};
