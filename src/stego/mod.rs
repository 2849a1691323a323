// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Steganographic sealing codec.
//!
//! Issuance side, leaves first:
//!
//! - **Composer** (`payload`): builds the canonical tamper-binding record.
//! - **Envelope builder** (`envelope`, `decoy`, `permute`): wraps the record
//!   alone ("plain") or shuffled among same-shaped decoys ("noise").
//! - **Embedder** (`frame`, `embed`): length-prefixed, marker-terminated
//!   bitstream written into R, G, B least-significant bits.
//!
//! Verification side:
//!
//! - **Extractor** (`extract`): reads the bitstream back, checks framing and
//!   the envelope seal, and picks the single real record.
//!
//! `budget` bounds each call in time; `capacity` answers sizing questions
//! before any pixel is touched.

pub mod budget;
pub mod capacity;
pub mod crypto;
pub mod decoy;
pub mod embed;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod frame;
pub mod payload;
pub mod permute;

pub use budget::{Budget, CancelFlag};
pub use embed::{embed_envelope, embed_frame};
pub use envelope::{Entry, EntryTag, Envelope, EnvelopeBuilder, Mode};
pub use error::SealError;
pub use extract::{extract, scan_frame, ExtractionResult, FrameScan, Malformation};
pub use payload::{CanonicalPayload, PayloadComposer};
