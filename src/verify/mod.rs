// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Fail-closed verification state machine.
//!
//! ```text
//! Start → Extracting → HashRecompute → SignatureCheck → AnchorCheck → Valid
//!   │          │                             │               │        Invalid
//!   └──────────┴───────── Faulted ───────────┴───────────────┘
//! ```
//!
//! - **Start**: reject uploads above the size limit before decoding.
//! - **Extracting**: decode the PNG and run extraction under a time budget.
//!   `NotFound` / `Malformed` end in `Invalid` at `extraction` with both
//!   checks not attempted.
//! - **HashRecompute**: digest the presented carrier itself. Digests claimed
//!   inside the payload are never used.
//! - **SignatureCheck**: verify the embedded signature over the recomputed
//!   digest with the key registered for the embedded issuer id.
//! - **AnchorCheck**: recompute the combined digest and compare it with the
//!   anchored one; the anchored issuer must equal the embedded issuer.
//!
//! Both checks always run once extraction succeeds, so the outcome reports
//! each of them; `failed_at` names the first that failed. Container faults,
//! collaborator errors and budget expiry end in `Faulted`, never `Invalid`.

mod outcome;

use tracing::{debug, error, info, warn};

pub use outcome::{Check, Stage, TerminalState, VerificationOutcome};

use crate::anchor::{AnchorError, AnchorStore};
use crate::carrier::{self, PixelBuffer};
use crate::config::CodecConfig;
use crate::registry::{KeyStore, RegistryError};
use crate::stego::budget::{Budget, CancelFlag};
use crate::stego::crypto::{self, DIGEST_LEN, SIGNATURE_LEN};
use crate::stego::extract::{self, ExtractionResult};
use crate::stego::payload::CanonicalPayload;

/// Result of one check, with the reason when it failed.
#[derive(Debug, Clone)]
struct Verdict {
    check: Check,
    reason: Option<&'static str>,
}

impl Verdict {
    fn passed() -> Self {
        Self { check: Check::Passed, reason: None }
    }

    fn failed(reason: &'static str) -> Self {
        Self { check: Check::Failed, reason: Some(reason) }
    }
}

enum State {
    Start,
    Extracting,
    HashRecompute { carrier: PixelBuffer, recovered: CanonicalPayload },
    SignatureCheck { digest: [u8; DIGEST_LEN], recovered: CanonicalPayload },
    AnchorCheck { digest: [u8; DIGEST_LEN], recovered: CanonicalPayload, signature: Verdict },
    Done(VerificationOutcome),
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Extracting => "extracting",
            Self::HashRecompute { .. } => "hash_recompute",
            Self::SignatureCheck { .. } => "signature_check",
            Self::AnchorCheck { .. } => "anchor_check",
            Self::Done(_) => "done",
        }
    }
}

/// Verifies sealed carriers against the key registry and the anchor store.
pub struct Verifier<'a> {
    keys: &'a dyn KeyStore,
    anchors: &'a dyn AnchorStore,
    config: CodecConfig,
}

impl<'a> Verifier<'a> {
    pub fn new(keys: &'a dyn KeyStore, anchors: &'a dyn AnchorStore, config: CodecConfig) -> Self {
        Self { keys, anchors, config }
    }

    /// Verify one uploaded carrier. Always returns a definite outcome.
    pub fn verify(&self, carrier_bytes: &[u8]) -> VerificationOutcome {
        self.run(carrier_bytes, None)
    }

    /// Like [`verify`](Self::verify), abandoning work once `cancel` is set.
    /// A cancelled call ends in `Faulted`.
    pub fn verify_cancellable(&self, carrier_bytes: &[u8], cancel: &CancelFlag) -> VerificationOutcome {
        self.run(carrier_bytes, Some(cancel))
    }

    /// Verify several carriers independently.
    ///
    /// With the `parallel` feature the carriers are spread over the rayon
    /// thread pool; otherwise they are processed in order.
    pub fn verify_batch(&self, carriers: &[&[u8]]) -> Vec<VerificationOutcome> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            carriers.par_iter().map(|bytes| self.verify(bytes)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            carriers.iter().map(|bytes| self.verify(bytes)).collect()
        }
    }

    fn run(&self, carrier_bytes: &[u8], cancel: Option<&CancelFlag>) -> VerificationOutcome {
        let mut state = State::Start;
        loop {
            state = match state {
                State::Done(outcome) => {
                    log_outcome(&outcome);
                    return outcome;
                }
                other => {
                    let from = other.name();
                    let next = self.step(other, carrier_bytes, cancel);
                    debug!(from, to = next.name(), "verification step");
                    next
                }
            };
        }
    }

    fn step(&self, state: State, carrier_bytes: &[u8], cancel: Option<&CancelFlag>) -> State {
        match state {
            State::Start => {
                if carrier_bytes.len() > self.config.max_carrier_bytes {
                    return State::Done(VerificationOutcome::faulted(
                        Stage::Extraction,
                        format!(
                            "upload is {} bytes, limit is {}",
                            carrier_bytes.len(),
                            self.config.max_carrier_bytes
                        ),
                    ));
                }
                State::Extracting
            }

            State::Extracting => {
                let carrier = match carrier::decode_png(carrier_bytes, &self.config) {
                    Ok(carrier) => carrier,
                    Err(e) => return State::Done(VerificationOutcome::faulted(Stage::Extraction, e.to_string())),
                };
                let mut budget = Budget::with_limit(self.config.time_budget(carrier.pixel_count()));
                if let Some(flag) = cancel {
                    budget = budget.with_cancel(flag.clone());
                }
                match extract::extract(&carrier, &budget) {
                    Err(e) => State::Done(VerificationOutcome::faulted(Stage::Extraction, e.to_string())),
                    Ok(ExtractionResult::NotFound) => State::Done(VerificationOutcome::extraction_failed(
                        "no embedded seal found".into(),
                    )),
                    Ok(ExtractionResult::Malformed(m)) => {
                        State::Done(VerificationOutcome::extraction_failed(m.to_string()))
                    }
                    Ok(ExtractionResult::Recovered(recovered)) => State::HashRecompute { carrier, recovered },
                }
            }

            State::HashRecompute { carrier, recovered } => {
                let digest = crypto::carrier_digest(&carrier);
                debug!(digest = %hex::encode(digest), "recomputed carrier digest");
                State::SignatureCheck { digest, recovered }
            }

            State::SignatureCheck { digest, recovered } => match self.check_signature(&digest, &recovered) {
                Ok(signature) => State::AnchorCheck { digest, recovered, signature },
                Err(e) => State::Done(VerificationOutcome {
                    recovered: Some(recovered),
                    ..VerificationOutcome::faulted(Stage::Signature, format!("key registry: {e}"))
                }),
            },

            State::AnchorCheck { digest, recovered, signature } => {
                match self.check_anchor(&digest, &recovered) {
                    Ok(anchor) => State::Done(decide(signature, anchor, recovered)),
                    Err(e) => State::Done(VerificationOutcome {
                        signature: signature.check,
                        recovered: Some(recovered),
                        ..VerificationOutcome::faulted(Stage::Anchor, e.to_string())
                    }),
                }
            }

            State::Done(outcome) => State::Done(outcome),
        }
    }

    fn check_signature(&self, digest: &[u8; DIGEST_LEN], recovered: &CanonicalPayload) -> Result<Verdict, RegistryError> {
        let Some(signature) = crypto::decode_hex_array::<SIGNATURE_LEN>(recovered.signature()) else {
            return Ok(Verdict::failed("embedded signature is not 128 hex characters"));
        };
        let public = match self.keys.get_public(recovered.issuer_id()) {
            Ok(Some(public)) => public,
            Ok(None) | Err(RegistryError::InvalidIssuerId(_)) => {
                return Ok(Verdict::failed("issuer is not registered"))
            }
            Err(e) => return Err(e),
        };
        if crypto::verify_digest(&public, digest, &signature) {
            Ok(Verdict::passed())
        } else {
            Ok(Verdict::failed("signature does not match the presented carrier"))
        }
    }

    fn check_anchor(&self, digest: &[u8; DIGEST_LEN], recovered: &CanonicalPayload) -> Result<Verdict, AnchorError> {
        let Some(signature) = crypto::decode_hex_array::<SIGNATURE_LEN>(recovered.signature()) else {
            return Ok(Verdict::failed("combined digest cannot be recomputed from the embedded signature"));
        };
        let combined = crypto::combined_digest(digest, &signature);
        let Some(record) = self.anchors.read(recovered.anchor_reference())? else {
            return Ok(Verdict::failed("anchor reference not found"));
        };
        if record.digest != combined {
            return Ok(Verdict::failed("anchored digest does not match the presented carrier"));
        }
        if record.issuer_id != recovered.issuer_id() {
            return Ok(Verdict::failed("anchor was recorded for a different issuer"));
        }
        Ok(Verdict::passed())
    }
}

fn decide(signature: Verdict, anchor: Verdict, recovered: CanonicalPayload) -> VerificationOutcome {
    let (state, failed_at, reason) = match (signature.check, anchor.check) {
        (Check::Passed, Check::Passed) => (TerminalState::Valid, None, None),
        (Check::Passed, _) => (TerminalState::Invalid, Some(Stage::Anchor), anchor.reason),
        _ => (TerminalState::Invalid, Some(Stage::Signature), signature.reason),
    };
    VerificationOutcome {
        state,
        signature: signature.check,
        anchor: anchor.check,
        failed_at,
        reason: reason.map(str::to_owned),
        recovered: Some(recovered),
    }
}

fn log_outcome(outcome: &VerificationOutcome) {
    let failed_at = outcome.failed_at.map(Stage::as_str);
    let reason = outcome.reason.as_deref().unwrap_or("");
    match outcome.state {
        TerminalState::Valid => info!(issuer = outcome.recovered.as_ref().map(|p| p.issuer_id()), "carrier verified"),
        TerminalState::Invalid => warn!(?failed_at, reason, "carrier rejected"),
        TerminalState::Faulted => error!(?failed_at, reason, "verification faulted"),
    }
}
