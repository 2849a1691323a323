// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Verification outcome types.

use core::fmt;

use serde::Serialize;

use crate::stego::payload::CanonicalPayload;

/// Terminal state of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalState {
    /// Signature and anchor both check out against the presented carrier.
    Valid,
    /// The carrier carries no usable seal, or a check failed.
    Invalid,
    /// Infrastructure failure (unreadable upload, collaborator down, budget
    /// exhausted). Says nothing about authenticity; the caller may retry.
    Faulted,
}

/// Pipeline stage named in `failed_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extraction,
    Signature,
    Anchor,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extraction => "extraction",
            Self::Signature => "signature",
            Self::Anchor => "anchor",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one check. A stage that never ran is `NotAttempted`, never
/// `Passed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    #[default]
    NotAttempted,
    Passed,
    Failed,
}

impl Check {
    pub fn passed(self) -> bool {
        self == Self::Passed
    }
}

/// Outcome of one verification call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub state: TerminalState,
    pub signature: Check,
    pub anchor: Check,
    /// First stage that failed or faulted.
    pub failed_at: Option<Stage>,
    /// Human-readable explanation for anything other than `Valid`.
    pub reason: Option<String>,
    /// The record read from the carrier, when extraction succeeded. Its
    /// claims are informational; none of them was trusted to reach `state`.
    pub recovered: Option<CanonicalPayload>,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        self.state == TerminalState::Valid
    }

    pub fn signature_valid(&self) -> bool {
        self.signature.passed()
    }

    pub fn anchor_valid(&self) -> bool {
        self.anchor.passed()
    }

    pub(crate) fn extraction_failed(reason: String) -> Self {
        Self {
            state: TerminalState::Invalid,
            signature: Check::NotAttempted,
            anchor: Check::NotAttempted,
            failed_at: Some(Stage::Extraction),
            reason: Some(reason),
            recovered: None,
        }
    }

    pub(crate) fn faulted(stage: Stage, reason: String) -> Self {
        Self {
            state: TerminalState::Faulted,
            signature: Check::NotAttempted,
            anchor: Check::NotAttempted,
            failed_at: Some(stage),
            reason: Some(reason),
            recovered: None,
        }
    }
}
