// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Per-call execution budget.
//!
//! Embedding and extraction are linear in pixel count. Each call carries its
//! own [`Budget`] (a deadline plus an optional shared cancellation flag) and
//! checks it at natural loop boundaries. Nothing here is global: concurrent
//! calls never observe each other's budgets.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::stego::error::SealError;

/// Number of pixels processed between two budget checks.
pub const CHECK_INTERVAL_PIXELS: usize = 4096;

/// Cancellation flag shared between a caller and an in-flight operation.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The operation notices at its next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Deadline and cancellation state for one operation.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    deadline: Option<Instant>,
    cancel: Option<CancelFlag>,
}

impl Budget {
    /// A budget that never expires.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A budget expiring `limit` from now.
    pub fn with_limit(limit: Duration) -> Self {
        Self { deadline: Instant::now().checked_add(limit), cancel: None }
    }

    /// Attach a cancellation flag.
    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Return an error if the operation was cancelled or ran out of time.
    pub fn check(&self) -> Result<(), SealError> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Err(SealError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SealError::TimedOut),
            _ => Ok(()),
        }
    }
}
