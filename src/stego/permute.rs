// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Entry permutation for noise-mode envelopes.
//!
//! The real entry must not sit at a predictable index, so every envelope gets
//! a fresh Fisher-Yates shuffle drawn from the entropy source handed in by
//! the caller. There is no shared seed and no global RNG state.
//!
//! # Cross-platform portability
//!
//! The shuffle uses `u32` for `gen_range` (not `usize`) so a seeded RNG
//! produces the same permutation on 32-bit and 64-bit targets. `usize`
//! ranges consume different amounts of entropy per step on the two, which
//! would make seeded test vectors platform-dependent.

use rand::Rng;

/// Shuffle `items` in place with a Fisher-Yates pass driven by `rng`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    let n = items.len();
    for i in (1..n).rev() {
        let j = rng.gen_range(0..=(i as u32)) as usize;
        items.swap(i, j);
    }
}
