//! `cosim-rank` — the rank-ordered object index.
//!
//! # Why this exists
//!
//! The scheduler's entire correctness argument hangs on visiting objects in
//! dependency order: all of rank r drains before any of rank r+1 starts.
//! [`RankIndex`] is the container that makes that traversal cheap — a dense
//! vector of rank buckets, each an ordered, slot-stable sequence of object
//! handles that can be enumerated for parallel dispatch.
//!
//! Insertion order within a rank is irrelevant to correctness (same-rank
//! objects are independent by construction), but the sequence is stable and
//! enumerable, and [`RankIndex::shuffle`] can randomly permute a bucket to
//! decorrelate test and scheduling order.

pub mod error;
pub mod index;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::IndexError;
pub use index::{RankIndex, SlotHandle};
