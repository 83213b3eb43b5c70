//! `cosim-pool` — the worker pool that parallelizes one rank's dispatch.
//!
//! # Two job lanes
//!
//! ```text
//! submit(job) ──┬─ Parallel mode ─────→ unbounded queue → N workers
//!               └─ Deterministic mode → unbounded queue → 1 worker
//! ```
//!
//! The deterministic lane exists so a run can be forced strictly sequential
//! for reproducibility and debugging without any change to calling code —
//! the scheduler submits identically in both modes and the mode flag picks
//! the lane at runtime.
//!
//! The scheduler's barrier between ranks and between passes is
//! [`ThreadPool::await_drain`]: it blocks until every submitted job's side
//! effects are observable.  The default implementation waits on an exact
//! completion signal; a fixed-interval polling loop (the original design's
//! behavior) is available via [`ThreadPool::set_drain_poll`] as a
//! compatibility knob.

pub mod pool;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use pool::{host_concurrency, Job, PoolMode, ThreadPool};
