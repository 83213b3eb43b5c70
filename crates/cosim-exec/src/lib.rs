//! `cosim-exec` — the pass scheduler that advances the shared clock.
//!
//! # Three-pass step protocol
//!
//! ```text
//! for each step at (t0 = clock, t1 = pending target):
//!   ① Presync   — ranks ascending; parents publish for their children.
//!   ② Sync      — ranks ascending; children propagate upward.  Any object
//!                 returning exactly t1 forces the WHOLE bottom-up pass to
//!                 repeat, up to config.iteration_cap sweeps.
//!   ③ Postsync  — ranks ascending; derived quantities finalized.
//!   ④ Commit    — once per object; side effects that must see final state.
//!   next = min of every timestamp returned across ①–④
//!     NEVER        → clean termination
//!     > stop bound → clean termination at the bound
//!     otherwise    → clock = t1, target = next, repeat
//! ```
//!
//! Within a rank all objects dispatch concurrently through `cosim-pool`;
//! `await_drain` is the barrier between ranks and between passes.  A fatal
//! return aborts at the next barrier, never mid-rank.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use cosim_core::RunConfig;
//! use cosim_exec::{ExecBuilder, NoopObserver};
//!
//! let mut exec = ExecBuilder::new(RunConfig::default(), registry)
//!     .object("feeder_1", "feeder", 0)
//!     .child("house_1", "house", 1, "feeder_1")
//!     .build()?;
//! let report = exec.run(&mut NoopObserver)?;
//! println!("done after {} steps, last commit {}", report.steps, report.last_commit.unwrap());
//! ```

pub mod builder;
pub mod convergence;
pub mod error;
pub mod exec;
pub mod observer;

mod outcome;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::ExecBuilder;
pub use convergence::{Convergence, SweepVerdict};
pub use error::{ExecError, ExecResult};
pub use exec::{Exec, RunReport};
pub use observer::{ExecObserver, NoopObserver};
