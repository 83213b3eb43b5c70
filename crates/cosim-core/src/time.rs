//! Simulation time model.
//!
//! # Design
//!
//! Time is a signed 64-bit `Timestamp` in an application-chosen unit
//! (seconds is conventional).  Two sentinel values partition the range:
//!
//!   `NEVER`   = `i64::MAX`  — "no further event scheduled"
//!   `INVALID` = `-1`        — "fatal failure, halt the run"
//!
//! Any lifecycle return value ≤ 0 is treated as fatal, which keeps the whole
//! retry/advance protocol inside one integer: a legitimate next-event time is
//! always strictly positive, `NEVER` is the identity of the min-fold the
//! scheduler performs over all objects, and anything non-positive aborts.
//! Configured *start* times may still be 0 — the ≤ 0 rule applies to values
//! objects return, not to the clock itself.
//!
//! Using an integer as the canonical unit means all scheduling arithmetic is
//! exact (no floating-point drift) and comparisons are O(1).

use std::fmt;

// ── Timestamp ─────────────────────────────────────────────────────────────────

/// An absolute simulation time, or one of the two protocol sentinels.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// The start-of-epoch clock value.  A legal clock reading, not a sentinel.
    pub const ZERO: Timestamp = Timestamp(0);

    /// "No further self-scheduled event."  Identity of the scheduler's min-fold.
    pub const NEVER: Timestamp = Timestamp(i64::MAX);

    /// "Fatal failure, halt the run."  Canonical representative of the ≤ 0 range.
    pub const INVALID: Timestamp = Timestamp(-1);

    /// `true` for `NEVER`.
    #[inline]
    pub fn is_never(self) -> bool {
        self == Self::NEVER
    }

    /// `true` for any value the return-value contract treats as fatal (≤ 0).
    #[inline]
    pub fn is_fatal(self) -> bool {
        self.0 <= 0
    }

    /// The timestamp `n` units after `self`.
    ///
    /// # Panics
    /// Panics in debug mode on overflow; `NEVER` must not be offset.
    #[inline]
    pub fn offset(self, n: i64) -> Timestamp {
        Timestamp(self.0 + n)
    }

    /// The earlier of two timestamps (sentinel-aware by construction:
    /// `NEVER` never wins against a real time).
    #[inline]
    pub fn earlier(self, other: Timestamp) -> Timestamp {
        if other < self { other } else { self }
    }
}

impl std::ops::Add<i64> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn add(self, rhs: i64) -> Timestamp {
        Timestamp(self.0 + rhs)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = i64;
    #[inline]
    fn sub(self, rhs: Timestamp) -> i64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            write!(f, "NEVER")
        } else if self.0 < 0 {
            write!(f, "INVALID")
        } else {
            write!(f, "T{}", self.0)
        }
    }
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Typically loaded from a TOML/JSON file by the application crate and passed
/// to `ExecBuilder`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunConfig {
    /// Clock value of the first step.  The first step runs at
    /// `t0 == t1 == start_time` so objects establish their initial state
    /// before the clock advances.
    pub start_time: i64,

    /// Hard upper bound on the clock.  `None` runs until every object
    /// advertises `NEVER`.
    pub stop_time: Option<i64>,

    /// Maximum bottom-up sweeps per step before the run is declared
    /// non-convergent.  Must be ≥ 1.
    pub iteration_cap: usize,

    /// Parallel-lane worker count.  `None` uses host concurrency.
    pub worker_threads: Option<usize>,

    /// Start in the single-threaded deterministic lane instead of the
    /// parallel lane.  Switchable at runtime via `ThreadPool::set_mode`.
    pub deterministic: bool,

    /// Compatibility knob: poll the drain counter every N milliseconds
    /// instead of waiting on the exact completion signal.  `None` (the
    /// default) uses the exact signal.
    pub drain_poll_ms: Option<u64>,

    /// Master RNG seed.  The same seed always produces identical results,
    /// including rank-bucket shuffles.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_time:     0,
            stop_time:      None,
            iteration_cap:  100,
            worker_threads: None,
            deterministic:  false,
            drain_poll_ms:  None,
            seed:           0,
        }
    }
}

impl RunConfig {
    /// The starting clock as a `Timestamp`.
    #[inline]
    pub fn start(&self) -> Timestamp {
        Timestamp(self.start_time)
    }

    /// The stop bound as a `Timestamp` (`NEVER` when unbounded).
    #[inline]
    pub fn stop_bound(&self) -> Timestamp {
        match self.stop_time {
            Some(t) => Timestamp(t),
            None    => Timestamp::NEVER,
        }
    }

    /// Validate invariants that would otherwise surface as hangs or panics
    /// deep inside a run.
    pub fn validate(&self) -> crate::CosimResult<()> {
        if self.iteration_cap == 0 {
            return Err(crate::CosimError::Config(
                "iteration_cap must be at least 1".into(),
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(crate::CosimError::Config(
                "worker_threads must be at least 1 when set".into(),
            ));
        }
        if let Some(stop) = self.stop_time {
            if stop < self.start_time {
                return Err(crate::CosimError::Config(format!(
                    "stop_time {stop} precedes start_time {}",
                    self.start_time
                )));
            }
        }
        Ok(())
    }
}
