//! Run observer trait for progress reporting and diagnostics collection.

use cosim_core::Timestamp;

use crate::RunReport;

/// Callbacks invoked by [`Exec::run`][crate::Exec::run] at key points in the
/// step loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — sweep logger
///
/// ```rust,ignore
/// struct SweepLogger;
///
/// impl ExecObserver for SweepLogger {
///     fn on_sweep(&mut self, t1: Timestamp, iteration: usize, retry: bool) {
///         if retry {
///             eprintln!("{t1}: sweep {iteration} did not converge, retrying");
///         }
///     }
/// }
/// ```
pub trait ExecObserver {
    /// Called at the start of each step, before the first pass.  `t0` is the
    /// previous clock, `t1` the step's target time.
    fn on_step_start(&mut self, _t0: Timestamp, _t1: Timestamp) {}

    /// Called after every bottom-up sweep.  `iteration` counts from 1 within
    /// the step; `retry` is `true` when the sweep requested another one.
    fn on_sweep(&mut self, _t1: Timestamp, _iteration: usize, _retry: bool) {}

    /// Called after commit.  `next` is the computed next global time
    /// (`NEVER` when no object has a further event); `sweeps` is how many
    /// bottom-up sweeps the step needed.
    fn on_step_end(&mut self, _t1: Timestamp, _next: Timestamp, _sweeps: usize) {}

    /// Called once when a run finishes cleanly.
    fn on_run_end(&mut self, _report: &RunReport) {}
}

/// An [`ExecObserver`] that does nothing.  Use when you need to call `run`
/// but don't want progress callbacks.
pub struct NoopObserver;

impl ExecObserver for NoopObserver {}
