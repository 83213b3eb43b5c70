//! The `Exec` struct and its step loop.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use cosim_core::{ObjectId, Pass, Rank, RunConfig, SimRng, Timestamp};
use cosim_object::SimObject;
use cosim_pool::{PoolMode, ThreadPool};
use cosim_rank::RankIndex;
use rustc_hash::FxHashMap;

use crate::outcome::PassOutcome;
use crate::{Convergence, ExecError, ExecObserver, ExecResult, SweepVerdict};

// ── RunReport ─────────────────────────────────────────────────────────────────

/// Summary of a cleanly finished run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// The last step that fully committed (`None` for a zero-step run).
    pub last_commit: Option<Timestamp>,
    /// Steps executed.
    pub steps: u64,
    /// Why the run ended: `NEVER` when no object had a further event, or
    /// the first event time past the configured stop bound.
    pub final_time: Timestamp,
}

// ── Exec ──────────────────────────────────────────────────────────────────────

/// The pass scheduler.
///
/// Owns the object table, the rank index, the thread pool, and the global
/// clock — object code never touches any of them.  Create via
/// [`ExecBuilder`][crate::ExecBuilder].
pub struct Exec {
    /// Global configuration (start/stop bounds, iteration cap, seed, …).
    pub config: RunConfig,

    /// All objects, dense by `ObjectId`.
    pub(crate) objects: Vec<Arc<SimObject>>,

    /// Name → id lookup for drivers and assertions.
    pub(crate) names: FxHashMap<String, ObjectId>,

    /// The rank-ordered dispatch index.
    pub(crate) index: RankIndex,

    pub(crate) pool: ThreadPool,

    /// Deterministic RNG for scheduling-order decorrelation.
    pub(crate) rng: SimRng,

    /// Previous step's time (`t0` of the next step).
    pub(crate) clock: Timestamp,

    /// Pending target time (`t1` of the next step).
    pub(crate) step_to: Timestamp,

    pub(crate) last_commit: Option<Timestamp>,
    pub(crate) steps: u64,
}

impl std::fmt::Debug for Exec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exec")
            .field("config", &self.config)
            .field("objects", &self.objects.len())
            .field("names", &self.names.len())
            .field("clock", &self.clock)
            .field("step_to", &self.step_to)
            .field("last_commit", &self.last_commit)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl Exec {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run until every object advertises `NEVER` or the stop bound is
    /// passed.  Calls observer hooks at every step boundary.
    pub fn run<O: ExecObserver>(&mut self, observer: &mut O) -> ExecResult<RunReport> {
        let stop = self.config.stop_bound();
        let final_time = loop {
            if self.step_to.is_never() {
                break Timestamp::NEVER;
            }
            if self.step_to > stop {
                break self.step_to;
            }
            self.step(observer)?;
        };

        let report = RunReport {
            last_commit: self.last_commit,
            steps:       self.steps,
            final_time,
        };
        observer.on_run_end(&report);
        Ok(report)
    }

    /// Run at most `n` steps from the current position, stopping early at
    /// the same terminal conditions as [`run`][Self::run].  Useful for tests
    /// and incremental stepping.
    pub fn run_steps<O: ExecObserver>(&mut self, n: u64, observer: &mut O) -> ExecResult<()> {
        let stop = self.config.stop_bound();
        for _ in 0..n {
            if self.step_to.is_never() || self.step_to > stop {
                break;
            }
            self.step(observer)?;
        }
        Ok(())
    }

    /// Execute one full step (presync, converged sync, postsync, commit) at
    /// the pending target time and return the computed next global time.
    ///
    /// A no-op returning `NEVER` when no event is pending.
    pub fn step<O: ExecObserver>(&mut self, observer: &mut O) -> ExecResult<Timestamp> {
        if self.step_to.is_never() {
            return Ok(Timestamp::NEVER);
        }
        let t0 = self.clock;
        let t1 = self.step_to;
        observer.on_step_start(t0, t1);

        // Decide the valid-until skip once per step, from the watermarks the
        // *previous* step left behind.  Deciding per pass would let an early
        // pass's advertisement (e.g. a presync returning NEVER) hide the
        // same object from its own sync.
        let active: Vec<bool> = self
            .objects
            .iter()
            .map(|obj| obj.valid_to() <= t1)
            .collect();

        // ── ① First top-down pass ─────────────────────────────────────────
        let pre = self.run_pass(Pass::Presync, t0, t1, Some(&active))?;

        // ── ② Bottom-up pass, repeated until fixed point ──────────────────
        let mut convergence = Convergence::new(self.config.iteration_cap);
        let sync_next = loop {
            // The valid-until skip is honored only on the first sweep; a
            // retry re-invokes every rank-dependent object.
            let skip = if convergence.is_first_sweep() {
                Some(active.as_slice())
            } else {
                None
            };
            let sweep = self.run_pass(Pass::Sync, t0, t1, skip)?;
            let retry = sweep.retry_requested();
            observer.on_sweep(t1, convergence.sweeps_done() + 1, retry);

            match convergence.record(retry) {
                SweepVerdict::Converged => break sweep.next(),
                SweepVerdict::Retry     => continue,
                SweepVerdict::Exhausted => {
                    let (object, otype) =
                        sweep.first_nonconverged().unwrap_or_default();
                    return Err(ExecError::NonConvergence {
                        at:          t1,
                        iterations:  convergence.sweeps_done(),
                        object,
                        otype,
                        last_commit: self.last_commit,
                    });
                }
            }
        };

        // ── ③ Second top-down pass ────────────────────────────────────────
        let post = self.run_pass(Pass::Postsync, t0, t1, Some(&active))?;

        // ── ④ Commit — once per object, sees final state ──────────────────
        let commit = self.run_pass(Pass::Commit, t0, t1, None)?;

        self.last_commit = Some(t1);
        self.steps += 1;

        // Every object's state is now consistent through t1 — including
        // skipped objects, whose cached answers cover t1 by definition.
        for obj in &self.objects {
            obj.set_clock(t1);
        }

        let next = pre
            .next()
            .earlier(sync_next)
            .earlier(post.next())
            .earlier(commit.next());
        debug_assert!(next > t1, "dispatch admitted a non-advancing timestamp");

        observer.on_step_end(t1, next, convergence.sweeps_done());

        self.clock = t1;
        self.step_to = next;
        Ok(next)
    }

    // ── Introspection ─────────────────────────────────────────────────────

    /// Look up an object by name.
    pub fn find(&self, name: &str) -> Option<&Arc<SimObject>> {
        self.names.get(name).and_then(|id| self.object(*id))
    }

    /// Look up an object by id.
    pub fn object(&self, id: ObjectId) -> Option<&Arc<SimObject>> {
        self.objects.get(id.index())
    }

    /// All objects, in id order.
    pub fn objects(&self) -> impl Iterator<Item = &Arc<SimObject>> {
        self.objects.iter()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// The time of the last fully committed step, if any.
    pub fn last_commit(&self) -> Option<Timestamp> {
        self.last_commit
    }

    /// The global clock (time of the last completed step).
    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    /// The pending target time of the next step (`NEVER` when idle).
    pub fn next_time(&self) -> Timestamp {
        self.step_to
    }

    /// Switch dispatch between the parallel and deterministic lanes.
    pub fn set_mode(&self, mode: PoolMode) {
        self.pool.set_mode(mode);
    }

    /// Randomly permute every rank bucket, seeded from `RunConfig::seed`.
    /// Decorrelates scheduling order across otherwise identical runs.
    pub fn shuffle_ranks(&mut self) {
        for r in 0..self.index.rank_count() {
            self.index.shuffle(Rank(r as u16), &mut self.rng);
        }
    }

    // ── One pass over all ranks ───────────────────────────────────────────

    /// Dispatch `pass` over every rank in ascending order, draining the pool
    /// between ranks.  A fatal result aborts at the barrier where it is
    /// first observed, never mid-rank.
    ///
    /// `active` is the step's valid-until skip bitmap (by object id); `None`
    /// invokes everything — used by retry sweeps and commit.
    fn run_pass(
        &self,
        pass:   Pass,
        t0:     Timestamp,
        t1:     Timestamp,
        active: Option<&[bool]>,
    ) -> ExecResult<Arc<PassOutcome>> {
        let outcome = Arc::new(PassOutcome::new());

        for r in 0..self.index.rank_count() {
            for obj in self.index.iter_rank(Rank(r as u16)) {
                if !obj.otype().pass_set().contains(pass.flag()) {
                    continue;
                }
                // Skipped objects still advertise: their cached answer is
                // the pass's view of their next event.
                if let Some(active) = active {
                    if !active[obj.id().index()] {
                        outcome.fold_next(obj.valid_to());
                        continue;
                    }
                }

                let obj = Arc::clone(obj);
                let outcome = Arc::clone(&outcome);
                let submitted = self
                    .pool
                    .submit(Box::new(move || dispatch(&obj, pass, t0, t1, &outcome)));
                if !submitted {
                    return Err(ExecError::Submit);
                }
            }

            // Barrier: rank r drains fully before rank r+1 is submitted.
            self.pool.await_drain();

            if let Some(fault) = outcome.first_fault() {
                return Err(ExecError::ObjectFault {
                    object:      fault.object,
                    otype:       fault.otype,
                    pass:        fault.pass,
                    at:          t1,
                    reason:      fault.reason,
                    last_commit: self.last_commit,
                });
            }
        }

        Ok(outcome)
    }
}

// ── Dispatch boundary ─────────────────────────────────────────────────────────

/// Invoke one lifecycle call and fold its result into the pass outcome.
///
/// This is the single boundary where model errors, protocol violations, and
/// escaped panics are all converted into recorded faults — workers never
/// unwind past it.
fn dispatch(
    obj:     &Arc<SimObject>,
    pass:    Pass,
    t0:      Timestamp,
    t1:      Timestamp,
    outcome: &PassOutcome,
) {
    let result = catch_unwind(AssertUnwindSafe(|| obj.lifecycle(pass, t0, t1)));

    let ts = match result {
        Err(payload) => {
            outcome.record_fault(obj, pass, format!("panicked: {}", panic_message(&payload)));
            return;
        }
        Ok(Err(err)) => {
            outcome.record_fault(obj, pass, format!("failed: {err}"));
            return;
        }
        Ok(Ok(ts)) => ts,
    };

    if pass.is_bottom_up() && ts == t1 {
        // The retry convention: not an advertisement, so valid_to is
        // untouched.  Checked before the fatal range — on a zero-start run's
        // first step t1 itself is 0, and an object requesting iteration
        // there must not read as a fatal return.
        outcome.request_retry(obj);
    } else if ts.is_fatal() {
        outcome.record_fault(obj, pass, format!("returned fatal timestamp {ts}"));
    } else if ts <= t1 {
        // Undefined by the protocol: a "next event" at or before the step
        // bound from a pass with no retry semantics would stall the clock.
        outcome.record_fault(
            obj,
            pass,
            format!("returned {ts}, not later than the step bound {t1}"),
        );
    } else {
        advertise(obj, t1, ts);
        outcome.fold_next(ts);
    }
}

/// Update the object's valid-until watermark with a freshly returned time.
///
/// The first advertising pass of a step overwrites (the previous step's
/// watermark is spent once the object is re-invoked); later passes in the
/// same step take the minimum, so a presync that asked for an early revisit
/// is not erased by a sync returning `NEVER`.  Commit never calls this.
fn advertise(obj: &SimObject, t1: Timestamp, ts: Timestamp) {
    let old = obj.valid_to();
    let new = if old > t1 { old.earlier(ts) } else { ts };
    obj.set_valid_to(new);
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
