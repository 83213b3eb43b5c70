//! Shared accumulator for one pass (or one sweep) of dispatched jobs.
//!
//! Workers fold their results in concurrently; the scheduler inspects the
//! outcome at each barrier.  The min-fold uses `AtomicI64::fetch_min`, so
//! the collected next-event time is exact regardless of completion order.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use cosim_core::{Pass, Timestamp};
use cosim_object::SimObject;

/// One fatal result recorded during a pass.
#[derive(Debug, Clone)]
pub(crate) struct FaultRecord {
    pub object: String,
    pub otype:  String,
    pub pass:   Pass,
    pub reason: String,
}

/// Accumulated results of one pass over all ranks.
pub(crate) struct PassOutcome {
    /// Min-fold of all non-retry timestamps returned (plus cached
    /// `valid_to` values of skipped objects).  Starts at `NEVER`.
    next:         AtomicI64,
    retry:        AtomicBool,
    faults:       Mutex<Vec<FaultRecord>>,
    nonconverged: Mutex<Vec<(String, String)>>,
}

impl PassOutcome {
    pub fn new() -> Self {
        Self {
            next:         AtomicI64::new(Timestamp::NEVER.0),
            retry:        AtomicBool::new(false),
            faults:       Mutex::new(Vec::new()),
            nonconverged: Mutex::new(Vec::new()),
        }
    }

    /// Fold a returned next-event time into the pass minimum.
    pub fn fold_next(&self, ts: Timestamp) {
        self.next.fetch_min(ts.0, Ordering::AcqRel);
    }

    /// Record a `return == t1` from the bottom-up pass.
    pub fn request_retry(&self, obj: &SimObject) {
        self.retry.store(true, Ordering::Release);
        self.nonconverged
            .lock()
            .unwrap()
            .push((obj.name().to_string(), obj.type_key().to_string()));
    }

    /// Record a fatal result (error return, protocol violation, or panic).
    pub fn record_fault(&self, obj: &SimObject, pass: Pass, reason: String) {
        self.faults.lock().unwrap().push(FaultRecord {
            object: obj.name().to_string(),
            otype:  obj.type_key().to_string(),
            pass,
            reason,
        });
    }

    pub fn next(&self) -> Timestamp {
        Timestamp(self.next.load(Ordering::Acquire))
    }

    pub fn retry_requested(&self) -> bool {
        self.retry.load(Ordering::Acquire)
    }

    pub fn has_fault(&self) -> bool {
        !self.faults.lock().unwrap().is_empty()
    }

    /// The first recorded fault, if any.  "First" is arbitrary within a rank
    /// — same-rank jobs are unordered by contract.
    pub fn first_fault(&self) -> Option<FaultRecord> {
        self.faults.lock().unwrap().first().cloned()
    }

    /// One non-converged object for diagnostics.
    pub fn first_nonconverged(&self) -> Option<(String, String)> {
        self.nonconverged.lock().unwrap().first().cloned()
    }
}
