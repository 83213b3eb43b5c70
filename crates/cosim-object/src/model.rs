//! The `ObjectModel` trait — the main extension point for collaborator code.

use std::any::Any;

use cosim_core::{ObjectId, Rank, Timestamp};

use crate::{ModelError, PropertyValue, SimObject};

/// Pluggable object behavior.
///
/// Implement this trait to define how an object type participates in the
/// clock-advance protocol.  Construction happens through the type registry's
/// factory; `init` then runs once, after every object in the model exists.
///
/// # Required methods
///
/// Only [`as_any`][Self::as_any] is required (it feeds the declared property
/// accessors).  Every lifecycle hook has a default: `init` accepts, the timed
/// calls return `NEVER` ("no self-scheduled event"), `notify` allows the
/// write.  A type's descriptor narrows which timed calls are actually
/// dispatched via its [`PassSet`][cosim_core::PassSet].
///
/// # Return-value contract
///
/// Every timed call receives `(t0, t1)` — the previous global clock and the
/// step's target time — and returns the object's next event time:
///
/// - `> t1` — done for this step; revisit no later than the returned time.
/// - `== t1` (from `sync` only) — not yet converged; the scheduler repeats
///   the entire bottom-up pass.
/// - `NEVER` — no further self-scheduled event.
/// - `Err(_)` — fatal; the run terminates at the next barrier.
///
/// `sync` must be idempotent when re-invoked with the same `(t0, t1)` and
/// unchanged neighbor state: retry sweeps call it again.
///
/// # Thread safety
///
/// The scheduler may dispatch many objects of one rank in parallel, so
/// implementations must be `Send + Sync` and all lifecycle calls take
/// `&self`.  State a neighbor may touch must sit behind interior mutability
/// guarded by the owning object's lock; state written during the *same* rank
/// and pass by a sibling must be treated as potentially stale until the next
/// pass.
pub trait ObjectModel: Send + Sync + 'static {
    /// Validate configuration and rank-0 dependencies.  Called once, after
    /// all objects are created and before the first pass.  An `Err` here
    /// fails model load — the running scheduler never sees it.
    fn init(&self, _ctx: &InitContext<'_>) -> Result<(), ModelError> {
        Ok(())
    }

    /// First top-down pass: publish values children will read this step.
    fn presync(&self, _t0: Timestamp, _t1: Timestamp) -> Result<Timestamp, ModelError> {
        Ok(Timestamp::NEVER)
    }

    /// Bottom-up pass: read neighbor/parent state, update own state.
    /// Returning exactly `t1` requests another sweep.
    fn sync(&self, _t0: Timestamp, _t1: Timestamp) -> Result<Timestamp, ModelError> {
        Ok(Timestamp::NEVER)
    }

    /// Second top-down pass: finalize derived quantities after convergence.
    fn postsync(&self, _t0: Timestamp, _t1: Timestamp) -> Result<Timestamp, ModelError> {
        Ok(Timestamp::NEVER)
    }

    /// Once per converged step, after all three passes — side effects that
    /// must see final state (assertion checks, logging).
    fn commit(&self, _t0: Timestamp, _t1: Timestamp) -> Result<Timestamp, ModelError> {
        Ok(Timestamp::NEVER)
    }

    /// Hook for external property writes outside the pass protocol.
    /// Return `false` to veto the change.
    fn notify(&self, _property: &str, _value: &PropertyValue) -> bool {
        true
    }

    /// Downcast anchor for the declared property accessors.
    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;
}

/// Read-only context handed to [`ObjectModel::init`].
///
/// The parent reference is the only cross-object access `init` is allowed;
/// it is a borrow, never ownership — the scheduler's object table keeps
/// parents alive, not their children.
pub struct InitContext<'a> {
    pub id:     ObjectId,
    pub name:   &'a str,
    pub rank:   Rank,
    pub parent: Option<&'a SimObject>,
}
