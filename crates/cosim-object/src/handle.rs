//! `SimObject` — the per-object handle the scheduler iterates over.
//!
//! # Why clock and valid-to are atomics
//!
//! During a pass, many objects of one rank are dispatched concurrently and
//! each worker updates its own object's fields, while the scheduler thread
//! reads them between barriers for min-timestamp bookkeeping.  `AtomicI64`
//! with relaxed ordering covers this — the per-rank barrier is the actual
//! synchronisation edge; the atomics only make the individual loads and
//! stores tear-free.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use cosim_core::{ObjectId, Pass, PassSet, Rank, Timestamp};

use crate::{LockGuard, ModelError, ObjectError, ObjectLock, ObjectModel, PropertyValue};
use crate::registry::ObjectType;

/// One live object: identity, scheduling state, lock word, and the boxed
/// model that implements its behavior.
///
/// Handles are shared as `Arc<SimObject>` between the object table, the rank
/// index, and in-flight jobs.  The parent link is an `ObjectId`, not an
/// `Arc` — a non-owning back-reference, so the scheduler never keeps a
/// parent alive merely because a child exists.
pub struct SimObject {
    id:       ObjectId,
    name:     String,
    rank:     Rank,
    parent:   Option<ObjectId>,
    otype:    Arc<ObjectType>,
    /// Time through which this object's state has been computed.
    clock:    AtomicI64,
    /// Time through which the last advertised answer remains valid — the
    /// event-driven wake-up independent of polling.
    valid_to: AtomicI64,
    lock:     ObjectLock,
    model:    Box<dyn ObjectModel>,
}

impl SimObject {
    /// Build a handle around a freshly created model.  `start` seeds both
    /// the clock and the valid-to watermark, so the first step (which runs
    /// at `t1 == start`) invokes everything.
    pub fn new(
        id:     ObjectId,
        name:   impl Into<String>,
        rank:   Rank,
        parent: Option<ObjectId>,
        otype:  Arc<ObjectType>,
        model:  Box<dyn ObjectModel>,
        start:  Timestamp,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            rank,
            parent,
            otype,
            clock: AtomicI64::new(start.0),
            valid_to: AtomicI64::new(start.0),
            lock: ObjectLock::new(),
            model,
        }
    }

    // ── Identity ──────────────────────────────────────────────────────────

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn otype(&self) -> &Arc<ObjectType> {
        &self.otype
    }

    /// The type key, for diagnostics.
    pub fn type_key(&self) -> &str {
        self.otype.key()
    }

    pub fn model(&self) -> &dyn ObjectModel {
        self.model.as_ref()
    }

    // ── Scheduling state ──────────────────────────────────────────────────

    pub fn clock(&self) -> Timestamp {
        Timestamp(self.clock.load(Ordering::Relaxed))
    }

    pub fn set_clock(&self, t: Timestamp) {
        self.clock.store(t.0, Ordering::Relaxed);
    }

    pub fn valid_to(&self) -> Timestamp {
        Timestamp(self.valid_to.load(Ordering::Relaxed))
    }

    pub fn set_valid_to(&self, t: Timestamp) {
        self.valid_to.store(t.0, Ordering::Relaxed);
    }

    /// Acquire this object's autolock.  Hold only around a single
    /// read-modify-write of published state.
    pub fn lock(&self) -> LockGuard<'_> {
        self.lock.lock()
    }

    // ── Lifecycle dispatch ────────────────────────────────────────────────

    /// Invoke one timed lifecycle call on the model.  The scheduler is the
    /// only intended caller; capability filtering happens there.
    pub fn lifecycle(&self, pass: Pass, t0: Timestamp, t1: Timestamp)
        -> Result<Timestamp, ModelError>
    {
        match pass {
            Pass::Presync  => self.model.presync(t0, t1),
            Pass::Sync     => self.model.sync(t0, t1),
            Pass::Postsync => self.model.postsync(t0, t1),
            Pass::Commit   => self.model.commit(t0, t1),
        }
    }

    // ── Property access ───────────────────────────────────────────────────

    /// Read a declared property.
    pub fn read_property(&self, name: &str) -> Result<PropertyValue, ObjectError> {
        let def = self.otype.find_property(name).ok_or_else(|| {
            ObjectError::UnknownProperty {
                object:   self.name.clone(),
                property: name.to_string(),
            }
        })?;
        (def.get)(self.model.as_any()).ok_or_else(|| ObjectError::Rejected {
            object:   self.name.clone(),
            property: name.to_string(),
        })
    }

    /// Write a declared property from outside the pass protocol.
    ///
    /// The model's `notify` hook runs first and may veto.  A successful
    /// write resets `valid_to` to the object's clock so the scheduler
    /// re-evaluates it at the next step instead of trusting a stale answer.
    pub fn write_property(&self, name: &str, value: PropertyValue)
        -> Result<(), ObjectError>
    {
        let def = self.otype.find_property(name).ok_or_else(|| {
            ObjectError::UnknownProperty {
                object:   self.name.clone(),
                property: name.to_string(),
            }
        })?;

        if self.otype.pass_set().contains(PassSet::NOTIFY)
            && !self.model.notify(name, &value)
        {
            return Err(ObjectError::Vetoed {
                object:   self.name.clone(),
                property: name.to_string(),
            });
        }

        if !(def.set)(self.model.as_any(), &value) {
            return Err(ObjectError::Rejected {
                object:   self.name.clone(),
                property: name.to_string(),
            });
        }

        self.set_valid_to(self.clock());
        Ok(())
    }
}

impl std::fmt::Debug for SimObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimObject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("rank", &self.rank)
            .field("type", &self.otype.key())
            .field("clock", &self.clock())
            .field("valid_to", &self.valid_to())
            .finish()
    }
}
