//! Per-object spinlock ("autolock").
//!
//! Guards concurrent mutation of an object's published state by itself and by
//! neighbors dispatched in the same rank (e.g. a node accumulating injected
//! current from several links at once).  The contract is strict: the lock is
//! held only around a single read-modify-write, never across a lifecycle call
//! boundary.  Critical sections that short make a compare-exchange spin
//! cheaper than parking a thread.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;

// ── ObjectLock ────────────────────────────────────────────────────────────────

/// A compare-and-exchange spinlock, one word per object.
#[derive(Debug, Default)]
pub struct ObjectLock(AtomicU32);

impl ObjectLock {
    pub const fn new() -> Self {
        ObjectLock(AtomicU32::new(UNLOCKED))
    }

    /// Acquire the lock, spinning until it is free.
    ///
    /// The returned guard releases on drop.  Do not hold a guard across a
    /// lifecycle call.
    pub fn lock(&self) -> LockGuard<'_> {
        while self
            .0
            .compare_exchange_weak(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
        LockGuard { lock: self, _not_send: PhantomData }
    }

    /// Acquire the lock only if it is currently free.
    pub fn try_lock(&self) -> Option<LockGuard<'_>> {
        self.0
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| LockGuard { lock: self, _not_send: PhantomData })
    }

    /// `true` while some guard is live.  Diagnostic only — the answer may be
    /// stale by the time the caller looks at it.
    pub fn is_locked(&self) -> bool {
        self.0.load(Ordering::Relaxed) == LOCKED
    }
}

// ── LockGuard ─────────────────────────────────────────────────────────────────

/// RAII guard for [`ObjectLock`].  `!Send` — a lock acquired on one thread
/// must be released on the same thread.
pub struct LockGuard<'a> {
    lock: &'a ObjectLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.0.store(UNLOCKED, Ordering::Release);
    }
}
