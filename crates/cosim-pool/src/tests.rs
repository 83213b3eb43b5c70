//! Unit tests for the two-lane thread pool.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

use crate::{PoolMode, ThreadPool};

// ── Drain correctness ─────────────────────────────────────────────────────────

#[cfg(test)]
mod drain {
    use super::*;

    /// `await_drain` must never return while any submitted job's side effect
    /// is not yet observable, including when jobs take wildly different
    /// amounts of time.
    #[test]
    fn drain_observes_all_side_effects() {
        const JOBS: usize = 64;

        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        for i in 0..JOBS {
            let counter = Arc::clone(&counter);
            // Deterministic pseudo-random delay in 0..5 ms, different per job.
            let delay = Duration::from_micros(((i * 2654435761) % 5000) as u64);
            let ok = pool.submit(Box::new(move || {
                std::thread::sleep(delay);
                counter.fetch_add(1, Ordering::SeqCst);
            }));
            assert!(ok);
        }

        pool.await_drain();
        assert_eq!(counter.load(Ordering::SeqCst), JOBS);
    }

    #[test]
    fn drain_on_idle_pool_returns_immediately() {
        let pool = ThreadPool::new(2);
        pool.await_drain();
        pool.await_drain();
    }

    #[test]
    fn pool_is_reusable_across_drains() {
        let pool = ThreadPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        for round in 1..=3 {
            for _ in 0..10 {
                let counter = Arc::clone(&counter);
                pool.submit(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
            pool.await_drain();
            assert_eq!(counter.load(Ordering::SeqCst), round * 10);
        }
    }

    #[test]
    fn polling_drain_also_observes_all_side_effects() {
        let mut pool = ThreadPool::new(2);
        pool.set_drain_poll(Some(Duration::from_millis(2)));

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..16 {
            let counter = Arc::clone(&counter);
            pool.submit(Box::new(move || {
                std::thread::sleep(Duration::from_millis(1));
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.await_drain();
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    /// A panicking job must still count as completed, or the barrier after
    /// its rank would hang forever.
    #[test]
    fn panicking_job_does_not_wedge_the_drain() {
        let pool = ThreadPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        pool.submit(Box::new(|| panic!("object fault during dispatch")));
        for _ in 0..4 {
            let counter = Arc::clone(&counter);
            pool.submit(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        pool.await_drain();
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }
}

// ── Lanes ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod lanes {
    use super::*;

    fn thread_ids_of(pool: &ThreadPool, jobs: usize) -> HashSet<ThreadId> {
        let ids = Arc::new(Mutex::new(HashSet::new()));
        for _ in 0..jobs {
            let ids = Arc::clone(&ids);
            pool.submit(Box::new(move || {
                ids.lock().unwrap().insert(std::thread::current().id());
                // Linger so other workers get a chance to pick up jobs.
                std::thread::sleep(Duration::from_micros(200));
            }));
        }
        pool.await_drain();
        let ids = ids.lock().unwrap();
        ids.clone()
    }

    #[test]
    fn deterministic_lane_uses_exactly_one_thread() {
        let pool = ThreadPool::new(4);
        pool.set_mode(PoolMode::Deterministic);
        assert_eq!(pool.mode(), PoolMode::Deterministic);

        let ids = thread_ids_of(&pool, 32);
        assert_eq!(ids.len(), 1, "deterministic lane leaked onto {ids:?}");
    }

    #[test]
    fn deterministic_lane_preserves_submission_order() {
        let pool = ThreadPool::new(4);
        pool.set_mode(PoolMode::Deterministic);

        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..50 {
            let order = Arc::clone(&order);
            pool.submit(Box::new(move || {
                order.lock().unwrap().push(i);
            }));
        }
        pool.await_drain();
        assert_eq!(*order.lock().unwrap(), (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn mode_switch_between_drains() {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            pool.submit(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.await_drain();

        pool.set_mode(PoolMode::Deterministic);
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            pool.submit(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.await_drain();

        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn single_worker_pool_is_legal() {
        // worker_count is clamped to ≥ 1; 0 must not panic or deadlock.
        let pool = ThreadPool::new(0);
        assert_eq!(pool.worker_count(), 1);

        let counter = Arc::new(AtomicUsize::new(0));
        let counter2 = Arc::clone(&counter);
        pool.submit(Box::new(move || {
            counter2.fetch_add(1, Ordering::SeqCst);
        }));
        pool.await_drain();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

// ── Shutdown ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod shutdown {
    use super::*;

    #[test]
    fn drop_joins_all_workers() {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            pool.submit(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.await_drain();
        drop(pool); // must not hang
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn drop_without_drain_discards_queued_jobs() {
        // Shutdown is a destructive drain: whatever is still queued when the
        // exit flag goes up is dropped, not executed.  All we require here is
        // that teardown terminates and nothing deadlocks.
        let pool = ThreadPool::new(1);
        for _ in 0..4 {
            pool.submit(Box::new(|| {
                std::thread::sleep(Duration::from_millis(1));
            }));
        }
        drop(pool);
    }
}
