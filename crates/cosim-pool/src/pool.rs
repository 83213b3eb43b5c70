//! The `ThreadPool` implementation.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

/// A deferred invocation of one object's lifecycle call.  Owned exclusively
/// by the queue until a worker executes it.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Which lane [`ThreadPool::submit`] feeds.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PoolMode {
    /// N workers; jobs of one rank run concurrently and unordered.
    Parallel,
    /// One dedicated worker; jobs run strictly in submission order.
    Deterministic,
}

enum Message {
    Run(Job),
    /// No-op pushed by shutdown so a blocked worker wakes and observes the
    /// exit flag.
    Wake,
}

// ── Drain state ───────────────────────────────────────────────────────────────

/// Outstanding-job counter shared by both lanes, with the completion signal
/// `await_drain` waits on.
struct DrainState {
    outstanding: Mutex<usize>,
    drained:     Condvar,
}

impl DrainState {
    fn new() -> Self {
        Self {
            outstanding: Mutex::new(0),
            drained:     Condvar::new(),
        }
    }

    fn add(&self) {
        *self.outstanding.lock().unwrap() += 1;
    }

    fn complete(&self) {
        let mut n = self.outstanding.lock().unwrap();
        *n -= 1;
        if *n == 0 {
            self.drained.notify_all();
        }
    }

    fn wait(&self) {
        let mut n = self.outstanding.lock().unwrap();
        while *n > 0 {
            n = self.drained.wait(n).unwrap();
        }
    }

    fn wait_polling(&self, interval: Duration) {
        loop {
            if *self.outstanding.lock().unwrap() == 0 {
                return;
            }
            thread::sleep(interval);
        }
    }
}

// ── ThreadPool ────────────────────────────────────────────────────────────────

/// Fixed-size worker pool plus one dedicated deterministic worker.
///
/// Dropping the pool performs a full shutdown: the exit flag is raised, one
/// wake message is pushed per worker, and every worker is joined.  Jobs
/// still queued at that point are discarded, not executed.
pub struct ThreadPool {
    parallel_tx:   Sender<Message>,
    serial_tx:     Sender<Message>,
    deterministic: AtomicBool,
    drain:         Arc<DrainState>,
    exit:          Arc<AtomicBool>,
    drain_poll:    Option<Duration>,
    workers:       Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Build a pool with `worker_count` parallel workers (clamped to ≥ 1)
    /// plus the deterministic worker.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let drain = Arc::new(DrainState::new());
        let exit = Arc::new(AtomicBool::new(false));

        let (parallel_tx, parallel_rx) = unbounded::<Message>();
        let (serial_tx, serial_rx) = unbounded::<Message>();

        let mut workers = Vec::with_capacity(worker_count + 1);
        for i in 0..worker_count {
            workers.push(spawn_worker(
                format!("cosim-worker-{i}"),
                parallel_rx.clone(),
                Arc::clone(&exit),
                Arc::clone(&drain),
            ));
        }
        workers.push(spawn_worker(
            "cosim-serial".into(),
            serial_rx,
            Arc::clone(&exit),
            Arc::clone(&drain),
        ));

        Self {
            parallel_tx,
            serial_tx,
            deterministic: AtomicBool::new(false),
            drain,
            exit,
            drain_poll: None,
            workers,
        }
    }

    /// Pool sized to the host's logical core count.
    pub fn with_host_concurrency() -> Self {
        Self::new(host_concurrency())
    }

    /// Parallel-lane worker count.
    pub fn worker_count(&self) -> usize {
        self.workers.len() - 1
    }

    // ── Mode ──────────────────────────────────────────────────────────────

    /// Select which lane subsequent submissions feed.  Callers should drain
    /// before switching so in-flight jobs keep their lane's guarantees.
    pub fn set_mode(&self, mode: PoolMode) {
        self.deterministic
            .store(mode == PoolMode::Deterministic, Ordering::Relaxed);
    }

    pub fn mode(&self) -> PoolMode {
        if self.deterministic.load(Ordering::Relaxed) {
            PoolMode::Deterministic
        } else {
            PoolMode::Parallel
        }
    }

    /// Replace the exact drain signal with a fixed-interval poll (the
    /// original design polled every 50 ms).  `None` restores the signal.
    pub fn set_drain_poll(&mut self, interval: Option<Duration>) {
        self.drain_poll = interval;
    }

    // ── Submission and the barrier ────────────────────────────────────────

    /// Enqueue a job on the current lane.  The queue is unbounded — `false`
    /// means an internal queue failure (workers gone), never "pool full".
    pub fn submit(&self, job: Job) -> bool {
        self.drain.add();
        let tx = match self.mode() {
            PoolMode::Parallel      => &self.parallel_tx,
            PoolMode::Deterministic => &self.serial_tx,
        };
        match tx.send(Message::Run(job)) {
            Ok(()) => true,
            Err(_) => {
                // The job never reached a worker; undo its drain slot.
                self.drain.complete();
                false
            }
        }
    }

    /// Block until the outstanding-job counter reaches zero.
    ///
    /// When this returns, the side effects of every previously submitted job
    /// are observable by the caller.
    pub fn await_drain(&self) {
        match self.drain_poll {
            Some(interval) => self.drain.wait_polling(interval),
            None           => self.drain.wait(),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.exit.store(true, Ordering::Release);
        // One wake per parallel worker, one for the serial worker.  Send
        // failures mean the worker already hung up, which is fine.
        for _ in 0..self.workers.len() - 1 {
            let _ = self.parallel_tx.send(Message::Wake);
        }
        let _ = self.serial_tx.send(Message::Wake);

        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

// ── Workers ───────────────────────────────────────────────────────────────────

fn spawn_worker(
    name:  String,
    rx:    Receiver<Message>,
    exit:  Arc<AtomicBool>,
    drain: Arc<DrainState>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name(name)
        .spawn(move || worker_loop(rx, exit, drain))
        .expect("spawning a pool worker")
}

fn worker_loop(rx: Receiver<Message>, exit: Arc<AtomicBool>, drain: Arc<DrainState>) {
    while let Ok(msg) = rx.recv() {
        if exit.load(Ordering::Acquire) {
            break;
        }
        if let Message::Run(job) = msg {
            // Completion must be recorded even if a job panics past its own
            // dispatch guard, or await_drain would hang forever.
            let result = catch_unwind(AssertUnwindSafe(job));
            drain.complete();
            drop(result);
        }
    }
}

/// Logical cores available to this process, clamped to ≥ 1.
pub fn host_concurrency() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}
