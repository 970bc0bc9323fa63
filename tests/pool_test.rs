//! Integration tests for the worker pool.

use brigade::prelude::*;
use crossbeam_channel::{bounded, unbounded};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn small_pool(capacity: usize) -> WorkerPool {
    WorkerPool::new(Config::builder().capacity(capacity).build().unwrap()).unwrap()
}

fn wait_for(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_five_sleepers_on_two_workers() {
    let pool = small_pool(2);
    let done = Arc::new(AtomicUsize::new(0));

    for _ in 0..5 {
        let done = Arc::clone(&done);
        pool.spawn(move || {
            thread::sleep(Duration::from_millis(50));
            done.fetch_add(1, Ordering::SeqCst);
        });
    }

    thread::sleep(Duration::from_millis(30));
    assert!(pool.running_count() <= 2);
    assert!(pool.queued_count() >= 1);
    assert!(pool.worker_count() <= 2);

    wait_for("all five sleepers", || done.load(Ordering::SeqCst) == 5);
    wait_for("counters to drain", || {
        pool.queued_count() == 0 && pool.running_count() == 0
    });
    assert_eq!(pool.submitted_count(), 5);
    assert_eq!(pool.in_progress_count(), 5);
}

#[test]
fn test_fifo_dispatch_order() {
    let pool = small_pool(1);
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..5 {
        let order = Arc::clone(&order);
        pool.spawn(move || order.lock().push(i));
    }

    pool.run_to_completion();
    assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_no_workers_until_first_submission() {
    let pool = small_pool(3);
    assert_eq!(pool.worker_count(), 0);

    pool.spawn(|| {});
    assert_eq!(pool.worker_count(), 1);
    pool.run_to_completion();
}

#[test]
fn test_growth_capped_at_capacity() {
    let pool = small_pool(3);
    let (gate_tx, gate_rx) = unbounded::<()>();
    let started = Arc::new(AtomicUsize::new(0));

    for _ in 0..6 {
        let gate = gate_rx.clone();
        let started = Arc::clone(&started);
        pool.spawn(move || {
            started.fetch_add(1, Ordering::SeqCst);
            gate.recv().ok();
        });
    }

    assert_eq!(pool.worker_count(), 3);
    wait_for("three tasks to start", || started.load(Ordering::SeqCst) == 3);
    assert_eq!(pool.running_count(), 3);
    assert_eq!(pool.queued_count(), 3);

    drop(gate_tx);
    pool.run_to_completion();
    assert_eq!(started.load(Ordering::SeqCst), 6);
}

#[test]
fn test_stop_discards_queue_and_interrupts_running() {
    let pool = small_pool(2);
    let (gate_tx, gate_rx) = unbounded::<()>();
    let ran = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let gate = gate_rx.clone();
        pool.spawn(move || {
            gate.recv().ok();
        });
    }
    wait_for("both blockers to start", || pool.running_count() == 2);

    for _ in 0..3 {
        let ran = Arc::clone(&ran);
        pool.spawn(move || {
            ran.fetch_add(1, Ordering::SeqCst);
        });
    }
    assert_eq!(pool.queued_count(), 3);

    pool.stop();
    assert!(pool.is_stopped());
    assert_eq!(pool.queued_count(), 0);
    let running = pool.running_tasks();
    assert_eq!(running.len(), 2);
    assert!(running.iter().all(|t| t.is_interrupted()));

    // Submissions after stop are silently dropped.
    let late = Arc::new(AtomicUsize::new(0));
    let late_hit = Arc::clone(&late);
    pool.spawn(move || {
        late_hit.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(pool.queued_count(), 0);

    drop(gate_tx);
    wait_for("blockers to unwind", || pool.running_count() == 0);
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(late.load(Ordering::SeqCst), 0);
}

#[test]
fn test_drain_queue_adjusts_submitted() {
    let pool = small_pool(1);
    let (gate_tx, gate_rx) = unbounded::<()>();
    {
        let gate = gate_rx.clone();
        pool.spawn(move || {
            gate.recv().ok();
        });
    }
    wait_for("blocker to start", || pool.running_count() == 1);

    let hits = Arc::new(Mutex::new(Vec::new()));
    for name in ["a", "b", "c"] {
        let hits = Arc::clone(&hits);
        pool.spawn(move || hits.lock().push(name));
    }
    assert_eq!(pool.submitted_count(), 4);
    assert_eq!(pool.queued_count(), 3);

    pool.drain_queue(|mut queued| {
        assert_eq!(queued.len(), 3);
        vec![queued.remove(1)]
    });
    assert_eq!(pool.queued_count(), 1);
    assert_eq!(pool.submitted_count(), 2);

    drop(gate_tx);
    pool.run_to_completion();
    assert_eq!(*hits.lock(), vec!["b"]);
}

#[test]
fn test_drain_queue_with_running_sees_both_sides() {
    let pool = small_pool(1);
    let (gate_tx, gate_rx) = unbounded::<()>();
    {
        let gate = gate_rx.clone();
        pool.spawn(move || {
            gate.recv().ok();
        });
    }
    wait_for("blocker to start", || pool.running_count() == 1);
    pool.spawn(|| {});

    let mut counts = (0, 0);
    pool.drain_queue_with_running(|queued, running| {
        counts = (queued.len(), running.len());
        queued
    });
    assert_eq!(counts, (1, 1));

    drop(gate_tx);
    pool.run_to_completion();
}

#[test]
fn test_drain_queue_can_inject_tasks() {
    let pool = small_pool(2);
    let ran = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&ran);
    pool.drain_queue(move |queued| {
        assert!(queued.is_empty());
        vec![PoolTask::new(ClosureTask::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))]
    });
    assert_eq!(pool.submitted_count(), 1);

    wait_for("injected task to run", || ran.load(Ordering::SeqCst) == 1);
    pool.run_to_completion();
}

#[test]
fn test_with_running_tasks_observes_under_lock() {
    let pool = small_pool(1);
    let (gate_tx, gate_rx) = unbounded::<()>();
    {
        let gate = gate_rx.clone();
        pool.spawn(move || {
            gate.recv().ok();
        });
    }
    wait_for("blocker to start", || pool.running_count() == 1);

    let mut seen = 0;
    pool.with_running_tasks(|running| seen = running.len());
    assert_eq!(seen, 1);

    drop(gate_tx);
    pool.run_to_completion();
}

#[test]
fn test_is_worker_thread() {
    let pool = Arc::new(small_pool(2));
    assert!(!pool.is_worker_thread());

    let (tx, rx) = bounded(1);
    let inner = Arc::clone(&pool);
    pool.spawn(move || {
        tx.send(inner.is_worker_thread()).ok();
    });

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(true));
    pool.run_to_completion();
}

#[test]
fn test_submit_from_worker_thread() {
    let pool = Arc::new(small_pool(1));
    let done = Arc::new(AtomicUsize::new(0));

    let inner_pool = Arc::clone(&pool);
    let inner_done = Arc::clone(&done);
    pool.spawn(move || {
        inner_done.fetch_add(1, Ordering::SeqCst);
        let nested_done = Arc::clone(&inner_done);
        inner_pool.spawn(move || {
            nested_done.fetch_add(1, Ordering::SeqCst);
        });
    });

    wait_for("outer and nested task", || done.load(Ordering::SeqCst) == 2);
    pool.run_to_completion();
}

#[test]
fn test_run_to_completion_retires_workers() {
    let pool = small_pool(4);
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..20 {
        let counter = Arc::clone(&counter);
        pool.spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    pool.run_to_completion();
    assert_eq!(counter.load(Ordering::SeqCst), 20);
    assert_eq!(pool.queued_count(), 0);
    assert_eq!(pool.running_count(), 0);
    wait_for("workers to retire", || pool.worker_count() == 0);
}

#[test]
fn test_block_until_idle() {
    let pool = small_pool(1);
    assert!(pool.block_until_idle(Duration::from_millis(1)));

    let (gate_tx, gate_rx) = unbounded::<()>();
    {
        let gate = gate_rx.clone();
        pool.spawn(move || {
            gate.recv().ok();
        });
    }
    wait_for("blocker to start", || pool.running_count() == 1);

    let start = Instant::now();
    assert!(!pool.block_until_idle(Duration::from_millis(50)));
    assert!(start.elapsed() >= Duration::from_millis(50));

    drop(gate_tx);
    pool.run_to_completion();
}

#[test]
fn test_snapshot_counters() {
    let pool = small_pool(2);
    assert_eq!(
        pool.snapshot(),
        PoolSnapshot {
            queued: 0,
            running: 0,
            in_progress: 0,
            submitted: 0,
            workers: 0,
            capacity: 2,
            stopped: false,
        }
    );

    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        let counter = Arc::clone(&counter);
        pool.spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    pool.run_to_completion();

    let snap = pool.snapshot();
    assert_eq!(snap.submitted, 3);
    assert_eq!(snap.in_progress, 3);
    assert_eq!(snap.queued, 0);
    assert_eq!(snap.running, 0);
    assert!(snap.workers <= 2);
    assert!(!snap.stopped);
}

#[test]
fn test_drop_finishes_outstanding_work() {
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let pool = small_pool(2);
        for _ in 0..5 {
            let counter = Arc::clone(&counter);
            pool.spawn(move || {
                thread::sleep(Duration::from_millis(10));
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        // Dropped with work still pending.
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    while counter.load(Ordering::SeqCst) < 5 {
        assert!(Instant::now() < deadline, "work lost on drop");
        thread::sleep(Duration::from_millis(5));
    }
}
