//! Property-based tests for the six invariants, against the public API.
use quickcheck_macros::quickcheck;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

fn serialize() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

/// Invariant 1: mutual exclusion. Every forked task bumps a shared counter
/// on entry and drops it on exit with no synchronisation of its own; if two
/// task bodies ever ran concurrently the counter would be observed above 1.
#[test]
fn mutual_exclusion_holds_under_many_tasks() {
    let _guard = serialize();
    priosched::init(3, 1).unwrap();

    let concurrent = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    for i in 0..20 {
        let concurrent = Arc::clone(&concurrent);
        let max_seen = Arc::clone(&max_seen);
        priosched::fork(
            move |_prio| {
                let n = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(n, Ordering::SeqCst);
                for _ in 0..3 {
                    priosched::exec();
                }
                concurrent.fetch_sub(1, Ordering::SeqCst);
            },
            (i % 5) as u32,
        )
        .unwrap();
    }

    priosched::end();
    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
}

/// Invariants 2 and 3, combined: a single controller task forks `N`
/// children with random priorities no greater than its own, so none of them
/// preempt it; once the controller returns, the children run in strictly
/// descending priority order, ties broken by fork order. This exercises
/// priority monotonicity across every non-`wait` handoff and FIFO ordering
/// within a priority band at once.
#[quickcheck]
fn dispatch_order_matches_priority_then_fifo(raw_priorities: Vec<u8>) -> bool {
    let _guard = serialize();
    let priorities: Vec<u32> = raw_priorities
        .into_iter()
        .take(12)
        .map(|p| (p % (priosched::MAX_PRIO + 1) as u8) as u32)
        .collect();
    if priorities.is_empty() {
        return true;
    }

    priosched::init(1000, 1).unwrap();

    let log: Arc<Mutex<Vec<(u32, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let controller_log = Arc::clone(&log);
    let children = priorities.clone();
    priosched::fork(
        move |_prio| {
            for (idx, &prio) in children.iter().enumerate() {
                let log = Arc::clone(&controller_log);
                priosched::fork(move |_prio| log.lock().unwrap().push((prio, idx)), prio).unwrap();
            }
        },
        priosched::MAX_PRIO,
    )
    .unwrap();

    priosched::end();

    let mut expected: Vec<(u32, usize)> =
        priorities.into_iter().enumerate().map(|(i, p)| (p, i)).collect();
    expected.sort_by(|a, b| b.0.cmp(&a.0));

    *log.lock().unwrap() == expected
}

/// Invariant 4: quantum accounting. With no competing higher-priority task,
/// a task of quantum `q` is preempted by its equal-priority successor
/// exactly after its `q`th `exec`, never sooner.
///
/// Relies on the outer (non-task) thread forking task B before task A's OS
/// thread gets scheduled for the first time; see `fork`'s doc comment and
/// DESIGN.md's "Known race" note.
#[quickcheck]
fn quantum_expires_after_exactly_q_execs(raw_quantum: u8) -> bool {
    let _guard = serialize();
    let quantum = (raw_quantum % 8) as u32 + 1;

    priosched::init(quantum, 1).unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    let switched_at = Arc::new(AtomicUsize::new(0));

    let ca = Arc::clone(&count);
    let sa = Arc::clone(&switched_at);
    priosched::fork(
        move |_prio| loop {
            let n = ca.fetch_add(1, Ordering::SeqCst) + 1;
            if sa.load(Ordering::SeqCst) != 0 {
                break;
            }
            priosched::exec();
        },
        1,
    )
    .unwrap();

    let cb = Arc::clone(&count);
    let sb = Arc::clone(&switched_at);
    priosched::fork(
        move |_prio| {
            sb.store(cb.load(Ordering::SeqCst), Ordering::SeqCst);
        },
        1,
    )
    .unwrap();

    priosched::end();
    switched_at.load(Ordering::SeqCst) as u32 == quantum
}

/// Invariant 5: signal round-trip. The count `signal` returns equals the
/// number of tasks it actually drains from the wait set, in both the
/// present-waiter and no-waiter cases.
#[test]
fn signal_returns_exact_drained_count() {
    let _guard = serialize();
    priosched::init(10, 2).unwrap();

    let woken = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        let woken = Arc::clone(&woken);
        priosched::fork(
            move |_prio| {
                priosched::wait(0).unwrap();
                woken.fetch_add(1, Ordering::SeqCst);
            },
            1,
        )
        .unwrap();
    }

    let counts = Arc::new(Mutex::new(Vec::new()));
    let c1 = Arc::clone(&counts);
    priosched::fork(
        move |_prio| {
            // event 1 has no waiters: draining it is a documented no-op that
            // still reports 0 drained.
            c1.lock().unwrap().push(priosched::signal(1).unwrap());
            c1.lock().unwrap().push(priosched::signal(0).unwrap());
        },
        0,
    )
    .unwrap();

    priosched::end();
    assert_eq!(*counts.lock().unwrap(), vec![0, 3]);
    assert_eq!(woken.load(Ordering::SeqCst), 3);
}

/// Invariant 6: join completeness. After `end` returns, every forked task's
/// body has run to completion.
#[test]
fn end_waits_for_every_task_body_to_return() {
    let _guard = serialize();
    priosched::init(2, 1).unwrap();

    let completed = Arc::new(AtomicUsize::new(0));
    for i in 0..10 {
        let completed = Arc::clone(&completed);
        priosched::fork(
            move |_prio| {
                priosched::exec();
                completed.fetch_add(1, Ordering::SeqCst);
            },
            (i % 4) as u32,
        )
        .unwrap();
    }

    priosched::end();
    assert_eq!(completed.load(Ordering::SeqCst), 10);
}
