//! Concurrency tests
//!
//! Threads stand in for contexts on simulated CPUs. Several threads sharing a
//! CPU index model nested contexts pushing onto the same per-CPU list, which
//! is exactly the case the lock-less push has to survive.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use irqwork::sim::SimPlatform;
use irqwork::{container_of, Config, CpuId, IrqWork, IrqWorkQueues, ListKind, Policy};
use proptest::prelude::*;

type Queues = IrqWorkQueues<SimPlatform, 8>;

struct Tally {
    work: IrqWork,
    hits: AtomicUsize,
    running: AtomicBool,
    overlaps: AtomicUsize,
}

extern "C" fn tally(work: &IrqWork) {
    let tally = unsafe { &*container_of!(work, Tally, work) };
    if tally.running.swap(true, Ordering::SeqCst) {
        tally.overlaps.fetch_add(1, Ordering::SeqCst);
    }
    tally.hits.fetch_add(1, Ordering::SeqCst);
    tally.running.store(false, Ordering::SeqCst);
}

impl Tally {
    fn new() -> Self {
        Self {
            work: IrqWork::new(tally),
            hits: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            overlaps: AtomicUsize::new(0),
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn leak_queues(nr_cpus: usize) -> &'static Queues {
    Box::leak(Box::new(IrqWorkQueues::new(
        SimPlatform::new(nr_cpus),
        Config::new().with_policy(Policy::Immediate),
    )))
}

fn leak_tallies(count: usize) -> &'static [Tally] {
    Box::leak((0..count).map(|_| Tally::new()).collect::<Vec<_>>().into_boxed_slice())
}

/// Push `tallies` from `producers` threads all claiming `cpu`, then drain once
fn push_then_drain(q: &'static Queues, tallies: &'static [Tally], producers: usize, cpu: CpuId) {
    let barrier = Arc::new(Barrier::new(producers));
    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                q.platform().on_cpu(cpu, || {
                    barrier.wait();
                    for tally in tallies.iter().skip(p).step_by(producers) {
                        assert!(unsafe { q.queue(&tally.work) });
                        if p % 2 == 0 {
                            thread::yield_now();
                        }
                    }
                })
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    q.platform().in_hardirq(cpu, || q.run());
}

#[test]
fn test_concurrent_distinct_items_one_cpu() {
    let q = leak_queues(2);
    let tallies = leak_tallies(256);

    push_then_drain(q, tallies, 8, CpuId(0));

    assert!(tallies.iter().all(|t| t.hits() == 1));
    assert!(!q.has_pending_on(CpuId(0), ListKind::Raised));
    assert!(tallies.iter().all(|t| !t.work.is_busy()));
}

#[test]
fn test_concurrent_same_item_single_enqueue() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 200;

    let q = leak_queues(THREADS);
    let tally: &'static Tally = Box::leak(Box::new(Tally::new()));

    for _ in 0..ROUNDS {
        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|cpu| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    q.platform().on_cpu(CpuId::from(cpu), || {
                        barrier.wait();
                        unsafe { q.queue(&tally.work) }
                    })
                })
            })
            .collect();
        let winners: Vec<usize> = handles
            .into_iter()
            .enumerate()
            .filter_map(|(cpu, h)| h.join().unwrap().then_some(cpu))
            .collect();
        assert_eq!(winners.len(), 1);

        // Only the winner's CPU holds the item
        let owner = CpuId::from(winners[0]);
        for cpu in 0..THREADS {
            assert_eq!(
                q.has_pending_on(CpuId::from(cpu), ListKind::Raised),
                CpuId::from(cpu) == owner
            );
        }
        q.platform().in_hardirq(owner, || q.run());
    }

    assert_eq!(tally.hits(), ROUNDS);
    assert_eq!(tally.overlaps.load(Ordering::SeqCst), 0);
}

#[test]
fn test_drain_races_with_producers() {
    const PRODUCERS: usize = 4;
    const ITEMS: usize = 512;

    let q = leak_queues(1);
    let tallies = leak_tallies(ITEMS);
    let done = Arc::new(AtomicBool::new(false));

    let drainer = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                q.platform().in_hardirq(CpuId(0), || q.run());
                thread::yield_now();
            }
        })
    };

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            thread::spawn(move || {
                q.platform().on_cpu(CpuId(0), || {
                    for tally in tallies.iter().skip(p).step_by(PRODUCERS) {
                        unsafe {
                            q.queue(&tally.work);
                        }
                    }
                })
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    done.store(true, Ordering::SeqCst);
    drainer.join().unwrap();
    q.platform().in_hardirq(CpuId(0), || q.run());

    assert!(tallies.iter().all(|t| t.hits() == 1));
    assert!(!q.has_pending_on(CpuId(0), ListKind::Raised));
}

#[test]
fn test_requeue_while_running_never_overlaps() {
    const ROUNDS: usize = 2000;

    let q = leak_queues(1);
    let tally: &'static Tally = Box::leak(Box::new(Tally::new()));
    let done = Arc::new(AtomicBool::new(false));
    let queued = Arc::new(AtomicUsize::new(0));

    let drainer = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                q.platform().in_hardirq(CpuId(0), || q.run());
            }
        })
    };

    let producer = {
        let queued = Arc::clone(&queued);
        thread::spawn(move || {
            q.platform().on_cpu(CpuId(0), || {
                for _ in 0..ROUNDS {
                    if unsafe { q.queue(&tally.work) } {
                        queued.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
    };

    producer.join().unwrap();
    done.store(true, Ordering::SeqCst);
    drainer.join().unwrap();
    q.platform().in_hardirq(CpuId(0), || q.run());

    // Every successful queue produced exactly one run
    assert_eq!(tally.hits(), queued.load(Ordering::SeqCst));
    assert_eq!(tally.overlaps.load(Ordering::SeqCst), 0);
    assert!(!tally.work.is_busy());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn no_item_lost_or_duplicated(producers in 1usize..6, items in 1usize..96, cpu in 0u32..4) {
        let q = leak_queues(4);
        let tallies = leak_tallies(items);
        let cpu = CpuId(cpu);

        push_then_drain(q, tallies, producers, cpu);

        prop_assert!(tallies.iter().all(|t| t.hits() == 1));
        prop_assert!(!q.has_pending_on(cpu, ListKind::Raised));
        prop_assert!(!q.platform().on_cpu(cpu, || q.needs_cpu()));
    }
}
