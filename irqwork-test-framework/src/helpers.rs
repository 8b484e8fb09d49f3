//! Helpers shared by the scenario steps

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use irqwork::sim::SimPlatform;
use irqwork::{container_of, Config, IrqWork, IrqWorkFn, IrqWorkQueues, Policy};

/// CPUs on every simulated machine
pub const SIM_CPUS: usize = 4;

/// Queue table of a simulated machine
pub type SimQueues = IrqWorkQueues<SimPlatform, SIM_CPUS>;

/// A fresh machine with a self-interrupt, leaked for the rest of the run
///
/// Probes hold on to their queue table from inside callbacks, so it has to be
/// `'static`.
pub fn leak_queues(policy: Policy) -> &'static SimQueues {
    Box::leak(Box::new(IrqWorkQueues::new(
        SimPlatform::new(SIM_CPUS),
        Config::new().with_policy(policy),
    )))
}

/// A fresh machine that only delivers from the tick
pub fn leak_queues_without_self_interrupt(policy: Policy) -> &'static SimQueues {
    Box::leak(Box::new(IrqWorkQueues::new(
        SimPlatform::without_self_interrupt(SIM_CPUS),
        Config::new().with_policy(policy),
    )))
}

/// Names of probes in the order their callbacks ran
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Mutex<Vec<String>>,
}

impl RunLog {
    pub fn leak() -> &'static RunLog {
        Box::leak(Box::default())
    }

    fn record(&self, name: &str) {
        self.entries.lock().unwrap().push(name.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| *entry == name)
            .count()
    }
}

/// A work item that logs each run and can re-queue itself
pub struct Probe {
    work: IrqWork,
    name: String,
    log: &'static RunLog,
    queues: &'static SimQueues,
    rearms: AtomicUsize,
    running: AtomicBool,
    overlapped: AtomicBool,
}

extern "C" fn probe_fn(work: &IrqWork) {
    let probe = unsafe { &*container_of!(work, Probe, work) };
    if probe.running.swap(true, Ordering::SeqCst) {
        probe.overlapped.store(true, Ordering::SeqCst);
    }

    probe.log.record(&probe.name);
    if probe
        .rearms
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        // PENDING was cleared before the callback, so this claim succeeds
        assert!(probe.queue(), "{}: re-queue from callback refused", probe.name);
    }

    probe.running.store(false, Ordering::SeqCst);
}

impl Probe {
    /// Leak a probe whose item is built by `make` (`IrqWork::new`,
    /// `IrqWork::new_lazy` or `IrqWork::new_hard_irq`)
    pub fn leak(
        name: &str,
        make: fn(IrqWorkFn) -> IrqWork,
        log: &'static RunLog,
        queues: &'static SimQueues,
    ) -> &'static Probe {
        Box::leak(Box::new(Probe {
            work: make(probe_fn),
            name: name.to_string(),
            log,
            queues,
            rearms: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
        }))
    }

    /// Re-queue from the callback for the next `count` runs
    pub fn rearm(&self, count: usize) {
        self.rearms.store(count, Ordering::SeqCst);
    }

    /// Queue on whichever simulated CPU the caller is on
    pub fn queue(&self) -> bool {
        // SAFETY: probes are leaked and never move
        unsafe { self.queues.queue(&self.work) }
    }

    pub fn work(&self) -> &IrqWork {
        &self.work
    }

    /// Whether two runs ever overlapped
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe")
            .field("name", &self.name)
            .field("work", &self.work)
            .finish()
    }
}
