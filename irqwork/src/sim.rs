//! Simulated multi-CPU platform for userspace tests
//!
//! Each OS thread plays one context on one simulated CPU at a time. Which CPU
//! a thread is on, whether its interrupts are disabled and its preemption
//! depth are thread-local. Several threads may claim the same CPU at once to
//! model nested contexts (a task interrupted by an IRQ interrupted by an NMI)
//! that all push onto that CPU's lists.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use irqwork_core::CpuId;

use crate::arch::Platform;

thread_local! {
    static CURRENT_CPU: Cell<CpuId> = const { Cell::new(CpuId::BOOT) };
    static IRQS_DISABLED: Cell<bool> = const { Cell::new(false) };
    static PREEMPT_COUNT: Cell<u32> = const { Cell::new(0) };
}

/// Platform backed by thread-locals and per-CPU counters
#[derive(Debug)]
pub struct SimPlatform {
    self_interrupt: bool,
    raised: Vec<AtomicUsize>,
    soft_ticks: Vec<AtomicUsize>,
    tick_stopped: Vec<AtomicBool>,
    offline: Vec<AtomicBool>,
}

/// Restores the calling thread's simulated context on drop
struct ContextGuard {
    cpu: CpuId,
    irqs_disabled: bool,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CPU.with(|c| c.set(self.cpu));
        IRQS_DISABLED.with(|c| c.set(self.irqs_disabled));
    }
}

fn enter(cpu: CpuId, irqs_disabled: bool) -> ContextGuard {
    ContextGuard {
        cpu: CURRENT_CPU.with(|c| c.replace(cpu)),
        irqs_disabled: IRQS_DISABLED.with(|c| c.replace(irqs_disabled)),
    }
}

impl SimPlatform {
    /// `nr_cpus` CPUs with a working self-interrupt
    pub fn new(nr_cpus: usize) -> Self {
        Self::build(nr_cpus, true)
    }

    /// `nr_cpus` CPUs that rely on the tick for raised work
    pub fn without_self_interrupt(nr_cpus: usize) -> Self {
        Self::build(nr_cpus, false)
    }

    fn build(nr_cpus: usize, self_interrupt: bool) -> Self {
        Self {
            self_interrupt,
            raised: (0..nr_cpus).map(|_| AtomicUsize::new(0)).collect(),
            soft_ticks: (0..nr_cpus).map(|_| AtomicUsize::new(0)).collect(),
            tick_stopped: (0..nr_cpus).map(|_| AtomicBool::new(false)).collect(),
            offline: (0..nr_cpus).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    pub fn nr_cpus(&self) -> usize {
        self.raised.len()
    }

    /// Run `f` in task context on `cpu`
    ///
    /// `cpu` is not checked against `nr_cpus`, so tests can model a
    /// platform reporting a CPU the per-CPU table does not cover.
    pub fn on_cpu<R>(&self, cpu: CpuId, f: impl FnOnce() -> R) -> R {
        let _context = enter(cpu, false);
        f()
    }

    /// Run `f` on `cpu` with local interrupts disabled
    pub fn in_hardirq<R>(&self, cpu: CpuId, f: impl FnOnce() -> R) -> R {
        let _context = enter(cpu, true);
        f()
    }

    /// Self-interrupts requested on `cpu` so far
    pub fn self_interrupts(&self, cpu: CpuId) -> usize {
        self.raised[cpu.index()].load(Ordering::SeqCst)
    }

    /// Soft tick passes requested on `cpu` so far
    pub fn soft_ticks(&self, cpu: CpuId) -> usize {
        self.soft_ticks[cpu.index()].load(Ordering::SeqCst)
    }

    pub fn set_tick_stopped(&self, cpu: CpuId, stopped: bool) {
        self.tick_stopped[cpu.index()].store(stopped, Ordering::SeqCst);
    }

    pub fn set_offline(&self, cpu: CpuId, offline: bool) {
        self.offline[cpu.index()].store(offline, Ordering::SeqCst);
    }

    /// Preemption depth of the calling thread
    pub fn preempt_count() -> u32 {
        PREEMPT_COUNT.with(Cell::get)
    }

    fn flag(flags: &[AtomicBool], cpu: CpuId) -> bool {
        flags
            .get(cpu.index())
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn bump(counters: &[AtomicUsize], cpu: CpuId) {
        if let Some(counter) = counters.get(cpu.index()) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Platform for SimPlatform {
    fn current_cpu(&self) -> CpuId {
        CURRENT_CPU.with(Cell::get)
    }

    fn preempt_disable(&self) {
        PREEMPT_COUNT.with(|c| c.set(c.get() + 1));
    }

    fn preempt_enable(&self) {
        PREEMPT_COUNT.with(|c| c.set(c.get().saturating_sub(1)));
    }

    fn raise_self_interrupt(&self) {
        Self::bump(&self.raised, self.current_cpu());
    }

    fn has_self_interrupt(&self) -> bool {
        self.self_interrupt
    }

    fn tick_stopped(&self) -> bool {
        Self::flag(&self.tick_stopped, self.current_cpu())
    }

    fn cpu_is_offline(&self, cpu: CpuId) -> bool {
        Self::flag(&self.offline, cpu)
    }

    fn irqs_disabled(&self) -> bool {
        IRQS_DISABLED.with(Cell::get)
    }

    fn raise_soft_tick(&self) {
        Self::bump(&self.soft_ticks, self.current_cpu());
    }

    fn cpu_relax(&self) {
        thread::yield_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_nests_and_restores() {
        let sim = SimPlatform::new(2);
        assert_eq!(sim.current_cpu(), CpuId(0));

        sim.on_cpu(CpuId(1), || {
            assert_eq!(sim.current_cpu(), CpuId(1));
            assert!(!sim.irqs_disabled());
            sim.in_hardirq(CpuId(1), || assert!(sim.irqs_disabled()));
            assert!(!sim.irqs_disabled());
        });

        assert_eq!(sim.current_cpu(), CpuId(0));
    }

    #[test]
    fn test_counters_are_per_cpu() {
        let sim = SimPlatform::new(2);
        sim.on_cpu(CpuId(1), || {
            sim.raise_self_interrupt();
            sim.raise_soft_tick();
        });
        assert_eq!(sim.self_interrupts(CpuId(0)), 0);
        assert_eq!(sim.self_interrupts(CpuId(1)), 1);
        assert_eq!(sim.soft_ticks(CpuId(1)), 1);
    }

    #[test]
    fn test_preempt_count() {
        let sim = SimPlatform::new(1);
        sim.preempt_disable();
        assert_eq!(SimPlatform::preempt_count(), 1);
        sim.preempt_enable();
        assert_eq!(SimPlatform::preempt_count(), 0);
    }
}
