//! Per-CPU work lists and the paths that drain them
//!
//! Every CPU owns two lock-less lists. The raised list is drained from the
//! self-interrupt (or from the tick when there is no self-interrupt). The
//! lazy list is drained from the tick, or from the soft tick pass under
//! [`Policy::PreferRealtime`](crate::Policy::PreferRealtime).
//!
//! Any context on any CPU may push, including NMI. Only the owning CPU ever
//! detaches, so a drain only races with pushers, never with another drain.

use irqwork_core::{CpuId, IrqWorkFlags, NR_CPUS};
use irqwork_ffi::{KernelError, KernelResult};
use irqwork_llist::{LlistHead, LlistIter};
use static_assertions::assert_eq_size;

use crate::arch::{Platform, PreemptGuard};
use crate::config::Config;
use crate::diag::warn_on_once;
use crate::work::IrqWork;

/// Which of a CPU's two lists
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ListKind {
    Raised,
    Lazy,
}

#[repr(C, align(64))]
struct PerCpuLists {
    raised: LlistHead,
    lazy: LlistHead,
}

// One cache line per CPU
assert_eq_size!(PerCpuLists, [u8; 64]);

impl PerCpuLists {
    const INIT: Self = Self {
        raised: LlistHead::new(),
        lazy: LlistHead::new(),
    };

    fn get(&self, kind: ListKind) -> &LlistHead {
        match kind {
            ListKind::Raised => &self.raised,
            ListKind::Lazy => &self.lazy,
        }
    }
}

/// The per-CPU list table plus the platform hooks that drive it
///
/// Built once before any producer runs and never torn down. `N` bounds the
/// CPU indices the platform may report.
pub struct IrqWorkQueues<P, const N: usize = NR_CPUS> {
    platform: P,
    config: Config,
    cpus: [PerCpuLists; N],
}

impl<P, const N: usize> IrqWorkQueues<P, N> {
    pub const fn new(platform: P, config: Config) -> Self {
        Self {
            platform,
            config,
            cpus: [PerCpuLists::INIT; N],
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> Config {
        self.config
    }
}

impl<P: Platform, const N: usize> IrqWorkQueues<P, N> {
    fn lists(&self, cpu: CpuId) -> Option<&PerCpuLists> {
        let lists = self.cpus.get(cpu.index());
        warn_on_once!(
            lists.is_none(),
            cpu = cpu.0,
            nr_cpus = N,
            "irq_work: cpu outside the per-cpu table"
        );
        lists
    }

    /// Enqueue `work` on the current CPU unless it is already pending
    ///
    /// Returns true if this call queued the item. A false return means the
    /// item was already pending and nothing happened. Never blocks, never
    /// allocates, and is safe from NMI context.
    ///
    /// The item may be re-queued while its callback is still running,
    /// including from the callback itself.
    ///
    /// Linux equivalent: `irq_work_queue(work)`
    ///
    /// # Safety
    /// `work` must stay alive and must not move until it is neither pending
    /// nor busy; call [`sync`](Self::sync) before releasing it.
    pub unsafe fn queue(&self, work: &IrqWork) -> bool {
        let _preempt = PreemptGuard::new(&self.platform);
        // Refusals must leave the status word alone: BUSY may belong to a
        // callback that is still running
        let Some(lists) = self.lists(self.platform.current_cpu()) else {
            return false;
        };
        if !work.claim() {
            return false;
        }

        let mode = work.flags();
        let lazy_work = mode.contains(IrqWorkFlags::LAZY);
        let list = if lazy_work
            || (self.config.prefers_realtime() && !mode.contains(IrqWorkFlags::HARD_IRQ))
        {
            &lists.lazy
        } else {
            &lists.raised
        };

        if list.add(work.llnode_ptr()) && (!lazy_work || self.platform.tick_stopped()) {
            self.platform.raise_self_interrupt();
        }

        true
    }

    /// Detach `list` and run every callback on it, newest first
    fn run_list(&self, list: &LlistHead) {
        warn_on_once!(
            !self.config.prefers_realtime() && !self.platform.irqs_disabled(),
            "irq_work: list drained with interrupts enabled"
        );

        if list.is_empty() {
            return;
        }

        let mut ran = 0usize;
        // SAFETY: queue() requires every item to outlive its pending and
        // busy window, and only this CPU detaches its own lists
        for node in unsafe { LlistIter::new(list.del_all()) } {
            let work = unsafe { IrqWork::from_llnode(node) };
            work.execute();
            ran += 1;
        }
        tracing::trace!(ran, "irq_work: drained");
    }

    /// Drain the current CPU from hard interrupt context
    ///
    /// Call from the self-interrupt handler with local interrupts disabled.
    /// Under the real-time policy the lazy list is left to the soft tick
    /// pass, which is requested here if anything is waiting.
    ///
    /// Linux equivalent: `irq_work_run()`
    pub fn run(&self) {
        let Some(lists) = self.lists(self.platform.current_cpu()) else {
            return;
        };

        self.run_list(&lists.raised);
        if self.config.prefers_realtime() {
            if !lists.lazy.is_empty() {
                self.platform.raise_soft_tick();
            }
        } else {
            self.run_list(&lists.lazy);
        }
    }

    /// Periodic tick hook for the current CPU
    ///
    /// Picks up raised work only when the platform has no self-interrupt to
    /// deliver it.
    ///
    /// Linux equivalent: `irq_work_tick()`
    pub fn tick(&self) {
        let Some(lists) = self.lists(self.platform.current_cpu()) else {
            return;
        };

        if !lists.raised.is_empty() && !self.platform.has_self_interrupt() {
            self.run_list(&lists.raised);
        }
        if !self.config.prefers_realtime() {
            self.run_list(&lists.lazy);
        }
    }

    /// Soft tick pass: drain the lazy list of the current CPU
    ///
    /// Linux equivalent: `irq_work_tick_soft()`
    pub fn tick_soft(&self) {
        if let Some(lists) = self.lists(self.platform.current_cpu()) {
            self.run_list(&lists.lazy);
        }
    }

    /// Whether the current CPU still has work queued
    ///
    /// Consulted before stopping the tick. All work must be flushed before a
    /// CPU goes offline, so pending work on an offline CPU is reported once.
    ///
    /// Linux equivalent: `irq_work_needs_cpu()`
    pub fn needs_cpu(&self) -> bool {
        let cpu = self.platform.current_cpu();
        let Some(lists) = self.lists(cpu) else {
            return false;
        };

        if lists.raised.is_empty() && lists.lazy.is_empty() {
            return false;
        }

        warn_on_once!(
            self.platform.cpu_is_offline(cpu),
            cpu = cpu.0,
            "irq_work: work pending on an offline cpu"
        );
        true
    }

    /// Whether `cpu` has anything on the given list
    pub fn has_pending_on(&self, cpu: CpuId, kind: ListKind) -> bool {
        self.cpus
            .get(cpu.index())
            .is_some_and(|lists| !lists.get(kind).is_empty())
    }

    /// Hot-unplug hook: flush the outgoing CPU
    ///
    /// Must run on `cpu` itself, with interrupts disabled, once nothing else
    /// will be scheduled there. Both lists are drained regardless of
    /// platform or policy so no callback is stranded.
    ///
    /// Linux equivalent: the `CPU_DYING` notifier
    pub fn cpu_dying(&self, cpu: CpuId) -> KernelResult<()> {
        let current = self.platform.current_cpu();
        if warn_on_once!(
            cpu != current,
            dying = cpu.0,
            current = current.0,
            "irq_work: cpu_dying called off the outgoing cpu"
        ) {
            return Err(KernelError::EINVAL);
        }
        let lists = self.lists(cpu).ok_or(KernelError::ENXIO)?;

        tracing::debug!(cpu = cpu.0, "irq_work: flushing outgoing cpu");
        self.run_list(&lists.raised);
        self.run_list(&lists.lazy);
        Ok(())
    }

    /// Wait until the callback of `work` is neither queued nor running
    ///
    /// Spins, relaxing the CPU between polls. Does not stop a new queue()
    /// from racing with or following the return; ruling that out is on the
    /// caller. Calling with interrupts disabled can deadlock against this
    /// CPU's own drain and is reported once.
    ///
    /// Linux equivalent: `irq_work_sync(work)`
    pub fn sync(&self, work: &IrqWork) {
        warn_on_once!(
            self.platform.irqs_disabled(),
            "irq_work: sync with interrupts disabled"
        );

        while work.is_busy() {
            self.platform.cpu_relax();
        }
    }
}
