//! The process-wide irq work instance
//!
//! Installed once during early boot, before any producer can run, and never
//! torn down. The free functions here are what interrupt entry code, the tick
//! and CPU hot-plug call into.

use irqwork_core::{CpuId, NR_CPUS};
use irqwork_ffi::{KernelError, KernelResult};
use spin::Once;

use crate::arch::Platform;
use crate::config::Config;
use crate::diag::warn_on_once;
use crate::queues::IrqWorkQueues;
use crate::work::IrqWork;

/// Queue table type of the global instance
pub type GlobalQueues = IrqWorkQueues<&'static dyn Platform, NR_CPUS>;

static IRQ_WORK: Once<GlobalQueues> = Once::new();

/// Install the global instance
///
/// Fails with `EBUSY` if one is already installed.
pub fn init(platform: &'static dyn Platform, config: Config) -> KernelResult<()> {
    let mut installed = false;
    IRQ_WORK.call_once(|| {
        installed = true;
        IrqWorkQueues::new(platform, config)
    });

    if !installed {
        return Err(KernelError::EBUSY);
    }
    tracing::info!(policy = ?config.policy, nr_cpus = NR_CPUS, "irq_work: initialised");
    Ok(())
}

/// The installed instance, if any
pub fn get() -> Option<&'static GlobalQueues> {
    IRQ_WORK.get()
}

/// [`IrqWorkQueues::queue`] on the global instance
///
/// Returns false if nothing is installed yet.
///
/// # Safety
/// Same contract as [`IrqWorkQueues::queue`].
pub unsafe fn queue(work: &IrqWork) -> bool {
    match get() {
        Some(queues) => queues.queue(work),
        None => {
            warn_on_once!(true, "irq_work: queue before init");
            false
        }
    }
}

/// [`IrqWorkQueues::run`] on the global instance
pub fn run() {
    if let Some(queues) = get() {
        queues.run();
    }
}

/// [`IrqWorkQueues::tick`] on the global instance
pub fn tick() {
    if let Some(queues) = get() {
        queues.tick();
    }
}

/// [`IrqWorkQueues::tick_soft`] on the global instance
pub fn tick_soft() {
    if let Some(queues) = get() {
        queues.tick_soft();
    }
}

/// [`IrqWorkQueues::needs_cpu`] on the global instance
pub fn needs_cpu() -> bool {
    get().is_some_and(|queues| queues.needs_cpu())
}

/// [`IrqWorkQueues::sync`] on the global instance
///
/// Without an instance nothing can have claimed `work`, so this returns at
/// once.
pub fn sync(work: &IrqWork) {
    if let Some(queues) = get() {
        queues.sync(work);
    }
}

/// [`IrqWorkQueues::cpu_dying`] on the global instance
pub fn cpu_dying(cpu: CpuId) -> KernelResult<()> {
    get().ok_or(KernelError::ENODEV)?.cpu_dying(cpu)
}
