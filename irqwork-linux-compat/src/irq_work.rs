//! Linux-compatible irq work API adapter
//!
//! C entry points for `include/linux/irq_work.h`, all routed through the
//! process-wide instance.

use core::ptr;

use irqwork::{global, CpuId, IrqWork, IrqWorkFn};
use irqwork_ffi::{c_int, c_long, c_ulong};

use crate::types::{CPU_DYING, NOTIFY_OK};

/// Initialise an irq work item
///
/// Linux equivalent: `init_irq_work(work, func)`
///
/// # Safety
///
/// `work` must be null or valid for writes and not currently queued.
#[no_mangle]
pub unsafe extern "C" fn init_irq_work(work: *mut IrqWork, func: IrqWorkFn) {
    if work.is_null() {
        return;
    }

    ptr::write(work, IrqWork::new(func));
}

/// Enqueue on the current CPU unless already pending
///
/// Linux equivalent: `irq_work_queue(work)`
///
/// # Safety
///
/// `work` must be null or point to an initialised item that stays put until
/// `irq_work_sync` reports it idle.
#[no_mangle]
pub unsafe extern "C" fn irq_work_queue(work: *mut IrqWork) -> bool {
    match work.as_ref() {
        Some(work) => global::queue(work),
        None => false,
    }
}

/// Drain the current CPU from the self-interrupt handler
///
/// Linux equivalent: `irq_work_run()`
#[no_mangle]
pub extern "C" fn irq_work_run() {
    global::run();
}

/// Periodic tick hook
///
/// Linux equivalent: `irq_work_tick()`
#[no_mangle]
pub extern "C" fn irq_work_tick() {
    global::tick();
}

/// Soft tick pass for real-time builds
///
/// Linux equivalent: `irq_work_tick_soft()`
#[no_mangle]
pub extern "C" fn irq_work_tick_soft() {
    global::tick_soft();
}

/// Whether the current CPU still has work queued
///
/// Linux equivalent: `irq_work_needs_cpu()`
#[no_mangle]
pub extern "C" fn irq_work_needs_cpu() -> bool {
    global::needs_cpu()
}

/// Wait until `work` is idle
///
/// Linux equivalent: `irq_work_sync(work)`
///
/// # Safety
///
/// `work` must be null or point to an initialised item.
#[no_mangle]
pub unsafe extern "C" fn irq_work_sync(work: *mut IrqWork) {
    if let Some(work) = work.as_ref() {
        global::sync(work);
    }
}

/// Queued and not yet drained
///
/// # Safety
///
/// `work` must be null or point to an initialised item.
#[no_mangle]
pub unsafe extern "C" fn irq_work_is_pending(work: *const IrqWork) -> bool {
    work.as_ref().is_some_and(IrqWork::is_pending)
}

/// Claimed and the callback has not returned
///
/// # Safety
///
/// `work` must be null or point to an initialised item.
#[no_mangle]
pub unsafe extern "C" fn irq_work_is_busy(work: *const IrqWork) -> bool {
    work.as_ref().is_some_and(IrqWork::is_busy)
}

/// CPU hot-plug notifier
///
/// Flushes the outgoing CPU on `CPU_DYING`; every other action is ignored.
/// Always answers `NOTIFY_OK`, as a failed flush must not veto the unplug.
#[no_mangle]
pub extern "C" fn irq_work_cpu_notify(action: c_ulong, cpu: c_long) -> c_int {
    if action != CPU_DYING {
        return NOTIFY_OK;
    }
    // A CPU number that does not fit must not alias a real one
    let Ok(cpu) = u32::try_from(cpu) else {
        return NOTIFY_OK;
    };
    // Failures are already reported by the core
    let _ = global::cpu_dying(CpuId(cpu));
    NOTIFY_OK
}
