//! Linux-compatible type definitions
//!
//! Provides Linux kernel names for the irq work types and constants.

use irqwork_core::IrqWorkFlags;
use irqwork_ffi::{c_int, c_ulong};

// Linux kernel type aliases
pub type irq_work = irqwork::IrqWork;
pub type llist_head = irqwork_llist::LlistHead;
pub type llist_node = irqwork_llist::LlistNode;

// include/linux/irq_work.h
pub const IRQ_WORK_PENDING: c_ulong = IrqWorkFlags::PENDING.bits() as c_ulong;
pub const IRQ_WORK_BUSY: c_ulong = IrqWorkFlags::BUSY.bits() as c_ulong;
pub const IRQ_WORK_FLAGS: c_ulong = IrqWorkFlags::CLAIMED.bits() as c_ulong;
pub const IRQ_WORK_LAZY: c_ulong = IrqWorkFlags::LAZY.bits() as c_ulong;
pub const IRQ_WORK_HARD_IRQ: c_ulong = IrqWorkFlags::HARD_IRQ.bits() as c_ulong;

// include/linux/notifier.h
pub const NOTIFY_DONE: c_int = 0x0000;
pub const NOTIFY_OK: c_int = 0x0001;

// include/linux/cpu.h
pub const CPU_ONLINE: c_ulong = 0x0002;
pub const CPU_DEAD: c_ulong = 0x0007;
pub const CPU_DYING: c_ulong = 0x0008;
