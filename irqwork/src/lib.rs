//! Deferred callbacks run from hard interrupt context
//!
//! This crate provides a Rust implementation of the kernel's irq work
//! framework: any context, NMI included, can ask for a callback to run
//! shortly afterwards in interrupt context on the current CPU, without taking
//! a lock or allocating.
//!
//! # Architecture
//!
//! ```text
//! producer (any context)          owning CPU
//!   queue(work)                     self-interrupt ──▶ run()
//!     claim ─▶ push ─▶ raise ──▶    periodic tick  ──▶ tick()
//!                                   soft tick      ──▶ tick_soft()
//!                                   going offline  ──▶ cpu_dying()
//! ```
//!
//! - [`IrqWork`]: the caller-owned item and its claim protocol
//! - [`IrqWorkQueues`]: per-CPU raised and lazy lists plus the drain paths
//! - [`Platform`]: hooks the host supplies (current CPU, self-interrupt, tick)
//! - [`global`]: the process-wide instance used by interrupt entry code
//!
//! Items are never owned by a queue. Whoever embeds an `IrqWork` must keep it
//! in place until [`IrqWorkQueues::sync`] says it is idle.

#![cfg_attr(not(any(test, feature = "test-utils")), no_std)]

mod diag;

pub mod arch;
pub mod config;
pub mod global;
pub mod queues;
pub mod work;

#[cfg(any(test, feature = "test-utils"))]
pub mod sim;

pub use arch::{NullPlatform, Platform, PreemptGuard};
pub use config::{Config, Policy};
pub use queues::{IrqWorkQueues, ListKind};
pub use work::{IrqWork, IrqWorkFn};

pub use irqwork_core::{CpuId, IrqWorkFlags, NR_CPUS};
pub use irqwork_ffi::{KernelError, KernelResult};
pub use irqwork_llist::container_of;
