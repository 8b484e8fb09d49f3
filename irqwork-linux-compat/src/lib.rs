//! Linux Kernel ABI Compatibility Adapter
//!
//! This crate provides the boundary layer between the Rust irq work API and
//! the Linux kernel's C ABI. It translates between the two without
//! constraining the Rust design.
//!
//! # Architecture
//!
//! ```text
//! Linux C Code
//!      ↓
//! Linux Compat Layer (this crate) - Translation boundary
//!      ↓
//! irqwork (pure Rust)
//! ```
//!
//! # Usage
//!
//! C code can include Linux-compatible headers and use familiar APIs:
//!
//! ```c
//! #include <linux/irq_work.h>
//!
//! static struct irq_work my_work;
//! init_irq_work(&my_work, my_func);
//! irq_work_queue(&my_work);
//! ```
//!
//! Everything goes through the process-wide instance installed with
//! `irqwork::global::init`.

#![cfg_attr(not(test), no_std)]
#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]

pub mod error;
pub mod irq_work;
pub mod llist;
pub mod types;

// Re-export for convenience
pub use error::{errno_to_result, result_to_errno};
pub use types::*;
