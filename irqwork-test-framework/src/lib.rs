//! Test framework for the irq work crates
//!
//! This crate provides testing infrastructure for validating irq work
//! delivery end to end on a simulated machine. Unlike the kernel crates, this
//! runs in userspace and can use std.

pub mod helpers;

pub use helpers::{leak_queues, leak_queues_without_self_interrupt, Probe, RunLog, SimQueues, SIM_CPUS};
