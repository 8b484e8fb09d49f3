//! Core types for the deferred interrupt work subsystem
//!
//! This crate provides the fundamental types shared by the work queues,
//! the Linux compatibility layer and the test harness.

#![cfg_attr(not(test), no_std)]

pub mod types;

pub use types::*;
