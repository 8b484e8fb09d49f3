//! ABI Compatibility Testing for irq work
//!
//! Verifies that the Rust structures embedded by C callers have the same
//! binary layout as the Linux kernel structures they stand in for:
//!
//! ```c
//! struct llist_node { struct llist_node *next; };
//! struct llist_head { struct llist_node *first; };
//! struct irq_work {
//!     unsigned long flags;
//!     struct llist_node llnode;
//!     void (*func)(struct irq_work *);
//! };
//! ```

#![allow(dead_code)]

use core::mem::{align_of, size_of};

/// Macro to verify structure size matches expected value
#[macro_export]
macro_rules! verify_size {
    ($rust_type:ty, $expected_size:expr) => {
        const _: () = {
            const SIZE: usize = ::core::mem::size_of::<$rust_type>();
            const EXPECTED: usize = $expected_size;

            // This will fail at compile time if sizes don't match
            assert!(SIZE == EXPECTED, "Size mismatch");
        };
    };
}

/// Macro to verify a field offset reported by the Rust type
#[macro_export]
macro_rules! verify_offset {
    ($offset:expr, $expected_offset:expr) => {
        const _: () = {
            const OFFSET: usize = $offset;
            const EXPECTED: usize = $expected_offset;

            assert!(OFFSET == EXPECTED, "Offset mismatch");
        };
    };
}

/// Macro to verify type alignment
#[macro_export]
macro_rules! verify_align {
    ($type:ty, $expected_align:expr) => {
        const _: () = {
            const ALIGN: usize = ::core::mem::align_of::<$type>();
            const EXPECTED: usize = $expected_align;

            assert!(ALIGN == EXPECTED, "Alignment mismatch");
        };
    };
}

/// Expected C layout of one structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CLayout {
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
}

const WORD: usize = size_of::<usize>();

/// `struct llist_node`
pub const LLIST_NODE: CLayout = CLayout {
    name: "llist_node",
    size: WORD,
    align: WORD,
};

/// `struct llist_head`
pub const LLIST_HEAD: CLayout = CLayout {
    name: "llist_head",
    size: WORD,
    align: WORD,
};

/// `struct irq_work`: flags, llnode, func
pub const IRQ_WORK: CLayout = CLayout {
    name: "irq_work",
    size: 3 * WORD,
    align: WORD,
};

/// Structure to hold ABI compatibility test results
#[derive(Debug, PartialEq, Eq)]
pub struct AbiCompatResult {
    pub struct_name: &'static str,
    pub size_match: bool,
    pub align_match: bool,
}

impl AbiCompatResult {
    pub fn is_compatible(&self) -> bool {
        self.size_match && self.align_match
    }
}

/// Compare a Rust type against its expected C layout
pub fn verify_struct_layout<T>(expected: &CLayout) -> AbiCompatResult {
    AbiCompatResult {
        struct_name: expected.name,
        size_match: size_of::<T>() == expected.size,
        align_match: align_of::<T>() == expected.align,
    }
}
