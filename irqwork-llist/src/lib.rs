//! Lock-less NULL terminated singly linked list
//!
//! This is the Rust equivalent of the Linux kernel's `struct llist_head` /
//! `struct llist_node`. Any number of producers may add entries concurrently,
//! from any context including NMI, without locks. A single consumer removes
//! everything at once with [`LlistHead::del_all`] and then walks the detached
//! chain at leisure.
//!
//! The list is intrusive: a [`LlistNode`] lives inside the item it links, and
//! the list never owns what it points at. Use [`container_of!`] to get from a
//! node back to its enclosing item.
//!
//! Entries come out of a detached chain most-recently-added first.

#![cfg_attr(not(test), no_std)]

use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use static_assertions::assert_eq_size;

#[doc(hidden)]
pub use memoffset;

/// Intrusive list link
#[repr(C)]
#[derive(Debug)]
pub struct LlistNode {
    next: AtomicPtr<LlistNode>,
}

/// Head of a lock-less list
#[repr(C)]
#[derive(Debug)]
pub struct LlistHead {
    first: AtomicPtr<LlistNode>,
}

assert_eq_size!(LlistNode, usize);
assert_eq_size!(LlistHead, usize);

impl LlistNode {
    /// Create an unlinked node
    pub const fn new() -> Self {
        Self {
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Successor in a detached chain
    pub fn next(&self) -> *mut LlistNode {
        self.next.load(Ordering::Relaxed)
    }

    /// Overwrite the successor
    ///
    /// Only meaningful while the node is not reachable from a head.
    pub fn set_next(&self, next: *mut LlistNode) {
        self.next.store(next, Ordering::Relaxed);
    }
}

impl Default for LlistNode {
    fn default() -> Self {
        Self::new()
    }
}

impl LlistHead {
    /// Create an empty list
    pub const fn new() -> Self {
        Self {
            first: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Check if list is empty
    ///
    /// Racy by nature when producers are active: the answer may be stale by
    /// the time the caller looks at it.
    pub fn is_empty(&self) -> bool {
        self.first.load(Ordering::Relaxed).is_null()
    }

    /// Add one entry
    ///
    /// Returns true if the list was empty before the add.
    ///
    /// # Safety
    /// `new` must be valid, must not currently be on any list, and must stay
    /// valid until a consumer has detached it with `del_all`.
    pub unsafe fn add(&self, new: *mut LlistNode) -> bool {
        self.add_batch(new, new)
    }

    /// Add a pre-linked chain `new_first ..= new_last`
    ///
    /// Returns true if the list was empty before the add.
    ///
    /// # Safety
    /// Both pointers must be valid, `new_last` must be reachable from
    /// `new_first` through `next`, and no node of the chain may be on a list.
    pub unsafe fn add_batch(&self, new_first: *mut LlistNode, new_last: *mut LlistNode) -> bool {
        let mut first = self.first.load(Ordering::Relaxed);
        loop {
            (*new_last).next.store(first, Ordering::Relaxed);
            match self.first.compare_exchange_weak(
                first,
                new_first,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => return first.is_null(),
                Err(seen) => {
                    first = seen;
                    core::hint::spin_loop();
                }
            }
        }
    }

    /// Detach every entry
    ///
    /// Returns the first node of the detached chain, or null. Adds that race
    /// with this call start a fresh list; the returned chain belongs to the
    /// caller alone.
    pub fn del_all(&self) -> *mut LlistNode {
        self.first.swap(ptr::null_mut(), Ordering::Acquire)
    }
}

impl Default for LlistHead {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a detached chain
///
/// The successor is read before a node is handed out, so the consumer may
/// put the yielded node back on a list without derailing the walk.
pub struct LlistIter {
    cur: *mut LlistNode,
}

impl LlistIter {
    /// Walk the chain starting at `first`
    ///
    /// # Safety
    /// `first` must be null or the head of a chain obtained from `del_all`,
    /// and every node on it must stay valid until yielded.
    pub unsafe fn new(first: *mut LlistNode) -> Self {
        Self { cur: first }
    }
}

impl Iterator for LlistIter {
    type Item = *mut LlistNode;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur.is_null() {
            return None;
        }
        let node = self.cur;
        // SAFETY: guaranteed valid by the contract of LlistIter::new
        self.cur = unsafe { (*node).next() };
        Some(node)
    }
}

/// Get the enclosing structure of an embedded field
///
/// Linux equivalent: `container_of(ptr, type, member)` / `llist_entry`
///
/// Must be used inside `unsafe`: the caller asserts that `$ptr` really points
/// at the `$field` of a live `$type`.
#[macro_export]
macro_rules! container_of {
    ($ptr:expr, $type:path, $field:tt) => {
        ($ptr as *const _ as *const u8)
            .sub($crate::memoffset::offset_of!($type, $field))
            .cast::<$type>()
    };
}
