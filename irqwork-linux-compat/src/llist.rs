//! Linux-compatible lock-less list API adapter
//!
//! C entry points for the parts of `include/linux/llist.h` that irq work
//! users touch directly.

use core::ptr;

use crate::types::{llist_head, llist_node};

/// Initialise a list head to empty
///
/// Linux equivalent: `init_llist_head(list)`
///
/// # Safety
///
/// `list` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn init_llist_head(list: *mut llist_head) {
    if list.is_null() {
        return;
    }

    ptr::write(list, llist_head::new());
}

/// Add an entry, returning true if the list was empty
///
/// Linux equivalent: `llist_add(new, head)`
///
/// # Safety
///
/// - Both pointers must be null or valid
/// - `new` must not already be on a list
#[no_mangle]
pub unsafe extern "C" fn llist_add(new: *mut llist_node, head: *mut llist_head) -> bool {
    if new.is_null() || head.is_null() {
        return false;
    }

    (*head).add(new)
}

/// Detach all entries
///
/// Linux equivalent: `llist_del_all(head)`
///
/// # Safety
///
/// `head` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn llist_del_all(head: *mut llist_head) -> *mut llist_node {
    match head.as_ref() {
        Some(head) => head.del_all(),
        None => ptr::null_mut(),
    }
}

/// Test whether a list is empty
///
/// Linux equivalent: `llist_empty(head)`
///
/// # Safety
///
/// `head` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn llist_empty(head: *const llist_head) -> bool {
    head.as_ref().map_or(true, llist_head::is_empty)
}
