//! The irq work item and its claim protocol
//!
//! An [`IrqWork`] is embedded in whatever structure owns the deferred
//! operation. The status word moves through these states:
//!
//! ```text
//!   idle ──claim──▶ PENDING|BUSY ──drain──▶ BUSY ──callback returns──▶ idle
//!                        ▲                   │
//!                        └───── re-claim ────┘   (callback or anyone else)
//! ```
//!
//! A claim fails only when PENDING is already set, which makes redundant
//! submissions no-ops. Once the drain has cleared PENDING the item may be
//! claimed again, including from its own callback; the drain then leaves
//! BUSY alone so it stays set until the new cycle completes.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use irqwork_core::IrqWorkFlags;
use irqwork_llist::{container_of, LlistNode};
use memoffset::offset_of;
use static_assertions::{assert_eq_size, assert_impl_all};

/// Callback run from interrupt context
///
/// Receives the item itself; use [`container_of!`] to reach the enclosing
/// structure.
pub type IrqWorkFn = extern "C" fn(work: &IrqWork);

/// One deferred callback
///
/// Layout matches the C `struct irq_work`.
#[repr(C)]
pub struct IrqWork {
    flags: AtomicUsize,
    llnode: LlistNode,
    func: IrqWorkFn,
}

// Queued from one context, drained and synced from others
assert_impl_all!(IrqWork: Send, Sync);
assert_eq_size!(IrqWork, [usize; 3]);

impl IrqWork {
    /// Byte offset of `flags`, which C reads as `unsigned long`
    pub const FLAGS_OFFSET: usize = offset_of!(IrqWork, flags);
    /// Byte offset of the list link
    pub const LLNODE_OFFSET: usize = offset_of!(IrqWork, llnode);
    /// Byte offset of the callback pointer
    pub const FUNC_OFFSET: usize = offset_of!(IrqWork, func);

    /// Work delivered as soon as possible
    pub const fn new(func: IrqWorkFn) -> Self {
        Self::with_mode(func, IrqWorkFlags::empty())
    }

    /// Work delivered from the next tick unless the tick is stopped
    pub const fn new_lazy(func: IrqWorkFn) -> Self {
        Self::with_mode(func, IrqWorkFlags::LAZY)
    }

    /// Work that must run from hard interrupt context on every policy
    pub const fn new_hard_irq(func: IrqWorkFn) -> Self {
        Self::with_mode(func, IrqWorkFlags::HARD_IRQ)
    }

    const fn with_mode(func: IrqWorkFn, mode: IrqWorkFlags) -> Self {
        Self {
            flags: AtomicUsize::new(mode.mode().bits()),
            llnode: LlistNode::new(),
            func,
        }
    }

    /// Reset to an idle, non-lazy item running `func`
    ///
    /// Linux equivalent: `init_irq_work(work, func)`
    pub fn init(&mut self, func: IrqWorkFn) {
        *self = Self::new(func);
    }

    /// Snapshot of the status word
    pub fn flags(&self) -> IrqWorkFlags {
        IrqWorkFlags::from_bits_retain(self.flags.load(Ordering::Acquire))
    }

    /// Queued and not yet picked up by a drain
    pub fn is_pending(&self) -> bool {
        self.flags().contains(IrqWorkFlags::PENDING)
    }

    /// Claimed and the callback has not returned yet
    pub fn is_busy(&self) -> bool {
        self.flags().contains(IrqWorkFlags::BUSY)
    }

    /// Take ownership of the item for one delivery cycle
    ///
    /// Only an observed PENDING is final. Any other change to the word
    /// (the drain clearing BUSY, say) just means retrying with the fresh
    /// value.
    pub(crate) fn claim(&self) -> bool {
        let mut flags = self.flags.load(Ordering::Relaxed) & !IrqWorkFlags::PENDING.bits();
        loop {
            let claimed = flags | IrqWorkFlags::CLAIMED.bits();
            match self
                .flags
                .compare_exchange(flags, claimed, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return true,
                Err(seen) if seen & IrqWorkFlags::PENDING.bits() != 0 => return false,
                Err(seen) => {
                    flags = seen;
                    core::hint::spin_loop();
                }
            }
        }
    }

    pub(crate) fn llnode_ptr(&self) -> *mut LlistNode {
        &self.llnode as *const LlistNode as *mut LlistNode
    }

    /// Recover the item from its list link
    ///
    /// # Safety
    /// `node` must be the `llnode` of a live `IrqWork` that outlives `'a`.
    pub(crate) unsafe fn from_llnode<'a>(node: *mut LlistNode) -> &'a IrqWork {
        &*container_of!(node, IrqWork, llnode)
    }

    /// Run one delivery cycle of an item detached from its list
    pub(crate) fn execute(&self) {
        // From here on the item may be claimed again
        let flags = self.flags.load(Ordering::Relaxed) & !IrqWorkFlags::PENDING.bits();
        self.flags.swap(flags, Ordering::SeqCst);

        (self.func)(self);

        // Idle again unless someone re-claimed it meanwhile
        let _ = self.flags.compare_exchange(
            flags,
            flags & !IrqWorkFlags::BUSY.bits(),
            Ordering::SeqCst,
            Ordering::Relaxed,
        );
    }
}

impl fmt::Debug for IrqWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqWork")
            .field("flags", &self.flags())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;

    extern "C" fn nop(_work: &IrqWork) {}

    #[test]
    fn test_new_is_idle() {
        let work = IrqWork::new(nop);
        assert_eq!(work.flags(), IrqWorkFlags::empty());
        assert!(!work.is_pending());
        assert!(!work.is_busy());
    }

    #[test]
    fn test_mode_bits() {
        assert_eq!(IrqWork::new_lazy(nop).flags(), IrqWorkFlags::LAZY);
        assert_eq!(IrqWork::new_hard_irq(nop).flags(), IrqWorkFlags::HARD_IRQ);
    }

    #[test]
    fn test_claim_sets_pending_and_busy() {
        let work = IrqWork::new_lazy(nop);
        assert!(work.claim());
        assert_eq!(
            work.flags(),
            IrqWorkFlags::PENDING | IrqWorkFlags::BUSY | IrqWorkFlags::LAZY
        );
    }

    #[test]
    fn test_claim_fails_while_pending() {
        let work = IrqWork::new(nop);
        assert!(work.claim());
        assert!(!work.claim());
        assert_eq!(work.flags(), IrqWorkFlags::CLAIMED);
    }

    #[test]
    fn test_claim_succeeds_while_only_busy() {
        let work = IrqWork::new(nop);
        work.flags.store(IrqWorkFlags::BUSY.bits(), Ordering::Relaxed);
        assert!(work.claim());
        assert_eq!(work.flags(), IrqWorkFlags::CLAIMED);
    }

    #[test]
    fn test_execute_returns_to_idle() {
        let work = IrqWork::new_lazy(nop);
        assert!(work.claim());
        work.execute();
        assert_eq!(work.flags(), IrqWorkFlags::LAZY);
    }

    extern "C" fn reclaim_self(work: &IrqWork) {
        assert!(!work.is_pending());
        assert!(work.is_busy());
        assert!(work.claim());
    }

    #[test]
    fn test_execute_leaves_busy_when_reclaimed() {
        let work = IrqWork::new(reclaim_self);
        assert!(work.claim());
        work.execute();
        // The new cycle owns BUSY now
        assert_eq!(work.flags(), IrqWorkFlags::CLAIMED);
    }

    #[test]
    fn test_init_resets() {
        let mut work = IrqWork::new_lazy(nop);
        assert!(work.claim());
        work.init(nop);
        assert_eq!(work.flags(), IrqWorkFlags::empty());
    }

    #[test]
    fn test_from_llnode() {
        let work = IrqWork::new(nop);
        let back = unsafe { IrqWork::from_llnode(work.llnode_ptr()) };
        assert!(core::ptr::eq(back, &work));
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        const THREADS: usize = 8;

        for _ in 0..50 {
            let work = Arc::new(IrqWork::new(nop));
            let start = Arc::new(AtomicBool::new(false));
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let work = Arc::clone(&work);
                    let start = Arc::clone(&start);
                    thread::spawn(move || {
                        while !start.load(Ordering::Acquire) {
                            core::hint::spin_loop();
                        }
                        work.claim()
                    })
                })
                .collect();
            start.store(true, Ordering::Release);
            let winners = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|&won| won)
                .count();
            assert_eq!(winners, 1);
        }
    }
}
