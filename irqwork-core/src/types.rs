//! Core types

use bitflags::bitflags;
use static_assertions::const_assert;

/// Upper bound on logical CPUs tracked by a per-CPU table
pub const NR_CPUS: usize = 64;

const_assert!(NR_CPUS > 0);
const_assert!(NR_CPUS <= u32::MAX as usize);

/// Logical processor index
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CpuId(pub u32);

impl CpuId {
    /// The boot CPU
    pub const BOOT: Self = CpuId(0);

    /// Index into a per-CPU table
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Indices that do not fit a `u32` saturate, which no per-CPU table covers
impl From<usize> for CpuId {
    fn from(index: usize) -> Self {
        CpuId(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

bitflags! {
    /// Status word of an irq work item
    ///
    /// `PENDING` and `BUSY` are owned by the claim/drain protocol. `LAZY`
    /// and `HARD_IRQ` are mode bits fixed at initialisation and carried
    /// through every claim.
    #[repr(transparent)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct IrqWorkFlags: usize {
        /// Enqueued and not yet drained
        const PENDING = 1 << 0;
        /// Claimed; cleared once the callback has returned
        const BUSY = 1 << 1;
        /// Prefer delivery from the next tick
        const LAZY = 1 << 2;
        /// Must run from hard interrupt context even on real-time builds
        const HARD_IRQ = 1 << 3;

        /// Bits set by a successful claim
        const CLAIMED = Self::PENDING.bits() | Self::BUSY.bits();
    }
}

impl IrqWorkFlags {
    /// Mode bits only, with the protocol state stripped
    pub const fn mode(self) -> Self {
        self.difference(Self::CLAIMED)
    }
}
