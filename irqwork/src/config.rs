//! Delivery policy
//!
//! The compile-time default comes from the `preempt-rt` feature, mirroring
//! `CONFIG_PREEMPT_RT_FULL`. A [`Config`] handed to
//! [`IrqWorkQueues::new`](crate::IrqWorkQueues::new) overrides it for that
//! instance.

/// Which context drains work that did not ask for hard interrupt context
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Raised work drains from the self-interrupt, lazy work from the tick
    Immediate,
    /// Only `HARD_IRQ` work drains from hard interrupt context; everything
    /// else goes to the lazy list and drains from the soft tick pass
    PreferRealtime,
}

impl Policy {
    /// Policy selected by the crate features
    pub const DEFAULT: Self = if cfg!(feature = "preempt-rt") {
        Policy::PreferRealtime
    } else {
        Policy::Immediate
    };
}

impl Default for Policy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-instance configuration
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    pub policy: Policy,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            policy: Policy::DEFAULT,
        }
    }

    pub const fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn prefers_realtime(&self) -> bool {
        matches!(self.policy, Policy::PreferRealtime)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
