//! Platform hooks consumed by the irq work core
//!
//! Linux spreads these over weak symbols and per-arch headers
//! (`arch_irq_work_raise`, `arch_irq_work_has_interrupt`,
//! `tick_nohz_tick_stopped`, ...). Here they form one capability trait that
//! the host supplies. Every hook except the interrupt state has a default
//! matching a uniprocessor architecture without a self-IPI, where delivery
//! falls back to the periodic tick.

use irqwork_core::CpuId;

/// Services the irq work core needs from its environment
pub trait Platform: Sync {
    /// Logical index of the CPU executing the caller
    fn current_cpu(&self) -> CpuId {
        CpuId::BOOT
    }

    /// Pin the caller to its current CPU
    fn preempt_disable(&self) {}

    /// Undo one `preempt_disable`
    fn preempt_enable(&self) {}

    /// Send an interrupt to the current CPU that ends up in the immediate
    /// drain path
    ///
    /// Linux equivalent: `arch_irq_work_raise()`
    fn raise_self_interrupt(&self) {}

    /// Whether `raise_self_interrupt` actually delivers an interrupt
    ///
    /// Linux equivalent: `arch_irq_work_has_interrupt()`
    fn has_self_interrupt(&self) -> bool {
        false
    }

    /// Whether the periodic tick is stopped on the current CPU
    ///
    /// Linux equivalent: `tick_nohz_tick_stopped()`
    fn tick_stopped(&self) -> bool {
        false
    }

    /// Whether `cpu` has been taken out of service
    fn cpu_is_offline(&self, _cpu: CpuId) -> bool {
        false
    }

    /// Whether local interrupts are disabled on the current CPU
    fn irqs_disabled(&self) -> bool;

    /// Schedule the soft pass that drains the lazy list on real-time builds
    ///
    /// Linux equivalent: `raise_softirq(TIMER_SOFTIRQ)`
    fn raise_soft_tick(&self) {}

    /// Back off inside a busy-wait loop
    fn cpu_relax(&self) {
        core::hint::spin_loop();
    }
}

impl<P: Platform + ?Sized> Platform for &P {
    fn current_cpu(&self) -> CpuId {
        (**self).current_cpu()
    }

    fn preempt_disable(&self) {
        (**self).preempt_disable()
    }

    fn preempt_enable(&self) {
        (**self).preempt_enable()
    }

    fn raise_self_interrupt(&self) {
        (**self).raise_self_interrupt()
    }

    fn has_self_interrupt(&self) -> bool {
        (**self).has_self_interrupt()
    }

    fn tick_stopped(&self) -> bool {
        (**self).tick_stopped()
    }

    fn cpu_is_offline(&self, cpu: CpuId) -> bool {
        (**self).cpu_is_offline(cpu)
    }

    fn irqs_disabled(&self) -> bool {
        (**self).irqs_disabled()
    }

    fn raise_soft_tick(&self) {
        (**self).raise_soft_tick()
    }

    fn cpu_relax(&self) {
        (**self).cpu_relax()
    }
}

/// Uniprocessor platform with no hooks at all
///
/// Everything runs on the boot CPU, there is no self-interrupt, and callers
/// are assumed to drain from interrupt context.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullPlatform;

impl Platform for NullPlatform {
    fn irqs_disabled(&self) -> bool {
        true
    }
}

/// RAII guard for a preemption-disabled region
pub struct PreemptGuard<'a, P: Platform + ?Sized> {
    platform: &'a P,
}

impl<'a, P: Platform + ?Sized> PreemptGuard<'a, P> {
    /// Disable preemption until the guard is dropped
    pub fn new(platform: &'a P) -> Self {
        platform.preempt_disable();
        Self { platform }
    }
}

impl<'a, P: Platform + ?Sized> Drop for PreemptGuard<'a, P> {
    fn drop(&mut self) {
        self.platform.preempt_enable();
    }
}
