//! Reset and teardown hook bus (component J).
//!
//! Subsystems that need to reinitialise state on a CPU reset, or release
//! resources at simulator teardown, register a callback here instead of the
//! simulator special-casing each one. Generic over the host type a hook
//! mutates, the same way [`crate::core::units::scheduler::Scheduler`] is, so
//! this module has no dependency on [`crate::sim::simulator::Simulator`].
//!
//! Initialisation order is leaves-first (§9); hooks run in registration
//! order on reset and in reverse registration order on teardown, so a
//! subsystem registered after one it depends on tears down first.
pub struct ResetBus<T> {
    hooks: Vec<Box<dyn FnMut(&mut T)>>,
}

impl<T> Default for ResetBus<T> {
    fn default() -> Self {
        Self { hooks: Vec::new() }
    }
}

impl<T> ResetBus<T> {
    /// Builds an empty hook registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook, run on every future reset/teardown.
    pub fn register(&mut self, hook: impl FnMut(&mut T) + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Runs every hook in registration order.
    pub fn run_reset(&mut self, target: &mut T) {
        for hook in &mut self.hooks {
            hook(target);
        }
    }

    /// Runs every hook in reverse registration order.
    pub fn run_teardown(&mut self, target: &mut T) {
        for hook in self.hooks.iter_mut().rev() {
            hook(target);
        }
    }
}
