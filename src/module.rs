//! # Module
//!
//! The pluggable tracing engine attached to a registry. Exactly one module
//! is current at any instant; before a tracer attaches (and after it
//! detaches) the slot holds a built-in no-op module, so dispatch is always
//! well defined.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::probe::{dispatch::FireArgs, Probe};

/// Result of firing a probe.
///
/// The core never interprets codes other than [`ActionCode::Continue`]; it
/// only propagates them back to the call site, which decides what to do
/// with them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionCode {
    /// Proceed with the default behavior.
    Continue,
    /// The call site should abort the traced operation.
    Abort,
    /// Module-defined code, opaque to the core.
    Other(u32),
}

/// Capability implemented by a tracing engine.
///
/// `fire` runs with the registry lock held: implementations must run to
/// completion quickly and must not block or sleep, as every other fire in
/// the process waits on the same lock meanwhile.
pub trait Module: Send + Sync {
    /// Handle an active probe firing with its fixed argument block.
    fn fire(&self, probe: &Probe, args: &FireArgs) -> ActionCode;
}

/// Always-present fallback: fires are side-effect free and answer
/// `Continue`.
struct DummyModule;

impl Module for DummyModule {
    fn fire(&self, _probe: &Probe, _args: &FireArgs) -> ActionCode {
        ActionCode::Continue
    }
}

/// Process-wide slot holding the current module.
///
/// The slot is a single `ArcSwap`: installs and removals are one
/// pointer-sized swap and can never expose a torn value. Loads hand out an
/// `Arc` clone, so an outgoing module stays alive until the last `fire()`
/// using it returns.
pub(crate) struct ModuleSlot {
    current: ArcSwap<Box<dyn Module>>,
    dummy: Arc<Box<dyn Module>>,
}

impl ModuleSlot {
    pub(crate) fn new() -> ModuleSlot {
        let dummy: Arc<Box<dyn Module>> = Arc::new(Box::new(DummyModule));

        ModuleSlot {
            current: ArcSwap::from(Arc::clone(&dummy)),
            dummy,
        }
    }

    /// Install a module. Not serialized against concurrent loads: an
    /// in-flight fire may observe either the dummy or the new module.
    ///
    /// # Panics
    ///
    /// Panics if a module is already installed.
    pub(crate) fn install(&self, module: Box<dyn Module>) {
        let prev = self.current.swap(Arc::new(module));
        if !Arc::ptr_eq(&prev, &self.dummy) {
            panic!("A tracing module is already registered");
        }
    }

    /// Swap the dummy module back in. Callers serialize this against
    /// dispatch by holding the registry lock.
    ///
    /// # Panics
    ///
    /// Panics if no module is installed.
    pub(crate) fn clear(&self) {
        let prev = self.current.swap(Arc::clone(&self.dummy));
        if Arc::ptr_eq(&prev, &self.dummy) {
            panic!("No tracing module is registered");
        }
    }

    /// Current module, kept alive for as long as the returned handle is.
    pub(crate) fn load(&self) -> Arc<Box<dyn Module>> {
        self.current.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestModule;

    impl Module for TestModule {
        fn fire(&self, _probe: &Probe, _args: &FireArgs) -> ActionCode {
            ActionCode::Abort
        }
    }

    #[test]
    fn dummy_by_default() {
        let slot = ModuleSlot::new();
        let probe = Probe::new("noop", 1);

        assert_eq!(
            slot.load().fire(&probe, &[0; crate::FIRE_ARGC]),
            ActionCode::Continue
        );
    }

    #[test]
    fn install_and_clear() {
        let slot = ModuleSlot::new();
        let probe = Probe::new("noop", 1);

        slot.install(Box::new(TestModule));
        assert_eq!(
            slot.load().fire(&probe, &[0; crate::FIRE_ARGC]),
            ActionCode::Abort
        );

        slot.clear();
        assert_eq!(
            slot.load().fire(&probe, &[0; crate::FIRE_ARGC]),
            ActionCode::Continue
        );
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn double_install() {
        let slot = ModuleSlot::new();

        slot.install(Box::new(TestModule));
        slot.install(Box::new(TestModule));
    }

    #[test]
    #[should_panic(expected = "No tracing module")]
    fn clear_without_install() {
        let slot = ModuleSlot::new();
        slot.clear();
    }
}
