//! # Dispatch
//!
//! The firing hot path invoked by instrumented call sites. Dispatch is
//! two-phase: sites first gate on the unsynchronized
//! [`Probe::maybe_active`] read, skipping inactive probes with zero lock
//! overhead, then call [`Registry::fire`] for the authoritative, locked
//! re-check and module invocation. The fast gate is allowed to be stale;
//! collapsing both phases into one locked operation would defeat it.

use std::sync::atomic::Ordering;

use crate::{
    module::ActionCode,
    probe::{registry::Registry, Probe},
};

/// Number of word-sized arguments carried by every fire, regardless of the
/// probe's true arity. Call sites zero-fill unused slots, which keeps the
/// dispatch interface uniform.
pub const FIRE_ARGC: usize = 6;

/// Fixed argument block handed to the module on each fire.
pub type FireArgs = [usize; FIRE_ARGC];

impl Registry {
    /// Fire a probe: the authoritative half of the two-phase dispatch.
    ///
    /// Takes the registry lock, re-reads the probe's active flag under it
    /// and, when set, invokes the current module's callback with the lock
    /// still held, returning its code. An inactive probe answers
    /// [`ActionCode::Continue`] without touching the module.
    ///
    /// Every fire in the process serializes on the one registry lock,
    /// whichever probe it targets. That makes module removal trivially
    /// safe (`module_deregister()` takes the same lock), at the price of a
    /// global dispatch bottleneck.
    pub fn fire(&self, probe: &Probe, args: FireArgs) -> ActionCode {
        let _inner = self.inner.write().unwrap();

        if !probe.active.load(Ordering::Relaxed) {
            return ActionCode::Continue;
        }

        // The module loaded here is exactly the one current at lock
        // acquisition; the handle keeps it alive even if it is swapped out
        // while the callback runs.
        let module = self.module.load();
        module.fire(probe, &args)
    }

    /// Fire a syscall-numbered probe with its raw argument block.
    ///
    /// Thin adapter over [`Registry::fire`], packing the block's pointer
    /// and length into the first two slots.
    pub fn fire_syscall(&self, probe: &Probe, data: &[u8]) -> ActionCode {
        let mut args: FireArgs = [0; FIRE_ARGC];
        args[0] = data.as_ptr() as usize;
        args[1] = data.len();

        self.fire(probe, args)
    }
}
