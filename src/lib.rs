//! # Tracefire
//!
//! Dynamic tracing-probe registry and dispatch core.
//!
//! Subsystems declare [`Probe`] descriptors (usually as statics) and register
//! them into a process-wide [`Registry`]. An external control plane looks
//! probes up by name or enumerates them by id, and toggles their active flag.
//! A single pluggable tracing engine (a [`Module`]) can attach to the
//! registry at runtime; until one does, a built-in no-op module makes every
//! fire a cheap, well-defined no-op.
//!
//! Dispatch is two-phase by design: instrumented call sites first gate on the
//! unsynchronized [`Probe::maybe_active`] check, then call [`Registry::fire`]
//! which re-checks the flag under the registry lock and invokes the current
//! module.
//!
//! ```
//! use tracefire::{ActionCode, Probe, Registry, FIRE_ARGC};
//!
//! static OPEN: Probe = Probe::new("vfs_open", 1);
//!
//! let registry = Registry::new();
//! registry.register(&OPEN)?;
//!
//! let probe = registry.find("vfs_open").unwrap();
//! registry.activate(probe);
//!
//! if probe.maybe_active() {
//!     // No module attached: the dummy module answers.
//!     assert_eq!(registry.fire(probe, [0; FIRE_ARGC]), ActionCode::Continue);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod module;
pub mod probe;

pub use module::{ActionCode, Module};
pub use probe::{
    dispatch::{FireArgs, FIRE_ARGC},
    registry::Registry,
    syscalls::{register_syscall_probes, SyscallProbeTable},
    Probe, ProbeId, ProbeNameError, PROBE_NAME_MAX,
};
