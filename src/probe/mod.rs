//! # Probe
//!
//! Module providing the probe descriptors, their registry and the dispatch
//! fast path.

pub mod dispatch;
#[allow(clippy::module_inception)]
pub mod probe;
pub mod registry;
pub mod syscalls;

// Re-export probe.
pub use probe::*;
