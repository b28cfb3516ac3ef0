//! # Syscalls
//!
//! Consumption of the statically generated syscall probe table: an ordered
//! array indexed by syscall number, each entry an optional pre-built probe
//! descriptor. Generating the table is external business; the core walks
//! it exactly once at start-up and registers every entry present.

use anyhow::Result;
use log::info;

use super::{registry::Registry, Probe};

/// Ordered table of per-syscall probe descriptors, indexed by syscall
/// number. Sparse: numbers without a probe hold `None`.
pub struct SyscallProbeTable {
    entries: &'static [Option<&'static Probe>],
}

impl SyscallProbeTable {
    pub const fn new(entries: &'static [Option<&'static Probe>]) -> SyscallProbeTable {
        SyscallProbeTable { entries }
    }

    /// Probe descriptor for a syscall number, if the table carries one.
    pub fn probe(&self, sysnum: usize) -> Option<&'static Probe> {
        self.entries.get(sysnum).copied().flatten()
    }

    /// Number of syscall slots in the table, present or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the probes present in the table, in syscall-number
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = &'static Probe> + '_ {
        self.entries.iter().copied().flatten()
    }
}

/// Register every probe present in a syscall table. Meant to run once at
/// subsystem start-up. Returns the number of probes registered.
pub fn register_syscall_probes(registry: &Registry, table: &SyscallProbeTable) -> Result<usize> {
    let mut count = 0;
    for probe in table.iter() {
        registry.register(probe)?;
        count += 1;
    }

    info!("{count} syscall probe(s) registered");
    Ok(count)
}
